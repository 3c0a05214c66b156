// ==========================================
// 多门店排班编制系统 - 人员组约束 API
// ==========================================
// 职责: 约束解析查询, 门店覆写/类型模板的批量写入, 覆写重置
// ==========================================

use std::sync::Arc;

use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_day_of_week, validate_day_requirements, DayConstraintInput};
use crate::domain::constraint::{ResolvedDayConstraint, StaffGroup};
use crate::engine::ConstraintResolver;
use crate::repository::{BranchRepository, ConstraintRepository};

/// 人员组约束 API
pub struct ConstraintApi {
    branch_repo: Arc<BranchRepository>,
    constraint_repo: Arc<ConstraintRepository>,
}

impl ConstraintApi {
    pub fn new(branch_repo: Arc<BranchRepository>, constraint_repo: Arc<ConstraintRepository>) -> Self {
        Self {
            branch_repo,
            constraint_repo,
        }
    }

    /// 解析门店 7 天约束
    #[instrument(skip(self))]
    pub fn resolve_constraints(&self, branch_id: &str) -> ApiResult<Vec<ResolvedDayConstraint>> {
        let branch = self.branch_repo.get_branch(branch_id)?;
        let overrides = self.constraint_repo.list_branch_constraints(branch_id)?;
        let templates = match branch.branch_type_id.as_deref() {
            Some(type_id) => self.constraint_repo.list_branch_type_constraints(type_id)?,
            None => Vec::new(),
        };
        let staff_groups = self.constraint_repo.list_staff_groups()?;

        Ok(ConstraintResolver::new().resolve(&branch, &overrides, &templates, &staff_groups))
    }

    /// 批量写入门店覆写, 返回写入后的解析结果
    ///
    /// 先整体校验, 任一项不合法则整个请求拒绝
    #[instrument(skip(self, days), fields(days = days.len()))]
    pub fn update_constraints(
        &self,
        branch_id: &str,
        days: &[DayConstraintInput],
    ) -> ApiResult<Vec<ResolvedDayConstraint>> {
        let branch = self.branch_repo.get_branch(branch_id)?;
        let staff_groups = self.constraint_repo.list_staff_groups()?;
        let validated = validate_day_requirements(days, &staff_groups)?;

        self.constraint_repo.replace_branch_constraints(
            branch_id,
            branch.branch_type_id.as_deref(),
            &validated,
        )?;
        tracing::info!(branch_id, days = validated.len(), "门店约束覆写已更新");

        self.resolve_constraints(branch_id)
    }

    /// 批量写入门店类型模板
    #[instrument(skip(self, days), fields(days = days.len()))]
    pub fn update_branch_type_constraints(
        &self,
        branch_type_id: &str,
        days: &[DayConstraintInput],
    ) -> ApiResult<()> {
        if self.branch_repo.find_branch_type(branch_type_id)?.is_none() {
            return Err(ApiError::NotFound(format!("BranchType(id={})不存在", branch_type_id)));
        }
        let staff_groups = self.constraint_repo.list_staff_groups()?;
        let validated = validate_day_requirements(days, &staff_groups)?;

        self.constraint_repo
            .replace_branch_type_constraints(branch_type_id, &validated)?;
        tracing::info!(branch_type_id, days = validated.len(), "门店类型模板已更新");
        Ok(())
    }

    /// 删除门店某日覆写, 使该日重新继承模板; 返回是否存在覆写
    #[instrument(skip(self))]
    pub fn reset_constraint_override(&self, branch_id: &str, day_of_week: i64) -> ApiResult<bool> {
        self.branch_repo.get_branch(branch_id)?;
        let day = parse_day_of_week(day_of_week)?;
        let removed = self.constraint_repo.delete_branch_constraint(branch_id, day)?;
        tracing::info!(branch_id, %day, removed, "门店约束覆写已重置");
        Ok(removed)
    }

    pub fn list_staff_groups(&self) -> ApiResult<Vec<StaffGroup>> {
        Ok(self.constraint_repo.list_staff_groups()?)
    }

    /// 保存人员组 (成员岗位须存在)
    pub fn save_staff_group(&self, group: &StaffGroup) -> ApiResult<()> {
        if group.staff_group_id.trim().is_empty() || group.name.trim().is_empty() {
            return Err(ApiError::ValidationError("人员组 ID 与名称不能为空".to_string()));
        }
        for position_id in &group.position_ids {
            if self.branch_repo.find_position(position_id)?.is_none() {
                return Err(ApiError::ValidationError(format!("岗位不存在: {}", position_id)));
            }
        }
        self.constraint_repo.upsert_staff_group(group)?;
        Ok(())
    }
}
