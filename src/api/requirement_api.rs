// ==========================================
// 多门店排班编制系统 - 编制计算 API
// ==========================================
// 职责:
// 1. 情景匹配 (含逐字段解释)
// 2. 单岗位编制计算 (基础定编 + 情景叠加)
// 3. 门店达成汇总 / 刷新快照 / 读取快照
// 4. 轮岗偏好匹配, 岗位定编写入
// 依赖: 约束解析 + 医生反查 + 情景匹配 + 编制计算
// ==========================================

use chrono::NaiveDate;
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_position_quota;
use crate::config::ResolverConfig;
use crate::domain::branch::{Branch, Position};
use crate::domain::quota::PositionQuota;
use crate::domain::scenario::CalculatedRequirement;
use crate::domain::staffing::StaffingPreference;
use crate::domain::summary::QuotaStatus;
use crate::domain::types::DayOfWeek;
use crate::engine::{
    BaseRequirement, ConstraintResolver, DoctorScheduleResolver, QuotaStatusAggregator,
    QuotaStatusInput, RequirementCalculator, ScenarioContext, ScenarioMatchResult,
    ScenarioMatcher, StaffingPreferenceMatcher, StaffingRepositories,
};

/// 编制计算 API
pub struct RequirementApi {
    repos: StaffingRepositories,
}

impl RequirementApi {
    pub fn new(repos: StaffingRepositories) -> Self {
        Self { repos }
    }

    // ==========================================
    // 情景匹配
    // ==========================================

    /// 匹配门店某日生效的情景
    ///
    /// # 参数
    /// - position_id: 指定时只保留含该岗位要求的情景
    /// - doctor_id: 医生维度匹配
    #[instrument(skip(self))]
    pub fn match_scenarios(
        &self,
        branch_id: &str,
        date: NaiveDate,
        position_id: Option<&str>,
        doctor_id: Option<&str>,
    ) -> ApiResult<ScenarioMatchResult> {
        let branch = self.repos.branch_repo.get_branch(branch_id)?;
        let config = self.repos.config.load_resolver_config()?;
        self.match_for_branch(&branch, date, position_id, doctor_id, &config)
    }

    // ==========================================
    // 单岗位编制
    // ==========================================

    /// 计算单岗位编制
    ///
    /// base 为空时读取岗位定编 (未配置视为 0/0)
    #[instrument(skip(self))]
    pub fn calculate_requirement(
        &self,
        branch_id: &str,
        date: NaiveDate,
        position_id: &str,
        base: Option<BaseRequirement>,
    ) -> ApiResult<CalculatedRequirement> {
        let branch = self.repos.branch_repo.get_branch(branch_id)?;
        let position = self.get_position(position_id)?;
        let config = self.repos.config.load_resolver_config()?;

        let base = match base {
            Some(base) => Some(base),
            None => self
                .repos
                .quota_repo
                .find_position_quota(branch_id, position_id)?
                .as_ref()
                .map(BaseRequirement::from),
        };

        let matched = self.match_for_branch(&branch, date, Some(position_id), None, &config)?;
        Ok(RequirementCalculator::new().calculate(
            branch_id,
            date,
            &position,
            base,
            &matched.matched,
        ))
    }

    // ==========================================
    // 达成汇总
    // ==========================================

    /// 计算门店某日达成情况 (不落库)
    #[instrument(skip(self))]
    pub fn aggregate_quota_status(&self, branch_id: &str, date: NaiveDate) -> ApiResult<QuotaStatus> {
        let branch = self.repos.branch_repo.get_branch(branch_id)?;
        let config = self.repos.config.load_resolver_config()?;

        let positions = self.repos.branch_repo.list_positions()?;
        let quotas = self.repos.quota_repo.list_position_quotas(branch_id)?;
        let staff_groups = self.repos.constraint_repo.list_staff_groups()?;
        let staffing = self.repos.staffing_repo.load_snapshot(branch_id, date)?;

        let overrides = self.repos.constraint_repo.list_branch_constraints(branch_id)?;
        let templates = match branch.branch_type_id.as_deref() {
            Some(type_id) => self.repos.constraint_repo.list_branch_type_constraints(type_id)?,
            None => Vec::new(),
        };
        let day = DayOfWeek::from_date(date);
        let day_constraint = ConstraintResolver::new()
            .resolve(&branch, &overrides, &templates, &staff_groups)
            .into_iter()
            .find(|c| c.day_of_week == day)
            .ok_or_else(|| ApiError::InternalError(format!("约束解析缺少星期{}", day)))?;

        let matched = self.match_for_branch(&branch, date, None, None, &config)?;

        let status = QuotaStatusAggregator::new().aggregate(&QuotaStatusInput {
            branch_id,
            date,
            positions: &positions,
            quotas: &quotas,
            matched: &matched.matched,
            day_constraint: &day_constraint,
            staff_groups: &staff_groups,
            staffing: &staffing,
        });

        tracing::info!(
            branch_id,
            %date,
            total_required = status.branch.total_required,
            is_fulfilled = status.branch.is_fulfilled,
            "达成汇总完成"
        );
        Ok(status)
    }

    /// 重算并覆盖快照
    #[instrument(skip(self))]
    pub fn refresh_quota_status(&self, branch_id: &str, date: NaiveDate) -> ApiResult<QuotaStatus> {
        let status = self.aggregate_quota_status(branch_id, date)?;
        self.repos.summary_repo.replace_summary(&status)?;
        Ok(status)
    }

    /// 读取已落库快照
    pub fn load_quota_summary(
        &self,
        branch_id: &str,
        date: NaiveDate,
    ) -> ApiResult<Option<QuotaStatus>> {
        self.repos.branch_repo.get_branch(branch_id)?;
        Ok(self.repos.summary_repo.find_summary(branch_id, date)?)
    }

    // ==========================================
    // 轮岗偏好 / 定编
    // ==========================================

    /// 门店某日适用的轮岗偏好 (按当日在岗医生过滤)
    pub fn matching_preferences(
        &self,
        branch_id: &str,
        date: NaiveDate,
    ) -> ApiResult<Vec<StaffingPreference>> {
        self.repos.branch_repo.get_branch(branch_id)?;
        let doctor_ids = self.doctors_on_day(branch_id, date)?;
        let prefs = self.repos.staffing_repo.list_preferences()?;
        Ok(StaffingPreferenceMatcher::new()
            .match_preferences(&prefs, branch_id, date, &doctor_ids)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn set_position_quota(&self, quota: &PositionQuota) -> ApiResult<()> {
        self.repos.branch_repo.get_branch(&quota.branch_id)?;
        let position = self.get_position(&quota.position_id)?;
        validate_position_quota(quota, &position)?;
        self.repos.quota_repo.upsert_position_quota(quota)?;
        tracing::info!(
            branch_id = %quota.branch_id,
            position_id = %quota.position_id,
            "岗位定编已更新"
        );
        Ok(())
    }

    // ==========================================
    // 内部
    // ==========================================

    fn match_for_branch(
        &self,
        branch: &Branch,
        date: NaiveDate,
        position_id: Option<&str>,
        doctor_id: Option<&str>,
        config: &ResolverConfig,
    ) -> ApiResult<ScenarioMatchResult> {
        let doctor_ids = self.doctors_on_day(&branch.branch_id, date)?;
        let revenue = self
            .repos
            .quota_repo
            .load_revenue_facts(&branch.branch_id, date)?;
        let scenarios = self.repos.scenario_repo.list_scenarios()?;
        let tiers = self.repos.quota_repo.list_revenue_tiers()?;

        let ctx = ScenarioContext::new(branch.branch_id.clone(), date, doctor_ids, revenue)
            .with_position(position_id.map(str::to_string))
            .with_doctor(doctor_id.map(str::to_string));

        Ok(ScenarioMatcher::new(config.revenue_fallback).match_scenarios(&scenarios, &ctx, &tiers))
    }

    fn doctors_on_day(&self, branch_id: &str, date: NaiveDate) -> ApiResult<Vec<String>> {
        let snapshot = self.repos.doctor_schedule_repo.load_snapshot(date, date)?;
        Ok(DoctorScheduleResolver::new().doctors_at_branch(&snapshot, branch_id, date)?)
    }

    fn get_position(&self, position_id: &str) -> ApiResult<Position> {
        self.repos
            .branch_repo
            .find_position(position_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Position(id={})不存在", position_id)))
    }
}
