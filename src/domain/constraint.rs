// ==========================================
// 多门店排班编制系统 - 人员组最低编制约束
// ==========================================
// 层级: BranchConstraint(覆写) > BranchTypeConstraint(模板) > 空
// ==========================================

use crate::domain::types::{ConstraintSource, DayOfWeek};
use serde::{Deserialize, Serialize};

// ==========================================
// StaffGroup - 人员组
// ==========================================
// 组内岗位在最低编制口径下可互相替代
// 红线: 未启用的人员组不得被新约束引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffGroup {
    pub staff_group_id: String,
    pub name: String,
    pub is_active: bool,
    pub position_ids: Vec<String>, // 成员岗位
}

impl StaffGroup {
    pub fn contains_position(&self, position_id: &str) -> bool {
        self.position_ids.iter().any(|p| p == position_id)
    }
}

/// 单个人员组的最低人数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffGroupRequirement {
    pub staff_group_id: String,
    pub minimum_count: i32,
}

// ==========================================
// BranchTypeConstraint - 门店类型模板
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTypeConstraint {
    pub branch_type_id: String,
    pub day_of_week: DayOfWeek,
    pub requirements: Vec<StaffGroupRequirement>,
}

// ==========================================
// BranchConstraint - 门店覆写
// ==========================================
// 首次显式编辑时隐式创建; 未覆写的日期没有记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchConstraint {
    pub branch_id: String,
    pub day_of_week: DayOfWeek,
    pub is_overridden: bool,
    pub overridden_branch_type_id: Option<String>, // 覆写时门店所属类型 (审计用)
    pub requirements: Vec<StaffGroupRequirement>,
}

// ==========================================
// 解析结果
// ==========================================

/// 解析后的人员组要求 (带组名)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRequirement {
    pub staff_group_id: String,
    pub staff_group_name: String,
    pub minimum_count: i32,
}

/// 某一天最终生效的约束
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDayConstraint {
    pub branch_id: String,
    pub day_of_week: DayOfWeek,
    pub requirements: Vec<ResolvedRequirement>,
    pub is_overridden: bool,
    pub inherited_from_branch_type_id: Option<String>,
    pub source: ConstraintSource,
}

impl ResolvedDayConstraint {
    /// 指定人员组的最低人数, 未配置视为 0
    pub fn minimum_for(&self, staff_group_id: &str) -> i32 {
        self.requirements
            .iter()
            .find(|r| r.staff_group_id == staff_group_id)
            .map(|r| r.minimum_count)
            .unwrap_or(0)
    }
}
