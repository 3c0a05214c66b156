// ==========================================
// 多门店排班编制系统 - 编制达成快照
// ==========================================
// 派生数据: 按需重算, 不允许手工编辑
// ==========================================

use crate::domain::scenario::RequirementWarning;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 岗位级达成情况 (branch, position, date)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionQuotaSummary {
    pub branch_id: String,
    pub date: NaiveDate,
    pub position_id: String,
    pub position_name: String,
    pub designated_quota: i32, // 情景计算后的建议人数
    pub minimum_required: i32, // 情景计算后的最低人数
    pub available_local: i32,
    pub assigned_rotation: i32,
    pub still_required: i32, // max(0, 最低 - 本店可用 - 轮岗)
}

impl PositionQuotaSummary {
    pub fn is_fulfilled(&self) -> bool {
        self.still_required == 0
    }
}

/// 人员组缺口条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingStaff {
    pub position_id: Option<String>, // 为空表示组级缺口, 无法归到具体岗位
    pub name: String,
    pub shortfall: i32,
}

/// 人员组达成情况
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffGroupStatus {
    pub staff_group_id: String,
    pub staff_group_name: String,
    pub minimum_count: i32,
    pub staffed_count: i32,
    pub shortage: i32,
    pub satisfied_positions: i32,
    pub member_positions: i32,
    pub fulfillment_score: f64, // satisfied_positions / member_positions
    pub missing_staff: Vec<MissingStaff>,
}

impl StaffGroupStatus {
    pub fn is_satisfied(&self) -> bool {
        self.shortage == 0
    }
}

/// 情景指定但未到岗的人员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSpecificStaff {
    pub scenario_id: String,
    pub staff_id: String,
    pub note: Option<String>,
}

/// 门店级汇总 (branch, date)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchQuotaSummary {
    pub branch_id: String,
    pub date: NaiveDate,
    pub total_designated: i32,
    pub total_minimum: i32,
    pub total_available: i32,
    pub total_assigned: i32,
    pub total_required: i32,
    pub staff_groups: Vec<StaffGroupStatus>,
    pub missing_specific_staff: Vec<MissingSpecificStaff>,
    pub warnings: Vec<RequirementWarning>,
    pub is_fulfilled: bool,
}

/// AggregateQuotaStatus 的完整输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub branch: BranchQuotaSummary,
    pub positions: Vec<PositionQuotaSummary>,
}
