// ==========================================
// 多门店排班编制系统 - 实时人员事实与偏好
// ==========================================

use crate::domain::types::DayOfWeek;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// StaffingSnapshot - 门店某日到岗事实
// ==========================================
// 由外部人员/轮岗数据加载, 聚合器只读
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingSnapshot {
    pub available_local: BTreeMap<String, i32>,   // position_id -> 本店可用人数
    pub assigned_rotation: BTreeMap<String, i32>, // position_id -> 已派轮岗人数
    pub present_staff_ids: BTreeSet<String>,      // 当日到岗人员
}

impl StaffingSnapshot {
    pub fn available_local_for(&self, position_id: &str) -> i32 {
        self.available_local.get(position_id).copied().unwrap_or(0)
    }

    pub fn assigned_rotation_for(&self, position_id: &str) -> i32 {
        self.assigned_rotation.get(position_id).copied().unwrap_or(0)
    }

    pub fn is_present(&self, staff_id: &str) -> bool {
        self.present_staff_ids.contains(staff_id)
    }
}

// ==========================================
// StaffingPreference - 轮岗人员排班偏好
// ==========================================
// branch/doctor/day_of_week 各自可空 (通配)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingPreference {
    pub preference_id: String,
    pub staff_id: String,
    pub branch_id: Option<String>,
    pub doctor_id: Option<String>,
    pub day_of_week: Option<DayOfWeek>,
    pub is_active: bool,
    pub note: Option<String>,
}
