// ==========================================
// 多门店排班编制系统 - 医生排班领域模型
// ==========================================
// 来源: 默认周排班 / 每周休息日 / 指定日期覆写
// ==========================================

use crate::domain::types::{AssignmentSource, DayOfWeek, OverrideType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// 默认周排班: (doctor, day_of_week) 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorDefaultSchedule {
    pub doctor_id: String,
    pub day_of_week: DayOfWeek,
    pub branch_id: String,
}

/// 每周固定休息日, 有记录即休息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorWeeklyOffDay {
    pub doctor_id: String,
    pub day_of_week: DayOfWeek,
}

// ==========================================
// DoctorAssignment - 排班结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DoctorAssignment {
    Working { branch_id: String },
    Off,
}

impl DoctorAssignment {
    pub fn branch_id(&self) -> Option<&str> {
        match self {
            DoctorAssignment::Working { branch_id } => Some(branch_id),
            DoctorAssignment::Off => None,
        }
    }

    pub fn override_type(&self) -> OverrideType {
        match self {
            DoctorAssignment::Working { .. } => OverrideType::Working,
            DoctorAssignment::Off => OverrideType::Off,
        }
    }
}

/// 指定日期覆写: (doctor, date) 唯一, 取代当日所有周期规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOverride {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub assignment: DoctorAssignment,
    pub reason: Option<String>,
}

/// 单医生单日解析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDoctorAssignment {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub assignment: DoctorAssignment,
    pub source: AssignmentSource,
}

/// 批量结果: branch -> date -> [doctor]
pub type DoctorAssignmentMap = BTreeMap<String, BTreeMap<NaiveDate, Vec<String>>>;

// ==========================================
// DoctorScheduleSnapshot - 预加载快照
// ==========================================
// 批量解析时每个数据源只加载一次
#[derive(Debug, Clone, Default)]
pub struct DoctorScheduleSnapshot {
    pub doctor_ids: Vec<String>,
    pub defaults: HashMap<(String, DayOfWeek), String>,
    pub weekly_off_days: HashSet<(String, DayOfWeek)>,
    pub overrides: HashMap<(String, NaiveDate), ScheduleOverride>,
}

impl DoctorScheduleSnapshot {
    /// 由仓储加载的行构造快照
    pub fn from_rows(
        doctor_ids: Vec<String>,
        defaults: Vec<DoctorDefaultSchedule>,
        weekly_off_days: Vec<DoctorWeeklyOffDay>,
        overrides: Vec<ScheduleOverride>,
    ) -> Self {
        Self {
            doctor_ids,
            defaults: defaults
                .into_iter()
                .map(|d| ((d.doctor_id, d.day_of_week), d.branch_id))
                .collect(),
            weekly_off_days: weekly_off_days
                .into_iter()
                .map(|w| (w.doctor_id, w.day_of_week))
                .collect(),
            overrides: overrides
                .into_iter()
                .map(|o| ((o.doctor_id.clone(), o.date), o))
                .collect(),
        }
    }
}
