// ==========================================
// 多门店排班编制系统 - 编制情景规则
// ==========================================
// 职责: 情景规则实体 + 匹配与计算的输出结构
// 约定: 谓词字段为空表示通配
// ==========================================

use crate::domain::types::{DayOfWeek, FactorEffect, PredicateCheck};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// StaffRequirementScenario - 编制情景
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffRequirementScenario {
    pub scenario_id: String,
    pub name: String,
    pub description: Option<String>,

    // ===== 谓词 (None = 通配) =====
    pub doctor_id: Option<String>,
    pub branch_id: Option<String>,
    pub revenue_level_tier_id: Option<String>,
    pub min_revenue: Option<f64>,
    pub max_revenue: Option<f64>,
    pub use_day_of_week_revenue: bool,
    pub use_specific_date_revenue: bool,
    pub doctor_count: Option<i32>,     // 医生数精确匹配
    pub min_doctor_count: Option<i32>, // 医生数下限
    pub day_of_week: Option<DayOfWeek>,

    // ===== 生效控制 =====
    pub priority: i32, // 越大越优先
    pub is_active: bool,

    // ===== 作用 =====
    pub position_requirements: Vec<ScenarioPositionRequirement>,
    pub specific_staff: Vec<ScenarioSpecificStaffRequirement>,
}

impl StaffRequirementScenario {
    /// 创建空谓词情景 (自动生成 UUID)
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            scenario_id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            doctor_id: None,
            branch_id: None,
            revenue_level_tier_id: None,
            min_revenue: None,
            max_revenue: None,
            use_day_of_week_revenue: false,
            use_specific_date_revenue: false,
            doctor_count: None,
            min_doctor_count: None,
            day_of_week: None,
            priority,
            is_active: true,
            position_requirements: Vec::new(),
            specific_staff: Vec::new(),
        }
    }

    /// 指定岗位的情景要求
    pub fn requirement_for(&self, position_id: &str) -> Option<&ScenarioPositionRequirement> {
        self.position_requirements
            .iter()
            .find(|r| r.position_id == position_id)
    }

    /// 是否配置了营收谓词 (分级或区间)
    pub fn has_revenue_predicate(&self) -> bool {
        self.revenue_level_tier_id.is_some()
            || self.min_revenue.is_some()
            || self.max_revenue.is_some()
    }
}

/// 情景对岗位编制的要求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPositionRequirement {
    pub position_id: String,
    pub preferred_staff: i32,
    pub minimum_staff: i32,
    pub override_base: bool, // true=替换基础定编, false=在基础定编上抬升
}

/// 情景要求必须到岗的指定人员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSpecificStaffRequirement {
    pub staff_id: String,
    pub note: Option<String>,
}

// ==========================================
// ScenarioMatch - 匹配解释记录
// ==========================================
// 未匹配的情景同样输出, 便于管理员排查
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMatch {
    pub scenario_id: String,
    pub scenario_name: String,
    pub priority: i32,
    pub matched: bool,
    pub checks: Vec<PredicateCheck>,
}

impl ScenarioMatch {
    /// 未通过的谓词
    pub fn failed_checks(&self) -> impl Iterator<Item = &PredicateCheck> {
        self.checks.iter().filter(|c| !c.matched)
    }
}

// ==========================================
// CalculatedRequirement - 岗位编制计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedRequirement {
    pub branch_id: String,
    pub date: NaiveDate,
    pub position_id: String,
    pub position_name: String,
    pub base_preferred: i32,
    pub base_minimum: i32,
    pub calculated_preferred: i32,
    pub calculated_minimum: i32,
    pub override_scenario_id: Option<String>,
    pub override_scenario_name: Option<String>,
    pub factors: Vec<AppliedFactor>,
    pub warnings: Vec<RequirementWarning>,
}

/// 情景作用轨迹中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFactor {
    pub scenario_id: String,
    pub scenario_name: String,
    pub priority: i32,
    pub effect: FactorEffect,
    pub preferred_before: i32,
    pub minimum_before: i32,
    pub preferred_after: i32,
    pub minimum_after: i32,
}

// ==========================================
// RequirementWarning - 配置不一致告警
// ==========================================
// 本地修正后随结果返回, 不吞掉
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementWarning {
    /// 最低人数大于建议人数, 已下调至建议人数
    MinimumExceedsPreferred {
        position_id: String,
        minimum: i32,
        preferred: i32,
        scenario_id: Option<String>,
    },
}

impl RequirementWarning {
    pub fn message(&self) -> String {
        match self {
            RequirementWarning::MinimumExceedsPreferred {
                position_id,
                minimum,
                preferred,
                scenario_id,
            } => format!(
                "岗位{}最低人数{}大于建议人数{}(情景={}), 已下调为{}",
                position_id,
                minimum,
                preferred,
                scenario_id.as_deref().unwrap_or("-"),
                preferred
            ),
        }
    }
}
