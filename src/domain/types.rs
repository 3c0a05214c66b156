// ==========================================
// 多门店排班编制系统 - 领域类型定义
// ==========================================
// 星期约定: 0=周日 ... 6=周六
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 星期 (Day Of Week)
// ==========================================
// 取值 0-6, 越界值无法构造
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const SUNDAY: DayOfWeek = DayOfWeek(0);
    pub const MONDAY: DayOfWeek = DayOfWeek(1);
    pub const TUESDAY: DayOfWeek = DayOfWeek(2);
    pub const WEDNESDAY: DayOfWeek = DayOfWeek(3);
    pub const THURSDAY: DayOfWeek = DayOfWeek(4);
    pub const FRIDAY: DayOfWeek = DayOfWeek(5);
    pub const SATURDAY: DayOfWeek = DayOfWeek(6);

    /// 从整数构造, 超出 0-6 返回 None
    pub fn new(value: i64) -> Option<Self> {
        if (0..=6).contains(&value) {
            Some(DayOfWeek(value as u8))
        } else {
            None
        }
    }

    /// 日期对应的星期
    pub fn from_date(date: NaiveDate) -> Self {
        DayOfWeek(date.weekday().num_days_from_sunday() as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// 按 0..=6 顺序遍历一周
    pub fn all() -> impl Iterator<Item = DayOfWeek> {
        (0u8..7).map(DayOfWeek)
    }
}

impl TryFrom<i64> for DayOfWeek {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        DayOfWeek::new(value).ok_or_else(|| format!("day_of_week 超出范围 0-6: {}", value))
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> u8 {
        day.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// 门店约束来源 (Constraint Source)
// ==========================================
// 覆写链层级: 门店覆写 > 门店类型模板 > 空默认
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintSource {
    BranchOverride,     // 门店显式覆写
    BranchTypeTemplate, // 继承门店类型模板
    EmptyDefault,       // 无配置
}

impl fmt::Display for ConstraintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintSource::BranchOverride => write!(f, "BRANCH_OVERRIDE"),
            ConstraintSource::BranchTypeTemplate => write!(f, "BRANCH_TYPE_TEMPLATE"),
            ConstraintSource::EmptyDefault => write!(f, "EMPTY_DEFAULT"),
        }
    }
}

// ==========================================
// 医生排班来源 (Assignment Source)
// ==========================================
// 优先级: INACTIVE -> DATE_OVERRIDE -> WEEKLY_OFF_DAY -> DEFAULT_SCHEDULE -> UNSCHEDULED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentSource {
    Inactive,        // 医生已停用, 一律休息
    DateOverride,    // 指定日期覆写
    WeeklyOffDay,    // 每周固定休息日
    DefaultSchedule, // 默认周排班
    Unscheduled,     // 无任何规则, 视为休息
}

impl fmt::Display for AssignmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentSource::Inactive => write!(f, "INACTIVE"),
            AssignmentSource::DateOverride => write!(f, "DATE_OVERRIDE"),
            AssignmentSource::WeeklyOffDay => write!(f, "WEEKLY_OFF_DAY"),
            AssignmentSource::DefaultSchedule => write!(f, "DEFAULT_SCHEDULE"),
            AssignmentSource::Unscheduled => write!(f, "UNSCHEDULED"),
        }
    }
}

// ==========================================
// 排班覆写类型 (Override Type)
// ==========================================
// 数据库存储为小写 working / off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideType {
    Working,
    Off,
}

impl fmt::Display for OverrideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl OverrideType {
    /// 从字符串解析覆写类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "working" => Some(OverrideType::Working),
            "off" => Some(OverrideType::Off),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OverrideType::Working => "working",
            OverrideType::Off => "off",
        }
    }
}

// ==========================================
// 营收取值口径 (Revenue Source)
// ==========================================
// DAY_OF_WEEK: 按星期的预期营收; SPECIFIC_DATE: 指定日期的实际营收
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueSource {
    DayOfWeek,
    SpecificDate,
    None,
}

impl fmt::Display for RevenueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RevenueSource {
    /// 从字符串解析, 无法识别时返回 None
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DAY_OF_WEEK" => Some(RevenueSource::DayOfWeek),
            "SPECIFIC_DATE" => Some(RevenueSource::SpecificDate),
            "NONE" => Some(RevenueSource::None),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RevenueSource::DayOfWeek => "DAY_OF_WEEK",
            RevenueSource::SpecificDate => "SPECIFIC_DATE",
            RevenueSource::None => "NONE",
        }
    }
}

// ==========================================
// 情景作用效果 (Factor Effect)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactorEffect {
    Override,             // 替换基础编制并终止后续情景
    Raised,               // 叠加: 抬升到情景下限
    NoChange,             // 叠加: 未高于当前值
    SkippedAfterOverride, // 已被更高优先级覆写, 不再生效
}

impl FactorEffect {
    /// 是否改变了编制值
    pub fn is_contributing(&self) -> bool {
        matches!(self, FactorEffect::Override | FactorEffect::Raised)
    }
}

impl fmt::Display for FactorEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorEffect::Override => write!(f, "OVERRIDE"),
            FactorEffect::Raised => write!(f, "RAISED"),
            FactorEffect::NoChange => write!(f, "NO_CHANGE"),
            FactorEffect::SkippedAfterOverride => write!(f, "SKIPPED_AFTER_OVERRIDE"),
        }
    }
}

// ==========================================
// 谓词检查记录 (Predicate Check)
// ==========================================
// 用途: 情景/偏好匹配的可解释输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateCheck {
    pub field: String,   // 谓词字段
    pub matched: bool,   // 是否通过
    pub detail: String,  // 期望值与观测值
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_sunday_based() {
        // 2026-10-21 是周三
        let date = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        assert_eq!(DayOfWeek::from_date(date), DayOfWeek::WEDNESDAY);

        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(DayOfWeek::from_date(sunday).value(), 0);
    }

    #[test]
    fn test_day_of_week_range() {
        assert!(DayOfWeek::new(-1).is_none());
        assert!(DayOfWeek::new(7).is_none());
        assert_eq!(DayOfWeek::new(6), Some(DayOfWeek::SATURDAY));
        assert_eq!(DayOfWeek::all().count(), 7);
    }

    #[test]
    fn test_day_of_week_serde() {
        let day: DayOfWeek = serde_json::from_str("2").unwrap();
        assert_eq!(day, DayOfWeek::TUESDAY);
        assert!(serde_json::from_str::<DayOfWeek>("9").is_err());
        assert_eq!(serde_json::to_string(&DayOfWeek::FRIDAY).unwrap(), "5");
    }

    #[test]
    fn test_override_type_parse() {
        assert_eq!(OverrideType::from_str("Working"), Some(OverrideType::Working));
        assert_eq!(OverrideType::from_str("off"), Some(OverrideType::Off));
        assert_eq!(OverrideType::from_str("holiday"), None);
    }
}
