// ==========================================
// 多门店排班编制系统 - 岗位定编与营收分级
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// PositionQuota - 岗位定编
// ==========================================
// 红线: 0 <= minimum_required <= designated_quota
// 轮岗岗位不配置定编
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionQuota {
    pub branch_id: String,
    pub position_id: String,
    pub designated_quota: i32, // 建议人数
    pub minimum_required: i32, // 最低人数
}

// ==========================================
// RevenueLevelTier - 营收分级
// ==========================================
// 区间 [min_revenue, max_revenue), 最高档 max_revenue 为空表示无上限
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueLevelTier {
    pub tier_id: String,
    pub name: String,
    pub level: i32,
    pub min_revenue: f64,
    pub max_revenue: Option<f64>,
}

impl RevenueLevelTier {
    /// 营收是否落在本档区间内
    pub fn contains(&self, revenue: f64) -> bool {
        revenue_in_band(revenue, Some(self.min_revenue), self.max_revenue)
    }
}

/// 半开区间判定 [min, max); 缺省边界视为无界
pub fn revenue_in_band(revenue: f64, min_revenue: Option<f64>, max_revenue: Option<f64>) -> bool {
    if !revenue.is_finite() {
        return false;
    }
    let above_min = min_revenue.map_or(true, |min| revenue >= min);
    let below_max = max_revenue.map_or(true, |max| revenue < max);
    above_min && below_max
}

/// 按营收值定档, 多档重叠时取 level 最高者
pub fn classify_revenue(tiers: &[RevenueLevelTier], revenue: f64) -> Option<&RevenueLevelTier> {
    tiers
        .iter()
        .filter(|t| t.contains(revenue))
        .max_by(|a, b| a.level.cmp(&b.level).then_with(|| b.tier_id.cmp(&a.tier_id)))
}

/// 门店某日的营收口径
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueFacts {
    pub expected_by_day_of_week: Option<f64>, // 按星期的预期营收
    pub actual_by_date: Option<f64>,          // 指定日期的实际营收
}
