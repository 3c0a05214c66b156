// ==========================================
// 多门店排班编制系统 - 编制情景匹配
// ==========================================
// 谓词 (AND, 空=通配):
//   is_active / branch_id / doctor_id / day_of_week / position_id
//   / revenue (分级或区间) / doctor_count (精确) / min_doctor_count (下限)
// 排序: priority DESC, scenario_id ASC (同优先级仅用于展示稳定)
// 输出: 命中情景 + 每个情景的逐字段解释
// ==========================================

use crate::domain::quota::{classify_revenue, revenue_in_band, RevenueFacts, RevenueLevelTier};
use crate::domain::scenario::{ScenarioMatch, StaffRequirementScenario};
use crate::domain::types::{DayOfWeek, RevenueSource};
use crate::engine::predicate::PredicateMatcher;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::instrument;

// ==========================================
// ScenarioContext - 匹配上下文
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioContext {
    pub branch_id: String,
    pub date: NaiveDate,
    pub day_of_week: DayOfWeek,
    pub position_id: Option<String>,      // 指定岗位时, 情景须含该岗位要求
    pub doctor_id: Option<String>,        // 医生维度计算时指定
    pub assigned_doctor_ids: Vec<String>, // 当日在岗医生 (反查结果)
    pub revenue: RevenueFacts,
}

impl ScenarioContext {
    pub fn new(
        branch_id: impl Into<String>,
        date: NaiveDate,
        assigned_doctor_ids: Vec<String>,
        revenue: RevenueFacts,
    ) -> Self {
        Self {
            branch_id: branch_id.into(),
            date,
            day_of_week: DayOfWeek::from_date(date),
            position_id: None,
            doctor_id: None,
            assigned_doctor_ids,
            revenue,
        }
    }

    pub fn with_position(mut self, position_id: Option<String>) -> Self {
        self.position_id = position_id;
        self
    }

    pub fn with_doctor(mut self, doctor_id: Option<String>) -> Self {
        self.doctor_id = doctor_id;
        self
    }

    pub fn doctor_count(&self) -> i32 {
        i32::try_from(self.assigned_doctor_ids.len()).unwrap_or(i32::MAX)
    }
}

/// 匹配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMatchResult {
    pub matched: Vec<StaffRequirementScenario>, // priority DESC
    pub evaluations: Vec<ScenarioMatch>,        // 命中在前, 含未启用情景
}

impl ScenarioMatchResult {
    pub fn matched_ids(&self) -> Vec<&str> {
        self.matched.iter().map(|s| s.scenario_id.as_str()).collect()
    }
}

/// 情景排序: priority DESC, scenario_id ASC
pub fn priority_order(a: &StaffRequirementScenario, b: &StaffRequirementScenario) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.scenario_id.cmp(&b.scenario_id))
}

// ==========================================
// ScenarioMatcher - 情景匹配器
// ==========================================
pub struct ScenarioMatcher {
    revenue_fallback: RevenueSource,
}

impl ScenarioMatcher {
    /// revenue_fallback: 情景配置了营收谓词但未选择口径时采用
    pub fn new(revenue_fallback: RevenueSource) -> Self {
        Self { revenue_fallback }
    }

    #[instrument(skip_all, fields(branch_id = %ctx.branch_id, date = %ctx.date, scenarios = scenarios.len()))]
    pub fn match_scenarios(
        &self,
        scenarios: &[StaffRequirementScenario],
        ctx: &ScenarioContext,
        tiers: &[RevenueLevelTier],
    ) -> ScenarioMatchResult {
        let mut matched = Vec::new();
        let mut evaluations = Vec::with_capacity(scenarios.len());

        for scenario in scenarios {
            let evaluation = self.evaluate(scenario, ctx, tiers);
            if evaluation.matched {
                matched.push(scenario.clone());
            }
            evaluations.push(evaluation);
        }

        matched.sort_by(priority_order);
        evaluations.sort_by(|a, b| {
            b.matched
                .cmp(&a.matched)
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.scenario_id.cmp(&b.scenario_id))
        });

        tracing::debug!(matched = matched.len(), "情景匹配完成");
        ScenarioMatchResult { matched, evaluations }
    }

    /// 单情景逐字段评估
    pub fn evaluate(
        &self,
        scenario: &StaffRequirementScenario,
        ctx: &ScenarioContext,
        tiers: &[RevenueLevelTier],
    ) -> ScenarioMatch {
        let mut matcher = PredicateMatcher::new(scenario.is_active)
            .equals(
                "branch_id",
                scenario.branch_id.as_deref(),
                Some(ctx.branch_id.as_str()),
            )
            .equals(
                "day_of_week",
                scenario.day_of_week.as_ref(),
                Some(&ctx.day_of_week),
            );

        // 医生: 指定医生时精确比较, 否则看当日在岗医生
        matcher = match ctx.doctor_id.as_deref() {
            Some(doctor_id) => {
                matcher.equals("doctor_id", scenario.doctor_id.as_deref(), Some(doctor_id))
            }
            None => matcher.contains(
                "doctor_id",
                scenario.doctor_id.as_deref(),
                &ctx.assigned_doctor_ids,
            ),
        };

        if let Some(position_id) = ctx.position_id.as_deref() {
            matcher = matcher.satisfies(
                "position_id",
                scenario.requirement_for(position_id).is_some(),
                format!("情景需包含岗位 {}", position_id),
            );
        }

        if scenario.has_revenue_predicate() {
            let (passed, detail) = self.check_revenue(scenario, ctx, tiers);
            matcher = matcher.satisfies("revenue", passed, detail);
        }

        let doctor_count = ctx.doctor_count();
        if let Some(expected) = scenario.doctor_count {
            matcher = matcher.satisfies(
                "doctor_count",
                doctor_count == expected,
                format!("期望={} 实际={}", expected, doctor_count),
            );
        }
        if let Some(floor) = scenario.min_doctor_count {
            matcher = matcher.satisfies(
                "min_doctor_count",
                doctor_count >= floor,
                format!("下限={} 实际={}", floor, doctor_count),
            );
        }

        let (matched, checks) = matcher.finish();
        ScenarioMatch {
            scenario_id: scenario.scenario_id.clone(),
            scenario_name: scenario.name.clone(),
            priority: scenario.priority,
            matched,
            checks,
        }
    }

    /// 情景采用的营收口径
    pub fn revenue_source(&self, scenario: &StaffRequirementScenario) -> RevenueSource {
        if scenario.use_specific_date_revenue {
            RevenueSource::SpecificDate
        } else if scenario.use_day_of_week_revenue {
            RevenueSource::DayOfWeek
        } else {
            self.revenue_fallback
        }
    }

    fn check_revenue(
        &self,
        scenario: &StaffRequirementScenario,
        ctx: &ScenarioContext,
        tiers: &[RevenueLevelTier],
    ) -> (bool, String) {
        let source = self.revenue_source(scenario);
        let revenue = match source {
            RevenueSource::SpecificDate => ctx.revenue.actual_by_date,
            RevenueSource::DayOfWeek => ctx.revenue.expected_by_day_of_week,
            RevenueSource::None => None,
        };

        let Some(revenue) = revenue else {
            return (false, format!("口径={} 无营收数据", source));
        };

        // 分级优先于原始区间
        if let Some(tier_id) = scenario.revenue_level_tier_id.as_deref() {
            if !tiers.iter().any(|t| t.tier_id == tier_id) {
                return (false, format!("营收分级 {} 不存在", tier_id));
            }
            let actual_tier = classify_revenue(tiers, revenue);
            let passed = actual_tier.map_or(false, |t| t.tier_id == tier_id);
            return (
                passed,
                format!(
                    "口径={} 营收={} 期望分级={} 实际分级={}",
                    source,
                    revenue,
                    tier_id,
                    actual_tier.map_or("-", |t| t.tier_id.as_str())
                ),
            );
        }

        let passed = revenue_in_band(revenue, scenario.min_revenue, scenario.max_revenue);
        (
            passed,
            format!(
                "口径={} 营收={} 区间=[{}, {})",
                source,
                revenue,
                scenario.min_revenue.map_or("-".to_string(), |v| v.to_string()),
                scenario.max_revenue.map_or("∞".to_string(), |v| v.to_string()),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::ScenarioPositionRequirement;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn scenario(id: &str, priority: i32) -> StaffRequirementScenario {
        let mut s = StaffRequirementScenario::new(id, priority);
        s.scenario_id = id.to_string();
        s
    }

    fn ctx(date: NaiveDate, expected: Option<f64>) -> ScenarioContext {
        ScenarioContext::new(
            "B1",
            date,
            vec!["D1".to_string()],
            RevenueFacts {
                expected_by_day_of_week: expected,
                actual_by_date: None,
            },
        )
    }

    #[test]
    fn test_wednesday_only_scenario() {
        let mut s = scenario("WED", 1);
        s.day_of_week = Some(DayOfWeek::WEDNESDAY);
        let matcher = ScenarioMatcher::new(RevenueSource::DayOfWeek);

        // 2026-10-21 周三, 2026-10-22 周四
        let wed = matcher.match_scenarios(&[s.clone()], &ctx(d(2026, 10, 21), None), &[]);
        let thu = matcher.match_scenarios(&[s], &ctx(d(2026, 10, 22), None), &[]);

        assert_eq!(wed.matched_ids(), vec!["WED"]);
        assert!(thu.matched.is_empty());
        assert_eq!(thu.evaluations[0].failed_checks().next().unwrap().field, "day_of_week");
    }

    #[test]
    fn test_revenue_band_half_open() {
        let mut s = scenario("BAND", 1);
        s.min_revenue = Some(1000.0);
        s.max_revenue = Some(2000.0);
        s.use_day_of_week_revenue = true;
        let matcher = ScenarioMatcher::new(RevenueSource::None);
        let date = d(2026, 10, 21);

        let hit = |rev: f64| {
            !matcher
                .match_scenarios(&[s.clone()], &ctx(date, Some(rev)), &[])
                .matched
                .is_empty()
        };
        assert!(hit(1000.0));
        assert!(!hit(2000.0));

        let mut top = scenario("TOP", 1);
        top.min_revenue = Some(2000.0);
        // 未选择口径且回退为 NONE 时不匹配; 回退为 DAY_OF_WEEK 时匹配
        assert!(matcher
            .match_scenarios(&[top.clone()], &ctx(date, Some(5000.0)), &[])
            .matched
            .is_empty());
        let fallback = ScenarioMatcher::new(RevenueSource::DayOfWeek);
        assert!(!fallback
            .match_scenarios(&[top], &ctx(date, Some(5000.0)), &[])
            .matched
            .is_empty());
    }

    #[test]
    fn test_position_and_doctor_predicates() {
        let mut s = scenario("DOC", 1);
        s.doctor_id = Some("D1".to_string());
        s.position_requirements.push(ScenarioPositionRequirement {
            position_id: "nurse".to_string(),
            preferred_staff: 2,
            minimum_staff: 1,
            override_base: false,
        });
        let matcher = ScenarioMatcher::new(RevenueSource::DayOfWeek);
        let date = d(2026, 10, 21);

        let nurse = ctx(date, None).with_position(Some("nurse".to_string()));
        let other = ctx(date, None).with_position(Some("reception".to_string()));
        assert_eq!(matcher.match_scenarios(&[s.clone()], &nurse, &[]).matched.len(), 1);
        assert!(matcher.match_scenarios(&[s.clone()], &other, &[]).matched.is_empty());

        let absent = ScenarioContext::new("B1", date, vec![], RevenueFacts::default());
        assert!(matcher.match_scenarios(&[s], &absent, &[]).matched.is_empty());
    }

    #[test]
    fn test_sorted_by_priority_then_id() {
        let scenarios = vec![scenario("b", 5), scenario("a", 5), scenario("z", 10)];
        let mut inactive = scenario("off", 99);
        inactive.is_active = false;
        let mut all = scenarios.clone();
        all.push(inactive);

        let result = ScenarioMatcher::new(RevenueSource::DayOfWeek).match_scenarios(
            &all,
            &ctx(d(2026, 10, 21), None),
            &[],
        );
        assert_eq!(result.matched_ids(), vec!["z", "a", "b"]);
        assert_eq!(result.evaluations.len(), 4);
        assert!(!result.evaluations[3].matched);
    }

    #[test]
    fn test_doctor_count_predicates() {
        let mut exact = scenario("EXACT", 1);
        exact.doctor_count = Some(2);
        let mut floor = scenario("FLOOR", 1);
        floor.min_doctor_count = Some(1);

        let result = ScenarioMatcher::new(RevenueSource::DayOfWeek).match_scenarios(
            &[exact, floor],
            &ctx(d(2026, 10, 21), None),
            &[],
        );
        assert_eq!(result.matched_ids(), vec!["FLOOR"]);
    }
}
