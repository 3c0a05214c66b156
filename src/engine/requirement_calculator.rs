// ==========================================
// 多门店排班编制系统 - 岗位编制计算
// ==========================================
// 输入: 基础定编 (PositionQuota, 缺省 0/0) + 命中情景 (priority DESC)
// 规则:
// - override_base=true: 替换当前值, 后续情景不再生效
// - override_base=false: 逐字段取最大值 (抬升到情景下限)
// 红线: calculated_minimum <= calculated_preferred, 违反时下调并告警
// ==========================================

use crate::domain::branch::Position;
use crate::domain::quota::PositionQuota;
use crate::domain::scenario::{
    AppliedFactor, CalculatedRequirement, RequirementWarning, StaffRequirementScenario,
};
use crate::domain::types::FactorEffect;
use crate::engine::scenario_matcher::priority_order;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 基础编制
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRequirement {
    pub preferred: i32,
    pub minimum: i32,
}

impl From<&PositionQuota> for BaseRequirement {
    fn from(quota: &PositionQuota) -> Self {
        Self {
            preferred: quota.designated_quota,
            minimum: quota.minimum_required,
        }
    }
}

/// RequirementCalculator - 编制计算器
pub struct RequirementCalculator {}

impl RequirementCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算单岗位编制
    ///
    /// # 参数
    /// - base: 基础编制, None 视为 0/0
    /// - matched: 命中情景 (内部再按优先级排序一次)
    #[instrument(skip_all, fields(branch_id = %branch_id, date = %date, position_id = %position.position_id))]
    pub fn calculate(
        &self,
        branch_id: &str,
        date: NaiveDate,
        position: &Position,
        base: Option<BaseRequirement>,
        matched: &[StaffRequirementScenario],
    ) -> CalculatedRequirement {
        let base = base.unwrap_or_default();
        let mut preferred = base.preferred;
        let mut minimum = base.minimum;

        let mut ordered: Vec<&StaffRequirementScenario> = matched.iter().collect();
        ordered.sort_by(|a, b| priority_order(a, b));

        let mut factors = Vec::new();
        let mut override_by: Option<&StaffRequirementScenario> = None;
        let mut last_contributor: Option<&str> = None;

        for scenario in ordered {
            let Some(req) = scenario.requirement_for(&position.position_id) else {
                continue;
            };

            let (preferred_before, minimum_before) = (preferred, minimum);
            let effect = if override_by.is_some() {
                FactorEffect::SkippedAfterOverride
            } else if req.override_base {
                preferred = req.preferred_staff;
                minimum = req.minimum_staff;
                override_by = Some(scenario);
                FactorEffect::Override
            } else {
                preferred = preferred.max(req.preferred_staff);
                minimum = minimum.max(req.minimum_staff);
                if (preferred, minimum) != (preferred_before, minimum_before) {
                    FactorEffect::Raised
                } else {
                    FactorEffect::NoChange
                }
            };

            if effect.is_contributing() {
                last_contributor = Some(scenario.scenario_id.as_str());
            }

            factors.push(AppliedFactor {
                scenario_id: scenario.scenario_id.clone(),
                scenario_name: scenario.name.clone(),
                priority: scenario.priority,
                effect,
                preferred_before,
                minimum_before,
                preferred_after: preferred,
                minimum_after: minimum,
            });
        }

        let mut warnings = Vec::new();
        if minimum > preferred {
            let warning = RequirementWarning::MinimumExceedsPreferred {
                position_id: position.position_id.clone(),
                minimum,
                preferred,
                scenario_id: last_contributor.map(String::from),
            };
            tracing::warn!("{}", warning.message());
            warnings.push(warning);
            minimum = preferred;
        }

        CalculatedRequirement {
            branch_id: branch_id.to_string(),
            date,
            position_id: position.position_id.clone(),
            position_name: position.name.clone(),
            base_preferred: base.preferred,
            base_minimum: base.minimum,
            calculated_preferred: preferred,
            calculated_minimum: minimum,
            override_scenario_id: override_by.map(|s| s.scenario_id.clone()),
            override_scenario_name: override_by.map(|s| s.name.clone()),
            factors,
            warnings,
        }
    }
}

impl Default for RequirementCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::ScenarioPositionRequirement;

    fn nurse() -> Position {
        Position {
            position_id: "nurse".to_string(),
            name: "护士".to_string(),
            is_rotation: false,
        }
    }

    fn scenario(id: &str, priority: i32, preferred: i32, minimum: i32, override_base: bool) -> StaffRequirementScenario {
        let mut s = StaffRequirementScenario::new(id, priority);
        s.scenario_id = id.to_string();
        s.position_requirements.push(ScenarioPositionRequirement {
            position_id: "nurse".to_string(),
            preferred_staff: preferred,
            minimum_staff: minimum,
            override_base,
        });
        s
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
    }

    #[test]
    fn test_no_quota_defaults_to_zero() {
        let result = RequirementCalculator::new().calculate("B1", date(), &nurse(), None, &[]);
        assert_eq!((result.calculated_preferred, result.calculated_minimum), (0, 0));
        assert!(result.factors.is_empty());
    }

    #[test]
    fn test_override_wins_over_lower_layered() {
        let matched = vec![
            scenario("LAYER", 5, 6, 3, false),
            scenario("OVERRIDE", 10, 4, 2, true),
        ];
        let base = BaseRequirement { preferred: 3, minimum: 2 };

        let result = RequirementCalculator::new().calculate("B1", date(), &nurse(), Some(base), &matched);

        assert_eq!((result.calculated_preferred, result.calculated_minimum), (4, 2));
        assert_eq!(result.override_scenario_id.as_deref(), Some("OVERRIDE"));
        assert_eq!(result.factors.len(), 2);
        assert_eq!(result.factors[0].effect, FactorEffect::Override);
        assert_eq!(result.factors[1].scenario_id, "LAYER");
        assert_eq!(result.factors[1].effect, FactorEffect::SkippedAfterOverride);
    }

    #[test]
    fn test_layered_takes_maximum() {
        let matched = vec![scenario("A", 5, 2, 2, false), scenario("B", 3, 5, 1, false)];
        let base = BaseRequirement { preferred: 3, minimum: 1 };

        let result = RequirementCalculator::new().calculate("B1", date(), &nurse(), Some(base), &matched);

        assert_eq!((result.calculated_preferred, result.calculated_minimum), (5, 2));
        assert_eq!(result.factors[0].effect, FactorEffect::Raised);
        assert_eq!(result.factors[1].effect, FactorEffect::Raised);
    }

    #[test]
    fn test_minimum_clamped_with_warning() {
        let matched = vec![scenario("BAD", 1, 2, 5, true)];
        let result = RequirementCalculator::new().calculate("B1", date(), &nurse(), None, &matched);

        assert_eq!((result.calculated_preferred, result.calculated_minimum), (2, 2));
        assert_eq!(result.warnings.len(), 1);
        assert!(matches!(
            &result.warnings[0],
            RequirementWarning::MinimumExceedsPreferred { minimum: 5, preferred: 2, .. }
        ));
    }

    #[test]
    fn test_scenario_without_position_entry_is_not_recorded() {
        let mut other = scenario("OTHER", 9, 9, 9, true);
        other.position_requirements[0].position_id = "reception".to_string();
        let result = RequirementCalculator::new().calculate("B1", date(), &nurse(), None, &[other]);
        assert!(result.factors.is_empty());
        assert_eq!(result.calculated_preferred, 0);
    }
}
