// ==========================================
// 岗位编制计算 集成测试
// ==========================================
// 测试目标:
// - 最高优先级的 override 情景替换基础定编, 后续情景不再生效
// - 叠加情景逐字段取最大值
// - 最低人数大于建议人数时下调并告警
// ==========================================

mod test_helpers;

use staffing_engine::api::ApiError;
use staffing_engine::domain::{
    DayOfWeek, FactorEffect, PositionQuota, RequirementWarning, ScenarioPositionRequirement,
    StaffRequirementScenario,
};
use staffing_engine::engine::BaseRequirement;
use test_helpers::{seeded_env, thursday, wednesday, TestEnv};

fn nurse_scenario(
    id: &str,
    priority: i32,
    preferred: i32,
    minimum: i32,
    override_base: bool,
) -> StaffRequirementScenario {
    let mut s = StaffRequirementScenario::new(id, priority);
    s.scenario_id = id.to_string();
    s.day_of_week = Some(DayOfWeek::WEDNESDAY);
    s.position_requirements.push(ScenarioPositionRequirement {
        position_id: "nurse".to_string(),
        preferred_staff: preferred,
        minimum_staff: minimum,
        override_base,
    });
    s
}

fn set_nurse_quota(env: &TestEnv, designated: i32, minimum: i32) {
    env.state
        .requirement_api
        .set_position_quota(&PositionQuota {
            branch_id: "B1".to_string(),
            position_id: "nurse".to_string(),
            designated_quota: designated,
            minimum_required: minimum,
        })
        .unwrap();
}

#[test]
fn test_highest_priority_override_wins() {
    let env = seeded_env();
    set_nurse_quota(&env, 4, 2);
    let scenarios = &env.state.scenario_api;
    scenarios
        .save_scenario(&nurse_scenario("P10_OVERRIDE", 10, 6, 3, true))
        .unwrap();
    scenarios
        .save_scenario(&nurse_scenario("P5_RAISE", 5, 8, 5, false))
        .unwrap();

    let result = env
        .state
        .requirement_api
        .calculate_requirement("B1", wednesday(), "nurse", None)
        .unwrap();

    assert_eq!((result.base_preferred, result.base_minimum), (4, 2));
    assert_eq!(result.calculated_preferred, 6);
    assert_eq!(result.calculated_minimum, 3);
    assert_eq!(result.override_scenario_id.as_deref(), Some("P10_OVERRIDE"));

    let effects: Vec<(&str, FactorEffect)> = result
        .factors
        .iter()
        .map(|f| (f.scenario_id.as_str(), f.effect))
        .collect();
    assert_eq!(
        effects,
        vec![
            ("P10_OVERRIDE", FactorEffect::Override),
            ("P5_RAISE", FactorEffect::SkippedAfterOverride),
        ]
    );
    assert!(result.warnings.is_empty());
}

#[test]
fn test_lower_priority_override_applies_after_raise() {
    let env = seeded_env();
    set_nurse_quota(&env, 4, 2);
    let scenarios = &env.state.scenario_api;
    scenarios
        .save_scenario(&nurse_scenario("P10_RAISE", 10, 5, 3, false))
        .unwrap();
    scenarios
        .save_scenario(&nurse_scenario("P5_OVERRIDE", 5, 2, 1, true))
        .unwrap();

    let result = env
        .state
        .requirement_api
        .calculate_requirement("B1", wednesday(), "nurse", None)
        .unwrap();

    assert_eq!(result.calculated_preferred, 2);
    assert_eq!(result.calculated_minimum, 1);
    assert_eq!(result.factors[0].effect, FactorEffect::Raised);
    assert_eq!(result.factors[1].effect, FactorEffect::Override);
}

#[test]
fn test_raise_takes_field_wise_maximum() {
    let env = seeded_env();
    set_nurse_quota(&env, 4, 2);
    let scenarios = &env.state.scenario_api;
    scenarios
        .save_scenario(&nurse_scenario("MORE_MIN", 5, 3, 3, false))
        .unwrap();
    scenarios
        .save_scenario(&nurse_scenario("MORE_PREF", 4, 6, 1, false))
        .unwrap();

    let result = env
        .state
        .requirement_api
        .calculate_requirement("B1", wednesday(), "nurse", None)
        .unwrap();
    assert_eq!(result.calculated_preferred, 6);
    assert_eq!(result.calculated_minimum, 3);
    assert!(result.override_scenario_id.is_none());

    // 周四无情景命中, 保持基础定编
    let result = env
        .state
        .requirement_api
        .calculate_requirement("B1", thursday(), "nurse", None)
        .unwrap();
    assert_eq!((result.calculated_preferred, result.calculated_minimum), (4, 2));
    assert!(result.factors.is_empty());
}

#[test]
fn test_minimum_above_preferred_is_clamped_with_warning() {
    let env = seeded_env();

    let result = env
        .state
        .requirement_api
        .calculate_requirement(
            "B1",
            thursday(),
            "nurse",
            Some(BaseRequirement {
                preferred: 2,
                minimum: 5,
            }),
        )
        .unwrap();

    assert_eq!(result.calculated_preferred, 2);
    assert_eq!(result.calculated_minimum, 2);
    assert_eq!(result.warnings.len(), 1);
    match &result.warnings[0] {
        RequirementWarning::MinimumExceedsPreferred {
            position_id,
            minimum,
            preferred,
            scenario_id,
        } => {
            assert_eq!(position_id, "nurse");
            assert_eq!((*minimum, *preferred), (5, 2));
            assert!(scenario_id.is_none());
        }
    }
}

#[test]
fn test_missing_quota_defaults_to_zero() {
    let env = seeded_env();
    let result = env
        .state
        .requirement_api
        .calculate_requirement("B2", wednesday(), "reception", None)
        .unwrap();
    assert_eq!(result.calculated_preferred, 0);
    assert_eq!(result.calculated_minimum, 0);

    assert!(matches!(
        env.state
            .requirement_api
            .calculate_requirement("B2", wednesday(), "surgeon", None),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_position_quota_validation() {
    let env = seeded_env();
    let api = &env.state.requirement_api;

    let inverted = PositionQuota {
        branch_id: "B1".to_string(),
        position_id: "nurse".to_string(),
        designated_quota: 2,
        minimum_required: 3,
    };
    assert!(matches!(
        api.set_position_quota(&inverted),
        Err(ApiError::ValidationError(_))
    ));

    let rotation = PositionQuota {
        position_id: "float".to_string(),
        designated_quota: 1,
        minimum_required: 1,
        ..inverted
    };
    assert!(matches!(
        api.set_position_quota(&rotation),
        Err(ApiError::ValidationError(_))
    ));
}
