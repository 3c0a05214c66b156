// ==========================================
// 编制情景匹配 集成测试
// ==========================================
// 测试目标: 谓词 AND 组合、空谓词通配、营收半开区间、医生数判定
// ==========================================

mod test_helpers;

use staffing_engine::api::ApiError;
use staffing_engine::config::config_keys;
use staffing_engine::domain::{
    DayOfWeek, RevenueLevelTier, ScenarioPositionRequirement, StaffRequirementScenario,
};
use test_helpers::{seeded_env, thursday, wednesday, TestEnv};

fn scenario(id: &str, priority: i32) -> StaffRequirementScenario {
    let mut s = StaffRequirementScenario::new(id, priority);
    s.scenario_id = id.to_string();
    s.position_requirements.push(ScenarioPositionRequirement {
        position_id: "nurse".to_string(),
        preferred_staff: 3,
        minimum_staff: 2,
        override_base: false,
    });
    s
}

fn matched_ids(env: &TestEnv, branch_id: &str, date: chrono::NaiveDate) -> Vec<String> {
    env.state
        .requirement_api
        .match_scenarios(branch_id, date, None, None)
        .unwrap()
        .matched
        .into_iter()
        .map(|s| s.scenario_id)
        .collect()
}

#[test]
fn test_day_of_week_predicate() {
    let env = seeded_env();
    let mut wed = scenario("WED_PEAK", 5);
    wed.day_of_week = Some(DayOfWeek::WEDNESDAY);
    env.state.scenario_api.save_scenario(&wed).unwrap();

    assert_eq!(matched_ids(&env, "B1", wednesday()), vec!["WED_PEAK"]);
    assert!(matched_ids(&env, "B1", thursday()).is_empty());

    // 未命中的情景同样给出解释
    let result = env
        .state
        .requirement_api
        .match_scenarios("B1", thursday(), None, None)
        .unwrap();
    let evaluation = &result.evaluations[0];
    assert!(!evaluation.matched);
    let failed: Vec<&str> = evaluation.failed_checks().map(|c| c.field.as_str()).collect();
    assert_eq!(failed, vec!["day_of_week"]);
}

#[test]
fn test_empty_predicates_match_everywhere_and_order_by_priority() {
    let env = seeded_env();
    env.state.scenario_api.save_scenario(&scenario("LOW", 1)).unwrap();
    env.state.scenario_api.save_scenario(&scenario("HIGH", 10)).unwrap();
    let mut b2_only = scenario("B2_ONLY", 20);
    b2_only.branch_id = Some("B2".to_string());
    env.state.scenario_api.save_scenario(&b2_only).unwrap();
    let mut inactive = scenario("INACTIVE", 99);
    inactive.is_active = false;
    env.state.scenario_api.save_scenario(&inactive).unwrap();

    assert_eq!(matched_ids(&env, "B1", wednesday()), vec!["HIGH", "LOW"]);
    assert_eq!(
        matched_ids(&env, "B2", wednesday()),
        vec!["B2_ONLY", "HIGH", "LOW"]
    );
}

#[test]
fn test_revenue_band_is_half_open() {
    let env = seeded_env();
    let mut band = scenario("MID_REVENUE", 5);
    band.min_revenue = Some(1000.0);
    band.max_revenue = Some(2000.0);
    band.use_day_of_week_revenue = true;
    env.state.scenario_api.save_scenario(&band).unwrap();

    let quota_repo = &env.state.repos.quota_repo;

    // 无营收数据时不匹配
    assert!(matched_ids(&env, "B1", wednesday()).is_empty());

    quota_repo
        .upsert_expected_revenue("B1", DayOfWeek::WEDNESDAY, 1000.0)
        .unwrap();
    assert_eq!(matched_ids(&env, "B1", wednesday()), vec!["MID_REVENUE"]);

    quota_repo
        .upsert_expected_revenue("B1", DayOfWeek::WEDNESDAY, 2000.0)
        .unwrap();
    assert!(matched_ids(&env, "B1", wednesday()).is_empty());

    // 指定日期口径优先于按星期口径
    let mut actual = band.clone();
    actual.use_specific_date_revenue = true;
    env.state.scenario_api.save_scenario(&actual).unwrap();
    quota_repo
        .upsert_actual_revenue("B1", wednesday(), 1500.0)
        .unwrap();
    assert_eq!(matched_ids(&env, "B1", wednesday()), vec!["MID_REVENUE"]);
}

#[test]
fn test_revenue_fallback_source() {
    let env = seeded_env();
    let mut band = scenario("FALLBACK", 5);
    band.min_revenue = Some(500.0);
    env.state.scenario_api.save_scenario(&band).unwrap();

    env.state
        .repos
        .quota_repo
        .upsert_actual_revenue("B1", wednesday(), 800.0)
        .unwrap();

    // 默认按星期口径, 无数据不匹配
    assert!(matched_ids(&env, "B1", wednesday()).is_empty());

    env.state
        .config_api
        .update_config(config_keys::SCENARIO_REVENUE_FALLBACK, "SPECIFIC_DATE")
        .unwrap();
    assert_eq!(matched_ids(&env, "B1", wednesday()), vec!["FALLBACK"]);
}

#[test]
fn test_revenue_tier_predicate() {
    let env = seeded_env();
    let quota_repo = &env.state.repos.quota_repo;
    for (id, level, min, max) in [("LOW", 1, 0.0, Some(1000.0)), ("HIGH", 2, 1000.0, None)] {
        quota_repo
            .upsert_revenue_tier(&RevenueLevelTier {
                tier_id: id.to_string(),
                name: id.to_string(),
                level,
                min_revenue: min,
                max_revenue: max,
            })
            .unwrap();
    }

    let mut tiered = scenario("HIGH_TIER", 5);
    tiered.revenue_level_tier_id = Some("HIGH".to_string());
    tiered.use_day_of_week_revenue = true;
    env.state.scenario_api.save_scenario(&tiered).unwrap();

    quota_repo
        .upsert_expected_revenue("B1", DayOfWeek::WEDNESDAY, 999.0)
        .unwrap();
    assert!(matched_ids(&env, "B1", wednesday()).is_empty());

    quota_repo
        .upsert_expected_revenue("B1", DayOfWeek::WEDNESDAY, 5000.0)
        .unwrap();
    assert_eq!(matched_ids(&env, "B1", wednesday()), vec!["HIGH_TIER"]);
}

#[test]
fn test_doctor_predicates_use_resolved_schedule() {
    let env = seeded_env();
    let schedule = &env.state.doctor_schedule_api;
    schedule.set_default_schedule("D1", 3, "B1").unwrap();
    schedule.set_default_schedule("D2", 3, "B1").unwrap();
    schedule.set_default_schedule("D3", 3, "B2").unwrap();

    let mut with_d1 = scenario("WITH_D1", 5);
    with_d1.doctor_id = Some("D1".to_string());
    env.state.scenario_api.save_scenario(&with_d1).unwrap();

    let mut two_doctors = scenario("TWO_DOCTORS", 4);
    two_doctors.doctor_count = Some(2);
    env.state.scenario_api.save_scenario(&two_doctors).unwrap();

    let mut busy = scenario("AT_LEAST_TWO", 3);
    busy.min_doctor_count = Some(2);
    env.state.scenario_api.save_scenario(&busy).unwrap();

    assert_eq!(
        matched_ids(&env, "B1", wednesday()),
        vec!["WITH_D1", "TWO_DOCTORS", "AT_LEAST_TWO"]
    );
    assert!(matched_ids(&env, "B2", wednesday()).is_empty());

    // 指定医生维度
    let result = env
        .state
        .requirement_api
        .match_scenarios("B2", wednesday(), None, Some("D1"))
        .unwrap();
    assert_eq!(result.matched_ids(), vec!["WITH_D1"]);
}

#[test]
fn test_position_filter() {
    let env = seeded_env();
    env.state.scenario_api.save_scenario(&scenario("NURSE", 5)).unwrap();

    let api = &env.state.requirement_api;
    let result = api
        .match_scenarios("B1", wednesday(), Some("nurse"), None)
        .unwrap();
    assert_eq!(result.matched_ids(), vec!["NURSE"]);

    let result = api
        .match_scenarios("B1", wednesday(), Some("reception"), None)
        .unwrap();
    assert!(result.matched.is_empty());
}

#[test]
fn test_scenario_write_validation() {
    let env = seeded_env();
    let api = &env.state.scenario_api;

    let mut unknown_position = scenario("BAD", 1);
    unknown_position.position_requirements[0].position_id = "surgeon".to_string();
    assert!(matches!(
        api.save_scenario(&unknown_position),
        Err(ApiError::ValidationError(_))
    ));

    let mut rotation = scenario("ROTATION", 1);
    rotation.position_requirements[0].position_id = "float".to_string();
    assert!(api.save_scenario(&rotation).is_err());

    api.save_scenario(&scenario("OK", 1)).unwrap();
    let replaced = api
        .replace_scenario_position_requirements(
            "OK",
            &[ScenarioPositionRequirement {
                position_id: "reception".to_string(),
                preferred_staff: 2,
                minimum_staff: 1,
                override_base: true,
            }],
        )
        .unwrap();
    assert_eq!(replaced.position_requirements.len(), 1);
    let stored = api.get_scenario("OK").unwrap();
    assert_eq!(stored.position_requirements[0].position_id, "reception");

    assert!(matches!(
        api.replace_scenario_position_requirements("MISSING", &[]),
        Err(ApiError::NotFound(_))
    ));
    assert!(api.delete_scenario("OK").unwrap());
    assert!(api.list_scenarios().unwrap().is_empty());
}
