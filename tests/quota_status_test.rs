// ==========================================
// 编制达成汇总 集成测试
// ==========================================
// 测试目标:
// - 岗位缺口 = max(0, 最低 - 本店可用 - 轮岗)
// - 人员组按成员岗位合计对比当日约束
// - 指定人员缺席导致未达成
// - 重复计算结果一致, 快照可刷新可读取
// ==========================================

mod test_helpers;

use staffing_engine::api::DayConstraintInput;
use staffing_engine::domain::{
    DayOfWeek, PositionQuota, ScenarioSpecificStaffRequirement, StaffGroupRequirement,
    StaffRequirementScenario, StaffingPreference,
};
use test_helpers::{add_staff, seeded_env, tuesday, TestEnv};

/// B1 周二: 前场组最低 3 人, 三个岗位各配定编
fn seed_tuesday(env: &TestEnv) -> String {
    let state = &env.state;
    state
        .constraint_api
        .update_branch_type_constraints(
            "T_STD",
            &[DayConstraintInput {
                day_of_week: 2,
                requirements: vec![StaffGroupRequirement {
                    staff_group_id: "front".to_string(),
                    minimum_count: 3,
                }],
            }],
        )
        .unwrap();

    for (position_id, designated, minimum) in
        [("reception", 2, 1), ("assistant", 1, 1), ("nurse", 2, 1)]
    {
        state
            .requirement_api
            .set_position_quota(&PositionQuota {
                branch_id: "B1".to_string(),
                position_id: position_id.to_string(),
                designated_quota: designated,
                minimum_required: minimum,
            })
            .unwrap();
    }

    add_staff(state, "R1", Some("B1"), "reception", false).unwrap();
    add_staff(state, "A1", Some("B1"), "assistant", false).unwrap();
    add_staff(state, "N1", Some("B1"), "nurse", false).unwrap();
    add_staff(state, "N2", Some("B1"), "nurse", false).unwrap();
    add_staff(state, "RS1", None, "reception", true).unwrap();

    state.repos.staffing_repo.record_leave("N2", tuesday()).unwrap();
    state
        .repos
        .staffing_repo
        .record_rotation_assignment("RS1", "B1", "reception", tuesday())
        .unwrap()
}

#[test]
fn test_fulfilled_branch_day() {
    let env = seeded_env();
    seed_tuesday(&env);

    let status = env
        .state
        .requirement_api
        .aggregate_quota_status("B1", tuesday())
        .unwrap();

    let ids: Vec<&str> = status.positions.iter().map(|p| p.position_id.as_str()).collect();
    assert_eq!(ids, vec!["assistant", "nurse", "reception"]);

    let nurse = &status.positions[1];
    assert_eq!(nurse.available_local, 1);
    assert_eq!(nurse.still_required, 0);

    let reception = &status.positions[2];
    assert_eq!(reception.available_local, 1);
    assert_eq!(reception.assigned_rotation, 1);

    let branch = &status.branch;
    assert_eq!(branch.total_designated, 5);
    assert_eq!(branch.total_minimum, 3);
    assert_eq!(branch.total_available, 3);
    assert_eq!(branch.total_assigned, 1);
    assert_eq!(branch.total_required, 0);

    let front = &branch.staff_groups[0];
    assert_eq!(front.staff_group_id, "front");
    assert_eq!(front.minimum_count, 3);
    assert_eq!(front.staffed_count, 3);
    assert!(front.is_satisfied());
    assert_eq!(front.fulfillment_score, 1.0);
    assert!(branch.is_fulfilled);
}

#[test]
fn test_group_shortage_after_rotation_cancelled() {
    let env = seeded_env();
    let assignment_id = seed_tuesday(&env);
    assert!(env
        .state
        .repos
        .staffing_repo
        .cancel_rotation_assignment(&assignment_id)
        .unwrap());

    let status = env
        .state
        .requirement_api
        .aggregate_quota_status("B1", tuesday())
        .unwrap();

    // 岗位最低人数均满足, 但前场组合计不足
    assert_eq!(status.branch.total_required, 0);
    let front = &status.branch.staff_groups[0];
    assert_eq!(front.staffed_count, 2);
    assert_eq!(front.shortage, 1);
    assert_eq!(front.missing_staff.len(), 1);
    assert!(front.missing_staff[0].position_id.is_none());
    assert_eq!(front.missing_staff[0].shortfall, 1);
    assert!(!status.branch.is_fulfilled);
}

#[test]
fn test_position_shortfall_and_missing_specific_staff() {
    let env = seeded_env();
    seed_tuesday(&env);
    add_staff(&env.state, "R2", Some("B2"), "reception", false).unwrap();

    let mut busy = StaffRequirementScenario::new("周二加班", 10);
    busy.scenario_id = "TUE_BUSY".to_string();
    busy.day_of_week = Some(DayOfWeek::TUESDAY);
    busy.position_requirements.push(
        staffing_engine::domain::ScenarioPositionRequirement {
            position_id: "nurse".to_string(),
            preferred_staff: 3,
            minimum_staff: 3,
            override_base: false,
        },
    );
    busy.specific_staff.push(ScenarioSpecificStaffRequirement {
        staff_id: "R2".to_string(),
        note: Some("资深前台".to_string()),
    });
    env.state.scenario_api.save_scenario(&busy).unwrap();

    let status = env
        .state
        .requirement_api
        .aggregate_quota_status("B1", tuesday())
        .unwrap();

    let nurse = status
        .positions
        .iter()
        .find(|p| p.position_id == "nurse")
        .unwrap();
    assert_eq!(nurse.designated_quota, 3);
    assert_eq!(nurse.minimum_required, 3);
    assert_eq!(nurse.still_required, 2);
    assert_eq!(status.branch.total_required, 2);

    assert_eq!(status.branch.missing_specific_staff.len(), 1);
    assert_eq!(status.branch.missing_specific_staff[0].staff_id, "R2");
    assert_eq!(status.branch.missing_specific_staff[0].scenario_id, "TUE_BUSY");
    assert!(!status.branch.is_fulfilled);
}

#[test]
fn test_aggregation_is_deterministic_and_snapshot_round_trips() {
    let env = seeded_env();
    seed_tuesday(&env);
    let api = &env.state.requirement_api;

    let first = api.aggregate_quota_status("B1", tuesday()).unwrap();
    let second = api.aggregate_quota_status("B1", tuesday()).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    assert!(api.load_quota_summary("B1", tuesday()).unwrap().is_none());

    let refreshed = api.refresh_quota_status("B1", tuesday()).unwrap();
    let loaded = api.load_quota_summary("B1", tuesday()).unwrap().unwrap();
    assert_eq!(loaded, refreshed);

    // 再次刷新覆盖旧快照
    env.state.repos.staffing_repo.record_leave("A1", tuesday()).unwrap();
    let refreshed = api.refresh_quota_status("B1", tuesday()).unwrap();
    let loaded = api.load_quota_summary("B1", tuesday()).unwrap().unwrap();
    assert_eq!(loaded, refreshed);
    assert_eq!(loaded.branch.total_required, 1);
}

#[test]
fn test_matching_preferences_follow_doctors_on_duty() {
    let env = seeded_env();
    seed_tuesday(&env);
    env.state
        .doctor_schedule_api
        .set_default_schedule("D1", 2, "B1")
        .unwrap();

    let staffing_repo = &env.state.repos.staffing_repo;
    for (id, doctor, day) in [
        ("P_D1", Some("D1"), None),
        ("P_D2", Some("D2"), None),
        ("P_TUE", None, Some(DayOfWeek::TUESDAY)),
        ("P_WED", None, Some(DayOfWeek::WEDNESDAY)),
    ] {
        staffing_repo
            .upsert_preference(&StaffingPreference {
                preference_id: id.to_string(),
                staff_id: "RS1".to_string(),
                branch_id: Some("B1".to_string()),
                doctor_id: doctor.map(str::to_string),
                day_of_week: day,
                is_active: true,
                note: None,
            })
            .unwrap();
    }

    let matched: Vec<String> = env
        .state
        .requirement_api
        .matching_preferences("B1", tuesday())
        .unwrap()
        .into_iter()
        .map(|p| p.preference_id)
        .collect();
    assert_eq!(matched, vec!["P_D1".to_string(), "P_TUE".to_string()]);
}
