// ==========================================
// 人员组约束解析 集成测试
// ==========================================
// 测试目标: 门店覆写 > 门店类型模板 > 空默认, 始终返回 7 天
// ==========================================

mod test_helpers;

use staffing_engine::api::{ApiError, DayConstraintInput};
use staffing_engine::domain::{ConstraintSource, DayOfWeek, StaffGroupRequirement};
use test_helpers::seeded_env;

fn req(group: &str, count: i32) -> StaffGroupRequirement {
    StaffGroupRequirement {
        staff_group_id: group.to_string(),
        minimum_count: count,
    }
}

fn day(day_of_week: i64, requirements: Vec<StaffGroupRequirement>) -> DayConstraintInput {
    DayConstraintInput {
        day_of_week,
        requirements,
    }
}

#[test]
fn test_unconfigured_branch_returns_seven_empty_days() {
    let env = seeded_env();
    let api = &env.state.constraint_api;

    let resolved = api.resolve_constraints("B3").unwrap();
    assert_eq!(resolved.len(), 7);
    for (idx, record) in resolved.iter().enumerate() {
        assert_eq!(i64::from(record.day_of_week.value()), idx as i64);
        assert_eq!(record.source, ConstraintSource::EmptyDefault);
        assert!(!record.is_overridden);
        assert!(record.requirements.is_empty());
        assert!(record.inherited_from_branch_type_id.is_none());
    }
}

#[test]
fn test_branch_inherits_branch_type_template() {
    let env = seeded_env();
    let api = &env.state.constraint_api;

    api.update_branch_type_constraints("T_STD", &[day(2, vec![req("front", 3)])])
        .unwrap();

    let resolved = api.resolve_constraints("B1").unwrap();
    assert_eq!(resolved.len(), 7);

    let tuesday = &resolved[DayOfWeek::TUESDAY.value() as usize];
    assert_eq!(tuesday.source, ConstraintSource::BranchTypeTemplate);
    assert_eq!(tuesday.inherited_from_branch_type_id.as_deref(), Some("T_STD"));
    assert_eq!(tuesday.minimum_for("front"), 3);
    assert_eq!(tuesday.requirements[0].staff_group_name, "前场");

    let monday = &resolved[DayOfWeek::MONDAY.value() as usize];
    assert_eq!(monday.source, ConstraintSource::EmptyDefault);
}

#[test]
fn test_empty_override_beats_template() {
    let env = seeded_env();
    let api = &env.state.constraint_api;

    api.update_branch_type_constraints("T_STD", &[day(2, vec![req("front", 3)])])
        .unwrap();

    // 显式写入空要求: 当天不再继承模板
    let resolved = api.update_constraints("B1", &[day(2, vec![])]).unwrap();
    let tuesday = &resolved[2];
    assert!(tuesday.is_overridden);
    assert_eq!(tuesday.source, ConstraintSource::BranchOverride);
    assert!(tuesday.requirements.is_empty());
    assert!(tuesday.inherited_from_branch_type_id.is_none());

    // 同类型的其他门店不受影响
    let other = api.resolve_constraints("B2").unwrap();
    assert_eq!(other[2].minimum_for("front"), 3);

    // 重置后重新继承
    assert!(api.reset_constraint_override("B1", 2).unwrap());
    assert!(!api.reset_constraint_override("B1", 2).unwrap());
    let resolved = api.resolve_constraints("B1").unwrap();
    assert_eq!(resolved[2].source, ConstraintSource::BranchTypeTemplate);
    assert_eq!(resolved[2].minimum_for("front"), 3);
}

#[test]
fn test_override_replaces_template_requirements() {
    let env = seeded_env();
    let api = &env.state.constraint_api;

    api.update_branch_type_constraints(
        "T_STD",
        &[day(1, vec![req("front", 2), req("clinical", 1)])],
    )
    .unwrap();
    let resolved = api
        .update_constraints("B1", &[day(1, vec![req("clinical", 4)])])
        .unwrap();

    let monday = &resolved[1];
    assert_eq!(monday.requirements.len(), 1);
    assert_eq!(monday.minimum_for("clinical"), 4);
    assert_eq!(monday.minimum_for("front"), 0);

    // 第二次写入整体替换当天要求
    let resolved = api
        .update_constraints("B1", &[day(1, vec![req("front", 1)])])
        .unwrap();
    assert_eq!(resolved[1].minimum_for("clinical"), 0);
    assert_eq!(resolved[1].minimum_for("front"), 1);
}

#[test]
fn test_invalid_request_is_rejected_without_partial_write() {
    let env = seeded_env();
    let api = &env.state.constraint_api;

    let result = api.update_constraints(
        "B1",
        &[day(1, vec![req("front", 2)]), day(3, vec![req("legacy", 1)])],
    );
    assert!(matches!(result, Err(ApiError::ValidationError(_))));

    let resolved = api.resolve_constraints("B1").unwrap();
    assert!(resolved.iter().all(|r| !r.is_overridden));

    assert!(matches!(
        api.update_constraints("B1", &[day(7, vec![])]),
        Err(ApiError::ValidationError(_))
    ));
    assert!(matches!(
        api.resolve_constraints("NOPE"),
        Err(ApiError::NotFound(_))
    ));
}
