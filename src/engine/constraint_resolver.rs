// ==========================================
// 多门店排班编制系统 - 人员组约束解析
// ==========================================
// 优先级: BRANCH_OVERRIDE -> BRANCH_TYPE_TEMPLATE -> EMPTY_DEFAULT
// 输出: 恒为 7 条 (周日..周六)
// 红线: Engine 不拼 SQL, 数据由调用方预加载
// ==========================================

use crate::domain::branch::Branch;
use crate::domain::constraint::{
    BranchConstraint, BranchTypeConstraint, ResolvedDayConstraint, ResolvedRequirement,
    StaffGroup, StaffGroupRequirement,
};
use crate::domain::types::{ConstraintSource, DayOfWeek};
use crate::engine::override_chain::OverrideChain;
use std::collections::HashMap;
use tracing::instrument;

/// ConstraintResolver - 约束解析器
pub struct ConstraintResolver {}

impl ConstraintResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析门店一周 7 天的最低编制约束
    ///
    /// # 参数
    /// - branch: 门店 (branch_type_id 可空)
    /// - overrides: 该门店的约束行 (仅 is_overridden=true 的行参与解析)
    /// - templates: 该门店类型的模板行
    /// - staff_groups: 人员组 (用于回填组名)
    #[instrument(skip_all, fields(branch_id = %branch.branch_id))]
    pub fn resolve(
        &self,
        branch: &Branch,
        overrides: &[BranchConstraint],
        templates: &[BranchTypeConstraint],
        staff_groups: &[StaffGroup],
    ) -> Vec<ResolvedDayConstraint> {
        let group_names: HashMap<&str, &str> = staff_groups
            .iter()
            .map(|g| (g.staff_group_id.as_str(), g.name.as_str()))
            .collect();
        let empty: Vec<StaffGroupRequirement> = Vec::new();

        let resolved: Vec<ResolvedDayConstraint> = DayOfWeek::all()
            .map(|day| {
                let branch_override = overrides
                    .iter()
                    .find(|o| o.is_overridden && o.day_of_week == day && o.branch_id == branch.branch_id);
                let template = branch.branch_type_id.as_deref().and_then(|type_id| {
                    templates
                        .iter()
                        .find(|t| t.branch_type_id == type_id && t.day_of_week == day)
                });

                let winner = OverrideChain::new()
                    .layer(
                        ConstraintSource::BranchOverride,
                        branch_override.map(|o| &o.requirements),
                    )
                    .layer(
                        ConstraintSource::BranchTypeTemplate,
                        template.map(|t| &t.requirements),
                    )
                    .resolve_or(ConstraintSource::EmptyDefault, &empty);

                let mut requirements: Vec<ResolvedRequirement> = winner
                    .value
                    .iter()
                    .map(|r| ResolvedRequirement {
                        staff_group_id: r.staff_group_id.clone(),
                        staff_group_name: group_names
                            .get(r.staff_group_id.as_str())
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| r.staff_group_id.clone()),
                        minimum_count: r.minimum_count,
                    })
                    .collect();
                requirements.sort_by(|a, b| a.staff_group_id.cmp(&b.staff_group_id));

                let inherited_from_branch_type_id = match winner.source {
                    ConstraintSource::BranchTypeTemplate => branch.branch_type_id.clone(),
                    _ => None,
                };

                ResolvedDayConstraint {
                    branch_id: branch.branch_id.clone(),
                    day_of_week: day,
                    requirements,
                    is_overridden: winner.source == ConstraintSource::BranchOverride,
                    inherited_from_branch_type_id,
                    source: winner.source,
                }
            })
            .collect();

        tracing::debug!(
            overridden_days = resolved.iter().filter(|r| r.is_overridden).count(),
            "约束解析完成"
        );
        resolved
    }
}

impl Default for ConstraintResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(type_id: Option<&str>) -> Branch {
        Branch {
            branch_id: "B1".to_string(),
            name: "一店".to_string(),
            branch_type_id: type_id.map(String::from),
        }
    }

    fn req(group: &str, count: i32) -> StaffGroupRequirement {
        StaffGroupRequirement {
            staff_group_id: group.to_string(),
            minimum_count: count,
        }
    }

    fn groups() -> Vec<StaffGroup> {
        vec![StaffGroup {
            staff_group_id: "front".to_string(),
            name: "前台".to_string(),
            is_active: true,
            position_ids: vec!["reception".to_string()],
        }]
    }

    #[test]
    fn test_always_seven_records() {
        let resolver = ConstraintResolver::new();
        let resolved = resolver.resolve(&branch(None), &[], &[], &groups());

        assert_eq!(resolved.len(), 7);
        for (idx, day) in resolved.iter().enumerate() {
            assert_eq!(day.day_of_week.value() as usize, idx);
            assert_eq!(day.source, ConstraintSource::EmptyDefault);
            assert!(!day.is_overridden);
            assert!(day.requirements.is_empty());
        }
    }

    #[test]
    fn test_template_inherited_and_named() {
        let templates = vec![BranchTypeConstraint {
            branch_type_id: "T".to_string(),
            day_of_week: DayOfWeek::TUESDAY,
            requirements: vec![req("front", 3)],
        }];

        let resolved = ConstraintResolver::new().resolve(&branch(Some("T")), &[], &templates, &groups());
        let tuesday = &resolved[2];

        assert_eq!(tuesday.source, ConstraintSource::BranchTypeTemplate);
        assert_eq!(tuesday.inherited_from_branch_type_id.as_deref(), Some("T"));
        assert_eq!(tuesday.requirements[0].staff_group_name, "前台");
        assert_eq!(tuesday.minimum_for("front"), 3);
        assert_eq!(resolved[3].source, ConstraintSource::EmptyDefault);
    }

    #[test]
    fn test_explicit_empty_override_beats_template() {
        let templates = vec![BranchTypeConstraint {
            branch_type_id: "T".to_string(),
            day_of_week: DayOfWeek::MONDAY,
            requirements: vec![req("front", 2)],
        }];
        let overrides = vec![BranchConstraint {
            branch_id: "B1".to_string(),
            day_of_week: DayOfWeek::MONDAY,
            is_overridden: true,
            overridden_branch_type_id: Some("T".to_string()),
            requirements: vec![],
        }];

        let resolved =
            ConstraintResolver::new().resolve(&branch(Some("T")), &overrides, &templates, &groups());
        let monday = &resolved[1];

        assert_eq!(monday.source, ConstraintSource::BranchOverride);
        assert!(monday.is_overridden);
        assert!(monday.requirements.is_empty());
        assert_eq!(monday.inherited_from_branch_type_id, None);
    }

    #[test]
    fn test_row_not_flagged_overridden_is_ignored() {
        let templates = vec![BranchTypeConstraint {
            branch_type_id: "T".to_string(),
            day_of_week: DayOfWeek::MONDAY,
            requirements: vec![req("front", 2)],
        }];
        let overrides = vec![BranchConstraint {
            branch_id: "B1".to_string(),
            day_of_week: DayOfWeek::MONDAY,
            is_overridden: false,
            overridden_branch_type_id: None,
            requirements: vec![req("front", 9)],
        }];

        let resolved =
            ConstraintResolver::new().resolve(&branch(Some("T")), &overrides, &templates, &groups());
        assert_eq!(resolved[1].minimum_for("front"), 2);
    }

    #[test]
    fn test_branch_without_type_skips_template_layer() {
        let templates = vec![BranchTypeConstraint {
            branch_type_id: "T".to_string(),
            day_of_week: DayOfWeek::MONDAY,
            requirements: vec![req("front", 2)],
        }];

        let resolved = ConstraintResolver::new().resolve(&branch(None), &[], &templates, &groups());
        assert_eq!(resolved[1].source, ConstraintSource::EmptyDefault);
    }
}
