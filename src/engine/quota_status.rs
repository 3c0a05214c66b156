// ==========================================
// 多门店排班编制系统 - 编制达成汇总
// ==========================================
// 岗位: still_required = max(0, 计算后最低人数 - 本店可用 - 已派轮岗)
// 人员组: 成员岗位到岗合计 vs 当日约束最低人数
// 门店: 合计 + 人员组缺口 + 指定人员缺席 + 配置告警
// 红线: 纯函数, 有序容器, 不读时钟, 结果可重复
// ==========================================

use crate::domain::branch::Position;
use crate::domain::constraint::{ResolvedDayConstraint, StaffGroup};
use crate::domain::quota::PositionQuota;
use crate::domain::scenario::StaffRequirementScenario;
use crate::domain::staffing::StaffingSnapshot;
use crate::domain::summary::{
    BranchQuotaSummary, MissingSpecificStaff, MissingStaff, PositionQuotaSummary, QuotaStatus,
    StaffGroupStatus,
};
use crate::engine::requirement_calculator::{BaseRequirement, RequirementCalculator};
use crate::engine::scenario_matcher::priority_order;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

/// 汇总输入 (调用方预加载)
#[derive(Debug, Clone, Copy)]
pub struct QuotaStatusInput<'a> {
    pub branch_id: &'a str,
    pub date: NaiveDate,
    pub positions: &'a [Position],
    pub quotas: &'a [PositionQuota],
    pub matched: &'a [StaffRequirementScenario],
    pub day_constraint: &'a ResolvedDayConstraint,
    pub staff_groups: &'a [StaffGroup],
    pub staffing: &'a StaffingSnapshot,
}

/// QuotaStatusAggregator - 达成汇总器
pub struct QuotaStatusAggregator {
    calculator: RequirementCalculator,
}

impl QuotaStatusAggregator {
    pub fn new() -> Self {
        Self {
            calculator: RequirementCalculator::new(),
        }
    }

    #[instrument(skip_all, fields(branch_id = %input.branch_id, date = %input.date))]
    pub fn aggregate(&self, input: &QuotaStatusInput<'_>) -> QuotaStatus {
        let position_by_id: BTreeMap<&str, &Position> = input
            .positions
            .iter()
            .map(|p| (p.position_id.as_str(), p))
            .collect();
        let quota_by_id: BTreeMap<&str, &PositionQuota> = input
            .quotas
            .iter()
            .filter(|q| q.branch_id == input.branch_id)
            .map(|q| (q.position_id.as_str(), q))
            .collect();
        let group_by_id: BTreeMap<&str, &StaffGroup> = input
            .staff_groups
            .iter()
            .map(|g| (g.staff_group_id.as_str(), g))
            .collect();

        // ===== 1. 参与汇总的岗位 =====
        let mut position_ids: BTreeSet<&str> = quota_by_id.keys().copied().collect();
        for scenario in input.matched {
            for req in &scenario.position_requirements {
                position_ids.insert(req.position_id.as_str());
            }
        }
        for req in &input.day_constraint.requirements {
            if let Some(group) = group_by_id.get(req.staff_group_id.as_str()) {
                position_ids.extend(group.position_ids.iter().map(String::as_str));
            }
        }

        // ===== 2. 岗位级 =====
        let mut positions: BTreeMap<&str, PositionQuotaSummary> = BTreeMap::new();
        let mut warnings = Vec::new();
        for position_id in position_ids {
            let position = position_by_id
                .get(position_id)
                .map(|p| (*p).clone())
                .unwrap_or_else(|| Position {
                    position_id: position_id.to_string(),
                    name: position_id.to_string(),
                    is_rotation: false,
                });
            let base = quota_by_id.get(position_id).map(|q| BaseRequirement::from(*q));

            let calculated = self.calculator.calculate(
                input.branch_id,
                input.date,
                &position,
                base,
                input.matched,
            );
            warnings.extend(calculated.warnings.iter().cloned());

            let available_local = input.staffing.available_local_for(position_id);
            let assigned_rotation = input.staffing.assigned_rotation_for(position_id);
            let still_required =
                (calculated.calculated_minimum - available_local - assigned_rotation).max(0);

            positions.insert(
                position_id,
                PositionQuotaSummary {
                    branch_id: input.branch_id.to_string(),
                    date: input.date,
                    position_id: position.position_id,
                    position_name: position.name,
                    designated_quota: calculated.calculated_preferred,
                    minimum_required: calculated.calculated_minimum,
                    available_local,
                    assigned_rotation,
                    still_required,
                },
            );
        }

        // ===== 3. 人员组 =====
        let staff_groups: Vec<StaffGroupStatus> = input
            .day_constraint
            .requirements
            .iter()
            .map(|req| {
                let members: &[String] = group_by_id
                    .get(req.staff_group_id.as_str())
                    .map(|g| g.position_ids.as_slice())
                    .unwrap_or(&[]);

                let staffed_count: i32 = members
                    .iter()
                    .map(|p| {
                        input.staffing.available_local_for(p) + input.staffing.assigned_rotation_for(p)
                    })
                    .sum();
                let shortage = (req.minimum_count - staffed_count).max(0);

                let member_positions = i32::try_from(members.len()).unwrap_or(i32::MAX);
                let satisfied_positions = i32::try_from(
                    members
                        .iter()
                        .filter(|p| positions.get(p.as_str()).map_or(true, |s| s.is_fulfilled()))
                        .count(),
                )
                .unwrap_or(i32::MAX);
                let fulfillment_score = if member_positions == 0 {
                    1.0
                } else {
                    f64::from(satisfied_positions) / f64::from(member_positions)
                };

                let mut missing_staff = Vec::new();
                if shortage > 0 {
                    missing_staff = members
                        .iter()
                        .filter_map(|p| positions.get(p.as_str()))
                        .filter(|s| s.still_required > 0)
                        .map(|s| MissingStaff {
                            position_id: Some(s.position_id.clone()),
                            name: s.position_name.clone(),
                            shortfall: s.still_required,
                        })
                        .collect();
                    if missing_staff.is_empty() {
                        missing_staff.push(MissingStaff {
                            position_id: None,
                            name: req.staff_group_name.clone(),
                            shortfall: shortage,
                        });
                    }
                }

                StaffGroupStatus {
                    staff_group_id: req.staff_group_id.clone(),
                    staff_group_name: req.staff_group_name.clone(),
                    minimum_count: req.minimum_count,
                    staffed_count,
                    shortage,
                    satisfied_positions,
                    member_positions,
                    fulfillment_score,
                    missing_staff,
                }
            })
            .collect();

        // ===== 4. 指定人员 =====
        let mut ordered: Vec<&StaffRequirementScenario> = input.matched.iter().collect();
        ordered.sort_by(|a, b| priority_order(a, b));
        let missing_specific_staff: Vec<MissingSpecificStaff> = ordered
            .iter()
            .flat_map(|s| {
                s.specific_staff
                    .iter()
                    .filter(move |r| !input.staffing.is_present(&r.staff_id))
                    .map(move |r| MissingSpecificStaff {
                        scenario_id: s.scenario_id.clone(),
                        staff_id: r.staff_id.clone(),
                        note: r.note.clone(),
                    })
            })
            .collect();

        // ===== 5. 门店合计 =====
        let positions: Vec<PositionQuotaSummary> = positions.into_values().collect();
        let total_required: i32 = positions.iter().map(|p| p.still_required).sum();
        let is_fulfilled = total_required == 0
            && staff_groups.iter().all(|g| g.is_satisfied())
            && missing_specific_staff.is_empty();

        let branch = BranchQuotaSummary {
            branch_id: input.branch_id.to_string(),
            date: input.date,
            total_designated: positions.iter().map(|p| p.designated_quota).sum(),
            total_minimum: positions.iter().map(|p| p.minimum_required).sum(),
            total_available: positions.iter().map(|p| p.available_local).sum(),
            total_assigned: positions.iter().map(|p| p.assigned_rotation).sum(),
            total_required,
            staff_groups,
            missing_specific_staff,
            warnings,
            is_fulfilled,
        };

        tracing::info!(
            positions = positions.len(),
            total_required = branch.total_required,
            is_fulfilled = branch.is_fulfilled,
            "编制达成汇总完成"
        );

        QuotaStatus { branch, positions }
    }
}

impl Default for QuotaStatusAggregator {
    fn default() -> Self {
        Self::new()
    }
}
