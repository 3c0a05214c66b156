// ==========================================
// 多门店排班编制系统 - 写入校验
// ==========================================
// 职责: 写入前的输入校验, 校验不通过时拒绝整个请求 (不做部分写入)
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::branch::Position;
use crate::domain::constraint::{StaffGroup, StaffGroupRequirement};
use crate::domain::doctor_schedule::DoctorAssignment;
use crate::domain::quota::PositionQuota;
use crate::domain::scenario::StaffRequirementScenario;
use crate::domain::types::{DayOfWeek, OverrideType};
use crate::repository::constraint_repo::DayRequirements;

// ==========================================
// 请求 DTO
// ==========================================

/// 单日约束写入请求 (day_of_week 为原始整数, 校验后转换)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayConstraintInput {
    pub day_of_week: i64,
    pub requirements: Vec<StaffGroupRequirement>,
}

/// 日期覆写写入请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOverrideInput {
    pub override_type: String, // working / off
    pub branch_id: Option<String>,
    pub reason: Option<String>,
}

// ==========================================
// 校验函数
// ==========================================

pub fn parse_day_of_week(value: i64) -> ApiResult<DayOfWeek> {
    DayOfWeek::new(value)
        .ok_or_else(|| ApiError::ValidationError(format!("day_of_week 超出范围 0-6: {}", value)))
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ApiResult<()> {
    if start > end {
        return Err(ApiError::ValidationError(format!(
            "开始日期{}晚于结束日期{}",
            start, end
        )));
    }
    Ok(())
}

/// 校验约束写入请求
///
/// # 规则
/// - day_of_week 在 0-6 且请求内不重复
/// - 人员组存在且已启用, 同一天内不重复
/// - minimum_count >= 0
pub fn validate_day_requirements(
    days: &[DayConstraintInput],
    staff_groups: &[StaffGroup],
) -> ApiResult<Vec<DayRequirements>> {
    let groups: HashMap<&str, &StaffGroup> = staff_groups
        .iter()
        .map(|g| (g.staff_group_id.as_str(), g))
        .collect();

    let mut violations = Vec::new();
    let mut seen_days = HashSet::new();
    let mut validated = Vec::with_capacity(days.len());

    for day in days {
        let Some(dow) = DayOfWeek::new(day.day_of_week) else {
            violations.push(format!("day_of_week 超出范围 0-6: {}", day.day_of_week));
            continue;
        };
        if !seen_days.insert(dow) {
            violations.push(format!("day_of_week 重复: {}", dow));
        }

        let mut seen_groups = HashSet::new();
        for req in &day.requirements {
            match groups.get(req.staff_group_id.as_str()) {
                None => violations.push(format!("人员组不存在: {}", req.staff_group_id)),
                Some(g) if !g.is_active => {
                    violations.push(format!("人员组未启用: {}", req.staff_group_id))
                }
                Some(_) => {}
            }
            if req.minimum_count < 0 {
                violations.push(format!(
                    "人员组{}最低人数不能为负: {}",
                    req.staff_group_id, req.minimum_count
                ));
            }
            if !seen_groups.insert(req.staff_group_id.as_str()) {
                violations.push(format!("星期{}人员组重复: {}", dow, req.staff_group_id));
            }
        }

        validated.push(DayRequirements {
            day_of_week: dow,
            requirements: day.requirements.clone(),
        });
    }

    if !violations.is_empty() {
        return Err(ApiError::ValidationError(violations.join("; ")));
    }
    Ok(validated)
}

/// 校验覆写形态: working 必须带门店, off 不得带门店
pub fn validate_override_shape(input: &ScheduleOverrideInput) -> ApiResult<DoctorAssignment> {
    let override_type = OverrideType::from_str(&input.override_type).ok_or_else(|| {
        ApiError::ValidationError(format!("未知覆写类型: {}", input.override_type))
    })?;

    match (override_type, input.branch_id.as_deref().map(str::trim)) {
        (OverrideType::Working, Some(branch_id)) if !branch_id.is_empty() => {
            Ok(DoctorAssignment::Working {
                branch_id: branch_id.to_string(),
            })
        }
        (OverrideType::Working, _) => Err(ApiError::ValidationError(
            "working 覆写必须指定门店".to_string(),
        )),
        (OverrideType::Off, None) => Ok(DoctorAssignment::Off),
        (OverrideType::Off, Some(_)) => Err(ApiError::ValidationError(
            "off 覆写不得指定门店".to_string(),
        )),
    }
}

/// 校验岗位定编: 0 <= 最低 <= 建议, 轮岗岗位不配置定编
pub fn validate_position_quota(quota: &PositionQuota, position: &Position) -> ApiResult<()> {
    if position.is_rotation {
        return Err(ApiError::ValidationError(format!(
            "轮岗岗位{}不配置定编",
            position.position_id
        )));
    }
    if quota.minimum_required < 0 || quota.minimum_required > quota.designated_quota {
        return Err(ApiError::ValidationError(format!(
            "岗位{}定编不合法: 最低={} 建议={}",
            quota.position_id, quota.minimum_required, quota.designated_quota
        )));
    }
    Ok(())
}

/// 校验情景
///
/// # 参数
/// - positions: 全部岗位 (校验引用存在且非轮岗)
pub fn validate_scenario(
    scenario: &StaffRequirementScenario,
    positions: &[Position],
) -> ApiResult<()> {
    let known: HashMap<&str, &Position> = positions
        .iter()
        .map(|p| (p.position_id.as_str(), p))
        .collect();
    let mut violations = Vec::new();

    if scenario.name.trim().is_empty() {
        violations.push("情景名称不能为空".to_string());
    }
    if scenario.doctor_count.is_some() && scenario.min_doctor_count.is_some() {
        violations.push("doctor_count 与 min_doctor_count 不能同时设置".to_string());
    }
    if scenario.doctor_count.map_or(false, |c| c < 0)
        || scenario.min_doctor_count.map_or(false, |c| c < 0)
    {
        violations.push("医生数不能为负".to_string());
    }
    for value in [scenario.min_revenue, scenario.max_revenue].into_iter().flatten() {
        if !value.is_finite() {
            violations.push(format!("营收边界不合法: {}", value));
        }
    }
    if let (Some(min), Some(max)) = (scenario.min_revenue, scenario.max_revenue) {
        if min >= max {
            violations.push(format!("营收区间不合法: [{}, {})", min, max));
        }
    }

    let mut seen = HashSet::new();
    for req in &scenario.position_requirements {
        match known.get(req.position_id.as_str()) {
            None => violations.push(format!("岗位不存在: {}", req.position_id)),
            Some(p) if p.is_rotation => {
                violations.push(format!("轮岗岗位不能配置情景编制: {}", req.position_id))
            }
            Some(_) => {}
        }
        if req.preferred_staff < 0 || req.minimum_staff < 0 {
            violations.push(format!("岗位{}人数不能为负", req.position_id));
        }
        if req.minimum_staff > req.preferred_staff {
            violations.push(format!(
                "岗位{}最低人数{}大于建议人数{}",
                req.position_id, req.minimum_staff, req.preferred_staff
            ));
        }
        if !seen.insert(req.position_id.as_str()) {
            violations.push(format!("岗位重复: {}", req.position_id));
        }
    }

    if !violations.is_empty() {
        return Err(ApiError::ValidationError(violations.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::ScenarioPositionRequirement;

    fn group(id: &str, is_active: bool) -> StaffGroup {
        StaffGroup {
            staff_group_id: id.to_string(),
            name: id.to_string(),
            is_active,
            position_ids: vec![],
        }
    }

    fn req(group: &str, count: i32) -> StaffGroupRequirement {
        StaffGroupRequirement {
            staff_group_id: group.to_string(),
            minimum_count: count,
        }
    }

    #[test]
    fn test_day_requirements_validation() {
        let groups = vec![group("front", true), group("back", false)];

        let ok = validate_day_requirements(
            &[DayConstraintInput {
                day_of_week: 2,
                requirements: vec![req("front", 3)],
            }],
            &groups,
        )
        .unwrap();
        assert_eq!(ok[0].day_of_week, DayOfWeek::TUESDAY);

        for bad in [
            vec![DayConstraintInput { day_of_week: 7, requirements: vec![] }],
            vec![DayConstraintInput { day_of_week: 1, requirements: vec![req("back", 1)] }],
            vec![DayConstraintInput { day_of_week: 1, requirements: vec![req("nope", 1)] }],
            vec![DayConstraintInput { day_of_week: 1, requirements: vec![req("front", -1)] }],
            vec![DayConstraintInput {
                day_of_week: 1,
                requirements: vec![req("front", 1), req("front", 2)],
            }],
            vec![
                DayConstraintInput { day_of_week: 1, requirements: vec![] },
                DayConstraintInput { day_of_week: 1, requirements: vec![] },
            ],
        ] {
            assert!(matches!(
                validate_day_requirements(&bad, &groups),
                Err(ApiError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn test_override_shape() {
        let working = ScheduleOverrideInput {
            override_type: "working".to_string(),
            branch_id: Some("B1".to_string()),
            reason: None,
        };
        assert_eq!(
            validate_override_shape(&working).unwrap().branch_id(),
            Some("B1")
        );

        let working_without_branch = ScheduleOverrideInput {
            branch_id: None,
            ..working.clone()
        };
        assert!(validate_override_shape(&working_without_branch).is_err());

        let off_with_branch = ScheduleOverrideInput {
            override_type: "off".to_string(),
            ..working
        };
        assert!(validate_override_shape(&off_with_branch).is_err());
    }

    #[test]
    fn test_scenario_validation() {
        let positions = vec![
            Position {
                position_id: "nurse".to_string(),
                name: "护士".to_string(),
                is_rotation: false,
            },
            Position {
                position_id: "float".to_string(),
                name: "轮岗".to_string(),
                is_rotation: true,
            },
        ];
        let mut scenario = StaffRequirementScenario::new("周三高峰", 5);
        scenario.position_requirements.push(ScenarioPositionRequirement {
            position_id: "nurse".to_string(),
            preferred_staff: 3,
            minimum_staff: 2,
            override_base: false,
        });
        assert!(validate_scenario(&scenario, &positions).is_ok());

        let mut inverted = scenario.clone();
        inverted.position_requirements[0].minimum_staff = 4;
        assert!(validate_scenario(&inverted, &positions).is_err());

        let mut rotation = scenario.clone();
        rotation.position_requirements[0].position_id = "float".to_string();
        assert!(validate_scenario(&rotation, &positions).is_err());

        let mut both_counts = scenario.clone();
        both_counts.doctor_count = Some(2);
        both_counts.min_doctor_count = Some(1);
        assert!(validate_scenario(&both_counts, &positions).is_err());

        let mut band = scenario;
        band.min_revenue = Some(2000.0);
        band.max_revenue = Some(1000.0);
        assert!(validate_scenario(&band, &positions).is_err());
    }
}
