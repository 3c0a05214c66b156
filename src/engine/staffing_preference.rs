// ==========================================
// 多门店排班编制系统 - 轮岗偏好匹配
// ==========================================
// 谓词: branch_id / doctor_id (在岗医生之一) / day_of_week, 空=通配
// ==========================================

use crate::domain::staffing::StaffingPreference;
use crate::domain::types::DayOfWeek;
use crate::engine::predicate::PredicateMatcher;
use chrono::NaiveDate;

pub struct StaffingPreferenceMatcher {}

impl StaffingPreferenceMatcher {
    pub fn new() -> Self {
        Self {}
    }

    /// 返回与门店/日期/在岗医生匹配的偏好 (保持输入顺序)
    pub fn match_preferences<'a>(
        &self,
        prefs: &'a [StaffingPreference],
        branch_id: &str,
        date: NaiveDate,
        doctor_ids: &[String],
    ) -> Vec<&'a StaffingPreference> {
        let day = DayOfWeek::from_date(date);
        prefs
            .iter()
            .filter(|p| {
                PredicateMatcher::new(p.is_active)
                    .equals("branch_id", p.branch_id.as_deref(), Some(branch_id))
                    .contains("doctor_id", p.doctor_id.as_deref(), doctor_ids)
                    .equals("day_of_week", p.day_of_week.as_ref(), Some(&day))
                    .is_match()
            })
            .collect()
    }
}

impl Default for StaffingPreferenceMatcher {
    fn default() -> Self {
        Self::new()
    }
}
