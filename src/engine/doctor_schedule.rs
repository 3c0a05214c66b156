// ==========================================
// 多门店排班编制系统 - 医生排班解析
// ==========================================
// 优先级: INACTIVE -> DATE_OVERRIDE -> WEEKLY_OFF_DAY -> DEFAULT_SCHEDULE -> UNSCHEDULED(休息)
// 数据源:
// - RepositoryScheduleSource: 单点查询 (单医生单日)
// - DoctorScheduleSnapshot: 预加载 (区间批量)
// 红线: 两种数据源共用同一解析函数, 结果结构一致
// 红线: 停用医生在单点与批量中同样视为休息
// 红线: 医生上限不在此处校验 (写入边界负责)
// ==========================================

use crate::domain::doctor_schedule::{
    DoctorAssignment, DoctorAssignmentMap, DoctorScheduleSnapshot, ResolvedDoctorAssignment,
};
use crate::domain::types::{AssignmentSource, DayOfWeek};
use crate::engine::override_chain::{OverrideChain, Resolved};
use crate::repository::doctor_schedule_repo::DoctorScheduleRepository;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use tracing::instrument;

// ==========================================
// DoctorScheduleSource - 排班数据源
// ==========================================
pub trait DoctorScheduleSource {
    /// 参与批量/反查的医生 (在职)
    fn doctor_ids(&self) -> RepositoryResult<Vec<String>>;

    fn is_active(&self, doctor_id: &str) -> RepositoryResult<bool>;

    fn override_on(&self, doctor_id: &str, date: NaiveDate) -> RepositoryResult<Option<DoctorAssignment>>;

    fn is_weekly_off(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<bool>;

    fn default_branch(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<Option<String>>;
}

impl DoctorScheduleSource for DoctorScheduleSnapshot {
    fn doctor_ids(&self) -> RepositoryResult<Vec<String>> {
        Ok(self.doctor_ids.clone())
    }

    fn is_active(&self, doctor_id: &str) -> RepositoryResult<bool> {
        Ok(self.doctor_ids.iter().any(|d| d == doctor_id))
    }

    fn override_on(&self, doctor_id: &str, date: NaiveDate) -> RepositoryResult<Option<DoctorAssignment>> {
        Ok(self
            .overrides
            .get(&(doctor_id.to_string(), date))
            .map(|o| o.assignment.clone()))
    }

    fn is_weekly_off(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<bool> {
        Ok(self.weekly_off_days.contains(&(doctor_id.to_string(), day)))
    }

    fn default_branch(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<Option<String>> {
        Ok(self.defaults.get(&(doctor_id.to_string(), day)).cloned())
    }
}

/// 单点查询数据源
pub struct RepositoryScheduleSource<'a> {
    repo: &'a DoctorScheduleRepository,
}

impl<'a> RepositoryScheduleSource<'a> {
    pub fn new(repo: &'a DoctorScheduleRepository) -> Self {
        Self { repo }
    }
}

impl DoctorScheduleSource for RepositoryScheduleSource<'_> {
    fn doctor_ids(&self) -> RepositoryResult<Vec<String>> {
        self.repo.list_active_doctor_ids()
    }

    fn is_active(&self, doctor_id: &str) -> RepositoryResult<bool> {
        self.repo.is_doctor_active(doctor_id)
    }

    fn override_on(&self, doctor_id: &str, date: NaiveDate) -> RepositoryResult<Option<DoctorAssignment>> {
        Ok(self.repo.find_override(doctor_id, date)?.map(|o| o.assignment))
    }

    fn is_weekly_off(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<bool> {
        self.repo.is_weekly_off(doctor_id, day)
    }

    fn default_branch(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<Option<String>> {
        self.repo.find_default_branch(doctor_id, day)
    }
}

// ==========================================
// DoctorScheduleResolver - 排班解析器
// ==========================================
pub struct DoctorScheduleResolver {}

impl DoctorScheduleResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析单医生单日
    pub fn resolve<S>(
        &self,
        source: &S,
        doctor_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<ResolvedDoctorAssignment>
    where
        S: DoctorScheduleSource + ?Sized,
    {
        let day = DayOfWeek::from_date(date);
        let date_override = source.override_on(doctor_id, date)?;
        let winner = self.resolve_layers(source, doctor_id, day, date_override)?;

        Ok(ResolvedDoctorAssignment {
            doctor_id: doctor_id.to_string(),
            date,
            assignment: winner.value,
            source: winner.source,
        })
    }

    /// 仅按周期规则解析 (该星期中没有日期覆写的日子)
    pub fn resolve_weekly<S>(
        &self,
        source: &S,
        doctor_id: &str,
        day: DayOfWeek,
    ) -> RepositoryResult<Resolved<AssignmentSource, DoctorAssignment>>
    where
        S: DoctorScheduleSource + ?Sized,
    {
        self.resolve_layers(source, doctor_id, day, None)
    }

    fn resolve_layers<S>(
        &self,
        source: &S,
        doctor_id: &str,
        day: DayOfWeek,
        date_override: Option<DoctorAssignment>,
    ) -> RepositoryResult<Resolved<AssignmentSource, DoctorAssignment>>
    where
        S: DoctorScheduleSource + ?Sized,
    {
        let inactive = (!source.is_active(doctor_id)?).then_some(DoctorAssignment::Off);
        let weekly_off = source
            .is_weekly_off(doctor_id, day)?
            .then_some(DoctorAssignment::Off);
        let default_schedule = source
            .default_branch(doctor_id, day)?
            .map(|branch_id| DoctorAssignment::Working { branch_id });

        Ok(OverrideChain::new()
            .layer(AssignmentSource::Inactive, inactive)
            .layer(AssignmentSource::DateOverride, date_override)
            .layer(AssignmentSource::WeeklyOffDay, weekly_off)
            .layer(AssignmentSource::DefaultSchedule, default_schedule)
            .resolve_or(AssignmentSource::Unscheduled, DoctorAssignment::Off))
    }

    /// 区间批量解析: branch -> date -> [doctor]
    ///
    /// 调用方保证 start <= end; 休息的医生不出现在结果中
    #[instrument(skip(self, source), fields(start = %start, end = %end))]
    pub fn resolve_range<S>(
        &self,
        source: &S,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<DoctorAssignmentMap>
    where
        S: DoctorScheduleSource + ?Sized,
    {
        let doctor_ids = source.doctor_ids()?;
        let mut result = DoctorAssignmentMap::new();

        let mut date = start;
        while date <= end {
            for doctor_id in &doctor_ids {
                let resolved = self.resolve(source, doctor_id, date)?;
                if let DoctorAssignment::Working { branch_id } = resolved.assignment {
                    result
                        .entry(branch_id)
                        .or_default()
                        .entry(date)
                        .or_default()
                        .push(doctor_id.clone());
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        tracing::debug!(
            doctors = doctor_ids.len(),
            branches = result.len(),
            "区间排班解析完成"
        );
        Ok(result)
    }

    /// 反查: 某门店某日在岗医生 (按医生 ID 排序)
    pub fn doctors_at_branch<S>(
        &self,
        source: &S,
        branch_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<String>>
    where
        S: DoctorScheduleSource + ?Sized,
    {
        let mut doctors = Vec::new();
        for doctor_id in source.doctor_ids()? {
            let resolved = self.resolve(source, &doctor_id, date)?;
            if resolved.assignment.branch_id() == Some(branch_id) {
                doctors.push(doctor_id);
            }
        }
        doctors.sort();
        Ok(doctors)
    }

    /// 反查 (周期规则): 某门店某星期无覆写日的在岗医生
    pub fn weekly_doctors_at_branch<S>(
        &self,
        source: &S,
        branch_id: &str,
        day: DayOfWeek,
    ) -> RepositoryResult<Vec<String>>
    where
        S: DoctorScheduleSource + ?Sized,
    {
        let mut doctors = Vec::new();
        for doctor_id in source.doctor_ids()? {
            let resolved = self.resolve_weekly(source, &doctor_id, day)?;
            if resolved.value.branch_id() == Some(branch_id) {
                doctors.push(doctor_id);
            }
        }
        doctors.sort();
        Ok(doctors)
    }
}

impl Default for DoctorScheduleResolver {
    fn default() -> Self {
        Self::new()
    }
}
