// ==========================================
// 多门店排班编制系统 - 医生排班 API
// ==========================================
// 职责:
// 1. 单医生单日解析 / 区间批量解析 / 门店反查
// 2. 默认周排班、每周休息日、日期覆写的写入
// 红线: 医生上限在写入事务内计数并拒绝, 解析侧不做限制
// 红线: 凡可能让医生重新在岗的写入 (设置排班/清除覆写/清除休息日) 都要复核上限
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{
    parse_day_of_week, validate_date_range, validate_override_shape, ScheduleOverrideInput,
};
use crate::config::ConfigManager;
use crate::domain::doctor_schedule::{
    DoctorAssignmentMap, DoctorDefaultSchedule, DoctorScheduleSnapshot, ResolvedDoctorAssignment,
    ScheduleOverride,
};
use crate::domain::types::DayOfWeek;
use crate::engine::{DoctorScheduleResolver, RepositoryScheduleSource};
use crate::repository::{BranchRepository, DoctorScheduleRepository, RepositoryError};

/// 医生排班 API
pub struct DoctorScheduleApi {
    branch_repo: Arc<BranchRepository>,
    schedule_repo: Arc<DoctorScheduleRepository>,
    config: Arc<ConfigManager>,
}

impl DoctorScheduleApi {
    pub fn new(
        branch_repo: Arc<BranchRepository>,
        schedule_repo: Arc<DoctorScheduleRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            branch_repo,
            schedule_repo,
            config,
        }
    }

    // ==========================================
    // 解析
    // ==========================================

    /// 单医生单日 (单点查询)
    #[instrument(skip(self))]
    pub fn resolve_doctor_assignment(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> ApiResult<ResolvedDoctorAssignment> {
        self.ensure_doctor(doctor_id)?;
        let source = RepositoryScheduleSource::new(&self.schedule_repo);
        Ok(DoctorScheduleResolver::new().resolve(&source, doctor_id, date)?)
    }

    /// 区间批量: branch -> date -> [doctor] (每个数据源只加载一次)
    #[instrument(skip(self))]
    pub fn resolve_doctor_assignments(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<DoctorAssignmentMap> {
        validate_date_range(start, end)?;
        let snapshot = self.schedule_repo.load_snapshot(start, end)?;
        Ok(DoctorScheduleResolver::new().resolve_range(&snapshot, start, end)?)
    }

    /// 门店某日在岗医生
    #[instrument(skip(self))]
    pub fn doctors_at_branch(&self, branch_id: &str, date: NaiveDate) -> ApiResult<Vec<String>> {
        self.branch_repo.get_branch(branch_id)?;
        let snapshot = self.schedule_repo.load_snapshot(date, date)?;
        Ok(DoctorScheduleResolver::new().doctors_at_branch(&snapshot, branch_id, date)?)
    }

    pub fn count_doctors_at_branch(&self, branch_id: &str, date: NaiveDate) -> ApiResult<usize> {
        Ok(self.doctors_at_branch(branch_id, date)?.len())
    }

    // ==========================================
    // 默认周排班
    // ==========================================

    /// 设置默认周排班 (upsert)
    ///
    /// 写入后复核: 该星期无覆写的日子, 以及该星期每个有覆写的日期,
    /// 门店其他在岗医生已达上限则拒绝并回滚
    #[instrument(skip(self))]
    pub fn set_default_schedule(
        &self,
        doctor_id: &str,
        day_of_week: i64,
        branch_id: &str,
    ) -> ApiResult<()> {
        self.ensure_doctor(doctor_id)?;
        self.branch_repo.get_branch(branch_id)?;
        let day = parse_day_of_week(day_of_week)?;
        let limit = self.config.get_max_doctors_per_branch_day()?;

        let schedule = DoctorDefaultSchedule {
            doctor_id: doctor_id.to_string(),
            day_of_week: day,
            branch_id: branch_id.to_string(),
        };

        self.schedule_repo.with_transaction(|conn| -> ApiResult<()> {
            DoctorScheduleRepository::upsert_default_schedule_in(conn, &schedule)?;
            check_day_of_week_capacity_in(conn, doctor_id, day, limit)
        })?;

        tracing::info!(doctor_id, branch_id, %day, "默认周排班已更新");
        Ok(())
    }

    pub fn clear_default_schedule(&self, doctor_id: &str, day_of_week: i64) -> ApiResult<bool> {
        self.ensure_doctor(doctor_id)?;
        let day = parse_day_of_week(day_of_week)?;
        Ok(self.schedule_repo.delete_default_schedule(doctor_id, day)?)
    }

    // ==========================================
    // 每周休息日
    // ==========================================

    pub fn set_weekly_off_day(&self, doctor_id: &str, day_of_week: i64) -> ApiResult<()> {
        self.ensure_doctor(doctor_id)?;
        let day = parse_day_of_week(day_of_week)?;
        self.schedule_repo.set_weekly_off_day(doctor_id, day)?;
        tracing::info!(doctor_id, %day, "每周休息日已设置");
        Ok(())
    }

    /// 清除每周休息日; 默认排班恢复生效后超出上限则拒绝
    #[instrument(skip(self))]
    pub fn clear_weekly_off_day(&self, doctor_id: &str, day_of_week: i64) -> ApiResult<bool> {
        self.ensure_doctor(doctor_id)?;
        let day = parse_day_of_week(day_of_week)?;
        let limit = self.config.get_max_doctors_per_branch_day()?;

        let cleared = self.schedule_repo.with_transaction(|conn| -> ApiResult<bool> {
            let cleared = DoctorScheduleRepository::clear_weekly_off_day_in(conn, doctor_id, day)?;
            if cleared {
                check_day_of_week_capacity_in(conn, doctor_id, day, limit)?;
            }
            Ok(cleared)
        })?;

        if cleared {
            tracing::info!(doctor_id, %day, "每周休息日已清除");
        }
        Ok(cleared)
    }

    // ==========================================
    // 日期覆写
    // ==========================================

    /// 写入日期覆写, 返回写入后的解析结果
    ///
    /// # 校验
    /// - working 必须带门店, off 不得带门店
    /// - 事务内写入后复核: 医生当日在岗时, 该门店其他在岗医生已达上限则拒绝
    #[instrument(skip(self, input), fields(override_type = %input.override_type))]
    pub fn set_schedule_override(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        input: &ScheduleOverrideInput,
    ) -> ApiResult<ResolvedDoctorAssignment> {
        self.ensure_doctor(doctor_id)?;
        let assignment = validate_override_shape(input)?;
        if let Some(branch_id) = assignment.branch_id() {
            self.branch_repo.get_branch(branch_id)?;
        }
        let limit = self.config.get_max_doctors_per_branch_day()?;

        let schedule_override = ScheduleOverride {
            doctor_id: doctor_id.to_string(),
            date,
            assignment,
            reason: input.reason.clone(),
        };

        self.schedule_repo.with_transaction(|conn| -> ApiResult<()> {
            DoctorScheduleRepository::upsert_override_in(conn, &schedule_override)?;
            check_date_capacity_in(conn, doctor_id, date, limit)
        })?;

        tracing::info!(doctor_id, %date, "日期覆写已写入");
        self.resolve_doctor_assignment(doctor_id, date)
    }

    /// 清除日期覆写; 周期规则恢复生效后超出上限则拒绝
    #[instrument(skip(self))]
    pub fn clear_schedule_override(&self, doctor_id: &str, date: NaiveDate) -> ApiResult<bool> {
        self.ensure_doctor(doctor_id)?;
        let limit = self.config.get_max_doctors_per_branch_day()?;

        let cleared = self.schedule_repo.with_transaction(|conn| -> ApiResult<bool> {
            let cleared = DoctorScheduleRepository::delete_override_in(conn, doctor_id, date)?;
            if cleared {
                check_date_capacity_in(conn, doctor_id, date, limit)?;
            }
            Ok(cleared)
        })?;

        if cleared {
            tracing::info!(doctor_id, %date, "日期覆写已清除");
        }
        Ok(cleared)
    }

    fn ensure_doctor(&self, doctor_id: &str) -> ApiResult<()> {
        match self.branch_repo.find_doctor(doctor_id)? {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound(format!("Doctor(id={})不存在", doctor_id))),
        }
    }
}

// ==========================================
// 上限复核 (事务内, 写入之后)
// ==========================================

/// 单日: 医生当日在岗时, 同门店其他在岗医生数须低于上限
fn check_date_capacity_in(
    conn: &Connection,
    doctor_id: &str,
    date: NaiveDate,
    limit: i32,
) -> ApiResult<()> {
    let snapshot = DoctorScheduleRepository::load_snapshot_in(conn, date, date)?;
    check_resolved_capacity(&snapshot, doctor_id, date, limit)
}

/// 星期: 无覆写的日子按周期规则复核, 有覆写的日期逐日复核
fn check_day_of_week_capacity_in(
    conn: &Connection,
    doctor_id: &str,
    day: DayOfWeek,
    limit: i32,
) -> ApiResult<()> {
    let resolver = DoctorScheduleResolver::new();
    let snapshot = DoctorScheduleRepository::load_full_snapshot_in(conn)?;

    let weekly = resolver.resolve_weekly(&snapshot, doctor_id, day)?;
    if let Some(branch_id) = weekly.value.branch_id() {
        let doctors = resolver.weekly_doctors_at_branch(&snapshot, branch_id, day)?;
        ensure_below_limit(branch_id, format!("day_of_week={}", day), &doctors, doctor_id, limit)?;
    }

    let override_dates: BTreeSet<NaiveDate> = snapshot
        .overrides
        .keys()
        .map(|(_, date)| *date)
        .filter(|date| DayOfWeek::from_date(*date) == day)
        .collect();
    for date in override_dates {
        check_resolved_capacity(&snapshot, doctor_id, date, limit)?;
    }
    Ok(())
}

fn check_resolved_capacity(
    snapshot: &DoctorScheduleSnapshot,
    doctor_id: &str,
    date: NaiveDate,
    limit: i32,
) -> ApiResult<()> {
    let resolver = DoctorScheduleResolver::new();
    let resolved = resolver.resolve(snapshot, doctor_id, date)?;
    if let Some(branch_id) = resolved.assignment.branch_id() {
        let doctors = resolver.doctors_at_branch(snapshot, branch_id, date)?;
        ensure_below_limit(branch_id, date.to_string(), &doctors, doctor_id, limit)?;
    }
    Ok(())
}

fn ensure_below_limit(
    branch_id: &str,
    at: String,
    doctors: &[String],
    doctor_id: &str,
    limit: i32,
) -> ApiResult<()> {
    let others = doctors.iter().filter(|d| d.as_str() != doctor_id).count();
    let current =
        i64::try_from(others).map_err(|e| RepositoryError::InternalError(e.to_string()))?;
    if current >= i64::from(limit) {
        return Err(ApiError::CapacityViolation {
            branch_id: branch_id.to_string(),
            at,
            current,
            limit,
        });
    }
    Ok(())
}
