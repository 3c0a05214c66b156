// ==========================================
// 多门店排班编制系统 - 医生排班仓储
// ==========================================
// 职责: 默认周排班 / 每周休息日 / 日期覆写 的读写
// 红线: 医生上限校验在 API 写入边界完成, 仓储只提供事务与计数原语
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::doctor_schedule::{
    DoctorAssignment, DoctorDefaultSchedule, DoctorScheduleSnapshot, DoctorWeeklyOffDay,
    ScheduleOverride,
};
use crate::domain::types::{DayOfWeek, OverrideType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_mapping::{day_of_week_at, day_param};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior,
};
use std::sync::{Arc, Mutex};

// ==========================================
// DoctorScheduleRepository
// ==========================================
pub struct DoctorScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DoctorScheduleRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在 IMMEDIATE 事务内执行闭包
    ///
    /// 闭包返回 Err 时回滚; 计数与写入在同一事务中完成, 避免并发写入越过上限
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let mut conn = self.get_conn().map_err(E::from)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| E::from(RepositoryError::DatabaseTransactionError(e.to_string())))?;

        let value = f(&*tx)?;

        tx.commit()
            .map_err(|e| E::from(RepositoryError::DatabaseTransactionError(e.to_string())))?;
        Ok(value)
    }

    // ==========================================
    // 医生名单
    // ==========================================

    /// 在职医生 ID (排序)
    pub fn list_active_doctor_ids(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        Self::list_active_doctor_ids_in(&conn)
    }

    pub fn list_active_doctor_ids_in(conn: &Connection) -> RepositoryResult<Vec<String>> {
        let mut stmt =
            conn.prepare("SELECT doctor_id FROM doctor WHERE is_active = 1 ORDER BY doctor_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<SqliteResult<Vec<String>>>()?;
        Ok(ids)
    }

    /// 医生是否在职 (不存在视为停用)
    pub fn is_doctor_active(&self, doctor_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let active = conn
            .query_row(
                "SELECT is_active FROM doctor WHERE doctor_id = ?1",
                params![doctor_id],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(false);
        Ok(active)
    }

    // ==========================================
    // 默认周排班
    // ==========================================

    pub fn find_default_branch(
        &self,
        doctor_id: &str,
        day: DayOfWeek,
    ) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let branch_id = conn
            .query_row(
                "SELECT branch_id FROM doctor_default_schedule WHERE doctor_id = ?1 AND day_of_week = ?2",
                params![doctor_id, day_param(day)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(branch_id)
    }

    pub fn list_default_schedules(&self) -> RepositoryResult<Vec<DoctorDefaultSchedule>> {
        let conn = self.get_conn()?;
        Self::list_default_schedules_in(&conn)
    }

    pub fn list_default_schedules_in(conn: &Connection) -> RepositoryResult<Vec<DoctorDefaultSchedule>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT doctor_id, day_of_week, branch_id
            FROM doctor_default_schedule
            ORDER BY doctor_id, day_of_week
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DoctorDefaultSchedule {
                    doctor_id: row.get(0)?,
                    day_of_week: day_of_week_at(row, 1)?,
                    branch_id: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<DoctorDefaultSchedule>>>()?;
        Ok(rows)
    }

    pub fn upsert_default_schedule_in(
        conn: &Connection,
        schedule: &DoctorDefaultSchedule,
    ) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO doctor_default_schedule (doctor_id, day_of_week, branch_id)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(doctor_id, day_of_week) DO UPDATE SET branch_id = excluded.branch_id
            "#,
            params![
                schedule.doctor_id,
                day_param(schedule.day_of_week),
                schedule.branch_id
            ],
        )?;
        Ok(())
    }

    pub fn delete_default_schedule(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM doctor_default_schedule WHERE doctor_id = ?1 AND day_of_week = ?2",
            params![doctor_id, day_param(day)],
        )?;
        Ok(affected > 0)
    }

    // ==========================================
    // 每周休息日
    // ==========================================

    pub fn is_weekly_off(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists = conn
            .query_row(
                "SELECT 1 FROM doctor_weekly_off_day WHERE doctor_id = ?1 AND day_of_week = ?2",
                params![doctor_id, day_param(day)],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    pub fn list_weekly_off_days(&self) -> RepositoryResult<Vec<DoctorWeeklyOffDay>> {
        let conn = self.get_conn()?;
        Self::list_weekly_off_days_in(&conn)
    }

    pub fn list_weekly_off_days_in(conn: &Connection) -> RepositoryResult<Vec<DoctorWeeklyOffDay>> {
        let mut stmt = conn.prepare(
            "SELECT doctor_id, day_of_week FROM doctor_weekly_off_day ORDER BY doctor_id, day_of_week",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DoctorWeeklyOffDay {
                    doctor_id: row.get(0)?,
                    day_of_week: day_of_week_at(row, 1)?,
                })
            })?
            .collect::<SqliteResult<Vec<DoctorWeeklyOffDay>>>()?;
        Ok(rows)
    }

    pub fn set_weekly_off_day(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO doctor_weekly_off_day (doctor_id, day_of_week) VALUES (?1, ?2)",
            params![doctor_id, day_param(day)],
        )?;
        Ok(())
    }

    pub fn clear_weekly_off_day(&self, doctor_id: &str, day: DayOfWeek) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Self::clear_weekly_off_day_in(&conn, doctor_id, day)
    }

    pub fn clear_weekly_off_day_in(
        conn: &Connection,
        doctor_id: &str,
        day: DayOfWeek,
    ) -> RepositoryResult<bool> {
        let affected = conn.execute(
            "DELETE FROM doctor_weekly_off_day WHERE doctor_id = ?1 AND day_of_week = ?2",
            params![doctor_id, day_param(day)],
        )?;
        Ok(affected > 0)
    }

    // ==========================================
    // 日期覆写
    // ==========================================

    pub fn find_override(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<ScheduleOverride>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                r#"
                SELECT doctor_id, override_date, override_type, branch_id, reason
                FROM doctor_schedule_override
                WHERE doctor_id = ?1 AND override_date = ?2
                "#,
                params![doctor_id, date],
                map_override_row,
            )
            .optional()?;
        Ok(found)
    }

    /// 日期区间 [start, end] 内的全部覆写
    pub fn list_overrides_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<ScheduleOverride>> {
        let conn = self.get_conn()?;
        Self::list_overrides_in_range_in(&conn, start, end)
    }

    pub fn list_overrides_in_range_in(
        conn: &Connection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<ScheduleOverride>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT doctor_id, override_date, override_type, branch_id, reason
            FROM doctor_schedule_override
            WHERE override_date BETWEEN ?1 AND ?2
            ORDER BY override_date, doctor_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![start, end], map_override_row)?
            .collect::<SqliteResult<Vec<ScheduleOverride>>>()?;
        Ok(rows)
    }

    pub fn list_all_overrides_in(conn: &Connection) -> RepositoryResult<Vec<ScheduleOverride>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT doctor_id, override_date, override_type, branch_id, reason
            FROM doctor_schedule_override
            ORDER BY override_date, doctor_id
            "#,
        )?;
        let rows = stmt
            .query_map([], map_override_row)?
            .collect::<SqliteResult<Vec<ScheduleOverride>>>()?;
        Ok(rows)
    }

    pub fn upsert_override_in(conn: &Connection, ov: &ScheduleOverride) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO doctor_schedule_override (doctor_id, override_date, override_type, branch_id, reason)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(doctor_id, override_date) DO UPDATE SET
                override_type = excluded.override_type,
                branch_id = excluded.branch_id,
                reason = excluded.reason
            "#,
            params![
                ov.doctor_id,
                ov.date,
                ov.assignment.override_type().to_db_str(),
                ov.assignment.branch_id(),
                ov.reason,
            ],
        )?;
        Ok(())
    }

    pub fn delete_override(&self, doctor_id: &str, date: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Self::delete_override_in(&conn, doctor_id, date)
    }

    pub fn delete_override_in(
        conn: &Connection,
        doctor_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<bool> {
        let affected = conn.execute(
            "DELETE FROM doctor_schedule_override WHERE doctor_id = ?1 AND override_date = ?2",
            params![doctor_id, date],
        )?;
        Ok(affected > 0)
    }

    // ==========================================
    // 快照
    // ==========================================

    /// 一次性加载区间解析所需的全部数据
    pub fn load_snapshot(&self, start: NaiveDate, end: NaiveDate) -> RepositoryResult<DoctorScheduleSnapshot> {
        let conn = self.get_conn()?;
        Self::load_snapshot_in(&conn, start, end)
    }

    pub fn load_snapshot_in(
        conn: &Connection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<DoctorScheduleSnapshot> {
        Ok(DoctorScheduleSnapshot::from_rows(
            Self::list_active_doctor_ids_in(conn)?,
            Self::list_default_schedules_in(conn)?,
            Self::list_weekly_off_days_in(conn)?,
            Self::list_overrides_in_range_in(conn, start, end)?,
        ))
    }

    /// 含全部日期覆写的快照 (写入边界按星期校验上限时使用)
    pub fn load_full_snapshot_in(conn: &Connection) -> RepositoryResult<DoctorScheduleSnapshot> {
        Ok(DoctorScheduleSnapshot::from_rows(
            Self::list_active_doctor_ids_in(conn)?,
            Self::list_default_schedules_in(conn)?,
            Self::list_weekly_off_days_in(conn)?,
            Self::list_all_overrides_in(conn)?,
        ))
    }
}

fn map_override_row(row: &Row<'_>) -> SqliteResult<ScheduleOverride> {
    let raw_type: String = row.get(2)?;
    let branch_id: Option<String> = row.get(3)?;

    let assignment = match (OverrideType::from_str(&raw_type), branch_id) {
        (Some(OverrideType::Working), Some(branch_id)) => DoctorAssignment::Working { branch_id },
        (Some(OverrideType::Off), _) => DoctorAssignment::Off,
        (Some(OverrideType::Working), None) => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Null,
                "working 覆写缺少 branch_id".into(),
            ))
        }
        (None, _) => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                format!("未知 override_type: {}", raw_type).into(),
            ))
        }
    };

    Ok(ScheduleOverride {
        doctor_id: row.get(0)?,
        date: row.get(1)?,
        assignment,
        reason: row.get(4)?,
    })
}
