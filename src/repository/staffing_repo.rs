// ==========================================
// 多门店排班编制系统 - 人员到岗事实仓储
// ==========================================
// 职责: 本店可用人数 / 已派轮岗人数 / 轮岗偏好
// 口径:
// - 本店可用: 在职, 非轮岗, 归属本店, 当日未请假
// - 已派轮岗: 当日派往本店且未取消的轮岗记录
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::staffing::{StaffingPreference, StaffingSnapshot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_mapping::{day_param, optional_day_of_week_at};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct StaffingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StaffingRepository {
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

    /// 门店某日到岗快照
    pub fn load_snapshot(&self, branch_id: &str, date: NaiveDate) -> RepositoryResult<StaffingSnapshot> {
        let conn = self.get_conn()?;
        let mut snapshot = StaffingSnapshot::default();

        {
            let mut stmt = conn.prepare(
                r#"
                SELECT s.staff_id, s.position_id
                FROM staff s
                WHERE s.branch_id = ?1
                  AND s.is_active = 1
                  AND s.is_rotation = 0
                  AND NOT EXISTS (
                      SELECT 1 FROM staff_leave l
                      WHERE l.staff_id = s.staff_id AND l.leave_date = ?2
                  )
                ORDER BY s.staff_id
                "#,
            )?;
            let rows = stmt
                .query_map(params![branch_id, date], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<SqliteResult<Vec<(String, String)>>>()?;
            for (staff_id, position_id) in rows {
                *snapshot.available_local.entry(position_id).or_insert(0) += 1;
                snapshot.present_staff_ids.insert(staff_id);
            }
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT staff_id, position_id
            FROM rotation_assignment
            WHERE branch_id = ?1
              AND assignment_date = ?2
              AND status <> 'CANCELLED'
            ORDER BY staff_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![branch_id, date], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<SqliteResult<Vec<(String, String)>>>()?;
        for (staff_id, position_id) in rows {
            *snapshot.assigned_rotation.entry(position_id).or_insert(0) += 1;
            snapshot.present_staff_ids.insert(staff_id);
        }

        Ok(snapshot)
    }

    // ==========================================
    // 请假 / 轮岗派遣
    // ==========================================

    pub fn record_leave(&self, staff_id: &str, date: NaiveDate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO staff_leave (staff_id, leave_date) VALUES (?1, ?2)",
            params![staff_id, date],
        )?;
        Ok(())
    }

    /// 登记轮岗派遣, 返回 assignment_id
    pub fn record_rotation_assignment(
        &self,
        staff_id: &str,
        branch_id: &str,
        position_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let assignment_id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            r#"
            INSERT INTO rotation_assignment (assignment_id, staff_id, branch_id, position_id, assignment_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![assignment_id, staff_id, branch_id, position_id, date],
        )?;
        Ok(assignment_id)
    }

    pub fn cancel_rotation_assignment(&self, assignment_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE rotation_assignment SET status = 'CANCELLED' WHERE assignment_id = ?1",
            params![assignment_id],
        )?;
        Ok(affected > 0)
    }

    // ==========================================
    // 轮岗偏好
    // ==========================================

    pub fn list_preferences(&self) -> RepositoryResult<Vec<StaffingPreference>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT preference_id, staff_id, branch_id, doctor_id, day_of_week, is_active, note
            FROM staffing_preference
            ORDER BY staff_id, preference_id
            "#,
        )?;
        let prefs = stmt
            .query_map([], |row| {
                Ok(StaffingPreference {
                    preference_id: row.get(0)?,
                    staff_id: row.get(1)?,
                    branch_id: row.get(2)?,
                    doctor_id: row.get(3)?,
                    day_of_week: optional_day_of_week_at(row, 4)?,
                    is_active: row.get(5)?,
                    note: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<StaffingPreference>>>()?;
        Ok(prefs)
    }

    pub fn upsert_preference(&self, pref: &StaffingPreference) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO staffing_preference (preference_id, staff_id, branch_id, doctor_id, day_of_week, is_active, note)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(preference_id) DO UPDATE SET
                staff_id = excluded.staff_id,
                branch_id = excluded.branch_id,
                doctor_id = excluded.doctor_id,
                day_of_week = excluded.day_of_week,
                is_active = excluded.is_active,
                note = excluded.note
            "#,
            params![
                pref.preference_id,
                pref.staff_id,
                pref.branch_id,
                pref.doctor_id,
                pref.day_of_week.map(day_param),
                pref.is_active,
                pref.note,
            ],
        )?;
        Ok(())
    }
}
