// ==========================================
// 多门店排班编制系统 - 编制达成快照仓储
// ==========================================
// 职责: branch_quota_summary / position_quota_summary 的整体替换与读取
// 说明: 门店级明细 (人员组/缺员/告警) 以 JSON 存入 detail_json
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::summary::{BranchQuotaSummary, PositionQuotaSummary, QuotaStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct QuotaSummaryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QuotaSummaryRepository {
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

    /// 替换 (branch, date) 的快照
    pub fn replace_summary(&self, status: &QuotaStatus) -> RepositoryResult<()> {
        let branch = &status.branch;
        let detail_json = serde_json::to_string(branch)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        // 级联删除岗位明细
        tx.execute(
            "DELETE FROM branch_quota_summary WHERE branch_id = ?1 AND summary_date = ?2",
            params![branch.branch_id, branch.date],
        )?;
        tx.execute(
            r#"
            INSERT INTO branch_quota_summary (
                branch_id, summary_date, total_designated, total_minimum, total_available,
                total_assigned, total_required, is_fulfilled, detail_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                branch.branch_id,
                branch.date,
                branch.total_designated,
                branch.total_minimum,
                branch.total_available,
                branch.total_assigned,
                branch.total_required,
                branch.is_fulfilled,
                detail_json,
            ],
        )?;

        for p in &status.positions {
            tx.execute(
                r#"
                INSERT INTO position_quota_summary (
                    branch_id, summary_date, position_id, position_name, designated_quota,
                    minimum_required, available_local, assigned_rotation, still_required
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    p.branch_id,
                    p.date,
                    p.position_id,
                    p.position_name,
                    p.designated_quota,
                    p.minimum_required,
                    p.available_local,
                    p.assigned_rotation,
                    p.still_required,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn find_summary(&self, branch_id: &str, date: NaiveDate) -> RepositoryResult<Option<QuotaStatus>> {
        let conn = self.get_conn()?;

        let detail_json: Option<String> = conn
            .query_row(
                "SELECT detail_json FROM branch_quota_summary WHERE branch_id = ?1 AND summary_date = ?2",
                params![branch_id, date],
                |row| row.get(0),
            )
            .optional()?;
        let Some(detail_json) = detail_json else {
            return Ok(None);
        };
        let branch: BranchQuotaSummary = serde_json::from_str(&detail_json)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT branch_id, summary_date, position_id, position_name, designated_quota,
                   minimum_required, available_local, assigned_rotation, still_required
            FROM position_quota_summary
            WHERE branch_id = ?1 AND summary_date = ?2
            ORDER BY position_id
            "#,
        )?;
        let positions = stmt
            .query_map(params![branch_id, date], |row| {
                Ok(PositionQuotaSummary {
                    branch_id: row.get(0)?,
                    date: row.get(1)?,
                    position_id: row.get(2)?,
                    position_name: row.get(3)?,
                    designated_quota: row.get(4)?,
                    minimum_required: row.get(5)?,
                    available_local: row.get(6)?,
                    assigned_rotation: row.get(7)?,
                    still_required: row.get(8)?,
                })
            })?
            .collect::<SqliteResult<Vec<PositionQuotaSummary>>>()?;

        Ok(Some(QuotaStatus { branch, positions }))
    }
}
