// ==========================================
// 多门店排班编制系统 - 定编与营收仓储
// ==========================================
// 职责: position_quota / revenue_level_tier / 营收事实 读写
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::quota::{PositionQuota, RevenueFacts, RevenueLevelTier};
use crate::domain::types::DayOfWeek;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_mapping::day_param;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct QuotaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QuotaRepository {
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

    // ==========================================
    // 岗位定编
    // ==========================================

    pub fn find_position_quota(
        &self,
        branch_id: &str,
        position_id: &str,
    ) -> RepositoryResult<Option<PositionQuota>> {
        let conn = self.get_conn()?;
        let quota = conn
            .query_row(
                r#"
                SELECT branch_id, position_id, designated_quota, minimum_required
                FROM position_quota
                WHERE branch_id = ?1 AND position_id = ?2
                "#,
                params![branch_id, position_id],
                |row| {
                    Ok(PositionQuota {
                        branch_id: row.get(0)?,
                        position_id: row.get(1)?,
                        designated_quota: row.get(2)?,
                        minimum_required: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(quota)
    }

    pub fn list_position_quotas(&self, branch_id: &str) -> RepositoryResult<Vec<PositionQuota>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT branch_id, position_id, designated_quota, minimum_required
            FROM position_quota
            WHERE branch_id = ?1
            ORDER BY position_id
            "#,
        )?;
        let quotas = stmt
            .query_map(params![branch_id], |row| {
                Ok(PositionQuota {
                    branch_id: row.get(0)?,
                    position_id: row.get(1)?,
                    designated_quota: row.get(2)?,
                    minimum_required: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<PositionQuota>>>()?;
        Ok(quotas)
    }

    pub fn upsert_position_quota(&self, quota: &PositionQuota) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO position_quota (branch_id, position_id, designated_quota, minimum_required)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(branch_id, position_id) DO UPDATE SET
                designated_quota = excluded.designated_quota,
                minimum_required = excluded.minimum_required
            "#,
            params![
                quota.branch_id,
                quota.position_id,
                quota.designated_quota,
                quota.minimum_required
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 营收分级
    // ==========================================

    pub fn list_revenue_tiers(&self) -> RepositoryResult<Vec<RevenueLevelTier>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT tier_id, name, level, min_revenue, max_revenue
            FROM revenue_level_tier
            ORDER BY level, tier_id
            "#,
        )?;
        let tiers = stmt
            .query_map([], |row| {
                Ok(RevenueLevelTier {
                    tier_id: row.get(0)?,
                    name: row.get(1)?,
                    level: row.get(2)?,
                    min_revenue: row.get(3)?,
                    max_revenue: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<RevenueLevelTier>>>()?;
        Ok(tiers)
    }

    pub fn upsert_revenue_tier(&self, tier: &RevenueLevelTier) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO revenue_level_tier (tier_id, name, level, min_revenue, max_revenue)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(tier_id) DO UPDATE SET
                name = excluded.name,
                level = excluded.level,
                min_revenue = excluded.min_revenue,
                max_revenue = excluded.max_revenue
            "#,
            params![
                tier.tier_id,
                tier.name,
                tier.level,
                tier.min_revenue,
                tier.max_revenue
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 营收事实
    // ==========================================

    /// 门店某日的预期 (按星期) 与实际 (按日期) 营收
    pub fn load_revenue_facts(&self, branch_id: &str, date: NaiveDate) -> RepositoryResult<RevenueFacts> {
        let conn = self.get_conn()?;
        let day = DayOfWeek::from_date(date);

        let expected: Option<f64> = conn
            .query_row(
                "SELECT expected_revenue FROM branch_expected_revenue WHERE branch_id = ?1 AND day_of_week = ?2",
                params![branch_id, day_param(day)],
                |row| row.get(0),
            )
            .optional()?;
        let actual: Option<f64> = conn
            .query_row(
                "SELECT actual_revenue FROM branch_actual_revenue WHERE branch_id = ?1 AND revenue_date = ?2",
                params![branch_id, date],
                |row| row.get(0),
            )
            .optional()?;

        Ok(RevenueFacts {
            expected_by_day_of_week: expected,
            actual_by_date: actual,
        })
    }

    pub fn upsert_expected_revenue(
        &self,
        branch_id: &str,
        day: DayOfWeek,
        expected_revenue: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO branch_expected_revenue (branch_id, day_of_week, expected_revenue)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(branch_id, day_of_week) DO UPDATE SET expected_revenue = excluded.expected_revenue
            "#,
            params![branch_id, day_param(day), expected_revenue],
        )?;
        Ok(())
    }

    pub fn upsert_actual_revenue(
        &self,
        branch_id: &str,
        date: NaiveDate,
        actual_revenue: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO branch_actual_revenue (branch_id, revenue_date, actual_revenue)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(branch_id, revenue_date) DO UPDATE SET actual_revenue = excluded.actual_revenue
            "#,
            params![branch_id, date, actual_revenue],
        )?;
        Ok(())
    }
}
