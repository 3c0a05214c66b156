// ==========================================
// 多门店排班编制系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// 说明: 每次解析调用读取一次快照, 不做进程级缓存
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::RevenueSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 同一门店同一日期的医生上限默认值
pub const DEFAULT_MAX_DOCTORS_PER_BRANCH_DAY: i32 = 6;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ResolverConfig - 解析配置快照
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub max_doctors_per_branch_day: i32,
    pub revenue_fallback: RevenueSource, // 情景未指定营收口径时使用
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_doctors_per_branch_day: DEFAULT_MAX_DOCTORS_PER_BRANCH_DAY,
            revenue_fallback: RevenueSource::DayOfWeek,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
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

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值 (upsert)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 全部 global 配置 (按 key 排序)
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 同一门店同一日期的医生上限
    pub fn get_max_doctors_per_branch_day(&self) -> RepositoryResult<i32> {
        let value = self.get_global_config_value(config_keys::DOCTOR_MAX_PER_BRANCH_DAY)?;
        Ok(match value {
            None => DEFAULT_MAX_DOCTORS_PER_BRANCH_DAY,
            Some(raw) => match raw.trim().parse::<i32>() {
                Ok(v) if v > 0 => v,
                _ => {
                    tracing::warn!(
                        key = config_keys::DOCTOR_MAX_PER_BRANCH_DAY,
                        value = %raw,
                        "配置值不合法, 使用默认值"
                    );
                    DEFAULT_MAX_DOCTORS_PER_BRANCH_DAY
                }
            },
        })
    }

    /// 情景营收口径回退
    pub fn get_revenue_fallback(&self) -> RepositoryResult<RevenueSource> {
        let value = self.get_global_config_value(config_keys::SCENARIO_REVENUE_FALLBACK)?;
        Ok(match value {
            None => RevenueSource::DayOfWeek,
            Some(raw) => RevenueSource::from_str(raw.trim()).unwrap_or_else(|| {
                tracing::warn!(
                    key = config_keys::SCENARIO_REVENUE_FALLBACK,
                    value = %raw,
                    "配置值不合法, 使用默认值"
                );
                RevenueSource::DayOfWeek
            }),
        })
    }

    /// 读取解析配置快照
    pub fn load_resolver_config(&self) -> RepositoryResult<ResolverConfig> {
        Ok(ResolverConfig {
            max_doctors_per_branch_day: self.get_max_doctors_per_branch_day()?,
            revenue_fallback: self.get_revenue_fallback()?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 医生排班
    pub const DOCTOR_MAX_PER_BRANCH_DAY: &str = "doctor.max_per_branch_day";

    // 情景匹配
    pub const SCENARIO_REVENUE_FALLBACK: &str = "scenario.revenue_fallback";
}
