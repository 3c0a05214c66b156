// ==========================================
// 多门店排班编制系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中维护建表语句 (幂等)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化全部表结构（可重复执行）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

-- ===== 参照数据 =====
CREATE TABLE IF NOT EXISTS branch_type (
    branch_type_id TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS branch (
    branch_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    branch_type_id TEXT REFERENCES branch_type(branch_type_id)
);

CREATE TABLE IF NOT EXISTS position (
    position_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    is_rotation INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS doctor (
    doctor_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS staff (
    staff_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    branch_id TEXT REFERENCES branch(branch_id),
    position_id TEXT NOT NULL REFERENCES position(position_id),
    is_rotation INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS staff_leave (
    staff_id TEXT NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    leave_date TEXT NOT NULL,
    PRIMARY KEY (staff_id, leave_date)
);

CREATE TABLE IF NOT EXISTS rotation_assignment (
    assignment_id TEXT PRIMARY KEY,
    staff_id TEXT NOT NULL REFERENCES staff(staff_id),
    branch_id TEXT NOT NULL REFERENCES branch(branch_id),
    position_id TEXT NOT NULL REFERENCES position(position_id),
    assignment_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'ASSIGNED'
);
CREATE INDEX IF NOT EXISTS idx_rotation_assignment_branch_date
    ON rotation_assignment(branch_id, assignment_date);

CREATE TABLE IF NOT EXISTS staffing_preference (
    preference_id TEXT PRIMARY KEY,
    staff_id TEXT NOT NULL REFERENCES staff(staff_id) ON DELETE CASCADE,
    branch_id TEXT,
    doctor_id TEXT,
    day_of_week INTEGER CHECK (day_of_week BETWEEN 0 AND 6),
    is_active INTEGER NOT NULL DEFAULT 1,
    note TEXT
);

-- ===== 人员组约束 =====
CREATE TABLE IF NOT EXISTS staff_group (
    staff_group_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS staff_group_position (
    staff_group_id TEXT NOT NULL REFERENCES staff_group(staff_group_id) ON DELETE CASCADE,
    position_id TEXT NOT NULL REFERENCES position(position_id),
    PRIMARY KEY (staff_group_id, position_id)
);

CREATE TABLE IF NOT EXISTS branch_type_constraint (
    branch_type_id TEXT NOT NULL REFERENCES branch_type(branch_type_id) ON DELETE CASCADE,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (branch_type_id, day_of_week)
);

CREATE TABLE IF NOT EXISTS branch_type_constraint_requirement (
    branch_type_id TEXT NOT NULL,
    day_of_week INTEGER NOT NULL,
    staff_group_id TEXT NOT NULL REFERENCES staff_group(staff_group_id),
    minimum_count INTEGER NOT NULL CHECK (minimum_count >= 0),
    PRIMARY KEY (branch_type_id, day_of_week, staff_group_id),
    FOREIGN KEY (branch_type_id, day_of_week)
        REFERENCES branch_type_constraint(branch_type_id, day_of_week) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS branch_constraint (
    branch_id TEXT NOT NULL REFERENCES branch(branch_id) ON DELETE CASCADE,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    is_overridden INTEGER NOT NULL DEFAULT 0,
    overridden_branch_type_id TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (branch_id, day_of_week)
);

CREATE TABLE IF NOT EXISTS branch_constraint_requirement (
    branch_id TEXT NOT NULL,
    day_of_week INTEGER NOT NULL,
    staff_group_id TEXT NOT NULL REFERENCES staff_group(staff_group_id),
    minimum_count INTEGER NOT NULL CHECK (minimum_count >= 0),
    PRIMARY KEY (branch_id, day_of_week, staff_group_id),
    FOREIGN KEY (branch_id, day_of_week)
        REFERENCES branch_constraint(branch_id, day_of_week) ON DELETE CASCADE
);

-- ===== 定编与营收 =====
CREATE TABLE IF NOT EXISTS position_quota (
    branch_id TEXT NOT NULL REFERENCES branch(branch_id) ON DELETE CASCADE,
    position_id TEXT NOT NULL REFERENCES position(position_id),
    designated_quota INTEGER NOT NULL CHECK (designated_quota >= 0),
    minimum_required INTEGER NOT NULL CHECK (minimum_required >= 0),
    PRIMARY KEY (branch_id, position_id),
    CHECK (minimum_required <= designated_quota)
);

CREATE TABLE IF NOT EXISTS revenue_level_tier (
    tier_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    level INTEGER NOT NULL,
    min_revenue REAL NOT NULL,
    max_revenue REAL
);

CREATE TABLE IF NOT EXISTS branch_expected_revenue (
    branch_id TEXT NOT NULL REFERENCES branch(branch_id) ON DELETE CASCADE,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    expected_revenue REAL NOT NULL,
    PRIMARY KEY (branch_id, day_of_week)
);

CREATE TABLE IF NOT EXISTS branch_actual_revenue (
    branch_id TEXT NOT NULL REFERENCES branch(branch_id) ON DELETE CASCADE,
    revenue_date TEXT NOT NULL,
    actual_revenue REAL NOT NULL,
    PRIMARY KEY (branch_id, revenue_date)
);

-- ===== 医生排班 =====
CREATE TABLE IF NOT EXISTS doctor_default_schedule (
    doctor_id TEXT NOT NULL REFERENCES doctor(doctor_id) ON DELETE CASCADE,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    branch_id TEXT NOT NULL REFERENCES branch(branch_id),
    PRIMARY KEY (doctor_id, day_of_week)
);

CREATE TABLE IF NOT EXISTS doctor_weekly_off_day (
    doctor_id TEXT NOT NULL REFERENCES doctor(doctor_id) ON DELETE CASCADE,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    PRIMARY KEY (doctor_id, day_of_week)
);

CREATE TABLE IF NOT EXISTS doctor_schedule_override (
    doctor_id TEXT NOT NULL REFERENCES doctor(doctor_id) ON DELETE CASCADE,
    override_date TEXT NOT NULL,
    override_type TEXT NOT NULL CHECK (override_type IN ('working', 'off')),
    branch_id TEXT REFERENCES branch(branch_id),
    reason TEXT,
    PRIMARY KEY (doctor_id, override_date)
);
CREATE INDEX IF NOT EXISTS idx_doctor_override_date
    ON doctor_schedule_override(override_date);

-- ===== 编制情景 =====
CREATE TABLE IF NOT EXISTS staff_requirement_scenario (
    scenario_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    doctor_id TEXT,
    branch_id TEXT,
    revenue_level_tier_id TEXT,
    min_revenue REAL,
    max_revenue REAL,
    use_day_of_week_revenue INTEGER NOT NULL DEFAULT 0,
    use_specific_date_revenue INTEGER NOT NULL DEFAULT 0,
    doctor_count INTEGER,
    min_doctor_count INTEGER,
    day_of_week INTEGER CHECK (day_of_week BETWEEN 0 AND 6),
    priority INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS scenario_position_requirement (
    scenario_id TEXT NOT NULL REFERENCES staff_requirement_scenario(scenario_id) ON DELETE CASCADE,
    position_id TEXT NOT NULL REFERENCES position(position_id),
    preferred_staff INTEGER NOT NULL CHECK (preferred_staff >= 0),
    minimum_staff INTEGER NOT NULL CHECK (minimum_staff >= 0),
    override_base INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (scenario_id, position_id)
);

CREATE TABLE IF NOT EXISTS scenario_specific_staff_requirement (
    scenario_id TEXT NOT NULL REFERENCES staff_requirement_scenario(scenario_id) ON DELETE CASCADE,
    staff_id TEXT NOT NULL REFERENCES staff(staff_id),
    note TEXT,
    PRIMARY KEY (scenario_id, staff_id)
);

-- ===== 达成快照 =====
CREATE TABLE IF NOT EXISTS branch_quota_summary (
    branch_id TEXT NOT NULL REFERENCES branch(branch_id) ON DELETE CASCADE,
    summary_date TEXT NOT NULL,
    total_designated INTEGER NOT NULL,
    total_minimum INTEGER NOT NULL,
    total_available INTEGER NOT NULL,
    total_assigned INTEGER NOT NULL,
    total_required INTEGER NOT NULL,
    is_fulfilled INTEGER NOT NULL,
    detail_json TEXT NOT NULL,
    computed_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (branch_id, summary_date)
);

CREATE TABLE IF NOT EXISTS position_quota_summary (
    branch_id TEXT NOT NULL,
    summary_date TEXT NOT NULL,
    position_id TEXT NOT NULL,
    position_name TEXT NOT NULL,
    designated_quota INTEGER NOT NULL,
    minimum_required INTEGER NOT NULL,
    available_local INTEGER NOT NULL,
    assigned_rotation INTEGER NOT NULL,
    still_required INTEGER NOT NULL,
    PRIMARY KEY (branch_id, summary_date, position_id),
    FOREIGN KEY (branch_id, summary_date)
        REFERENCES branch_quota_summary(branch_id, summary_date) ON DELETE CASCADE
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
