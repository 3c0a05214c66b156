// ==========================================
// 多门店排班编制系统 - 人员组约束仓储
// ==========================================
// 职责: staff_group / branch_type_constraint / branch_constraint 读写
// 写入: 整日批量替换, 单事务提交
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::constraint::{
    BranchConstraint, BranchTypeConstraint, StaffGroup, StaffGroupRequirement,
};
use crate::domain::types::DayOfWeek;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_mapping::{day_of_week_at, day_param};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 单日约束写入项
#[derive(Debug, Clone)]
pub struct DayRequirements {
    pub day_of_week: DayOfWeek,
    pub requirements: Vec<StaffGroupRequirement>,
}

// ==========================================
// ConstraintRepository
// ==========================================
pub struct ConstraintRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConstraintRepository {
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
    // 人员组
    // ==========================================

    /// 查询全部人员组 (含成员岗位)
    pub fn list_staff_groups(&self) -> RepositoryResult<Vec<StaffGroup>> {
        let conn = self.get_conn()?;

        let mut members: BTreeMap<String, Vec<String>> = BTreeMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT staff_group_id, position_id FROM staff_group_position ORDER BY staff_group_id, position_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (group_id, position_id) = row?;
                members.entry(group_id).or_default().push(position_id);
            }
        }

        let mut stmt = conn.prepare(
            "SELECT staff_group_id, name, is_active FROM staff_group ORDER BY staff_group_id",
        )?;
        let groups = stmt
            .query_map([], |row| {
                Ok(StaffGroup {
                    staff_group_id: row.get(0)?,
                    name: row.get(1)?,
                    is_active: row.get(2)?,
                    position_ids: Vec::new(),
                })
            })?
            .collect::<SqliteResult<Vec<StaffGroup>>>()?;

        Ok(groups
            .into_iter()
            .map(|mut g| {
                g.position_ids = members.remove(&g.staff_group_id).unwrap_or_default();
                g
            })
            .collect())
    }

    /// 写入人员组及其成员岗位 (成员整体替换)
    pub fn upsert_staff_group(&self, group: &StaffGroup) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO staff_group (staff_group_id, name, is_active) VALUES (?1, ?2, ?3)
            ON CONFLICT(staff_group_id) DO UPDATE SET
                name = excluded.name,
                is_active = excluded.is_active
            "#,
            params![group.staff_group_id, group.name, group.is_active],
        )?;
        tx.execute(
            "DELETE FROM staff_group_position WHERE staff_group_id = ?1",
            params![group.staff_group_id],
        )?;
        for position_id in &group.position_ids {
            tx.execute(
                "INSERT INTO staff_group_position (staff_group_id, position_id) VALUES (?1, ?2)",
                params![group.staff_group_id, position_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 门店覆写
    // ==========================================

    /// 查询门店全部约束行 (含未标记覆写的行)
    pub fn list_branch_constraints(&self, branch_id: &str) -> RepositoryResult<Vec<BranchConstraint>> {
        let conn = self.get_conn()?;
        let mut requirements = load_requirements(
            &conn,
            r#"
            SELECT day_of_week, staff_group_id, minimum_count
            FROM branch_constraint_requirement
            WHERE branch_id = ?1
            ORDER BY day_of_week, staff_group_id
            "#,
            branch_id,
        )?;

        let mut stmt = conn.prepare(
            r#"
            SELECT branch_id, day_of_week, is_overridden, overridden_branch_type_id
            FROM branch_constraint
            WHERE branch_id = ?1
            ORDER BY day_of_week
            "#,
        )?;
        let rows = stmt
            .query_map(params![branch_id], |row| {
                Ok(BranchConstraint {
                    branch_id: row.get(0)?,
                    day_of_week: day_of_week_at(row, 1)?,
                    is_overridden: row.get(2)?,
                    overridden_branch_type_id: row.get(3)?,
                    requirements: Vec::new(),
                })
            })?
            .collect::<SqliteResult<Vec<BranchConstraint>>>()?;

        Ok(rows
            .into_iter()
            .map(|mut c| {
                c.requirements = requirements.remove(&c.day_of_week).unwrap_or_default();
                c
            })
            .collect())
    }

    /// 批量替换门店指定日期的覆写
    ///
    /// # 说明
    /// - 每个提供的日期: 标记 is_overridden=1, 记录当前门店类型 (可空)
    /// - 未提供的日期不受影响
    pub fn replace_branch_constraints(
        &self,
        branch_id: &str,
        branch_type_id: Option<&str>,
        days: &[DayRequirements],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for day in days {
            let dow = day_param(day.day_of_week);
            tx.execute(
                r#"
                INSERT INTO branch_constraint (branch_id, day_of_week, is_overridden, overridden_branch_type_id, updated_at)
                VALUES (?1, ?2, 1, ?3, datetime('now'))
                ON CONFLICT(branch_id, day_of_week) DO UPDATE SET
                    is_overridden = 1,
                    overridden_branch_type_id = excluded.overridden_branch_type_id,
                    updated_at = excluded.updated_at
                "#,
                params![branch_id, dow, branch_type_id],
            )?;
            tx.execute(
                "DELETE FROM branch_constraint_requirement WHERE branch_id = ?1 AND day_of_week = ?2",
                params![branch_id, dow],
            )?;
            for req in &day.requirements {
                tx.execute(
                    r#"
                    INSERT INTO branch_constraint_requirement (branch_id, day_of_week, staff_group_id, minimum_count)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![branch_id, dow, req.staff_group_id, req.minimum_count],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// 删除门店某日覆写, 返回是否存在
    pub fn delete_branch_constraint(&self, branch_id: &str, day: DayOfWeek) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM branch_constraint WHERE branch_id = ?1 AND day_of_week = ?2",
            params![branch_id, day_param(day)],
        )?;
        Ok(affected > 0)
    }

    // ==========================================
    // 门店类型模板
    // ==========================================

    pub fn list_branch_type_constraints(
        &self,
        branch_type_id: &str,
    ) -> RepositoryResult<Vec<BranchTypeConstraint>> {
        let conn = self.get_conn()?;
        let mut requirements = load_requirements(
            &conn,
            r#"
            SELECT day_of_week, staff_group_id, minimum_count
            FROM branch_type_constraint_requirement
            WHERE branch_type_id = ?1
            ORDER BY day_of_week, staff_group_id
            "#,
            branch_type_id,
        )?;

        let mut stmt = conn.prepare(
            r#"
            SELECT branch_type_id, day_of_week
            FROM branch_type_constraint
            WHERE branch_type_id = ?1
            ORDER BY day_of_week
            "#,
        )?;
        let rows = stmt
            .query_map(params![branch_type_id], |row| {
                Ok(BranchTypeConstraint {
                    branch_type_id: row.get(0)?,
                    day_of_week: day_of_week_at(row, 1)?,
                    requirements: Vec::new(),
                })
            })?
            .collect::<SqliteResult<Vec<BranchTypeConstraint>>>()?;

        Ok(rows
            .into_iter()
            .map(|mut c| {
                c.requirements = requirements.remove(&c.day_of_week).unwrap_or_default();
                c
            })
            .collect())
    }

    /// 批量替换门店类型指定日期的模板
    pub fn replace_branch_type_constraints(
        &self,
        branch_type_id: &str,
        days: &[DayRequirements],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for day in days {
            let dow = day_param(day.day_of_week);
            tx.execute(
                r#"
                INSERT INTO branch_type_constraint (branch_type_id, day_of_week, updated_at)
                VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(branch_type_id, day_of_week) DO UPDATE SET updated_at = excluded.updated_at
                "#,
                params![branch_type_id, dow],
            )?;
            tx.execute(
                "DELETE FROM branch_type_constraint_requirement WHERE branch_type_id = ?1 AND day_of_week = ?2",
                params![branch_type_id, dow],
            )?;
            for req in &day.requirements {
                tx.execute(
                    r#"
                    INSERT INTO branch_type_constraint_requirement (branch_type_id, day_of_week, staff_group_id, minimum_count)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![branch_type_id, dow, req.staff_group_id, req.minimum_count],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

/// 按日期分组加载要求行
fn load_requirements(
    conn: &Connection,
    sql: &str,
    owner_id: &str,
) -> RepositoryResult<BTreeMap<DayOfWeek, Vec<StaffGroupRequirement>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![owner_id], |row| {
        Ok((
            day_of_week_at(row, 0)?,
            StaffGroupRequirement {
                staff_group_id: row.get(1)?,
                minimum_count: row.get(2)?,
            },
        ))
    })?;

    let mut grouped: BTreeMap<DayOfWeek, Vec<StaffGroupRequirement>> = BTreeMap::new();
    for row in rows {
        let (day, req) = row?;
        grouped.entry(day).or_default().push(req);
    }
    Ok(grouped)
}
