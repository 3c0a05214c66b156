// ==========================================
// 多门店排班编制系统 - 参照数据仓储
// ==========================================
// 职责: 门店 / 门店类型 / 岗位 / 医生 / 员工 的读取与维护
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::branch::{Branch, BranchType, Doctor, Position, Staff};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// BranchRepository - 参照数据仓储
// ==========================================
pub struct BranchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BranchRepository {
    /// 创建新的仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 门店 / 门店类型
    // ==========================================

    pub fn find_branch(&self, branch_id: &str) -> RepositoryResult<Option<Branch>> {
        let conn = self.get_conn()?;
        let branch = conn
            .query_row(
                "SELECT branch_id, name, branch_type_id FROM branch WHERE branch_id = ?1",
                params![branch_id],
                |row| {
                    Ok(Branch {
                        branch_id: row.get(0)?,
                        name: row.get(1)?,
                        branch_type_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(branch)
    }

    /// 查询门店, 不存在时返回 NotFound
    pub fn get_branch(&self, branch_id: &str) -> RepositoryResult<Branch> {
        self.find_branch(branch_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Branch".to_string(),
                id: branch_id.to_string(),
            })
    }

    pub fn list_branches(&self) -> RepositoryResult<Vec<Branch>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT branch_id, name, branch_type_id FROM branch ORDER BY branch_id")?;
        let branches = stmt
            .query_map([], |row| {
                Ok(Branch {
                    branch_id: row.get(0)?,
                    name: row.get(1)?,
                    branch_type_id: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<Branch>>>()?;
        Ok(branches)
    }

    pub fn upsert_branch(&self, branch: &Branch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO branch (branch_id, name, branch_type_id) VALUES (?1, ?2, ?3)
            ON CONFLICT(branch_id) DO UPDATE SET
                name = excluded.name,
                branch_type_id = excluded.branch_type_id
            "#,
            params![branch.branch_id, branch.name, branch.branch_type_id],
        )?;
        Ok(())
    }

    pub fn find_branch_type(&self, branch_type_id: &str) -> RepositoryResult<Option<BranchType>> {
        let conn = self.get_conn()?;
        let branch_type = conn
            .query_row(
                "SELECT branch_type_id, name FROM branch_type WHERE branch_type_id = ?1",
                params![branch_type_id],
                |row| {
                    Ok(BranchType {
                        branch_type_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(branch_type)
    }

    pub fn upsert_branch_type(&self, branch_type: &BranchType) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO branch_type (branch_type_id, name) VALUES (?1, ?2)
            ON CONFLICT(branch_type_id) DO UPDATE SET name = excluded.name
            "#,
            params![branch_type.branch_type_id, branch_type.name],
        )?;
        Ok(())
    }

    // ==========================================
    // 岗位
    // ==========================================

    pub fn find_position(&self, position_id: &str) -> RepositoryResult<Option<Position>> {
        let conn = self.get_conn()?;
        let position = conn
            .query_row(
                "SELECT position_id, name, is_rotation FROM position WHERE position_id = ?1",
                params![position_id],
                |row| {
                    Ok(Position {
                        position_id: row.get(0)?,
                        name: row.get(1)?,
                        is_rotation: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(position)
    }

    pub fn list_positions(&self) -> RepositoryResult<Vec<Position>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare("SELECT position_id, name, is_rotation FROM position ORDER BY position_id")?;
        let positions = stmt
            .query_map([], |row| {
                Ok(Position {
                    position_id: row.get(0)?,
                    name: row.get(1)?,
                    is_rotation: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<Position>>>()?;
        Ok(positions)
    }

    pub fn upsert_position(&self, position: &Position) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO position (position_id, name, is_rotation) VALUES (?1, ?2, ?3)
            ON CONFLICT(position_id) DO UPDATE SET
                name = excluded.name,
                is_rotation = excluded.is_rotation
            "#,
            params![position.position_id, position.name, position.is_rotation],
        )?;
        Ok(())
    }

    // ==========================================
    // 医生
    // ==========================================

    pub fn find_doctor(&self, doctor_id: &str) -> RepositoryResult<Option<Doctor>> {
        let conn = self.get_conn()?;
        let doctor = conn
            .query_row(
                "SELECT doctor_id, name, is_active FROM doctor WHERE doctor_id = ?1",
                params![doctor_id],
                |row| {
                    Ok(Doctor {
                        doctor_id: row.get(0)?,
                        name: row.get(1)?,
                        is_active: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(doctor)
    }

    pub fn upsert_doctor(&self, doctor: &Doctor) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO doctor (doctor_id, name, is_active) VALUES (?1, ?2, ?3)
            ON CONFLICT(doctor_id) DO UPDATE SET
                name = excluded.name,
                is_active = excluded.is_active
            "#,
            params![doctor.doctor_id, doctor.name, doctor.is_active],
        )?;
        Ok(())
    }

    // ==========================================
    // 员工
    // ==========================================

    pub fn find_staff(&self, staff_id: &str) -> RepositoryResult<Option<Staff>> {
        let conn = self.get_conn()?;
        let staff = conn
            .query_row(
                r#"
                SELECT staff_id, name, branch_id, position_id, is_rotation, is_active
                FROM staff WHERE staff_id = ?1
                "#,
                params![staff_id],
                |row| {
                    Ok(Staff {
                        staff_id: row.get(0)?,
                        name: row.get(1)?,
                        branch_id: row.get(2)?,
                        position_id: row.get(3)?,
                        is_rotation: row.get(4)?,
                        is_active: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(staff)
    }

    pub fn upsert_staff(&self, staff: &Staff) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO staff (staff_id, name, branch_id, position_id, is_rotation, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(staff_id) DO UPDATE SET
                name = excluded.name,
                branch_id = excluded.branch_id,
                position_id = excluded.position_id,
                is_rotation = excluded.is_rotation,
                is_active = excluded.is_active
            "#,
            params![
                staff.staff_id,
                staff.name,
                staff.branch_id,
                staff.position_id,
                staff.is_rotation,
                staff.is_active,
            ],
        )?;
        Ok(())
    }
}
