// ==========================================
// 多门店排班编制系统 - 编制情景仓储
// ==========================================
// 职责: staff_requirement_scenario 及其岗位要求 / 指定人员 的读写
// 说明: 读取返回全部情景 (含未启用), 是否生效由匹配器判定
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::scenario::{
    ScenarioPositionRequirement, ScenarioSpecificStaffRequirement, StaffRequirementScenario,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_mapping::{day_param, optional_day_of_week_at};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const SCENARIO_COLUMNS: &str = r#"
    scenario_id, name, description, doctor_id, branch_id, revenue_level_tier_id,
    min_revenue, max_revenue, use_day_of_week_revenue, use_specific_date_revenue,
    doctor_count, min_doctor_count, day_of_week, priority, is_active
"#;

pub struct ScenarioRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScenarioRepository {
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

    /// 全部情景 (按 priority DESC, scenario_id)
    pub fn list_scenarios(&self) -> RepositoryResult<Vec<StaffRequirementScenario>> {
        let conn = self.get_conn()?;

        let mut requirements = load_position_requirements(&conn)?;
        let mut specific_staff = load_specific_staff(&conn)?;

        let sql = format!(
            "SELECT {} FROM staff_requirement_scenario ORDER BY priority DESC, scenario_id",
            SCENARIO_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let scenarios = stmt
            .query_map([], map_scenario_row)?
            .collect::<SqliteResult<Vec<StaffRequirementScenario>>>()?;

        Ok(scenarios
            .into_iter()
            .map(|mut s| {
                s.position_requirements = requirements.remove(&s.scenario_id).unwrap_or_default();
                s.specific_staff = specific_staff.remove(&s.scenario_id).unwrap_or_default();
                s
            })
            .collect())
    }

    pub fn find_scenario(&self, scenario_id: &str) -> RepositoryResult<Option<StaffRequirementScenario>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM staff_requirement_scenario WHERE scenario_id = ?1",
            SCENARIO_COLUMNS
        );
        let scenario = conn
            .query_row(&sql, params![scenario_id], map_scenario_row)
            .optional()?;

        let Some(mut scenario) = scenario else {
            return Ok(None);
        };

        scenario.position_requirements = load_position_requirements(&conn)?
            .remove(scenario_id)
            .unwrap_or_default();
        scenario.specific_staff = load_specific_staff(&conn)?
            .remove(scenario_id)
            .unwrap_or_default();
        Ok(Some(scenario))
    }

    /// 保存情景 (主记录 upsert, 岗位要求与指定人员整体替换)
    pub fn save_scenario(&self, scenario: &StaffRequirementScenario) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO staff_requirement_scenario (
                scenario_id, name, description, doctor_id, branch_id, revenue_level_tier_id,
                min_revenue, max_revenue, use_day_of_week_revenue, use_specific_date_revenue,
                doctor_count, min_doctor_count, day_of_week, priority, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(scenario_id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                doctor_id = excluded.doctor_id,
                branch_id = excluded.branch_id,
                revenue_level_tier_id = excluded.revenue_level_tier_id,
                min_revenue = excluded.min_revenue,
                max_revenue = excluded.max_revenue,
                use_day_of_week_revenue = excluded.use_day_of_week_revenue,
                use_specific_date_revenue = excluded.use_specific_date_revenue,
                doctor_count = excluded.doctor_count,
                min_doctor_count = excluded.min_doctor_count,
                day_of_week = excluded.day_of_week,
                priority = excluded.priority,
                is_active = excluded.is_active
            "#,
            params![
                scenario.scenario_id,
                scenario.name,
                scenario.description,
                scenario.doctor_id,
                scenario.branch_id,
                scenario.revenue_level_tier_id,
                scenario.min_revenue,
                scenario.max_revenue,
                scenario.use_day_of_week_revenue,
                scenario.use_specific_date_revenue,
                scenario.doctor_count,
                scenario.min_doctor_count,
                scenario.day_of_week.map(day_param),
                scenario.priority,
                scenario.is_active,
            ],
        )?;

        replace_position_requirements_in(&tx, &scenario.scenario_id, &scenario.position_requirements)?;

        tx.execute(
            "DELETE FROM scenario_specific_staff_requirement WHERE scenario_id = ?1",
            params![scenario.scenario_id],
        )?;
        for staff in &scenario.specific_staff {
            tx.execute(
                "INSERT INTO scenario_specific_staff_requirement (scenario_id, staff_id, note) VALUES (?1, ?2, ?3)",
                params![scenario.scenario_id, staff.staff_id, staff.note],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 整体替换情景的岗位要求
    pub fn replace_position_requirements(
        &self,
        scenario_id: &str,
        requirements: &[ScenarioPositionRequirement],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        replace_position_requirements_in(&tx, scenario_id, requirements)?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_scenario(&self, scenario_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM staff_requirement_scenario WHERE scenario_id = ?1",
            params![scenario_id],
        )?;
        Ok(affected > 0)
    }
}

fn replace_position_requirements_in(
    conn: &Connection,
    scenario_id: &str,
    requirements: &[ScenarioPositionRequirement],
) -> RepositoryResult<()> {
    conn.execute(
        "DELETE FROM scenario_position_requirement WHERE scenario_id = ?1",
        params![scenario_id],
    )?;
    for req in requirements {
        conn.execute(
            r#"
            INSERT INTO scenario_position_requirement
                (scenario_id, position_id, preferred_staff, minimum_staff, override_base)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                scenario_id,
                req.position_id,
                req.preferred_staff,
                req.minimum_staff,
                req.override_base
            ],
        )?;
    }
    Ok(())
}

fn map_scenario_row(row: &Row<'_>) -> SqliteResult<StaffRequirementScenario> {
    Ok(StaffRequirementScenario {
        scenario_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        doctor_id: row.get(3)?,
        branch_id: row.get(4)?,
        revenue_level_tier_id: row.get(5)?,
        min_revenue: row.get(6)?,
        max_revenue: row.get(7)?,
        use_day_of_week_revenue: row.get(8)?,
        use_specific_date_revenue: row.get(9)?,
        doctor_count: row.get(10)?,
        min_doctor_count: row.get(11)?,
        day_of_week: optional_day_of_week_at(row, 12)?,
        priority: row.get(13)?,
        is_active: row.get(14)?,
        position_requirements: Vec::new(),
        specific_staff: Vec::new(),
    })
}

fn load_position_requirements(
    conn: &Connection,
) -> RepositoryResult<BTreeMap<String, Vec<ScenarioPositionRequirement>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT scenario_id, position_id, preferred_staff, minimum_staff, override_base
        FROM scenario_position_requirement
        ORDER BY scenario_id, position_id
        "#,
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            ScenarioPositionRequirement {
                position_id: row.get(1)?,
                preferred_staff: row.get(2)?,
                minimum_staff: row.get(3)?,
                override_base: row.get(4)?,
            },
        ))
    })?;

    let mut grouped: BTreeMap<String, Vec<ScenarioPositionRequirement>> = BTreeMap::new();
    for row in rows {
        let (scenario_id, req) = row?;
        grouped.entry(scenario_id).or_default().push(req);
    }
    Ok(grouped)
}

fn load_specific_staff(
    conn: &Connection,
) -> RepositoryResult<BTreeMap<String, Vec<ScenarioSpecificStaffRequirement>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT scenario_id, staff_id, note
        FROM scenario_specific_staff_requirement
        ORDER BY scenario_id, staff_id
        "#,
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            ScenarioSpecificStaffRequirement {
                staff_id: row.get(1)?,
                note: row.get(2)?,
            },
        ))
    })?;

    let mut grouped: BTreeMap<String, Vec<ScenarioSpecificStaffRequirement>> = BTreeMap::new();
    for row in rows {
        let (scenario_id, staff) = row?;
        grouped.entry(scenario_id).or_default().push(staff);
    }
    Ok(grouped)
}
