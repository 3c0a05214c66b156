// ==========================================
// 多门店排班编制系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, ConstraintApi, DoctorScheduleApi, RequirementApi, ScenarioApi};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::StaffingRepositories;

/// 应用状态
///
/// 所有仓储共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 仓储集合
    pub repos: StaffingRepositories,

    /// 人员组约束API
    pub constraint_api: Arc<ConstraintApi>,

    /// 医生排班API
    pub doctor_schedule_api: Arc<DoctorScheduleApi>,

    /// 编制情景API
    pub scenario_api: Arc<ScenarioApi>,

    /// 编制计算API
    pub requirement_api: Arc<RequirementApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 打开数据库 (不存在则建表) 并创建全部 API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let repos = StaffingRepositories::from_connection(conn);

        let constraint_api = Arc::new(ConstraintApi::new(
            repos.branch_repo.clone(),
            repos.constraint_repo.clone(),
        ));
        let doctor_schedule_api = Arc::new(DoctorScheduleApi::new(
            repos.branch_repo.clone(),
            repos.doctor_schedule_repo.clone(),
            repos.config.clone(),
        ));
        let scenario_api = Arc::new(ScenarioApi::new(
            repos.branch_repo.clone(),
            repos.scenario_repo.clone(),
        ));
        let requirement_api = Arc::new(RequirementApi::new(repos.clone()));
        let config_api = Arc::new(ConfigApi::new(repos.config.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            repos,
            constraint_api,
            doctor_schedule_api,
            scenario_api,
            requirement_api,
            config_api,
        })
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 STAFFING_ENGINE_DB_PATH (非空时)
/// - 否则: 用户数据目录/staffing-engine/staffing.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("STAFFING_ENGINE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./staffing.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("staffing-engine");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("无法创建数据目录{}: {}", dir.display(), e);
        } else {
            path = dir.join("staffing.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_initializes_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);
        assert!(state.constraint_api.list_staff_groups().unwrap().is_empty());
        assert!(state.scenario_api.list_scenarios().unwrap().is_empty());
    }
}
