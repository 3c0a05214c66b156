// ==========================================
// 多门店排班编制系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合编制解析所需的所有 Repository
// 说明: 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::ConfigManager;
use crate::repository::{
    BranchRepository, ConstraintRepository, DoctorScheduleRepository, QuotaRepository,
    QuotaSummaryRepository, ScenarioRepository, StaffingRepository,
};

/// 编制解析仓储集合
///
/// # 包含的仓储
/// - `branch_repo`: 门店/岗位/医生/员工参照数据
/// - `constraint_repo`: 人员组与约束
/// - `doctor_schedule_repo`: 医生排班
/// - `quota_repo`: 定编与营收
/// - `scenario_repo`: 编制情景
/// - `staffing_repo`: 到岗事实与轮岗偏好
/// - `summary_repo`: 达成快照
/// - `config`: 配置
#[derive(Clone)]
pub struct StaffingRepositories {
    pub branch_repo: Arc<BranchRepository>,
    pub constraint_repo: Arc<ConstraintRepository>,
    pub doctor_schedule_repo: Arc<DoctorScheduleRepository>,
    pub quota_repo: Arc<QuotaRepository>,
    pub scenario_repo: Arc<ScenarioRepository>,
    pub staffing_repo: Arc<StaffingRepository>,
    pub summary_repo: Arc<QuotaSummaryRepository>,
    pub config: Arc<ConfigManager>,
}

impl StaffingRepositories {
    /// 基于共享连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            branch_repo: Arc::new(BranchRepository::from_connection(conn.clone())),
            constraint_repo: Arc::new(ConstraintRepository::from_connection(conn.clone())),
            doctor_schedule_repo: Arc::new(DoctorScheduleRepository::from_connection(conn.clone())),
            quota_repo: Arc::new(QuotaRepository::from_connection(conn.clone())),
            scenario_repo: Arc::new(ScenarioRepository::from_connection(conn.clone())),
            staffing_repo: Arc::new(StaffingRepository::from_connection(conn.clone())),
            summary_repo: Arc::new(QuotaSummaryRepository::from_connection(conn.clone())),
            config: Arc::new(ConfigManager::from_connection(conn)),
        }
    }
}
