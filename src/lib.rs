// ==========================================
// 多门店排班编制系统 - 核心库
// ==========================================
// 定位: 编制需求分层解析引擎
// 层次: 人员组约束 / 医生排班 / 编制情景 / 岗位编制 / 达成汇总
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分层解析
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AssignmentSource, ConstraintSource, DayOfWeek, FactorEffect, OverrideType, RevenueSource,
};

// 领域实体
pub use domain::{
    Branch, CalculatedRequirement, DoctorAssignment, QuotaStatus, ResolvedDayConstraint,
    ResolvedDoctorAssignment, StaffRequirementScenario,
};

// 引擎
pub use engine::{
    ConstraintResolver, DoctorScheduleResolver, QuotaStatusAggregator, RequirementCalculator,
    ScenarioMatcher,
};

// API
pub use api::{ConstraintApi, DoctorScheduleApi, RequirementApi, ScenarioApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "多门店排班编制系统";
