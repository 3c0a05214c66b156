// ==========================================
// 多门店排班编制系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod branch_repo;
pub mod constraint_repo;
pub mod doctor_schedule_repo;
pub mod error;
pub mod quota_repo;
pub mod quota_summary_repo;
pub(crate) mod row_mapping;
pub mod scenario_repo;
pub mod staffing_repo;

// 重导出核心仓储
pub use branch_repo::BranchRepository;
pub use constraint_repo::{ConstraintRepository, DayRequirements};
pub use doctor_schedule_repo::DoctorScheduleRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use quota_repo::QuotaRepository;
pub use quota_summary_repo::QuotaSummaryRepository;
pub use scenario_repo::ScenarioRepository;
pub use staffing_repo::StaffingRepository;
