// ==========================================
// 多门店排班编制系统 - API 层
// ==========================================
// 职责: 对外业务接口, 负责校验、组装仓储数据、调用引擎
// ==========================================

pub mod config_api;
pub mod constraint_api;
pub mod doctor_schedule_api;
pub mod error;
pub mod requirement_api;
pub mod scenario_api;
pub mod validator;

// 重导出核心类型
pub use config_api::{ConfigApi, ConfigItem};
pub use constraint_api::ConstraintApi;
pub use doctor_schedule_api::DoctorScheduleApi;
pub use error::{ApiError, ApiResult};
pub use requirement_api::RequirementApi;
pub use scenario_api::ScenarioApi;
pub use validator::{DayConstraintInput, ScheduleOverrideInput};
