// ==========================================
// 多门店排班编制系统 - 引擎层
// ==========================================
// 职责: 分层解析与编制计算
// 红线: Engine 不拼 SQL, 所有结果必须可解释 (来源/轨迹/原因)
// ==========================================

pub mod constraint_resolver;
pub mod doctor_schedule;
pub mod override_chain;
pub mod predicate;
pub mod quota_status;
pub mod repositories;
pub mod requirement_calculator;
pub mod scenario_matcher;
pub mod staffing_preference;

// 重导出核心引擎
pub use constraint_resolver::ConstraintResolver;
pub use doctor_schedule::{DoctorScheduleResolver, DoctorScheduleSource, RepositoryScheduleSource};
pub use override_chain::{OverrideChain, Resolved};
pub use predicate::{optional_eq, PredicateMatcher};
pub use quota_status::{QuotaStatusAggregator, QuotaStatusInput};
pub use repositories::StaffingRepositories;
pub use requirement_calculator::{BaseRequirement, RequirementCalculator};
pub use scenario_matcher::{priority_order, ScenarioContext, ScenarioMatchResult, ScenarioMatcher};
pub use staffing_preference::StaffingPreferenceMatcher;
