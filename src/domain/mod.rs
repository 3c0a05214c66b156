// ==========================================
// 多门店排班编制系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、解析结果结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod branch;
pub mod constraint;
pub mod doctor_schedule;
pub mod quota;
pub mod scenario;
pub mod staffing;
pub mod summary;
pub mod types;

// 重导出核心类型
pub use branch::{Branch, BranchType, Doctor, Position, Staff};
pub use constraint::{
    BranchConstraint, BranchTypeConstraint, ResolvedDayConstraint, ResolvedRequirement,
    StaffGroup, StaffGroupRequirement,
};
pub use doctor_schedule::{
    DoctorAssignment, DoctorAssignmentMap, DoctorDefaultSchedule, DoctorScheduleSnapshot,
    DoctorWeeklyOffDay, ResolvedDoctorAssignment, ScheduleOverride,
};
pub use quota::{classify_revenue, revenue_in_band, PositionQuota, RevenueFacts, RevenueLevelTier};
pub use scenario::{
    AppliedFactor, CalculatedRequirement, RequirementWarning, ScenarioMatch,
    ScenarioPositionRequirement, ScenarioSpecificStaffRequirement, StaffRequirementScenario,
};
pub use staffing::{StaffingPreference, StaffingSnapshot};
pub use summary::{
    BranchQuotaSummary, MissingSpecificStaff, MissingStaff, PositionQuotaSummary, QuotaStatus,
    StaffGroupStatus,
};
pub use types::{
    AssignmentSource, ConstraintSource, DayOfWeek, FactorEffect, OverrideType, PredicateCheck,
    RevenueSource,
};
