// ==========================================
// 多门店排班编制系统 - 编制情景 API
// ==========================================
// 职责: 情景的查询、保存、岗位要求替换、删除
// 红线: 写入前整体校验, 不做部分写入
// ==========================================

use std::sync::Arc;

use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_scenario;
use crate::domain::scenario::{ScenarioPositionRequirement, StaffRequirementScenario};
use crate::repository::{BranchRepository, ScenarioRepository};

pub struct ScenarioApi {
    branch_repo: Arc<BranchRepository>,
    scenario_repo: Arc<ScenarioRepository>,
}

impl ScenarioApi {
    pub fn new(branch_repo: Arc<BranchRepository>, scenario_repo: Arc<ScenarioRepository>) -> Self {
        Self {
            branch_repo,
            scenario_repo,
        }
    }

    /// 全部情景 (priority DESC)
    pub fn list_scenarios(&self) -> ApiResult<Vec<StaffRequirementScenario>> {
        Ok(self.scenario_repo.list_scenarios()?)
    }

    pub fn get_scenario(&self, scenario_id: &str) -> ApiResult<StaffRequirementScenario> {
        self.scenario_repo
            .find_scenario(scenario_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Scenario(id={})不存在", scenario_id)))
    }

    /// 保存情景 (新增或整体替换)
    #[instrument(skip(self, scenario), fields(scenario_id = %scenario.scenario_id))]
    pub fn save_scenario(&self, scenario: &StaffRequirementScenario) -> ApiResult<()> {
        let positions = self.branch_repo.list_positions()?;
        validate_scenario(scenario, &positions)?;

        if let Some(branch_id) = scenario.branch_id.as_deref() {
            self.branch_repo.get_branch(branch_id)?;
        }
        if let Some(doctor_id) = scenario.doctor_id.as_deref() {
            if self.branch_repo.find_doctor(doctor_id)?.is_none() {
                return Err(ApiError::ValidationError(format!("医生不存在: {}", doctor_id)));
            }
        }

        self.scenario_repo.save_scenario(scenario)?;
        tracing::info!(
            name = %scenario.name,
            priority = scenario.priority,
            positions = scenario.position_requirements.len(),
            "情景已保存"
        );
        Ok(())
    }

    /// 整体替换情景的岗位要求
    #[instrument(skip(self, requirements), fields(count = requirements.len()))]
    pub fn replace_scenario_position_requirements(
        &self,
        scenario_id: &str,
        requirements: &[ScenarioPositionRequirement],
    ) -> ApiResult<StaffRequirementScenario> {
        let mut scenario = self.get_scenario(scenario_id)?;
        scenario.position_requirements = requirements.to_vec();

        let positions = self.branch_repo.list_positions()?;
        validate_scenario(&scenario, &positions)?;

        self.scenario_repo
            .replace_position_requirements(scenario_id, requirements)?;
        Ok(scenario)
    }

    pub fn delete_scenario(&self, scenario_id: &str) -> ApiResult<bool> {
        let removed = self.scenario_repo.delete_scenario(scenario_id)?;
        tracing::info!(scenario_id, removed, "情景已删除");
        Ok(removed)
    }
}
