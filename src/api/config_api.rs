// ==========================================
// 多门店排班编制系统 - 配置管理 API
// ==========================================
// 职责: 配置查询与更新 (仅允许已知配置键, 写入前校验取值)
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager, ResolverConfig};
use crate::domain::types::RevenueSource;

/// 配置项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub value: String,
}

/// 配置管理API
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有已落库配置
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        let snapshot: BTreeMap<String, String> = self.config_manager.get_config_snapshot()?;
        Ok(snapshot
            .into_iter()
            .map(|(key, value)| ConfigItem { key, value })
            .collect())
    }

    /// 当前生效的解析配置 (含默认值)
    pub fn get_resolver_config(&self) -> ApiResult<ResolverConfig> {
        Ok(self.config_manager.load_resolver_config()?)
    }

    /// 更新配置
    ///
    /// # 校验
    /// - doctor.max_per_branch_day: 正整数
    /// - scenario.revenue_fallback: DAY_OF_WEEK / SPECIFIC_DATE / NONE
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let normalized = match key {
            config_keys::DOCTOR_MAX_PER_BRANCH_DAY => match value.trim().parse::<i32>() {
                Ok(v) if v > 0 => v.to_string(),
                _ => {
                    return Err(ApiError::ValidationError(format!(
                        "{} 必须为正整数: {}",
                        key, value
                    )))
                }
            },
            config_keys::SCENARIO_REVENUE_FALLBACK => RevenueSource::from_str(value)
                .map(|s| s.to_db_str().to_string())
                .ok_or_else(|| {
                    ApiError::ValidationError(format!("{} 取值不合法: {}", key, value))
                })?,
            _ => return Err(ApiError::InvalidInput(format!("未知配置键: {}", key))),
        };

        self.config_manager.set_global_config_value(key, &normalized)?;
        tracing::info!(key, value = %normalized, "配置已更新");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn api() -> ConfigApi {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn)));
        ConfigApi::new(Arc::new(manager))
    }

    #[test]
    fn test_update_config_validates_values() {
        let api = api();

        api.update_config(config_keys::DOCTOR_MAX_PER_BRANCH_DAY, " 3 ").unwrap();
        api.update_config(config_keys::SCENARIO_REVENUE_FALLBACK, "specific_date")
            .unwrap();

        let config = api.get_resolver_config().unwrap();
        assert_eq!(config.max_doctors_per_branch_day, 3);
        assert_eq!(config.revenue_fallback, RevenueSource::SpecificDate);

        assert!(api.update_config(config_keys::DOCTOR_MAX_PER_BRANCH_DAY, "0").is_err());
        assert!(api.update_config(config_keys::SCENARIO_REVENUE_FALLBACK, "weekly").is_err());
        assert!(matches!(
            api.update_config("unknown.key", "1"),
            Err(ApiError::InvalidInput(_))
        ));

        let items = api.list_configs().unwrap();
        assert!(items
            .iter()
            .any(|i| i.key == config_keys::SCENARIO_REVENUE_FALLBACK && i.value == "SPECIFIC_DATE"));
    }
}
