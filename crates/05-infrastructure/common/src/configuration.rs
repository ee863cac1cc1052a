//! 容器配置

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 容器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 单次顶层解析的超时时间（毫秒），`None` 表示不启用
    ///
    /// 构建栈检查才是循环检测的依据，这里只是兜底。
    pub resolution_timeout_ms: Option<u64>,
    /// 是否启用性能监控
    pub enable_performance_monitoring: bool,
}

impl ContainerConfig {
    /// 设置解析超时
    pub fn with_resolution_timeout(mut self, timeout: Duration) -> Self {
        self.resolution_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// 设置是否启用性能监控
    pub fn with_performance_monitoring(mut self, enabled: bool) -> Self {
        self.enable_performance_monitoring = enabled;
        self
    }

    /// 解析超时
    pub fn resolution_timeout(&self) -> Option<Duration> {
        self.resolution_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_disables_timeout() {
        let config = ContainerConfig::default();
        assert!(config.resolution_timeout().is_none());
        assert!(!config.enable_performance_monitoring);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: ContainerConfig =
            serde_json::from_str(r#"{ "resolution_timeout_ms": 5000 }"#).unwrap();

        assert_eq!(config.resolution_timeout(), Some(Duration::from_secs(5)));
        assert!(!config.enable_performance_monitoring);
    }
}
