//! 容器配置加载
//!
//! 文件配置在下，环境变量在上，后者覆盖前者。

use infrastructure_common::{ConfigError, ConfigResult, ContainerConfig};
use std::path::Path;
use tracing::{debug, error, info};

/// 默认环境变量前缀，例如 `CONTAINER__RESOLUTION_TIMEOUT_MS`
pub const DEFAULT_ENV_PREFIX: &str = "CONTAINER";

/// 从配置文件和默认前缀的环境变量加载容器配置
pub fn load_container_config<P: AsRef<Path>>(path: P) -> ConfigResult<ContainerConfig> {
    load_container_config_with_prefix(path, DEFAULT_ENV_PREFIX)
}

/// 从配置文件和指定前缀的环境变量加载容器配置
///
/// 文件格式按扩展名识别（toml、json、yaml）。
pub fn load_container_config_with_prefix<P: AsRef<Path>>(
    path: P,
    env_prefix: &str,
) -> ConfigResult<ContainerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    info!("加载容器配置: {}", path.display());
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

    let container_config: ContainerConfig =
        settings
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;

    validate(&container_config)?;
    debug!("容器配置加载成功: {:?}", container_config);
    Ok(container_config)
}

fn validate(config: &ContainerConfig) -> ConfigResult<()> {
    if config.resolution_timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError {
            message: "resolution_timeout_ms 必须大于 0，关闭超时请省略该项".to_string(),
        });
    }
    Ok(())
}
