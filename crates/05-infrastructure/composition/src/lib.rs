//! # 基础设施组合层
//!
//! 负责把服务容器组装成可运行的状态：加载配置、初始化日志、登记类型、
//! 按顺序执行服务提供者的注册和启动阶段。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{ContainerBuilder, LoggingConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = ContainerBuilder::new()
//!         .load_config_file("config/container.toml")?
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     println!("{:?}", container.stats());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod provider;
pub mod settings;

// 重新导出主要类型
pub use builder::{ContainerBuilder, LoggingConfig};
pub use provider::ServiceProvider;
pub use settings::{load_container_config, load_container_config_with_prefix, DEFAULT_ENV_PREFIX};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
