//! 服务容器构建器

use crate::provider::ServiceProvider;
use crate::settings::load_container_config;
use di_abstractions::{Injectable, TypeDescriptor};
use di_impl::Container;
use infrastructure_common::{ContainerConfig, InfrastructureError, InfrastructureResult};
use std::path::Path;
use tracing::{debug, info};

/// 服务容器构建器
///
/// 使用建造者模式完成配置、日志、类型登记和服务提供者的装配
pub struct ContainerBuilder {
    /// 容器配置
    config: ContainerConfig,
    /// 待登记的类型
    types: Vec<TypeDescriptor>,
    /// 服务提供者，按添加顺序执行
    providers: Vec<Box<dyn ServiceProvider>>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ContainerBuilder {
    /// 创建新的容器构建器
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
            types: Vec::new(),
            providers: Vec::new(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 使用指定的容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 从配置文件加载容器配置，环境变量 `CONTAINER__*` 覆盖文件中的值
    pub fn load_config_file<P: AsRef<Path>>(mut self, path: P) -> InfrastructureResult<Self> {
        self.config = load_container_config(path)?;
        Ok(self)
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 登记可注入类型
    pub fn register_type<T: Injectable>(mut self) -> Self {
        self.types.push(T::type_descriptor());
        self
    }

    /// 登记类型描述
    pub fn register_descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// 添加服务提供者
    pub fn add_provider<P: ServiceProvider + 'static>(mut self, provider: P) -> Self {
        debug!("添加服务提供者: {}", provider.name());
        self.providers.push(Box::new(provider));
        self
    }

    /// 构建容器
    pub fn build(self) -> InfrastructureResult<Container> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.logging_config.initialize()?;
        }

        info!("开始构建服务容器");
        let container = Container::with_config(self.config);

        for descriptor in self.types {
            container.register_descriptor(descriptor);
        }

        for provider in &self.providers {
            debug!("注册服务提供者: {}", provider.name());
            provider
                .register(&container)
                .map_err(|e| bootstrap_failed("注册", provider.name(), e))?;
        }

        for provider in &self.providers {
            debug!("启动服务提供者: {}", provider.name());
            provider
                .boot(&container)
                .map_err(|e| bootstrap_failed("启动", provider.name(), e))?;
        }

        info!(
            "服务容器构建完成，{} 个类型，{} 个服务提供者",
            container.types().len(),
            self.providers.len()
        );
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn bootstrap_failed(
    phase: &str,
    provider: &str,
    error: infrastructure_common::DependencyError,
) -> InfrastructureError {
    InfrastructureError::BootstrapFailed {
        message: format!("服务提供者 {} {}失败: {}", provider, phase, error),
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 初始化全局日志订阅者，重复初始化会返回错误
    pub fn initialize(&self) -> InfrastructureResult<()> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
