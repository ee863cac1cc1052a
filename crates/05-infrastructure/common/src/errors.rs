//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("目标类型不存在: [{target}]")]
    TargetNotFound { target: String },

    #[error("目标类型 [{target}] 无法实例化{}", format_build_stack(.build_stack))]
    TargetNotInstantiable {
        target: String,
        build_stack: Vec<String>,
    },

    #[error("无法解析依赖 [${parameter}]，所在类型: {declaring_type}")]
    UnresolvableDependency {
        parameter: String,
        declaring_type: String,
    },

    #[error("检测到循环依赖: {}", .path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("别名 [{alias}] 形成了循环")]
    AliasCycle { alias: String },

    #[error("类型不匹配: [{target}] 不是 {expected}")]
    TypeMismatch {
        target: String,
        expected: &'static str,
    },

    #[error("方法不存在: {target}::{method}")]
    MethodNotFound { target: String, method: String },

    #[error("无效的调用目标: {target}")]
    InvalidCallTarget { target: String },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DependencyError {
    /// 创建组件创建失败错误
    pub fn creation_failed(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 目标是否根本无法构建
    ///
    /// 只有这类错误可以被可选参数的默认值兜底，循环依赖永远不会被吞掉。
    pub fn is_unresolvable(&self) -> bool {
        matches!(
            self,
            Self::TargetNotFound { .. }
                | Self::TargetNotInstantiable { .. }
                | Self::UnresolvableDependency { .. }
        )
    }

    /// 是否为循环依赖错误
    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }

    /// 循环依赖路径
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::CircularDependency { path } => Some(path),
            _ => None,
        }
    }
}

fn format_build_stack(build_stack: &[String]) -> String {
    if build_stack.is_empty() {
        String::new()
    } else {
        format!("，构建链: {}", build_stack.join(", "))
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
