//! # Infrastructure Common
//!
//! 这个 crate 提供了服务容器各层共用的基础类型。
//!
//! ## 核心内容
//!
//! - [`DependencyError`] - 依赖解析错误分类
//! - [`Instance`] - 容器中流转的实例
//! - [`ParameterDescriptor`] - 构造参数元数据
//! - [`Lifetime`] - 绑定生命周期
//! - [`ContainerConfig`] - 容器配置

pub mod configuration;
pub mod errors;
pub mod instance;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use errors::*;
pub use instance::*;
pub use lifecycle::*;
pub use metadata::*;
