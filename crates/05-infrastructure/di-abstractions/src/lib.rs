//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义服务注册和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`ServiceContainer`] - 服务容器接口
//! - [`Resolve`] - 解析句柄，工厂和回调通过它回到当前解析
//! - [`Introspector`] - 类型内省接口
//! - [`Injectable`] - 可自动装配的类型

pub mod arguments;
pub mod container;
pub mod contextual;
pub mod factory;
pub mod introspector;
pub mod registry;
pub mod resolver;

pub use arguments::*;
pub use container::*;
pub use contextual::*;
pub use factory::*;
pub use introspector::*;
pub use registry::*;
pub use resolver::*;

// 派生宏生成的代码只引用本 crate
pub use infrastructure_common::{
    downcast_instance, into_instance, same_instance, DependencyError, DependencyResult,
    Instance, Lifetime, ParameterDescriptor, TypeKind,
};
