//! # 依赖注入具体实现
//!
//! 提供具体的服务容器、注册表和解析引擎实现。
//!
//! ## 核心组件
//!
//! - [`Container`] - 服务容器
//! - [`TypeRegistry`] - 类型注册表，[`Introspector`](di_abstractions::Introspector) 的默认实现
//! - [`BindingRegistry`] - 绑定、共享实例与别名存储
//! - [`ContextualBindingStore`] - 上下文绑定存储
//! - [`TagRegistry`] - 标签注册表
//! - [`LifecycleHooks`] - 扩展器与生命周期回调
//!
//! ## 示例
//!
//! ```
//! use di_impl::{into_instance, Container, ServiceContainer};
//!
//! struct ConsoleLogger;
//!
//! let container = Container::new();
//! container
//!     .singleton_factory("Logger", |_, _| Ok(into_instance(ConsoleLogger)))
//!     .unwrap();
//!
//! let first = container.make_as::<ConsoleLogger>("Logger").unwrap();
//! let second = container.make_as::<ConsoleLogger>("Logger").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! ```

pub mod binding_registry;
pub mod bound_method;
pub mod container;
pub mod contextual;
pub mod hooks;
mod resolution;
pub mod tags;
pub mod type_registry;

pub use binding_registry::BindingRegistry;
pub use bound_method::{CallBody, CallTarget};
pub use container::Container;
pub use contextual::{ContextualBindingBuilder, ContextualBindingStore, ContextualNeeds};
pub use hooks::LifecycleHooks;
pub use tags::TagRegistry;
pub use type_registry::TypeRegistry;

pub use di_abstractions::{
    into_instance, same_instance, Arguments, Concrete, ContainerStats, DependencyError,
    DependencyResult, Injectable, Instance, Lifetime, ParameterDescriptor, Parameters, Resolve,
    ServiceContainer, TypeDescriptor,
};
