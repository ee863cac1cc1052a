//! 类型注册表
//!
//! [`Introspector`] 的默认实现。可自动装配的类型在启动时登记自己的构造形状，
//! 之后的查询都是只读的。

use dashmap::DashMap;
use di_abstractions::{Injectable, Introspector, TypeDescriptor};
use infrastructure_common::{DependencyError, DependencyResult};
use std::sync::Arc;
use tracing::debug;

/// 类型注册表
#[derive(Debug, Default)]
pub struct TypeRegistry {
    descriptors: DashMap<String, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    /// 创建空的类型注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记可注入类型，返回类型标识
    pub fn register<T: Injectable>(&self) -> String {
        self.register_descriptor(T::type_descriptor())
    }

    /// 登记类型描述，同名描述会被覆盖
    pub fn register_descriptor(&self, descriptor: TypeDescriptor) -> String {
        let type_id = descriptor.id.clone();
        debug!(
            "登记类型: {} ({:?}, {} 个构造参数)",
            type_id,
            descriptor.kind,
            descriptor.parameters.len()
        );
        self.descriptors.insert(type_id.clone(), Arc::new(descriptor));
        type_id
    }

    /// 已登记类型数量
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// 清空
    pub fn clear(&self) {
        self.descriptors.clear();
    }
}

impl Introspector for TypeRegistry {
    fn describe(&self, type_id: &str) -> DependencyResult<Arc<TypeDescriptor>> {
        self.descriptors
            .get(type_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| DependencyError::TargetNotFound {
                target: type_id.to_string(),
            })
    }

    fn knows(&self, type_id: &str) -> bool {
        self.descriptors.contains_key(type_id)
    }
}
