//! 上下文绑定
//!
//! 以 (使用方类型, 所需标识) 为键保存覆盖实现，只在构建使用方时生效。
//! 通过 `container.when(..).needs(..).give(..)` 链式登记。

use crate::container::Container;
use di_abstractions::{
    factory, into_instance, ContextualImplementation, Instance, Parameters, Resolve,
};
use infrastructure_common::DependencyResult;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;

/// 上下文绑定存储
#[derive(Debug, Default)]
pub struct ContextualBindingStore {
    entries: RwLock<HashMap<String, HashMap<String, ContextualImplementation>>>,
}

impl ContextualBindingStore {
    /// 创建空的存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记上下文绑定，覆盖同键旧值
    pub fn add(&self, consumer: &str, needs: &str, implementation: ContextualImplementation) {
        self.entries
            .write()
            .entry(consumer.to_string())
            .or_default()
            .insert(needs.to_string(), implementation);
    }

    /// 查找上下文绑定
    pub fn find(&self, consumer: &str, needs: &str) -> Option<ContextualImplementation> {
        self.entries
            .read()
            .get(consumer)
            .and_then(|needs_map| needs_map.get(needs))
            .cloned()
    }

    /// 使用方是否登记过上下文绑定
    pub fn has_consumer(&self, consumer: &str) -> bool {
        self.entries.read().contains_key(consumer)
    }

    /// 绑定条目数量
    pub fn len(&self) -> usize {
        self.entries.read().values().map(HashMap::len).sum()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// 上下文绑定构建器，由 [`Container::when`] 创建
#[must_use = "需要调用 needs(..) 并给出实现"]
pub struct ContextualBindingBuilder<'c> {
    container: &'c Container,
    consumers: Vec<String>,
}

impl<'c> ContextualBindingBuilder<'c> {
    pub(crate) fn new(container: &'c Container, consumers: Vec<String>) -> Self {
        Self {
            container,
            consumers,
        }
    }

    /// 指定所需的标识，基础类型参数使用 `$name` 形式
    pub fn needs(self, abstract_id: &str) -> ContextualNeeds<'c> {
        ContextualNeeds {
            container: self.container,
            consumers: self.consumers,
            needs: abstract_id.to_string(),
        }
    }
}

/// 已指定所需标识的上下文绑定构建器
#[must_use = "需要调用 give(..) 系列方法给出实现"]
pub struct ContextualNeeds<'c> {
    container: &'c Container,
    consumers: Vec<String>,
    needs: String,
}

impl ContextualNeeds<'_> {
    /// 给出另一个类型标识
    pub fn give(self, implementation: &str) {
        self.apply(ContextualImplementation::Type(implementation.to_string()));
    }

    /// 给出工厂
    pub fn give_factory<F>(self, f: F)
    where
        F: Fn(&mut dyn Resolve, &Parameters) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        self.apply(ContextualImplementation::Factory(factory(f)));
    }

    /// 给出固定值
    pub fn give_value<T>(self, value: T)
    where
        T: Any + Send + Sync,
    {
        self.apply(ContextualImplementation::Value(into_instance(value)));
    }

    /// 给出已有实例
    pub fn give_instance(self, instance: Instance) {
        self.apply(ContextualImplementation::Value(instance));
    }

    /// 给出标签下的全部实例
    pub fn give_tagged(self, tag: &str) {
        self.apply(ContextualImplementation::Tagged(tag.to_string()));
    }

    fn apply(self, implementation: ContextualImplementation) {
        for consumer in &self.consumers {
            self.container
                .add_contextual_binding(consumer, &self.needs, implementation.clone());
        }
    }
}
