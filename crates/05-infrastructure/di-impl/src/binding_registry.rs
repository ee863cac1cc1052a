//! 绑定注册表
//!
//! 保存绑定记录、共享实例缓存和别名。只负责存取，不包含解析逻辑；
//! 每个方法只在自身执行期间持有锁。

use di_abstractions::{BindingRecord, Concrete};
use infrastructure_common::{DependencyError, DependencyResult, Instance, Lifetime};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct RegistryState {
    bindings: HashMap<String, BindingRecord>,
    instances: HashMap<String, Instance>,
    aliases: HashMap<String, String>,
    resolved: HashSet<String>,
    scoped: HashSet<String>,
}

impl RegistryState {
    fn canonical(&self, abstract_id: &str) -> String {
        let mut current: &str = abstract_id;
        let mut visited = HashSet::new();
        while let Some(target) = self.aliases.get(current) {
            if !visited.insert(current) {
                break;
            }
            current = target.as_str();
        }
        current.to_string()
    }
}

/// 绑定注册表
#[derive(Debug, Default)]
pub struct BindingRegistry {
    state: RwLock<RegistryState>,
}

impl BindingRegistry {
    /// 创建空的绑定注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 沿别名链找到最终标识
    pub fn canonical(&self, abstract_id: &str) -> String {
        self.state.read().canonical(abstract_id)
    }

    /// 登记别名，拒绝形成环的别名
    pub fn add_alias(&self, abstract_id: &str, alias: &str) -> DependencyResult<()> {
        let mut state = self.state.write();
        if abstract_id == alias || state.canonical(abstract_id) == alias {
            return Err(DependencyError::AliasCycle {
                alias: alias.to_string(),
            });
        }
        state
            .aliases
            .insert(alias.to_string(), abstract_id.to_string());
        Ok(())
    }

    /// 是否为别名
    pub fn is_alias(&self, name: &str) -> bool {
        self.state.read().aliases.contains_key(name)
    }

    /// 所有最终指向该标识的别名
    pub fn aliases_of(&self, abstract_id: &str) -> Vec<String> {
        let state = self.state.read();
        let mut aliases: Vec<String> = state
            .aliases
            .keys()
            .filter(|alias| state.canonical(alias) == abstract_id)
            .cloned()
            .collect();
        aliases.sort();
        aliases
    }

    /// 保存绑定，同时丢弃旧实例和同名别名
    ///
    /// 返回该标识此前是否已被解析过或已有实例。
    pub fn register(&self, record: BindingRecord) -> bool {
        let mut state = self.state.write();
        let abstract_id = record.abstract_id.clone();
        let was_resolved = state.resolved.contains(&abstract_id)
            || state.instances.contains_key(&abstract_id);
        state.instances.remove(&abstract_id);
        state.aliases.remove(&abstract_id);
        if record.lifetime == Lifetime::Scoped {
            state.scoped.insert(abstract_id.clone());
        } else {
            state.scoped.remove(&abstract_id);
        }
        state.bindings.insert(abstract_id, record);
        was_resolved
    }

    /// 直接保存实例
    ///
    /// 返回该标识此前是否已经存在绑定、实例或别名。
    pub fn store_instance(&self, abstract_id: &str, instance: Instance) -> bool {
        let mut state = self.state.write();
        let was_bound = state.bindings.contains_key(abstract_id)
            || state.instances.contains_key(abstract_id)
            || state.aliases.contains_key(abstract_id);
        state.aliases.remove(abstract_id);
        state.instances.insert(abstract_id.to_string(), instance);
        was_bound
    }

    /// 缓存解析得到的共享实例
    ///
    /// 并发解析时先写入者胜出，返回缓存中的实例。
    pub fn cache_instance(&self, abstract_id: &str, instance: Instance) -> Instance {
        let mut state = self.state.write();
        if state
            .bindings
            .get(abstract_id)
            .map_or(false, |record| record.lifetime == Lifetime::Scoped)
        {
            state.scoped.insert(abstract_id.to_string());
        }
        state
            .instances
            .entry(abstract_id.to_string())
            .or_insert(instance)
            .clone()
    }

    /// 替换已缓存的实例
    pub fn replace_instance(&self, abstract_id: &str, instance: Instance) {
        self.state
            .write()
            .instances
            .insert(abstract_id.to_string(), instance);
    }

    /// 具体实现
    pub fn concrete(&self, abstract_id: &str) -> Option<Concrete> {
        self.state
            .read()
            .bindings
            .get(abstract_id)
            .map(|record| record.concrete.clone())
    }

    /// 已缓存的实例
    pub fn instance(&self, abstract_id: &str) -> Option<Instance> {
        self.state.read().instances.get(abstract_id).cloned()
    }

    /// 标记已解析，首次标记时返回 `true`
    pub fn mark_resolved(&self, abstract_id: &str) -> bool {
        self.state.write().resolved.insert(abstract_id.to_string())
    }

    /// 是否已被解析过或已有实例
    pub fn is_resolved(&self, abstract_id: &str) -> bool {
        let state = self.state.read();
        let abstract_id = state.canonical(abstract_id);
        state.resolved.contains(&abstract_id) || state.instances.contains_key(&abstract_id)
    }

    /// 是否共享
    pub fn is_shared(&self, abstract_id: &str) -> bool {
        let state = self.state.read();
        state.instances.contains_key(abstract_id)
            || state
                .bindings
                .get(abstract_id)
                .map_or(false, BindingRecord::is_shared)
    }

    /// 绑定是否要求缓存实例
    pub fn is_shared_binding(&self, abstract_id: &str) -> bool {
        self.state
            .read()
            .bindings
            .get(abstract_id)
            .map_or(false, BindingRecord::is_shared)
    }

    /// 是否存在绑定、实例或别名
    pub fn bound(&self, abstract_id: &str) -> bool {
        let state = self.state.read();
        state.bindings.contains_key(abstract_id)
            || state.instances.contains_key(abstract_id)
            || state.aliases.contains_key(abstract_id)
    }

    /// 丢弃单个实例
    pub fn forget_instance(&self, abstract_id: &str) -> Option<Instance> {
        self.state.write().instances.remove(abstract_id)
    }

    /// 丢弃全部实例
    pub fn forget_instances(&self) {
        self.state.write().instances.clear();
    }

    /// 丢弃作用域实例，返回丢弃的数量
    pub fn forget_scoped_instances(&self) -> usize {
        let mut state = self.state.write();
        let scoped: Vec<String> = state.scoped.iter().cloned().collect();
        scoped
            .iter()
            .filter(|abstract_id| state.instances.remove(abstract_id.as_str()).is_some())
            .count()
    }

    /// 清空全部绑定、实例、别名和解析记录
    pub fn flush(&self) {
        *self.state.write() = RegistryState::default();
    }

    /// 绑定数量
    pub fn binding_count(&self) -> usize {
        self.state.read().bindings.len()
    }

    /// 实例数量
    pub fn instance_count(&self) -> usize {
        self.state.read().instances.len()
    }

    /// 别名数量
    pub fn alias_count(&self) -> usize {
        self.state.read().aliases.len()
    }

    /// 已解析标识数量
    pub fn resolved_count(&self) -> usize {
        self.state.read().resolved.len()
    }
}
