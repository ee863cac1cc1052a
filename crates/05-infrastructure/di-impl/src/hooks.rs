//! 生命周期钩子
//!
//! 保存扩展器以及解析、解析后、重绑定回调。读取时复制出一份列表再调用，
//! 回调执行期间不持有锁。

use di_abstractions::{Extender, ResolvingCallback};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

#[derive(Default)]
struct HookTable {
    resolving: HashMap<String, Vec<ResolvingCallback>>,
    after_resolving: HashMap<String, Vec<ResolvingCallback>>,
    global_resolving: Vec<ResolvingCallback>,
    global_after_resolving: Vec<ResolvingCallback>,
    rebound: HashMap<String, Vec<ResolvingCallback>>,
    extenders: HashMap<String, Vec<Extender>>,
}

/// 生命周期钩子
#[derive(Default)]
pub struct LifecycleHooks {
    table: RwLock<HookTable>,
}

impl LifecycleHooks {
    /// 创建空的钩子表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册解析回调
    pub fn add_resolving(&self, abstract_id: &str, callback: ResolvingCallback) {
        self.table
            .write()
            .resolving
            .entry(abstract_id.to_string())
            .or_default()
            .push(callback);
    }

    /// 注册解析后回调
    pub fn add_after_resolving(&self, abstract_id: &str, callback: ResolvingCallback) {
        self.table
            .write()
            .after_resolving
            .entry(abstract_id.to_string())
            .or_default()
            .push(callback);
    }

    /// 注册全局解析回调
    pub fn add_global_resolving(&self, callback: ResolvingCallback) {
        self.table.write().global_resolving.push(callback);
    }

    /// 注册全局解析后回调
    pub fn add_global_after_resolving(&self, callback: ResolvingCallback) {
        self.table.write().global_after_resolving.push(callback);
    }

    /// 注册重绑定回调
    pub fn add_rebound(&self, abstract_id: &str, callback: ResolvingCallback) {
        self.table
            .write()
            .rebound
            .entry(abstract_id.to_string())
            .or_default()
            .push(callback);
    }

    /// 注册扩展器
    pub fn add_extender(&self, abstract_id: &str, extender: Extender) {
        self.table
            .write()
            .extenders
            .entry(abstract_id.to_string())
            .or_default()
            .push(extender);
    }

    /// 解析回调，全局回调在前
    pub fn resolving_callbacks(&self, abstract_id: &str) -> Vec<ResolvingCallback> {
        let table = self.table.read();
        collect(&table.global_resolving, table.resolving.get(abstract_id))
    }

    /// 解析后回调，全局回调在前
    pub fn after_resolving_callbacks(&self, abstract_id: &str) -> Vec<ResolvingCallback> {
        let table = self.table.read();
        collect(
            &table.global_after_resolving,
            table.after_resolving.get(abstract_id),
        )
    }

    /// 重绑定回调
    pub fn rebound_callbacks(&self, abstract_id: &str) -> Vec<ResolvingCallback> {
        self.table
            .read()
            .rebound
            .get(abstract_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 扩展器，按注册顺序
    pub fn extenders(&self, abstract_id: &str) -> Vec<Extender> {
        self.table
            .read()
            .extenders
            .get(abstract_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 移除某个标识的全部扩展器
    pub fn forget_extenders(&self, abstract_id: &str) {
        self.table.write().extenders.remove(abstract_id);
    }

    /// 清空全部钩子
    pub fn clear(&self) {
        *self.table.write() = HookTable::default();
    }
}

fn collect(
    global: &[ResolvingCallback],
    specific: Option<&Vec<ResolvingCallback>>,
) -> Vec<ResolvingCallback> {
    global
        .iter()
        .chain(specific.into_iter().flatten())
        .cloned()
        .collect()
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read();
        f.debug_struct("LifecycleHooks")
            .field("resolving", &table.resolving.keys().collect::<Vec<_>>())
            .field(
                "after_resolving",
                &table.after_resolving.keys().collect::<Vec<_>>(),
            )
            .field("global_resolving", &table.global_resolving.len())
            .field("global_after_resolving", &table.global_after_resolving.len())
            .field("rebound", &table.rebound.keys().collect::<Vec<_>>())
            .field("extenders", &table.extenders.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{callback, extender};

    #[test]
    fn test_global_callbacks_come_first() {
        let hooks = LifecycleHooks::new();
        hooks.add_resolving("Logger", callback(|_, _| {}));
        hooks.add_global_resolving(callback(|_, _| {}));
        hooks.add_global_resolving(callback(|_, _| {}));

        assert_eq!(hooks.resolving_callbacks("Logger").len(), 3);
        assert_eq!(hooks.resolving_callbacks("Other").len(), 2);
        assert!(hooks.after_resolving_callbacks("Logger").is_empty());
    }

    #[test]
    fn test_forget_extenders() {
        let hooks = LifecycleHooks::new();
        hooks.add_extender("Logger", extender(|instance, _| Ok(instance)));
        hooks.add_extender("Logger", extender(|instance, _| Ok(instance)));
        assert_eq!(hooks.extenders("Logger").len(), 2);

        hooks.forget_extenders("Logger");
        assert!(hooks.extenders("Logger").is_empty());
    }
}
