//! 服务容器抽象接口
//!
//! 提供依赖注入容器对外暴露的核心能力

use crate::arguments::Parameters;
use crate::registry::Concrete;
use crate::resolver::Resolve;
use infrastructure_common::{
    downcast_instance, DependencyResult, Instance, Lifetime,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

/// 服务容器 trait
///
/// 所有方法都只需要共享引用，容器可以放进 `Arc` 在线程间共享。
pub trait ServiceContainer: Send + Sync {
    /// 注册绑定，覆盖已有绑定；若该标识已被解析过则触发重绑定回调
    fn bind_with_lifetime(
        &self,
        abstract_id: &str,
        concrete: Concrete,
        lifetime: Lifetime,
    ) -> DependencyResult<()>;

    /// 直接登记实例，跳过工厂
    fn instance(&self, abstract_id: &str, instance: Instance) -> DependencyResult<Instance>;

    /// 登记别名
    fn alias(&self, abstract_id: &str, alias: &str) -> DependencyResult<()>;

    /// 是否存在绑定、实例或别名
    fn bound(&self, abstract_id: &str) -> bool;

    /// 带覆盖参数解析
    fn make_with(&self, abstract_id: &str, parameters: Parameters) -> DependencyResult<Instance>;

    /// 给一组标识打标签
    fn tag(&self, tag: &str, abstract_ids: &[&str]);

    /// 解析标签下的全部实例，按登记顺序、每个成员一次
    fn tagged(&self, tag: &str) -> DependencyResult<Vec<Instance>>;

    /// 注册扩展器
    fn extend<F>(&self, abstract_id: &str, extender: F) -> DependencyResult<()>
    where
        F: Fn(Instance, &mut dyn Resolve) -> DependencyResult<Instance> + Send + Sync + 'static;

    /// 注册解析回调
    fn resolving<F>(&self, abstract_id: &str, callback: F)
    where
        F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static;

    /// 注册解析后回调
    fn after_resolving<F>(&self, abstract_id: &str, callback: F)
    where
        F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static;

    /// 注册重绑定回调，已绑定时返回当前实例
    fn rebinding<F>(&self, abstract_id: &str, callback: F) -> DependencyResult<Option<Instance>>
    where
        F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static;

    /// 注册瞬时绑定
    fn bind(&self, abstract_id: &str, concrete: impl Into<Concrete>) -> DependencyResult<()> {
        self.bind_with_lifetime(abstract_id, concrete.into(), Lifetime::Transient)
    }

    /// 注册单例绑定
    fn singleton(&self, abstract_id: &str, concrete: impl Into<Concrete>) -> DependencyResult<()> {
        self.bind_with_lifetime(abstract_id, concrete.into(), Lifetime::Singleton)
    }

    /// 注册作用域绑定
    fn scoped(&self, abstract_id: &str, concrete: impl Into<Concrete>) -> DependencyResult<()> {
        self.bind_with_lifetime(abstract_id, concrete.into(), Lifetime::Scoped)
    }

    /// 是否存在绑定（`bound` 的别名）
    fn has(&self, abstract_id: &str) -> bool {
        self.bound(abstract_id)
    }

    /// 解析
    fn make(&self, abstract_id: &str) -> DependencyResult<Instance> {
        self.make_with(abstract_id, Parameters::new())
    }

    /// 解析并向下转型
    fn make_as<T>(&self, abstract_id: &str) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
        Self: Sized,
    {
        downcast_instance(self.make(abstract_id)?, abstract_id)
    }

    /// 登记类型化实例
    fn instance_of<T>(&self, abstract_id: &str, value: T) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
        Self: Sized,
    {
        let value = Arc::new(value);
        self.instance(abstract_id, value.clone())?;
        Ok(value)
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    /// 已注册绑定数量
    pub registered_bindings: usize,
    /// 已登记类型数量
    pub registered_types: usize,
    /// 别名数量
    pub aliases: usize,
    /// 活跃单例数量
    pub active_singletons: usize,
    /// 已解析过的标识数量
    pub resolved_abstracts: usize,
    /// 顶层解析次数
    pub resolutions: u64,
    /// 解析错误次数
    pub resolution_errors: u64,
    /// 解析总时间（微秒）
    pub total_resolution_time_us: u64,
    /// 平均解析时间（微秒）
    pub average_resolution_time_us: f64,
}
