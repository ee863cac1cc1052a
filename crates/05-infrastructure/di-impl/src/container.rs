//! 服务容器
//!
//! [`Container`] 组合类型注册表、绑定注册表、上下文绑定、标签和生命周期钩子，
//! 对外提供完整的注册与解析接口。容器可放进 `Arc` 在线程间共享，
//! 每次顶层解析都有自己的构建栈。

use crate::binding_registry::BindingRegistry;
use crate::bound_method::CallTarget;
use crate::contextual::{ContextualBindingBuilder, ContextualBindingStore};
use crate::hooks::LifecycleHooks;
use crate::resolution::Resolution;
use crate::tags::TagRegistry;
use crate::type_registry::TypeRegistry;
use di_abstractions::{
    callback, extender, BindingRecord, Concrete, ContainerStats, ContextualImplementation,
    Injectable, Parameters, Resolve, ServiceContainer, TypeDescriptor,
};
use infrastructure_common::{
    downcast_instance, ContainerConfig, DependencyResult, Instance, Lifetime,
};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// 解析性能统计
#[derive(Debug, Default)]
struct ResolutionMetrics {
    resolutions: AtomicU64,
    errors: AtomicU64,
    total_time_us: AtomicU64,
}

impl ResolutionMetrics {
    fn record(&self, elapsed: Duration, succeeded: bool) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_time_us.fetch_add(micros, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.resolutions.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.total_time_us.store(0, Ordering::Relaxed);
    }
}

/// 服务容器
#[derive(Default)]
pub struct Container {
    pub(crate) types: TypeRegistry,
    pub(crate) bindings: BindingRegistry,
    pub(crate) contextual: ContextualBindingStore,
    pub(crate) tags: TagRegistry,
    pub(crate) hooks: LifecycleHooks,
    config: ContainerConfig,
    metrics: ResolutionMetrics,
}

impl Container {
    /// 使用默认配置创建容器
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定配置创建容器
    pub fn with_config(config: ContainerConfig) -> Self {
        info!(
            "创建服务容器，解析超时: {:?}，性能监控: {}",
            config.resolution_timeout(),
            config.enable_performance_monitoring
        );
        Self {
            config,
            ..Self::default()
        }
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 类型注册表
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// 登记可注入类型，返回类型标识
    pub fn register_type<T: Injectable>(&self) -> String {
        self.types.register::<T>()
    }

    /// 登记类型描述
    pub fn register_descriptor(&self, descriptor: TypeDescriptor) -> String {
        self.types.register_descriptor(descriptor)
    }

    /// 以工厂注册瞬时绑定
    pub fn bind_factory<F>(&self, abstract_id: &str, f: F) -> DependencyResult<()>
    where
        F: Fn(&mut dyn Resolve, &Parameters) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        self.bind_with_lifetime(abstract_id, Concrete::factory(f), Lifetime::Transient)
    }

    /// 以工厂注册单例绑定
    pub fn singleton_factory<F>(&self, abstract_id: &str, f: F) -> DependencyResult<()>
    where
        F: Fn(&mut dyn Resolve, &Parameters) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        self.bind_with_lifetime(abstract_id, Concrete::factory(f), Lifetime::Singleton)
    }

    /// 以工厂注册作用域绑定
    pub fn scoped_factory<F>(&self, abstract_id: &str, f: F) -> DependencyResult<()>
    where
        F: Fn(&mut dyn Resolve, &Parameters) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        self.bind_with_lifetime(abstract_id, Concrete::factory(f), Lifetime::Scoped)
    }

    /// 尚未绑定时注册瞬时绑定，返回是否注册
    pub fn bind_if(&self, abstract_id: &str, concrete: impl Into<Concrete>) -> DependencyResult<bool> {
        self.register_if(abstract_id, concrete.into(), Lifetime::Transient)
    }

    /// 尚未绑定时注册单例绑定，返回是否注册
    pub fn singleton_if(
        &self,
        abstract_id: &str,
        concrete: impl Into<Concrete>,
    ) -> DependencyResult<bool> {
        self.register_if(abstract_id, concrete.into(), Lifetime::Singleton)
    }

    /// 尚未绑定时注册作用域绑定，返回是否注册
    pub fn scoped_if(&self, abstract_id: &str, concrete: impl Into<Concrete>) -> DependencyResult<bool> {
        self.register_if(abstract_id, concrete.into(), Lifetime::Scoped)
    }

    fn register_if(
        &self,
        abstract_id: &str,
        concrete: Concrete,
        lifetime: Lifetime,
    ) -> DependencyResult<bool> {
        if self.bound(abstract_id) {
            return Ok(false);
        }
        self.bind_with_lifetime(abstract_id, concrete, lifetime)?;
        Ok(true)
    }

    /// 是否为别名
    pub fn is_alias(&self, name: &str) -> bool {
        self.bindings.is_alias(name)
    }

    /// 沿别名链找到最终标识
    pub fn get_alias(&self, abstract_id: &str) -> String {
        self.bindings.canonical(abstract_id)
    }

    /// 是否已被解析过或已有实例
    pub fn resolved(&self, abstract_id: &str) -> bool {
        self.bindings.is_resolved(abstract_id)
    }

    /// 是否共享
    pub fn is_shared(&self, abstract_id: &str) -> bool {
        self.bindings.is_shared(&self.bindings.canonical(abstract_id))
    }

    /// 尝试解析，目标无法构建时返回 `None`，循环依赖等错误仍然返回 `Err`
    pub fn try_make(&self, abstract_id: &str) -> DependencyResult<Option<Instance>> {
        self.run(abstract_id, |resolution| resolution.try_resolve(abstract_id))
    }

    /// 不解析任何依赖，直接构造裸实例，不缓存也不触发回调
    pub fn make_bare(&self, abstract_id: &str) -> DependencyResult<Instance> {
        self.run(abstract_id, |resolution| {
            let concrete_id = resolution.concrete_type_of(abstract_id);
            resolution.build_bare(&concrete_id)
        })
    }

    /// 带覆盖参数解析并向下转型
    pub fn make_as_with<T>(&self, abstract_id: &str, parameters: Parameters) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_instance(self.make_with(abstract_id, parameters)?, abstract_id)
    }

    /// 返回一个每次调用都解析该标识的闭包
    pub fn factory(&self, abstract_id: &str) -> impl Fn() -> DependencyResult<Instance> + '_ {
        let abstract_id = abstract_id.to_string();
        move || self.make(&abstract_id)
    }

    /// 开始登记上下文绑定
    pub fn when(&self, consumer: &str) -> ContextualBindingBuilder<'_> {
        self.when_any(&[consumer])
    }

    /// 为多个使用方登记同一上下文绑定
    pub fn when_any(&self, consumers: &[&str]) -> ContextualBindingBuilder<'_> {
        let consumers = consumers
            .iter()
            .map(|consumer| self.bindings.canonical(consumer))
            .collect();
        ContextualBindingBuilder::new(self, consumers)
    }

    /// 登记单条上下文绑定
    pub fn add_contextual_binding(
        &self,
        consumer: &str,
        needs: &str,
        implementation: ContextualImplementation,
    ) {
        let needs = self.bindings.canonical(needs);
        debug!("登记上下文绑定: {} 需要 {} -> {:?}", consumer, needs, implementation);
        self.contextual.add(consumer, &needs, implementation);
    }

    /// 注册全局解析回调
    pub fn resolving_any<F>(&self, callback_fn: F)
    where
        F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static,
    {
        self.hooks.add_global_resolving(callback(callback_fn));
    }

    /// 注册全局解析后回调
    pub fn after_resolving_any<F>(&self, callback_fn: F)
    where
        F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static,
    {
        self.hooks.add_global_after_resolving(callback(callback_fn));
    }

    /// 解析参数并调用目标
    pub fn call(&self, target: &CallTarget, parameters: Parameters) -> DependencyResult<Instance> {
        let label = format!("{target:?}");
        self.run(&label, |resolution| resolution.call(target, &parameters))
    }

    /// 丢弃单个共享实例
    pub fn forget_instance(&self, abstract_id: &str) {
        let abstract_id = self.bindings.canonical(abstract_id);
        if self.bindings.forget_instance(&abstract_id).is_some() {
            debug!("丢弃共享实例: {}", abstract_id);
        }
    }

    /// 丢弃全部共享实例
    pub fn forget_instances(&self) {
        self.bindings.forget_instances();
    }

    /// 丢弃作用域实例
    pub fn forget_scoped_instances(&self) {
        let forgotten = self.bindings.forget_scoped_instances();
        debug!("丢弃 {} 个作用域实例", forgotten);
    }

    /// 移除某个标识的扩展器
    pub fn forget_extenders(&self, abstract_id: &str) {
        self.hooks
            .forget_extenders(&self.bindings.canonical(abstract_id));
    }

    /// 清空容器的全部状态
    pub fn flush(&self) {
        info!("清空服务容器");
        self.bindings.flush();
        self.contextual.clear();
        self.tags.clear();
        self.hooks.clear();
        self.types.clear();
        self.metrics.reset();
    }

    /// 统计信息
    pub fn stats(&self) -> ContainerStats {
        let resolutions = self.metrics.resolutions.load(Ordering::Relaxed);
        let total_resolution_time_us = self.metrics.total_time_us.load(Ordering::Relaxed);
        let average_resolution_time_us = if resolutions == 0 {
            0.0
        } else {
            total_resolution_time_us as f64 / resolutions as f64
        };
        ContainerStats {
            registered_bindings: self.bindings.binding_count(),
            registered_types: self.types.len(),
            aliases: self.bindings.alias_count(),
            active_singletons: self.bindings.instance_count(),
            resolved_abstracts: self.bindings.resolved_count(),
            resolutions,
            resolution_errors: self.metrics.errors.load(Ordering::Relaxed),
            total_resolution_time_us,
            average_resolution_time_us,
        }
    }

    /// 执行一次顶层解析
    fn run<T, F>(&self, target: &str, f: F) -> DependencyResult<T>
    where
        F: FnOnce(&mut Resolution<'_>) -> DependencyResult<T>,
    {
        let mut resolution = Resolution::new(self);
        let result = f(&mut resolution);
        if self.config.enable_performance_monitoring {
            self.metrics.record(resolution.elapsed(), result.is_ok());
            if let Err(e) = &result {
                error!("解析 {} 失败: {}", target, e);
            }
        } else if let Err(e) = &result {
            debug!("解析 {} 失败: {}", target, e);
        }
        result
    }

    /// 重新解析并触发重绑定回调
    fn rebound(&self, abstract_id: &str) -> DependencyResult<()> {
        let callbacks = self.hooks.rebound_callbacks(abstract_id);
        if callbacks.is_empty() {
            return Ok(());
        }
        debug!("{} 已重新绑定，触发 {} 个回调", abstract_id, callbacks.len());
        let instance = self.make(abstract_id)?;
        let mut resolution = Resolution::new(self);
        for hook in callbacks {
            hook(&instance, &mut resolution);
        }
        Ok(())
    }
}

impl ServiceContainer for Container {
    fn bind_with_lifetime(
        &self,
        abstract_id: &str,
        concrete: Concrete,
        lifetime: Lifetime,
    ) -> DependencyResult<()> {
        debug!("注册绑定: {} -> {:?} ({:?})", abstract_id, concrete, lifetime);
        let was_resolved = self
            .bindings
            .register(BindingRecord::new(abstract_id, concrete, lifetime));
        if was_resolved {
            self.rebound(abstract_id)?;
        }
        Ok(())
    }

    fn instance(&self, abstract_id: &str, instance: Instance) -> DependencyResult<Instance> {
        debug!("登记实例: {}", abstract_id);
        let was_bound = self.bindings.store_instance(abstract_id, instance.clone());
        if was_bound {
            self.rebound(abstract_id)?;
        }
        Ok(instance)
    }

    fn alias(&self, abstract_id: &str, alias: &str) -> DependencyResult<()> {
        debug!("登记别名: {} -> {}", alias, abstract_id);
        self.bindings.add_alias(abstract_id, alias)
    }

    fn bound(&self, abstract_id: &str) -> bool {
        self.bindings.bound(abstract_id)
    }

    fn make_with(&self, abstract_id: &str, parameters: Parameters) -> DependencyResult<Instance> {
        self.run(abstract_id, |resolution| {
            resolution.resolve(abstract_id, parameters)
        })
    }

    fn tag(&self, tag: &str, abstract_ids: &[&str]) {
        debug!("登记标签 {}: {:?}", tag, abstract_ids);
        self.tags.tag(tag, abstract_ids);
    }

    fn tagged(&self, tag: &str) -> DependencyResult<Vec<Instance>> {
        self.run(tag, |resolution| resolution.resolve_tagged(tag))
    }

    fn extend<F>(&self, abstract_id: &str, extender_fn: F) -> DependencyResult<()>
    where
        F: Fn(Instance, &mut dyn Resolve) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        let abstract_id = self.bindings.canonical(abstract_id);
        let extender = extender(extender_fn);
        match self.bindings.instance(&abstract_id) {
            Some(instance) => {
                debug!("扩展已缓存的实例: {}", abstract_id);
                let mut resolution = Resolution::new(self);
                let extended = extender(instance, &mut resolution)?;
                self.bindings.replace_instance(&abstract_id, extended);
                self.rebound(&abstract_id)
            }
            None => {
                self.hooks.add_extender(&abstract_id, extender);
                if self.bindings.is_resolved(&abstract_id) {
                    self.rebound(&abstract_id)?;
                }
                Ok(())
            }
        }
    }

    fn resolving<F>(&self, abstract_id: &str, callback_fn: F)
    where
        F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static,
    {
        self.hooks
            .add_resolving(&self.bindings.canonical(abstract_id), callback(callback_fn));
    }

    fn after_resolving<F>(&self, abstract_id: &str, callback_fn: F)
    where
        F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static,
    {
        self.hooks
            .add_after_resolving(&self.bindings.canonical(abstract_id), callback(callback_fn));
    }

    fn rebinding<F>(&self, abstract_id: &str, callback_fn: F) -> DependencyResult<Option<Instance>>
    where
        F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static,
    {
        let abstract_id = self.bindings.canonical(abstract_id);
        self.hooks.add_rebound(&abstract_id, callback(callback_fn));
        if self.bound(&abstract_id) {
            self.make(&abstract_id).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.config)
            .field("types", &self.types.len())
            .field("bindings", &self.bindings.binding_count())
            .field("instances", &self.bindings.instance_count())
            .field("contextual", &self.contextual.len())
            .field("tags", &self.tags.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}
