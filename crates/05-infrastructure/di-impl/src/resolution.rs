//! 解析引擎
//!
//! 每次顶层解析创建一个 [`Resolution`]，它独占自己的构建栈，
//! 递归解析依赖时始终在同一个栈上进出。容器状态只在单次查询期间加锁，
//! 递归过程中不持有任何锁。

use crate::container::Container;
use di_abstractions::{
    into_instance, primitive_key, Arguments, BuildStack, Concrete, ContextualImplementation,
    Introspector, Parameters, Resolve, ResolveOptions, TypeDescriptor,
};
use infrastructure_common::{DependencyError, DependencyResult, Instance, ParameterDescriptor};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// 单次顶层解析
pub(crate) struct Resolution<'c> {
    container: &'c Container,
    stack: BuildStack,
    started_at: Instant,
    options: ResolveOptions,
}

impl<'c> Resolution<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self {
            container,
            stack: BuildStack::new(),
            started_at: Instant::now(),
            options: ResolveOptions::from(container.config()),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub(crate) fn container(&self) -> &'c Container {
        self.container
    }

    /// 解析一个标识
    pub(crate) fn resolve(
        &mut self,
        abstract_id: &str,
        parameters: Parameters,
    ) -> DependencyResult<Instance> {
        let abstract_id = self.container.bindings.canonical(abstract_id);
        let contextual = self.find_contextual(&abstract_id);
        let contextual_build = !parameters.is_empty() || contextual.is_some();

        if !contextual_build {
            if let Some(instance) = self.container.bindings.instance(&abstract_id) {
                trace!("命中共享实例: {}", abstract_id);
                return Ok(instance);
            }
        }

        self.check_deadline(&abstract_id)?;

        if self.stack.contains(&abstract_id) {
            return self.resolve_cycle(&abstract_id);
        }

        let instance = {
            let mut frame = Frame::enter(self, &abstract_id)?;
            frame.produce(&abstract_id, contextual, &parameters)?
        };

        let mut instance = self.apply_extenders(&abstract_id, instance)?;

        if !contextual_build && self.container.bindings.is_shared_binding(&abstract_id) {
            instance = self.container.bindings.cache_instance(&abstract_id, instance);
        }

        if self.container.bindings.mark_resolved(&abstract_id) {
            self.fire_resolving_callbacks(&abstract_id, &instance);
        }

        Ok(instance)
    }

    /// 尝试解析，目标无法构建时返回 `None`
    pub(crate) fn try_resolve(&mut self, abstract_id: &str) -> DependencyResult<Option<Instance>> {
        match self.resolve(abstract_id, Parameters::new()) {
            Ok(instance) => Ok(Some(instance)),
            Err(error) if error.is_unresolvable() => {
                debug!("可选依赖 {} 无法解析，使用默认值: {}", abstract_id, error);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// 不解析任何依赖，直接构造裸实例
    pub(crate) fn build_bare(&self, concrete_id: &str) -> DependencyResult<Instance> {
        let descriptor = self.describe_instantiable(concrete_id)?;
        let mut arguments = Arguments::new(concrete_id);
        for parameter in &descriptor.parameters {
            let value = fallback_value(concrete_id, parameter)?;
            arguments.push(parameter.name.clone(), value);
        }
        descriptor.instantiate(arguments)
    }

    /// 沿类型绑定找到最终要构建的具体类型
    pub(crate) fn concrete_type_of(&self, abstract_id: &str) -> String {
        let mut current = self.container.bindings.canonical(abstract_id);
        let mut visited = vec![current.clone()];
        while let Some(Concrete::Type(next)) = self.container.bindings.concrete(&current) {
            let next = self.container.bindings.canonical(&next);
            if visited.contains(&next) {
                break;
            }
            visited.push(next.clone());
            current = next;
        }
        current
    }

    /// 为一组参数描述求值
    pub(crate) fn resolve_arguments(
        &mut self,
        declaring_type: &str,
        descriptors: &[ParameterDescriptor],
        parameters: &Parameters,
    ) -> DependencyResult<Arguments> {
        let mut arguments = Arguments::new(declaring_type);
        for parameter in descriptors {
            let value = self.resolve_parameter(declaring_type, parameter, parameters)?;
            arguments.push(parameter.name.clone(), value);
        }
        Ok(arguments)
    }

    /// 解析标签下的全部成员
    ///
    /// 成员按最终标识去重，别名与其目标只解析一次。
    pub(crate) fn resolve_tagged(&mut self, tag: &str) -> DependencyResult<Vec<Instance>> {
        let mut members: Vec<String> = Vec::new();
        for member in self.container.tags.members(tag) {
            let member = self.container.bindings.canonical(&member);
            if !members.contains(&member) {
                members.push(member);
            }
        }
        members
            .iter()
            .map(|member| self.resolve(member, Parameters::new()))
            .collect()
    }

    fn produce(
        &mut self,
        abstract_id: &str,
        contextual: Option<ContextualImplementation>,
        parameters: &Parameters,
    ) -> DependencyResult<Instance> {
        if let Some(implementation) = contextual {
            debug!("使用上下文绑定构建 {}: {:?}", abstract_id, implementation);
            return match implementation {
                ContextualImplementation::Type(type_id) => {
                    self.resolve_concrete(abstract_id, &type_id, parameters)
                }
                ContextualImplementation::Factory(factory) => factory(self, parameters),
                ContextualImplementation::Value(value) => Ok(value),
                ContextualImplementation::Tagged(tag) => {
                    let instances = self.resolve_tagged(&tag)?;
                    if instances.is_empty() {
                        debug!("标签 {} 没有成员，{} 无法解析", tag, abstract_id);
                        let consumer = self.stack.as_slice().iter().rev().nth(1);
                        return Err(DependencyError::UnresolvableDependency {
                            parameter: abstract_id.to_string(),
                            declaring_type: consumer.cloned().unwrap_or_default(),
                        });
                    }
                    Ok(into_instance(instances))
                }
            };
        }

        match self.container.bindings.concrete(abstract_id) {
            Some(Concrete::Factory(factory)) => factory(self, parameters),
            Some(Concrete::Type(type_id)) => self.resolve_concrete(abstract_id, &type_id, parameters),
            Some(Concrete::SelfBound) | None => self.build(abstract_id, parameters),
        }
    }

    fn resolve_concrete(
        &mut self,
        abstract_id: &str,
        concrete_id: &str,
        parameters: &Parameters,
    ) -> DependencyResult<Instance> {
        if concrete_id == abstract_id {
            self.build(concrete_id, parameters)
        } else {
            let instance = self.resolve(concrete_id, parameters.clone())?;
            self.coerce_to_interface(abstract_id, concrete_id, instance)
        }
    }

    /// 具体类型声明了实现该接口时，把实例转为接口实例
    fn coerce_to_interface(
        &self,
        interface_id: &str,
        concrete_id: &str,
        instance: Instance,
    ) -> DependencyResult<Instance> {
        let concrete_type = self.concrete_type_of(concrete_id);
        match self.container.types.describe(&concrete_type) {
            Ok(descriptor) if descriptor.provides_interface(interface_id) => {
                trace!("{} 以接口 {} 交付", concrete_type, interface_id);
                descriptor.coerce(interface_id, instance)
            }
            _ => Ok(instance),
        }
    }

    /// 自动装配：内省构造参数并逐个求值
    fn build(&mut self, concrete_id: &str, parameters: &Parameters) -> DependencyResult<Instance> {
        let descriptor = self.describe_instantiable(concrete_id)?;
        debug!(
            "构建 {}，构建栈深度 {}",
            concrete_id,
            self.stack.depth()
        );
        let arguments =
            self.resolve_arguments(concrete_id, &descriptor.parameters, parameters)?;
        descriptor.instantiate(arguments)
    }

    fn describe_instantiable(&self, concrete_id: &str) -> DependencyResult<Arc<TypeDescriptor>> {
        let descriptor = self.container.types.describe(concrete_id)?;
        if !descriptor.is_instantiable() {
            let frames = self.stack.as_slice();
            let end = match frames.last() {
                Some(last) if last == concrete_id => frames.len() - 1,
                _ => frames.len(),
            };
            return Err(DependencyError::TargetNotInstantiable {
                target: concrete_id.to_string(),
                build_stack: frames[..end].to_vec(),
            });
        }
        Ok(descriptor)
    }

    fn resolve_parameter(
        &mut self,
        declaring_type: &str,
        parameter: &ParameterDescriptor,
        parameters: &Parameters,
    ) -> DependencyResult<Option<Instance>> {
        if let Some(value) = parameters.lookup(parameter) {
            return Ok(Some(value.clone()));
        }

        if let Some(implementation) = self
            .container
            .contextual
            .find(declaring_type, &primitive_key(&parameter.name))
        {
            return self.contextual_argument(implementation);
        }

        match &parameter.declared_type {
            Some(type_id) => {
                let type_id = self.container.bindings.canonical(type_id);
                if let Some(ContextualImplementation::Tagged(tag)) = self.find_contextual(&type_id)
                {
                    return self.tagged_argument(&tag);
                }
                if parameter.has_fallback() {
                    Ok(self
                        .try_resolve(&type_id)?
                        .or_else(|| parameter.default_value.clone()))
                } else {
                    self.resolve(&type_id, Parameters::new()).map(Some)
                }
            }
            None => fallback_value(declaring_type, parameter),
        }
    }

    fn contextual_argument(
        &mut self,
        implementation: ContextualImplementation,
    ) -> DependencyResult<Option<Instance>> {
        match implementation {
            ContextualImplementation::Type(type_id) => {
                self.resolve(&type_id, Parameters::new()).map(Some)
            }
            ContextualImplementation::Factory(factory) => {
                factory(self, &Parameters::new()).map(Some)
            }
            ContextualImplementation::Value(value) => Ok(Some(value)),
            ContextualImplementation::Tagged(tag) => self.tagged_argument(&tag),
        }
    }

    fn tagged_argument(&mut self, tag: &str) -> DependencyResult<Option<Instance>> {
        let instances = self.resolve_tagged(tag)?;
        if instances.is_empty() {
            Ok(None)
        } else {
            Ok(Some(into_instance(instances)))
        }
    }

    fn find_contextual(&self, abstract_id: &str) -> Option<ContextualImplementation> {
        let consumer = self.stack.parent()?;
        let store = &self.container.contextual;
        if !store.has_consumer(consumer) {
            return None;
        }
        store.find(consumer, abstract_id).or_else(|| {
            self.container
                .bindings
                .aliases_of(abstract_id)
                .iter()
                .find_map(|alias| store.find(consumer, alias))
        })
    }

    fn resolve_cycle(&self, abstract_id: &str) -> DependencyResult<Instance> {
        let concrete_id = self.concrete_type_of(abstract_id);
        let bare_allowed = self
            .container
            .types
            .describe(&concrete_id)
            .map_or(false, |descriptor| descriptor.bare_on_cycle);
        if bare_allowed {
            warn!(
                "检测到 {} 的循环引用，按声明构造裸实例: {}",
                concrete_id,
                self.stack.cycle_path(abstract_id).join(" -> ")
            );
            return self.build_bare(&concrete_id);
        }
        Err(self.stack.cycle_error(abstract_id))
    }

    fn check_deadline(&self, abstract_id: &str) -> DependencyResult<()> {
        let Some(timeout) = self.options.timeout else {
            return Ok(());
        };
        if self.started_at.elapsed() <= timeout {
            return Ok(());
        }
        let mut path = self.stack.as_slice().to_vec();
        path.push(abstract_id.to_string());
        warn!(
            "解析超过 {:?} 仍未完成，按循环依赖中止: {}",
            timeout,
            path.join(" -> ")
        );
        Err(DependencyError::CircularDependency { path })
    }

    fn apply_extenders(&mut self, abstract_id: &str, instance: Instance) -> DependencyResult<Instance> {
        let mut instance = instance;
        for extender in self.container.hooks.extenders(abstract_id) {
            instance = extender(instance, self)?;
        }
        Ok(instance)
    }

    fn fire_resolving_callbacks(&mut self, abstract_id: &str, instance: &Instance) {
        for callback in self.container.hooks.resolving_callbacks(abstract_id) {
            callback(instance, self);
        }
        for callback in self.container.hooks.after_resolving_callbacks(abstract_id) {
            callback(instance, self);
        }
    }
}

impl Resolve for Resolution<'_> {
    fn make_with(&mut self, abstract_id: &str, parameters: Parameters) -> DependencyResult<Instance> {
        self.resolve(abstract_id, parameters)
    }

    fn try_make(&mut self, abstract_id: &str) -> DependencyResult<Option<Instance>> {
        self.try_resolve(abstract_id)
    }

    fn build_stack(&self) -> &[String] {
        self.stack.as_slice()
    }
}

/// 构建栈帧，离开作用域时出栈
struct Frame<'r, 'c> {
    resolution: &'r mut Resolution<'c>,
}

impl<'r, 'c> Frame<'r, 'c> {
    fn enter(resolution: &'r mut Resolution<'c>, abstract_id: &str) -> DependencyResult<Self> {
        resolution.stack.push(abstract_id)?;
        Ok(Self { resolution })
    }
}

impl Drop for Frame<'_, '_> {
    fn drop(&mut self) {
        self.resolution.stack.pop();
    }
}

impl<'c> Deref for Frame<'_, 'c> {
    type Target = Resolution<'c>;

    fn deref(&self) -> &Self::Target {
        self.resolution
    }
}

impl DerefMut for Frame<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.resolution
    }
}

fn fallback_value(
    declaring_type: &str,
    parameter: &ParameterDescriptor,
) -> DependencyResult<Option<Instance>> {
    match &parameter.default_value {
        Some(value) => Ok(Some(value.clone())),
        None if parameter.is_optional => Ok(None),
        None => Err(DependencyError::UnresolvableDependency {
            parameter: parameter.name.clone(),
            declaring_type: declaring_type.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::ServiceContainer;

    struct Leaf;

    fn container_with_chain() -> Container {
        let container = Container::new();
        container.register_descriptor(
            TypeDescriptor::concrete("Root", |arguments| {
                arguments.instance("leaf")?;
                Ok(into_instance(()))
            })
            .parameter(ParameterDescriptor::new("leaf").with_type("Leaf")),
        );
        container.register_descriptor(TypeDescriptor::concrete("Leaf", |_| Ok(into_instance(Leaf))));
        container
    }

    #[test]
    fn test_stack_is_empty_after_success() {
        let container = container_with_chain();
        let mut resolution = Resolution::new(&container);

        resolution.resolve("Root", Parameters::new()).unwrap();
        assert!(resolution.stack.is_empty());
    }

    #[test]
    fn test_stack_is_unwound_after_failure() {
        let container = container_with_chain();
        container.bind("Leaf", "Missing").unwrap();
        let mut resolution = Resolution::new(&container);

        let error = resolution.resolve("Root", Parameters::new()).unwrap_err();
        assert!(matches!(error, DependencyError::TargetNotFound { ref target } if target == "Missing"));
        assert!(resolution.stack.is_empty());
    }

    #[test]
    fn test_factory_sees_shared_build_stack() {
        let container = Container::new();
        container
            .bind_factory("StackReporter", |resolver, _| {
                Ok(into_instance(resolver.build_stack().to_vec()))
            })
            .unwrap();

        let stack = container.make_as::<Vec<String>>("StackReporter").unwrap();
        assert_eq!(*stack, vec!["StackReporter".to_string()]);
    }

    #[test]
    fn test_expired_deadline_reports_cycle() {
        let container = Container::with_config(
            infrastructure_common::ContainerConfig::default()
                .with_resolution_timeout(Duration::from_millis(0)),
        );
        container.register_descriptor(TypeDescriptor::concrete("Leaf", |_| Ok(into_instance(Leaf))));
        let mut resolution = Resolution::new(&container);
        std::thread::sleep(Duration::from_millis(2));

        let error = resolution.resolve("Leaf", Parameters::new()).unwrap_err();
        assert_eq!(error.cycle_path(), Some(&["Leaf".to_string()][..]));
    }

    #[test]
    fn test_concrete_type_of_follows_type_bindings() {
        let container = Container::new();
        container.bind("Mailer", "SmtpMailer").unwrap();
        container.bind("SmtpMailer", "PooledSmtpMailer").unwrap();
        container.alias("Mailer", "mail").unwrap();
        let resolution = Resolution::new(&container);

        assert_eq!(resolution.concrete_type_of("mail"), "PooledSmtpMailer");
    }

    trait Mailer: Send + Sync {}

    struct SmtpMailer;

    impl Mailer for SmtpMailer {}

    #[test]
    fn test_type_binding_delivers_declared_interface() {
        let container = Container::new();
        container.register_descriptor(TypeDescriptor::interface("Mailer"));
        container.register_descriptor(
            TypeDescriptor::concrete("SmtpMailer", |_| Ok(into_instance(SmtpMailer)))
                .provides::<SmtpMailer, dyn Mailer, _>("Mailer", |mailer| mailer),
        );
        container.bind("Mailer", "SmtpMailer").unwrap();
        container.alias("Mailer", "mail").unwrap();
        let mut resolution = Resolution::new(&container);

        let through_interface = resolution.resolve("mail", Parameters::new()).unwrap();
        let direct = resolution.resolve("SmtpMailer", Parameters::new()).unwrap();

        assert!(through_interface.downcast_ref::<Arc<dyn Mailer>>().is_some());
        assert!(direct.downcast_ref::<SmtpMailer>().is_some());
    }

    #[test]
    fn test_bare_build_uses_defaults() {
        let container = Container::new();
        container.register_descriptor(
            TypeDescriptor::concrete("Panel", |arguments| {
                let title = arguments.value::<String>("title")?;
                let parent = arguments.optional_instance("parent");
                Ok(into_instance((title, parent.is_some())))
            })
            .parameter(ParameterDescriptor::new("parent").with_type("Panel").optional())
            .parameter(ParameterDescriptor::new("title").with_default("untitled".to_string())),
        );
        let resolution = Resolution::new(&container);

        let panel = resolution.build_bare("Panel").unwrap();
        let (title, has_parent) = panel.downcast_ref::<(String, bool)>().unwrap();
        assert_eq!(title, "untitled");
        assert!(!has_parent);
    }
}
