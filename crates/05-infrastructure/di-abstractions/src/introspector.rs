//! 类型内省抽象接口
//!
//! Rust 没有运行时反射，可自动装配的类型需要在启动时显式登记自己的构造形状。

use crate::arguments::Arguments;
use infrastructure_common::{
    downcast_instance, into_instance, DependencyError, DependencyResult, Instance,
    ParameterDescriptor, TypeKind,
};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 构造函数
pub type Constructor = Arc<dyn Fn(Arguments) -> DependencyResult<Instance> + Send + Sync>;

/// 方法调用函数，第一个参数为接收者实例
pub type MethodFn = Arc<dyn Fn(Instance, Arguments) -> DependencyResult<Instance> + Send + Sync>;

/// 接口转换函数，把具体类型的实例转为接口实例
pub type Coercion = Arc<dyn Fn(Instance) -> DependencyResult<Instance> + Send + Sync>;

/// 方法描述
#[derive(Clone)]
pub struct MethodDescriptor {
    /// 方法名称
    pub name: String,
    /// 参数列表
    pub parameters: Vec<ParameterDescriptor>,
    invoke: MethodFn,
}

impl MethodDescriptor {
    /// 调用方法
    pub fn invoke(&self, receiver: Instance, arguments: Arguments) -> DependencyResult<Instance> {
        (self.invoke)(receiver, arguments)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("invoke", &"<function>")
            .finish()
    }
}

/// 类型描述
#[derive(Clone)]
pub struct TypeDescriptor {
    /// 类型标识
    pub id: String,
    /// 类型种类
    pub kind: TypeKind,
    /// 构造参数，按位置排列
    pub parameters: Vec<ParameterDescriptor>,
    /// 检测到循环时是否允许不解析依赖直接构造
    pub bare_on_cycle: bool,
    constructor: Option<Constructor>,
    methods: HashMap<String, MethodDescriptor>,
    coercions: HashMap<String, Coercion>,
}

impl TypeDescriptor {
    /// 描述一个具体类型
    pub fn concrete<F>(id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Arguments) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            kind: TypeKind::Concrete,
            parameters: Vec::new(),
            bare_on_cycle: false,
            constructor: Some(Arc::new(constructor)),
            methods: HashMap::new(),
            coercions: HashMap::new(),
        }
    }

    /// 描述一个接口
    pub fn interface(id: impl Into<String>) -> Self {
        Self::uninstantiable(id, TypeKind::Interface)
    }

    /// 描述一个抽象类型
    pub fn abstract_type(id: impl Into<String>) -> Self {
        Self::uninstantiable(id, TypeKind::Abstract)
    }

    fn uninstantiable(id: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            parameters: Vec::new(),
            bare_on_cycle: false,
            constructor: None,
            methods: HashMap::new(),
            coercions: HashMap::new(),
        }
    }

    /// 追加构造参数，位置按追加顺序分配
    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        let position = self.parameters.len();
        self.parameters.push(parameter.at(position));
        self
    }

    /// 登记可通过 `call` 调用的方法
    pub fn method<F>(
        mut self,
        name: impl Into<String>,
        parameters: Vec<ParameterDescriptor>,
        invoke: F,
    ) -> Self
    where
        F: Fn(Instance, Arguments) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        let name = name.into();
        let parameters = parameters
            .into_iter()
            .enumerate()
            .map(|(position, parameter)| parameter.at(position))
            .collect();
        self.methods.insert(
            name.clone(),
            MethodDescriptor {
                name,
                parameters,
                invoke: Arc::new(invoke),
            },
        );
        self
    }

    /// 声明该类型实现某个接口
    ///
    /// 经由接口标识绑定到该类型时，构建出的实例按 `convert` 转为 `Arc<I>`，
    /// 使用方以 `Arc<dyn Trait>` 取值。
    ///
    /// ```rust,ignore
    /// TypeDescriptor::concrete("SmtpMailer", |_| Ok(into_instance(SmtpMailer)))
    ///     .provides::<SmtpMailer, dyn Mailer, _>("Mailer", |mailer| mailer);
    /// ```
    pub fn provides<T, I, F>(mut self, interface_id: impl Into<String>, convert: F) -> Self
    where
        T: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        let target = self.id.clone();
        self.coercions.insert(
            interface_id.into(),
            Arc::new(move |instance| {
                let concrete = downcast_instance::<T>(instance, &target)?;
                Ok(into_instance(convert(concrete)))
            }),
        );
        self
    }

    /// 是否声明实现了该接口
    pub fn provides_interface(&self, interface_id: &str) -> bool {
        self.coercions.contains_key(interface_id)
    }

    /// 把实例转为接口实例，未声明该接口时原样返回
    pub fn coerce(&self, interface_id: &str, instance: Instance) -> DependencyResult<Instance> {
        match self.coercions.get(interface_id) {
            Some(convert) => convert(instance),
            None => Ok(instance),
        }
    }

    /// 允许在循环依赖时构造裸实例
    pub fn bare_on_cycle(mut self) -> Self {
        self.bare_on_cycle = true;
        self
    }

    /// 是否可实例化
    pub fn is_instantiable(&self) -> bool {
        self.kind.is_concrete() && self.constructor.is_some()
    }

    /// 调用构造函数
    pub fn instantiate(&self, arguments: Arguments) -> DependencyResult<Instance> {
        match &self.constructor {
            Some(constructor) if self.kind.is_concrete() => constructor(arguments),
            _ => Err(DependencyError::TargetNotInstantiable {
                target: self.id.clone(),
                build_stack: Vec::new(),
            }),
        }
    }

    /// 查找方法
    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .field("bare_on_cycle", &self.bare_on_cycle)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("provides", &self.coercions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 类型内省器 trait
///
/// 根据类型标识给出构造参数列表，纯查询，无副作用
pub trait Introspector: Send + Sync {
    /// 获取类型描述
    fn describe(&self, type_id: &str) -> DependencyResult<Arc<TypeDescriptor>>;

    /// 是否认识该类型
    fn knows(&self, type_id: &str) -> bool;

    /// 获取构造参数列表
    fn describe_constructor(&self, type_id: &str) -> DependencyResult<Vec<ParameterDescriptor>> {
        let descriptor = self.describe(type_id)?;
        if !descriptor.is_instantiable() {
            return Err(DependencyError::TargetNotInstantiable {
                target: type_id.to_string(),
                build_stack: Vec::new(),
            });
        }
        Ok(descriptor.parameters.clone())
    }
}

/// 可注入类型 trait
///
/// 通常由 `#[derive(Injectable)]` 生成
pub trait Injectable: Send + Sync + Sized + 'static {
    /// 构造形状
    fn type_descriptor() -> TypeDescriptor;
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::into_instance;

    #[test]
    fn test_parameter_positions_follow_declaration_order() {
        let descriptor = TypeDescriptor::concrete("Notifier", |_| Ok(into_instance(())))
            .parameter(ParameterDescriptor::new("mailer").with_type("Mailer"))
            .parameter(ParameterDescriptor::new("retries").with_default(3_u32));

        let positions: Vec<_> = descriptor.parameters.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1]);
        assert!(descriptor.is_instantiable());
    }

    #[test]
    fn test_interface_is_not_instantiable() {
        let descriptor = TypeDescriptor::interface("Mailer");

        assert!(!descriptor.is_instantiable());
        let error = descriptor.instantiate(Arguments::new("Mailer")).unwrap_err();
        assert!(matches!(
            error,
            DependencyError::TargetNotInstantiable { .. }
        ));
    }

    trait Mailer: Send + Sync {
        fn transport(&self) -> &'static str;
    }

    struct SmtpMailer;

    impl Mailer for SmtpMailer {
        fn transport(&self) -> &'static str {
            "smtp"
        }
    }

    #[test]
    fn test_provides_converts_to_interface_instance() {
        let descriptor = TypeDescriptor::concrete("SmtpMailer", |_| Ok(into_instance(SmtpMailer)))
            .provides::<SmtpMailer, dyn Mailer, _>("Mailer", |mailer| mailer);

        assert!(descriptor.provides_interface("Mailer"));
        let instance = descriptor.instantiate(Arguments::new("SmtpMailer")).unwrap();
        let coerced = descriptor.coerce("Mailer", instance.clone()).unwrap();
        let mailer = coerced.downcast_ref::<Arc<dyn Mailer>>().unwrap();
        assert_eq!(mailer.transport(), "smtp");

        let untouched = descriptor.coerce("Formatter", instance.clone()).unwrap();
        assert!(Arc::ptr_eq(&untouched, &instance));

        let error = descriptor.coerce("Mailer", into_instance(1_u8)).unwrap_err();
        assert!(matches!(error, DependencyError::TypeMismatch { .. }));
    }

    #[test]
    fn test_method_registration() {
        let descriptor = TypeDescriptor::concrete("Report", |_| Ok(into_instance(())))
            .method(
                "render",
                vec![ParameterDescriptor::new("format")],
                |_, _| Ok(into_instance("ok".to_string())),
            );

        let method = descriptor.find_method("render").unwrap();
        assert_eq!(method.parameters[0].position, 0);
        assert!(descriptor.find_method("missing").is_none());
    }
}
