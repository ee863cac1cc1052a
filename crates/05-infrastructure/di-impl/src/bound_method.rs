//! 方法调用
//!
//! `call` 为任意闭包或已登记的类型方法解析参数后调用。

use crate::resolution::Resolution;
use di_abstractions::{Arguments, Introspector, Parameters};
use infrastructure_common::{DependencyError, DependencyResult, Instance, ParameterDescriptor};
use std::fmt;
use std::sync::Arc;

/// 闭包调用体
pub type CallBody = Arc<dyn Fn(Arguments) -> DependencyResult<Instance> + Send + Sync>;

/// 调用目标
#[derive(Clone)]
pub enum CallTarget {
    /// 类型上登记的方法，接收者从容器解析
    Method {
        /// 接收者标识
        type_id: String,
        /// 方法名
        method: String,
    },
    /// 带参数描述的闭包
    Closure {
        /// 参数描述
        parameters: Vec<ParameterDescriptor>,
        /// 调用体
        body: CallBody,
    },
}

impl CallTarget {
    /// 解析 `Type@method` 形式的调用目标
    pub fn parse(target: &str) -> DependencyResult<Self> {
        match target.split_once('@') {
            Some((type_id, method)) if !type_id.is_empty() && !method.is_empty() => {
                Ok(Self::method(type_id, method))
            }
            _ => Err(DependencyError::InvalidCallTarget {
                target: target.to_string(),
            }),
        }
    }

    /// 类型方法
    pub fn method(type_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            type_id: type_id.into(),
            method: method.into(),
        }
    }

    /// 闭包，参数位置按顺序分配
    pub fn closure<F>(parameters: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(Arguments) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        Self::Closure {
            parameters: parameters
                .into_iter()
                .enumerate()
                .map(|(position, parameter)| parameter.at(position))
                .collect(),
            body: Arc::new(body),
        }
    }
}

impl fmt::Debug for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method { type_id, method } => write!(f, "{type_id}@{method}"),
            Self::Closure { parameters, .. } => f
                .debug_struct("Closure")
                .field("parameters", parameters)
                .finish(),
        }
    }
}

impl Resolution<'_> {
    /// 解析参数并调用目标
    pub(crate) fn call(
        &mut self,
        target: &CallTarget,
        parameters: &Parameters,
    ) -> DependencyResult<Instance> {
        match target {
            CallTarget::Method { type_id, method } => {
                let concrete_id = self.concrete_type_of(type_id);
                let descriptor = self
                    .container()
                    .types
                    .describe(&concrete_id)
                    .or_else(|_| self.container().types.describe(type_id))?;
                let method_descriptor = descriptor.find_method(method).ok_or_else(|| {
                    DependencyError::MethodNotFound {
                        target: descriptor.id.clone(),
                        method: method.clone(),
                    }
                })?;
                let receiver = self.resolve(type_id, Parameters::new())?;
                let arguments = self.resolve_arguments(
                    &descriptor.id,
                    &method_descriptor.parameters,
                    parameters,
                )?;
                method_descriptor.invoke(receiver, arguments)
            }
            CallTarget::Closure {
                parameters: descriptors,
                body,
            } => {
                let arguments = self.resolve_arguments("Closure", descriptors, parameters)?;
                body(arguments)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_at_method() {
        let target = CallTarget::parse("ReportController@show").unwrap();

        assert!(matches!(
            target,
            CallTarget::Method { ref type_id, ref method }
                if type_id == "ReportController" && method == "show"
        ));
    }

    #[test]
    fn test_parse_rejects_missing_method() {
        for target in ["ReportController", "ReportController@", "@show"] {
            assert!(matches!(
                CallTarget::parse(target),
                Err(DependencyError::InvalidCallTarget { .. })
            ));
        }
    }

    #[test]
    fn test_closure_assigns_positions() {
        let target = CallTarget::closure(
            vec![ParameterDescriptor::new("a"), ParameterDescriptor::new("b")],
            |_| Ok(di_abstractions::into_instance(())),
        );

        match target {
            CallTarget::Closure { parameters, .. } => {
                assert_eq!(parameters[1].position, 1);
            }
            other => panic!("unexpected target: {other:?}"),
        }
    }
}
