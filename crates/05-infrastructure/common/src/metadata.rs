//! 元数据定义
//!
//! 描述可自动装配类型的构造参数

use crate::instance::{into_instance, Instance};
use std::any::Any;

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 可直接构造的具体类型
    Concrete,
    /// 抽象类型
    Abstract,
    /// 接口
    Interface,
}

impl TypeKind {
    /// 是否为具体类型
    pub fn is_concrete(self) -> bool {
        matches!(self, Self::Concrete)
    }
}

/// 构造参数描述
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    /// 参数名称
    pub name: String,
    /// 参数位置
    pub position: usize,
    /// 声明的类型（类或接口提示），基础类型为 `None`
    pub declared_type: Option<String>,
    /// 是否可选
    pub is_optional: bool,
    /// 默认值
    pub default_value: Option<Instance>,
}

impl ParameterDescriptor {
    /// 创建新的参数描述
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: 0,
            declared_type: None,
            is_optional: false,
            default_value: None,
        }
    }

    /// 设置类型提示
    pub fn with_type(mut self, type_id: impl Into<String>) -> Self {
        self.declared_type = Some(type_id.into());
        self
    }

    /// 设置参数位置
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// 标记为可选
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// 设置默认值
    pub fn with_default<T>(self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.with_default_instance(into_instance(value))
    }

    /// 使用已有实例作为默认值
    pub fn with_default_instance(mut self, value: Instance) -> Self {
        self.default_value = Some(value);
        self.is_optional = true;
        self
    }

    /// 是否可以在解析失败时退回默认值
    pub fn has_fallback(&self) -> bool {
        self.is_optional || self.default_value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_marks_parameter_optional() {
        let parameter = ParameterDescriptor::new("retries").with_default(3_u32);

        assert!(parameter.is_optional);
        assert!(parameter.has_fallback());
        assert!(parameter.declared_type.is_none());
    }

    #[test]
    fn test_typed_parameter_without_fallback() {
        let parameter = ParameterDescriptor::new("mailer").with_type("Mailer").at(1);

        assert_eq!(parameter.declared_type.as_deref(), Some("Mailer"));
        assert_eq!(parameter.position, 1);
        assert!(!parameter.has_fallback());
    }
}
