//! 上下文绑定

use crate::factory::Factory;
use infrastructure_common::Instance;
use std::fmt;

/// 上下文绑定提供的实现
#[derive(Clone)]
pub enum ContextualImplementation {
    /// 解析另一个类型标识
    Type(String),
    /// 调用工厂
    Factory(Factory),
    /// 直接使用给定值
    Value(Instance),
    /// 注入标签下的全部实例，标签为空时注入 `None`
    Tagged(String),
}

impl fmt::Debug for ContextualImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(type_id) => f.debug_tuple("Type").field(type_id).finish(),
            Self::Factory(_) => f.write_str("Factory(<function>)"),
            Self::Value(_) => f.write_str("Value(<instance>)"),
            Self::Tagged(tag) => f.debug_tuple("Tagged").field(tag).finish(),
        }
    }
}

/// 基础类型参数在上下文绑定中的键，形如 `$name`
pub fn primitive_key(parameter: &str) -> String {
    format!("${parameter}")
}
