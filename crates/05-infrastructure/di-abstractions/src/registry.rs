//! 绑定记录

use crate::factory::{factory, Factory};
use crate::resolver::Resolve;
use crate::arguments::Parameters;
use infrastructure_common::{DependencyResult, Instance, Lifetime};
use std::fmt;

/// 绑定的具体实现方式
#[derive(Clone)]
pub enum Concrete {
    /// 工厂函数
    Factory(Factory),
    /// 交给另一个类型标识自动装配
    Type(String),
    /// 绑定到自身，按抽象标识自动装配
    SelfBound,
}

impl Concrete {
    /// 使用工厂函数
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Resolve, &Parameters) -> DependencyResult<Instance>
            + Send
            + Sync
            + 'static,
    {
        Self::Factory(factory(f))
    }

    /// 使用具体类型
    pub fn of_type(type_id: impl Into<String>) -> Self {
        Self::Type(type_id.into())
    }

    /// 具体类型标识
    pub fn type_id(&self) -> Option<&str> {
        match self {
            Self::Type(type_id) => Some(type_id),
            _ => None,
        }
    }
}

impl From<&str> for Concrete {
    fn from(type_id: &str) -> Self {
        Self::Type(type_id.to_string())
    }
}

impl From<String> for Concrete {
    fn from(type_id: String) -> Self {
        Self::Type(type_id)
    }
}

impl From<Factory> for Concrete {
    fn from(factory: Factory) -> Self {
        Self::Factory(factory)
    }
}

impl fmt::Debug for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory(_) => f.write_str("Factory(<function>)"),
            Self::Type(type_id) => f.debug_tuple("Type").field(type_id).finish(),
            Self::SelfBound => f.write_str("SelfBound"),
        }
    }
}

/// 绑定记录
#[derive(Debug, Clone)]
pub struct BindingRecord {
    /// 抽象标识
    pub abstract_id: String,
    /// 具体实现
    pub concrete: Concrete,
    /// 生命周期
    pub lifetime: Lifetime,
}

impl BindingRecord {
    /// 创建新的绑定记录
    pub fn new(abstract_id: impl Into<String>, concrete: Concrete, lifetime: Lifetime) -> Self {
        Self {
            abstract_id: abstract_id.into(),
            concrete,
            lifetime,
        }
    }

    /// 是否共享
    pub fn is_shared(&self) -> bool {
        self.lifetime.is_shared()
    }
}
