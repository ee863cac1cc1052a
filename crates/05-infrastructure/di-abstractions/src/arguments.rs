//! 解析参数
//!
//! [`Parameters`] 是调用方传入的覆盖参数，[`Arguments`] 是解析完成后交给构造函数的实参。

use infrastructure_common::{
    downcast_instance, into_instance, DependencyError, DependencyResult, Instance,
    ParameterDescriptor,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// 覆盖参数的键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    /// 按参数名
    Name(String),
    /// 按参数位置
    Position(usize),
}

impl From<&str> for ParameterKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ParameterKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for ParameterKey {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

/// 调用方提供的覆盖参数
///
/// 带覆盖参数的解析不会命中也不会写入单例缓存。
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: HashMap<ParameterKey, Instance>,
}

impl Parameters {
    /// 创建空的覆盖参数
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加覆盖值
    pub fn with<T>(self, key: impl Into<ParameterKey>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.with_instance(key, into_instance(value))
    }

    /// 添加已有实例作为覆盖值
    pub fn with_instance(mut self, key: impl Into<ParameterKey>, value: Instance) -> Self {
        self.insert(key, value);
        self
    }

    /// 插入覆盖值
    pub fn insert(&mut self, key: impl Into<ParameterKey>, value: Instance) {
        self.values.insert(key.into(), value);
    }

    /// 查找参数对应的覆盖值，名称优先于位置
    pub fn lookup(&self, parameter: &ParameterDescriptor) -> Option<&Instance> {
        self.values
            .get(&ParameterKey::Name(parameter.name.clone()))
            .or_else(|| self.values.get(&ParameterKey::Position(parameter.position)))
    }

    /// 按键获取覆盖值
    pub fn get(&self, key: impl Into<ParameterKey>) -> Option<&Instance> {
        self.values.get(&key.into())
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 覆盖值数量
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// 传给构造函数的实参
#[derive(Debug, Clone)]
pub struct Arguments {
    declaring_type: String,
    values: Vec<(String, Option<Instance>)>,
}

impl Arguments {
    /// 创建空实参列表
    pub fn new(declaring_type: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            values: Vec::new(),
        }
    }

    /// 追加一个实参
    pub fn push(&mut self, name: impl Into<String>, value: Option<Instance>) {
        self.values.push((name.into(), value));
    }

    /// 所属类型
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// 获取可选实例
    pub fn optional_instance(&self, name: &str) -> Option<Instance> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == name)
            .and_then(|(_, value)| value.clone())
    }

    /// 获取必需实例
    pub fn instance(&self, name: &str) -> DependencyResult<Instance> {
        self.optional_instance(name)
            .ok_or_else(|| DependencyError::UnresolvableDependency {
                parameter: name.to_string(),
                declaring_type: self.declaring_type.clone(),
            })
    }

    /// 获取必需的共享引用
    pub fn get<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_instance(self.instance(name)?, name)
    }

    /// 获取可选的共享引用，类型不符仍然报错
    pub fn optional<T>(&self, name: &str) -> DependencyResult<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        self.optional_instance(name)
            .map(|instance| downcast_instance(instance, name))
            .transpose()
    }

    /// 获取必需的值（克隆）
    pub fn value<T>(&self, name: &str) -> DependencyResult<T>
    where
        T: Any + Send + Sync + Clone,
    {
        self.get::<T>(name).map(|value| T::clone(&value))
    }

    /// 获取可选的值（克隆）
    pub fn optional_value<T>(&self, name: &str) -> DependencyResult<Option<T>>
    where
        T: Any + Send + Sync + Clone,
    {
        Ok(self.optional::<T>(name)?.map(|value| T::clone(&value)))
    }

    /// 获取标签注入的实例列表，标签为空时为 `None`
    pub fn tagged(&self, name: &str) -> DependencyResult<Option<Vec<Instance>>> {
        self.optional_value::<Vec<Instance>>(name)
    }

    /// 实参数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有实参
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 遍历实参
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Instance>)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }
}
