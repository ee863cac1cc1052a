//! 组件解析器抽象接口
//!
//! 提供依赖解析和循环检测的能力

use crate::arguments::Parameters;
use infrastructure_common::{
    downcast_instance, ContainerConfig, DependencyError, DependencyResult, Instance,
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// 解析句柄 trait
///
/// 工厂、扩展器和回调都通过它回到当前这次解析，
/// 从而共享同一个构建栈。
pub trait Resolve {
    /// 带覆盖参数解析
    fn make_with(&mut self, abstract_id: &str, parameters: Parameters) -> DependencyResult<Instance>;

    /// 尝试解析，目标无法构建时返回 `None`，循环依赖等错误仍然返回 `Err`
    fn try_make(&mut self, abstract_id: &str) -> DependencyResult<Option<Instance>>;

    /// 当前构建栈
    fn build_stack(&self) -> &[String];

    /// 解析
    fn make(&mut self, abstract_id: &str) -> DependencyResult<Instance> {
        self.make_with(abstract_id, Parameters::new())
    }
}

impl<'a> dyn Resolve + 'a {
    /// 解析并向下转型
    pub fn make_as<T>(&mut self, abstract_id: &str) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_instance(self.make(abstract_id)?, abstract_id)
    }
}

/// 构建栈
///
/// 每次顶层解析独享一个，不在线程之间共享。
#[derive(Debug, Clone, Default)]
pub struct BuildStack {
    frames: Vec<String>,
}

impl BuildStack {
    /// 创建空的构建栈
    pub fn new() -> Self {
        Self::default()
    }

    /// 入栈，同一标识第二次入栈即为循环依赖
    pub fn push(&mut self, abstract_id: &str) -> DependencyResult<()> {
        if self.contains(abstract_id) {
            return Err(self.cycle_error(abstract_id));
        }
        self.frames.push(abstract_id.to_string());
        Ok(())
    }

    /// 出栈
    pub fn pop(&mut self) -> Option<String> {
        self.frames.pop()
    }

    /// 是否已在栈中
    pub fn contains(&self, abstract_id: &str) -> bool {
        self.frames.iter().any(|frame| frame == abstract_id)
    }

    /// 栈顶，即当前正在构建的类型
    pub fn parent(&self) -> Option<&str> {
        self.frames.last().map(String::as_str)
    }

    /// 栈深度
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 栈内容
    pub fn as_slice(&self) -> &[String] {
        &self.frames
    }

    /// 从首次出现到重复标识的循环路径
    pub fn cycle_path(&self, abstract_id: &str) -> Vec<String> {
        let start = self
            .frames
            .iter()
            .position(|frame| frame == abstract_id)
            .unwrap_or(0);
        let mut path: Vec<String> = self.frames[start..].to_vec();
        path.push(abstract_id.to_string());
        path
    }

    /// 构造循环依赖错误
    pub fn cycle_error(&self, abstract_id: &str) -> DependencyError {
        DependencyError::CircularDependency {
            path: self.cycle_path(abstract_id),
        }
    }
}

/// 解析选项
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// 解析超时时间，`None` 表示不启用
    pub timeout: Option<Duration>,
}

impl From<&ContainerConfig> for ResolveOptions {
    fn from(config: &ContainerConfig) -> Self {
        Self {
            timeout: config.resolution_timeout(),
        }
    }
}
