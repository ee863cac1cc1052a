//! 工厂、扩展器与回调
//!
//! 所有闭包都接收 [`Resolve`] 句柄，而不是容器本身，
//! 这样在工厂内部发起的解析会落在同一个构建栈上。

use crate::arguments::Parameters;
use crate::resolver::Resolve;
use infrastructure_common::{DependencyResult, Instance};
use std::sync::Arc;

/// 工厂函数
pub type Factory =
    Arc<dyn Fn(&mut dyn Resolve, &Parameters) -> DependencyResult<Instance> + Send + Sync>;

/// 扩展器（装饰器），接收实例并返回可能被包装后的实例
pub type Extender =
    Arc<dyn Fn(Instance, &mut dyn Resolve) -> DependencyResult<Instance> + Send + Sync>;

/// 生命周期回调
pub type ResolvingCallback = Arc<dyn Fn(&Instance, &mut dyn Resolve) + Send + Sync>;

/// 包装工厂闭包
pub fn factory<F>(f: F) -> Factory
where
    F: Fn(&mut dyn Resolve, &Parameters) -> DependencyResult<Instance> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 包装扩展器闭包
pub fn extender<F>(f: F) -> Extender
where
    F: Fn(Instance, &mut dyn Resolve) -> DependencyResult<Instance> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 包装回调闭包
pub fn callback<F>(f: F) -> ResolvingCallback
where
    F: Fn(&Instance, &mut dyn Resolve) + Send + Sync + 'static,
{
    Arc::new(f)
}
