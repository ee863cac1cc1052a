//! 容器实例值模型
//!
//! 容器中的所有实例都以 [`Instance`] 的形式流转，类型化访问通过向下转型完成。

use crate::errors::{DependencyError, DependencyResult};
use std::any::Any;
use std::sync::Arc;

/// 容器管理的实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 将任意值包装为实例
pub fn into_instance<T>(value: T) -> Instance
where
    T: Any + Send + Sync,
{
    Arc::new(value)
}

/// 将实例向下转型为具体类型
pub fn downcast_instance<T>(instance: Instance, target: &str) -> DependencyResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            target: target.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

/// 判断两个实例是否为同一对象
pub fn same_instance(left: &Instance, right: &Instance) -> bool {
    std::ptr::eq(
        Arc::as_ptr(left).cast::<()>(),
        Arc::as_ptr(right).cast::<()>(),
    )
}
