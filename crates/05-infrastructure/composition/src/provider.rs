//! 服务提供者

use di_impl::Container;
use infrastructure_common::DependencyResult;

/// 服务提供者 trait
///
/// 构建容器时先依次调用所有提供者的 `register`，再依次调用 `boot`。
/// `boot` 阶段可以安全地解析其他提供者注册的服务。
pub trait ServiceProvider: Send + Sync {
    /// 提供者名称
    fn name(&self) -> &str;

    /// 注册绑定
    fn register(&self, container: &Container) -> DependencyResult<()>;

    /// 启动
    fn boot(&self, _container: &Container) -> DependencyResult<()> {
        Ok(())
    }
}
