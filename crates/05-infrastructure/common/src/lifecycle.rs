//! 组件生命周期

use serde::{Deserialize, Serialize};

/// 绑定的生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// 单例模式 - 首次解析后缓存，后续解析返回同一实例
    Singleton,
    /// 作用域模式 - 在作用域内共享，作用域结束时统一遗忘
    Scoped,
    /// 瞬时模式 - 每次请求都创建新实例
    Transient,
}

impl Lifetime {
    /// 解析结果是否需要缓存
    pub fn is_shared(self) -> bool {
        matches!(self, Self::Singleton | Self::Scoped)
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::Transient
    }
}
