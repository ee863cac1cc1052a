//! 标签注册表

use parking_lot::RwLock;
use std::collections::HashMap;

/// 标签注册表
///
/// 按登记顺序保存成员，同一标识在同一标签下只出现一次。
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: RwLock<HashMap<String, Vec<String>>>,
}

impl TagRegistry {
    /// 创建空的标签注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 给一组标识打标签
    pub fn tag(&self, tag: &str, abstract_ids: &[&str]) {
        let mut tags = self.tags.write();
        let members = tags.entry(tag.to_string()).or_default();
        for abstract_id in abstract_ids {
            if !members.iter().any(|member| member == abstract_id) {
                members.push((*abstract_id).to_string());
            }
        }
    }

    /// 标签成员，按登记顺序
    pub fn members(&self, tag: &str) -> Vec<String> {
        self.tags.read().get(tag).cloned().unwrap_or_default()
    }

    /// 标签是否存在
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.read().contains_key(tag)
    }

    /// 标签数量
    pub fn len(&self) -> usize {
        self.tags.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.tags.read().is_empty()
    }

    /// 清空
    pub fn clear(&self) {
        self.tags.write().clear();
    }
}
