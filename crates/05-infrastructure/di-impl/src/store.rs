//! 单例实例仓库

use di_abstractions::Instance;
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// 实例仓库
///
/// 以 (具体类型, 名称) 为键保存已实现的实例。同一类型的多个命名实例
/// 只会来自不同的工厂方法。
#[derive(Debug, Default)]
pub struct InstanceStore {
    records: HashMap<TypeInfo, BTreeMap<String, Instance>>,
}

impl InstanceStore {
    /// 创建空仓库
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存实例, 未指定名称时使用类型的规范名称
    ///
    /// 同名实例会被覆盖, 返回被覆盖的旧实例。
    pub fn put(
        &mut self,
        type_info: TypeInfo,
        instance: Instance,
        name: Option<&str>,
    ) -> Option<Instance> {
        let name = name.unwrap_or(type_info.canonical_name()).to_string();
        trace!("保存实例: {} [{}]", type_info.short_name(), name);
        self.records.entry(type_info).or_default().insert(name, instance)
    }

    /// 移除实例, 未指定名称时使用类型的规范名称
    pub fn remove(&mut self, type_info: &TypeInfo, name: Option<&str>) -> Option<Instance> {
        let name = name.unwrap_or(type_info.canonical_name());
        let records = self.records.get_mut(type_info)?;
        let removed = records.remove(name);
        if records.is_empty() {
            self.records.remove(type_info);
        }
        trace!("移除实例: {} [{}]", type_info.short_name(), name);
        removed
    }

    /// 是否存在该类型的任意实例
    pub fn contains(&self, type_info: &TypeInfo) -> bool {
        self.records
            .get(type_info)
            .is_some_and(|records| !records.is_empty())
    }

    /// 获取实例
    ///
    /// 该类型只有一个实例时直接返回它, 不比较名称; 有多个实例时必须精确匹配名称。
    pub fn get(&self, type_info: &TypeInfo, name: &str) -> DependencyResult<Instance> {
        let records = self
            .records
            .get(type_info)
            .filter(|records| !records.is_empty())
            .ok_or_else(|| DependencyError::missing_instance(type_info.name))?;

        if records.len() == 1 {
            if let Some(only) = records.values().next() {
                return Ok(only.clone());
            }
        }

        records
            .get(name)
            .cloned()
            .ok_or_else(|| DependencyError::Conflict {
                type_name: type_info.name.to_string(),
                name: name.to_string(),
                count: records.len(),
            })
    }

    /// 该类型的实例名称, 按名称排序
    pub fn names(&self, type_info: &TypeInfo) -> Vec<&str> {
        self.records
            .get(type_info)
            .map(|records| records.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// 实例记录总数
    pub fn len(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 拥有实例的类型数量
    pub fn type_count(&self) -> usize {
        self.records.len()
    }
}
