//! 实现绑定注册表
//!
//! 记录实现类型满足哪些能力类型, 并把能力请求解析为唯一的实现。

use di_abstractions::CapabilityBinding;
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use tracing::debug;

/// 类型注册表
///
/// 构建阶段填充, 之后只读。绑定按注册顺序保存。
#[derive(Debug, Default)]
pub struct TypeRegistry {
    bindings: Vec<CapabilityBinding>,
}

impl TypeRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册绑定, 同一 (实现, 能力) 对只记录一次
    ///
    /// 返回是否新增了绑定。
    pub fn register(&mut self, binding: CapabilityBinding) -> bool {
        let exists = self.bindings.iter().any(|known| {
            known.implementation == binding.implementation && known.capability == binding.capability
        });
        if exists {
            return false;
        }
        debug!(
            "注册绑定: {} -> {}",
            binding.implementation.short_name(),
            binding.capability.short_name()
        );
        self.bindings.push(binding);
        true
    }

    /// 能力类型的所有绑定
    pub fn bindings_for(&self, capability: &TypeInfo) -> Vec<&CapabilityBinding> {
        self.bindings
            .iter()
            .filter(|binding| binding.capability == *capability)
            .collect()
    }

    /// 把能力请求解析为唯一的绑定
    ///
    /// 只有一个绑定时忽略所有提示; 多个绑定时用限定符（为空则用字段名）
    /// 与实现类型的简短名称做大小写不敏感匹配。
    pub fn resolve(
        &self,
        capability: &TypeInfo,
        name_hint: Option<&str>,
        qualifier: Option<&str>,
    ) -> DependencyResult<&CapabilityBinding> {
        let candidates = self.bindings_for(capability);
        match candidates.as_slice() {
            [] => Err(DependencyError::missing_binding(capability.name)),
            [only] => Ok(*only),
            _ => {
                let key = qualifier
                    .filter(|qualifier| !qualifier.trim().is_empty())
                    .or(name_hint)
                    .map(str::to_lowercase);
                key.and_then(|key| {
                    candidates
                        .iter()
                        .copied()
                        .find(|binding| binding.implementation.short_name().to_lowercase() == key)
                })
                .ok_or_else(|| DependencyError::Ambiguous {
                    capability: capability.name.to_string(),
                    candidates: candidates.len(),
                })
            }
        }
    }

    /// 绑定数量
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
