//! 构造循环检测

use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::cell::RefCell;

/// 循环守卫
///
/// 记录正在构造的类型。守卫本身不加锁, 由容器的创建锁保证同一时刻只有
/// 一条构造链在使用它。
#[derive(Debug, Default)]
pub struct CycleGuard {
    in_progress: RefCell<Vec<TypeInfo>>,
}

impl CycleGuard {
    /// 创建空守卫
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始构造类型, 类型已在构造链中时返回循环依赖错误
    ///
    /// 返回的帧在析构时结束构造, 无论成功、出错还是 panic 展开。
    pub fn enter(&self, type_info: TypeInfo) -> DependencyResult<ConstructionFrame<'_>> {
        let mut in_progress = self.in_progress.borrow_mut();
        if in_progress.contains(&type_info) {
            let chain = in_progress
                .iter()
                .chain(std::iter::once(&type_info))
                .map(TypeInfo::short_name)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(DependencyError::CircularDependency {
                type_name: type_info.name.to_string(),
                chain,
            });
        }
        in_progress.push(type_info);
        Ok(ConstructionFrame {
            guard: self,
            type_info,
        })
    }

    fn leave(&self, type_info: &TypeInfo) {
        let mut in_progress = self.in_progress.borrow_mut();
        if let Some(index) = in_progress.iter().rposition(|known| known == type_info) {
            in_progress.remove(index);
        }
    }

    /// 类型是否正在构造
    pub fn is_in_progress(&self, type_info: &TypeInfo) -> bool {
        self.in_progress.borrow().contains(type_info)
    }

    /// 当前构造链
    pub fn in_progress(&self) -> Vec<TypeInfo> {
        self.in_progress.borrow().clone()
    }
}

/// 构造帧
#[must_use = "构造帧析构即结束构造"]
#[derive(Debug)]
pub struct ConstructionFrame<'g> {
    guard: &'g CycleGuard,
    type_info: TypeInfo,
}

impl Drop for ConstructionFrame<'_> {
    fn drop(&mut self) {
        self.guard.leave(&self.type_info);
    }
}
