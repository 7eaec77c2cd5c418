//! 类型擦除的实例句柄与字段注入槽

use crate::descriptor::CapabilityBinding;
use infrastructure_common::{DependencyError, TypeInfo};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除的共享实例
///
/// 以类型 `X` 为键保存的值总是一个 `Arc<X>`, 因此定长类型和 `dyn Trait`
/// 都可以用同一种方式取回。
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    /// 包装共享实例
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// 取回 `Arc<T>`, 类型不符时返回 `None`
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// 取回 `Arc<T>`, 类型不符时返回创建失败错误
    pub fn downcast_or_fail<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> Result<Arc<T>, DependencyError> {
        self.downcast::<T>().ok_or_else(|| {
            DependencyError::construction_failure(
                std::any::type_name::<T>(),
                format!("实例类型不匹配: 实际为 {}", self.type_name),
            )
        })
    }

    /// 被包装值的类型名称
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// 字段注入槽
///
/// 组件先以空槽构造并发布, 随后由容器写入依赖。每个槽只写入一次。
pub struct Autowired<T: ?Sized> {
    slot: OnceCell<Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Autowired<T> {
    /// 创建空槽
    pub fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// 用已解析的实例填充槽, 重复填充时保留首次写入的值
    pub fn fill(&self, instance: Instance) -> Result<(), DependencyError> {
        let value = instance.downcast_or_fail::<T>()?;
        let _ = self.slot.set(value);
        Ok(())
    }

    /// 获取已注入的依赖
    pub fn get(&self) -> Option<&Arc<T>> {
        self.slot.get()
    }

    /// 获取已注入的依赖, 未注入时返回构造失败错误
    ///
    /// 槽为空说明字段没有登记为注入点, 重试也不会填充它。
    pub fn try_get(&self) -> Result<&Arc<T>, DependencyError> {
        self.slot.get().ok_or_else(|| {
            DependencyError::construction_failure(std::any::type_name::<T>(), "依赖字段尚未注入")
        })
    }

    /// 是否已经注入
    pub fn is_filled(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for Autowired<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Autowired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("type", &std::any::type_name::<T>())
            .field("filled", &self.slot.get().is_some())
            .finish()
    }
}

/// 预先构建的实例
///
/// 在扫描之前放入实例仓库, 并按声明的能力（或自身）注册绑定。
#[derive(Clone)]
pub struct PrebuiltInstance {
    /// 实例的具体类型
    pub type_info: TypeInfo,
    /// 实例本身
    pub instance: Instance,
    /// 声明的能力绑定
    pub capabilities: Vec<CapabilityBinding>,
}

impl PrebuiltInstance {
    /// 包装一个已构建的实例
    pub fn new<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            instance: Instance::new(value),
            capabilities: Vec::new(),
        }
    }

    /// 声明实例满足的能力
    pub fn provides(mut self, binding: CapabilityBinding) -> Self {
        self.capabilities.push(binding);
        self
    }
}

impl fmt::Debug for PrebuiltInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrebuiltInstance")
            .field("type_info", &self.type_info)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
