//! 工厂声明
//!
//! 工厂声明是一个带无参构造函数的类型, 可以有注入字段, 并通过工厂方法
//! 产出命名实例。所有工厂声明在普通组件之前实现。

use crate::descriptor::{CapabilityBinding, ErasedField, FieldInjection};
use crate::instance::Instance;
use infrastructure_common::{DependencyResult, TypeInfo};
use std::fmt;
use std::sync::Arc;

type ProduceFn<T> = Box<dyn Fn(&T) -> DependencyResult<Instance> + Send + Sync>;

/// 工厂方法
pub struct BeanMethod<T> {
    /// 方法名
    pub method: &'static str,
    /// 显式实例名
    pub name: Option<String>,
    /// 声明的返回类型, 产出的实例以此为键保存
    pub returns: TypeInfo,
    produce: ProduceFn<T>,
}

impl<T: 'static> BeanMethod<T> {
    /// 创建工厂方法
    pub fn new<R: ?Sized + Send + Sync + 'static>(
        method: &'static str,
        produce: fn(&T) -> Arc<R>,
    ) -> Self {
        Self {
            method,
            name: None,
            returns: TypeInfo::of::<R>(),
            produce: Box::new(move |factory: &T| Ok(Instance::new(produce(factory)))),
        }
    }

    /// 创建可能失败的工厂方法
    pub fn fallible<R: ?Sized + Send + Sync + 'static>(
        method: &'static str,
        produce: fn(&T) -> DependencyResult<Arc<R>>,
    ) -> Self {
        Self {
            method,
            name: None,
            returns: TypeInfo::of::<R>(),
            produce: Box::new(move |factory: &T| produce(factory).map(Instance::new)),
        }
    }

    /// 设置实例名, 空白名称视为未设置
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() { None } else { Some(name) };
        self
    }
}

/// 类型擦除的工厂方法
pub struct ErasedBean {
    /// 方法名
    pub method: &'static str,
    /// 显式实例名
    pub name: Option<String>,
    /// 声明的返回类型
    pub returns: TypeInfo,
    produce: Box<dyn Fn(&Instance) -> DependencyResult<Instance> + Send + Sync>,
}

impl ErasedBean {
    fn erase<T: Send + Sync + 'static>(bean: BeanMethod<T>) -> Self {
        let BeanMethod {
            method,
            name,
            returns,
            produce,
        } = bean;
        Self {
            method,
            name,
            returns,
            produce: Box::new(move |factory: &Instance| {
                let factory = factory.downcast_or_fail::<T>()?;
                produce(&*factory)
            }),
        }
    }

    /// 实例名: 显式名称或返回类型的规范名称
    pub fn instance_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.returns.canonical_name())
    }

    /// 返回类型的自绑定
    pub fn binding(&self) -> CapabilityBinding {
        CapabilityBinding::self_binding(self.returns)
    }

    /// 调用工厂方法
    pub fn produce(&self, factory: &Instance) -> DependencyResult<Instance> {
        (self.produce)(factory)
    }
}

/// 工厂声明 trait
///
/// 由 `#[derive(Configuration)]` 生成, 也可以手写。
pub trait Configuration: Default + Send + Sync + 'static {
    /// 需要注入的字段, 解析时不会创建新实例
    fn fields() -> Vec<FieldInjection<Self>> {
        Vec::new()
    }

    /// 工厂方法
    fn beans() -> Vec<BeanMethod<Self>>;

    /// 类型擦除后的工厂声明
    fn declaration() -> FactoryDeclaration {
        FactoryDeclaration::of::<Self>()
    }
}

/// 类型擦除的工厂声明
pub struct FactoryDeclaration {
    /// 工厂类型
    pub type_info: TypeInfo,
    /// 注入字段
    pub fields: Vec<ErasedField>,
    /// 工厂方法
    pub beans: Vec<ErasedBean>,
    instantiate: Box<dyn Fn() -> Instance + Send + Sync>,
}

impl FactoryDeclaration {
    /// 从工厂类型生成声明
    pub fn of<T: Configuration>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            fields: T::fields().into_iter().map(ErasedField::erase).collect(),
            beans: T::beans().into_iter().map(ErasedBean::erase).collect(),
            instantiate: Box::new(|| Instance::new(Arc::new(T::default()))),
        }
    }

    /// 使用无参构造函数创建工厂实例
    pub fn instantiate(&self) -> Instance {
        (self.instantiate)()
    }
}

impl fmt::Debug for FactoryDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryDeclaration")
            .field("type_info", &self.type_info.name)
            .field("fields", &self.fields.iter().map(|field| field.name).collect::<Vec<_>>())
            .field("beans", &self.beans.iter().map(|bean| bean.method).collect::<Vec<_>>())
            .finish()
    }
}
