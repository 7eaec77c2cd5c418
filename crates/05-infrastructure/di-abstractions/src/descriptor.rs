//! 组件描述符
//!
//! 描述一个实现类型如何被构造与注入: 满足哪些能力、使用哪个构造函数、
//! 哪些字段和方法需要注入。容器只消费类型擦除后的 [`ComponentDescriptor`]。

use crate::factory::BeanMethod;
use crate::instance::{Autowired, Instance};
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::fmt;
use std::sync::Arc;

/// 注入目标的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// 具体实现类型
    Concrete,
    /// 能力类型（通常是 `dyn Trait`）, 需要经过绑定注册表选择实现
    Capability,
}

/// 注入点: 字段、构造参数或 setter 参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionPoint {
    /// 请求的类型
    pub target: TypeInfo,
    /// 请求种类
    pub kind: TargetKind,
    /// 名称提示（字段名）
    pub name_hint: Option<String>,
    /// 限定符
    pub qualifier: Option<String>,
}

impl InjectionPoint {
    /// 请求具体类型
    pub fn concrete<T: Send + Sync + 'static>() -> Self {
        Self {
            target: TypeInfo::of::<T>(),
            kind: TargetKind::Concrete,
            name_hint: None,
            qualifier: None,
        }
    }

    /// 请求能力类型
    pub fn capability<C: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            target: TypeInfo::of::<C>(),
            kind: TargetKind::Capability,
            name_hint: None,
            qualifier: None,
        }
    }

    /// 设置名称提示
    pub fn with_name_hint(mut self, hint: impl Into<String>) -> Self {
        self.name_hint = non_blank(hint.into());
        self
    }

    /// 设置限定符, 空白限定符视为未设置
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = non_blank(qualifier.into());
        self
    }

    /// 限定符
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// 名称提示
    pub fn name_hint(&self) -> Option<&str> {
        self.name_hint.as_deref()
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, " @{qualifier}")?;
        }
        Ok(())
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// 按声明顺序传给构造函数或 setter 的已解析参数
pub struct Arguments {
    owner: &'static str,
    values: std::vec::IntoIter<Instance>,
}

impl Arguments {
    /// 创建参数列表
    pub fn new(owner: &'static str, values: Vec<Instance>) -> Self {
        Self {
            owner,
            values: values.into_iter(),
        }
    }

    /// 取出下一个参数
    pub fn next<X: ?Sized + Send + Sync + 'static>(&mut self) -> DependencyResult<Arc<X>> {
        let value = self.values.next().ok_or_else(|| {
            DependencyError::construction_failure(
                self.owner,
                format!("参数数量不足, 缺少 {}", std::any::type_name::<X>()),
            )
        })?;
        value.downcast_or_fail::<X>()
    }

    /// 剩余参数数量
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// 构造函数
pub enum Constructor<T> {
    /// 注入式构造函数, 参数按顺序解析后传入
    Injected {
        params: Vec<InjectionPoint>,
        build: fn(Arguments) -> DependencyResult<T>,
    },
    /// 无参构造函数
    NoArgs(fn() -> T),
    /// 没有可用的构造函数
    Missing,
}

impl<T: Default> Constructor<T> {
    /// 使用 `Default::default` 作为无参构造函数
    pub fn from_default() -> Self {
        Self::NoArgs(T::default)
    }
}

type AssignFn<T> = Box<dyn Fn(&T, Instance) -> DependencyResult<()> + Send + Sync>;
type InvokeFn<T> = Box<dyn Fn(&T, Arguments) -> DependencyResult<()> + Send + Sync>;

/// 字段注入
pub struct FieldInjection<T> {
    /// 字段名
    pub name: &'static str,
    /// 注入点, 名称提示默认为字段名
    pub point: InjectionPoint,
    assign: AssignFn<T>,
}

impl<T: 'static> FieldInjection<T> {
    /// 使用自定义赋值函数创建字段注入
    pub fn new(
        name: &'static str,
        point: InjectionPoint,
        assign: impl Fn(&T, Instance) -> DependencyResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            point: point.with_name_hint(name),
            assign: Box::new(assign),
        }
    }

    /// 注入具体类型到 [`Autowired`] 槽
    pub fn concrete<X: Send + Sync + 'static>(
        name: &'static str,
        slot: fn(&T) -> &Autowired<X>,
    ) -> Self {
        Self::new(
            name,
            InjectionPoint::concrete::<X>(),
            move |target: &T, value: Instance| slot(target).fill(value),
        )
    }

    /// 注入能力类型到 [`Autowired`] 槽
    pub fn capability<X: ?Sized + Send + Sync + 'static>(
        name: &'static str,
        slot: fn(&T) -> &Autowired<X>,
    ) -> Self {
        Self::new(
            name,
            InjectionPoint::capability::<X>(),
            move |target: &T, value: Instance| slot(target).fill(value),
        )
    }

    /// 设置限定符
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.point = self.point.with_qualifier(qualifier);
        self
    }
}

/// setter 方法注入
pub struct SetterInjection<T> {
    /// 方法名
    pub name: &'static str,
    /// 参数注入点
    pub params: Vec<InjectionPoint>,
    invoke: InvokeFn<T>,
}

impl<T: 'static> SetterInjection<T> {
    /// 创建 setter 注入
    pub fn new(
        name: &'static str,
        params: Vec<InjectionPoint>,
        invoke: impl Fn(&T, Arguments) -> DependencyResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            params,
            invoke: Box::new(invoke),
        }
    }
}

type CastFn = Arc<dyn Fn(&Instance) -> DependencyResult<Instance> + Send + Sync>;

/// 能力绑定: 实现类型 → 能力类型
///
/// 绑定携带向上转换函数, 把 `Arc<Impl>` 转为 `Arc<dyn Capability>`。
#[derive(Clone)]
pub struct CapabilityBinding {
    /// 实现类型
    pub implementation: TypeInfo,
    /// 能力类型
    pub capability: TypeInfo,
    cast: CastFn,
}

impl CapabilityBinding {
    /// 创建实现到能力的绑定
    pub fn new<I, C>(upcast: fn(Arc<I>) -> Arc<C>) -> Self
    where
        I: Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
    {
        Self {
            implementation: TypeInfo::of::<I>(),
            capability: TypeInfo::of::<C>(),
            cast: Arc::new(move |instance: &Instance| {
                let concrete = instance.downcast_or_fail::<I>()?;
                Ok(Instance::new(upcast(concrete)))
            }),
        }
    }

    /// 类型满足自身的绑定
    pub fn identity<T: ?Sized + 'static>() -> Self {
        Self::self_binding(TypeInfo::of::<T>())
    }

    /// 按类型信息创建自绑定
    pub fn self_binding(type_info: TypeInfo) -> Self {
        Self {
            implementation: type_info,
            capability: type_info,
            cast: Arc::new(|instance: &Instance| Ok(instance.clone())),
        }
    }

    /// 是否为自绑定
    pub fn is_self_binding(&self) -> bool {
        self.implementation == self.capability
    }

    /// 把实现实例转换为能力实例
    pub fn cast(&self, instance: &Instance) -> DependencyResult<Instance> {
        (self.cast)(instance)
    }
}

impl fmt::Debug for CapabilityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityBinding")
            .field("implementation", &self.implementation.name)
            .field("capability", &self.capability.name)
            .finish()
    }
}

/// 组件 trait
///
/// 由 `#[derive(Component)]` 生成, 也可以手写。
pub trait Component: Send + Sync + Sized + 'static {
    /// 满足的能力, 为空时只绑定自身
    fn capabilities() -> Vec<CapabilityBinding> {
        Vec::new()
    }

    /// 构造函数
    fn constructor() -> Constructor<Self>;

    /// 需要注入的字段
    fn fields() -> Vec<FieldInjection<Self>> {
        Vec::new()
    }

    /// 需要注入的 setter 方法
    fn setters() -> Vec<SetterInjection<Self>> {
        Vec::new()
    }

    /// 类型擦除后的描述符
    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::of::<Self>()
    }
}

/// 注入方法表
///
/// 由 `#[injectable]` 从 impl 块生成, 为组件提供构造函数和 setter,
/// 为工厂声明提供工厂方法。
pub trait InjectionMethods: Sized + 'static {
    /// 构造函数
    fn constructor() -> Constructor<Self>;

    /// setter 方法
    fn setters() -> Vec<SetterInjection<Self>> {
        Vec::new()
    }

    /// 工厂方法
    fn beans() -> Vec<BeanMethod<Self>> {
        Vec::new()
    }
}

type ErasedBuild = Box<dyn Fn(Arguments) -> DependencyResult<Instance> + Send + Sync>;
type ErasedNew = Box<dyn Fn() -> Instance + Send + Sync>;

/// 类型擦除的构造函数
pub enum ErasedConstructor {
    /// 注入式构造函数
    Injected {
        params: Vec<InjectionPoint>,
        build: ErasedBuild,
    },
    /// 无参构造函数
    NoArgs(ErasedNew),
    /// 没有可用的构造函数
    Missing,
}

impl ErasedConstructor {
    fn erase<T: Send + Sync + 'static>(constructor: Constructor<T>) -> Self {
        match constructor {
            Constructor::Injected { params, build } => Self::Injected {
                params,
                build: Box::new(move |args| build(args).map(|value| Instance::new(Arc::new(value)))),
            },
            Constructor::NoArgs(make) => Self::NoArgs(Box::new(move || Instance::new(Arc::new(make())))),
            Constructor::Missing => Self::Missing,
        }
    }
}

/// 类型擦除的字段注入
pub struct ErasedField {
    /// 字段名
    pub name: &'static str,
    /// 注入点
    pub point: InjectionPoint,
    assign: Box<dyn Fn(&Instance, Instance) -> DependencyResult<()> + Send + Sync>,
}

impl ErasedField {
    pub(crate) fn erase<T: Send + Sync + 'static>(field: FieldInjection<T>) -> Self {
        let FieldInjection { name, point, assign } = field;
        Self {
            name,
            point,
            assign: Box::new(move |target: &Instance, value: Instance| {
                let target = target.downcast_or_fail::<T>()?;
                assign(&*target, value)
            }),
        }
    }

    /// 把依赖写入目标实例的字段
    pub fn assign(&self, target: &Instance, value: Instance) -> DependencyResult<()> {
        (self.assign)(target, value)
    }
}

/// 类型擦除的 setter 注入
pub struct ErasedSetter {
    /// 方法名
    pub name: &'static str,
    /// 参数注入点
    pub params: Vec<InjectionPoint>,
    invoke: Box<dyn Fn(&Instance, Arguments) -> DependencyResult<()> + Send + Sync>,
}

impl ErasedSetter {
    fn erase<T: Send + Sync + 'static>(setter: SetterInjection<T>) -> Self {
        let SetterInjection {
            name,
            params,
            invoke,
        } = setter;
        Self {
            name,
            params,
            invoke: Box::new(move |target: &Instance, args: Arguments| {
                let target = target.downcast_or_fail::<T>()?;
                invoke(&*target, args)
            }),
        }
    }

    /// 调用 setter
    pub fn invoke(&self, target: &Instance, args: Arguments) -> DependencyResult<()> {
        (self.invoke)(target, args)
    }
}

/// 组件描述符
pub struct ComponentDescriptor {
    /// 实现类型
    pub type_info: TypeInfo,
    /// 能力绑定, 为空表示自绑定
    pub capabilities: Vec<CapabilityBinding>,
    /// 构造函数
    pub constructor: ErasedConstructor,
    /// 字段注入
    pub fields: Vec<ErasedField>,
    /// setter 注入
    pub setters: Vec<ErasedSetter>,
}

impl ComponentDescriptor {
    /// 从组件类型生成描述符
    pub fn of<T: Component>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            capabilities: T::capabilities(),
            constructor: ErasedConstructor::erase(T::constructor()),
            fields: T::fields().into_iter().map(ErasedField::erase).collect(),
            setters: T::setters().into_iter().map(ErasedSetter::erase).collect(),
        }
    }

    /// 注册表中使用的绑定, 未声明能力时返回自绑定
    pub fn bindings(&self) -> Vec<CapabilityBinding> {
        if self.capabilities.is_empty() {
            vec![CapabilityBinding::self_binding(self.type_info)]
        } else {
            self.capabilities.clone()
        }
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let constructor = match &self.constructor {
            ErasedConstructor::Injected { params, .. } => format!("injected({})", params.len()),
            ErasedConstructor::NoArgs(_) => "no-args".to_string(),
            ErasedConstructor::Missing => "missing".to_string(),
        };
        f.debug_struct("ComponentDescriptor")
            .field("type_info", &self.type_info.name)
            .field("capabilities", &self.capabilities)
            .field("constructor", &constructor)
            .field("fields", &self.fields.iter().map(|field| field.name).collect::<Vec<_>>())
            .field("setters", &self.setters.iter().map(|setter| setter.name).collect::<Vec<_>>())
            .finish()
    }
}
