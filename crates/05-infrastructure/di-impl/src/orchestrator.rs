//! 实例化编排
//!
//! 编排器驱动两个阶段: 先用可重试队列实现所有工厂声明, 再按发现顺序
//! 递归实现普通组件。每条依赖边都经过注册表、实例仓库和循环守卫。

use crate::cycle_guard::CycleGuard;
use crate::registry::TypeRegistry;
use crate::store::InstanceStore;
use di_abstractions::{
    Arguments, ComponentDescriptor, ContainerStats, ErasedConstructor, FactoryDeclaration,
    InjectionPoint, Instance, TargetKind,
};
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 编排选项
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    /// 以 debug 级别记录每一次依赖解析
    pub trace_resolution: bool,
    /// 工厂队列整轮没有进展时输出警告
    pub warn_on_stalled_factories: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            trace_resolution: false,
            warn_on_stalled_factories: true,
        }
    }
}

/// 解析模式
#[derive(Clone, Copy)]
enum Mode<'g> {
    /// 只查找已实现的实例
    Lookup,
    /// 缺失时构造, 持有创建锁中的循环守卫
    Create(&'g CycleGuard),
}

/// 实例化编排器
pub struct Orchestrator {
    registry: TypeRegistry,
    descriptors: HashMap<TypeInfo, Arc<ComponentDescriptor>>,
    store: RwLock<InstanceStore>,
    creation: Mutex<CycleGuard>,
    options: OrchestratorOptions,
    factory_rounds: AtomicUsize,
    realized: AtomicUsize,
}

impl Orchestrator {
    /// 创建编排器
    ///
    /// `descriptors` 是可按需构造的组件表; 注册表在此之后不再变化。
    pub fn new(
        registry: TypeRegistry,
        descriptors: impl IntoIterator<Item = Arc<ComponentDescriptor>>,
        store: InstanceStore,
        options: OrchestratorOptions,
    ) -> Self {
        let descriptors = descriptors
            .into_iter()
            .map(|descriptor| (descriptor.type_info, descriptor))
            .collect();
        Self {
            registry,
            descriptors,
            store: RwLock::new(store),
            creation: Mutex::new(CycleGuard::new()),
            options,
            factory_rounds: AtomicUsize::new(0),
            realized: AtomicUsize::new(0),
        }
    }

    /// 工厂阶段
    ///
    /// 字段依赖缺少实例时把工厂声明放回队尾; 其他错误立即失败。
    /// 队列只在清空时结束, 工厂之间的真正相互依赖会一直循环。
    pub fn run_factory_pass(&self, declarations: &[Arc<FactoryDeclaration>]) -> DependencyResult<()> {
        info!("开始处理工厂声明: {} 个", declarations.len());
        let mut queue: VecDeque<Arc<FactoryDeclaration>> = declarations.iter().cloned().collect();
        let mut requeued_without_progress = 0usize;

        while let Some(declaration) = queue.pop_front() {
            self.factory_rounds.fetch_add(1, Ordering::Relaxed);
            match self.realize_factory(&declaration) {
                Ok(()) => requeued_without_progress = 0,
                Err(err) if err.is_retryable() => {
                    debug!(
                        "工厂 {} 的依赖尚未就绪, 重新入队: {}",
                        declaration.type_info.short_name(),
                        err
                    );
                    queue.push_back(declaration);
                    requeued_without_progress += 1;
                    if self.options.warn_on_stalled_factories
                        && requeued_without_progress % queue.len() == 0
                    {
                        let pending = queue
                            .iter()
                            .map(|declaration| declaration.type_info.short_name())
                            .collect::<Vec<_>>()
                            .join(", ");
                        warn!(
                            "工厂队列整轮没有进展, 可能存在相互依赖的工厂声明: [{}]",
                            pending
                        );
                    }
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            "工厂声明处理完成, 共出队 {} 次",
            self.factory_rounds.load(Ordering::Relaxed)
        );
        Ok(())
    }

    fn realize_factory(&self, declaration: &FactoryDeclaration) -> DependencyResult<()> {
        let factory = declaration.instantiate();
        for field in &declaration.fields {
            let value = self.resolve_with(&field.point, Mode::Lookup)?;
            field.assign(&factory, value)?;
        }
        for bean in &declaration.beans {
            // 只有字段解析能触发重试, 工厂方法已经运行过的声明不能重新入队
            let instance = bean.produce(&factory).map_err(|err| {
                if err.is_retryable() {
                    DependencyError::construction_failure(
                        declaration.type_info.name,
                        format!("工厂方法 {} 失败: {}", bean.method, err),
                    )
                } else {
                    err
                }
            })?;
            debug!(
                "工厂方法 {}::{} 产出实例: {}",
                declaration.type_info.short_name(),
                bean.method,
                bean.instance_name()
            );
            self.store
                .write()
                .put(bean.returns, instance, Some(bean.instance_name()));
        }
        Ok(())
    }

    /// 普通组件阶段, 按发现顺序实现每个候选组件
    pub fn run_component_pass(&self, components: &[Arc<ComponentDescriptor>]) -> DependencyResult<()> {
        info!("开始实例化组件: {} 个", components.len());
        let guard = self.creation.lock();
        for component in components {
            self.realize(component.type_info, None, Mode::Create(&guard))?;
        }
        info!(
            "组件实例化完成, 共构造 {} 个",
            self.realized.load(Ordering::Relaxed)
        );
        Ok(())
    }

    /// 查找已实现的实例, 不会构造
    pub fn lookup(&self, point: &InjectionPoint) -> DependencyResult<Instance> {
        self.resolve_with(point, Mode::Lookup)
    }

    /// 查找实例, 缺失时在创建锁内构造
    ///
    /// 并发请求同一个缺失类型时只有一个线程构造, 其余线程在锁内查到同一个实例。
    pub fn resolve_or_create(&self, point: &InjectionPoint) -> DependencyResult<Instance> {
        match self.resolve_with(point, Mode::Lookup) {
            Err(err) if err.is_retryable() => {
                let guard = self.creation.lock();
                self.resolve_with(point, Mode::Create(&guard))
            }
            other => other,
        }
    }

    fn resolve_with(&self, point: &InjectionPoint, mode: Mode<'_>) -> DependencyResult<Instance> {
        if self.options.trace_resolution {
            debug!("解析依赖: {}", point);
        }
        match point.kind {
            TargetKind::Concrete => self.realize(point.target, point.qualifier(), mode),
            TargetKind::Capability => {
                let binding =
                    self.registry
                        .resolve(&point.target, point.name_hint(), point.qualifier())?;
                let instance = self.realize(binding.implementation, point.qualifier(), mode)?;
                binding.cast(&instance)
            }
        }
    }

    fn realize(
        &self,
        concrete: TypeInfo,
        qualifier: Option<&str>,
        mode: Mode<'_>,
    ) -> DependencyResult<Instance> {
        if let Some(instance) = self.stored(concrete, qualifier)? {
            return Ok(instance);
        }
        match mode {
            Mode::Lookup => Err(DependencyError::missing_instance(concrete.name)),
            Mode::Create(guard) => self.construct(concrete, guard),
        }
    }

    fn stored(&self, concrete: TypeInfo, qualifier: Option<&str>) -> DependencyResult<Option<Instance>> {
        let store = self.store.read();
        if !store.contains(&concrete) {
            return Ok(None);
        }
        let name = qualifier.unwrap_or(concrete.canonical_name());
        store.get(&concrete, name).map(Some)
    }

    fn construct(&self, concrete: TypeInfo, guard: &CycleGuard) -> DependencyResult<Instance> {
        let _frame = guard.enter(concrete)?;
        let descriptor = self
            .descriptors
            .get(&concrete)
            .cloned()
            .ok_or_else(|| no_usable_constructor(concrete))?;
        debug!("构造组件: {}", concrete.short_name());

        let instance = match &descriptor.constructor {
            ErasedConstructor::Injected { params, build } => {
                let args = self.resolve_all(params, guard)?;
                build(Arguments::new(concrete.name, args))?
            }
            ErasedConstructor::NoArgs(make) => make(),
            ErasedConstructor::Missing => return Err(no_usable_constructor(concrete)),
        };

        // 先发布再注入, 只经过字段或 setter 的循环才能解开
        self.store.write().put(concrete, instance.clone(), None);
        if let Err(err) = self.inject(concrete, &descriptor, &instance, guard) {
            self.store.write().remove(&concrete, None);
            debug!("注入失败, 撤回已发布的实例: {}", concrete.short_name());
            return Err(err);
        }

        self.realized.fetch_add(1, Ordering::Relaxed);
        Ok(instance)
    }

    fn inject(
        &self,
        concrete: TypeInfo,
        descriptor: &ComponentDescriptor,
        instance: &Instance,
        guard: &CycleGuard,
    ) -> DependencyResult<()> {
        for field in &descriptor.fields {
            let value = self.resolve_with(&field.point, Mode::Create(guard))?;
            field.assign(instance, value)?;
        }
        for setter in &descriptor.setters {
            let args = self.resolve_all(&setter.params, guard)?;
            setter.invoke(instance, Arguments::new(concrete.name, args))?;
        }
        Ok(())
    }

    fn resolve_all(
        &self,
        params: &[InjectionPoint],
        guard: &CycleGuard,
    ) -> DependencyResult<Vec<Instance>> {
        params
            .iter()
            .map(|param| self.resolve_with(param, Mode::Create(guard)))
            .collect()
    }

    /// 统计信息
    pub fn stats(&self) -> ContainerStats {
        let store = self.store.read();
        ContainerStats {
            registered_bindings: self.registry.len(),
            stored_instances: store.len(),
            stored_types: store.type_count(),
            factory_rounds: self.factory_rounds.load(Ordering::Relaxed),
            realized_components: self.realized.load(Ordering::Relaxed),
        }
    }

    /// 类型的实例名称
    pub fn instance_names(&self, type_info: &TypeInfo) -> Vec<String> {
        self.store
            .read()
            .names(type_info)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

fn no_usable_constructor(concrete: TypeInfo) -> DependencyError {
    DependencyError::construction_failure(
        concrete.name,
        "没有可用的构造函数: 既没有注入式构造函数也没有无参构造函数",
    )
}
