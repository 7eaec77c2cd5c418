//! 依赖注入容器实现

use crate::orchestrator::{Orchestrator, OrchestratorOptions};
use crate::registry::TypeRegistry;
use crate::store::InstanceStore;
use di_abstractions::{
    CapabilityBinding, ComponentScanner, ContainerConfig, ContainerStats, DiContainer,
    InjectionPoint, Instance, PrebuiltInstance, ScanResult, ScanRoot,
};
use infrastructure_common::{
    ConfigError, DependencyError, InfrastructureError, InfrastructureResult, TypeInfo,
};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// IoC 容器
///
/// 构建完成后只读, 可以在线程间共享。
pub struct IocContainer {
    orchestrator: Arc<Orchestrator>,
    scanned: ScanResult,
}

impl IocContainer {
    /// 创建容器构建器
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// 扫描到的候选组件和工厂声明
    pub fn scanned(&self) -> &ScanResult {
        &self.scanned
    }

    /// 类型已保存的实例名称
    pub fn instance_names(&self, type_info: &TypeInfo) -> Vec<String> {
        self.orchestrator.instance_names(type_info)
    }
}

impl DiContainer for IocContainer {
    fn lookup_instance(&self, point: &InjectionPoint) -> InfrastructureResult<Instance> {
        self.orchestrator
            .lookup(point)
            .map_err(|source| InfrastructureError::Lookup { source })
    }

    fn resolve_instance(&self, point: &InjectionPoint) -> InfrastructureResult<Instance> {
        self.orchestrator
            .resolve_or_create(point)
            .map_err(|source| InfrastructureError::Lookup { source })
    }

    fn stats(&self) -> ContainerStats {
        self.orchestrator.stats()
    }
}

impl std::fmt::Debug for IocContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IocContainer")
            .field("stats", &self.orchestrator.stats())
            .finish()
    }
}

/// 容器句柄
///
/// 构建时容器以句柄形式保存到实例仓库, 组件可以注入 `Autowired<ContainerHandle>`
/// 并在运行时延迟查找。句柄只持有弱引用, 容器释放后所有查找都会失败。
///
/// 构造过程中只能调用 `lookup*`: `resolve*` 需要的创建锁此时已被持有。
#[derive(Clone)]
pub struct ContainerHandle {
    orchestrator: Weak<Orchestrator>,
}

impl ContainerHandle {
    fn orchestrator(&self) -> InfrastructureResult<Arc<Orchestrator>> {
        self.orchestrator
            .upgrade()
            .ok_or_else(|| InfrastructureError::Lookup {
                source: DependencyError::construction_failure(
                    std::any::type_name::<IocContainer>(),
                    "容器已经释放",
                ),
            })
    }

    /// 容器是否仍然存活
    pub fn is_alive(&self) -> bool {
        self.orchestrator.strong_count() > 0
    }
}

impl DiContainer for ContainerHandle {
    fn lookup_instance(&self, point: &InjectionPoint) -> InfrastructureResult<Instance> {
        self.orchestrator()?
            .lookup(point)
            .map_err(|source| InfrastructureError::Lookup { source })
    }

    fn resolve_instance(&self, point: &InjectionPoint) -> InfrastructureResult<Instance> {
        self.orchestrator()?
            .resolve_or_create(point)
            .map_err(|source| InfrastructureError::Lookup { source })
    }

    fn stats(&self) -> ContainerStats {
        self.orchestrator()
            .map(|orchestrator| orchestrator.stats())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// 容器构建器
#[derive(Default)]
pub struct ContainerBuilder {
    scanners: Vec<Arc<dyn ComponentScanner>>,
    prebuilt: Vec<PrebuiltInstance>,
    config: ContainerConfig,
}

impl ContainerBuilder {
    /// 创建构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加组件扫描器
    pub fn with_scanner(mut self, scanner: impl ComponentScanner + 'static) -> Self {
        self.scanners.push(Arc::new(scanner));
        self
    }

    /// 添加预先构建的实例
    pub fn with_instance(mut self, instance: PrebuiltInstance) -> Self {
        self.prebuilt.push(instance);
        self
    }

    /// 使用容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 以配置中的扫描包为根构建容器
    pub fn build_from_config(self) -> InfrastructureResult<IocContainer> {
        let root = self.config.scan_root().ok_or_else(|| {
            ConfigError::invalid_value("scan_packages", "未配置任何扫描包")
        })?;
        self.build(&root)
    }

    /// 扫描并实现所有组件
    ///
    /// 先保存预构建实例并注册全部绑定, 再运行工厂阶段和组件阶段。
    pub fn build(self, root: &ScanRoot) -> InfrastructureResult<IocContainer> {
        info!("开始构建容器, 扫描根: [{}]", root.package_list().join(", "));

        let mut registry = TypeRegistry::new();
        let mut store = InstanceStore::new();
        for prebuilt in self.prebuilt {
            debug!("保存预构建实例: {}", prebuilt.type_info.short_name());
            let bindings = if prebuilt.capabilities.is_empty() {
                vec![CapabilityBinding::self_binding(prebuilt.type_info)]
            } else {
                prebuilt.capabilities
            };
            for binding in bindings {
                registry.register(binding);
            }
            store.put(prebuilt.type_info, prebuilt.instance, None);
        }

        let mut scanned = ScanResult::default();
        let mut table = Vec::new();
        for scanner in &self.scanners {
            debug!("使用扫描器: {}", scanner.name());
            scanned.merge(scanner.scan_root(root)?);
            table.extend(scanner.component_table());
        }
        info!(
            "扫描完成: {} 个组件, {} 个工厂声明",
            scanned.components.len(),
            scanned.configurations.len()
        );

        for declaration in &scanned.configurations {
            for bean in &declaration.beans {
                registry.register(bean.binding());
            }
        }
        for component in &scanned.components {
            for binding in component.bindings() {
                registry.register(binding);
            }
        }

        let options = OrchestratorOptions {
            trace_resolution: self.config.trace_resolution,
            warn_on_stalled_factories: self.config.warn_on_stalled_factories,
        };
        let orchestrator = Arc::new_cyclic(|weak: &Weak<Orchestrator>| {
            let handle = ContainerHandle {
                orchestrator: weak.clone(),
            };
            store.put(
                TypeInfo::of::<ContainerHandle>(),
                Instance::new(Arc::new(handle)),
                None,
            );
            Orchestrator::new(
                registry,
                table.into_iter().chain(scanned.components.iter().cloned()),
                store,
                options,
            )
        });

        orchestrator
            .run_factory_pass(&scanned.configurations)
            .and_then(|()| orchestrator.run_component_pass(&scanned.components))
            .map_err(|source| InfrastructureError::Initialization { source })?;

        let stats = orchestrator.stats();
        info!(
            "容器构建完成: {} 个绑定, {} 个实例",
            stats.registered_bindings, stats.stored_instances
        );
        Ok(IocContainer {
            orchestrator,
            scanned,
        })
    }
}
