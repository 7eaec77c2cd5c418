//! 组件解析引擎的集成测试
//!
//! 每个模块是一个可扫描的包, 组件描述符全部手写。

use di_abstractions::{
    Arguments, Autowired, BeanMethod, CapabilityBinding, Component, Configuration, Constructor,
    ContainerConfig, DiContainer, FieldInjection, InjectionPoint, ScanRoot, SetterInjection,
};
use di_impl::{ComponentCatalog, IocContainer};
use infrastructure_common::{init_logging, DependencyError, InfrastructureError, LoggingConfig, TypeInfo};
use std::sync::Arc;

fn init() {
    let _ = init_logging(&LoggingConfig::development().with_level("debug"));
}

fn package(name: &str) -> String {
    format!("{}::{}", module_path!(), name)
}

fn build(catalog: ComponentCatalog, packages: &[&str]) -> Result<IocContainer, InfrastructureError> {
    init();
    IocContainer::builder()
        .with_scanner(catalog)
        .build(&ScanRoot::packages(packages.iter().map(|name| package(name))))
}

mod single {
    use super::*;

    #[derive(Default)]
    pub struct TestComponent;

    impl TestComponent {
        pub fn name(&self) -> &'static str {
            "Test"
        }
    }

    impl Component for TestComponent {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }
    }
}

mod multiple {
    use super::*;

    pub trait Engine: Send + Sync {
        fn name(&self) -> String;
    }

    #[derive(Default)]
    pub struct BrowserRenderer;

    impl BrowserRenderer {
        pub fn render(&self, text: &str) -> String {
            text.to_string()
        }
    }

    impl Component for BrowserRenderer {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }
    }

    pub struct V8Engine {
        circular_dependency: Arc<CircularDependency>,
    }

    impl Engine for V8Engine {
        fn name(&self) -> String {
            format!("V8 and {}", self.circular_dependency.name())
        }
    }

    impl Component for V8Engine {
        fn capabilities() -> Vec<CapabilityBinding> {
            vec![CapabilityBinding::new::<V8Engine, dyn Engine>(|engine| engine)]
        }

        fn constructor() -> Constructor<Self> {
            Constructor::Injected {
                params: vec![InjectionPoint::concrete::<CircularDependency>()],
                build: |mut args| {
                    Ok(V8Engine {
                        circular_dependency: args.next()?,
                    })
                },
            }
        }
    }

    #[derive(Default)]
    pub struct CircularDependency {
        v8_engine: Autowired<V8Engine>,
    }

    impl CircularDependency {
        pub fn name(&self) -> String {
            let engine = self
                .v8_engine
                .get()
                .map_or("None", |_| TypeInfo::of::<V8Engine>().short_name());
            format!("CircularDependencyOf{engine}")
        }
    }

    impl Component for CircularDependency {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }

        fn fields() -> Vec<FieldInjection<Self>> {
            vec![FieldInjection::concrete("v8_engine", |component: &CircularDependency| {
                &component.v8_engine
            })]
        }
    }

    pub struct Browser {
        engine: Arc<dyn Engine>,
        renderer: Arc<BrowserRenderer>,
    }

    impl Browser {
        pub fn run(&self) -> String {
            self.renderer
                .render(&format!("This browser run on {}", self.engine.name()))
        }
    }

    impl Component for Browser {
        fn constructor() -> Constructor<Self> {
            Constructor::Injected {
                params: vec![
                    InjectionPoint::capability::<dyn Engine>().with_qualifier("v8Engine"),
                    InjectionPoint::concrete::<BrowserRenderer>(),
                ],
                build: |mut args| {
                    Ok(Browser {
                        engine: args.next()?,
                        renderer: args.next()?,
                    })
                },
            }
        }
    }
}

mod circular {
    use super::*;

    pub struct ClassA {
        _class_b: Arc<ClassB>,
    }

    impl Component for ClassA {
        fn constructor() -> Constructor<Self> {
            Constructor::Injected {
                params: vec![InjectionPoint::concrete::<ClassB>()],
                build: |mut args| Ok(ClassA { _class_b: args.next()? }),
            }
        }
    }

    pub struct ClassB {
        _class_a: Arc<ClassA>,
    }

    impl Component for ClassB {
        fn constructor() -> Constructor<Self> {
            Constructor::Injected {
                params: vec![InjectionPoint::concrete::<ClassA>()],
                build: |mut args| Ok(ClassB { _class_a: args.next()? }),
            }
        }
    }
}

mod childparent {
    use super::*;
    use once_cell::sync::OnceCell;

    #[derive(Default)]
    pub struct Dependency;

    impl Dependency {
        pub fn name(&self) -> &'static str {
            "Dependency"
        }
    }

    impl Component for Dependency {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }
    }

    #[derive(Default)]
    pub struct Parent {
        dependency: OnceCell<Arc<Dependency>>,
    }

    impl Parent {
        pub fn set_dependency(&self, dependency: Arc<Dependency>) {
            let _ = self.dependency.set(dependency);
        }
    }

    #[derive(Default)]
    pub struct Child {
        parent: Parent,
    }

    impl Child {
        pub fn test(&self) -> &'static str {
            self.parent
                .dependency
                .get()
                .map_or("", |dependency| dependency.name())
        }
    }

    impl Component for Child {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }

        fn setters() -> Vec<SetterInjection<Self>> {
            vec![SetterInjection::new(
                "set_dependency",
                vec![InjectionPoint::concrete::<Dependency>()],
                |child: &Child, mut args: Arguments| {
                    child.parent.set_dependency(args.next()?);
                    Ok(())
                },
            )]
        }
    }
}

mod configbean {
    use super::*;

    pub mod entity {
        #[derive(Debug, Default)]
        pub struct App {
            version: u32,
        }

        impl App {
            pub fn app(&self) -> u32 {
                self.version
            }
        }

        #[derive(Debug)]
        pub struct Db {
            db: String,
        }

        impl Db {
            pub fn new(config: &App) -> Self {
                Self {
                    db: format!("DB for app version {}", config.app()),
                }
            }

            pub fn db(&self) -> &str {
                &self.db
            }
        }
    }

    pub mod configuration {
        use super::entity::{App, Db};
        use super::*;

        #[derive(Default)]
        pub struct AppConfiguration;

        impl Configuration for AppConfiguration {
            fn beans() -> Vec<BeanMethod<Self>> {
                vec![BeanMethod::new("app", |_: &AppConfiguration| Arc::new(App::default()))]
            }
        }

        #[derive(Default)]
        pub struct DbConfiguration {
            app: Autowired<App>,
        }

        impl Configuration for DbConfiguration {
            fn fields() -> Vec<FieldInjection<Self>> {
                vec![FieldInjection::concrete("app", |config: &DbConfiguration| &config.app)]
            }

            fn beans() -> Vec<BeanMethod<Self>> {
                vec![BeanMethod::fallible("db", |config: &DbConfiguration| {
                    Ok(Arc::new(Db::new(config.app.try_get()?)))
                })]
            }
        }
    }

    use entity::{App, Db};

    #[derive(Default)]
    pub struct AnotherClientClass {
        db: Autowired<Db>,
    }

    impl AnotherClientClass {
        pub fn scan(&self) -> String {
            let db = self.db.get().map_or("", |db| db.db());
            format!("Scanning for {db}")
        }
    }

    impl Component for AnotherClientClass {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }

        fn fields() -> Vec<FieldInjection<Self>> {
            vec![FieldInjection::concrete("db", |client: &AnotherClientClass| &client.db)]
        }
    }

    #[derive(Default)]
    pub struct ClientClass {
        db: Autowired<Db>,
        app: Autowired<App>,
        another_client_class: Autowired<AnotherClientClass>,
    }

    impl ClientClass {
        pub fn run(&self) -> String {
            let app = self.app.get().map_or(u32::MAX, |app| app.app());
            let db = self.db.get().map_or("", |db| db.db());
            format!("{app} | {db}")
        }

        pub fn run_scan(&self) -> String {
            self.another_client_class
                .get()
                .map(|another| another.scan())
                .unwrap_or_default()
        }
    }

    impl Component for ClientClass {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }

        fn fields() -> Vec<FieldInjection<Self>> {
            vec![
                FieldInjection::concrete("db", |client: &ClientClass| &client.db),
                FieldInjection::concrete("app", |client: &ClientClass| &client.app),
                FieldInjection::concrete("another_client_class", |client: &ClientClass| {
                    &client.another_client_class
                }),
            ]
        }
    }
}

mod storage {
    use super::*;

    pub trait Storage: Send + Sync {
        fn kind(&self) -> &'static str;
    }

    #[derive(Default)]
    pub struct Disk;

    impl Storage for Disk {
        fn kind(&self) -> &'static str {
            "disk"
        }
    }

    impl Component for Disk {
        fn capabilities() -> Vec<CapabilityBinding> {
            vec![CapabilityBinding::new::<Disk, dyn Storage>(|disk| disk)]
        }

        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }
    }

    #[derive(Default)]
    pub struct Memory;

    impl Storage for Memory {
        fn kind(&self) -> &'static str {
            "memory"
        }
    }

    impl Component for Memory {
        fn capabilities() -> Vec<CapabilityBinding> {
            vec![CapabilityBinding::new::<Memory, dyn Storage>(|memory| memory)]
        }

        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }
    }

    #[derive(Default)]
    pub struct Cache {
        pub memory: Autowired<dyn Storage>,
        pub archive: Autowired<dyn Storage>,
    }

    impl Component for Cache {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }

        fn fields() -> Vec<FieldInjection<Self>> {
            vec![
                FieldInjection::capability::<dyn Storage>("memory", |cache: &Cache| &cache.memory),
                FieldInjection::capability::<dyn Storage>("archive", |cache: &Cache| &cache.archive)
                    .with_qualifier("disk"),
            ]
        }
    }

    #[derive(Default)]
    pub struct Undecided {
        storage: Autowired<dyn Storage>,
    }

    impl Component for Undecided {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }

        fn fields() -> Vec<FieldInjection<Self>> {
            vec![FieldInjection::capability::<dyn Storage>(
                "storage",
                |undecided: &Undecided| &undecided.storage,
            )]
        }
    }
}

mod named_beans {
    use super::*;

    #[derive(Debug)]
    pub struct Endpoint(pub &'static str);

    #[derive(Default)]
    pub struct EndpointConfiguration;

    impl Configuration for EndpointConfiguration {
        fn beans() -> Vec<BeanMethod<Self>> {
            vec![
                BeanMethod::new("primary", |_: &EndpointConfiguration| {
                    Arc::new(Endpoint("https://primary"))
                })
                .named("primary"),
                BeanMethod::new("secondary", |_: &EndpointConfiguration| {
                    Arc::new(Endpoint("https://secondary"))
                })
                .named("secondary"),
            ]
        }
    }
}

mod setter_cycle {
    use super::*;
    use once_cell::sync::OnceCell;

    #[derive(Default)]
    pub struct Publisher {
        pub subscriber: OnceCell<Arc<Subscriber>>,
    }

    impl Component for Publisher {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }

        fn setters() -> Vec<SetterInjection<Self>> {
            vec![SetterInjection::new(
                "set_subscriber",
                vec![InjectionPoint::concrete::<Subscriber>()],
                |publisher: &Publisher, mut args: Arguments| {
                    let _ = publisher.subscriber.set(args.next()?);
                    Ok(())
                },
            )]
        }
    }

    #[derive(Default)]
    pub struct Subscriber {
        pub publisher: OnceCell<Arc<Publisher>>,
    }

    impl Component for Subscriber {
        fn constructor() -> Constructor<Self> {
            Constructor::from_default()
        }

        fn setters() -> Vec<SetterInjection<Self>> {
            vec![SetterInjection::new(
                "set_publisher",
                vec![InjectionPoint::concrete::<Publisher>()],
                |subscriber: &Subscriber, mut args: Arguments| {
                    let _ = subscriber.publisher.set(args.next()?);
                    Ok(())
                },
            )]
        }
    }
}

fn configbean_catalog() -> ComponentCatalog {
    use configbean::configuration::{AppConfiguration, DbConfiguration};

    // DbConfiguration 依赖 AppConfiguration 的产物, 先登记以触发重新入队
    ComponentCatalog::named("configbean")
        .configuration::<DbConfiguration>()
        .configuration::<AppConfiguration>()
        .component::<configbean::ClientClass>()
        .component::<configbean::AnotherClientClass>()
}

#[test]
fn test_single_component_is_a_singleton() {
    let container = build(
        ComponentCatalog::new().component::<single::TestComponent>(),
        &["single"],
    )
    .unwrap();

    let first = container.lookup::<single::TestComponent>().unwrap();
    let second = container.lookup::<single::TestComponent>().unwrap();
    assert_eq!(first.name(), "Test");
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_mixed_cycle_resolves_when_field_side_is_discovered_first() {
    let catalog = ComponentCatalog::named("multiple")
        .component::<multiple::CircularDependency>()
        .component::<multiple::V8Engine>()
        .component::<multiple::BrowserRenderer>()
        .component::<multiple::Browser>();
    let container = build(catalog, &["multiple"]).unwrap();

    let browser = container.lookup::<multiple::Browser>().unwrap();
    assert_eq!(
        browser.run(),
        "This browser run on V8 and CircularDependencyOfV8Engine"
    );

    let engine = container.lookup_capability::<dyn multiple::Engine>().unwrap();
    let v8 = container.lookup::<multiple::V8Engine>().unwrap();
    assert!(std::ptr::eq(
        Arc::as_ptr(&engine) as *const (),
        Arc::as_ptr(&v8) as *const ()
    ));
}

#[test]
fn test_mixed_cycle_fails_when_constructor_side_is_discovered_first() {
    let catalog = ComponentCatalog::named("multiple")
        .component::<multiple::Browser>()
        .component::<multiple::V8Engine>()
        .component::<multiple::CircularDependency>()
        .component::<multiple::BrowserRenderer>();
    let err = build(catalog, &["multiple"]).unwrap_err();

    assert!(matches!(
        err.dependency_error(),
        Some(DependencyError::CircularDependency { .. })
    ));
}

#[test]
fn test_constructor_cycle_fails_build() {
    let catalog = ComponentCatalog::named("circular")
        .component::<circular::ClassA>()
        .component::<circular::ClassB>();
    let err = build(catalog, &["circular"]).unwrap_err();

    assert!(matches!(err, InfrastructureError::Initialization { .. }));
    match err.dependency_error() {
        Some(DependencyError::CircularDependency { chain, .. }) => {
            assert_eq!(chain, "ClassA -> ClassB -> ClassA");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_setter_injection() {
    let catalog = ComponentCatalog::named("childparent")
        .component::<childparent::Child>()
        .component::<childparent::Dependency>();
    let container = build(catalog, &["childparent"]).unwrap();

    let child = container.lookup::<childparent::Child>().unwrap();
    assert_eq!(child.test(), "Dependency");
}

#[test]
fn test_setter_cycle_resolves_through_publication() {
    let catalog = ComponentCatalog::named("setter_cycle")
        .component::<setter_cycle::Publisher>()
        .component::<setter_cycle::Subscriber>();
    let container = build(catalog, &["setter_cycle"]).unwrap();

    let publisher = container.lookup::<setter_cycle::Publisher>().unwrap();
    let subscriber = container.lookup::<setter_cycle::Subscriber>().unwrap();
    assert!(Arc::ptr_eq(publisher.subscriber.get().unwrap(), &subscriber));
    assert!(Arc::ptr_eq(subscriber.publisher.get().unwrap(), &publisher));
    assert_eq!(container.stats().realized_components, 2);
}

#[test]
fn test_factory_beans_feed_components() {
    let container = build(configbean_catalog(), &["configbean"]).unwrap();

    let client = container.lookup::<configbean::ClientClass>().unwrap();
    assert_eq!(client.run(), "0 | DB for app version 0");
    assert_eq!(client.run_scan(), "Scanning for DB for app version 0");

    // DbConfiguration 重新入队一次
    assert_eq!(container.stats().factory_rounds, 3);
    assert_eq!(
        container.instance_names(&TypeInfo::of::<configbean::entity::Db>()),
        vec![TypeInfo::of::<configbean::entity::Db>().canonical_name().to_string()]
    );
}

#[test]
fn test_scanning_several_packages() {
    let catalog = configbean_catalog().component::<single::TestComponent>();
    let container = build(catalog, &["single", "configbean"]).unwrap();

    assert!(container.lookup::<single::TestComponent>().is_ok());
    assert!(container.lookup::<configbean::ClientClass>().is_ok());
    assert_eq!(container.scanned().configurations.len(), 2);
}

#[test]
fn test_capability_selection_by_field_name_and_qualifier() {
    let catalog = ComponentCatalog::named("storage")
        .component::<storage::Disk>()
        .component::<storage::Memory>()
        .component::<storage::Cache>();
    let container = build(catalog, &["storage"]).unwrap();

    let cache = container.lookup::<storage::Cache>().unwrap();
    assert_eq!(cache.memory.get().unwrap().kind(), "memory");
    assert_eq!(cache.archive.get().unwrap().kind(), "disk");

    let disk = container
        .lookup_capability_named::<dyn storage::Storage>("Disk")
        .unwrap();
    assert_eq!(disk.kind(), "disk");

    let err = container
        .lookup_capability::<dyn storage::Storage>()
        .err()
        .unwrap();
    assert!(matches!(
        err.dependency_error(),
        Some(DependencyError::Ambiguous { candidates: 2, .. })
    ));
}

#[test]
fn test_unqualified_capability_with_several_implementations_is_ambiguous() {
    let catalog = ComponentCatalog::named("storage")
        .component::<storage::Disk>()
        .component::<storage::Memory>()
        .component::<storage::Undecided>();
    let err = build(catalog, &["storage"]).unwrap_err();

    assert!(matches!(
        err.dependency_error(),
        Some(DependencyError::Ambiguous { candidates: 2, .. })
    ));
}

#[test]
fn test_named_beans_need_exact_names() {
    let catalog = ComponentCatalog::named("named_beans")
        .configuration::<named_beans::EndpointConfiguration>();
    let container = build(catalog, &["named_beans"]).unwrap();

    let secondary = container
        .lookup_named::<named_beans::Endpoint>("secondary")
        .unwrap();
    assert_eq!(secondary.0, "https://secondary");

    let err = container.lookup::<named_beans::Endpoint>().unwrap_err();
    assert!(matches!(
        err.dependency_error(),
        Some(DependencyError::Conflict { count: 2, .. })
    ));
    assert_eq!(
        container.instance_names(&TypeInfo::of::<named_beans::Endpoint>()),
        vec!["primary".to_string(), "secondary".to_string()]
    );
}

#[test]
fn test_trace_resolution_does_not_change_results() {
    init();
    let config = ContainerConfig {
        trace_resolution: true,
        ..ContainerConfig::default()
    };
    let container = IocContainer::builder()
        .with_scanner(configbean_catalog())
        .with_config(config)
        .build(&ScanRoot::packages([package("configbean")]))
        .unwrap();

    let client = container.lookup::<configbean::ClientClass>().unwrap();
    assert_eq!(client.run(), "0 | DB for app version 0");
}
