//! # 示例应用程序
//!
//! 演示如何用组件宏声明组件和工厂声明, 并通过 IoC 容器构建对象图

use anyhow::Context;
use clap::Parser;
use di_abstractions::{ContainerConfig, DiContainer, ScanRoot};
use di_impl::{ComponentCatalog, IocContainer};
use infrastructure_common::init_logging;
use std::path::PathBuf;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn IoC 示例应用")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别, 覆盖配置文件
    #[arg(long)]
    log_level: Option<String>,

    /// 输出每一次依赖解析
    #[arg(long)]
    trace_resolution: bool,
}

mod shop {
    use component_macros::{injectable, Component, Configuration};
    use di_abstractions::Autowired;
    use once_cell::sync::OnceCell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::info;

    /// 支付渠道
    pub trait PaymentGateway: Send + Sync {
        fn charge(&self, cents: u64) -> String;
    }

    #[derive(Component, Default)]
    #[component(provides(dyn PaymentGateway))]
    pub struct Stripe;

    impl PaymentGateway for Stripe {
        fn charge(&self, cents: u64) -> String {
            format!("stripe charged {cents} cents")
        }
    }

    #[derive(Component, Default)]
    #[component(provides(dyn PaymentGateway))]
    pub struct Paypal;

    impl PaymentGateway for Paypal {
        fn charge(&self, cents: u64) -> String {
            format!("paypal charged {cents} cents")
        }
    }

    /// 商店设置
    #[derive(Debug)]
    pub struct ShopSettings {
        pub currency: &'static str,
        pub tax_percent: u64,
    }

    #[derive(Configuration, Default)]
    pub struct ShopConfiguration;

    #[injectable]
    impl ShopConfiguration {
        #[bean]
        fn settings(&self) -> ShopSettings {
            ShopSettings {
                currency: "EUR",
                tax_percent: 20,
            }
        }
    }

    #[derive(Component, Default)]
    #[component(injectable)]
    pub struct Notifier {
        sent: AtomicUsize,
        settings: OnceCell<Arc<ShopSettings>>,
    }

    #[injectable]
    impl Notifier {
        fn new() -> Self {
            Self::default()
        }

        #[autowired]
        fn set_settings(&self, settings: Arc<ShopSettings>) {
            let _ = self.settings.set(settings);
        }

        pub fn notify(&self, message: &str) {
            self.sent.fetch_add(1, Ordering::Relaxed);
            let currency = self.settings.get().map_or("?", |settings| settings.currency);
            info!("通知 [{}]: {}", currency, message);
        }
    }

    #[derive(Component)]
    #[component(injectable)]
    pub struct OrderService {
        gateway: Arc<dyn PaymentGateway>,
        settings: Arc<ShopSettings>,
        #[autowired]
        notifier: Autowired<Notifier>,
    }

    #[injectable]
    impl OrderService {
        #[autowired]
        fn new(
            #[qualifier("stripe")] gateway: Arc<dyn PaymentGateway>,
            settings: Arc<ShopSettings>,
        ) -> Self {
            Self {
                gateway,
                settings,
                notifier: Autowired::new(),
            }
        }

        pub fn place_order(&self, net_cents: u64) -> String {
            let total = net_cents + net_cents * self.settings.tax_percent / 100;
            let receipt = self.gateway.charge(total);
            if let Some(notifier) = self.notifier.get() {
                notifier.notify(&receipt);
            }
            receipt
        }
    }

    /// 示例包的组件目录
    pub fn catalog() -> di_impl::ComponentCatalog {
        di_impl::ComponentCatalog::named("shop")
            .configuration::<ShopConfiguration>()
            .component::<Stripe>()
            .component::<Paypal>()
            .component::<Notifier>()
            .component::<OrderService>()
    }
}

fn load_config(args: &Args) -> anyhow::Result<ContainerConfig> {
    let mut config = match &args.config {
        Some(path) => ContainerConfig::from_toml_file(path)
            .with_context(|| format!("加载配置文件失败: {}", path.display()))?,
        None => ContainerConfig::default(),
    };
    config = config.with_env_overrides("LORN_IOC")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.trace_resolution |= args.trace_resolution;
    Ok(config)
}

fn build_container(config: ContainerConfig) -> anyhow::Result<IocContainer> {
    let catalog: ComponentCatalog = shop::catalog();
    let builder = IocContainer::builder()
        .with_scanner(catalog)
        .with_config(config.clone());
    let container = match config.scan_root() {
        Some(_) => builder.build_from_config()?,
        None => builder.build(&ScanRoot::packages([format!("{}::shop", module_path!())]))?,
    };
    Ok(container)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config.logging)?;

    info!("启动 Lorn IoC 示例应用");
    let container = build_container(config).context("构建容器失败")?;

    let orders = container.lookup::<shop::OrderService>()?;
    println!("{}", orders.place_order(1_000));

    let paypal = container.lookup_capability_named::<dyn shop::PaymentGateway>("paypal")?;
    println!("{}", paypal.charge(250));

    let stats = container.stats();
    info!(
        "容器统计: {} 个绑定, {} 个实例, {} 个已构造组件",
        stats.registered_bindings, stats.stored_instances, stats.realized_components
    );
    Ok(())
}
