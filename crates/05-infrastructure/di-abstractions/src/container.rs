//! 依赖注入容器抽象接口
//!
//! 提供容器的查找接口、配置和统计信息

use crate::descriptor::InjectionPoint;
use crate::instance::Instance;
use crate::scanner::ScanRoot;
use infrastructure_common::{
    ConfigError, ConfigResult, InfrastructureError, InfrastructureResult, LoggingConfig,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// 依赖注入容器 trait
///
/// `lookup*` 只返回已实现的实例; `resolve*` 在实例缺失时按需构造。
pub trait DiContainer: Send + Sync {
    /// 按注入点查找已实现的实例
    fn lookup_instance(&self, point: &InjectionPoint) -> InfrastructureResult<Instance>;

    /// 按注入点查找实例, 缺失时构造
    fn resolve_instance(&self, point: &InjectionPoint) -> InfrastructureResult<Instance>;

    /// 获取容器统计信息
    fn stats(&self) -> ContainerStats;

    /// 查找具体类型
    fn lookup<T>(&self) -> InfrastructureResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        Self: Sized,
    {
        typed(self.lookup_instance(&InjectionPoint::concrete::<T>())?)
    }

    /// 按名称查找具体类型
    fn lookup_named<T>(&self, name: &str) -> InfrastructureResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        Self: Sized,
    {
        typed(self.lookup_instance(&InjectionPoint::concrete::<T>().with_qualifier(name))?)
    }

    /// 查找能力类型
    fn lookup_capability<C>(&self) -> InfrastructureResult<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        typed(self.lookup_instance(&InjectionPoint::capability::<C>())?)
    }

    /// 按限定符查找能力类型
    fn lookup_capability_named<C>(&self, name: &str) -> InfrastructureResult<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        typed(self.lookup_instance(&InjectionPoint::capability::<C>().with_qualifier(name))?)
    }

    /// 解析具体类型, 缺失时构造
    fn resolve<T>(&self) -> InfrastructureResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        Self: Sized,
    {
        typed(self.resolve_instance(&InjectionPoint::concrete::<T>())?)
    }

    /// 解析能力类型, 缺失时构造
    fn resolve_capability<C>(&self) -> InfrastructureResult<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        typed(self.resolve_instance(&InjectionPoint::capability::<C>())?)
    }
}

fn typed<T: ?Sized + Send + Sync + 'static>(instance: Instance) -> InfrastructureResult<Arc<T>> {
    instance
        .downcast_or_fail::<T>()
        .map_err(|source| InfrastructureError::Lookup { source })
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 要扫描的包, 为空时由调用方提供扫描根
    pub scan_packages: Vec<String>,
    /// 工厂队列整轮没有进展时是否输出警告
    pub warn_on_stalled_factories: bool,
    /// 是否以 debug 级别记录每一次依赖解析
    pub trace_resolution: bool,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            scan_packages: Vec::new(),
            warn_on_stalled_factories: true,
            trace_resolution: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl ContainerConfig {
    /// 从 TOML 字符串加载
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(ConfigError::parse_error)
    }

    /// 从 JSON 字符串加载
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(ConfigError::parse_error)
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("加载容器配置文件: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 使用环境变量覆盖配置
    ///
    /// 支持 `{PREFIX}_SCAN_PACKAGES`（逗号分隔）、`{PREFIX}_TRACE_RESOLUTION`、
    /// `{PREFIX}_WARN_ON_STALLED_FACTORIES` 与 `{PREFIX}_LOG_LEVEL`。
    pub fn with_env_overrides(self, prefix: &str) -> ConfigResult<Self> {
        self.with_overrides(prefix, |key| std::env::var(key).ok())
    }

    /// 使用给定的变量来源覆盖配置
    pub fn with_overrides(
        mut self,
        prefix: &str,
        source: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        let key = |name: &str| format!("{}_{}", prefix.trim_end_matches('_'), name);

        if let Some(packages) = source(&key("SCAN_PACKAGES")) {
            self.scan_packages = packages
                .split(',')
                .map(str::trim)
                .filter(|package| !package.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = source(&key("TRACE_RESOLUTION")) {
            self.trace_resolution = parse_flag(&key("TRACE_RESOLUTION"), &value)?;
        }
        if let Some(value) = source(&key("WARN_ON_STALLED_FACTORIES")) {
            self.warn_on_stalled_factories =
                parse_flag(&key("WARN_ON_STALLED_FACTORIES"), &value)?;
        }
        if let Some(level) = source(&key("LOG_LEVEL")) {
            self.logging.level = level;
        }
        Ok(self)
    }

    /// 由配置的包构建扫描根
    pub fn scan_root(&self) -> Option<ScanRoot> {
        if self.scan_packages.is_empty() {
            None
        } else {
            Some(ScanRoot::packages(self.scan_packages.iter().cloned()))
        }
    }
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid_value(key, format!("无法解析布尔值: {other}"))),
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 已注册的绑定数量
    pub registered_bindings: usize,
    /// 已保存的实例记录数量
    pub stored_instances: usize,
    /// 拥有实例的类型数量
    pub stored_types: usize,
    /// 工厂队列处理的轮次（出队次数）
    pub factory_rounds: usize,
    /// 已构造的组件数量
    pub realized_components: usize,
}
