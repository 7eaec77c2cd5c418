//! 显式组件目录
//!
//! 组件和工厂声明在目录中登记, 扫描时按模块路径过滤。

use di_abstractions::{
    Component, ComponentDescriptor, ComponentScanner, Configuration, FactoryDeclaration,
    ScanResult,
};
use infrastructure_common::ComponentError;
use std::sync::Arc;
use tracing::{debug, warn};

/// 组件目录
///
/// 扫描结果保持登记顺序, 这也是组件阶段的实现顺序。
#[derive(Debug, Clone)]
pub struct ComponentCatalog {
    name: String,
    components: Vec<Arc<ComponentDescriptor>>,
    configurations: Vec<Arc<FactoryDeclaration>>,
}

impl Default for ComponentCatalog {
    fn default() -> Self {
        Self::named("catalog")
    }
}

impl ComponentCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带名称的空目录
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            configurations: Vec::new(),
        }
    }

    /// 登记组件
    pub fn component<T: Component>(mut self) -> Self {
        let descriptor = T::descriptor();
        if self
            .components
            .iter()
            .any(|known| known.type_info == descriptor.type_info)
        {
            warn!("组件重复登记, 已忽略: {}", descriptor.type_info);
        } else {
            debug!("登记组件: {}", descriptor.type_info.short_name());
            self.components.push(Arc::new(descriptor));
        }
        self
    }

    /// 登记工厂声明
    pub fn configuration<T: Configuration>(mut self) -> Self {
        let declaration = T::declaration();
        if self
            .configurations
            .iter()
            .any(|known| known.type_info == declaration.type_info)
        {
            warn!("工厂声明重复登记, 已忽略: {}", declaration.type_info);
        } else {
            debug!("登记工厂声明: {}", declaration.type_info.short_name());
            self.configurations.push(Arc::new(declaration));
        }
        self
    }

    /// 登记的组件和工厂声明总数
    pub fn len(&self) -> usize {
        self.components.len() + self.configurations.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 包名必须为空或由 `::` 分隔的标识符组成
fn validate_package(package: &str) -> Result<(), ComponentError> {
    if package.is_empty() {
        return Ok(());
    }
    let valid = package.split("::").all(|segment| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|first| first == '_' || first.is_alphabetic())
            && chars.all(|c| c == '_' || c.is_alphanumeric())
    });
    if valid {
        Ok(())
    } else {
        Err(ComponentError::scan_error(format!("无效的包路径: '{package}'")))
    }
}

impl ComponentScanner for ComponentCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self, package: &str) -> Result<ScanResult, ComponentError> {
        validate_package(package)?;
        let result = ScanResult {
            components: self
                .components
                .iter()
                .filter(|component| component.type_info.is_in_package(package))
                .cloned()
                .collect(),
            configurations: self
                .configurations
                .iter()
                .filter(|configuration| configuration.type_info.is_in_package(package))
                .cloned()
                .collect(),
        };
        debug!(
            "扫描包 '{}': {} 个组件, {} 个工厂声明",
            package,
            result.components.len(),
            result.configurations.len()
        );
        Ok(result)
    }

    fn component_table(&self) -> Vec<Arc<ComponentDescriptor>> {
        self.components.clone()
    }
}
