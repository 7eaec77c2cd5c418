//! 组件扫描器抽象接口
//!
//! 扫描器按包（模块路径前缀）发现候选组件和工厂声明

use crate::descriptor::ComponentDescriptor;
use crate::factory::FactoryDeclaration;
use infrastructure_common::{ComponentError, TypeInfo};
use std::sync::Arc;

/// 扫描根描述
///
/// 未显式指定包时使用根类型所在的模块。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRoot {
    packages: Vec<String>,
}

impl ScanRoot {
    /// 扫描根类型所在的模块
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            packages: vec![TypeInfo::of::<T>().module_path().to_string()],
        }
    }

    /// 扫描指定的包
    pub fn packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    /// 扫描所有已知组件
    pub fn all() -> Self {
        Self {
            packages: vec![String::new()],
        }
    }

    /// 追加一个包
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.packages.push(package.into());
        self
    }

    /// 要扫描的包列表
    pub fn package_list(&self) -> &[String] {
        &self.packages
    }
}

/// 扫描结果, 按发现顺序排列
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// 候选组件
    pub components: Vec<Arc<ComponentDescriptor>>,
    /// 工厂声明
    pub configurations: Vec<Arc<FactoryDeclaration>>,
}

impl ScanResult {
    /// 合并另一个扫描结果, 已出现的类型不会重复加入
    pub fn merge(&mut self, other: ScanResult) {
        for component in other.components {
            if !self
                .components
                .iter()
                .any(|known| known.type_info == component.type_info)
            {
                self.components.push(component);
            }
        }
        for configuration in other.configurations {
            if !self
                .configurations
                .iter()
                .any(|known| known.type_info == configuration.type_info)
            {
                self.configurations.push(configuration);
            }
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.configurations.is_empty()
    }
}

/// 组件扫描器 trait
pub trait ComponentScanner: Send + Sync {
    /// 获取扫描器名称
    fn name(&self) -> &str;

    /// 扫描指定包中的组件和工厂声明
    fn scan(&self, package: &str) -> Result<ScanResult, ComponentError>;

    /// 所有已知组件的描述符, 未被扫描到的类型也可以按需构造
    fn component_table(&self) -> Vec<Arc<ComponentDescriptor>>;

    /// 依次扫描根描述中的每个包并合并结果
    fn scan_root(&self, root: &ScanRoot) -> Result<ScanResult, ComponentError> {
        let mut result = ScanResult::default();
        for package in root.package_list() {
            result.merge(self.scan(package)?);
        }
        Ok(result)
    }
}
