//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件描述符、工厂声明和容器查找的核心接口。
//!
//! ## 核心接口
//!
//! - [`Component`] - 组件描述 trait
//! - [`Configuration`] - 工厂声明 trait
//! - [`ComponentScanner`] - 组件扫描器接口
//! - [`DiContainer`] - 容器查找接口
//! - [`Autowired`] - 字段注入槽

pub mod container;
pub mod descriptor;
pub mod factory;
pub mod instance;
pub mod scanner;

pub use container::*;
pub use descriptor::*;
pub use factory::*;
pub use instance::*;
pub use scanner::*;

// 生成代码只依赖本 crate
pub use infrastructure_common::{DependencyError, DependencyResult};
