//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn IoC 各层共享的基础类型。
//!
//! ## 核心组件
//!
//! - [`TypeInfo`] - 类型身份与名称信息
//! - [`DependencyError`] - 组件解析错误分类
//! - [`InfrastructureError`] - 容器对外暴露的统一错误
//! - [`LoggingConfig`] - 日志配置与初始化

pub mod errors;
pub mod logging;
pub mod metadata;

pub use errors::*;
pub use logging::*;
pub use metadata::*;
