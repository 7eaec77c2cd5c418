//! # 依赖注入具体实现
//!
//! 提供组件解析引擎: 绑定注册表、单例实例仓库、构造循环守卫、
//! 实例化编排器, 以及在它们之上构建的 [`IocContainer`] 和 [`ComponentCatalog`]。
//!
//! ## 构建流程
//!
//! 1. 保存预构建实例并注册其绑定
//! 2. 扫描根描述中的包, 注册工厂方法返回类型和组件的绑定
//! 3. 把持有弱引用的 [`ContainerHandle`] 保存为实例
//! 4. 工厂阶段: 可重试队列实现所有工厂声明
//! 5. 组件阶段: 按发现顺序递归实现普通组件

pub mod catalog;
pub mod container;
pub mod cycle_guard;
pub mod orchestrator;
pub mod registry;
pub mod store;

pub use catalog::ComponentCatalog;
pub use container::{ContainerBuilder, ContainerHandle, IocContainer};
pub use cycle_guard::{ConstructionFrame, CycleGuard};
pub use orchestrator::{Orchestrator, OrchestratorOptions};
pub use registry::TypeRegistry;
pub use store::InstanceStore;
