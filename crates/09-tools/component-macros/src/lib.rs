//! # Component Macros
//!
//! 这个 crate 提供了生成组件描述符和工厂声明的过程宏。
//!
//! ## 核心宏
//!
//! - [`Component`](derive@Component) - 生成 `di_abstractions::Component` 实现
//! - [`Configuration`](derive@Configuration) - 生成 `di_abstractions::Configuration` 实现
//! - [`injectable`] - 从 impl 块收集构造函数、setter 和工厂方法
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::{injectable, Component};
//! use di_abstractions::Autowired;
//! use std::sync::Arc;
//!
//! pub trait Engine: Send + Sync {
//!     fn name(&self) -> String;
//! }
//!
//! #[derive(Component, Default)]
//! #[component(provides(dyn Engine))]
//! pub struct V8Engine;
//!
//! #[derive(Component)]
//! #[component(injectable)]
//! pub struct Browser {
//!     engine: Arc<dyn Engine>,
//!     #[autowired(qualifier = "memory")]
//!     cache: Autowired<dyn Cache>,
//! }
//!
//! #[injectable]
//! impl Browser {
//!     #[autowired]
//!     fn new(engine: Arc<dyn Engine>) -> Self {
//!         Self { engine, cache: Autowired::new() }
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemImpl};

mod component;
mod configuration;
mod injectable;
mod utils;

/// 组件派生宏
///
/// # 参数
///
/// - `#[component(provides(dyn A, dyn B))]` - 满足的能力, 未声明时只绑定自身
/// - `#[component(injectable)]` - 构造函数和 setter 来自 `#[injectable]` impl 块,
///   否则使用 `Default::default` 构造
/// - 字段上的 `#[autowired]` / `#[autowired(qualifier = "x")]` - 字段类型必须是
///   `Autowired<T>`, `T` 为 `dyn Trait` 时按能力解析
#[proc_macro_derive(Component, attributes(component, autowired))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::expand_component(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 工厂声明派生宏
///
/// 结构体必须实现 `Default`, 工厂方法由 `#[injectable]` impl 块中的 `#[bean]` 提供。
/// `#[autowired]` 字段在工厂阶段解析, 不会触发组件构造。
#[proc_macro_derive(Configuration, attributes(autowired))]
pub fn derive_configuration(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    configuration::expand_configuration(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 注入方法宏
///
/// - `#[autowired]` 关联函数（无 `self`）: 注入式构造函数, 返回 `Self` 或 `Result<Self, E>`
/// - `#[autowired]` `&self` 方法: setter, 返回 `()` 或 `Result<(), E>`
/// - `#[bean]` / `#[bean(name = "x")]` `&self` 方法: 工厂方法, 返回 `Arc<X>` 时以 `X` 为键,
///   其他返回类型 `R` 以 `R` 为键
/// - 参数必须是 `Arc<T>`, 可以用 `#[qualifier("x")]` 指定限定符
///
/// 没有 `#[autowired]` 构造函数时, 使用无参的 `fn new() -> Self`（如果存在）。
#[proc_macro_attribute]
pub fn injectable(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemImpl);
    injectable::expand_injectable(args.into(), item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
