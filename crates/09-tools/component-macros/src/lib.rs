//! # Component Macros
//!
//! 这个 crate 提供了为服务容器生成构造形状的派生宏。
//!
//! ## 核心宏
//!
//! - [`Injectable`] - 根据结构体字段生成 `TypeDescriptor`
//!
//! 生成的代码引用 `::di_abstractions`，使用方需要直接依赖该 crate。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::Injectable;
//! use std::sync::Arc;
//!
//! #[derive(Injectable)]
//! pub struct ConsoleLogger;
//!
//! #[derive(Injectable)]
//! pub struct Notifier {
//!     #[inject(id = "Logger")]
//!     logger: Arc<ConsoleLogger>,
//!     #[inject(default = 3)]
//!     retries: u32,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod injectable;
mod utils;

/// 可注入类型派生宏
///
/// 为结构体实现 `di_abstractions::Injectable`，每个字段对应一个构造参数，
/// 参数名即字段名，位置即声明顺序。
///
/// # 结构体参数
///
/// - `id = "Name"` - 类型标识（默认为结构体名）
/// - `bare_on_cycle` - 循环依赖时允许构造裸实例
/// - `provides(dyn Trait, ...)` - 声明实现的接口，接口标识为 trait 名，
///   经由该接口绑定解析时实例会转为 `Arc<dyn Trait>`
///
/// # 字段参数
///
/// - `id = "Name"` - 依赖的服务标识，覆盖从字段类型推断的标识
/// - `optional` - 无法解析时注入空值
/// - `default` / `default = expr` - 无法解析时使用的默认值
///
/// # 字段类型
///
/// - `Arc<T>` - 解析 `T` 对应的服务
/// - `Arc<dyn Trait>` - 解析 `Trait` 对应的服务，实例需保存为 `Arc<dyn Trait>`，
///   可由工厂给出，或由声明了 `provides(dyn Trait)` 的类型经绑定给出
/// - `Instance` - 未转型的实例，需要 `id`
/// - 其他类型按值克隆，只能来自覆盖参数、上下文绑定或默认值
/// - 以上类型包在 `Option` 中时为可选依赖
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// #[injectable(id = "ReportController")]
/// pub struct ReportController {
///     #[inject(id = "Formatter")]
///     formatter: Arc<dyn Formatter>,
///     logger: Option<Arc<ConsoleLogger>>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
