//! HTML解析和处理模块
//!
//! - `utils`: 基础工具函数和常量
//! - `selector`: 页面结构描述使用的选择器及文本提取

pub mod selector;
pub mod utils;

pub use selector::{text_content, CssSelector, SelectorError};
pub use utils::{normalize_quotes, SMART_QUOTES};
