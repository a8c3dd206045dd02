//! # 解析器模块
//!
//! 页面快照的解析：快照上的选择器匹配与文本规整。
//!
//! # 模块组织
//!
//! - `html` - 选择器匹配、文本规整

pub mod html;

// Re-export commonly used items for convenience
pub use html::{normalize_quotes, text_content, CssSelector, SelectorError};
