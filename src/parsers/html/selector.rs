//! 页面结构描述使用的 CSS 选择器
//!
//! 同一个选择器既以原始文本交给浏览器，也编译成 `scraper::Selector` 在快照上匹配。

use std::fmt;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// 选择器解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的选择器 '{selector}': {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// 保留原始文本的已编译选择器
#[derive(Debug, Clone)]
pub struct CssSelector {
    source: String,
    compiled: Selector,
}

impl CssSelector {
    pub fn parse(css: &str) -> Result<Self, SelectorError> {
        let compiled = Selector::parse(css).map_err(|e| SelectorError {
            selector: css.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: css.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// 整个文档中第一个匹配元素
    pub fn first_in<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&self.compiled).next()
    }

    /// `scope` 后代中按文档顺序的所有匹配元素
    pub fn select_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        scope.select(&self.compiled).collect()
    }

    pub fn select_first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        scope.select(&self.compiled).next()
    }
}

impl fmt::Display for CssSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// 拼接元素下所有文本（等同于 DOM 的 textContent）
pub fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect()
}
