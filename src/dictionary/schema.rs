//! 页面结构描述
//!
//! 词典网站的 URL 模板和全部选择器集中在一张表里，网站改版时只需要修改这里。

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::error::ScrapeResult;
use crate::parsers::html::{CssSelector, SelectorError};

/// 默认词典 URL 模板
pub const DEFAULT_URL_TEMPLATE: &str = "https://glosbe.com/{src}/{dst}/{word}";

/// 与 encodeURIComponent 相同：保留 `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// 选择器映射表
#[derive(Debug, Clone, Copy)]
pub struct SchemaTable {
    pub content_container: &'static str,
    pub consent_button: &'static str,
    pub entry_item: &'static str,
    pub phrase: &'static str,
    pub grammar: &'static str,
    /// 按优先级排列，取第一个命中的
    pub concept_type: &'static [&'static str],
    pub example_paragraph: &'static str,
}

/// Glosbe 的页面结构
pub const GLOSBE: SchemaTable = SchemaTable {
    content_container: "#dictionary-content",
    consent_button: "button.fc-cta-consent.fc-primary-button",
    entry_item: "ul.pr-1 li.translation__item",
    phrase: "h3.translation__item__pharse",
    grammar: "span.text-xxs.text-gray-500 span",
    concept_type: &[
        "p.translation__definition span[lang]",
        "p.translation__definition span",
    ],
    example_paragraph: "div.translation__example p",
};

/// 解析后的页面结构
#[derive(Debug, Clone)]
pub struct PageSchema {
    pub url_template: String,
    pub content_container: CssSelector,
    pub consent_button: CssSelector,
    pub entry_item: CssSelector,
    pub phrase: CssSelector,
    pub grammar: CssSelector,
    pub concept_type: Vec<CssSelector>,
    pub example_paragraph: CssSelector,
}

impl PageSchema {
    /// 由映射表构建
    pub fn from_table(
        url_template: impl Into<String>,
        table: &SchemaTable,
    ) -> Result<Self, SelectorError> {
        Ok(Self {
            url_template: url_template.into(),
            content_container: CssSelector::parse(table.content_container)?,
            consent_button: CssSelector::parse(table.consent_button)?,
            entry_item: CssSelector::parse(table.entry_item)?,
            phrase: CssSelector::parse(table.phrase)?,
            grammar: CssSelector::parse(table.grammar)?,
            concept_type: table
                .concept_type
                .iter()
                .map(|selector| CssSelector::parse(selector))
                .collect::<Result<_, _>>()?,
            example_paragraph: CssSelector::parse(table.example_paragraph)?,
        })
    }

    /// 默认的 Glosbe 结构
    pub fn glosbe() -> Result<Self, SelectorError> {
        Self::from_table(DEFAULT_URL_TEMPLATE, &GLOSBE)
    }

    /// 生成查询 URL，单词按 URI 组件编码
    pub fn lookup_url(&self, word: &str, source_lang: &str, target_lang: &str) -> ScrapeResult<String> {
        let url = self
            .url_template
            .replace("{src}", &encode_component(source_lang))
            .replace("{dst}", &encode_component(target_lang))
            .replace("{word}", &encode_component(word));

        Ok(url::Url::parse(&url)?.to_string())
    }
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}
