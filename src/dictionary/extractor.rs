//! 词条提取
//!
//! 在页面 HTML 快照上运行，只读不改。

use std::sync::Arc;

use scraper::{ElementRef, Html};

use super::schema::PageSchema;
use super::types::{Example, LookupResult, TranslationEntry, MAX_ENTRIES};
use crate::parsers::html::{normalize_quotes, text_content, CssSelector};

/// 词条提取器
#[derive(Debug, Clone)]
pub struct Extractor {
    schema: Arc<PageSchema>,
}

impl Extractor {
    pub fn new(schema: Arc<PageSchema>) -> Self {
        Self { schema }
    }

    /// 从页面快照提取词条
    ///
    /// 选择器一个都没命中时返回空结果，这仍是一次成功的查询。
    pub fn extract(&self, html: &str) -> LookupResult {
        let document = Html::parse_document(html);
        let root = self
            .schema
            .content_container
            .first_in(&document)
            .unwrap_or_else(|| document.root_element());

        let entries: Vec<TranslationEntry> = self
            .schema
            .entry_item
            .select_all(root)
            .into_iter()
            .take(MAX_ENTRIES)
            .filter_map(|item| self.extract_entry(item))
            .collect();

        LookupResult::from_entries(entries)
    }

    fn extract_entry(&self, item: ElementRef<'_>) -> Option<TranslationEntry> {
        let translation = first_text(&self.schema.phrase, item)?;

        let grammar = self
            .schema
            .grammar
            .select_all(item)
            .into_iter()
            .map(|node| text_content(node).trim().to_string())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let grammar = (!grammar.is_empty()).then_some(grammar);

        let concept_type = self
            .schema
            .concept_type
            .iter()
            .find_map(|selector| selector.select_first(item))
            .map(|node| text_content(node).trim().to_string())
            .filter(|text| !text.is_empty());

        let examples = self.extract_example(item).into_iter().collect();

        Some(TranslationEntry {
            translation,
            grammar,
            concept_type,
            examples,
        })
    }

    fn extract_example(&self, item: ElementRef<'_>) -> Option<Example> {
        let paragraphs = self.schema.example_paragraph.select_all(item);
        if paragraphs.len() < 2 {
            return None;
        }

        let source = normalize_quotes(text_content(paragraphs[0]).trim());
        let target = normalize_quotes(text_content(paragraphs[1]).trim());

        if source.is_empty() || target.is_empty() || source == target {
            return None;
        }

        Some(Example { source, target })
    }
}

fn first_text(selector: &CssSelector, scope: ElementRef<'_>) -> Option<String> {
    let node = selector.select_first(scope)?;
    let text = text_content(node).trim().to_string();
    (!text.is_empty()).then_some(text)
}
