//! 词典查询的数据类型

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{helpers::validation_error, ScrapeResult};

/// 每次查询最多保留的词条数
pub const MAX_ENTRIES: usize = 6;

/// 缓存键：(源语言, 目标语言, 小写单词)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub source_lang: String,
    pub target_lang: String,
    pub normalized_word: String,
}

impl LookupKey {
    /// 校验参数并生成缓存键
    ///
    /// 空字符串或纯空白视为参数缺失。
    pub fn new(word: &str, source_lang: &str, target_lang: &str) -> ScrapeResult<Self> {
        let mut missing = Vec::new();
        if word.trim().is_empty() {
            missing.push("word");
        }
        if source_lang.trim().is_empty() {
            missing.push("src");
        }
        if target_lang.trim().is_empty() {
            missing.push("dst");
        }

        if !missing.is_empty() {
            return Err(validation_error(format!(
                "The \"word\", \"src\" and \"dst\" parameters are required (missing: {})",
                missing.join(", ")
            )));
        }

        Ok(Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            normalized_word: word.to_lowercase(),
        })
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.source_lang, self.target_lang, self.normalized_word
        )
    }
}

/// 双语例句
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub source: String,
    pub target: String,
}

/// 单个翻译词条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    pub translation: String,
    pub grammar: Option<String>,
    pub concept_type: Option<String>,
    /// 最多一个例句
    pub examples: Vec<Example>,
}

/// 一次查询的结果，按网站原有顺序排列
///
/// 构造时去重（保留首次出现）并截断到 [`MAX_ENTRIES`]。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupResult(Vec<TranslationEntry>);

impl LookupResult {
    pub fn from_entries(entries: impl IntoIterator<Item = TranslationEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|entry| !entry.translation.is_empty())
            .filter(|entry| seen.insert(entry.translation.clone()))
            .take(MAX_ENTRIES)
            .collect();
        Self(entries)
    }

    pub fn entries(&self) -> &[TranslationEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<TranslationEntry> {
        self.0
    }
}
