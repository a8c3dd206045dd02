/// 需要统一为 ASCII 双引号的弯引号
pub const SMART_QUOTES: &[char] = &['\u{201C}', '\u{201D}', '\u{201E}', '\u{201F}'];

/// 将弯引号统一替换为 `"`
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| if SMART_QUOTES.contains(&c) { '"' } else { c })
        .collect()
}
