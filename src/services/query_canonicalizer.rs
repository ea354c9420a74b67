//! 检索词规范化 - 业务能力层
//!
//! 把口语化的问题压缩成适合全文检索的关键词串。纯函数，无副作用。

use phf::phf_set;

/// 关键词上限
pub const MAX_QUERY_TOKENS: usize = 8;

/// 关键词最短长度（字符数）
const MIN_TOKEN_CHARS: usize = 3;

/// 停用词：冠词、连词、介词、疑问词、助动词、代词、情态动词
static STOP_WORDS: phf::Set<&'static str> = phf_set! {
    "the", "a", "an", "and", "or", "but", "so", "to", "of", "in", "on", "for", "with", "as",
    "at", "by",
    "is", "are", "was", "were", "be", "been", "being", "do", "does", "did",
    "why", "what", "how", "when", "where", "which", "who",
    "this", "that", "these", "those", "it", "we", "you", "i", "they",
    "can", "could", "should", "would", "may", "might",
};

/// 规范化检索词
///
/// 小写 → 非单词字符替换为空格 → 去掉过短词和停用词 → 保序去重 → 最多 8 个。
/// 全部被过滤时退回到去掉首尾空白的原文。
///
/// # 示例
/// ```
/// use lecture_companion::services::canonicalize;
///
/// assert_eq!(canonicalize("What is backprop, and why do we need it?"), "backprop need");
/// ```
pub fn canonicalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = Vec::new();
    for token in cleaned.split_whitespace() {
        if token.chars().count() < MIN_TOKEN_CHARS || STOP_WORDS.contains(token) {
            continue;
        }
        if !tokens.contains(&token) {
            tokens.push(token);
        }
        if tokens.len() >= MAX_QUERY_TOKENS {
            break;
        }
    }

    if tokens.is_empty() {
        text.trim().to_string()
    } else {
        tokens.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_stop_words_and_short_tokens() {
        assert_eq!(
            canonicalize("What is backprop, and why do we need it?"),
            "backprop need"
        );
    }

    #[test]
    fn test_dedup_preserves_first_occurrence() {
        assert_eq!(
            canonicalize("Gradient descent vs. stochastic GRADIENT descent"),
            "gradient descent stochastic"
        );
    }

    #[test]
    fn test_caps_at_eight_tokens() {
        let canonical = canonicalize(
            "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo",
        );
        assert_eq!(
            canonical,
            "alpha bravo charlie delta echo foxtrot golf hotel"
        );
    }

    #[test]
    fn test_falls_back_to_trimmed_input() {
        assert_eq!(canonicalize("  Why is it?  "), "Why is it?");
        assert_eq!(canonicalize("   "), "");
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "What is backprop, and why do we need it?",
            "How does the KL-divergence relate to cross_entropy loss?",
            "Why is it?",
        ] {
            let once = canonicalize(input);
            assert_eq!(canonicalize(&once), once);
        }
    }

    #[test]
    fn test_underscore_and_digits_are_word_characters() {
        assert_eq!(
            canonicalize("explain cross_entropy for resnet50"),
            "explain cross_entropy resnet50"
        );
    }
}
