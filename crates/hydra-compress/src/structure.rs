//! Stage 4 — structure: turn a scored,
//! surviving `CachedMessage` into the report-ready artifact.

use std::collections::BTreeSet;

use hydra_core::types::{ChannelId, DateTimeUtc, MarketCategory, Sentiment};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{market_keywords, sentiment};

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://").expect("valid regex"));
static DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));
/// Crude keyword candidate extraction: CJK runs and Latin/digit words of at
/// least 2 characters, mirroring the hot-words tokenizer's fallback regex.
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[一-鿿]+|[A-Za-z][A-Za-z0-9]+").expect("valid regex"));

const MAX_KEYWORDS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredMessage {
    pub id: String,
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub sender: String,
    pub content: String,
    pub ts: DateTimeUtc,
    pub score: f64,
    pub categories: BTreeSet<MarketCategory>,
    pub keywords: Vec<String>,
    pub has_numbers: bool,
    pub has_url: bool,
    pub sentiment: Sentiment,
}

/// First 8 hex characters of the content's MD5 digest — stable, short,
/// collision-tolerant for a single report window's message count.
pub fn content_id(text: &str) -> String {
    hydra_dedup::simhash::exact_hash(text)[..8].to_string()
}

fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for m in WORD_RE.find_iter(text) {
        let word = m.as_str().to_lowercase();
        if word.chars().count() < 2 {
            continue;
        }
        if seen.insert(word.clone()) {
            out.push(word);
            if out.len() >= MAX_KEYWORDS {
                break;
            }
        }
    }
    out
}

pub fn structure(
    channel_id: &ChannelId,
    channel_name: &str,
    sender: &str,
    text: &str,
    ts: DateTimeUtc,
    score: f64,
) -> StructuredMessage {
    StructuredMessage {
        id: content_id(text),
        channel_id: channel_id.clone(),
        channel_name: channel_name.to_string(),
        sender: sender.to_string(),
        content: text.to_string(),
        ts,
        score,
        categories: market_keywords::categorize(text),
        keywords: extract_keywords(text),
        has_numbers: DIGIT_RE.is_match(text),
        has_url: URL_RE.is_match(text),
        sentiment: sentiment::classify(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_is_eight_hex_chars() {
        let id = content_id("BTC breaks 100k on spot volume surge");
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn identical_text_yields_identical_id() {
        assert_eq!(content_id("same text"), content_id("same text"));
    }

    #[test]
    fn categories_are_subset_of_closed_domain_set() {
        let allowed = BTreeSet::from([
            MarketCategory::Crypto,
            MarketCategory::AStock,
            MarketCategory::UsStock,
            MarketCategory::HkStock,
            MarketCategory::Futures,
            MarketCategory::Forex,
            MarketCategory::General,
        ]);
        let msg = structure(
            &ChannelId::from("@market"),
            "Market",
            "trader",
            "BTC breaks 100k resistance on spot volume surge, $100k target next",
            chrono::Utc::now(),
            0.5,
        );
        assert!(msg.categories.is_subset(&allowed));
        assert!(msg.has_numbers);
        assert!(!msg.has_url);
    }

    #[test]
    fn url_and_keywords_detected() {
        let msg = structure(
            &ChannelId::from("@market"),
            "Market",
            "trader",
            "Check the full chart at https://example.com/chart for btc analysis",
            chrono::Utc::now(),
            0.4,
        );
        assert!(msg.has_url);
        assert!(msg.keywords.iter().any(|k| k == "chart" || k == "btc"));
        assert!(msg.keywords.len() <= MAX_KEYWORDS);
    }
}
