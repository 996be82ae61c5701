//! Orchestrates the five-stage compression pipeline:
//! clean → score → select → structure → aggregate.

use std::collections::HashMap;

use hydra_core::types::{CachedMessage, MarketCategory, Sentiment};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{clean, score, structure::structure, structure::StructuredMessage};

#[derive(Debug, Clone, Copy)]
pub struct CompressorConfig {
    pub min_length: usize,
    pub max_messages: usize,
    pub score_threshold: f64,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            min_length: 15,
            max_messages: 50,
            score_threshold: 0.20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressionResult {
    pub channel: String,
    pub original_count: usize,
    pub compressed_count: usize,
    pub ratio: f64,
    pub messages: Vec<StructuredMessage>,
    pub hot_words: HashMap<String, u32>,
    pub category_stats: HashMap<MarketCategory, u32>,
    pub sentiment_stats: HashMap<Sentiment, u32>,
}

/// Run the full pipeline over one channel's accumulated cache.
///
/// `channel` is a display label only; the structured messages themselves
/// carry the canonical `ChannelId`.
pub fn compress(channel: &str, messages: &[CachedMessage], config: &CompressorConfig) -> CompressionResult {
    let original_count = messages.len();
    if original_count == 0 {
        return CompressionResult {
            channel: channel.to_string(),
            ..Default::default()
        };
    }

    let cleaned = clean::clean(messages, config.min_length);
    debug!(channel, original = original_count, cleaned = cleaned.len(), "compression: stage 1 clean complete");

    // Stage 2 — score, carried alongside each message for stage 3's sort.
    let mut scored: Vec<(f64, &CachedMessage)> = cleaned
        .iter()
        .map(|m| (score::score(&m.text), m))
        .filter(|(s, _)| *s >= config.score_threshold)
        .collect();

    // Stage 3 — select: sort desc by score, keep the top N.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(config.max_messages);

    // Stage 4 — structure.
    let structured: Vec<StructuredMessage> = scored
        .into_iter()
        .map(|(s, m)| structure(&m.channel_id, &m.channel_name, &m.sender, &m.text, m.ts, s))
        .collect();

    let compressed_count = structured.len();
    let ratio = if original_count == 0 {
        0.0
    } else {
        compressed_count as f64 / original_count as f64
    };

    // Stage 5 — aggregate.
    let mut hot_words: HashMap<String, u32> = HashMap::new();
    let mut category_stats: HashMap<MarketCategory, u32> = HashMap::new();
    let mut sentiment_stats: HashMap<Sentiment, u32> = HashMap::new();

    for m in &structured {
        for kw in &m.keywords {
            *hot_words.entry(kw.clone()).or_insert(0) += 1;
        }
        for cat in &m.categories {
            *category_stats.entry(*cat).or_insert(0) += 1;
        }
        *sentiment_stats.entry(m.sentiment).or_insert(0) += 1;
    }

    // Keep only the top 20 hot words by count (ties broken by insertion order).
    let mut ranked: Vec<(String, u32)> = hot_words.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(20);
    let hot_words: HashMap<String, u32> = ranked.into_iter().collect();

    info!(
        channel,
        original_count,
        compressed_count,
        ratio,
        "compression run complete"
    );

    CompressionResult {
        channel: channel.to_string(),
        original_count,
        compressed_count,
        ratio,
        messages: structured,
        hot_words,
        category_stats,
        sentiment_stats,
    }
}

/// Render a `CompressionResult` as a prompt-ready markdown digest: the body
/// of the AI summary call in the scheduled report.
pub fn format_for_prompt(result: &CompressionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# {} — {} of {} messages kept ({:.0}% compression)\n\n",
        result.channel,
        result.compressed_count,
        result.original_count,
        result.ratio * 100.0
    ));

    if !result.category_stats.is_empty() {
        out.push_str("## Categories\n");
        let mut cats: Vec<_> = result.category_stats.iter().collect();
        cats.sort_by(|a, b| b.1.cmp(a.1));
        for (cat, count) in cats {
            out.push_str(&format!("- {cat}: {count}\n"));
        }
        out.push('\n');
    }

    if !result.sentiment_stats.is_empty() {
        out.push_str("## Sentiment\n");
        let mut sentiments: Vec<_> = result.sentiment_stats.iter().collect();
        sentiments.sort_by(|a, b| b.1.cmp(a.1));
        for (s, count) in sentiments {
            out.push_str(&format!("- {s}: {count}\n"));
        }
        out.push('\n');
    }

    out.push_str("## Messages\n");
    for m in &result.messages {
        let emoji = match m.sentiment {
            Sentiment::Bullish => "📈",
            Sentiment::Bearish => "📉",
            Sentiment::Neutral => "➖",
        };
        let cat = m
            .categories
            .iter()
            .next()
            .map(|c| c.as_str())
            .unwrap_or("general");
        let mut content = m.content.clone();
        if content.chars().count() > 300 {
            content = content.chars().take(300).collect::<String>() + "…";
        }
        out.push_str(&format!(
            "[{}] [{cat}] {emoji} {}: {}\n",
            m.ts.format("%H:%M"),
            m.sender,
            content
        ));
    }

    out
}
