//! Channel-category auto-detection: a keyword-score
//! classifier over four word sets (market, news, tech, resource) with a
//! 1.5× dominance threshold deciding whether the channel is editorial
//! (tech/resource, no reports) or report-worthy (market/news).
//!
//! `market_keywords::domain_score` already covers the market word sets
//!; this module adds the news/tech/resource lists the
//! compression pipeline has no use for.

use hydra_compress::market_keywords;
use hydra_core::types::ChannelCategory;

const NEWS: &[&str] = &[
    "breaking", "headline", "reuters", "bloomberg", "afp", "快讯", "突发", "报道", "新华社",
    "according to", "sources say", "据悉", "消息人士",
];

const TECH: &[&str] = &[
    "github", "open source", "开源", "api", "sdk", "framework", "rust", "python", "kubernetes",
    "docker", "编译", "代码", "算法", "llm", "神经网络", "编程",
];

const RESOURCE: &[&str] = &[
    "download", "下载", "网盘", "资源分享", "教程", "tutorial", "pdf", "百度网盘", "磁力链接",
    "invite link", "邀请链接",
];

fn count_hits(lower: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| lower.contains(*w)).count()
}

struct Scores {
    market: usize,
    news: usize,
    tech: usize,
    resource: usize,
}

fn score(text: &str) -> Scores {
    let lower = text.to_lowercase();
    Scores {
        market: market_keywords::domain_score(text),
        news: count_hits(&lower, NEWS),
        tech: count_hits(&lower, TECH),
        resource: count_hits(&lower, RESOURCE),
    }
}

/// Classify a channel from a sample of its cached message texts.
///
/// Strictly `>` at the 1.5× boundary: a tie resolves to market/news —
/// exactly 1.5× is not a tech/resource verdict. An empty sample classifies
/// as `Market`, the existing default.
pub fn classify(samples: &[String]) -> ChannelCategory {
    let mut market = 0usize;
    let mut news = 0usize;
    let mut tech = 0usize;
    let mut resource = 0usize;

    for text in samples {
        let s = score(text);
        market += s.market;
        news += s.news;
        tech += s.tech;
        resource += s.resource;
    }

    let market_or_news = (market + news) as f64;
    let tech_or_resource = (tech + resource) as f64;

    if tech_or_resource > 1.5 * market_or_news {
        if tech >= resource {
            ChannelCategory::Tech
        } else {
            ChannelCategory::Resource
        }
    } else if news > market {
        ChannelCategory::News
    } else {
        ChannelCategory::Market
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_defaults_to_market() {
        assert_eq!(classify(&[]), ChannelCategory::Market);
    }

    #[test]
    fn market_heavy_channel_stays_market() {
        let samples: Vec<String> = (0..20)
            .map(|i| format!("BTC breaks ${i}000 resistance on spot volume surge"))
            .collect();
        assert_eq!(classify(&samples), ChannelCategory::Market);
    }

    #[test]
    fn tech_heavy_channel_flips_to_tech() {
        let samples: Vec<String> = (0..20)
            .map(|i| format!("New rust framework release on github, open source api v{i}"))
            .collect();
        assert_eq!(classify(&samples), ChannelCategory::Tech);
    }

    #[test]
    fn resource_heavy_channel_flips_to_resource() {
        let samples: Vec<String> = (0..20)
            .map(|_| "download link: 百度网盘 tutorial pdf 资源分享".to_string())
            .collect();
        assert_eq!(classify(&samples), ChannelCategory::Resource);
    }

    #[test]
    fn exactly_at_threshold_does_not_flip() {
        // "btc eth" -> market_score = 2 (two crypto keyword hits), no news/tech/resource hits.
        // "github api rust" -> tech_score = 3 (three tech keyword hits), no other hits.
        // tech_or_resource (3) == 1.5 * market_or_news (2) exactly: the boundary is strict
        // `>`, so this must NOT classify as Tech.
        let samples = vec!["btc eth".to_string(), "github api rust".to_string()];
        let s0 = score(&samples[0]);
        let s1 = score(&samples[1]);
        assert_eq!(s0.market + s1.market + s0.news + s1.news, 2);
        assert_eq!(s0.tech + s1.tech + s0.resource + s1.resource, 3);
        assert_eq!(classify(&samples), ChannelCategory::Market);
    }
}
