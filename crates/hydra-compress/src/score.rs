//! Stage 2 — score: six weighted signals summed into a score
//! in `[0, 1]`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::market_keywords;
use crate::sentiment;

static NUMERIC_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+%|\d+[$¥KMB万亿]").expect("valid regex"));
static ANY_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://").expect("valid regex"));

fn market_keyword_score(text: &str) -> f64 {
    let hits = market_keywords::domain_score(text);
    if hits == 0 {
        return 0.0;
    }
    (0.05 * hits as f64 + 0.10).min(0.30)
}

fn numeric_score(text: &str) -> f64 {
    if NUMERIC_UNIT_RE.is_match(text) {
        0.20
    } else if ANY_DIGIT_RE.is_match(text) {
        0.10
    } else {
        0.0
    }
}

fn length_score(text: &str) -> f64 {
    let len = text.chars().count();
    match len {
        50..=500 => 0.15,
        30..=49 | 501..=1000 => 0.10,
        n if n > 1000 => 0.05,
        _ => 0.0,
    }
}

fn url_score(text: &str) -> f64 {
    if URL_RE.is_match(text) {
        0.15
    } else {
        0.0
    }
}

fn polarity_score(text: &str) -> f64 {
    if sentiment::classify(text).is_neutral() {
        0.0
    } else {
        0.10
    }
}

/// Source credibility is reserved: always contributes 0 until a
/// per-channel trust score is wired up.
fn credibility_score(_text: &str) -> f64 {
    0.0
}

/// Compute the composite score for `text`, clamped to `[0, 1]` (the weights
/// already sum to at most 1.0, but clamping keeps the invariant explicit).
pub fn score(text: &str) -> f64 {
    let total = market_keyword_score(text)
        + numeric_score(text)
        + length_score(text)
        + url_score(text)
        + polarity_score(text)
        + credibility_score(text);
    total.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_always_in_unit_range() {
        for text in [
            "",
            "short",
            "BTC $100k breakout on nasdaq btc eth crypto rally https://example.com bullish",
            &"x".repeat(2000),
        ] {
            let s = score(text);
            assert!((0.0..=1.0).contains(&s), "score {s} out of range for {text:?}");
        }
    }

    #[test]
    fn rich_market_message_scores_higher_than_small_talk() {
        let rich = score("BTC breaks $100k resistance on massive spot volume, bullish momentum https://example.com/chart");
        let plain = score("Good morning everyone, hope you all have a calm and relaxing day");
        assert!(rich > plain);
    }

    #[test]
    fn numeric_with_unit_outscores_bare_digit() {
        assert!(numeric_score("gained 9.5%") > numeric_score("message 12345"));
    }
}
