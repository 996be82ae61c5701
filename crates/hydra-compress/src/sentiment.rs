//! Bullish/bearish polarity.

use hydra_core::types::Sentiment;

const BULLISH: &[&str] = &[
    "涨停", "暴涨", "突破", "利好", "看多", "buy the dip", "breakout", "all-time high", "rally",
    "surge", "bullish", "moon", "长期持有", "加仓",
];
const BEARISH: &[&str] = &[
    "跌停", "暴跌", "破位", "利空", "看空", "sell-off", "crash", "bearish", "dump", "capitulation",
    "爆仓", "割肉", "清仓",
];

fn count_hits(lower: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| lower.contains(*w)).count()
}

/// Bullish iff bullish hits strictly outnumber bearish hits; symmetric for
/// bearish. Ties (including 0/0) are neutral.
pub fn classify(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let bull = count_hits(&lower, BULLISH);
    let bear = count_hits(&lower, BEARISH);
    if bull > bear {
        Sentiment::Bullish
    } else if bear > bull {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_bullish_hits_wins() {
        assert_eq!(classify("BTC breakout, rally continues, bullish momentum"), Sentiment::Bullish);
    }

    #[test]
    fn more_bearish_hits_wins() {
        assert_eq!(classify("market crash, bearish dump, capitulation everywhere"), Sentiment::Bearish);
    }

    #[test]
    fn equal_hits_is_neutral() {
        assert_eq!(classify("rally then crash, bullish then bearish"), Sentiment::Neutral);
    }

    #[test]
    fn no_hits_is_neutral() {
        assert_eq!(classify("Good morning, the weather today is calm"), Sentiment::Neutral);
    }
}
