//! Keyword lookup across the six closed market domains.

use std::collections::BTreeSet;

use hydra_core::types::MarketCategory;

const CRYPTO: &[&str] = &[
    "btc", "eth", "bitcoin", "ethereum", "crypto", "比特币", "以太坊", "加密货币", "链上", "defi",
    "binance", "sol", "solana", "usdt", "stablecoin", "空投", "合约爆仓",
];
const A_STOCK: &[&str] = &[
    "a股", "沪指", "深指", "创业板", "涨停", "跌停", "龙虎榜", "北向资金", "科创板", "沪深300",
];
const US_STOCK: &[&str] = &[
    "nasdaq", "s&p", "dow jones", "nyse", "美股", "纳斯达克", "道指", "标普", "earnings call",
];
const HK_STOCK: &[&str] = &["hkex", "恒生指数", "港股", "南向资金", "hang seng"];
const FUTURES: &[&str] = &[
    "futures", "期货", "原油期货", "黄金期货", "contract roll", "open interest", "期指",
];
const FOREX: &[&str] = &[
    "forex", "fx", "usd/jpy", "eur/usd", "外汇", "汇率", "人民币中间价", "美元指数",
];

fn count_hits(lower: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| lower.contains(*w)).count()
}

/// All market categories whose keyword set has at least one hit in `text`,
/// falling back to `{General}` when none match.
pub fn categorize(text: &str) -> BTreeSet<MarketCategory> {
    let lower = text.to_lowercase();
    let mut hits = BTreeSet::new();

    for (words, cat) in [
        (CRYPTO, MarketCategory::Crypto),
        (A_STOCK, MarketCategory::AStock),
        (US_STOCK, MarketCategory::UsStock),
        (HK_STOCK, MarketCategory::HkStock),
        (FUTURES, MarketCategory::Futures),
        (FOREX, MarketCategory::Forex),
    ] {
        if count_hits(&lower, words) > 0 {
            hits.insert(cat);
        }
    }

    if hits.is_empty() {
        hits.insert(MarketCategory::General);
    }
    hits
}

/// `categorize(text) != {General}`.
pub fn is_market_relevant(text: &str) -> bool {
    categorize(text) != BTreeSet::from([MarketCategory::General])
}

/// Per-domain hit counts, used by the channel-category auto-detector
/// which compares a market/news score against a
/// tech/resource score.
pub fn domain_score(text: &str) -> usize {
    let lower = text.to_lowercase();
    CRYPTO
        .iter()
        .chain(A_STOCK)
        .chain(US_STOCK)
        .chain(HK_STOCK)
        .chain(FUTURES)
        .chain(FOREX)
        .filter(|w| lower.contains(*w))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_keyword_categorizes_as_crypto() {
        let cats = categorize("BTC breaks 100k resistance on spot volume surge");
        assert!(cats.contains(&MarketCategory::Crypto));
    }

    #[test]
    fn no_keyword_falls_back_to_general() {
        let cats = categorize("Good morning everyone, hope you have a calm day");
        assert_eq!(cats, BTreeSet::from([MarketCategory::General]));
        assert!(!is_market_relevant("Good morning everyone, hope you have a calm day"));
    }

    #[test]
    fn multi_domain_text_hits_both_categories() {
        let cats = categorize("纳斯达克 vs 比特币 today: nasdaq tech selloff drags btc lower");
        assert!(cats.contains(&MarketCategory::Crypto));
        assert!(cats.contains(&MarketCategory::UsStock));
    }
}
