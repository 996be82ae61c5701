//! Deterministic rule-based content classifier. Operates on raw
//! text only — no network calls. Four categories checked in a fixed order:
//! ad, adult, bot-admission, spam.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Ad,
    Adult,
    BotAdmission,
    Spam,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Ad => "ad",
            ContentCategory::Adult => "adult",
            ContentCategory::BotAdmission => "bot-admission",
            ContentCategory::Spam => "spam",
        }
    }
}

/// Outcome of running the content filter over a message body.
#[derive(Debug, Clone)]
pub struct FilterVerdict {
    pub drop: bool,
    pub reason: Option<String>,
}

impl FilterVerdict {
    fn clean() -> Self {
        Self { drop: false, reason: None }
    }

    fn hit(category: ContentCategory, matched: &str) -> Self {
        Self {
            drop: true,
            reason: Some(format!("{}: matched \"{}\"", category.as_str(), matched)),
        }
    }
}

const AD_KEYWORDS: &[&str] = &[
    "加微信", "加V", "加vx", "私聊", "代理招商", "限时优惠", "扫码", "免费领取", "一对一指导",
    "discount code", "promo code", "limited time offer", "dm me to join", "click the link below",
    "referral link", "sign up bonus", "use code",
];

const ADULT_KEYWORDS: &[&str] = &[
    "裸聊", "约炮", "同城约会", "成人直播", "色情", "性爱视频",
    "onlyfans", "nsfw content", "adult video", "escort service", "sex chat",
];

const BOT_ADMISSION_KEYWORDS: &[&str] = &[
    "我是机器人", "本消息由机器人自动发送", "自动转发",
    "i am a bot", "this is an automated message", "sent by a bot", "auto-generated message",
];

static INVITE_SHORTENER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(t\.me/joinchat|t\.me/\+|bit\.ly|tinyurl\.com|goo\.gl)/\S+").unwrap()
});
static CHAT_ID_LEAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)chat[_ ]?id\s*[:=]\s*-?\d{6,}").unwrap());

/// 20+ consecutive characters outside ASCII letters/digits/CJK/common
/// punctuation — a crude but effective "wall of symbols/emoji" detector.
static SYMBOL_RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{L}\p{N}\s.,!?:;'\u{201c}\u{201d}\u{2014}%$€¥-]{20,}").unwrap()
});

fn find_keyword<'a>(text: &str, lower: &str, keywords: &'a [&'a str]) -> Option<&'a str> {
    keywords.iter().find(|kw| {
        if kw.chars().any(|c| c.is_ascii()) && kw.chars().all(|c| c.is_ascii()) {
            lower.contains(&kw.to_lowercase())
        } else {
            text.contains(*kw)
        }
    }).copied()
}

/// Classify `text` against the four ordered categories. Returns the first
/// category that matches, or a clean verdict if none do.
pub fn classify(text: &str) -> FilterVerdict {
    let lower = text.to_lowercase();

    if let Some(m) = find_keyword(text, &lower, AD_KEYWORDS) {
        return FilterVerdict::hit(ContentCategory::Ad, m);
    }
    if let Some(m) = find_keyword(text, &lower, ADULT_KEYWORDS) {
        return FilterVerdict::hit(ContentCategory::Adult, m);
    }
    if let Some(m) = find_keyword(text, &lower, BOT_ADMISSION_KEYWORDS) {
        return FilterVerdict::hit(ContentCategory::BotAdmission, m);
    }
    if let Some(m) = INVITE_SHORTENER_RE.find(text) {
        return FilterVerdict::hit(ContentCategory::Spam, m.as_str());
    }
    if let Some(m) = CHAT_ID_LEAK_RE.find(text) {
        return FilterVerdict::hit(ContentCategory::Spam, m.as_str());
    }
    if let Some(m) = SYMBOL_RUN_RE.find(text) {
        return FilterVerdict::hit(ContentCategory::Spam, m.as_str());
    }

    FilterVerdict::clean()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_market_text_passes() {
        let v = classify("BTC breaks through 100k resistance on spot volume surge");
        assert!(!v.drop);
    }

    #[test]
    fn ad_keyword_is_caught() {
        let v = classify("扫码加微信领取限时优惠福利");
        assert!(v.drop);
        assert!(v.reason.unwrap().starts_with("ad"));
    }

    #[test]
    fn ad_keyword_latin_is_case_insensitive() {
        let v = classify("Use CODE now for a limited time offer on our store");
        assert!(v.drop);
    }

    #[test]
    fn adult_keyword_is_caught() {
        let v = classify("同城约会裸聊等你来撩");
        assert!(v.drop);
        assert!(v.reason.unwrap().starts_with("adult"));
    }

    #[test]
    fn bot_admission_is_caught() {
        let v = classify("This is an automated message sent by a bot every hour");
        assert!(v.drop);
        assert!(v.reason.unwrap().starts_with("bot-admission"));
    }

    #[test]
    fn invite_shortener_is_spam() {
        let v = classify("Join our group now: t.me/joinchat/AbCdEf12345");
        assert!(v.drop);
        assert!(v.reason.unwrap().starts_with("spam"));
    }

    #[test]
    fn chat_id_leak_is_spam() {
        let v = classify("internal debug info chat_id: -1001234567890 please ignore");
        assert!(v.drop);
    }

    #[test]
    fn long_symbol_run_is_spam() {
        let wall = "★".repeat(30);
        let v = classify(&wall);
        assert!(v.drop);
    }

    #[test]
    fn order_prefers_ad_over_spam_when_both_match() {
        // Contains both an ad keyword and an invite-shortener link; ad wins
        // because it is checked first.
        let v = classify("扫码加微信 then join t.me/joinchat/AbCdEf12345");
        assert!(v.drop);
        assert!(v.reason.unwrap().starts_with("ad"));
    }
}
