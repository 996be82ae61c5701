use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a user (UUIDv7 — time-sortable for easier log correlation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new() -> Self {
        // UUIDv7 includes timestamp — sortable and traceable in logs
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifies which agent instance handles a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// The default single-agent setup uses "main".
    pub fn main() -> Self {
        Self("main".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// User-centric session key.
///
/// Sessions belong to users, not channels, so the same person reaching the
/// bot from two different chat platforms shares one conversation.
/// Format: `user:{user_id}:agent:{agent_id}:{session_name}`
///
/// Alice on Telegram + Alice on Discord = same session `user:u2:agent:main:main`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn for_user(user_id: &UserId, agent_id: &AgentId, session: &str) -> Self {
        Self(format!("user:{}:agent:{}:{}", user_id, agent_id, session))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-connection identifier (random UUID, not persisted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnId(pub String);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User role hierarchy: admin > user > child.
///
/// Controls which permissions are available without a DB lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
    Child,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn is_child(&self) -> bool {
        matches!(self, UserRole::Child)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
            UserRole::Child => write!(f, "child"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            "child" => Ok(UserRole::Child),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Identifies an upstream source channel (e.g. `@somechannel` or a numeric
/// chat id rendered as a string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifies a persisted chat conversation (UUIDv7 — sortable by creation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChatId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The six closed market domains plus the fallback bucket. Closed set: a
/// `StructuredMessage`'s categories are always a subset of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCategory {
    Crypto,
    AStock,
    UsStock,
    HkStock,
    Futures,
    Forex,
    General,
}

impl MarketCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCategory::Crypto => "crypto",
            MarketCategory::AStock => "a_stock",
            MarketCategory::UsStock => "us_stock",
            MarketCategory::HkStock => "hk_stock",
            MarketCategory::Futures => "futures",
            MarketCategory::Forex => "forex",
            MarketCategory::General => "general",
        }
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A channel's editorial category, distinct from the market taxonomy above.
/// `Tech`/`Resource`/`Skip` channels never produce a scheduled report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelCategory {
    #[default]
    Market,
    News,
    Tech,
    Resource,
    Skip,
}

impl fmt::Display for ChannelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelCategory::Market => "market",
            ChannelCategory::News => "news",
            ChannelCategory::Tech => "tech",
            ChannelCategory::Resource => "resource",
            ChannelCategory::Skip => "skip",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ChannelCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "market" => Ok(ChannelCategory::Market),
            "news" => Ok(ChannelCategory::News),
            "tech" => Ok(ChannelCategory::Tech),
            "resource" => Ok(ChannelCategory::Resource),
            "skip" => Ok(ChannelCategory::Skip),
            other => Err(format!("unknown channel category: {}", other)),
        }
    }
}

/// Sentiment polarity derived from bullish/bearish keyword counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn is_neutral(&self) -> bool {
        matches!(self, Sentiment::Neutral)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Bearish => "bearish",
            Sentiment::Neutral => "neutral",
        };
        write!(f, "{}", s)
    }
}

/// An upstream source channel. Created by operator
/// command or env config; disabled rather than destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub enabled: bool,
    pub category: ChannelCategory,
}

/// A sender whose messages bypass the blacklist and route to the VIP
/// destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VipUser {
    pub id: String,
    pub username: Option<String>,
    pub name: String,
    pub enabled: bool,
}

/// A blacklisted channel id. Messages from it are dropped unless the sender
/// is an enabled [`VipUser`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub id: ChannelId,
    pub name: String,
}

/// A raw upstream message accumulated between report windows. Destroyed on report emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedMessage {
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub sender: String,
    pub text: String,
    pub ts: DateTimeUtc,
}

/// Re-exported so downstream crates don't each pull in `chrono` just to
/// spell this type.
pub type DateTimeUtc = chrono::DateTime<chrono::Utc>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_category_round_trips_through_display_and_from_str() {
        for cat in [
            ChannelCategory::Market,
            ChannelCategory::News,
            ChannelCategory::Tech,
            ChannelCategory::Resource,
            ChannelCategory::Skip,
        ] {
            let s = cat.to_string();
            assert_eq!(s.parse::<ChannelCategory>().unwrap(), cat);
        }
    }

    #[test]
    fn chat_id_new_is_unique() {
        assert_ne!(ChatId::new(), ChatId::new());
    }

    #[test]
    fn sentiment_default_is_neutral() {
        assert!(Sentiment::default().is_neutral());
    }
}
