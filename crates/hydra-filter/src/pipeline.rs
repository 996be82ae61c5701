//! Update ingestion & filtering: the strictly-ordered pipeline
//! that turns one inbound update into a `drop` / `forward-normal` /
//! `forward-vip` / `cache-only` decision.
//!
//! This module is pure decision logic — no I/O. The caller (`hydra-monitor`)
//! owns the processed-set and the dedup engine and supplies them by
//! reference so the whole pipeline can be unit-tested without a transport.

use std::collections::HashSet;

use hydra_channels::InboundMessage;
use hydra_core::types::{Channel, ChannelCategory, ChannelId, VipUser};
use hydra_dedup::{DedupEngine, DuplicateReason, OrderedCache};

use crate::content_filter;

/// Static, operator-supplied filter configuration. Cheap to clone; expected
/// to be rebuilt whenever an operator command mutates one of these lists.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Sender ids considered "ours" — the self-loop guard drops anything
    /// they send.
    pub own_identities: HashSet<String>,
    /// Our own destination channels — never re-ingested.
    pub destination_channels: HashSet<ChannelId>,
    /// Blacklisted channel ids.
    pub blacklist: HashSet<ChannelId>,
    /// Non-empty ⇒ only these chats (by id or `@username`) are forward-eligible.
    pub source_channels: HashSet<String>,
    /// Non-empty ⇒ only these senders (by id or `@username`) are forward-eligible.
    pub from_users: HashSet<String>,
    /// Non-empty ⇒ text must contain at least one keyword (case-insensitive).
    pub keywords: Vec<String>,
}

/// The four observable outcomes of the ingest pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Drop { reason: String },
    ForwardNormal,
    ForwardVip,
    CacheOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestDecision {
    pub outcome: IngestOutcome,
    /// Whether the per-channel cache row (step 11) should be written,
    /// independent of the forward outcome.
    pub should_cache: bool,
}

impl IngestDecision {
    fn drop(reason: impl Into<String>) -> Self {
        Self {
            outcome: IngestOutcome::Drop { reason: reason.into() },
            should_cache: false,
        }
    }
}

fn matches_allowlist(set: &HashSet<String>, id: &str, username: Option<&str>) -> bool {
    if set.is_empty() {
        return true;
    }
    if set.contains(id) {
        return true;
    }
    if let Some(u) = username {
        let at = format!("@{u}");
        return set.contains(u) || set.contains(&at);
    }
    false
}

/// Run the full decision pipeline for one update.
///
/// `channel` is the registered source-channel record, if any; an
/// unregistered channel is treated as enabled with the default `Market`
/// category.
#[allow(clippy::too_many_arguments)]
pub fn decide(
    update: &InboundMessage,
    channel: Option<&Channel>,
    vip: Option<&VipUser>,
    config: &FilterConfig,
    processed: &mut OrderedCache<(String, String), ()>,
    dedup: &mut DedupEngine,
) -> IngestDecision {
    let key = (update.chat_id.clone(), update.message_id.clone());

    // 1. Reentry guard.
    if processed.contains(&key) {
        return IngestDecision::drop("reentry: already processed");
    }
    processed.insert(key, ());

    // 2. Self-loop guard.
    if config.own_identities.contains(&update.sender_id) {
        return IngestDecision::drop("self-loop: message from our own identity");
    }

    // 3. Destination guard.
    let chat_id = ChannelId::from(update.chat_id.clone());
    if config.destination_channels.contains(&chat_id) {
        return IngestDecision::drop("destination: chat is one of our own output channels");
    }

    // 4. Content filter.
    let verdict = content_filter::classify(&update.text);
    if verdict.drop {
        return IngestDecision::drop(verdict.reason.unwrap_or_else(|| "content filter".into()));
    }

    let is_vip = vip.map(|v| v.enabled).unwrap_or(false);

    // 5. Blacklist (VIP overrides).
    let blacklisted = config.blacklist.contains(&chat_id);
    if blacklisted && !is_vip {
        return IngestDecision::drop("blacklist: channel is blacklisted and sender is not VIP");
    }

    let category = channel.map(|c| c.category).unwrap_or(ChannelCategory::Market);
    let forward_eligible = {
        // 6. Source allow-list.
        let source_ok = matches_allowlist(
            &config.source_channels,
            &update.chat_id,
            update.chat_username.as_deref(),
        );
        // 7. From-user allow-list.
        let user_ok = matches_allowlist(
            &config.from_users,
            &update.sender_id,
            update.sender_username.as_deref(),
        );
        // 8. Keyword filter.
        let keyword_ok = config.keywords.is_empty()
            || config
                .keywords
                .iter()
                .any(|kw| update.text.to_lowercase().contains(&kw.to_lowercase()));

        source_ok && user_ok && keyword_ok
    };

    // 9. Content dedup (VIPs may legitimately repeat).
    let (is_dup, dup_reason) = dedup.is_duplicate(&update.text, &chat_id, true);
    if is_dup && !is_vip {
        let reason = match dup_reason {
            Some(DuplicateReason::Exact) => "dedup: exact duplicate".to_string(),
            Some(DuplicateReason::Near(sim)) => format!("dedup: near duplicate (similarity={sim:.3})"),
            None => "dedup: duplicate".to_string(),
        };
        return IngestDecision::drop(reason);
    }

    let should_cache = !matches!(
        category,
        ChannelCategory::Tech | ChannelCategory::Resource | ChannelCategory::Skip
    ) && update.text.chars().count() >= 20;

    if !forward_eligible {
        // Not a drop — the content is still legitimate and should still feed
        // the report cache. See DESIGN.md for why `cache-only` is resolved
        // this way rather than as an unreachable outcome.
        return IngestDecision {
            outcome: IngestOutcome::CacheOnly,
            should_cache,
        };
    }

    // 10. Routing.
    let outcome = if is_vip {
        IngestOutcome::ForwardVip
    } else {
        IngestOutcome::ForwardNormal
    };

    IngestDecision { outcome, should_cache }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_dedup::DedupEngineConfig;

    fn msg(chat_id: &str, message_id: &str, sender: &str, text: &str) -> InboundMessage {
        InboundMessage {
            channel: "telegram".into(),
            chat_id: chat_id.into(),
            chat_title: Some("Market News".into()),
            chat_username: Some("market_news".into()),
            sender_id: sender.into(),
            sender_name: Some("Trader".into()),
            sender_username: None,
            message_id: message_id.into(),
            text: text.into(),
            media: None,
            timestamp: "2026-07-28T08:00:00Z".into(),
            raw_payload: None,
        }
    }

    fn fresh() -> (OrderedCache<(String, String), ()>, DedupEngine) {
        (OrderedCache::new(1000), DedupEngine::new(DedupEngineConfig::default()))
    }

    #[test]
    fn reentry_guard_drops_repeat_message_id() {
        let (mut processed, mut dedup) = fresh();
        let config = FilterConfig::default();
        let update = msg("100", "1", "u1", "BTC breaks 100k on spot volume surge today");

        let first = decide(&update, None, None, &config, &mut processed, &mut dedup);
        assert!(matches!(first.outcome, IngestOutcome::ForwardNormal));

        let second = decide(&update, None, None, &config, &mut processed, &mut dedup);
        assert!(matches!(second.outcome, IngestOutcome::Drop { .. }));
    }

    #[test]
    fn exact_duplicate_text_is_dropped_on_second_message() {
        let (mut processed, mut dedup) = fresh();
        let config = FilterConfig::default();
        let first = msg("100", "1", "u1", "BTC breaks 100k on spot volume surge today");
        let second = msg("100", "2", "u1", "BTC breaks 100k on spot volume surge today");

        let d1 = decide(&first, None, None, &config, &mut processed, &mut dedup);
        assert!(matches!(d1.outcome, IngestOutcome::ForwardNormal));

        let d2 = decide(&second, None, None, &config, &mut processed, &mut dedup);
        assert!(matches!(d2.outcome, IngestOutcome::Drop { .. }));
        assert_eq!(dedup.stats().exact_duplicates, 1);
    }

    #[test]
    fn vip_overrides_blacklist_and_routes_to_vip_destination() {
        let (mut processed, mut dedup) = fresh();
        let mut config = FilterConfig::default();
        config.blacklist.insert(ChannelId::from("100"));

        let vip = VipUser {
            id: "u42".into(),
            username: None,
            name: "VIP Trader".into(),
            enabled: true,
        };

        let update = msg("100", "1", "u42", "BTC breaks 100k on spot volume surge today");
        let decision = decide(&update, None, Some(&vip), &config, &mut processed, &mut dedup);
        assert_eq!(decision.outcome, IngestOutcome::ForwardVip);
        assert!(decision.should_cache);
    }

    #[test]
    fn non_vip_blacklisted_channel_is_dropped() {
        let (mut processed, mut dedup) = fresh();
        let mut config = FilterConfig::default();
        config.blacklist.insert(ChannelId::from("100"));

        let update = msg("100", "1", "u1", "BTC breaks 100k on spot volume surge today");
        let decision = decide(&update, None, None, &config, &mut processed, &mut dedup);
        assert!(matches!(decision.outcome, IngestOutcome::Drop { .. }));
    }

    #[test]
    fn self_loop_guard_drops_own_identity() {
        let (mut processed, mut dedup) = fresh();
        let mut config = FilterConfig::default();
        config.own_identities.insert("bot_id".into());

        let update = msg("100", "1", "bot_id", "BTC breaks 100k on spot volume surge today");
        let decision = decide(&update, None, None, &config, &mut processed, &mut dedup);
        assert!(matches!(decision.outcome, IngestOutcome::Drop { .. }));
    }

    #[test]
    fn destination_channel_is_never_reingested() {
        let (mut processed, mut dedup) = fresh();
        let mut config = FilterConfig::default();
        config.destination_channels.insert(ChannelId::from("999"));

        let update = msg("999", "1", "u1", "BTC breaks 100k on spot volume surge today");
        let decision = decide(&update, None, None, &config, &mut processed, &mut dedup);
        assert!(matches!(decision.outcome, IngestOutcome::Drop { .. }));
    }

    #[test]
    fn keyword_filter_routes_non_matching_text_to_cache_only() {
        let (mut processed, mut dedup) = fresh();
        let mut config = FilterConfig::default();
        config.keywords = vec!["btc".into()];

        let update = msg("100", "1", "u1", "The weather today is calm and pleasant outside");
        let decision = decide(&update, None, None, &config, &mut processed, &mut dedup);
        assert_eq!(decision.outcome, IngestOutcome::CacheOnly);
    }

    #[test]
    fn tech_channel_never_caches() {
        let (mut processed, mut dedup) = fresh();
        let config = FilterConfig::default();
        let channel = Channel {
            id: ChannelId::from("100"),
            name: "Tech News".into(),
            enabled: true,
            category: ChannelCategory::Tech,
        };

        let update = msg("100", "1", "u1", "BTC breaks 100k on spot volume surge today");
        let decision = decide(&update, Some(&channel), None, &config, &mut processed, &mut dedup);
        assert!(!decision.should_cache);
    }

    #[test]
    fn short_text_never_caches() {
        let (mut processed, mut dedup) = fresh();
        let config = FilterConfig::default();
        let update = msg("100", "1", "u1", "too short");
        let decision = decide(&update, None, None, &config, &mut processed, &mut dedup);
        assert!(!decision.should_cache);
    }

    #[test]
    fn ad_content_is_dropped_before_dedup_runs() {
        let (mut processed, mut dedup) = fresh();
        let config = FilterConfig::default();
        let update = msg("100", "1", "u1", "扫码加微信领取限时优惠福利现在就联系我们");
        let decision = decide(&update, None, None, &config, &mut processed, &mut dedup);
        assert!(matches!(decision.outcome, IngestOutcome::Drop { .. }));
        assert_eq!(dedup.stats().total_checked, 0);
    }
}
