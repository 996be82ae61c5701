//! Stage 1 — clean: drop messages that are too short, rejected
//! by the content filter, exact duplicates within this run, or emoji-only
//! residue, before scoring ever sees them.

use std::collections::HashSet;

use hydra_core::types::CachedMessage;
use hydra_dedup::simhash::{emoji_stripped_len, exact_hash};
use hydra_filter::content_filter;

const MIN_NON_EMOJI_RESIDUE: usize = 10;

/// Filter `messages` down to the ones worth scoring, in original order.
/// `seen_hashes` is scoped to a single compression run, distinct from the
/// dedup engine's process-lifetime cache.
pub fn clean(messages: &[CachedMessage], min_length: usize) -> Vec<CachedMessage> {
    let mut seen_hashes: HashSet<String> = HashSet::new();
    messages
        .iter()
        .filter(|m| {
            let len = m.text.chars().count();
            if len < min_length {
                return false;
            }
            if emoji_stripped_len(&m.text) < MIN_NON_EMOJI_RESIDUE {
                return false;
            }
            if content_filter::classify(&m.text).drop {
                return false;
            }
            let hash = exact_hash(&m.text);
            if !seen_hashes.insert(hash) {
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_core::types::ChannelId;

    fn msg(text: &str) -> CachedMessage {
        CachedMessage {
            channel_id: ChannelId::from("@market"),
            channel_name: "Market".into(),
            sender: "trader".into(),
            text: text.into(),
            ts: chrono::Utc::now(),
        }
    }

    #[test]
    fn short_messages_are_dropped() {
        let out = clean(&[msg("too short")], 15);
        assert!(out.is_empty());
    }

    #[test]
    fn ad_messages_are_dropped() {
        let out = clean(&[msg("limited time offer, click the link below to join now")], 15);
        assert!(out.is_empty());
    }

    #[test]
    fn duplicate_within_run_is_dropped() {
        let text = "BTC breaks through 100k resistance on huge spot volume today";
        let out = clean(&[msg(text), msg(text)], 15);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn emoji_only_residue_is_dropped() {
        let out = clean(&[msg("🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀🚀")], 15);
        assert!(out.is_empty());
    }

    #[test]
    fn clean_message_survives() {
        let out = clean(&[msg("BTC breaks 100k on spot volume surge, bullish momentum building")], 15);
        assert_eq!(out.len(), 1);
    }
}
