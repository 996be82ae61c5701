//! Per-update ingestion handler: wires the filter pipeline to
//! persistence and to the outbound channel, serialized per-chat via a
//! mailbox lock.

use std::sync::Arc;

use chrono::Utc;
use hydra_channels::{Channel as _, ChannelManager, InboundMessage, MessageFormat, OutboundMessage};
use hydra_core::types::CachedMessage;
use hydra_filter::pipeline::{decide, IngestOutcome};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::format::render_forward;
use crate::state::AppState;

/// Handle one inbound update end-to-end. Never returns an error: every
/// failure from this point on is logged and swallowed — a bad update must
/// never stop the ingest loop.
pub async fn handle_update(state: &AppState, channels: &ChannelManager, update: InboundMessage) {
    let mailbox: Arc<AsyncMutex<()>> = state
        .mailboxes
        .entry(update.chat_id.clone())
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone();
    let _guard = mailbox.lock().await;

    let channel = match state.db.get_channel(&update.chat_id) {
        Ok(c) => c,
        Err(e) => {
            warn!(chat_id = %update.chat_id, error = %e, "failed to look up channel, treating as unregistered");
            None
        }
    };
    let vip = match state.db.get_vip(&update.sender_id) {
        Ok(v) => v,
        Err(e) => {
            warn!(sender_id = %update.sender_id, error = %e, "failed to look up VIP status");
            None
        }
    };

    let decision = {
        let filter = state.filter.lock().unwrap();
        let mut processed = state.processed.lock().unwrap();
        let mut dedup = state.dedup.lock().unwrap();
        decide(&update, channel.as_ref(), vip.as_ref(), &filter, &mut processed, &mut dedup)
    };

    info!(
        chat_id = %update.chat_id,
        message_id = %update.message_id,
        outcome = ?decision.outcome,
        "ingest decision"
    );

    let target = match &decision.outcome {
        IngestOutcome::ForwardVip => state
            .config
            .monitor
            .vip_target_channel
            .clone()
            .or_else(|| state.config.monitor.target_channel.clone()),
        IngestOutcome::ForwardNormal => state.config.monitor.target_channel.clone(),
        IngestOutcome::Drop { reason } => {
            info!(chat_id = %update.chat_id, message_id = %update.message_id, reason, "dropped");
            None
        }
        IngestOutcome::CacheOnly => None,
    };

    if let Some(target) = target {
        let html = render_forward(&update, vip.as_ref());
        let outbound = OutboundMessage {
            channel: update.channel.clone(),
            recipient_id: target,
            content: html,
            format: MessageFormat::Html,
            link_preview: true,
        };
        if let Some(ch) = channels.get(&update.channel) {
            if let Err(e) = ch.send(&outbound).await {
                warn!(chat_id = %update.chat_id, error = %e, "forward send failed");
            }
        }
        if let Err(e) = state.db.record_history(&update.sender_id, &update.chat_id, "forwarded", Utc::now()) {
            warn!(error = %e, "failed to record forward history");
        }
    }

    if decision.should_cache {
        let cached = CachedMessage {
            channel_id: update.chat_id.as_str().into(),
            channel_name: update.chat_title.clone().unwrap_or_else(|| update.chat_id.clone()),
            sender: update.sender_name.clone().unwrap_or_else(|| update.sender_id.clone()),
            text: update.text.clone(),
            ts: Utc::now(),
        };
        if let Err(e) = state.db.insert_cached_message(&cached) {
            warn!(chat_id = %update.chat_id, error = %e, "failed to cache message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn test_state() -> AppState {
        let config = hydra_core::config::HydraConfig::default();
        AppState::new(config, Connection::open_in_memory().unwrap(), Connection::open_in_memory().unwrap()).unwrap()
    }

    fn update(chat_id: &str, message_id: &str, text: &str) -> InboundMessage {
        InboundMessage {
            channel: "telegram".into(),
            chat_id: chat_id.into(),
            chat_title: Some("Market News".into()),
            chat_username: Some("market_news".into()),
            sender_id: "u1".into(),
            sender_name: Some("Trader".into()),
            sender_username: None,
            message_id: message_id.into(),
            text: text.into(),
            media: None,
            timestamp: "2026-07-28T08:00:00Z".into(),
            raw_payload: None,
        }
    }

    #[tokio::test]
    async fn forward_worthy_update_is_cached() {
        let state = test_state();
        let channels = ChannelManager::new();
        handle_update(&state, &channels, update("100", "1", "BTC breaks 100k resistance on spot volume surge today")).await;
        assert_eq!(state.db.cached_messages("100").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reentry_is_not_double_cached() {
        let state = test_state();
        let channels = ChannelManager::new();
        let u = update("100", "1", "BTC breaks 100k resistance on spot volume surge today");
        handle_update(&state, &channels, u.clone()).await;
        handle_update(&state, &channels, u).await;
        assert_eq!(state.db.cached_messages("100").unwrap().len(), 1);
    }
}
