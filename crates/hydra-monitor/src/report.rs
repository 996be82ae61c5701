//! Scheduled report generation: a twice-daily task that, for
//! every channel with cached messages, resolves its category, compresses
//! the cache, asks the AI gateway for a narrative summary, writes the
//! report artifacts, sends a short HTML digest, and clears the cache.

use std::time::Duration;

use chrono::Utc;
use hydra_channels::{Channel as _, ChannelManager, MessageFormat, OutboundMessage};
use hydra_compress::{compress, format_for_prompt, CompressorConfig};
use hydra_core::types::ChannelCategory;
use hydra_gateway::{ChatRequest, Message};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::category;
use crate::export::write_report;
use crate::state::AppState;

/// Minimum/maximum inter-channel jitter.
const JITTER_MIN_SECS: u64 = 60;
const JITTER_MAX_SECS: u64 = 180;

/// Telegram-facing summary truncation limit.
const SUMMARY_MAX_CHARS: usize = 4000;

/// Drive the scheduler for the process lifetime: sleep until the next
/// Asia/Shanghai 08:00/20:00 wake, run one report pass, repeat, until
/// `cancel` fires.
pub async fn run_scheduler(state: &AppState, channels: &ChannelManager, cancel: CancellationToken) {
    loop {
        let now = Utc::now();
        let wake = hydra_core::timezone::next_wake(now);
        let sleep_for = (wake - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {
                info!("scheduler: waking for scheduled report pass");
                run_report_pass(state, channels).await;
            }
            _ = cancel.cancelled() => {
                info!("scheduler: cancellation requested, stopping");
                return;
            }
        }
    }
}

/// Run one pass over every channel with cached messages.
pub async fn run_report_pass(state: &AppState, channels: &ChannelManager) {
    let channel_ids = match state.db.channels_with_cache() {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "scheduler: failed to list channels with cache, aborting pass");
            return;
        }
    };

    for (i, channel_id) in channel_ids.iter().enumerate() {
        if let Err(e) = process_channel(state, channels, channel_id.as_str()).await {
            error!(channel_id = %channel_id, error = %e, "scheduler: report generation failed for channel");
        }

        if i + 1 < channel_ids.len() {
            let jitter = rand::thread_rng().gen_range(JITTER_MIN_SECS..=JITTER_MAX_SECS);
            tokio::time::sleep(Duration::from_secs(jitter)).await;
        }
    }
}

async fn process_channel(
    state: &AppState,
    channels: &ChannelManager,
    channel_id: &str,
) -> crate::error::Result<()> {
    let channel = state.db.get_channel(channel_id)?;
    let channel_name = channel.as_ref().map(|c| c.name.clone()).unwrap_or_else(|| channel_id.to_string());

    // Step 1: auto-detect category if still the default.
    let category = match &channel {
        Some(c) if c.category != ChannelCategory::Market => c.category,
        _ => {
            let samples = state.db.sample_texts(channel_id, 50)?;
            let detected = category::classify(&samples);
            if detected != ChannelCategory::Market {
                state.db.ensure_channel(channel_id, &channel_name)?;
                state.db.set_channel_category(channel_id, detected)?;
            }
            detected
        }
    };

    // Step 2: editorial channels never produce a report.
    if matches!(category, ChannelCategory::Tech | ChannelCategory::Resource | ChannelCategory::Skip) {
        info!(channel_id, %category, "scheduler: editorial channel, clearing cache without a report");
        state.db.clear_cache(channel_id)?;
        return Ok(());
    }

    // Step 3: compress, summarize, export, send, clear.
    let messages = state.db.cached_messages(channel_id)?;
    if messages.is_empty() {
        return Ok(());
    }

    let today = Utc::now().date_naive();
    for m in &messages {
        state.hotwords.add_message(today, &m.text);
    }

    let compressor_config = CompressorConfig {
        min_length: state.config.compressor.min_length,
        max_messages: state.config.compressor.max_messages,
        score_threshold: state.config.compressor.score_threshold,
    };
    let result = compress(&channel_name, &messages, &compressor_config);
    let digest = format_for_prompt(&result);

    let summary_md = summarize(state, &channel_name, &digest).await;

    let artifacts = write_report(&state.config.monitor.reports_dir, &channel_name, &summary_md, &result, Utc::now())?;

    let mut html = format!(
        "<b>{} — scheduled report</b>\n\n{}",
        html_escape(&channel_name),
        html_escape(&truncate(&summary_md, 3500))
    );
    html.push_str(&format!(
        "\n\n<a href=\"file://{}\">markdown</a> · <a href=\"file://{}\">data</a>",
        artifacts.markdown_path.display(),
        artifacts.json_path.display()
    ));
    let html = truncate(&html, SUMMARY_MAX_CHARS);

    if let Some(target) = state
        .config
        .monitor
        .report_target_channel
        .clone()
        .or_else(|| state.config.monitor.target_channel.clone())
    {
        let outbound = OutboundMessage {
            channel: "telegram".to_string(),
            recipient_id: target,
            content: html,
            format: MessageFormat::Html,
            link_preview: false,
        };
        if let Some(ch) = channels.get("telegram") {
            if let Err(e) = ch.send(&outbound).await {
                warn!(channel_id, error = %e, "scheduler: failed to send report summary");
            }
        }
    }

    if let Err(e) = state.hotwords.persist_to_db(&persist_conn(state)?, today) {
        warn!(channel_id, error = %e, "scheduler: failed to persist hot words");
    }

    state.db.clear_cache(channel_id)?;
    Ok(())
}

/// The hot-words table lives in the same database as the rest of monitor
/// state, but `HotWordsService::persist_to_db` wants a `&Connection`
/// directly rather than the pooled handle `MonitorDb` wraps — open a
/// short-lived connection to the same file for the call.
fn persist_conn(state: &AppState) -> crate::error::Result<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(&state.config.database.path)?;
    hydra_compress::hotwords::init_db(&conn)?;
    Ok(conn)
}

async fn summarize(state: &AppState, channel_name: &str, digest: &str) -> String {
    if !state.gateway.is_available() {
        return digest.to_string();
    }

    let req = ChatRequest::new(vec![
        Message::system(
            "You write concise, neutral market-news digests from a structured feed of cleaned \
             messages. Summarize the key developments, do not invent facts not present in the feed.",
        ),
        Message::user(format!("Channel: {channel_name}\n\n{digest}")),
    ]);

    match state.gateway.call(&req).await {
        Ok(resp) => resp.content,
        Err(e) => {
            warn!(channel_name, error = %e, "scheduler: AI summary call failed, falling back to raw digest");
            digest.to_string()
        }
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars.saturating_sub(1)).collect::<String>() + "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_core::config::HydraConfig;
    use hydra_core::types::CachedMessage;
    use rusqlite::Connection;

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HydraConfig::default();
        config.database.path = dir.path().join("hydra.sqlite3");
        config.monitor.reports_dir = dir.path().to_path_buf();
        let db_conn = Connection::open(&config.database.path).unwrap();
        let gateway_conn = Connection::open_in_memory().unwrap();
        (AppState::new(config, db_conn, gateway_conn).unwrap(), dir)
    }

    #[tokio::test]
    async fn editorial_channel_clears_cache_without_report() {
        let (state, _dir) = test_state();
        let channels = ChannelManager::new();
        state.db.ensure_channel("100", "Tech Digest").unwrap();
        state.db.set_channel_category("100", ChannelCategory::Tech).unwrap();
        state
            .db
            .insert_cached_message(&CachedMessage {
                channel_id: "100".into(),
                channel_name: "Tech Digest".into(),
                sender: "dev".into(),
                text: "new rust release with async improvements".into(),
                ts: Utc::now(),
            })
            .unwrap();

        process_channel(&state, &channels, "100").await.unwrap();
        assert!(state.db.cached_messages("100").unwrap().is_empty());
    }

    #[tokio::test]
    async fn market_channel_with_no_ai_still_writes_artifacts_from_raw_digest() {
        let (state, dir) = test_state();
        let channels = ChannelManager::new();
        state.db.ensure_channel("200", "Market News").unwrap();
        for i in 0..5 {
            state
                .db
                .insert_cached_message(&CachedMessage {
                    channel_id: "200".into(),
                    channel_name: "Market News".into(),
                    sender: "trader".into(),
                    text: format!("BTC breaks ${i}00k resistance on spot volume surge today bullish"),
                    ts: Utc::now(),
                })
                .unwrap();
        }

        process_channel(&state, &channels, "200").await.unwrap();
        assert!(state.db.cached_messages("200").unwrap().is_empty());
        assert!(dir.path().join("reports").join("channels").exists());
    }
}
