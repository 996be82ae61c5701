//! Forward-message rendering: a header with
//! the channel name linked to the source message, a one-line meta line,
//! and the HTML-escaped body.

use hydra_channels::InboundMessage;
use hydra_core::types::VipUser;

/// Body length above which a long-form-renderer handoff would kick in
///. No long-form renderer is wired up in this deployment (out
/// of scope — see DESIGN.md), so past this length the body is simply
/// truncated with an ellipsis rather than replaced with an Instant View
/// link to a component that doesn't exist here.
const LONG_FORM_THRESHOLD: usize = 500;

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Best-effort link to the source message, when the source chat exposes a
/// public username Telegram can resolve into a `t.me` URL.
fn source_link(update: &InboundMessage) -> Option<String> {
    let username = update.chat_username.as_ref()?;
    Some(format!("https://t.me/{}/{}", username.trim_start_matches('@'), update.message_id))
}

/// Render the HTML body sent to `send_html` for a forwarded update.
pub fn render_forward(update: &InboundMessage, vip: Option<&VipUser>) -> String {
    let channel_label = update
        .chat_title
        .clone()
        .or_else(|| update.chat_username.clone())
        .unwrap_or_else(|| update.chat_id.clone());

    let header = match source_link(update) {
        Some(link) => format!("<b><a href=\"{}\">{}</a></b>", link, escape_html(&channel_label)),
        None => format!("<b>{}</b>", escape_html(&channel_label)),
    };

    let sender = update.sender_name.clone().unwrap_or_else(|| update.sender_id.clone());
    let handle = update
        .sender_username
        .as_ref()
        .map(|u| format!(" (@{u})"))
        .unwrap_or_default();
    let media_badge = update.media.map(|_| " 📎").unwrap_or_default();
    let vip_badge = if vip.map(|v| v.enabled).unwrap_or(false) { " ⭐VIP" } else { "" };

    let meta = format!(
        "<i>{}{} · {}{}{}</i>",
        escape_html(&sender),
        handle,
        update.timestamp,
        media_badge,
        vip_badge
    );

    let mut body = escape_html(&update.text);
    if body.chars().count() > LONG_FORM_THRESHOLD {
        body = body.chars().take(LONG_FORM_THRESHOLD).collect::<String>() + "…";
    }

    format!("{header}\n{meta}\n\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(text: &str) -> InboundMessage {
        InboundMessage {
            channel: "telegram".into(),
            chat_id: "100".into(),
            chat_title: Some("Market News".into()),
            chat_username: Some("market_news".into()),
            sender_id: "u1".into(),
            sender_name: Some("Trader".into()),
            sender_username: Some("trader1".into()),
            message_id: "42".into(),
            text: text.into(),
            media: None,
            timestamp: "2026-07-28T08:00:00Z".into(),
            raw_payload: None,
        }
    }

    #[test]
    fn renders_header_meta_and_body() {
        let html = render_forward(&update("BTC breaks 100k"), None);
        assert!(html.contains("Market News"));
        assert!(html.contains("https://t.me/market_news/42"));
        assert!(html.contains("Trader"));
        assert!(html.contains("BTC breaks 100k"));
    }

    #[test]
    fn vip_badge_shown_for_enabled_vip() {
        let vip = VipUser { id: "u1".into(), username: Some("trader1".into()), name: "Trader".into(), enabled: true };
        let html = render_forward(&update("hello"), Some(&vip));
        assert!(html.contains("VIP"));
    }

    #[test]
    fn body_escaped_against_html_injection() {
        let html = render_forward(&update("<script>alert(1)</script>"), None);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn long_body_is_truncated() {
        let long_text = "a".repeat(600);
        let html = render_forward(&update(&long_text), None);
        assert!(html.contains("…"));
    }
}
