use serde::{Deserialize, Serialize};

/// Kind of attached media on an inbound update, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Document,
    WebpagePreview,
    /// Any other media type the adapter doesn't special-case (sticker, voice, …).
    Other,
}

/// A message received from an external channel (Telegram, Discord, WebChat, …).
///
/// Field set matches the update shape the monitor pipeline needs:
/// chat identity, sender identity, message identity, text, optional media,
/// and a timestamp. Platforms that don't distinguish `chat` from `sender`
/// (e.g. a 1:1 DM channel) set `chat_id == sender_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Logical channel name (e.g. "telegram", "discord").
    pub channel: String,

    /// Platform-native identifier for the chat/channel this update arrived on.
    pub chat_id: String,

    /// Human-readable title of the chat/channel, if available.
    pub chat_title: Option<String>,

    /// Public `@username` of the chat/channel, if it has one.
    pub chat_username: Option<String>,

    /// Platform-native identifier for the sender (chat ID, user ID, …).
    pub sender_id: String,

    /// Human-readable display name for the sender, if available.
    pub sender_name: Option<String>,

    /// Public `@username` of the sender, if any.
    pub sender_username: Option<String>,

    /// Platform-native identifier for this specific message, used for the
    /// reentry guard's `(chat_id, message_id)` key.
    pub message_id: String,

    /// Plain text content of the message.
    pub text: String,

    /// Attached media, if the update carries any.
    pub media: Option<MediaKind>,

    /// ISO-8601 timestamp of when the message was received.
    pub timestamp: String,

    /// Full raw payload from the platform for cases that need extra fields.
    pub raw_payload: Option<serde_json::Value>,
}

impl InboundMessage {
    /// Backward-compatible accessor for call sites written against the old
    /// `content` field name.
    pub fn content(&self) -> &str {
        &self.text
    }
}

/// A message to be delivered to an external channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Logical channel name (e.g. "telegram", "discord").
    pub channel: String,

    /// Platform-native identifier for the recipient (chat ID, user ID, …).
    pub recipient_id: String,

    /// Content to deliver.
    pub content: String,

    /// Formatting hint for the target platform.
    pub format: MessageFormat,

    /// Whether the platform should render a link preview for any URL in
    /// `content`. Ignored by platforms without the concept.
    #[serde(default = "default_true")]
    pub link_preview: bool,
}

fn default_true() -> bool {
    true
}

impl OutboundMessage {
    pub fn html(channel: impl Into<String>, recipient_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            recipient_id: recipient_id.into(),
            content: content.into(),
            format: MessageFormat::Html,
            link_preview: true,
        }
    }
}

/// A reference to a message already received, used to drive the platform's
/// native forward primitive instead of re-rendering the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardRef {
    pub channel: String,
    pub from_chat_id: String,
    pub message_id: String,
    pub to_chat_id: String,
}

/// Formatting hint for outbound message content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFormat {
    /// Raw text with no special markup.
    #[default]
    PlainText,

    /// Markdown as understood by the target platform.
    Markdown,

    /// HTML markup (supported by Telegram, some web clients).
    Html,
}

/// Runtime connection state of a channel adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Fully connected and ready to send/receive.
    Connected,

    /// Attempting to establish or re-establish the connection.
    Connecting,

    /// Cleanly disconnected (not an error condition).
    Disconnected,

    /// An unrecoverable (or pre-retry) error occurred.
    Error(String),
}
