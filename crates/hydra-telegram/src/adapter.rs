//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` and drives a long-polling dispatcher that forwards
//! every incoming message to the shared ingestion pipeline as an
//! [`InboundMessage`]. Outbound delivery goes back through [`send::send_response`].

use std::sync::Arc;

use hydra_channels::{
    Channel, ChannelError, ChannelStatus, ForwardRef, InboundMessage, MediaKind, OutboundMessage,
};
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::send::{send_html, send_response};

/// Telegram channel adapter.
///
/// `connect()` spawns the long-polling dispatcher task; `disconnect()` aborts
/// it. The adapter never returns on its own — it runs for the process
/// lifetime once connected, same as the upstream platform's polling model.
pub struct TelegramChannel {
    bot_token: String,
    bot: Option<Bot>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    dispatcher: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
    status: Arc<Mutex<ChannelStatus>>,
}

impl TelegramChannel {
    pub fn new(bot_token: String, inbound_tx: mpsc::Sender<InboundMessage>) -> Self {
        Self {
            bot_token,
            bot: None,
            inbound_tx,
            dispatcher: Arc::new(Mutex::new(None)),
            status: Arc::new(Mutex::new(ChannelStatus::Disconnected)),
        }
    }
}

#[async_trait::async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn connect(&mut self) -> Result<(), ChannelError> {
        if self.bot_token.is_empty() {
            return Err(ChannelError::ConfigError("no bot token configured".into()));
        }

        let bot = Bot::new(&self.bot_token);
        self.bot = Some(bot.clone());

        let tx = self.inbound_tx.clone();
        let status = Arc::clone(&self.status);

        let handler = Update::filter_message().endpoint(
            move |bot: Bot, msg: Message| {
                let tx = tx.clone();
                async move {
                    if let Some(inbound) = to_inbound_message(&msg) {
                        if tx.send(inbound).await.is_err() {
                            warn!("telegram: ingestion pipeline receiver dropped");
                        }
                    }
                    let _ = bot;
                    respond(())
                }
            },
        );

        let join = tokio::spawn(async move {
            Dispatcher::builder(bot, handler)
                .default_handler(|_upd| async {})
                .build()
                .dispatch()
                .await;
        });

        *self.dispatcher.lock().await = Some(join);
        *self.status.lock().await = ChannelStatus::Connected;
        info!("telegram: long-polling dispatcher started");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), ChannelError> {
        if let Some(join) = self.dispatcher.lock().await.take() {
            join.abort();
        }
        self.bot = None;
        *self.status.lock().await = ChannelStatus::Disconnected;
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        let bot = self
            .bot
            .as_ref()
            .ok_or_else(|| ChannelError::SendFailed("channel not connected".into()))?;

        let chat_id: i64 = msg
            .recipient_id
            .parse()
            .map_err(|_| ChannelError::SendFailed(format!("invalid chat id: {}", msg.recipient_id)))?;

        match msg.format {
            hydra_channels::MessageFormat::Html => send_html(bot, ChatId(chat_id), &msg.content).await,
            _ => send_response(bot, ChatId(chat_id), &msg.content).await,
        }
        Ok(())
    }

    async fn forward(&self, forward_ref: &ForwardRef) -> Result<(), ChannelError> {
        let bot = self
            .bot
            .as_ref()
            .ok_or_else(|| ChannelError::SendFailed("channel not connected".into()))?;

        let from_chat_id: i64 = forward_ref
            .from_chat_id
            .parse()
            .map_err(|_| ChannelError::SendFailed(format!("invalid chat id: {}", forward_ref.from_chat_id)))?;
        let to_chat_id: i64 = forward_ref
            .to_chat_id
            .parse()
            .map_err(|_| ChannelError::SendFailed(format!("invalid chat id: {}", forward_ref.to_chat_id)))?;
        let message_id: i32 = forward_ref
            .message_id
            .parse()
            .map_err(|_| ChannelError::SendFailed(format!("invalid message id: {}", forward_ref.message_id)))?;

        bot.forward_message(
            Recipient::Id(ChatId(to_chat_id)),
            Recipient::Id(ChatId(from_chat_id)),
            teloxide::types::MessageId(message_id),
        )
        .await
        .map_err(|e| ChannelError::SendFailed(e.to_string()))?;
        Ok(())
    }

    fn status(&self) -> ChannelStatus {
        self.status
            .try_lock()
            .map(|s| s.clone())
            .unwrap_or(ChannelStatus::Connecting)
    }
}

fn to_inbound_message(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text().map(|t| t.to_string()).unwrap_or_default();
    let sender = msg.from.as_ref();
    let chat = &msg.chat;

    let media = if msg.photo().is_some() {
        Some(MediaKind::Photo)
    } else if msg.document().is_some() {
        Some(MediaKind::Document)
    } else if msg.web_page_preview().is_some() {
        Some(MediaKind::WebpagePreview)
    } else if msg.video().is_some()
        || msg.audio().is_some()
        || msg.voice().is_some()
        || msg.sticker().is_some()
    {
        Some(MediaKind::Other)
    } else {
        None
    };

    if text.is_empty() && media.is_none() {
        return None;
    }

    Some(InboundMessage {
        channel: "telegram".to_string(),
        chat_id: chat.id.0.to_string(),
        chat_title: chat.title().map(|t| t.to_string()),
        chat_username: chat.username().map(|u| u.to_string()),
        sender_id: sender.map(|u| u.id.0.to_string()).unwrap_or_default(),
        sender_name: sender.map(|u| u.full_name()),
        sender_username: sender.and_then(|u| u.username.clone()),
        message_id: msg.id.0.to_string(),
        text,
        media,
        timestamp: msg.date.to_rfc3339(),
        raw_payload: serde_json::to_value(msg).ok(),
    })
}
