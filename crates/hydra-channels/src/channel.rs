use async_trait::async_trait;

use crate::{
    error::ChannelError,
    types::{ChannelStatus, ForwardRef, OutboundMessage},
};

/// Common interface implemented by every channel adapter (Telegram, Discord, WebChat, …).
///
/// Implementations must be `Send + Sync` so they can be stored in a `ChannelManager`
/// and driven from multiple Tokio tasks.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"telegram"`).
    ///
    /// The name is used as the key inside [`ChannelManager`](crate::manager::ChannelManager)
    /// and must be unique across all registered adapters.
    fn name(&self) -> &str;

    /// Establish the connection to the external service.
    ///
    /// Implementations should transition their internal state to
    /// [`ChannelStatus::Connected`] on success.
    async fn connect(&mut self) -> Result<(), ChannelError>;

    /// Gracefully close the connection.
    ///
    /// Implementations should transition their internal state to
    /// [`ChannelStatus::Disconnected`] on success.
    async fn disconnect(&mut self) -> Result<(), ChannelError>;

    /// Deliver a single outbound message to the channel.
    ///
    /// This is intentionally `&self` (shared reference) so that a connected
    /// adapter can send concurrently without a mutable borrow.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;

    /// Forward a previously-received message to another chat using the
    /// platform's native forward primitive, preserving origin attribution.
    ///
    /// Default implementation degrades to re-sending a plain-text stand-in,
    /// for platforms/tests that don't implement native forwarding; real
    /// adapters (Telegram) override this with `forward_messages`.
    async fn forward(&self, forward_ref: &ForwardRef) -> Result<(), ChannelError> {
        self.send(&OutboundMessage {
            channel: forward_ref.channel.clone(),
            recipient_id: forward_ref.to_chat_id.clone(),
            content: format!(
                "[forwarded message {} from {}]",
                forward_ref.message_id, forward_ref.from_chat_id
            ),
            format: crate::types::MessageFormat::PlainText,
            link_preview: false,
        })
        .await
    }

    /// Return the current runtime status without blocking.
    fn status(&self) -> ChannelStatus;
}
