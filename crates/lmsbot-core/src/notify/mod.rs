//! Notifier collaborator: delivers plain-text messages to one chat

mod telegram;

pub use telegram::TelegramNotifier;

use crate::error::Result;

/// Trait for outbound message delivery (async)
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Deliver one plain-text message.
    ///
    /// `Ok` means the channel accepted the message.
    async fn send(&self, text: &str) -> Result<()>;
}
