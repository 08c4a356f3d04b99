use async_trait::async_trait;
use herald_common::{ChatId, SourceRef, outgoing};

use crate::error::DeliveryError;

/// The messaging provider, as seen by the delivery worker
///
/// Every call reports failures as a classified [`DeliveryError`]: a
/// `Permanent` error marks the destination as done, `Temporary` and
/// `Unknown` errors stop the record for a later retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// A resolved destination handle
    type Peer: Send + Sync;

    /// Resolve a destination chat
    async fn resolve(&self, chat_id: ChatId) -> Result<Self::Peer, DeliveryError>;

    /// Send a new message carrying `text`
    async fn deliver_copy(&self, peer: &Self::Peer, text: &str) -> Result<(), DeliveryError>;

    /// Forward the original message
    async fn deliver_forward(
        &self,
        peer: &Self::Peer,
        source: SourceRef,
    ) -> Result<(), DeliveryError>;

    /// Send an informational message after a delivery
    async fn send_notice(&self, peer: &Self::Peer, text: &str) -> Result<(), DeliveryError>;
}

/// A transport that logs what it would send and always succeeds
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunTransport;

#[async_trait]
impl Transport for DryRunTransport {
    type Peer = ChatId;

    async fn resolve(&self, chat_id: ChatId) -> Result<Self::Peer, DeliveryError> {
        Ok(chat_id)
    }

    async fn deliver_copy(&self, peer: &Self::Peer, text: &str) -> Result<(), DeliveryError> {
        outgoing!(
            level = INFO,
            "[dry-run] copy to {peer}: {} chars",
            text.chars().count()
        );
        Ok(())
    }

    async fn deliver_forward(
        &self,
        peer: &Self::Peer,
        source: SourceRef,
    ) -> Result<(), DeliveryError> {
        outgoing!(level = INFO, "[dry-run] forward {source} to {peer}");
        Ok(())
    }

    async fn send_notice(&self, peer: &Self::Peer, text: &str) -> Result<(), DeliveryError> {
        outgoing!(level = INFO, "[dry-run] notice to {peer}: {text}");
        Ok(())
    }
}
