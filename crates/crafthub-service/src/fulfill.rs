//! Fulfillment emission for completed purchases.
//!
//! After a purchase commits, the item's rendered command has to reach the
//! game server somehow. Delivery is fire-and-forget relative to the
//! purchase transaction: the currency is already spent and the ledger row
//! already written, so a delivery failure is logged for reconciliation
//! rather than rolled back.

use std::sync::Arc;

use async_trait::async_trait;

use crafthub_core::PurchaseId;

/// Destination for rendered fulfillment commands.
#[async_trait]
pub trait FulfillmentSink: Send + Sync {
    /// Deliver one rendered command for the given purchase.
    async fn deliver(&self, purchase_id: &PurchaseId, command: &str);
}

/// Sink that records commands in the service log.
///
/// Stands in until an RCON or plugin-channel transport is wired up; the
/// console operator (or a log tailer) applies the commands from there.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl FulfillmentSink for LogSink {
    async fn deliver(&self, purchase_id: &PurchaseId, command: &str) {
        tracing::info!(
            purchase_id = %purchase_id,
            command = %command,
            "Fulfillment command emitted"
        );
    }
}

/// Hand a fulfillment command to the sink without blocking the caller.
///
/// The purchase handler responds as soon as the debit and ledger write
/// commit; delivery happens on its own task.
pub fn emit(sink: Arc<dyn FulfillmentSink>, purchase_id: PurchaseId, command: String) {
    tokio::spawn(async move {
        sink.deliver(&purchase_id, &command).await;
    });
}
