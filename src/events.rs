use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::checkout::PaymentMethod;

// Define the various events the engine can publish over a checkout cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartRestored { item_count: usize },
    CartItemAdded { product_id: String, quantity: u32 },
    CartItemUpdated { product_id: String, quantity: u32 },
    CartItemRemoved { product_id: String },
    CartCleared,

    // Coupon events
    CouponApplied { code: String, discount: Decimal },
    CouponRemoved,

    // Checkout events
    CheckoutRequested { payment_method: PaymentMethod },
    OrderAccepted { order_id: String },
    OrderRejected { reason: String },
    DepositAcknowledged { order_id: String },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event without blocking, logging instead of failing when the
    /// channel is closed or full. Cart mutations never fail because nobody
    /// is listening.
    pub fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.try_send(event) {
            warn!("Failed to publish event: {}", e);
        }
    }
}

/// Drains engine events and logs them. The storefront shell spawns this when
/// it has no richer subscriber wired up.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);
    }

    info!("Event channel closed, stopping event processing");
}
