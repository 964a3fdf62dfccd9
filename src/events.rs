use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted by the service layer. These are observability
/// hooks only; no business rule depends on a listener running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    StockDeducted {
        ingredient_id: Uuid,
        quantity: Decimal,
        order_id: Uuid,
    },
    StockRestocked {
        ingredient_id: Uuid,
        quantity: Decimal,
    },
    ReservationCreated(Uuid),
    ReservationStatusChanged {
        reservation_id: Uuid,
        old_status: String,
        new_status: String,
    },
    CustomerPromotedToVip(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, reporting (not panicking on) a closed channel.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a channel pair sized for bursty request traffic.
pub fn channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(1024);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Spawned once at startup;
/// exits when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(id) => info!(order_id = %id, "event: order created"),
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id = %order_id, from = %old_status, to = %new_status, "event: order status changed")
            }
            Event::StockDeducted {
                ingredient_id,
                quantity,
                order_id,
            } => {
                info!(ingredient_id = %ingredient_id, quantity = %quantity, order_id = %order_id, "event: stock deducted")
            }
            Event::StockRestocked {
                ingredient_id,
                quantity,
            } => {
                info!(ingredient_id = %ingredient_id, quantity = %quantity, "event: stock restocked")
            }
            Event::ReservationCreated(id) => {
                info!(reservation_id = %id, "event: reservation created")
            }
            Event::ReservationStatusChanged {
                reservation_id,
                old_status,
                new_status,
            } => {
                info!(reservation_id = %reservation_id, from = %old_status, to = %new_status, "event: reservation status changed")
            }
            Event::CustomerPromotedToVip(id) => {
                info!(customer_id = %id, "event: customer promoted to VIP")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_and_receive() {
        let (sender, mut rx) = channel();
        let id = Uuid::new_v4();
        sender.send(Event::OrderCreated(id)).await.unwrap();
        match rx.recv().await {
            Some(Event::OrderCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_on_closed_channel_reports_error() {
        let (sender, rx) = channel();
        drop(rx);
        assert!(sender.send(Event::OrderCreated(Uuid::new_v4())).await.is_err());
    }
}
