//! Domain events
//!
//! Raised by the order aggregate and published to NATS best-effort.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, user_id: Uuid, amount: Decimal, currency: String },
    Completed { order_id: Uuid, gateway_payment_id: Option<String> },
    Failed { order_id: Uuid },
}

impl OrderEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Created { .. } => "orders.created",
            Self::Completed { .. } => "orders.completed",
            Self::Failed { .. } => "orders.failed",
        }
    }
}
