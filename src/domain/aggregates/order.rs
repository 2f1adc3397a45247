//! Order Aggregate
//!
//! One record per checkout attempt. Status starts at `pending` and moves to
//! exactly one terminal state; a success replay re-applies the same fields,
//! and neither terminal state can overwrite the other.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::aggregates::cart::CartLine;
use crate::domain::aggregates::product::Variant;
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    #[default]
    Gateway,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::CashOnDelivery => "cod",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gateway" => Some(Self::Gateway),
            "cod" => Some(Self::CashOnDelivery),
            _ => None,
        }
    }
}

/// What was bought: a single product variant, or a snapshot of cart lines.
#[derive(Clone, Debug)]
pub enum Purchase {
    Single { product_id: Uuid, variant: Variant },
    Cart { items: Vec<CartLine> },
}

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    user_id: Uuid,
    purchase: Purchase,
    gateway_order_id: Option<String>,
    gateway_payment_id: Option<String>,
    amount: Money,
    payment_method: PaymentMethod,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<OrderEvent>,
}

impl Order {
    /// Create a new pending order. Gateway checkouts carry the gateway's
    /// order identifier; cash-on-delivery orders carry none.
    pub fn create_pending(
        user_id: Uuid,
        purchase: Purchase,
        amount: Money,
        payment_method: PaymentMethod,
        gateway_order_id: Option<String>,
    ) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut order = Self {
            id,
            user_id,
            purchase,
            gateway_order_id,
            gateway_payment_id: None,
            amount,
            payment_method,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        order.raise_event(OrderEvent::Created {
            order_id: id,
            user_id,
            amount: order.amount.amount(),
            currency: order.amount.currency().to_string(),
        });
        order
    }

    /// Rebuild the aggregate from a stored row. Raises no event.
    #[allow(clippy::too_many_arguments)]
    pub fn hydrate(
        id: Uuid,
        user_id: Uuid,
        purchase: Purchase,
        gateway_order_id: Option<String>,
        gateway_payment_id: Option<String>,
        amount: Money,
        payment_method: PaymentMethod,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            purchase,
            gateway_order_id,
            gateway_payment_id,
            amount,
            payment_method,
            status,
            created_at,
            updated_at,
            events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn purchase(&self) -> &Purchase { &self.purchase }
    pub fn gateway_order_id(&self) -> Option<&str> { self.gateway_order_id.as_deref() }
    pub fn gateway_payment_id(&self) -> Option<&str> { self.gateway_payment_id.as_deref() }
    pub fn amount(&self) -> &Money { &self.amount }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Mark the order paid. Re-settling a completed order re-applies the same
    /// fields (webhook replays are safe to repeat); a failed order stays
    /// failed.
    pub fn settle(&mut self, gateway_payment_id: Option<String>) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Failed => Err(OrderError::AlreadyTerminal),
            OrderStatus::Pending | OrderStatus::Completed => {
                self.status = OrderStatus::Completed;
                self.gateway_payment_id = gateway_payment_id.clone();
                self.touch();
                self.raise_event(OrderEvent::Completed {
                    order_id: self.id,
                    gateway_payment_id,
                });
                Ok(())
            }
        }
    }

    /// Mark the payment failed. Idempotent on replay; a completed order stays
    /// completed.
    pub fn fail(&mut self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Completed => Err(OrderError::AlreadyTerminal),
            OrderStatus::Pending | OrderStatus::Failed => {
                self.status = OrderStatus::Failed;
                self.touch();
                self.raise_event(OrderEvent::Failed { order_id: self.id });
                Ok(())
            }
        }
    }

    pub fn take_events(&mut self) -> Vec<OrderEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: OrderEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError { AlreadyTerminal }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order already reached a terminal state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn pending_order() -> Order {
        let variant = Variant { variant_type: "black".into(), price: Decimal::new(499, 0) };
        Order::create_pending(
            Uuid::new_v4(),
            Purchase::Single { product_id: Uuid::new_v4(), variant },
            Money::new(Decimal::new(499, 0), "INR"),
            PaymentMethod::Gateway,
            Some("ORD-00000001".into()),
        )
    }

    #[test]
    fn new_order_starts_pending() {
        let mut order = pending_order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.amount().amount(), Decimal::new(499, 0));
        let events = order.take_events();
        assert!(matches!(events.as_slice(), [OrderEvent::Created { .. }]));
    }

    #[test]
    fn settle_stores_payment_id() {
        let mut order = pending_order();
        order.settle(Some("pay_123".into())).unwrap();
        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(order.gateway_payment_id(), Some("pay_123"));
    }

    #[test]
    fn settle_replay_is_idempotent() {
        let mut order = pending_order();
        order.settle(Some("pay_123".into())).unwrap();
        order.settle(Some("pay_123".into())).unwrap();
        assert_eq!(order.status(), OrderStatus::Completed);
        assert_eq!(order.gateway_payment_id(), Some("pay_123"));
    }

    #[test]
    fn settle_cannot_resurrect_failed() {
        let mut order = pending_order();
        order.fail().unwrap();
        assert_eq!(order.settle(Some("pay_123".into())), Err(OrderError::AlreadyTerminal));
        assert_eq!(order.status(), OrderStatus::Failed);
    }

    #[test]
    fn fail_cannot_overwrite_completed() {
        let mut order = pending_order();
        order.settle(None).unwrap();
        assert_eq!(order.fail(), Err(OrderError::AlreadyTerminal));
        assert_eq!(order.status(), OrderStatus::Completed);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [OrderStatus::Pending, OrderStatus::Completed, OrderStatus::Failed] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }
}
