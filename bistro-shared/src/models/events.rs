use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct OrderCreatedEvent {
    pub order_id: u64,
    pub table_number: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct OrderStatusChangedEvent {
    pub order_id: u64,
    pub table_number: u32,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct OrderPaidEvent {
    pub order_id: u64,
    pub transaction_id: String,
    pub method: String,
    pub amount: Decimal,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct PaymentRefundedEvent {
    pub order_id: u64,
    pub transaction_id: String,
    pub method: String,
    pub amount: Decimal,
    pub timestamp: i64,
}

/// A staff notification as it left the pipeline for one role.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct StaffNotifiedEvent {
    pub role: String,
    pub delivered: bool,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestaurantEvent {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OrderPaid(OrderPaidEvent),
    PaymentRefunded(PaymentRefundedEvent),
    StaffNotified(StaffNotifiedEvent),
}

impl RestaurantEvent {
    /// Order the event refers to, if any.
    pub fn order_id(&self) -> Option<u64> {
        match self {
            RestaurantEvent::OrderCreated(e) => Some(e.order_id),
            RestaurantEvent::OrderStatusChanged(e) => Some(e.order_id),
            RestaurantEvent::OrderPaid(e) => Some(e.order_id),
            RestaurantEvent::PaymentRefunded(e) => Some(e.order_id),
            RestaurantEvent::StaffNotified(_) => None,
        }
    }
}

/// Envelope published to subscribers
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: RestaurantEvent,
}

impl EventEnvelope {
    pub fn new(event: RestaurantEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = RestaurantEvent::OrderCreated(OrderCreatedEvent {
            order_id: 7,
            table_number: 3,
            timestamp: 0,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "ORDER_CREATED");
        assert_eq!(value["order_id"], 7);
        assert_eq!(event.order_id(), Some(7));
    }

    #[test]
    fn test_envelope_ids_are_unique() {
        let event = RestaurantEvent::StaffNotified(StaffNotifiedEvent {
            role: "kitchen".to_string(),
            delivered: true,
            timestamp: 0,
        });

        let a = EventEnvelope::new(event.clone());
        let b = EventEnvelope::new(event);
        assert_ne!(a.event_id, b.event_id);
        assert_eq!(a.event.order_id(), None);
    }
}
