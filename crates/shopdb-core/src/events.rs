//! Typed domain events published by the API after state changes.
//!
//! Consumers receive these over an in-process channel; publishing never
//! blocks or fails the operation that produced the event.

use serde::Serialize;

use crate::OrderState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    ImportCompleted {
        shop_id: i64,
        shop_name: String,
        offers: usize,
    },
    ImportFailed {
        user_id: i64,
        reason: String,
    },
    OrderPlaced {
        order_id: i64,
        user_id: i64,
        total_sum: i64,
    },
    OrderStateChanged {
        order_id: i64,
        user_id: i64,
        from: OrderState,
        to: OrderState,
    },
}

impl DomainEvent {
    /// Short stable name used as a log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::ImportCompleted { .. } => "import_completed",
            DomainEvent::ImportFailed { .. } => "import_failed",
            DomainEvent::OrderPlaced { .. } => "order_placed",
            DomainEvent::OrderStateChanged { .. } => "order_state_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_tag() {
        let event = DomainEvent::OrderStateChanged {
            order_id: 7,
            user_id: 3,
            from: OrderState::New,
            to: OrderState::Confirmed,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "order_state_changed");
        assert_eq!(json["from"], "new");
        assert_eq!(json["to"], "confirmed");
        assert_eq!(event.kind(), "order_state_changed");
    }
}
