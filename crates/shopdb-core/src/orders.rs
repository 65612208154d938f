use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Kind of account calling the API. Only `Shop` accounts may import price
/// lists or manage partner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Shop,
    Buyer,
}

impl AccountType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Shop => "shop",
            AccountType::Buyer => "buyer",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shop" => Ok(AccountType::Shop),
            "buyer" => Ok(AccountType::Buyer),
            other => Err(CoreError::InvalidAccountType(other.to_string())),
        }
    }
}

/// Lifecycle of an order. A basket is an order that has not been placed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Basket,
    New,
    Confirmed,
    Assembled,
    Sent,
    Delivered,
    Canceled,
}

impl OrderState {
    pub const ALL: [OrderState; 7] = [
        OrderState::Basket,
        OrderState::New,
        OrderState::Confirmed,
        OrderState::Assembled,
        OrderState::Sent,
        OrderState::Delivered,
        OrderState::Canceled,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Basket => "basket",
            OrderState::New => "new",
            OrderState::Confirmed => "confirmed",
            OrderState::Assembled => "assembled",
            OrderState::Sent => "sent",
            OrderState::Delivered => "delivered",
            OrderState::Canceled => "canceled",
        }
    }

    /// Whether an order may move from `self` to `next`.
    ///
    /// Transitions only go forward; `delivered` and `canceled` are terminal
    /// and a parcel already sent can no longer be canceled.
    #[must_use]
    pub fn can_transition_to(self, next: OrderState) -> bool {
        use OrderState::{Assembled, Basket, Canceled, Confirmed, Delivered, New, Sent};

        matches!(
            (self, next),
            (Basket, New)
                | (New, Confirmed | Canceled)
                | (Confirmed, Assembled | Canceled)
                | (Assembled, Sent | Canceled)
                | (Sent, Delivered)
        )
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| CoreError::InvalidOrderState(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_state_round_trips_through_str() {
        for state in OrderState::ALL {
            assert_eq!(state.as_str().parse::<OrderState>(), Ok(state));
        }
    }

    #[test]
    fn unknown_order_state_is_rejected() {
        assert_eq!(
            "shipped".parse::<OrderState>(),
            Err(CoreError::InvalidOrderState("shipped".to_string()))
        );
    }

    #[test]
    fn basket_can_only_be_placed() {
        assert!(OrderState::Basket.can_transition_to(OrderState::New));
        assert!(!OrderState::Basket.can_transition_to(OrderState::Confirmed));
        assert!(!OrderState::Basket.can_transition_to(OrderState::Canceled));
    }

    #[test]
    fn sent_order_cannot_be_canceled() {
        assert!(OrderState::Sent.can_transition_to(OrderState::Delivered));
        assert!(!OrderState::Sent.can_transition_to(OrderState::Canceled));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for terminal in [OrderState::Delivered, OrderState::Canceled] {
            for next in OrderState::ALL {
                assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
            }
        }
    }

    #[test]
    fn states_serialize_lowercase() {
        let json = serde_json::to_string(&OrderState::Assembled).expect("serialize");
        assert_eq!(json, "\"assembled\"");
    }

    #[test]
    fn account_type_parses() {
        assert_eq!("shop".parse::<AccountType>(), Ok(AccountType::Shop));
        assert_eq!("buyer".parse::<AccountType>(), Ok(AccountType::Buyer));
        assert!("admin".parse::<AccountType>().is_err());
    }
}
