//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the typed message surface of the engine: the inbound
// intents it consumes and the outbound events it publishes. Both are tagged
// sums with one constructor per message kind; dispatch is by exhaustive case
// analysis.
//
// | Name          | Direction | Description                                        |
// |---------------|-----------|----------------------------------------------------|
// | Intent        | inbound   | AddLimit, Cancel, Market, StopLoss requests.       |
// | EngineEvent   | outbound  | CancelAck, Trade, fill lifecycle notifications.    |
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, Quantity, Side};

/// An inbound request for the engine, externally constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Lodge a limit order and match it against the opposite side.
    AddLimit {
        order_id: OrderId,
        side: Side,
        quantity: Quantity,
        price: Decimal,
    },
    /// Remove a resting order. Unknown ids are silently ignored.
    Cancel { order_id: OrderId },
    /// Sweep the opposite side regardless of price.
    Market {
        order_id: OrderId,
        side: Side,
        quantity: Quantity,
    },
    /// Convert to a market order when the stop condition holds at acceptance,
    /// otherwise rest at the stop price.
    StopLoss {
        order_id: OrderId,
        side: Side,
        quantity: Quantity,
        stop_price: Decimal,
    },
}

/// An outbound notification published by the engine.
///
/// The order in which these are published is part of the engine's observable
/// contract: two engines fed identical intent sequences publish identical
/// event sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A cancel request succeeded.
    CancelAck { order_id: OrderId },
    /// A fill occurred for the stated quantity at the stated price.
    Trade { quantity: Quantity, price: Decimal },
    /// The named order's remaining quantity reached zero.
    OrderFullyFilled { order_id: OrderId },
    /// The named order absorbed `filled_quantity` and has
    /// `remaining_quantity` left.
    OrderPartiallyFilled {
        order_id: OrderId,
        filled_quantity: Quantity,
        remaining_quantity: Quantity,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_intent_equality() {
        let a = Intent::AddLimit {
            order_id: 100000,
            side: Side::Sell,
            quantity: 1,
            price: dec!(1075),
        };
        assert_eq!(a.clone(), a);
        assert_ne!(a, Intent::Cancel { order_id: 100000 });
    }

    #[test]
    fn test_event_round_trips_through_json() {
        let event = EngineEvent::OrderPartiallyFilled {
            order_id: 100007,
            filled_quantity: 1,
            remaining_quantity: 4,
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let back: EngineEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }

    #[test]
    fn test_trade_event_carries_decimal_price() {
        let event = EngineEvent::Trade {
            quantity: 2,
            price: dec!(1025.0),
        };
        match event {
            EngineEvent::Trade { quantity, price } => {
                assert_eq!(quantity, 2);
                assert_eq!(price, dec!(1025));
            }
            _ => panic!("expected a trade event"),
        }
    }
}
