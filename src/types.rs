//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core data types used throughout the matching engine:
// order sides, order kinds, the resting order record, and the price comparison
// helpers that implement the engine's tolerance rule.
//
// | Section            | Description                                                      |
// |--------------------|------------------------------------------------------------------|
// | ENUMS              | Discrete sets of values (Side, OrderKind).                       |
// | STRUCTS            | The resting Order record.                                        |
// | PRICE COMPARISON   | Tolerance constant and crossing predicates.                      |
// | TESTS              | Unit tests for the defined types.                                |
//--------------------------------------------------------------------------------------------------

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Caller-assigned order identifier, unique across the engine's lifetime.
pub type OrderId = u32;

/// Order quantity in whole units.
pub type Quantity = u32;

/// Two prices within this distance of each other are considered equal;
/// the order id decides between them.
pub const PRICE_TOLERANCE: Decimal = dec!(0.00000001);

//--------------------------------------------------------------------------------------------------
//  ENUMS
//--------------------------------------------------------------------------------------------------

/// Represents the side of an order (Buy or Sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// A buy order.
    Buy,
    /// A sell order.
    Sell,
}

impl Side {
    /// Returns the side an incoming order of this side matches against.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Represents the kind of a resting order, influencing its matching
/// behaviour. A stop loss never rests as its own kind: a triggered stop
/// becomes a Market order and an untriggered one rests as a Limit order at
/// its stop price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Executes at a specific price or better.
    Limit,
    /// Executes against whatever the opposite side offers; the price field
    /// records the best opposite quote at acceptance time.
    Market,
}

//--------------------------------------------------------------------------------------------------
//  STRUCTS
//--------------------------------------------------------------------------------------------------

/// A resting order held in the book.
///
/// The record is created when an intent is accepted, mutated only while the
/// matcher consumes it, and destroyed when its remaining quantity reaches
/// zero or it is cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Caller-assigned identifier.
    pub order_id: OrderId,
    /// Side of the order.
    pub side: Side,
    /// Remaining quantity; strictly positive while the order rests.
    pub remaining_quantity: Quantity,
    /// Limit price for Limit orders, reference price for Market orders,
    /// stop price for an untriggered StopLoss.
    pub price: Decimal,
    /// Kind of the order.
    pub kind: OrderKind,
}

impl Order {
    /// Creates a limit order record.
    pub fn limit(order_id: OrderId, side: Side, quantity: Quantity, price: Decimal) -> Self {
        Self {
            order_id,
            side,
            remaining_quantity: quantity,
            price,
            kind: OrderKind::Limit,
        }
    }

    /// Creates a market order record carrying the best opposite quote at
    /// acceptance time as its informational price.
    pub fn market(
        order_id: OrderId,
        side: Side,
        quantity: Quantity,
        reference_price: Decimal,
    ) -> Self {
        Self {
            order_id,
            side,
            remaining_quantity: quantity,
            price: reference_price,
            kind: OrderKind::Market,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} @ {} ({:?})",
            self.order_id, self.side, self.remaining_quantity, self.price, self.kind
        )
    }
}

//--------------------------------------------------------------------------------------------------
//  PRICE COMPARISON
//--------------------------------------------------------------------------------------------------

/// Returns true when the two prices are equal within [`PRICE_TOLERANCE`].
#[inline]
pub fn prices_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= PRICE_TOLERANCE
}

/// Returns true when a taker at `taker_price` can consume a maker resting at
/// `maker_price`. Equal prices (within tolerance) cross.
#[inline]
pub fn prices_cross(taker_side: Side, taker_price: Decimal, maker_price: Decimal) -> bool {
    if prices_equal(taker_price, maker_price) {
        return true;
    }
    match taker_side {
        Side::Buy => maker_price < taker_price,
        Side::Sell => maker_price > taker_price,
    }
}

//--------------------------------------------------------------------------------------------------
//  TESTS
//--------------------------------------------------------------------------------------------------
