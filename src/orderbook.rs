//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the price-time index for a single instrument: two
// ordered collections (buy side, sell side) keyed by (price, order id), plus
// an identity index from order id to the order's location. All mutating
// operations are O(log n); best-order lookup is O(1) amortised.
//
// Both sides are keyed ascending: the head of a side is the entry with the
// lowest (price, order id) pair, ties resolved by the smaller id. The head of
// the opposite side is the match candidate during matching, and the emitted
// event stream depends on this ordering on both sides.
//
// | Name          | Description                                        | Key Methods              |
// |---------------|----------------------------------------------------|--------------------------|
// | OrderBook     | Two-sided price-time index with identity lookup    | insert                   |
// |               |                                                    | peek_best / pop_best     |
// |               |                                                    | remove / get / fill      |
// | BookError     | Fatal index integrity violations                   |                          |
//--------------------------------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Order, OrderId, Quantity, Side};

/// Composite ordering key: price first, then order id for arrival ties.
type BookKey = (Decimal, OrderId);

/// Integrity violations inside the book. These are programmer errors: the
/// engine halts on them rather than continuing with a corrupt index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// An insert was attempted for an order id already present on either side.
    #[error("order id {0} is already present in the book")]
    DuplicateOrderId(OrderId),

    /// The identity index named a location the price-time index does not hold.
    #[error("identity index and price-time index diverge for order id {0}")]
    IndexDivergence(OrderId),

    /// A fill was requested for more quantity than the order has left.
    #[error("fill of {requested} exceeds remaining quantity {remaining} for order id {order_id}")]
    FillExceedsRemaining {
        order_id: OrderId,
        requested: Quantity,
        remaining: Quantity,
    },

    /// A resting order was found with zero remaining quantity.
    #[error("resting order id {0} has zero remaining quantity")]
    RestingZeroQuantity(OrderId),
}

/// The two-sided order book.
#[derive(Debug, Default)]
pub struct OrderBook {
    /// Buy side, keyed by (price, order id) ascending.
    buys: BTreeMap<BookKey, Order>,
    /// Sell side, keyed by (price, order id) ascending.
    sells: BTreeMap<BookKey, Order>,
    /// Identity index: order id to (side, price) location. Presence here is
    /// authoritative for order liveness.
    locations: HashMap<OrderId, (Side, Decimal)>,
}

impl OrderBook {
    /// Creates a new empty order book.
    pub fn new() -> Self {
        Self::default()
    }

    fn side_map(&self, side: Side) -> &BTreeMap<BookKey, Order> {
        match side {
            Side::Buy => &self.buys,
            Side::Sell => &self.sells,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<BookKey, Order> {
        match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        }
    }

    /// Adds an order to its side and to the identity index.
    ///
    /// # Errors
    /// Returns [`BookError::DuplicateOrderId`] when the id is already resting
    /// on either side.
    pub fn insert(&mut self, order: Order) -> Result<(), BookError> {
        if self.locations.contains_key(&order.order_id) {
            return Err(BookError::DuplicateOrderId(order.order_id));
        }
        self.locations
            .insert(order.order_id, (order.side, order.price));
        let key = (order.price, order.order_id);
        self.side_map_mut(order.side).insert(key, order);
        Ok(())
    }

    /// Returns the head of a side without removing it.
    pub fn peek_best(&self, side: Side) -> Option<&Order> {
        self.side_map(side).first_key_value().map(|(_, order)| order)
    }

    /// Removes and returns the head of a side, erasing it from the identity
    /// index as well.
    pub fn pop_best(&mut self, side: Side) -> Option<Order> {
        let (_, order) = self.side_map_mut(side).pop_first()?;
        self.locations.remove(&order.order_id);
        Some(order)
    }

    /// Removes an order by id from both structures.
    ///
    /// Idempotent on absence: returns `None` when the id is not resting.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let (side, price) = self.locations.remove(&order_id)?;
        self.side_map_mut(side).remove(&(price, order_id))
    }

    /// Looks up a resting order by id without removing it.
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        let (side, price) = self.locations.get(&order_id)?;
        self.side_map(*side).get(&(*price, order_id))
    }

    /// Returns true when the id is currently resting.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.locations.contains_key(&order_id)
    }

    /// Decrements an order's remaining quantity in place and returns the new
    /// remainder. The order stays in the book even when the remainder reaches
    /// zero; the caller decides whether to remove it.
    ///
    /// # Errors
    /// Returns [`BookError::IndexDivergence`] when the identity index names a
    /// missing entry, or [`BookError::FillExceedsRemaining`] when `quantity`
    /// is larger than what the order has left.
    pub fn fill(&mut self, order_id: OrderId, quantity: Quantity) -> Result<Quantity, BookError> {
        let (side, price) = self
            .locations
            .get(&order_id)
            .copied()
            .ok_or(BookError::IndexDivergence(order_id))?;
        let order = self
            .side_map_mut(side)
            .get_mut(&(price, order_id))
            .ok_or(BookError::IndexDivergence(order_id))?;
        if quantity > order.remaining_quantity {
            return Err(BookError::FillExceedsRemaining {
                order_id,
                requested: quantity,
                remaining: order.remaining_quantity,
            });
        }
        order.remaining_quantity -= quantity;
        Ok(order.remaining_quantity)
    }

    /// Returns the price at the head of a side, if any.
    pub fn best_price(&self, side: Side) -> Option<Decimal> {
        self.peek_best(side).map(|order| order.price)
    }

    /// Iterates a side in priority order (head first).
    pub fn iter(&self, side: Side) -> impl Iterator<Item = &Order> {
        self.side_map(side).values()
    }

    /// Returns the number of orders resting on a side.
    pub fn order_count(&self, side: Side) -> usize {
        self.side_map(side).len()
    }

    /// Returns true when neither side holds any order.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Checks the structural invariants: the identity index and the two sides
    /// agree entry for entry, and every resting order has positive remaining
    /// quantity.
    pub fn validate(&self) -> Result<(), BookError> {
        for (side, map) in [(Side::Buy, &self.buys), (Side::Sell, &self.sells)] {
            for ((price, id), order) in map {
                if order.order_id != *id || order.price != *price || order.side != side {
                    return Err(BookError::IndexDivergence(*id));
                }
                if self.locations.get(id) != Some(&(side, *price)) {
                    return Err(BookError::IndexDivergence(*id));
                }
                if order.remaining_quantity == 0 {
                    return Err(BookError::RestingZeroQuantity(*id));
                }
            }
        }
        // Every entry is located; equal sizes rule out phantom identity rows.
        if self.locations.len() != self.buys.len() + self.sells.len() {
            let stray = self
                .locations
                .keys()
                .find(|id| self.get(**id).is_none())
                .copied()
                .unwrap_or_default();
            return Err(BookError::IndexDivergence(stray));
        }
        Ok(())
    }
}
