//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module implements the core matching logic: the engine accepts one
// intent at a time, mutates the book, and publishes the resulting lifecycle
// and settlement events into its sink before returning.
//
// | Name            | Description                                       | Key Methods       |
// |-----------------|---------------------------------------------------|-------------------|
// | MatchEngine     | Facade: dispatches intents, drives the matcher    | process           |
// | EngineError     | Fatal integrity failures surfaced to the caller   |                   |
//
// Matching walks the head of the opposite side while the taker has quantity
// left and the price condition holds (always, for market takers). Each cross
// iteration publishes its events in a fixed order; that order, across
// iterations and across intents, is the engine's observable contract.
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::events::EventSink;
use crate::inspector;
use crate::messages::{EngineEvent, Intent};
use crate::orderbook::{BookError, OrderBook};
use crate::types::{prices_cross, Order, OrderId, OrderKind, Quantity, Side};

/// Fatal failures while processing an intent. Business-level no-ops (for
/// example cancelling an unknown id) are not errors; they simply publish
/// nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The book's structural integrity was violated.
    #[error("order book integrity failure: {0}")]
    Book(#[from] BookError),
}

/// Type alias for Result with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

/// The matching engine for a single instrument.
///
/// Strictly single-threaded and synchronous: intents are processed one at a
/// time in the caller's order, and every event an intent causes has been
/// published by the time [`MatchEngine::process`] returns.
#[derive(Debug)]
pub struct MatchEngine<S: EventSink> {
    /// The two-sided price-time index.
    book: OrderBook,
    /// Receiver of every published event, invoked synchronously.
    sink: S,
}

impl<S: EventSink> MatchEngine<S> {
    /// Creates an engine publishing into the given sink.
    pub fn new(sink: S) -> Self {
        Self {
            book: OrderBook::new(),
            sink,
        }
    }

    /// Read access to the current book state.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Read access to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the engine and returns the sink with everything it collected.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Accepts one intent, fully processes it, and returns once every
    /// resulting event has been published and every book mutation committed.
    ///
    /// # Errors
    /// Only internal integrity violations (duplicate order id, index
    /// divergence) surface as errors; the book must not be used afterwards.
    pub fn process(&mut self, intent: Intent) -> EngineResult<()> {
        match intent {
            Intent::AddLimit {
                order_id,
                side,
                quantity,
                price,
            } => self.add_limit(order_id, side, quantity, price)?,
            Intent::Cancel { order_id } => self.cancel(order_id),
            Intent::Market {
                order_id,
                side,
                quantity,
            } => self.market(order_id, side, quantity)?,
            Intent::StopLoss {
                order_id,
                side,
                quantity,
                stop_price,
            } => self.stop_loss(order_id, side, quantity, stop_price)?,
        }
        inspector::log_book(&self.book);
        #[cfg(debug_assertions)]
        self.book.validate()?;
        Ok(())
    }

    /// Lodges a limit order on its own side, then matches it against the
    /// opposite side.
    fn add_limit(
        &mut self,
        order_id: OrderId,
        side: Side,
        quantity: Quantity,
        price: Decimal,
    ) -> EngineResult<()> {
        self.book.insert(Order::limit(order_id, side, quantity, price))?;
        self.run_matching(order_id)
    }

    /// Removes a resting order and acknowledges the cancel. Unknown ids are
    /// dropped without an event.
    fn cancel(&mut self, order_id: OrderId) {
        if self.book.remove(order_id).is_some() {
            self.sink.publish(EngineEvent::CancelAck { order_id });
        } else {
            debug!(order_id, "cancel for unknown order id ignored");
        }
    }

    /// Lodges a market order at the best opposite quote (0 when that side is
    /// empty) and sweeps the opposite side. Any residual stays resting on the
    /// taker's own side at that reference price.
    fn market(&mut self, order_id: OrderId, side: Side, quantity: Quantity) -> EngineResult<()> {
        let reference = self.book.best_price(side.opposite()).unwrap_or(Decimal::ZERO);
        self.book
            .insert(Order::market(order_id, side, quantity, reference))?;
        self.run_matching(order_id)
    }

    /// Evaluates the stop trigger against the best opposite quote at
    /// acceptance time. A triggered stop becomes a market order; an
    /// untriggered stop rests as an ordinary limit order at its stop price.
    fn stop_loss(
        &mut self,
        order_id: OrderId,
        side: Side,
        quantity: Quantity,
        stop_price: Decimal,
    ) -> EngineResult<()> {
        let reference = self.book.best_price(side.opposite()).unwrap_or(Decimal::ZERO);
        let triggered = match side {
            Side::Buy => stop_price <= reference,
            Side::Sell => stop_price >= reference,
        };
        if triggered {
            debug!(order_id, %stop_price, %reference, "stop loss triggered");
            self.market(order_id, side, quantity)
        } else {
            self.book
                .insert(Order::limit(order_id, side, quantity, stop_price))?;
            self.run_matching(order_id)
        }
    }

    /// Walks the best opposite quotes until the taker is exhausted or no
    /// further crossing exists. The taker is already resting on its own side
    /// and leaves through its own id when it completes.
    fn run_matching(&mut self, taker_id: OrderId) -> EngineResult<()> {
        loop {
            let Some(taker) = self.book.get(taker_id) else {
                return Ok(());
            };
            if taker.remaining_quantity == 0 {
                return Ok(());
            }
            let taker_side = taker.side;
            let taker_price = taker.price;
            let taker_kind = taker.kind;
            let taker_remaining = taker.remaining_quantity;

            let opposite = taker_side.opposite();
            let Some(maker) = self.book.peek_best(opposite) else {
                return Ok(());
            };
            if taker_kind != OrderKind::Market
                && !prices_cross(taker_side, taker_price, maker.price)
            {
                return Ok(());
            }
            let maker_id = maker.order_id;
            let maker_price = maker.price;
            let maker_remaining = maker.remaining_quantity;

            if maker_remaining <= taker_remaining {
                // Maker fully consumed: it leaves both indexes before its
                // events go out.
                self.book.pop_best(opposite);
                self.sink
                    .publish(EngineEvent::OrderFullyFilled { order_id: maker_id });
                self.sink.publish(EngineEvent::Trade {
                    quantity: maker_remaining,
                    price: maker_price,
                });
                let taker_left = self.book.fill(taker_id, maker_remaining)?;
                if taker_left == 0 {
                    // The taker's completion is announced with its own trade
                    // at the taker's price; the second event is how consumers
                    // tell taker-exhausting fills from maker-exhausting ones.
                    self.sink
                        .publish(EngineEvent::OrderFullyFilled { order_id: taker_id });
                    self.sink.publish(EngineEvent::Trade {
                        quantity: maker_remaining,
                        price: taker_price,
                    });
                    self.book.remove(taker_id);
                    return Ok(());
                }
                self.sink.publish(EngineEvent::OrderPartiallyFilled {
                    order_id: taker_id,
                    filled_quantity: maker_remaining,
                    remaining_quantity: taker_left,
                });
            } else {
                // Taker fully consumed, maker trimmed in place. The trade is
                // reported at the taker's price.
                let trade_quantity = taker_remaining;
                let maker_left = self.book.fill(maker_id, trade_quantity)?;
                self.sink.publish(EngineEvent::OrderPartiallyFilled {
                    order_id: maker_id,
                    filled_quantity: trade_quantity,
                    remaining_quantity: maker_left,
                });
                self.sink.publish(EngineEvent::Trade {
                    quantity: trade_quantity,
                    price: taker_price,
                });
                self.book.remove(taker_id);
                if taker_kind != OrderKind::Market {
                    return Ok(());
                }
                // A market taker re-enters the loop, which observes the
                // removed taker and stops.
            }
        }
    }
}
