//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Intent sources for the engine: a file feed that decodes an input file, and
// two generated feeds (random and sequential) for soak runs. The generated
// feeds are owned instances with their own id state; they emit well-formed
// intents only — malformed input is a decoder concern.
//--------------------------------------------------------------------------------------------------

use std::fs;
use std::io;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::decoder::decode_input;
use crate::messages::Intent;
use crate::types::{OrderId, Side};

/// Reads a whole input file and decodes it, one intent per line. Undecodable
/// lines are logged and skipped by the decoder.
pub fn read_intents_from_path(path: impl AsRef<Path>) -> io::Result<Vec<Intent>> {
    let text = fs::read_to_string(path)?;
    Ok(decode_input(&text))
}

/// Seedable source of a mixed intent stream: adds, cancels of previously
/// issued orders, market sweeps and stop losses, with prices in a narrow
/// band so that crossings actually happen.
#[derive(Debug)]
pub struct RandomFeed {
    rng: StdRng,
    next_order_id: OrderId,
    open_orders: Vec<OrderId>,
}

impl RandomFeed {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_order_id: 1,
            open_orders: Vec::new(),
        }
    }

    /// Produces the next intent. Cancels are only emitted once at least one
    /// add has been issued; the cancelled id is drawn from the open set.
    pub fn next_intent(&mut self) -> Intent {
        loop {
            match self.rng.gen_range(0..5u8) {
                0 | 4 => {
                    let order_id = self.take_order_id();
                    self.open_orders.push(order_id);
                    return Intent::AddLimit {
                        order_id,
                        side: self.random_side(),
                        quantity: self.rng.gen_range(1..=10),
                        price: self.random_price(),
                    };
                }
                1 => {
                    if self.open_orders.is_empty() {
                        continue;
                    }
                    let index = self.rng.gen_range(0..self.open_orders.len());
                    let order_id = self.open_orders.swap_remove(index);
                    return Intent::Cancel { order_id };
                }
                2 => {
                    return Intent::Market {
                        order_id: self.take_order_id(),
                        side: self.random_side(),
                        quantity: self.rng.gen_range(1..=10),
                    };
                }
                _ => {
                    return Intent::StopLoss {
                        order_id: self.take_order_id(),
                        side: self.random_side(),
                        quantity: self.rng.gen_range(1..=10),
                        stop_price: self.random_price(),
                    };
                }
            }
        }
    }

    /// Produces a batch of `count` intents.
    pub fn batch(&mut self, count: usize) -> Vec<Intent> {
        (0..count).map(|_| self.next_intent()).collect()
    }

    fn take_order_id(&mut self) -> OrderId {
        let order_id = self.next_order_id;
        self.next_order_id += 1;
        order_id
    }

    fn random_side(&mut self) -> Side {
        if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    fn random_price(&mut self) -> Decimal {
        Decimal::from(self.rng.gen_range(999..=1001))
    }
}

/// Simpler generated source: adds and cancels only, with monotonically
/// increasing order ids and a wider price band.
#[derive(Debug)]
pub struct SequentialFeed {
    rng: StdRng,
    next_order_id: OrderId,
    open_orders: Vec<OrderId>,
}

impl SequentialFeed {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_order_id: 1,
            open_orders: Vec::new(),
        }
    }

    pub fn next_intent(&mut self) -> Intent {
        loop {
            if self.rng.gen_bool(0.5) {
                let order_id = self.next_order_id;
                self.next_order_id += 1;
                self.open_orders.push(order_id);
                // Two decimal places, 900.00 to 1899.99.
                let price = Decimal::new(self.rng.gen_range(90_000..190_000), 2);
                return Intent::AddLimit {
                    order_id,
                    side: if self.rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
                    quantity: self.rng.gen_range(1..=10),
                    price,
                };
            }
            if self.open_orders.is_empty() {
                continue;
            }
            let index = self.rng.gen_range(0..self.open_orders.len());
            let order_id = self.open_orders.swap_remove(index);
            return Intent::Cancel { order_id };
        }
    }

    pub fn batch(&mut self, count: usize) -> Vec<Intent> {
        (0..count).map(|_| self.next_intent()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_feed_is_deterministic_per_seed() {
        let a = RandomFeed::new(42).batch(50);
        let b = RandomFeed::new(42).batch(50);
        assert_eq!(a, b);
        assert_ne!(a, RandomFeed::new(43).batch(50));
    }

    #[test]
    fn test_random_feed_assigns_unique_ids() {
        let intents = RandomFeed::new(7).batch(200);
        let mut seen = HashSet::new();
        for intent in &intents {
            match intent {
                Intent::AddLimit { order_id, .. }
                | Intent::Market { order_id, .. }
                | Intent::StopLoss { order_id, .. } => {
                    assert!(seen.insert(*order_id), "duplicate id {order_id}");
                }
                Intent::Cancel { order_id } => {
                    // Cancels reference ids handed out earlier.
                    assert!(seen.contains(order_id));
                }
            }
        }
    }

    #[test]
    fn test_random_feed_quantities_are_positive() {
        for intent in RandomFeed::new(3).batch(100) {
            match intent {
                Intent::AddLimit { quantity, .. }
                | Intent::Market { quantity, .. }
                | Intent::StopLoss { quantity, .. } => assert!(quantity >= 1),
                Intent::Cancel { .. } => {}
            }
        }
    }

    #[test]
    fn test_sequential_feed_ids_increase() {
        let intents = SequentialFeed::new(5).batch(100);
        let mut last = 0;
        for intent in intents {
            if let Intent::AddLimit { order_id, .. } = intent {
                assert!(order_id > last);
                last = order_id;
            }
        }
        assert!(last > 0, "feed produced no adds");
    }
}
