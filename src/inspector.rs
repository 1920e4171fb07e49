//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Debug view of the order book: renders both sides in priority order, head
// first. Observable but non-semantic — the dump goes to the debug channel
// and never feeds back into matching.
//--------------------------------------------------------------------------------------------------

use std::fmt::Write as _;

use tracing::debug;

use crate::orderbook::OrderBook;
use crate::types::Side;

/// Renders both sides of the book in priority order.
pub fn render(book: &OrderBook) -> String {
    let mut out = String::new();
    out.push_str("--- BUY ORDERS ---\n");
    for order in book.iter(Side::Buy) {
        let _ = writeln!(out, "{order}");
    }
    out.push_str("--- SELL ORDERS ---\n");
    for order in book.iter(Side::Sell) {
        let _ = writeln!(out, "{order}");
    }
    out.push_str("------------------");
    out
}

/// Dumps the book on the debug channel.
pub fn log_book(book: &OrderBook) {
    debug!(book = %render(book), "order book");
}
