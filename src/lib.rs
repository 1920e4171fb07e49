// Expose the modules
pub mod config;
pub mod decoder;
pub mod events;
pub mod feed;
pub mod inspector;
pub mod matching_engine;
pub mod messages;
pub mod orderbook;
pub mod types;

// Re-export key types for easier usage
pub use config::Config;
pub use decoder::{decode_input, decode_line, DecodeError};
pub use events::{EventLog, EventRecord, EventSink};
pub use matching_engine::{EngineError, MatchEngine};
pub use messages::{EngineEvent, Intent};
pub use orderbook::{BookError, OrderBook};
pub use types::{Order, OrderId, OrderKind, Quantity, Side};
