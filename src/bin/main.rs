//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Entry point for the matchbook engine. With no arguments it feeds the
// built-in fixture through the engine and verifies the emitted event stream
// against the expected one (exit code 0 on match, 1 on mismatch). Other
// modes process an input file or soak the engine with generated intents.
//--------------------------------------------------------------------------------------------------
// Verify the built-in fixture:    cargo run --bin main
// Process an input file:          cargo run --bin main -- --file input.txt
// Random soak run:                cargo run --bin main -- --random 1000 --seed 7
// Export the emitted events:      cargo run --bin main -- --event-file events.jsonl
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rust_decimal_macros::dec;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use matchbook::{
    decode_input, feed::read_intents_from_path, feed::RandomFeed, inspector, Config, EngineEvent,
    EventLog, MatchEngine,
};

/// CLI options for the driver
#[derive(StructOpt, Debug)]
#[structopt(name = "matchbook", about = "Single-instrument order matching engine")]
struct Opt {
    /// Process intents from a file instead of the built-in fixture
    #[structopt(long, parse(from_os_str), help = "Input file, one intent per line")]
    file: Option<PathBuf>,

    /// Soak the engine with generated intents instead of the fixture
    #[structopt(long, help = "Number of random intents to generate")]
    random: Option<usize>,

    /// Seed for the random soak
    #[structopt(long, default_value = "1", help = "Random feed seed")]
    seed: u64,

    /// Print the final order book to stdout
    #[structopt(long, help = "Print the final order book")]
    show_book: bool,

    /// Write the emitted event stream as JSON lines
    #[structopt(long, parse(from_os_str), help = "Event export path (JSON lines)")]
    event_file: Option<PathBuf>,
}

/// The built-in fixture: one intent per line, side 0 = BUY, 1 = SELL.
const FIXTURE_INPUT: &str = "\
0,100000,1,1,1075
0,100001,0,9,1000
0,100002,0,30,975
0,100003,1,10,1050
0,100004,0,10,950
0,100005,1,2,1025
0,100006,0,1,1000
1,100004
0,100007,1,5,1025
0,100008,0,3,1050
5,100009,1,3
5,100010,0,10
6,100011,1,30,1000
";

/// The event stream the fixture must produce, in publish order.
fn expected_fixture_events() -> Vec<EngineEvent> {
    use EngineEvent::*;
    vec![
        CancelAck { order_id: 100004 },
        OrderFullyFilled { order_id: 100005 },
        Trade { quantity: 2, price: dec!(1025.0) },
        OrderPartiallyFilled { order_id: 100008, filled_quantity: 2, remaining_quantity: 1 },
        OrderPartiallyFilled { order_id: 100007, filled_quantity: 1, remaining_quantity: 4 },
        Trade { quantity: 1, price: dec!(1050.0) },
        OrderPartiallyFilled { order_id: 100002, filled_quantity: 3, remaining_quantity: 27 },
        Trade { quantity: 3, price: dec!(975.0) },
        OrderFullyFilled { order_id: 100007 },
        Trade { quantity: 4, price: dec!(1025.0) },
        OrderPartiallyFilled { order_id: 100010, filled_quantity: 4, remaining_quantity: 6 },
        OrderPartiallyFilled { order_id: 100003, filled_quantity: 6, remaining_quantity: 4 },
        Trade { quantity: 6, price: dec!(1025.0) },
        OrderFullyFilled { order_id: 100002 },
        Trade { quantity: 27, price: dec!(975.0) },
        OrderPartiallyFilled { order_id: 100011, filled_quantity: 27, remaining_quantity: 3 },
        OrderPartiallyFilled { order_id: 100001, filled_quantity: 3, remaining_quantity: 6 },
        Trade { quantity: 3, price: dec!(975.0) },
    ]
}

fn verify_events(actual: &[EngineEvent], expected: &[EngineEvent]) -> Result<()> {
    if actual.len() != expected.len() {
        bail!(
            "event count mismatch: expected {}, got {}",
            expected.len(),
            actual.len()
        );
    }
    for (index, (actual, expected)) in actual.iter().zip(expected.iter()).enumerate() {
        if actual != expected {
            bail!(
                "event mismatch at index {}: expected {:?}, got {:?}",
                index,
                expected,
                actual
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opt = Opt::from_args();
    let config = Config::from_env();
    info!(app_id = %config.app_id, "starting matchbook engine");

    // Pick the intent source: explicit file, random soak, configured file,
    // or the built-in fixture. Only the fixture is verified.
    let mut verify_fixture = false;
    let intents = if let Some(path) = opt.file.as_ref() {
        read_intents_from_path(path)
            .with_context(|| format!("failed to read intents from {}", path.display()))?
    } else if let Some(count) = opt.random {
        info!(count, seed = opt.seed, "generating random intent stream");
        RandomFeed::new(opt.seed).batch(count)
    } else if let Some(path) = config.input_file.as_ref() {
        read_intents_from_path(path)
            .with_context(|| format!("failed to read intents from {}", path.display()))?
    } else {
        verify_fixture = true;
        decode_input(FIXTURE_INPUT)
    };

    info!(count = intents.len(), "processing intents");
    let mut engine = MatchEngine::new(EventLog::new());
    for intent in intents {
        engine
            .process(intent)
            .context("engine halted on an integrity failure")?;
    }

    if opt.show_book || config.book_dump {
        println!("{}", inspector::render(engine.book()));
    }

    let log = engine.into_sink();
    for record in log.records() {
        info!(sequence = record.sequence, event = ?record.event, "emitted");
    }

    if let Some(path) = opt.event_file.as_ref() {
        let file = File::create(path)
            .with_context(|| format!("failed to create event file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for record in log.records() {
            serde_json::to_writer(&mut writer, record).context("failed to serialize event")?;
            writer.write_all(b"\n").context("failed to write event")?;
        }
        info!(path = %path.display(), count = log.len(), "event stream exported");
    }

    if verify_fixture {
        verify_events(&log.events(), &expected_fixture_events())?;
        info!("event stream verification passed");
    }

    Ok(())
}
