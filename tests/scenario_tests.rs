//--------------------------------------------------------------------------------------------------
// TEST MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// End-to-end scenarios for the matching engine, driven through the decoder
// exactly as the driver would. The canonical scenario pins the engine's
// observable contract: the full ordered event stream for a fixed intent
// sequence. The remaining tests check the book invariants and the engine
// laws on top of it.
//--------------------------------------------------------------------------------------------------

use matchbook::{
    decode_input, inspector, EngineEvent, EventLog, Intent, MatchEngine, OrderKind, Side,
};
use rust_decimal_macros::dec;

const CANONICAL_INPUT: &str = "\
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

fn expected_canonical_events() -> Vec<EngineEvent> {
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

fn run(intents: Vec<Intent>) -> MatchEngine<EventLog> {
    let mut engine = MatchEngine::new(EventLog::new());
    for intent in intents {
        engine.process(intent).expect("intent processing failed");
    }
    engine
}

#[test]
fn canonical_scenario_reproduces_the_expected_event_stream() {
    let engine = run(decode_input(CANONICAL_INPUT));
    assert_eq!(engine.sink().events(), expected_canonical_events());
}

#[test]
fn canonical_scenario_leaves_the_expected_book() {
    let engine = run(decode_input(CANONICAL_INPUT));
    let book = engine.book();

    let buys: Vec<_> = book
        .iter(Side::Buy)
        .map(|o| (o.order_id, o.remaining_quantity, o.price))
        .collect();
    assert_eq!(buys, vec![(100001, 6, dec!(1000)), (100006, 1, dec!(1000))]);

    let sells: Vec<_> = book
        .iter(Side::Sell)
        .map(|o| (o.order_id, o.remaining_quantity, o.price))
        .collect();
    assert_eq!(sells, vec![(100003, 4, dec!(1050)), (100000, 1, dec!(1075))]);
}

#[test]
fn book_invariants_hold_after_every_intent() {
    let intents = decode_input(CANONICAL_INPUT);
    let mut engine = MatchEngine::new(EventLog::new());
    for intent in intents {
        engine.process(intent).expect("intent processing failed");

        // Identity index and price-time index agree, and every resting order
        // has a positive remainder.
        engine.book().validate().expect("book invariants violated");

        // Each side iterates in its priority order: (price, id) ascending.
        for side in [Side::Buy, Side::Sell] {
            let keys: Vec<_> = engine
                .book()
                .iter(side)
                .map(|o| (o.price, o.order_id))
                .collect();
            let mut sorted = keys.clone();
            sorted.sort();
            assert_eq!(keys, sorted);
        }
    }
}

#[test]
fn undecodable_lines_do_not_disturb_the_stream() {
    // Same fixture with a garbage line spliced in: the decoder skips it and
    // the emitted stream is unchanged.
    let noisy = CANONICAL_INPUT.replace("0,100005,1,2,1025", "BADMESSAGE\n0,100005,1,2,1025");
    let engine = run(decode_input(&noisy));
    assert_eq!(engine.sink().events(), expected_canonical_events());
}

#[test]
fn add_then_cancel_restores_the_book_and_emits_only_the_ack() {
    let seed = decode_input("0,1,0,9,1000\n0,2,1,10,1050\n");
    let mut engine = run(seed);
    let before = inspector::render(engine.book());
    let events_before = engine.sink().len();

    engine
        .process(Intent::AddLimit {
            order_id: 3,
            side: Side::Buy,
            quantity: 5,
            price: dec!(990),
        })
        .unwrap();
    engine.process(Intent::Cancel { order_id: 3 }).unwrap();

    assert_eq!(inspector::render(engine.book()), before);
    let tail: Vec<_> = engine.sink().events().split_off(events_before);
    assert_eq!(tail, vec![EngineEvent::CancelAck { order_id: 3 }]);
}

#[test]
fn second_cancel_for_the_same_id_is_silent() {
    let mut engine = run(decode_input("0,1,0,9,1000\n"));
    engine.process(Intent::Cancel { order_id: 1 }).unwrap();
    engine.process(Intent::Cancel { order_id: 1 }).unwrap();

    let acks = engine
        .sink()
        .events()
        .iter()
        .filter(|e| matches!(e, EngineEvent::CancelAck { .. }))
        .count();
    assert_eq!(acks, 1);
}

#[test]
fn strictly_separated_sides_never_trade() {
    // Every buy rests strictly below every sell.
    let input = "\
0,1,0,5,900
0,2,1,5,1100
0,3,0,7,950
0,4,1,2,1050
0,5,0,1,800
0,6,1,9,1200
";
    let engine = run(decode_input(input));
    assert!(engine
        .sink()
        .events()
        .iter()
        .all(|e| !matches!(e, EngineEvent::Trade { .. })));
    assert_eq!(engine.book().order_count(Side::Buy), 3);
    assert_eq!(engine.book().order_count(Side::Sell), 3);
}

#[test]
fn traded_quantity_matches_the_taker_decrease() {
    // Two makers, one taker that outlasts both and rests with a remainder.
    // No taker-exhausting cross happens, so every trade describes one fill.
    let mut engine = run(decode_input("0,1,1,2,1025\n0,2,1,5,1025\n"));
    engine
        .process(Intent::AddLimit {
            order_id: 3,
            side: Side::Buy,
            quantity: 10,
            price: dec!(1050),
        })
        .unwrap();

    let traded: u32 = engine
        .sink()
        .events()
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Trade { quantity, .. } => Some(*quantity),
            _ => None,
        })
        .sum();
    assert_eq!(traded, 7);

    let taker = engine.book().get(3).expect("taker residual rests");
    assert_eq!(taker.remaining_quantity, 3);
    assert_eq!(engine.book().order_count(Side::Sell), 0);
}

#[test]
fn traded_quantity_discounts_the_completion_trade_when_the_taker_exhausts() {
    // The taker is consumed exactly by the second maker, so the final cross
    // additionally announces the taker's completion with a second trade at
    // the taker's price. That trade restates the final fill rather than
    // describing a new one: the conserved quantity is the trade sum minus
    // the restatement.
    let mut engine = run(decode_input("0,1,1,2,1025\n0,2,1,5,1025\n"));
    engine
        .process(Intent::AddLimit {
            order_id: 3,
            side: Side::Buy,
            quantity: 7,
            price: dec!(1050),
        })
        .unwrap();

    let events = engine.sink().events();
    assert_eq!(
        events[events.len() - 2],
        EngineEvent::OrderFullyFilled { order_id: 3 }
    );
    let completion = match &events[events.len() - 1] {
        EngineEvent::Trade { quantity, price } => {
            assert_eq!(*price, dec!(1050));
            *quantity
        }
        other => panic!("expected a completion trade, got {other:?}"),
    };

    let traded: u32 = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Trade { quantity, .. } => Some(*quantity),
            _ => None,
        })
        .sum();

    // The taker asked for 7 and left nothing resting; both makers are gone.
    assert_eq!(traded - completion, 7);
    assert!(!engine.book().contains(3));
    assert!(engine.book().is_empty());
}

#[test]
fn single_add_limit_produces_no_events() {
    let engine = run(decode_input("0,1,0,9,1000\n"));
    assert!(engine.sink().is_empty());
}

#[test]
fn equal_priced_orders_cross_in_arrival_order() {
    let mut engine = run(decode_input("0,1,1,2,1025\n0,2,1,2,1025\n"));
    engine
        .process(Intent::AddLimit {
            order_id: 3,
            side: Side::Buy,
            quantity: 2,
            price: dec!(1025),
        })
        .unwrap();

    // The lower id at the same price is consumed; the later arrival stays.
    assert!(!engine.book().contains(1));
    assert!(engine.book().contains(2));
    assert_eq!(
        engine.sink().events()[0],
        EngineEvent::OrderFullyFilled { order_id: 1 }
    );
}

#[test]
fn market_buy_against_an_empty_ask_side_rests_at_reference_zero() {
    let mut engine = MatchEngine::new(EventLog::new());
    engine
        .process(Intent::Market {
            order_id: 1,
            side: Side::Buy,
            quantity: 10,
        })
        .unwrap();

    assert!(engine.sink().is_empty());
    let residual = engine.book().get(1).expect("residual rests on the bid side");
    assert_eq!(residual.side, Side::Buy);
    assert_eq!(residual.kind, OrderKind::Market);
    assert_eq!(residual.price, dec!(0));
    assert_eq!(residual.remaining_quantity, 10);
}

#[test]
fn triggered_stop_loss_behaves_exactly_like_a_market_order() {
    let seed = "0,1,0,9,1000\n0,2,0,30,975\n";

    let mut stop_engine = run(decode_input(seed));
    stop_engine
        .process(Intent::StopLoss {
            order_id: 3,
            side: Side::Sell,
            quantity: 3,
            stop_price: dec!(975),
        })
        .unwrap();

    let mut market_engine = run(decode_input(seed));
    market_engine
        .process(Intent::Market {
            order_id: 3,
            side: Side::Sell,
            quantity: 3,
        })
        .unwrap();

    assert_eq!(
        stop_engine.sink().events(),
        market_engine.sink().events()
    );
    assert_eq!(
        inspector::render(stop_engine.book()),
        inspector::render(market_engine.book())
    );
}
