#[path = "../common/mod.rs"]
mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::{Counters, StubBackend};
use parsebridge::config::BridgeSettings;
use parsebridge::metadata::{ParseOptions, ParseOutcome, ParserClient};
use parsebridge::worker::{Bridge, ErrorKind, RemoteBridge, Request};
use serde_json::{json, Value};

fn shared_bridge(dispatch_threads: usize) -> (Arc<RemoteBridge>, Arc<Counters>) {
    let (backend, counters) = StubBackend::new();
    let settings = BridgeSettings {
        dispatch_threads,
        ..BridgeSettings::default()
    };
    let bridge = RemoteBridge::spawn_with_settings(move || Ok(backend), &settings).unwrap();
    (Arc::new(bridge), counters)
}

#[test]
fn test_concurrent_calls_each_get_their_own_reply() {
    const CALLERS: usize = 16;
    let (bridge, counters) = shared_bridge(4);
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let source = format!("let v{i} = {i};");
                barrier.wait();
                let value = bridge
                    .call(Request::maybe_parse(source.clone(), ParseOptions::new()))
                    .unwrap();
                (source, value)
            })
        })
        .collect();

    for handle in handles {
        let (source, value) = handle.join().unwrap();
        assert_eq!(value["ast"]["source"], Value::from(source));
    }
    assert_eq!(Counters::get(&counters.parse), CALLERS);
}

#[test]
fn test_replies_are_matched_by_call_not_by_order() {
    let (bridge, _counters) = shared_bridge(2);

    // The slow call is posted first but finishes last.
    let slow = {
        let bridge = Arc::clone(&bridge);
        thread::spawn(move || {
            bridge
                .call(Request::maybe_parse("sleep:200:slow", ParseOptions::new()))
                .unwrap()
        })
    };
    thread::sleep(std::time::Duration::from_millis(20));
    let fast = bridge
        .call(Request::maybe_parse("sleep:0:fast", ParseOptions::new()))
        .unwrap();

    assert_eq!(fast["ast"]["tag"], "fast");
    assert!(!slow.is_finished(), "fast call waited behind the slow one");
    assert_eq!(slow.join().unwrap()["ast"]["tag"], "slow");
}

#[test]
fn test_failures_do_not_leak_into_other_calls() {
    const CALLERS: usize = 12;
    let (bridge, _counters) = shared_bridge(3);

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                let source = match i % 3 {
                    0 => format!("throw:error {i}"),
                    1 => "panic".to_string(),
                    _ => format!("ok {i}"),
                };
                (i, bridge.call(Request::maybe_parse(source, ParseOptions::new())))
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        match i % 3 {
            0 => {
                let err = result.unwrap_err();
                assert_eq!(err.kind(), Some(ErrorKind::Dispatch));
                assert_eq!(err.payload().unwrap().message, format!("error {i}"));
            }
            1 => assert_eq!(result.unwrap_err().kind(), Some(ErrorKind::Panic)),
            _ => assert_eq!(result.unwrap()["ast"]["source"], json!(format!("ok {i}"))),
        }
    }
}

#[test]
fn test_racing_first_access_fetches_metadata_once() {
    const CALLERS: usize = 8;
    let (bridge, counters) = shared_bridge(1);
    let client = Arc::new(ParserClient::new(bridge));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let client = Arc::clone(&client);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                client.visitor_keys().unwrap().len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    assert_eq!(Counters::get(&counters.visitor_keys), 1);

    let outcome: ParseOutcome<Value> = client.maybe_parse("a;", &ParseOptions::new()).unwrap();
    assert!(!outcome.is_deferred());
}

#[test]
fn test_every_call_gets_exactly_its_own_reply_under_load() {
    const CALLS: usize = 200;
    const THREADS: usize = 8;
    let (bridge, counters) = shared_bridge(4);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                (t..CALLS)
                    .step_by(THREADS)
                    .map(|i| {
                        let source = match i % 4 {
                            0 => format!("throw:failure {i}"),
                            1 => "panic".to_string(),
                            2 => "handle".to_string(),
                            _ => format!("ok {i}"),
                        };
                        (i, bridge.call(Request::maybe_parse(source, ParseOptions::new())))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = 0;
    for handle in handles {
        for (i, result) in handle.join().unwrap() {
            seen += 1;
            match i % 4 {
                0 => {
                    let err = result.unwrap_err();
                    assert_eq!(err.kind(), Some(ErrorKind::Dispatch));
                    assert_eq!(err.payload().unwrap().message, format!("failure {i}"));
                }
                1 => assert_eq!(result.unwrap_err().kind(), Some(ErrorKind::Panic)),
                2 => assert_eq!(result.unwrap_err().kind(), Some(ErrorKind::Transport)),
                _ => assert_eq!(result.unwrap()["ast"]["source"], json!(format!("ok {i}"))),
            }
        }
    }
    assert_eq!(seen, CALLS);
    assert_eq!(Counters::get(&counters.parse), CALLS);
    assert!(bridge.is_alive());
}
