//! Integration tests for the engine lifecycle
//!
//! These tests run the worker on its own thread and drive it through the
//! handle:
//! - Startup and shutdown
//! - Adding, editing, and removing channels
//! - Snapshot publication while ticking

mod common;

use common::builders::ChannelBuilder;
use std::thread;
use std::time::Duration;
use tempvis_rs::engine::{Engine, EngineMessage, SequenceSource};
use tempvis_rs::{EngineConfig, EngineError, LimitStatus, ThresholdConfig, MAX_WINDOW};

fn fast_config(channels: usize) -> EngineConfig {
    EngineConfig::default()
        .with_initial_channels(channels)
        .with_tick_interval_ms(10)
}

#[test]
fn test_engine_creation_and_shutdown() {
    let (engine, handle) = Engine::new(fast_config(1));
    let worker = engine.spawn().unwrap();

    thread::sleep(Duration::from_millis(50));
    handle.shutdown();

    let result = worker.join();
    assert!(result.is_ok(), "Engine thread should exit cleanly");
    assert!(!handle.is_running());
    assert!(handle
        .drain()
        .iter()
        .any(|msg| matches!(msg, EngineMessage::Shutdown)));
}

#[test]
fn test_ticks_keep_window_full_and_ordered() {
    let (engine, handle) = Engine::new(fast_config(2));
    let worker = engine.spawn().unwrap();

    thread::sleep(Duration::from_millis(100));
    let snapshot = handle.snapshot();
    handle.shutdown();
    worker.join().unwrap();

    assert!(snapshot.generation > 0, "worker should have published ticks");
    for channel in &snapshot.channels {
        assert_eq!(channel.history.len(), MAX_WINDOW);
        let times: Vec<i64> = channel.history.iter().map(|s| s.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(channel.history.last().map(|s| s.value), Some(channel.current_value));
        assert_eq!(Some(channel.last_update_time), snapshot.tick_time);
    }
}

#[test]
fn test_add_update_remove_round_trip() {
    let (engine, handle) = Engine::new(fast_config(1));
    let worker = engine.spawn().unwrap();

    let id = handle.add_channel().unwrap();
    assert_eq!(id, "channel_1");
    assert!(handle.snapshot().get(&id).is_some());

    handle
        .update_thresholds(&id, ThresholdConfig::enabled(Some(-1_000.0), None))
        .unwrap();
    assert!(handle.snapshot().get(&id).unwrap().thresholds.enabled);

    handle.remove_channels([id.clone()]);
    // The next request is processed after the removal
    let next = handle.add_channel().unwrap();
    assert_eq!(next, "channel_1");

    handle.shutdown();
    worker.join().unwrap();

    let messages = handle.drain();
    assert!(messages
        .iter()
        .any(|m| matches!(m, EngineMessage::ChannelsRemoved(ids) if ids == &[id.clone()])));
    assert!(messages.iter().any(|m| matches!(
        m,
        EngineMessage::BreachChanged { status: LimitStatus::High, .. }
    )));
}

#[test]
fn test_rejected_requests_are_reported() {
    let (engine, handle) = Engine::new(fast_config(1));
    let worker = engine.spawn().unwrap();

    let err = handle
        .update_thresholds("channel_42", ThresholdConfig::enabled(Some(1.0), None))
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(ref id) if id == "channel_42"));

    let dup = ChannelBuilder::new("channel_0").build();
    let err = handle.insert_channel(dup).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateId(_)));
    assert_eq!(handle.snapshot().len(), 1);

    handle.shutdown();
    worker.join().unwrap();
}

#[test]
fn test_pause_stops_ticking() {
    let config = fast_config(1);
    let (engine, handle) = Engine::with_random(config, Box::new(SequenceSource::midpoint()));
    let worker = engine.spawn().unwrap();

    handle.pause();
    thread::sleep(Duration::from_millis(50));
    let paused_at = handle.snapshot().tick_time;
    thread::sleep(Duration::from_millis(50));
    assert_eq!(handle.snapshot().tick_time, paused_at);

    handle.resume();
    thread::sleep(Duration::from_millis(50));
    assert_ne!(handle.snapshot().tick_time, paused_at);

    handle.shutdown();
    worker.join().unwrap();
}

#[test]
fn test_stats_on_request() {
    let (engine, handle) = Engine::new(fast_config(3));
    let worker = engine.spawn().unwrap();

    thread::sleep(Duration::from_millis(50));
    handle.request_stats();

    let mut stats = None;
    while let Some(msg) = handle.recv_timeout(common::test_timeout()) {
        if let EngineMessage::Stats(s) = msg {
            stats = Some(s);
            break;
        }
    }

    handle.shutdown();
    worker.join().unwrap();

    let stats = stats.expect("stats message");
    assert_eq!(stats.channel_count, 3);
    assert!(stats.ticks > 0);
}

#[test]
fn test_timed_out_requests_have_no_effect() {
    let (engine, handle) = Engine::new(fast_config(1));
    let handle = handle.with_reply_timeout(Duration::from_millis(10));

    // Nothing serves the queue yet, so both requests time out
    let err = handle
        .update_thresholds("channel_0", ThresholdConfig::enabled(Some(-1_000.0), None))
        .unwrap_err();
    assert!(matches!(err, EngineError::Timeout(_)));
    let err = handle.add_channel().unwrap_err();
    assert!(matches!(err, EngineError::Timeout(_)));

    let worker = engine.spawn().unwrap();
    thread::sleep(Duration::from_millis(100));
    let snapshot = handle.snapshot();

    handle.shutdown();
    worker.join().unwrap();

    assert!(snapshot.generation > 0, "worker should be ticking");
    assert_eq!(snapshot.len(), 1);
    assert!(!snapshot.get("channel_0").unwrap().thresholds.enabled);
    assert!(!handle
        .drain()
        .iter()
        .any(|m| matches!(m, EngineMessage::ChannelAdded { .. } | EngineMessage::ThresholdsUpdated { .. })));
}
