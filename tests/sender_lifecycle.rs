//! Integration Tests: Beacon Sender Thread
//!
//! Tests for the sender worker thread:
//! - init completion is observable from other threads
//! - shutdown wakes the worker out of long waits
//! - the worker always ends in the terminal state

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use beacon_agent::context::{BeaconSendingContext, SendingSettings, SystemClock};
use beacon_agent::mock::{ManualClock, MockReply, MockTransport};
use beacon_agent::signal::{SignalAction, SignalState};
use beacon_agent::{BeaconSender, StateKind};

fn sender_with(transport: MockTransport) -> BeaconSender {
    let ctx = BeaconSendingContext::new(
        SendingSettings::new("app-1"),
        Arc::new(transport),
        Arc::new(SystemClock),
    );
    BeaconSender::with_shutdown_timeout(Arc::new(ctx), Duration::from_secs(5))
}

#[test]
fn test_init_observed_from_other_threads() {
    let sender = Arc::new(sender_with(MockTransport::new()));
    sender.initialize().unwrap();

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let sender = Arc::clone(&sender);
            thread::spawn(move || sender.wait_for_init_timeout(Duration::from_secs(5)))
        })
        .collect();

    for waiter in waiters {
        assert!(waiter.join().expect("Thread panicked"));
    }

    sender.shutdown().unwrap();
    assert_eq!(sender.context().current_state(), StateKind::Terminal);
}

#[test]
fn test_shutdown_during_reinit_backoff_is_prompt() {
    let sender = sender_with(MockTransport::with_fallback(MockReply::HttpStatus(503)));
    sender.initialize().unwrap();

    // let the worker get into its retry sleeps
    thread::sleep(Duration::from_millis(100));
    assert!(!sender.wait_for_init_timeout(Duration::from_millis(10)));

    let start = Instant::now();
    sender.shutdown().unwrap();

    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(sender.context().init_outcome(), Some(false));
    assert!(sender.context().is_in_terminal_state());
}

#[test]
fn test_signal_stops_sender() {
    let sender = sender_with(MockTransport::new());
    let signals = SignalState::new(sender.context().shutdown_signal());
    sender.initialize().unwrap();
    assert!(sender.wait_for_init_timeout(Duration::from_secs(5)));

    assert_eq!(signals.handle_signal(), SignalAction::RequestShutdown);

    sender.shutdown().unwrap();
    assert!(sender.context().is_in_terminal_state());
    assert!(sender.is_initialized());
}

#[test]
fn test_worker_finishing_on_its_own_joins_cleanly() {
    let clock = Arc::new(ManualClock::new(0));
    clock.interrupt_on_sleep(1);
    let ctx = BeaconSendingContext::new(
        SendingSettings::new("app-1"),
        Arc::new(MockTransport::new()),
        clock,
    );
    let sender = BeaconSender::new(Arc::new(ctx));
    sender.initialize().unwrap();

    assert!(sender.wait_for_init());
    sender.shutdown().unwrap();
    assert_eq!(sender.context().current_state(), StateKind::Terminal);
}
