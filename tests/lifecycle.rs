#![allow(missing_docs)]

mod common;

use common::test_helpers::{analytics, analytics_with, labels, wait_until};
use eventline::{EventInput, HostSignal, MemoryHost, MemoryTransport, Payload, PipelineConfig};
use std::time::Duration;

#[tokio::test]
async fn reconnect_signal_flushes_offline_searches_as_one_bulk() {
    let transport = MemoryTransport::new();
    let host = MemoryHost::new();
    host.set_online(false);
    let analytics = analytics(&transport, &host);
    let _handle = analytics.attach();

    for _ in 0..3 {
        analytics.track(EventInput::new("search").label("plomero"));
    }
    assert_eq!(analytics.queue_len(), 3);
    let queued = analytics.pending();

    host.emit(HostSignal::Online);
    wait_until("reconnect flush", || transport.delivered() == 3).await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], Payload::Bulk { bulk: queued });
    assert_eq!(analytics.queue_len(), 0);
}

#[tokio::test]
async fn reconnect_with_single_event_sends_it_unwrapped() {
    let transport = MemoryTransport::new();
    let host = MemoryHost::new();
    host.set_online(false);
    let analytics = analytics(&transport, &host);
    let _handle = analytics.attach();

    analytics.track(EventInput::new("page_view").label("/"));
    host.emit(HostSignal::Online);
    wait_until("reconnect flush", || transport.delivered() == 1).await;
    assert!(matches!(transport.calls()[0], Payload::Single(_)));
}

#[tokio::test]
async fn offline_signal_stops_threshold_flushes() {
    let transport = MemoryTransport::new();
    let host = MemoryHost::new();
    let analytics = analytics(&transport, &host);
    let _handle = analytics.attach();

    host.emit(HostSignal::Offline);
    wait_until("offline state", || !analytics.is_online()).await;

    for i in 0..12 {
        analytics.track(EventInput::new("click").label(i.to_string()));
    }
    tokio::task::yield_now().await;
    assert_eq!(transport.call_count(), 0);
    assert_eq!(analytics.queue_len(), 12);
}

#[tokio::test]
async fn hidden_and_unload_signals_flush() {
    let transport = MemoryTransport::new();
    let host = MemoryHost::new();
    let analytics = analytics(&transport, &host);
    let _handle = analytics.attach();

    analytics.track(EventInput::new("click").label("a"));
    host.emit(HostSignal::Hidden);
    wait_until("hidden flush", || transport.delivered() == 1).await;

    analytics.track(EventInput::new("click").label("b"));
    analytics.track(EventInput::new("click").label("c"));
    host.emit(HostSignal::Unload);
    wait_until("unload flush", || transport.delivered() == 3).await;

    let calls = transport.calls();
    assert_eq!(labels(calls[1].events()), ["b", "c"]);
}

#[tokio::test]
async fn unload_failure_keeps_events_queued() {
    let transport = MemoryTransport::new();
    let host = MemoryHost::new();
    let analytics = analytics(&transport, &host);
    let _handle = analytics.attach();

    transport.set_failing(true);
    analytics.track(EventInput::new("click"));
    host.emit(HostSignal::Unload);
    wait_until("unload attempt", || transport.call_count() == 1).await;
    wait_until("requeue", || analytics.queue_len() == 1).await;
    assert_eq!(analytics.stats().requeued, 1);
}

#[tokio::test]
async fn dropping_the_handle_stops_listening() {
    let transport = MemoryTransport::new();
    let host = MemoryHost::new();
    let analytics = analytics(&transport, &host);

    let handle = analytics.attach();
    assert!(handle.is_listening());
    assert!(!handle.has_scheduler());
    drop(handle);
    tokio::task::yield_now().await;

    analytics.track(EventInput::new("click"));
    host.emit(HostSignal::Hidden);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(transport.call_count(), 0);
    assert_eq!(analytics.queue_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn periodic_flush_runs_only_when_enabled() {
    let transport = MemoryTransport::new();
    let host = MemoryHost::new();
    let config = PipelineConfig::builder().periodic_flush(Duration::from_secs(30)).build().unwrap();
    let client = analytics_with(&transport, &host, config);
    let handle = client.attach();
    assert!(handle.has_scheduler());

    client.track(EventInput::new("click"));
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(transport.delivered(), 1);

    let idle_transport = MemoryTransport::new();
    let idle = analytics(&idle_transport, &MemoryHost::new());
    let idle_handle = idle.attach();
    assert!(!idle_handle.has_scheduler());
    idle.track(EventInput::new("click"));
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(idle_transport.call_count(), 0);
    assert_eq!(idle.queue_len(), 1);
}

#[tokio::test]
async fn slow_flush_does_not_hold_back_later_signals() {
    let transport = MemoryTransport::gated();
    let host = MemoryHost::new();
    let analytics = analytics(&transport, &host);
    let _handle = analytics.attach();

    analytics.track(EventInput::new("click").label("a"));
    host.emit(HostSignal::Hidden);
    wait_until("hidden flush in flight", || transport.call_count() == 1).await;

    host.emit(HostSignal::Offline);
    wait_until("offline applied", || !analytics.is_online()).await;
    for i in 0..12 {
        analytics.track(EventInput::new("click").label(i.to_string()));
    }
    tokio::task::yield_now().await;
    assert_eq!(transport.call_count(), 1);
    assert_eq!(analytics.queue_len(), 12);

    transport.release(1);
    wait_until("hidden flush delivered", || transport.delivered() == 1).await;
    assert_eq!(analytics.queue_len(), 12);
}
