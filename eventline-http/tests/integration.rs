use eventline::{Analytics, EventInput, FlushOutcome, MemoryHost, TransportError};
use eventline_http::HttpTransport;
use httpmock::prelude::*;
use tower_service::Service;

const PATH: &str = "/api/analytics/events";

fn client(server: &MockServer) -> Analytics<HttpTransport> {
    let transport = HttpTransport::new(&server.url(PATH)).expect("endpoint");
    Analytics::builder(transport).host(MemoryHost::new()).build()
}

#[tokio::test]
async fn single_event_is_posted_unwrapped() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(PATH)
                .json_body_partial(r#"{"eventType":"search","label":"plomero"}"#);
            then.status(200);
        })
        .await;

    let analytics = client(&server);
    analytics.track(EventInput::new("search").label("plomero"));
    assert_eq!(analytics.flush().await, FlushOutcome::Delivered { events: 1 });
    mock.assert_async().await;
}

#[tokio::test]
async fn batch_is_posted_as_bulk() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(PATH).body_contains(r#"{"bulk":["#);
            then.status(202);
        })
        .await;

    let analytics = client(&server);
    for label in ["a", "b", "c"] {
        analytics.track(EventInput::new("click").label(label));
    }
    assert_eq!(analytics.flush().await, FlushOutcome::Delivered { events: 3 });
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_batch_is_requeued() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(503);
        })
        .await;

    let analytics = client(&server);
    analytics.track(EventInput::new("click"));
    analytics.track(EventInput::new("click"));
    assert_eq!(analytics.flush().await, FlushOutcome::Requeued { events: 2, discarded: 0 });
    assert_eq!(analytics.queue_len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn status_is_reported_by_the_service() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(500);
        })
        .await;

    let mut transport = HttpTransport::new(&server.url(PATH)).unwrap();
    let event = serde_json::from_value(serde_json::json!({
        "eventType": "click",
        "category": "",
        "action": "",
        "label": "",
        "value": null,
        "sessionId": "session_1_abcdefghi",
        "userId": null,
        "timestamp": "2026-01-01T00:00:00.000Z",
        "metadata": {}
    }))
    .unwrap();
    let err = transport.call(eventline::Payload::Single(event)).await.unwrap_err();
    assert_eq!(err, TransportError::Status { status: 500 });
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    // Port 9 (discard) on localhost is expected to refuse connections.
    let analytics = Analytics::builder(HttpTransport::new("http://127.0.0.1:9/events").unwrap())
        .host(MemoryHost::new())
        .build();
    analytics.track(EventInput::new("click"));
    assert!(matches!(analytics.flush().await, FlushOutcome::Requeued { events: 1, .. }));
}
