//! Delivery of batches to the collection endpoint.
//!
//! A batch of one goes out as the bare event; anything larger is wrapped as
//! `{"bulk": [...]}`. The collection endpoint accepts both shapes and tells them apart
//! by the `bulk` key, so [`Payload`] is the only way a batch reaches a transport.
//!
//! Transports are `tower::Service<Payload>`s so they compose with the usual tower
//! middleware. A failed delivery is not retried here; the pipeline puts the batch back
//! in the queue and waits for the next trigger.

use crate::error::TransportError;
use crate::event::Event;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::Semaphore;
use tower::Service;

/// Wire body for one flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Exactly one event, sent unwrapped.
    Single(Event),
    /// Two or more events, in queue order.
    Bulk { bulk: Vec<Event> },
}

impl Payload {
    /// Shape a drained batch. `None` for an empty batch.
    pub fn from_events(mut events: Vec<Event>) -> Option<Self> {
        match events.len() {
            0 => None,
            1 => events.pop().map(Payload::Single),
            _ => Some(Payload::Bulk { bulk: events }),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Single(_) => 1,
            Payload::Bulk { bulk } => bulk.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, Payload::Bulk { .. })
    }

    pub fn events(&self) -> &[Event] {
        match self {
            Payload::Single(event) => std::slice::from_ref(event),
            Payload::Bulk { bulk } => bulk,
        }
    }

    pub fn into_events(self) -> Vec<Event> {
        match self {
            Payload::Single(event) => vec![event],
            Payload::Bulk { bulk } => bulk,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Single(event) => write!(f, "Single({})", event),
            Payload::Bulk { bulk } => write!(f, "Bulk({} events)", bulk.len()),
        }
    }
}

/// A service that delivers payloads to the collection endpoint.
pub trait Transport:
    Service<Payload, Response = (), Error = TransportError> + Clone + Send + Sync + 'static
{
}

type TransportFuture = Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send>>;

/// Send one payload, honoring `poll_ready` and an optional time limit.
pub async fn deliver<T>(
    transport: T,
    payload: Payload,
    timeout: Option<Duration>,
) -> Result<(), TransportError>
where
    T: Transport,
    T::Future: Send,
{
    use tower::ServiceExt;

    let call = transport.oneshot(payload);
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| TransportError::Timeout { timeout: limit })?,
        None => call.await,
    }
}

/// Accepts and discards every payload.
#[derive(Clone, Debug, Default)]
pub struct NullTransport;

impl Service<Payload> for NullTransport {
    type Response = ();
    type Error = TransportError;
    type Future = TransportFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _payload: Payload) -> Self::Future {
        Box::pin(async { Ok(()) })
    }
}

impl Transport for NullTransport {}

/// Logs each payload through `tracing` instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct LogTransport;

impl Service<Payload> for LogTransport {
    type Response = ();
    type Error = TransportError;
    type Future = TransportFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, payload: Payload) -> Self::Future {
        tracing::info!(
            events = payload.len(),
            bulk = payload.is_bulk(),
            payload = %payload,
            "analytics_payload"
        );
        Box::pin(async { Ok(()) })
    }
}

impl Transport for LogTransport {}

/// Records every payload it is called with.
///
/// Can be switched into a failing mode (every call answers 503) and can be gated so
/// calls stay in flight until [`MemoryTransport::release`] is called.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    calls: Arc<Mutex<Vec<Payload>>>,
    delivered: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    gate: Option<Arc<Semaphore>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls block after being recorded until released.
    pub fn gated() -> Self {
        Self { gate: Some(Arc::new(Semaphore::new(0))), ..Self::default() }
    }

    /// Let `calls` gated requests complete. No-op for ungated transports.
    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every payload received, successful or not, in call order.
    pub fn calls(&self) -> Vec<Payload> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of events acknowledged as delivered.
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
        self.delivered.store(0, Ordering::SeqCst);
    }
}

impl Service<Payload> for MemoryTransport {
    type Response = ();
    type Error = TransportError;
    type Future = TransportFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, payload: Payload) -> Self::Future {
        let count = payload.len();
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(payload);
        let gate = self.gate.clone();
        let failing = self.failing.clone();
        let delivered = self.delivered.clone();

        Box::pin(async move {
            if let Some(gate) = gate {
                gate.acquire()
                    .await
                    .map_err(|_| TransportError::Network("transport gate closed".into()))?
                    .forget();
            }
            if failing.load(Ordering::SeqCst) {
                return Err(TransportError::Status { status: 503 });
            }
            delivered.fetch_add(count, Ordering::SeqCst);
            Ok(())
        })
    }
}

impl Transport for MemoryTransport {}
