//! The analytics client: `track()` in, batches out.
//!
//! Semantics:
//! - `track` enriches and queues synchronously and never awaits I/O. When the queue
//!   reaches the batch threshold while online, the batch is swapped out on the spot and
//!   its delivery is spawned on the current Tokio runtime. Outside a runtime the events
//!   stay queued for the next trigger.
//! - A flush is skipped while offline (the queue is left untouched) and is a no-op when
//!   the queue is empty.
//! - A failed flush puts its batch back at the front of the queue, trimmed to
//!   `max_retained`. There is no backoff; the next threshold, reconnect, lifecycle or
//!   interval trigger is the retry.
//! - Errors never reach the caller. [`FlushOutcome`] and [`PipelineStats`] report what
//!   happened.
//!
//! Invariants:
//! - The queue never holds more than `max_retained` events.
//! - Every delivered batch preserves enqueue order; a requeued batch may jump ahead of
//!   events tracked while it was in flight.
//!
//! ```rust
//! use eventline::{Analytics, EventInput, FlushOutcome, MemoryHost, MemoryTransport};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let transport = MemoryTransport::new();
//! let analytics = Analytics::builder(transport.clone()).host(MemoryHost::new()).build();
//!
//! analytics.track(EventInput::new("search").label("plomero"));
//! assert_eq!(analytics.flush().await, FlushOutcome::Delivered { events: 1 });
//! assert!(!transport.calls()[0].is_bulk());
//! # });
//! ```

use crate::config::PipelineConfig;
use crate::enrich::EventEnricher;
use crate::event::{Event, EventInput};
use crate::host::{Host, HostSignal, MemoryHost};
use crate::lifecycle::LifecycleHooks;
use crate::network::{NetworkMonitor, Transition};
use crate::queue::{AppendOutcome, EventQueue};
use crate::scheduler::Scheduler;
use crate::transport::{deliver, Payload, Transport};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What caused a flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushReason {
    Threshold,
    Reconnect,
    Hidden,
    Unload,
    Interval,
    Manual,
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushReason::Threshold => "threshold",
            FlushReason::Reconnect => "reconnect",
            FlushReason::Hidden => "hidden",
            FlushReason::Unload => "unload",
            FlushReason::Interval => "interval",
            FlushReason::Manual => "manual",
        };
        f.write_str(name)
    }
}

/// Result of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Offline; nothing was drained.
    Offline,
    /// Nothing queued.
    Empty,
    /// The endpoint acknowledged the batch.
    Delivered { events: usize },
    /// Delivery failed and the batch went back into the queue; `discarded` events were
    /// lost to the cap.
    Requeued { events: usize, discarded: usize },
}

impl FlushOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, FlushOutcome::Delivered { .. })
    }
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Flushes that reached the transport.
    pub flushes: u64,
    pub delivered: u64,
    /// Events put back after a failed flush (counted per attempt).
    pub requeued: u64,
    /// Events discarded by the queue cap.
    pub dropped: u64,
    pub queued: usize,
}

#[derive(Debug, Default)]
struct Counters {
    flushes: AtomicU64,
    delivered: AtomicU64,
    requeued: AtomicU64,
}

struct Inner<T> {
    config: PipelineConfig,
    host: Arc<dyn Host>,
    enricher: EventEnricher,
    queue: EventQueue,
    network: NetworkMonitor,
    transport: T,
    counters: Counters,
}

/// Cloneable handle to one telemetry pipeline.
///
/// Each instance owns its queue and identity; create one per page (or per test) and
/// hand clones to whatever needs to track.
pub struct Analytics<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Analytics<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> fmt::Debug for Analytics<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analytics")
            .field("config", &self.inner.config)
            .field("online", &self.inner.network.is_online())
            .field("queued", &self.inner.queue.len())
            .field("transport", &"<transport>")
            .finish()
    }
}

/// Builder for [`Analytics`].
pub struct AnalyticsBuilder<T> {
    transport: T,
    host: Option<Arc<dyn Host>>,
    config: PipelineConfig,
}

impl<T> AnalyticsBuilder<T>
where
    T: Transport,
    T::Future: Send,
{
    pub fn host<H: Host + 'static>(mut self, host: H) -> Self {
        self.host = Some(Arc::new(host));
        self
    }

    pub fn shared_host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Without an explicit host a fresh [`MemoryHost`] is used.
    pub fn build(self) -> Analytics<T> {
        let host: Arc<dyn Host> =
            self.host.unwrap_or_else(|| Arc::new(MemoryHost::new()) as Arc<dyn Host>);
        let inner = Inner {
            enricher: EventEnricher::new(host.clone()),
            queue: EventQueue::new(self.config.max_retained()),
            network: NetworkMonitor::new(host.is_online()),
            config: self.config,
            host,
            transport: self.transport,
            counters: Counters::default(),
        };
        Analytics { inner: Arc::new(inner) }
    }
}

impl<T> Analytics<T>
where
    T: Transport,
    T::Future: Send,
{
    pub fn builder(transport: T) -> AnalyticsBuilder<T> {
        AnalyticsBuilder { transport, host: None, config: PipelineConfig::default() }
    }

    /// Record an interaction. Never blocks on I/O and never fails.
    pub fn track(&self, input: EventInput) {
        let event = self.inner.enricher.enrich(input);
        tracing::trace!(event = %event, "tracked");
        match self.inner.queue.append(event) {
            AppendOutcome::Queued { len }
                if len >= self.inner.config.batch_threshold() && self.is_online() =>
            {
                self.flush_in_background(FlushReason::Threshold);
            }
            AppendOutcome::Queued { .. } | AppendOutcome::Dropped => {}
        }
    }

    /// Flush whatever is queued now.
    pub async fn flush(&self) -> FlushOutcome {
        self.flush_with_reason(FlushReason::Manual).await
    }

    pub async fn flush_with_reason(&self, reason: FlushReason) -> FlushOutcome {
        if !self.inner.network.is_online() {
            tracing::debug!(%reason, queued = self.inner.queue.len(), "offline; flush skipped");
            return FlushOutcome::Offline;
        }
        let batch = self.inner.queue.drain_for_flush();
        self.send(batch, reason).await
    }

    /// Deliver an already drained batch, requeueing it on failure.
    async fn send(&self, batch: Vec<Event>, reason: FlushReason) -> FlushOutcome {
        let events = batch.len();
        let Some(payload) = Payload::from_events(batch.clone()) else {
            return FlushOutcome::Empty;
        };

        self.inner.counters.flushes.fetch_add(1, Ordering::Relaxed);
        let timeout = self.inner.config.request_timeout();
        match deliver(self.inner.transport.clone(), payload, timeout).await {
            Ok(()) => {
                self.inner.counters.delivered.fetch_add(events as u64, Ordering::Relaxed);
                tracing::debug!(%reason, events, "batch delivered");
                FlushOutcome::Delivered { events }
            }
            Err(err) => {
                let discarded = self.requeue(batch);
                tracing::warn!(
                    %reason,
                    events,
                    discarded,
                    error = %err,
                    "flush failed; batch requeued"
                );
                FlushOutcome::Requeued { events, discarded }
            }
        }
    }

    /// Record a connectivity change. Coming back online spawns a flush.
    pub fn set_online(&self, online: bool) {
        match self.inner.network.set_online(online) {
            Transition::WentOnline => {
                tracing::debug!("connectivity restored");
                self.flush_in_background(FlushReason::Reconnect);
            }
            Transition::WentOffline => tracing::debug!("connectivity lost"),
            Transition::Unchanged => {}
        }
    }

    /// React to a platform signal without waiting on I/O.
    ///
    /// Connectivity changes apply immediately; any flush the signal causes runs as its
    /// own task, so a slow request never delays the next signal.
    pub fn notify(&self, signal: HostSignal) {
        match signal {
            HostSignal::Online => {
                self.inner.network.set_online(true);
                self.flush_in_background(FlushReason::Reconnect);
            }
            HostSignal::Offline => {
                self.inner.network.set_online(false);
            }
            HostSignal::Hidden => self.flush_in_background(FlushReason::Hidden),
            HostSignal::Unload => self.flush_in_background(FlushReason::Unload),
        }
    }

    /// React to a platform signal, awaiting any flush it causes.
    pub async fn handle_signal(&self, signal: HostSignal) -> Option<FlushOutcome> {
        match signal {
            HostSignal::Online => {
                self.inner.network.set_online(true);
                Some(self.flush_with_reason(FlushReason::Reconnect).await)
            }
            HostSignal::Offline => {
                self.inner.network.set_online(false);
                None
            }
            HostSignal::Hidden => Some(self.flush_with_reason(FlushReason::Hidden).await),
            HostSignal::Unload => Some(self.flush_with_reason(FlushReason::Unload).await),
        }
    }

    /// Re-read connectivity from the host, e.g. after missing signals.
    pub fn sync_connectivity(&self) {
        self.set_online(self.inner.host.is_online());
    }

    /// Start listening to host signals, plus the periodic flush if configured.
    ///
    /// Must be called from within a Tokio runtime. Dropping the handle stops both tasks.
    pub fn attach(&self) -> PipelineHandle {
        let lifecycle = LifecycleHooks::spawn(self.clone(), self.inner.host.signals());
        let scheduler = self
            .inner
            .config
            .periodic_flush_enabled()
            .then(|| Scheduler::spawn(self.clone(), self.inner.config.flush_interval()));
        PipelineHandle { lifecycle, scheduler }
    }

    pub fn is_online(&self) -> bool {
        self.inner.network.is_online()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Events waiting for delivery, oldest first.
    pub fn pending(&self) -> Vec<Event> {
        self.inner.queue.snapshot()
    }

    pub fn session_id(&self) -> String {
        self.inner.enricher.identity().session_id()
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.enricher.identity().user_id()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn stats(&self) -> PipelineStats {
        let counters = &self.inner.counters;
        PipelineStats {
            flushes: counters.flushes.load(Ordering::Relaxed),
            delivered: counters.delivered.load(Ordering::Relaxed),
            requeued: counters.requeued.load(Ordering::Relaxed),
            dropped: self.inner.queue.dropped(),
            queued: self.inner.queue.len(),
        }
    }

    fn requeue(&self, batch: Vec<Event>) -> usize {
        self.inner.counters.requeued.fetch_add(batch.len() as u64, Ordering::Relaxed);
        self.inner.queue.requeue_front(batch)
    }

    /// Drain now and deliver on a spawned task.
    ///
    /// The swap happens before returning, so events tracked afterwards belong to the
    /// next batch. Without a runtime (or while offline) everything stays queued.
    fn flush_in_background(&self, reason: FlushReason) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(%reason, "no async runtime; flush deferred to next trigger");
            return;
        };
        if !self.inner.network.is_online() {
            tracing::debug!(%reason, queued = self.inner.queue.len(), "offline; flush skipped");
            return;
        }
        let batch = self.inner.queue.drain_for_flush();
        if batch.is_empty() {
            return;
        }
        let client = self.clone();
        runtime.spawn(async move {
            client.send(batch, reason).await;
        });
    }
}

/// Background tasks started by [`Analytics::attach`]. Aborted on drop.
#[derive(Debug)]
pub struct PipelineHandle {
    lifecycle: JoinHandle<()>,
    scheduler: Option<JoinHandle<()>>,
}

impl PipelineHandle {
    pub fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }

    pub fn is_listening(&self) -> bool {
        !self.lifecycle.is_finished()
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.lifecycle.abort();
        if let Some(scheduler) = &self.scheduler {
            scheduler.abort();
        }
    }
}
