#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # eventline
//!
//! Client-side interaction telemetry for event-loop hosts: capture events cheaply,
//! buffer them in memory, and ship them in batches without losing them to navigation
//! or network outages.
//!
//! ## Pipeline
//!
//! - **Identity**: per-tab session id and optional user id from host storage
//! - **Enrichment**: timestamp, identity and page environment attached at `track()` time
//! - **Queue**: bounded FIFO with swap-before-send draining
//! - **Transport**: one request per flush, single event unwrapped or `{"bulk": [...]}`
//! - **Triggers**: batch threshold, reconnect, tab hidden, page unload, optional interval
//!
//! Delivery is best effort: failed batches are requeued ahead of newer events and the
//! queue is capped, so a long outage loses the newest events rather than memory.
//!
//! ## Quick Start
//!
//! ```rust
//! use eventline::{interactions, Analytics, HostSignal, MemoryHost, MemoryTransport};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let host = MemoryHost::new();
//! let transport = MemoryTransport::new();
//! let analytics = Analytics::builder(transport.clone()).host(host.clone()).build();
//!
//! analytics.track(interactions::search("plomero", 12, None));
//! analytics.track_click("book-now", "profile");
//!
//! // The tab goes to the background: whatever is queued is flushed.
//! analytics.handle_signal(HostSignal::Hidden).await;
//! assert_eq!(transport.calls().len(), 1);
//! assert!(transport.calls()[0].is_bulk());
//! # });
//! ```

pub mod client;
pub mod config;
pub mod enrich;
pub mod error;
pub mod event;
pub mod host;
pub mod identity;
pub mod interactions;
pub mod lifecycle;
pub mod network;
pub mod prelude;
pub mod queue;
pub mod scheduler;
pub mod storage;
pub mod transport;

// Re-exports
pub use client::{
    Analytics, AnalyticsBuilder, FlushOutcome, FlushReason, PipelineHandle, PipelineStats,
};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use enrich::EventEnricher;
pub use error::{ConfigError, IdentityError, StorageError, TransportError};
pub use event::{Event, EventInput};
pub use host::{Dimensions, Environment, Host, HostSignal, MemoryHost};
pub use identity::IdentityResolver;
pub use lifecycle::LifecycleHooks;
pub use network::{NetworkMonitor, Transition};
pub use queue::{AppendOutcome, EventQueue};
pub use scheduler::Scheduler;
pub use storage::{MemoryStorage, Storage};
pub use transport::{deliver, LogTransport, MemoryTransport, NullTransport, Payload, Transport};
