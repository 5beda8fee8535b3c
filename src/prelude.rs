//! Convenient re-exports for common eventline types.
pub use crate::{
    client::{Analytics, AnalyticsBuilder, FlushOutcome, FlushReason, PipelineHandle},
    config::PipelineConfig,
    event::{Event, EventInput},
    host::{Host, HostSignal, MemoryHost},
    interactions,
    transport::{LogTransport, MemoryTransport, NullTransport, Payload, Transport},
    TransportError,
};
