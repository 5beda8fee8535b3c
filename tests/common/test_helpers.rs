use eventline::{Analytics, MemoryHost, MemoryTransport, PipelineConfig};
use std::time::Duration;

pub fn analytics_with(
    transport: &MemoryTransport,
    host: &MemoryHost,
    config: PipelineConfig,
) -> Analytics<MemoryTransport> {
    Analytics::builder(transport.clone()).host(host.clone()).config(config).build()
}

pub fn analytics(transport: &MemoryTransport, host: &MemoryHost) -> Analytics<MemoryTransport> {
    analytics_with(transport, host, PipelineConfig::default())
}

/// Yield to spawned tasks until `cond` holds. Panics after two seconds.
pub async fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {}", what);
}

pub fn labels(events: &[eventline::Event]) -> Vec<String> {
    events.iter().map(|e| e.label.clone()).collect()
}
