//! A headless page session: track a few marketplace interactions, drop offline,
//! come back, and hide the tab. Run with `RUST_LOG=eventline=debug`.

use eventline::{
    Analytics, Dimensions, Environment, HostSignal, LogTransport, MemoryHost, PipelineConfig,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eventline=debug")),
        )
        .init();

    let host = MemoryHost::new().with_environment(Environment {
        url: "https://app.example.com/buscar?q=plomero".into(),
        referrer: "https://www.google.com/".into(),
        user_agent: "eventline-demo/0.1".into(),
        screen: Dimensions::new(1920, 1080),
        viewport: Dimensions::new(1366, 768),
    });
    let config = PipelineConfig::builder().batch_threshold(5).build().expect("valid config");
    let analytics = Analytics::builder(LogTransport).host(host.clone()).config(config).build();
    let _handle = analytics.attach();

    analytics.track_page_view("/buscar", Some("Buscar profesionales"));
    analytics.track_search("plomero", 12, None);

    host.emit(HostSignal::Offline);
    tokio::time::sleep(Duration::from_millis(10)).await;
    analytics.track_click("profile-card", "results");
    analytics.track_professional_contact("pro-981", "whatsapp");
    analytics.track_booking_created("bk-1200", "pro-981", "plomeria", Some(85_000.0));
    analytics.track_performance("first_contentful_paint", 812.0);
    tracing::info!(queued = analytics.queue_len(), "offline; events held");

    host.emit(HostSignal::Online);
    tokio::time::sleep(Duration::from_millis(10)).await;

    analytics.track_time_on_page("/buscar", Duration::from_secs(42));
    host.emit(HostSignal::Hidden);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let stats = analytics.stats();
    tracing::info!(
        flushes = stats.flushes,
        delivered = stats.delivered,
        dropped = stats.dropped,
        session = %analytics.session_id(),
        "session finished"
    );
}
