//! Optional periodic flush.
//!
//! Off by default: a fixed-interval flush against a struggling endpoint turns into a
//! steady stream of doomed requests. Enable it with
//! [`PipelineConfigBuilder::periodic_flush`](crate::PipelineConfigBuilder::periodic_flush).

use crate::client::{Analytics, FlushReason};
use crate::transport::Transport;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    /// Flush every `every` while something is queued and the client is online.
    /// The first tick fires one full interval after spawning.
    pub fn spawn<T>(client: Analytics<T>, every: Duration) -> JoinHandle<()>
    where
        T: Transport,
        T::Future: Send,
    {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if client.queue_len() == 0 || !client.is_online() {
                    continue;
                }
                client.flush_with_reason(FlushReason::Interval).await;
            }
        })
    }
}
