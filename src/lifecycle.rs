//! Page lifecycle and connectivity listener.
//!
//! Signals are handled one at a time but never wait on the network: connectivity is
//! applied immediately and flushes run as their own tasks. Unload handlers cannot wait
//! for a request to finish, so the unload flush is an attempt, not a delivery guarantee.

use crate::client::Analytics;
use crate::host::HostSignal;
use crate::transport::Transport;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::task::JoinHandle;

/// Dispatches host signals to an [`Analytics`] client.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleHooks;

impl LifecycleHooks {
    /// Spawn the listener on the current runtime. It ends when the signal source closes.
    pub fn spawn<T>(client: Analytics<T>, mut signals: Receiver<HostSignal>) -> JoinHandle<()>
    where
        T: Transport,
        T::Future: Send,
    {
        tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(signal) => {
                        tracing::debug!(%signal, "host signal");
                        client.notify(signal);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "missed host signals; resyncing connectivity");
                        client.sync_connectivity();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
