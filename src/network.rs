//! Connectivity tracking.

use std::sync::atomic::{AtomicBool, Ordering};

/// Change produced by [`NetworkMonitor::set_online`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
    Unchanged,
}

/// Online/offline flag shared by the pipeline.
///
/// Going offline only flips the flag; requests already in flight are left to fail and
/// requeue on their own.
#[derive(Debug)]
pub struct NetworkMonitor {
    online: AtomicBool,
}

impl NetworkMonitor {
    pub fn new(online: bool) -> Self {
        Self { online: AtomicBool::new(online) }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) -> Transition {
        match (self.online.swap(online, Ordering::SeqCst), online) {
            (false, true) => Transition::WentOnline,
            (true, false) => Transition::WentOffline,
            _ => Transition::Unchanged,
        }
    }
}
