//! Host adapter: everything the pipeline needs from its runtime environment.
//!
//! In a browser this is `window`, `document`, `navigator` and the storage APIs. The
//! pipeline only talks to the [`Host`] trait, so it runs the same against a real page
//! bridge, a native shell, or the headless [`MemoryHost`] used in tests.

use crate::storage::{MemoryStorage, Storage};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

const SIGNAL_CAPACITY: usize = 64;

/// Platform signals the pipeline reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSignal {
    /// Connectivity restored.
    Online,
    /// Connectivity lost.
    Offline,
    /// The tab became hidden (`visibilitychange` to hidden).
    Hidden,
    /// The page is being torn down (`beforeunload`).
    Unload,
}

impl fmt::Display for HostSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostSignal::Online => "online",
            HostSignal::Offline => "offline",
            HostSignal::Hidden => "hidden",
            HostSignal::Unload => "unload",
        };
        f.write_str(name)
    }
}

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Page environment attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Environment {
    pub url: String,
    pub referrer: String,
    pub user_agent: String,
    pub screen: Dimensions,
    pub viewport: Dimensions,
}

/// Runtime environment of the pipeline.
pub trait Host: Send + Sync + fmt::Debug {
    /// Wall-clock time.
    fn now(&self) -> DateTime<Utc>;
    /// Store scoped to the current tab.
    fn session_storage(&self) -> &dyn Storage;
    /// Store that survives the tab.
    fn local_storage(&self) -> &dyn Storage;
    fn environment(&self) -> Environment;
    /// Connectivity at the time of the call (`navigator.onLine`).
    fn is_online(&self) -> bool;
    /// Subscribe to online/offline/hidden/unload signals.
    fn signals(&self) -> broadcast::Receiver<HostSignal>;
}

/// Headless host with manually driven clock, connectivity and signals.
#[derive(Clone)]
pub struct MemoryHost {
    session: MemoryStorage,
    local: MemoryStorage,
    environment: Arc<Mutex<Environment>>,
    clock: Arc<Mutex<Option<DateTime<Utc>>>>,
    online: Arc<AtomicBool>,
    signals: broadcast::Sender<HostSignal>,
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("online", &self.online.load(Ordering::Relaxed))
            .field("environment", &*self.environment.lock().unwrap_or_else(PoisonError::into_inner))
            .field("subscribers", &self.signals.receiver_count())
            .finish()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Online host with fresh stores and the real clock.
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            session: MemoryStorage::new(),
            local: MemoryStorage::new(),
            environment: Arc::new(Mutex::new(Environment::default())),
            clock: Arc::new(Mutex::new(None)),
            online: Arc::new(AtomicBool::new(true)),
            signals,
        }
    }

    /// Replace the per-tab store, e.g. with [`MemoryStorage::unavailable`].
    pub fn with_session_storage(mut self, storage: MemoryStorage) -> Self {
        self.session = storage;
        self
    }

    /// Share a durable store between hosts, the way tabs of one origin share `localStorage`.
    pub fn with_local_storage(mut self, storage: MemoryStorage) -> Self {
        self.local = storage;
        self
    }

    pub fn with_environment(self, environment: Environment) -> Self {
        self.set_environment(environment);
        self
    }

    pub fn session(&self) -> &MemoryStorage {
        &self.session
    }

    pub fn local(&self) -> &MemoryStorage {
        &self.local
    }

    pub fn set_environment(&self, environment: Environment) {
        *self.environment.lock().unwrap_or_else(PoisonError::into_inner) = environment;
    }

    /// Freeze the clock at `at`.
    pub fn set_time(&self, at: DateTime<Utc>) {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    /// Move a frozen clock forward. Freezes it at the current time first if needed.
    pub fn advance(&self, by: std::time::Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        let base = clock.unwrap_or_else(Utc::now);
        let step = ChronoDuration::from_std(by).unwrap_or(ChronoDuration::zero());
        *clock = Some(base + step);
    }

    /// Set connectivity without firing a signal.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Fire a platform signal. Online/offline also update [`Host::is_online`].
    ///
    /// Returns how many listeners received it.
    pub fn emit(&self, signal: HostSignal) -> usize {
        match signal {
            HostSignal::Online => self.set_online(true),
            HostSignal::Offline => self.set_online(false),
            HostSignal::Hidden | HostSignal::Unload => {}
        }
        self.signals.send(signal).unwrap_or(0)
    }
}

impl Host for MemoryHost {
    fn now(&self) -> DateTime<Utc> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner).unwrap_or_else(Utc::now)
    }

    fn session_storage(&self) -> &dyn Storage {
        &self.session
    }

    fn local_storage(&self) -> &dyn Storage {
        &self.local
    }

    fn environment(&self) -> Environment {
        self.environment.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn signals(&self) -> broadcast::Receiver<HostSignal> {
        self.signals.subscribe()
    }
}
