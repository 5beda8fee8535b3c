//! Session and user identity.
//!
//! The session id lives in per-tab storage under [`SESSION_KEY`] and is created once per
//! tab. The user id is read from a JSON blob under [`USER_KEY`] maintained by the
//! authentication layer; it is best-effort and never fails the caller.

use crate::error::IdentityError;
use crate::host::Host;
use crate::storage::Storage;
use rand::{rng, Rng};
use serde_json::Value;
use std::sync::{Arc, OnceLock};

pub const SESSION_KEY: &str = "analytics_session_id";
pub const USER_KEY: &str = "user";

const SUFFIX_LEN: usize = 9;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Resolves the `sessionId` / `userId` pair for a host.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    host: Arc<dyn Host>,
    // Holds the id when the tab store refused it, so it is still created only once.
    fallback: Arc<OnceLock<String>>,
}

impl IdentityResolver {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host, fallback: Arc::new(OnceLock::new()) }
    }

    /// Session id for the current tab, created and persisted on first use.
    pub fn session_id(&self) -> String {
        let store = self.host.session_storage();
        if let Some(existing) = store.get(SESSION_KEY).filter(|id| !id.is_empty()) {
            return existing;
        }
        if let Some(cached) = self.fallback.get() {
            return cached.clone();
        }

        let id = generate_session_id(self.host.now().timestamp_millis());
        match store.set(SESSION_KEY, &id) {
            Ok(()) => {
                tracing::debug!(session_id = %id, "session created");
                id
            }
            Err(err) => {
                tracing::debug!(error = %err, "session id not persisted; keeping it in memory");
                self.fallback.get_or_init(|| id).clone()
            }
        }
    }

    /// Authenticated user id, if one is stored and readable.
    pub fn user_id(&self) -> Option<String> {
        let stores = [self.host.session_storage(), self.host.local_storage()];
        for store in stores {
            match read_user_id(store) {
                Ok(Some(id)) => return Some(id),
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring unreadable stored identity");
                }
            }
        }
        None
    }
}

/// `session_<millis>_<9 lowercase alphanumerics>`.
pub fn generate_session_id(millis: i64) -> String {
    let mut rng = rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("session_{}_{}", millis, suffix)
}

fn read_user_id(store: &dyn Storage) -> Result<Option<String>, IdentityError> {
    let Some(raw) = store.get(USER_KEY) else {
        return Ok(None);
    };
    let blob: Value = serde_json::from_str(&raw)?;
    match blob.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(Some(id.clone())),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        _ => Err(IdentityError::MissingId),
    }
}
