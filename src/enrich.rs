//! Turns caller input into a complete [`Event`].

use crate::event::{Event, EventInput};
use crate::host::Host;
use crate::identity::IdentityResolver;
use chrono::SecondsFormat;
use serde_json::Value;
use std::sync::Arc;

/// Attaches identity, timestamp and page environment to caller input.
#[derive(Debug, Clone)]
pub struct EventEnricher {
    host: Arc<dyn Host>,
    identity: IdentityResolver,
}

impl EventEnricher {
    pub fn new(host: Arc<dyn Host>) -> Self {
        let identity = IdentityResolver::new(host.clone());
        Self { host, identity }
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    /// Caller-provided `user_id` and metadata keys take precedence over resolved values.
    pub fn enrich(&self, input: EventInput) -> Event {
        let EventInput { event_type, category, action, label, value, user_id, mut metadata } =
            input;
        let env = self.host.environment();
        let resolved = [
            ("url", env.url),
            ("referrer", env.referrer),
            ("userAgent", env.user_agent),
            ("screenResolution", env.screen.to_string()),
            ("viewportSize", env.viewport.to_string()),
        ];
        for (key, val) in resolved {
            metadata.entry(key).or_insert(Value::String(val));
        }

        Event {
            event_type,
            category,
            action,
            label,
            value,
            session_id: self.identity.session_id(),
            user_id: user_id.or_else(|| self.identity.user_id()),
            timestamp: self.host.now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata,
        }
    }
}
