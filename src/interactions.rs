//! Ready-made inputs for the marketplace's well-known interactions.
//!
//! These only shape an [`EventInput`]; queueing and delivery are the same as for
//! [`Analytics::track`]. The `eventType`/`category`/`action` triples are what the
//! collection backend aggregates on.

use crate::client::Analytics;
use crate::event::EventInput;
use crate::transport::Transport;
use serde_json::Value;
use std::time::Duration;

pub fn page_view(page: &str, title: Option<&str>) -> EventInput {
    let input = EventInput::new("page_view").category("navigation").action("view").label(page);
    match title {
        Some(title) => input.meta("title", title),
        None => input,
    }
}

/// A search with its result count; `filters` is passed through as metadata.
pub fn search(query: &str, results: usize, filters: Option<Value>) -> EventInput {
    let input = EventInput::new("search")
        .category("search")
        .action("query")
        .label(query)
        .value(results as f64);
    match filters {
        Some(filters) => input.meta("filters", filters),
        None => input,
    }
}

pub fn click(element: &str, location: &str) -> EventInput {
    EventInput::new("click")
        .category("interaction")
        .action("click")
        .label(element)
        .meta("location", location)
}

/// A customer reaching out to a professional (`method`: phone, whatsapp, form ...).
pub fn professional_contact(professional_id: &str, method: &str) -> EventInput {
    EventInput::new("contact")
        .category("conversion")
        .action("contact_professional")
        .label(method)
        .meta("professionalId", professional_id)
}

pub fn booking_created(
    booking_id: &str,
    professional_id: &str,
    service: &str,
    amount: Option<f64>,
) -> EventInput {
    let input = EventInput::new("booking")
        .category("conversion")
        .action("booking_created")
        .label(service)
        .meta("bookingId", booking_id)
        .meta("professionalId", professional_id);
    match amount {
        Some(amount) => input.value(amount),
        None => input,
    }
}

pub fn user_registration(user_type: &str, method: &str) -> EventInput {
    EventInput::new("registration")
        .category("conversion")
        .action("user_registration")
        .label(user_type)
        .meta("method", method)
}

pub fn error(message: &str, context: Option<&str>) -> EventInput {
    let input = EventInput::new("error").category("error").action("exception").label(message);
    match context {
        Some(context) => input.meta("context", context),
        None => input,
    }
}

/// A named timing in milliseconds (e.g. `first_contentful_paint`).
pub fn performance(metric: &str, millis: f64) -> EventInput {
    EventInput::new("performance")
        .category("performance")
        .action("timing")
        .label(metric)
        .value(millis)
}

/// Time spent on a page, reported in whole seconds.
pub fn time_on_page(page: &str, spent: Duration) -> EventInput {
    EventInput::new("engagement")
        .category("engagement")
        .action("time_on_page")
        .label(page)
        .value(spent.as_secs() as f64)
}

impl<T> Analytics<T>
where
    T: Transport,
    T::Future: Send,
{
    pub fn track_page_view(&self, page: &str, title: Option<&str>) {
        self.track(page_view(page, title));
    }

    pub fn track_search(&self, query: &str, results: usize, filters: Option<Value>) {
        self.track(search(query, results, filters));
    }

    pub fn track_click(&self, element: &str, location: &str) {
        self.track(click(element, location));
    }

    pub fn track_professional_contact(&self, professional_id: &str, method: &str) {
        self.track(professional_contact(professional_id, method));
    }

    pub fn track_booking_created(
        &self,
        booking_id: &str,
        professional_id: &str,
        service: &str,
        amount: Option<f64>,
    ) {
        self.track(booking_created(booking_id, professional_id, service, amount));
    }

    pub fn track_user_registration(&self, user_type: &str, method: &str) {
        self.track(user_registration(user_type, method));
    }

    pub fn track_error(&self, message: &str, context: Option<&str>) {
        self.track(error(message, context));
    }

    pub fn track_performance(&self, metric: &str, millis: f64) {
        self.track(performance(metric, millis));
    }

    pub fn track_time_on_page(&self, page: &str, spent: Duration) {
        self.track(time_on_page(page, spent));
    }
}
