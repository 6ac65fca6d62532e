use crate::structs::{Event, EventStatus};

/// List-view filter. Unset (or blank) fields place no constraint; set fields
/// are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Case-insensitive substring of the event name.
    pub text: Option<String>,
    /// Exact location identifier.
    pub location: Option<String>,
    pub status: Option<EventStatus>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        non_blank(&self.text).is_none()
            && non_blank(&self.location).is_none()
            && self.status.is_none()
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(text) = non_blank(&self.text) {
            if !event.name.to_lowercase().contains(&text.to_lowercase()) {
                return false;
            }
        }

        if let Some(location) = non_blank(&self.location) {
            if event.location.as_deref() != Some(location) {
                return false;
            }
        }

        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }

        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// The events passing `filter`, in input order.
pub fn filter<'a>(events: &'a [Event], filter: &EventFilter) -> Vec<&'a Event> {
    events.iter().filter(|event| filter.matches(event)).collect()
}
