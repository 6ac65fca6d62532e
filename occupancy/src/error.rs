use chrono::NaiveDateTime;

use crate::EventId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event {id} starts at {start} but ends earlier at {end}")]
    MalformedEvent {
        id: EventId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("invalid event JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
