//! Day-granularity occupancy for event calendars.
//!
//! [`OccupancyIndex`] turns a collection of events into a lookup from
//! calendar days to the events covering them, for calendar overlays and
//! day-selection navigation. [`filter`] narrows event lists by name,
//! location and status. [`OccupancyStore`] keeps the current snapshot when
//! collections are re-fetched from an [`EventSource`].

mod days;
mod error;
mod filter;
mod index;
mod source;
mod store;
mod structs;

pub use days::{month_days, DayRange};
pub use error::{Error, Result};
pub use filter::{filter, EventFilter};
pub use index::{BuildPolicy, DayMatch, OccupancyIndex};
pub use source::EventSource;
#[cfg(feature = "http")]
pub use source::HttpSource;
#[cfg(feature = "serde")]
pub use source::{source_from_location, AnySource, JsonFileSource};
pub use store::{OccupancyStore, Snapshot};
#[cfg(feature = "serde")]
pub use structs::parse_events;
pub use structs::{parse_instant, Event, EventId, EventStatus, UnknownStatus, MAX_SPAN_DAYS};
