use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

#[cfg(feature = "serde")]
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::days::DayRange;

/// Longest span, in days, an event may cover. Days past this limit are not
/// recorded, so a far-future end date cannot blow up the index.
pub const MAX_SPAN_DAYS: i64 = 3660;

/// Opaque event identifier.
///
/// The backend hands out both numeric and string identifiers; both decode to
/// the same textual form, so `1` and `"1"` name the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct EventId(String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_reference(deserializer).map(Self)
    }
}

/// Accepts a JSON number or string and keeps its textual form.
#[cfg(feature = "serde")]
fn deserialize_reference<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct ReferenceVisitor;

    impl<'de> de::Visitor<'de> for ReferenceVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or an integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(ReferenceVisitor)
}

#[cfg(feature = "serde")]
fn deserialize_location<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<EventId>::deserialize(deserializer)?.map(|EventId(location)| location))
}

/// `null` reads as the default status, as a missing field does.
#[cfg(feature = "serde")]
fn deserialize_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EventStatus, D::Error> {
    Option::<EventStatus>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EventStatus {
    #[default]
    Scheduled,
    #[cfg_attr(feature = "serde", serde(alias = "in-progress", alias = "inProgress"))]
    InProgress,
    Completed,
    #[cfg_attr(feature = "serde", serde(alias = "canceled"))]
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        Self::Scheduled,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown event status `{}` (expected scheduled, in_progress, completed or cancelled)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for EventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" | "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// An event as delivered by the backend. `start..=end` is an inclusive span.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    pub id: EventId,
    #[cfg_attr(feature = "serde", serde(alias = "title"))]
    pub name: String,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "serialize_instant", deserialize_with = "deserialize_instant")
    )]
    pub start: NaiveDateTime,
    #[cfg_attr(
        feature = "serde",
        serde(serialize_with = "serialize_instant", deserialize_with = "deserialize_instant")
    )]
    pub end: NaiveDateTime,
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "deserialize_status"))]
    pub status: EventStatus,
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            alias = "locationId",
            deserialize_with = "deserialize_location",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub location: Option<String>,
}

impl Event {
    pub fn new<I, N>(id: I, name: N, start: NaiveDateTime, end: NaiveDateTime) -> Self
    where
        I: Into<EventId>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            start,
            end,
            status: EventStatus::default(),
            location: None,
        }
    }

    /// Builds an event spanning whole days, from midnight of `start` to
    /// midnight of `end`.
    pub fn all_day<I, N>(id: I, name: N, start: NaiveDate, end: NaiveDate) -> Self
    where
        I: Into<EventId>,
        N: Into<String>,
    {
        Self::new(id, name, start.and_time(Default::default()), end.and_time(Default::default()))
    }

    #[must_use]
    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn start_day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_day(&self) -> NaiveDate {
        self.end.date()
    }

    /// True when the event's start day lies after its end day.
    pub fn is_malformed(&self) -> bool {
        self.start_day() > self.end_day()
    }

    /// True when the event covers more than [`MAX_SPAN_DAYS`] days.
    pub fn exceeds_span_limit(&self) -> bool {
        self.end_day().signed_duration_since(self.start_day()).num_days() >= MAX_SPAN_DAYS
    }

    /// Every day from the start day through the end day, capped at
    /// [`MAX_SPAN_DAYS`] days. A malformed event covers only its start day.
    pub fn days(&self) -> DayRange {
        let start = self.start_day();
        if self.is_malformed() {
            return DayRange::single(start);
        }

        let last = start
            .checked_add_signed(Duration::days(MAX_SPAN_DAYS - 1))
            .map_or(self.end_day(), |limit| limit.min(self.end_day()));
        DayRange::new(start, last)
    }
}

/// Parses the instant formats the backend emits: RFC 3339 (the wall-clock
/// date in the given offset is kept), naive date-times and plain dates.
pub fn parse_instant(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime.naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Some(datetime);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(feature = "serde")]
fn serialize_instant<S: Serializer>(
    instant: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let formatted = instant.format("%Y-%m-%dT%H:%M:%S").to_string();
    serializer.serialize_str(&formatted)
}

#[cfg(feature = "serde")]
fn deserialize_instant<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw)
        .ok_or_else(|| de::Error::custom(format!("unrecognised instant `{raw}`")))
}

/// Decodes an event collection, either a bare array or `{ "events": [...] }`.
///
/// A bad event fails the whole collection with an error naming its position
/// and the offending field.
#[cfg(feature = "serde")]
pub fn parse_events<S: AsRef<str>>(s: S) -> serde_json::Result<Vec<Event>> {
    use serde_json::Value;

    fn invalid<T: fmt::Display>(msg: T) -> serde_json::Error {
        de::Error::custom(msg)
    }

    let items = match serde_json::from_str::<Value>(s.as_ref())? {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("events") {
            Some(Value::Array(items)) => items,
            _ => return Err(invalid("expected an `events` array in the collection object")),
        },
        _ => {
            return Err(invalid(
                "expected an array of events or an object with an `events` field",
            ))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            serde_json::from_value(item).map_err(|err| invalid(format!("event {position}: {err}")))
        })
        .collect()
}
