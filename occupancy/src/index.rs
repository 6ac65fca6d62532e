use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use log::{debug, warn};

use crate::days::DayRange;
use crate::error::{Error, Result};
use crate::structs::{Event, EventId, MAX_SPAN_DAYS};

/// How a build treats events whose start day lies after their end day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildPolicy {
    /// Record the event on its start day only and keep going.
    #[default]
    Lenient,
    /// Fail the whole build with [`Error::MalformedEvent`].
    Strict,
}

/// Outcome of resolving a selected day to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayMatch<'a> {
    NoMatch,
    Single(&'a EventId),
    /// Several events cover the day. `chosen` is the first one recorded for
    /// that day during the build pass.
    Ambiguous {
        chosen: &'a EventId,
        candidates: &'a [EventId],
    },
}

impl<'a> DayMatch<'a> {
    pub fn chosen(self) -> Option<&'a EventId> {
        match self {
            Self::NoMatch => None,
            Self::Single(id) | Self::Ambiguous { chosen: id, .. } => Some(id),
        }
    }
}

/// Day-granularity lookup from calendar days to the events covering them.
///
/// An event covers every day from its start day through its end day
/// regardless of time of day, so an event from 23:50 to 00:10 occupies both
/// days. Days nobody covers are absent; every present day has at least one
/// event. Within a day, identifiers keep the order the build first saw them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyIndex {
    days: BTreeMap<NaiveDate, Vec<EventId>>,
    malformed: usize,
}

impl OccupancyIndex {
    /// Builds an index with the lenient policy. Never fails.
    pub fn build<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut index = Self::default();
        for event in events {
            index.insert(event);
        }
        index.log_built();
        index
    }

    pub fn build_with<'a, I>(events: I, policy: BuildPolicy) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        if policy == BuildPolicy::Lenient {
            return Ok(Self::build(events));
        }

        let mut index = Self::default();
        for event in events {
            if event.is_malformed() {
                return Err(Error::MalformedEvent {
                    id: event.id.clone(),
                    start: event.start,
                    end: event.end,
                });
            }
            index.insert(event);
        }
        index.log_built();
        Ok(index)
    }

    fn insert(&mut self, event: &Event) {
        if event.is_malformed() {
            warn!(
                "event {} starts after it ends ({} > {}), recording its start day only",
                event.id, event.start, event.end
            );
            self.malformed += 1;
        } else if event.exceeds_span_limit() {
            warn!(
                "event {} spans {} to {}, recording only its first {MAX_SPAN_DAYS} days",
                event.id, event.start, event.end
            );
        }

        for day in event.days() {
            let ids = self.days.entry(day).or_default();
            if !ids.contains(&event.id) {
                ids.push(event.id.clone());
            }
        }
    }

    fn log_built(&self) {
        debug!(
            "built occupancy index covering {} days ({} malformed events tolerated)",
            self.days.len(),
            self.malformed
        );
    }

    pub fn is_occupied(&self, day: NaiveDate) -> bool {
        self.days.get(&day).is_some_and(|ids| !ids.is_empty())
    }

    pub fn events_on(&self, day: NaiveDate) -> &[EventId] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn match_on(&self, day: NaiveDate) -> DayMatch<'_> {
        match self.events_on(day) {
            [] => DayMatch::NoMatch,
            [only] => DayMatch::Single(only),
            candidates @ [first, ..] => DayMatch::Ambiguous {
                chosen: first,
                candidates,
            },
        }
    }

    /// The single event to navigate to for `day`; the first event recorded
    /// for that day when several cover it.
    pub fn resolve_single_event_on(&self, day: NaiveDate) -> Option<&EventId> {
        self.match_on(day).chosen()
    }

    /// Covered days within `range`, ascending. An inverted range is empty.
    pub fn occupied_days_in(
        &self,
        range: RangeInclusive<NaiveDate>,
    ) -> impl Iterator<Item = NaiveDate> + '_ {
        let (first, last) = range.into_inner();
        (first <= last)
            .then(|| self.days.range(first..=last))
            .into_iter()
            .flatten()
            .map(|(day, _)| *day)
    }

    /// Every day of `range` paired with whether it is occupied.
    pub fn overlay(
        &self,
        range: RangeInclusive<NaiveDate>,
    ) -> impl Iterator<Item = (NaiveDate, bool)> + '_ {
        DayRange::from(range).map(move |day| (day, self.is_occupied(day)))
    }

    pub fn occupied_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    /// Number of occupied days.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Number of events the build tolerated despite starting after they end.
    pub fn malformed_events(&self) -> usize {
        self.malformed
    }
}
