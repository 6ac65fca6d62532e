use std::mem;
use std::ops::RangeInclusive;

use chrono::{Duration, NaiveDate};

/// Inclusive iterator over calendar days.
#[derive(Debug, Clone)]
pub struct DayRange {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl DayRange {
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            next: (first <= last).then_some(first),
            last,
        }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }
}

impl From<RangeInclusive<NaiveDate>> for DayRange {
    fn from(range: RangeInclusive<NaiveDate>) -> Self {
        let (first, last) = range.into_inner();
        Self::new(first, last)
    }
}

impl Iterator for DayRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let following = (current < self.last)
            .then(|| current.checked_add_signed(Duration::days(1)))
            .flatten();
        mem::replace(&mut self.next, following)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map_or(0, |next| (self.last - next).num_days() as usize + 1);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DayRange {}

/// The first through last day of a calendar month, or `None` for an
/// invalid month.
pub fn month_days(year: i32, month: u32) -> Option<RangeInclusive<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(first..=next_month.pred_opt()?)
}
