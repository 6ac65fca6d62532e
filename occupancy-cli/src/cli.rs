use std::env;
use std::ops::RangeInclusive;
use std::process;

use chrono::NaiveDate;
use getopts::{Matches, Options};
use occupancy::{month_days, BuildPolicy, EventFilter, EventStatus};

pub const EVENTS_ENV: &str = "OCCUPANCY_EVENTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub events: String,
    pub policy: BuildPolicy,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub month: Option<RangeInclusive<NaiveDate>>,
    pub day: Option<NaiveDate>,
    pub resolve: Option<NaiveDate>,
    pub filter: Option<EventFilter>,
    pub json: bool,
}

impl Args {
    /// No query flag given; the whole occupied-day list is printed.
    pub fn lists_everything(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.month.is_none()
            && self.day.is_none()
            && self.resolve.is_none()
            && self.filter.is_none()
    }
}

#[derive(Debug)]
pub enum Parsed {
    Help(String),
    Run(Args),
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "e",
        "events",
        "JSON file or http(s) URL holding the events [Default: $OCCUPANCY_EVENTS]",
        "SOURCE",
    );
    opts.optflag(
        "s",
        "strict",
        "Fail on events whose start lies after their end [Default: false]",
    );
    opts.optopt("f", "from", "First day of the occupied-day listing", "DATE");
    opts.optopt("t", "to", "Last day of the occupied-day listing", "DATE");
    opts.optopt("m", "month", "Print the occupancy overlay of a month", "YYYY-MM");
    opts.optopt("d", "day", "List the events covering a day", "DATE");
    opts.optopt("r", "resolve", "Resolve a day to a single event", "DATE");
    opts.optopt("q", "text", "Filter events by name (case-insensitive)", "TEXT");
    opts.optopt("l", "location", "Filter events by location identifier", "ID");
    opts.optopt(
        "S",
        "status",
        "Filter events by status (scheduled, in_progress, completed, cancelled)",
        "STATUS",
    );
    opts.optflag("j", "json", "Print JSON instead of text [Default: false]");
    opts
}

fn date_opt(matches: &Matches, name: &str) -> Result<Option<NaiveDate>, String> {
    matches
        .opt_str(name)
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| {
                format!("Provided value for option '{name}' is invalid: {err} (expected YYYY-MM-DD)")
            })
        })
        .transpose()
}

fn month_opt(matches: &Matches) -> Result<Option<RangeInclusive<NaiveDate>>, String> {
    let Some(raw) = matches.opt_str("month") else {
        return Ok(None);
    };

    let invalid =
        || format!("Provided value for option 'month' is invalid: {raw} (expected YYYY-MM)");
    let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;

    month_days(year, month).map(Some).ok_or_else(invalid)
}

fn filter_opt(matches: &Matches) -> Result<Option<EventFilter>, String> {
    let status = matches
        .opt_str("status")
        .map(|raw| raw.parse::<EventStatus>())
        .transpose()
        .map_err(|err| format!("Provided value for option 'status' is invalid: {err}"))?;

    let filter = EventFilter {
        text: matches.opt_str("text"),
        location: matches.opt_str("location"),
        status,
    };

    let given = matches.opt_present("text") || matches.opt_present("location") || status.is_some();
    Ok(given.then_some(filter))
}

/// Parses `args` (without the program name). `events_env` stands in for
/// the `OCCUPANCY_EVENTS` variable when `--events` is absent.
pub fn try_parse(args: Vec<String>, events_env: Option<String>) -> Result<Parsed, String> {
    let opts = opts();
    let matches = opts.parse(args).map_err(|fail| fail.to_string())?;

    if matches.opt_present("help") {
        return Ok(Parsed::Help(
            opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))),
        ));
    }

    let events = matches
        .opt_str("events")
        .or(events_env)
        .filter(|events| !events.trim().is_empty())
        .ok_or_else(|| format!("No event source given, pass --events or set {EVENTS_ENV}"))?;

    let policy = if matches.opt_present("strict") {
        BuildPolicy::Strict
    } else {
        BuildPolicy::Lenient
    };

    Ok(Parsed::Run(Args {
        events,
        policy,
        from: date_opt(&matches, "from")?,
        to: date_opt(&matches, "to")?,
        month: month_opt(&matches)?,
        day: date_opt(&matches, "day")?,
        resolve: date_opt(&matches, "resolve")?,
        filter: filter_opt(&matches)?,
        json: matches.opt_present("json"),
    }))
}

pub fn parse(args: Vec<String>) -> Args {
    match try_parse(args, env::var(EVENTS_ENV).ok()) {
        Ok(Parsed::Run(args)) => args,
        Ok(Parsed::Help(usage)) => {
            println!("{usage}");
            process::exit(0);
        }
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    }
}
