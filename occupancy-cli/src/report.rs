use std::io::{self, Write};

use chrono::NaiveDate;
use occupancy::{filter, DayMatch, Event, EventId, Snapshot};
use serde::Serialize;

use crate::cli::Args;

#[derive(Serialize)]
struct OverlayDay {
    day: NaiveDate,
    occupied: bool,
}

#[derive(Serialize)]
struct Resolution<'a> {
    day: NaiveDate,
    event: Option<&'a Event>,
    candidates: usize,
}

fn find<'a>(snapshot: &'a Snapshot, id: &EventId) -> Option<&'a Event> {
    snapshot.events.iter().find(|event| &event.id == id)
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn write_event<W: Write>(out: &mut W, event: &Event) -> io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{} - {}\t{}\t{}",
        event.id,
        event.name,
        event.start.format("%Y-%m-%d %H:%M"),
        event.end.format("%Y-%m-%d %H:%M"),
        event.status,
        event.location.as_deref().unwrap_or("-")
    )
}

fn occupied_days<W: Write>(out: &mut W, args: &Args, snapshot: &Snapshot) -> io::Result<()> {
    let index = &snapshot.index;
    let (Some(first), Some(last)) = (
        args.from.or(index.first_day()),
        args.to.or(index.last_day()),
    ) else {
        // Empty index and an open-ended range.
        return if args.json { write_json(out, &[] as &[NaiveDate]) } else { Ok(()) };
    };

    let days = index.occupied_days_in(first..=last).collect::<Vec<_>>();
    if args.json {
        return write_json(out, &days);
    }

    for day in days {
        writeln!(out, "{day}")?;
    }
    Ok(())
}

fn month_overlay<W: Write>(out: &mut W, args: &Args, snapshot: &Snapshot) -> io::Result<()> {
    let Some(month) = args.month.clone() else {
        return Ok(());
    };

    let overlay = snapshot
        .index
        .overlay(month)
        .map(|(day, occupied)| OverlayDay { day, occupied })
        .collect::<Vec<_>>();

    if args.json {
        return write_json(out, &overlay);
    }

    for OverlayDay { day, occupied } in overlay {
        writeln!(out, "{day} {}", if occupied { "occupied" } else { "free" })?;
    }
    Ok(())
}

fn events_on_day<W: Write>(out: &mut W, args: &Args, snapshot: &Snapshot) -> io::Result<()> {
    let Some(day) = args.day else {
        return Ok(());
    };

    let events = snapshot
        .index
        .events_on(day)
        .iter()
        .filter_map(|id| find(snapshot, id))
        .collect::<Vec<_>>();

    if args.json {
        return write_json(out, &events);
    }

    if events.is_empty() {
        return writeln!(out, "no events on {day}");
    }
    for event in events {
        write_event(out, event)?;
    }
    Ok(())
}

fn resolve_day<W: Write>(out: &mut W, args: &Args, snapshot: &Snapshot) -> io::Result<()> {
    let Some(day) = args.resolve else {
        return Ok(());
    };

    let matched = snapshot.index.match_on(day);
    let candidates = match matched {
        DayMatch::NoMatch => 0,
        DayMatch::Single(_) => 1,
        DayMatch::Ambiguous { candidates, .. } => candidates.len(),
    };
    let event = matched.chosen().and_then(|id| find(snapshot, id));

    if args.json {
        return write_json(
            out,
            &Resolution {
                day,
                event,
                candidates,
            },
        );
    }

    match event {
        None => writeln!(out, "no event on {day}"),
        Some(event) if candidates > 1 => writeln!(
            out,
            "{day} -> {} {} (first of {candidates} events)",
            event.id, event.name
        ),
        Some(event) => writeln!(out, "{day} -> {} {}", event.id, event.name),
    }
}

fn filtered_events<W: Write>(out: &mut W, args: &Args, snapshot: &Snapshot) -> io::Result<()> {
    let Some(event_filter) = &args.filter else {
        return Ok(());
    };

    let events = filter(&snapshot.events, event_filter);
    if args.json {
        return write_json(out, &events);
    }

    for event in events {
        write_event(out, event)?;
    }
    Ok(())
}

/// Writes every query `args` asks for, in flag order of the help text.
pub fn write<W: Write>(out: &mut W, args: &Args, snapshot: &Snapshot) -> io::Result<()> {
    if args.lists_everything() || args.from.is_some() || args.to.is_some() {
        occupied_days(out, args, snapshot)?;
    }
    month_overlay(out, args, snapshot)?;
    events_on_day(out, args, snapshot)?;
    resolve_day(out, args, snapshot)?;
    filtered_events(out, args, snapshot)
}
