//! ICS parsing using the icalendar crate's parser.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::warn;

use crate::definition::{EventDefinition, EventTime, InstanceOverride, Recurrence};
use crate::error::{FamcalError, FamcalResult};
use crate::ics::validate_ics_payload;

/// A VEVENT as read from the feed, before overrides are attached.
struct ParsedVevent {
    definition: EventDefinition,
    recurrence_id: Option<EventTime>,
    cancelled: bool,
}

/// Parse every VEVENT of an iCal payload into event definitions.
///
/// Instance overrides (VEVENTs with RECURRENCE-ID) are attached to their
/// master; cancelled instances become EXDATEs of the master. Cancelled
/// standalone events and VEVENTs without DTSTART are dropped.
pub fn parse_definitions(content: &str) -> FamcalResult<Vec<EventDefinition>> {
    validate_ics_payload(content)?;

    let unfolded = unfold(content);
    let calendar =
        read_calendar(&unfolded).map_err(|e| FamcalError::IcsParse(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let mut masters: Vec<EventDefinition> = Vec::new();
    let mut instances: Vec<ParsedVevent> = Vec::new();

    for vevent in vevents {
        let Some(parsed) = parse_vevent(vevent) else {
            continue;
        };
        if parsed.recurrence_id.is_some() {
            instances.push(parsed);
        } else if !parsed.cancelled {
            masters.push(parsed.definition);
        }
    }

    let index: HashMap<String, usize> = masters
        .iter()
        .enumerate()
        .filter(|(_, m)| m.recurrence.is_some())
        .map(|(i, m)| (m.uid.clone(), i))
        .collect();

    for instance in instances {
        let Some(recurrence_id) = instance.recurrence_id else {
            continue;
        };

        match index.get(&instance.definition.uid) {
            Some(&i) => {
                let master = &mut masters[i];
                if instance.cancelled {
                    if let Some(recurrence) = master.recurrence.as_mut() {
                        recurrence.exdates.push(recurrence_id);
                    }
                } else {
                    master.overrides.push(InstanceOverride {
                        recurrence_id,
                        definition: instance.definition,
                    });
                }
            }
            // Orphaned instance: show it on its own
            None if !instance.cancelled => masters.push(instance.definition),
            None => {}
        }
    }

    Ok(masters)
}

fn collect_vevents<'a>(components: &'a [Component<'a>], out: &mut Vec<&'a Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

fn parse_vevent(vevent: &Component) -> Option<ParsedVevent> {
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape(p.val.as_ref()))
        .unwrap_or_default();

    let Some(start) = vevent
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(EventTime::from)
    else {
        warn!(summary = %summary, "Skipping VEVENT without a usable DTSTART");
        return None;
    };

    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(EventTime::from);

    // Feeds without UIDs still need a stable identity across syncs
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| format!("{}@{}", summary, start));

    let description = vevent.find_prop("DESCRIPTION").map(|p| unescape(p.val.as_ref()));
    let location = vevent.find_prop("LOCATION").map(|p| unescape(p.val.as_ref()));
    let organizer = vevent.find_prop("ORGANIZER").map(parse_organizer);

    let cancelled = vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref() == "CANCELLED");

    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_exdate_property)
        .collect();
    let recurrence = rrule.map(|rrule| Recurrence { rrule, exdates });

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(EventTime::from);

    Some(ParsedVevent {
        definition: EventDefinition {
            uid,
            summary,
            description,
            location,
            organizer,
            start,
            end,
            recurrence,
            overrides: Vec::new(),
        },
        recurrence_id,
        cancelled,
    })
}

impl From<DatePerhapsTime> for EventTime {
    fn from(value: DatePerhapsTime) -> Self {
        match value {
            DatePerhapsTime::Date(date) => EventTime::Date(date),
            DatePerhapsTime::DateTime(CalendarDateTime::Utc(at)) => EventTime::DateTimeUtc(at),
            DatePerhapsTime::DateTime(CalendarDateTime::Floating(at)) => {
                EventTime::DateTimeFloating(at)
            }
            DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        }
    }
}

fn param<'a>(prop: &'a Property<'_>, key: &str) -> Option<&'a str> {
    prop.params
        .iter()
        .find(|p| p.key == key)
        .and_then(|p| p.val.as_ref())
        .map(|v| -> &str { v.as_ref() })
}

/// Every value of an EXDATE property (comma-separated lists included).
fn parse_exdate_property(prop: &Property) -> Vec<EventTime> {
    let date_only = param(prop, "VALUE") == Some("DATE");
    let tzid = param(prop, "TZID");

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| exdate_value(raw, date_only, tzid))
        .collect()
}

/// One EXDATE value. Bare `YYYYMMDD` values are dates even when the feed
/// omits `VALUE=DATE`.
fn exdate_value(raw: &str, date_only: bool, tzid: Option<&str>) -> Option<EventTime> {
    const DATE: &str = "%Y%m%d";
    const DATE_TIME: &str = "%Y%m%dT%H%M%S";

    if date_only || raw.len() == 8 {
        return NaiveDate::parse_from_str(raw, DATE).ok().map(EventTime::Date);
    }

    match (raw.strip_suffix('Z'), tzid) {
        (Some(utc), _) => NaiveDateTime::parse_from_str(utc, DATE_TIME)
            .ok()
            .map(|at| EventTime::DateTimeUtc(at.and_utc())),
        (None, Some(tzid)) => NaiveDateTime::parse_from_str(raw, DATE_TIME)
            .ok()
            .map(|datetime| EventTime::DateTimeZoned {
                datetime,
                tzid: tzid.to_string(),
            }),
        (None, None) => NaiveDateTime::parse_from_str(raw, DATE_TIME)
            .ok()
            .map(EventTime::DateTimeFloating),
    }
}

/// Organizer display name (CN) or bare email address.
fn parse_organizer(prop: &Property) -> String {
    if let Some(name) = param(prop, "CN") {
        return name.to_string();
    }
    let val = prop.val.as_ref();
    val.strip_prefix("mailto:").unwrap_or(val).to_string()
}

/// Undo RFC 5545 TEXT escaping.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
