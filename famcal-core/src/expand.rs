//! Occurrence expansion.
//!
//! Turns one [`EventDefinition`] into the concrete per-day [`Event`]s that
//! fall inside a bounding year. Recurring definitions are expanded with the
//! `rrule` crate; all-day definitions spanning several days are split into
//! one event per day.
//!
//! Expansion never fails outright. A definition that cannot be expanded
//! yields [`Expansion::Degraded`] carrying a single best-effort occurrence
//! at the definition's start date, so one bad event cannot hide the rest.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::definition::{EventDefinition, EventTime, Recurrence};
use crate::error::{FamcalError, FamcalResult};
use crate::event::{Event, EventId, PLACEHOLDER_TITLE, TimeLabel};
use crate::identity::occurrence_id;

/// Upper bound on occurrences generated for one recurring definition.
pub const MAX_OCCURRENCES: u16 = 366;

/// How timed labels render clock times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    /// `9:30 AM`
    #[default]
    #[serde(rename = "12h")]
    TwelveHour,
    /// `09:30`
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl TimeFormat {
    pub fn format(&self, time: NaiveTime) -> String {
        match self {
            TimeFormat::TwelveHour => time.format("%-I:%M %p").to_string(),
            TimeFormat::TwentyFourHour => time.format("%H:%M").to_string(),
        }
    }
}

/// Parameters shared by every expansion in a sync pass.
#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions {
    /// Only occurrences in this year are produced.
    pub year: i32,
    /// Timezone whose wall clock decides an occurrence's calendar day.
    pub tz: Tz,
    pub time_format: TimeFormat,
}

impl ExpandOptions {
    pub fn new(year: i32, tz: Tz) -> Self {
        ExpandOptions {
            year,
            tz,
            time_format: TimeFormat::default(),
        }
    }

    fn in_year(&self, date: NaiveDate) -> bool {
        date.year() == self.year
    }
}

/// Result of expanding one definition.
#[derive(Debug)]
pub enum Expansion {
    Complete(Vec<Event>),
    /// Expansion failed; `event` is a single occurrence at the raw start date.
    Degraded { event: Box<Event>, error: FamcalError },
}

impl Expansion {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Expansion::Degraded { .. })
    }

    pub fn into_events(self) -> Vec<Event> {
        match self {
            Expansion::Complete(events) => events,
            Expansion::Degraded { event, .. } => vec![*event],
        }
    }
}

/// Expand `definition` into the occurrences that fall within `options.year`.
pub fn expand(definition: &EventDefinition, calendar: &Calendar, options: &ExpandOptions) -> Expansion {
    match try_expand(definition, calendar, options) {
        Ok(events) => Expansion::Complete(events),
        Err(error) => {
            let date = definition.start.local_date(options.tz);
            let time = time_label(&definition.start, definition.end.as_ref(), options);
            let event = build_occurrence(definition, calendar, date, time, false);
            Expansion::Degraded {
                event: Box::new(event),
                error,
            }
        }
    }
}

fn try_expand(
    definition: &EventDefinition,
    calendar: &Calendar,
    options: &ExpandOptions,
) -> FamcalResult<Vec<Event>> {
    if let Some(recurrence) = &definition.recurrence {
        return expand_recurring(definition, recurrence, calendar, options);
    }

    if let Some(span) = definition.day_span().filter(|days| *days > 1) {
        let start = definition.start.local_date(options.tz);
        let events = split_days(start, span, options)?
            .into_iter()
            .map(|date| build_occurrence(definition, calendar, date, TimeLabel::MultiDay, true))
            .collect();
        return Ok(events);
    }

    let date = definition.start.local_date(options.tz);
    if !options.in_year(date) {
        return Ok(Vec::new());
    }

    let time = time_label(&definition.start, definition.end.as_ref(), options);
    Ok(vec![build_occurrence(definition, calendar, date, time, false)])
}

fn expand_recurring(
    master: &EventDefinition,
    recurrence: &Recurrence,
    calendar: &Calendar,
    options: &ExpandOptions,
) -> FamcalResult<Vec<Event>> {
    let rrule_str = build_rrule_string(&master.start, recurrence);

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        FamcalError::Expansion(format!(
            "Failed to parse RRULE for event '{}': {}",
            master.uid, e
        ))
    })?;

    // The window is padded by a day on each side so that occurrences near the
    // year boundary are judged by their local date, not their UTC instant.
    let (year_start, year_end) = year_bounds(options.year)?;
    let tz: rrule::Tz = Utc.into();
    let after = (year_start.and_utc() - Duration::days(1)).with_timezone(&tz);
    let before = (year_end.and_utc() + Duration::days(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);

    let duration = match (&master.end, master.start.is_date()) {
        (Some(end), false) => end.to_local(options.tz) - master.start.to_local(options.tz),
        _ => Duration::zero(),
    };
    let span = master.day_span().filter(|days| *days > 1);

    let mut events = Vec::new();
    // Overlapping multi-day instances share days
    let mut seen_days = HashSet::new();

    for occ_dt in &result.dates {
        let occ_time = occurrence_to_event_time(occ_dt, &master.start);

        if let Some(instance) = master
            .overrides
            .iter()
            .find(|o| o.recurrence_id == occ_time)
        {
            let date = instance.definition.start.local_date(options.tz);
            if options.in_year(date) {
                let time = time_label(
                    &instance.definition.start,
                    instance.definition.end.as_ref(),
                    options,
                )
                .recurring();
                // Keyed on the replaced day so a moved instance keeps its own id
                let original = occ_time.local_date(options.tz);
                let mut event = build_occurrence(&instance.definition, calendar, date, time, false);
                event.id = EventId::Text(occurrence_id(&master.uid, &calendar.id, original, false));
                events.push(event);
            }
            continue;
        }

        let occ_date = occ_time.local_date(options.tz);

        if let Some(span) = span {
            for date in split_days(occ_date, span, options)? {
                if seen_days.insert(date) {
                    events.push(build_occurrence(master, calendar, date, TimeLabel::MultiDay, true));
                }
            }
            continue;
        }

        if !options.in_year(occ_date) {
            continue;
        }

        let time = if master.start.is_date() {
            TimeLabel::all_day()
        } else {
            let start = occ_time.to_local(options.tz);
            timed_label(start, Some(start + duration), options.time_format)
        };
        events.push(build_occurrence(master, calendar, occ_date, time.recurring(), false));
    }

    Ok(events)
}

/// Days `[start, start + span)` that fall within the bounding year.
fn split_days(start: NaiveDate, span: i64, options: &ExpandOptions) -> FamcalResult<Vec<NaiveDate>> {
    let span = u64::try_from(span)
        .map_err(|_| FamcalError::Expansion(format!("Negative day span {}", span)))?;
    let end = start
        .checked_add_days(Days::new(span))
        .ok_or_else(|| FamcalError::Expansion(format!("Day span overflows from {}", start)))?;

    Ok(start
        .iter_days()
        .take_while(|d| *d < end)
        .skip_while(|d| d.year() < options.year)
        .take_while(|d| d.year() == options.year)
        .collect())
}

fn year_bounds(year: i32) -> FamcalResult<(NaiveDateTime, NaiveDateTime)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| FamcalError::Expansion(format!("Invalid bounding year {}", year)))?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| FamcalError::Expansion(format!("Invalid bounding year {}", year)))?;
    Ok((first.and_time(NaiveTime::MIN), last.and_hms_opt(23, 59, 59).unwrap_or_default()))
}

/// Build an iCalendar-format RRULE string for the rrule crate parser.
fn build_rrule_string(start: &EventTime, recurrence: &Recurrence) -> String {
    let mut lines = Vec::new();

    // The rrule crate needs a datetime, so all-day dates become midnight UTC
    lines.push(format!("DTSTART{}", ics_value(start)));
    lines.push(format!("RRULE:{}", normalize_until(&recurrence.rrule)));

    for exdate in &recurrence.exdates {
        lines.push(format!("EXDATE{}", ics_value(exdate)));
    }

    lines.join("\n")
}

fn ics_value(time: &EventTime) -> String {
    match time {
        EventTime::Date(d) => format!(":{}T000000Z", d.format("%Y%m%d")),
        EventTime::DateTimeUtc(dt) => format!(":{}", dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::DateTimeFloating(dt) => format!(":{}Z", dt.format("%Y%m%dT%H%M%S")),
        EventTime::DateTimeZoned { datetime, tzid } => {
            format!(";TZID={}:{}", tzid, datetime.format("%Y%m%dT%H%M%S"))
        }
    }
}

/// Make UNTIL a UTC datetime, as the rrule crate requires.
///
/// Date-only values (`UNTIL=20250601`) cover the whole final day.
fn normalize_until(rrule: &str) -> String {
    rrule
        .split(';')
        .map(|part| match part.strip_prefix("UNTIL=") {
            Some(value) if value.len() == 8 => format!("UNTIL={}T235959Z", value),
            Some(value) if !value.ends_with('Z') => format!("UNTIL={}Z", value),
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Convert an rrule occurrence datetime back to an EventTime matching the master's variant.
fn occurrence_to_event_time(dt: &DateTime<rrule::Tz>, master_start: &EventTime) -> EventTime {
    match master_start {
        EventTime::Date(_) => EventTime::Date(dt.date_naive()),
        EventTime::DateTimeUtc(_) => EventTime::DateTimeUtc(dt.with_timezone(&Utc)),
        EventTime::DateTimeFloating(_) => EventTime::DateTimeFloating(dt.naive_utc()),
        EventTime::DateTimeZoned { tzid, .. } => EventTime::DateTimeZoned {
            datetime: dt.naive_local(),
            tzid: tzid.clone(),
        },
    }
}

pub(crate) fn time_label(start: &EventTime, end: Option<&EventTime>, options: &ExpandOptions) -> TimeLabel {
    if start.is_date() {
        return TimeLabel::all_day();
    }
    let end = end.filter(|e| !e.is_date()).map(|e| e.to_local(options.tz));
    timed_label(start.to_local(options.tz), end, options.time_format)
}

fn timed_label(start: NaiveDateTime, end: Option<NaiveDateTime>, format: TimeFormat) -> TimeLabel {
    TimeLabel::Span {
        start: format.format(start.time()),
        end: end.map(|e| format.format(e.time())),
        recurring: false,
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn build_occurrence(
    definition: &EventDefinition,
    calendar: &Calendar,
    date: NaiveDate,
    time: TimeLabel,
    is_multi_day: bool,
) -> Event {
    let trimmed = |s: &Option<String>| s.as_deref().map(str::trim).unwrap_or_default().to_string();

    Event {
        id: EventId::Text(occurrence_id(&definition.uid, &calendar.id, date, is_multi_day)),
        title: non_empty_or(&definition.summary, PLACEHOLDER_TITLE),
        date,
        time,
        location: trimmed(&definition.location),
        description: trimmed(&definition.description),
        organizer: trimmed(&definition.organizer),
        category: calendar.category.clone(),
        color: calendar.color.clone(),
        calendar_id: Some(calendar.id.clone()),
        calendar_name: Some(calendar.name.clone()),
        source: calendar.source.event_source(),
        is_multi_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarSource;
    use crate::definition::InstanceOverride;
    use crate::event::{Category, Source};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> Calendar {
        Calendar {
            id: "school".to_string(),
            name: "School".to_string(),
            color: "green".to_string(),
            enabled: true,
            category: Category::Kids,
            source: CalendarSource::Ical {
                url: "https://example.com/school.ics".to_string(),
            },
            last_sync: None,
        }
    }

    fn options(year: i32) -> ExpandOptions {
        ExpandOptions::new(year, Tz::UTC)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> EventTime {
        EventTime::DateTimeUtc(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap())
    }

    #[test]
    fn test_multi_day_split() {
        let def = EventDefinition::new("trip", "Ski trip", EventTime::Date(date(2025, 2, 1)))
            .with_end(EventTime::Date(date(2025, 2, 4)));

        let expansion = expand(&def, &calendar(), &options(2025));
        assert!(!expansion.is_degraded());
        let events = expansion.into_events();

        let dates: Vec<_> = events.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2025, 2, 1), date(2025, 2, 2), date(2025, 2, 3)]);
        assert!(events.iter().all(|e| e.is_multi_day));
        assert!(events.iter().all(|e| e.time == TimeLabel::MultiDay));
        assert!(events.iter().all(|e| e.time.to_string() == "All day (Multi-day)"));

        let ids: HashSet<_> = events.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_multi_day_across_year_boundary_keeps_in_year_days() {
        let def = EventDefinition::new("nye", "New Year cabin", EventTime::Date(date(2024, 12, 30)))
            .with_end(EventTime::Date(date(2025, 1, 3)));

        let in_2025: Vec<_> = expand(&def, &calendar(), &options(2025))
            .into_events()
            .iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(in_2025, vec![date(2025, 1, 1), date(2025, 1, 2)]);

        let in_2024: Vec<_> = expand(&def, &calendar(), &options(2024))
            .into_events()
            .iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(in_2024, vec![date(2024, 12, 30), date(2024, 12, 31)]);
    }

    #[test]
    fn test_single_timed_event() {
        let def = EventDefinition::new("sync", "Team Sync", utc(2025, 3, 10, 10, 0))
            .with_end(utc(2025, 3, 10, 11, 0));

        let events = expand(&def, &calendar(), &options(2025)).into_events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.date, date(2025, 3, 10));
        assert_eq!(event.time.to_string(), "10:00 AM - 11:00 AM");
        assert!(!event.is_multi_day);
        assert_eq!(event.source, Source::Ical);
        assert_eq!(event.calendar_id.as_deref(), Some("school"));
        assert_eq!(event.category, Category::Kids);
        assert_eq!(event.color, "green");
    }

    #[test]
    fn test_single_event_outside_year_is_dropped() {
        let def = EventDefinition::new("old", "Old", EventTime::Date(date(2023, 5, 1)));
        let expansion = expand(&def, &calendar(), &options(2025));
        assert!(!expansion.is_degraded());
        assert!(expansion.into_events().is_empty());
    }

    #[test]
    fn test_24_hour_labels() {
        let def = EventDefinition::new("late", "Late", utc(2025, 3, 10, 21, 30))
            .with_end(utc(2025, 3, 10, 22, 0));
        let mut opts = options(2025);
        opts.time_format = TimeFormat::TwentyFourHour;

        let events = expand(&def, &calendar(), &opts).into_events();
        assert_eq!(events[0].time.to_string(), "21:30 - 22:00");
    }

    #[test]
    fn test_timezone_decides_calendar_day() {
        let def = EventDefinition::new("late", "Late call", utc(2025, 3, 9, 23, 30));
        let oslo: Tz = "Europe/Oslo".parse().unwrap();

        let events = expand(&def, &calendar(), &ExpandOptions::new(2025, oslo)).into_events();
        assert_eq!(events[0].date, date(2025, 3, 10));
        assert_eq!(events[0].time.to_string(), "12:30 AM");
    }

    #[test]
    fn test_blank_fields_are_defaulted_and_trimmed() {
        let mut def = EventDefinition::new("x", "   ", EventTime::Date(date(2025, 6, 1)));
        def.location = Some("  Park  ".to_string());

        let events = expand(&def, &calendar(), &options(2025)).into_events();
        assert_eq!(events[0].title, PLACEHOLDER_TITLE);
        assert_eq!(events[0].location, "Park");
        assert_eq!(events[0].description, "");
        assert_eq!(events[0].time, TimeLabel::all_day());
    }

    #[test]
    fn test_monthly_recurrence_within_bound_year() {
        let def = EventDefinition::new("rent", "Pay rent", utc(2025, 3, 5, 9, 0))
            .with_end(utc(2025, 3, 5, 9, 30))
            .with_recurrence("FREQ=MONTHLY;BYMONTHDAY=5");

        let events = expand(&def, &calendar(), &options(2025)).into_events();

        // March through December
        assert_eq!(events.len(), 10);
        assert!(events.iter().all(|e| e.date.day() == 5 && e.date.year() == 2025));
        assert_eq!(events[0].date, date(2025, 3, 5));
        assert_eq!(
            events[0].time.to_string(),
            "9:00 AM - 9:30 AM (Recurring)"
        );
    }

    #[test]
    fn test_monthly_recurrence_started_earlier_is_capped_at_twelve() {
        let def = EventDefinition::new("club", "Book club", EventTime::Date(date(2022, 7, 5)))
            .with_recurrence("FREQ=MONTHLY");

        let events = expand(&def, &calendar(), &options(2025)).into_events();
        assert_eq!(events.len(), 12);
        assert!(events.iter().all(|e| e.time == TimeLabel::AllDay { recurring: true }));
        assert!(events.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_recurrence_respects_date_only_until_and_exdates() {
        let mut def = EventDefinition::new("swim", "Swim", EventTime::Date(date(2025, 1, 6)))
            .with_recurrence("FREQ=WEEKLY;UNTIL=20250127");
        if let Some(recurrence) = def.recurrence.as_mut() {
            recurrence.exdates.push(EventTime::Date(date(2025, 1, 13)));
        }

        let dates: Vec<_> = expand(&def, &calendar(), &options(2025))
            .into_events()
            .iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(dates, vec![date(2025, 1, 6), date(2025, 1, 20), date(2025, 1, 27)]);
    }

    #[test]
    fn test_daily_recurrence_is_capped() {
        let def = EventDefinition::new("daily", "Standup", utc(2024, 1, 1, 9, 0))
            .with_recurrence("FREQ=DAILY");

        let events = expand(&def, &calendar(), &options(2025)).into_events();
        assert_eq!(events.len(), 365);
        assert!(events.iter().all(|e| e.date.year() == 2025));
    }

    #[test]
    fn test_recurring_multi_day_is_split_per_day() {
        let def = EventDefinition::new("camp", "Camp", EventTime::Date(date(2025, 6, 2)))
            .with_end(EventTime::Date(date(2025, 6, 4)))
            .with_recurrence("FREQ=WEEKLY;COUNT=2");

        let events = expand(&def, &calendar(), &options(2025)).into_events();
        let dates: Vec<_> = events.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 6, 2), date(2025, 6, 3), date(2025, 6, 9), date(2025, 6, 10)]
        );
        assert!(events.iter().all(|e| e.is_multi_day && e.time == TimeLabel::MultiDay));
    }

    #[test]
    fn test_override_replaces_generated_instance() {
        let moved = EventDefinition::new("swim", "Swim (moved)", utc(2025, 1, 14, 17, 0))
            .with_end(utc(2025, 1, 14, 18, 0));
        let mut def = EventDefinition::new("swim", "Swim", utc(2025, 1, 6, 17, 0))
            .with_end(utc(2025, 1, 6, 18, 0))
            .with_recurrence("FREQ=WEEKLY;COUNT=3");
        def.overrides.push(InstanceOverride {
            recurrence_id: utc(2025, 1, 13, 17, 0),
            definition: moved,
        });

        let events = expand(&def, &calendar(), &options(2025)).into_events();
        let summary: Vec<_> = events.iter().map(|e| (e.date, e.title.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (date(2025, 1, 6), "Swim"),
                (date(2025, 1, 14), "Swim (moved)"),
                (date(2025, 1, 20), "Swim"),
            ]
        );
    }

    #[test]
    fn test_override_moved_onto_sibling_day_keeps_distinct_ids() {
        let moved = EventDefinition::new("swim", "Swim (moved)", utc(2025, 1, 20, 8, 0))
            .with_end(utc(2025, 1, 20, 9, 0));
        let mut def = EventDefinition::new("swim", "Swim", utc(2025, 1, 6, 17, 0))
            .with_end(utc(2025, 1, 6, 18, 0))
            .with_recurrence("FREQ=WEEKLY;COUNT=3");
        def.overrides.push(InstanceOverride {
            recurrence_id: utc(2025, 1, 13, 17, 0),
            definition: moved,
        });

        let events = expand(&def, &calendar(), &options(2025)).into_events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events.iter().filter(|e| e.date == date(2025, 1, 20)).count(),
            2
        );

        let ids: HashSet<_> = events.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 3);

        let moved = events.iter().find(|e| e.title == "Swim (moved)").unwrap();
        assert_eq!(
            moved.id,
            EventId::Text(occurrence_id("swim", "school", date(2025, 1, 13), false))
        );

        // Stable across passes
        let again = expand(&def, &calendar(), &options(2025)).into_events();
        assert_eq!(events, again);
    }

    #[test]
    fn test_invalid_rule_degrades_to_single_occurrence() {
        let def = EventDefinition::new("bad", "Broken", EventTime::Date(date(2019, 4, 2)))
            .with_recurrence("FREQ=SOMETIMES");

        let expansion = expand(&def, &calendar(), &options(2025));
        assert!(expansion.is_degraded());
        let events = expansion.into_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, date(2019, 4, 2));
        assert_eq!(events[0].title, "Broken");
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let def = EventDefinition::new("rent", "Pay rent", EventTime::Date(date(2025, 1, 5)))
            .with_recurrence("FREQ=MONTHLY");

        let first = expand(&def, &calendar(), &options(2025)).into_events();
        let second = expand(&def, &calendar(), &options(2025)).into_events();
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_until() {
        assert_eq!(
            normalize_until("FREQ=WEEKLY;UNTIL=20250601"),
            "FREQ=WEEKLY;UNTIL=20250601T235959Z"
        );
        assert_eq!(
            normalize_until("FREQ=WEEKLY;UNTIL=20250601T100000"),
            "FREQ=WEEKLY;UNTIL=20250601T100000Z"
        );
        assert_eq!(
            normalize_until("FREQ=WEEKLY;UNTIL=20250601T100000Z;BYDAY=MO"),
            "FREQ=WEEKLY;UNTIL=20250601T100000Z;BYDAY=MO"
        );
    }
}
