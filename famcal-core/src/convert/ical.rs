use tracing::warn;

use crate::calendar::Calendar;
use crate::definition::EventDefinition;
use crate::error::FamcalResult;
use crate::event::Event;
use crate::expand::{ExpandOptions, Expansion, expand};
use crate::ics::parse_definitions;

/// Validate, parse and expand an iCal payload for `calendar`.
pub fn ical_to_events(
    content: &str,
    calendar: &Calendar,
    options: &ExpandOptions,
) -> FamcalResult<Vec<Event>> {
    let definitions = parse_definitions(content)?;
    Ok(expand_definitions(&definitions, calendar, options))
}

/// Expand every definition, logging the ones that degraded.
pub fn expand_definitions(
    definitions: &[EventDefinition],
    calendar: &Calendar,
    options: &ExpandOptions,
) -> Vec<Event> {
    definitions
        .iter()
        .flat_map(|definition| {
            let expansion = expand(definition, calendar, options);
            if let Expansion::Degraded { error, .. } = &expansion {
                warn!(
                    calendar = %calendar.id,
                    uid = %definition.uid,
                    error = %error,
                    "Expansion degraded to a single occurrence"
                );
            }
            expansion.into_events()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarSource;
    use crate::error::FamcalError;
    use crate::event::{Category, Source};
    use chrono::NaiveDate;
    use chrono_tz::Tz;

    fn calendar() -> Calendar {
        Calendar {
            id: "holidays".to_string(),
            name: "Holidays".to_string(),
            color: "red".to_string(),
            enabled: true,
            category: Category::Holidays,
            source: CalendarSource::Ical {
                url: "https://example.com/holidays.ics".to_string(),
            },
            last_sync: None,
        }
    }

    #[test]
    fn test_feed_with_one_bad_rule_still_yields_others() {
        let ics = "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
UID:bad\n\
SUMMARY:Broken rule\n\
DTSTART;VALUE=DATE:20250105\n\
RRULE:FREQ=NEVERLY\n\
END:VEVENT\n\
BEGIN:VEVENT\n\
UID:may17\n\
SUMMARY:Constitution Day\n\
DTSTART;VALUE=DATE:20250517\n\
DTEND;VALUE=DATE:20250518\n\
END:VEVENT\n\
END:VCALENDAR";

        let events = ical_to_events(ics, &calendar(), &ExpandOptions::new(2025, Tz::UTC))
            .expect("Should convert");

        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Broken rule", "Constitution Day"]);
        assert!(events.iter().all(|e| e.source == Source::Ical));
        assert!(events.iter().all(|e| e.category == Category::Holidays));
        assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2025, 5, 17).unwrap());
        assert!(!events[1].is_multi_day);
    }

    #[test]
    fn test_invalid_payload_is_a_validation_failure() {
        let result = ical_to_events(
            "<!DOCTYPE html><title>Login</title>",
            &calendar(),
            &ExpandOptions::new(2025, Tz::UTC),
        );
        assert!(matches!(result, Err(FamcalError::Validation(_))));
    }
}
