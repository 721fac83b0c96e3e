use super::parser::{ParsedCommand, DEFAULT_TIME};
use crate::calendar::models::{Attendee, CalendarEvent, EventDateTime};
use crate::error::{command_error, CalResult};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CAL_MARKER: Regex = Regex::new(r"(?i)/@cal\s*").unwrap();
}

const START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Combine a parsed command with defaults into a calendar-ready event.
///
/// The timezone travels as a separate field; the timestamps themselves carry
/// no offset. The end timestamp is the start plus the resolved duration,
/// rolling over day/month/year boundaries as needed.
pub fn build_calendar_event(
    parsed: &ParsedCommand,
    timezone: &str,
    default_duration: i64,
    today: NaiveDate,
) -> CalResult<CalendarEvent> {
    let date = parsed
        .date
        .clone()
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
    let time = parsed.time.clone().unwrap_or_else(|| DEFAULT_TIME.to_string());
    let duration = parsed.duration.unwrap_or(default_duration);

    let start_date_time = format!("{}T{}:00", date, time);
    let start = NaiveDateTime::parse_from_str(&start_date_time, START_FORMAT)
        .map_err(|_| command_error(&format!("Invalid event start: {}", start_date_time)))?;
    let end = start + Duration::minutes(duration);
    let end_date_time = end.format(START_FORMAT).to_string();

    let attendees = parsed.attendees.as_ref().map(|emails| {
        emails
            .iter()
            .map(|email| Attendee {
                email: email.clone(),
            })
            .collect()
    });

    Ok(CalendarEvent {
        id: None,
        summary: parsed.title.clone(),
        description: None,
        start: EventDateTime {
            date_time: start_date_time,
            time_zone: timezone.to_string(),
        },
        end: EventDateTime {
            date_time: end_date_time,
            time_zone: timezone.to_string(),
        },
        attendees,
    })
}

/// Rewrite a command line into its checked-off form after a successful create
pub fn completed_line(line: &str) -> String {
    let cleaned = CAL_MARKER.replace(line, "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        "- [x]".to_string()
    } else {
        format!("- [x] {}", cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parser::parse_event_command;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn minutes_between(event: &CalendarEvent) -> i64 {
        let start = NaiveDateTime::parse_from_str(&event.start.date_time, START_FORMAT).unwrap();
        let end = NaiveDateTime::parse_from_str(&event.end.date_time, START_FORMAT).unwrap();
        (end - start).num_minutes()
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed = parse_event_command("/@cal Lunch", day(2024, 1, 15)).unwrap();
        let event = build_calendar_event(&parsed, "Europe/Helsinki", 60, day(2024, 1, 15)).unwrap();

        assert_eq!(event.summary, "Lunch");
        assert_eq!(event.start.date_time, "2024-01-15T09:00:00");
        assert_eq!(event.end.date_time, "2024-01-15T10:00:00");
        assert_eq!(event.start.time_zone, "Europe/Helsinki");
        assert!(event.attendees.is_none());
        assert_eq!(minutes_between(&event), 60);
    }

    #[test]
    fn end_time_matches_resolved_duration() {
        let line = "/@cal Team standup /@date:tomorrow /@time:9am /@duration:15m /@with:a@x.com,b@x.com /@video:zoom";
        let parsed = parse_event_command(line, day(2024, 1, 15)).unwrap();
        let event = build_calendar_event(&parsed, "UTC", 60, day(2024, 1, 15)).unwrap();

        assert_eq!(event.start.date_time, "2024-01-16T09:00:00");
        assert_eq!(event.end.date_time, "2024-01-16T09:15:00");
        assert_eq!(minutes_between(&event), 15);
        assert_eq!(event.attendees.as_ref().unwrap().len(), 2);
        assert_eq!(event.attendees.as_ref().unwrap()[0].email, "a@x.com");
    }

    #[test]
    fn end_time_rolls_over_day_boundary() {
        let parsed = parse_event_command(
            "/@cal Night watch /@time:23:45 /@duration:30",
            day(2024, 1, 15),
        )
        .unwrap();
        let event = build_calendar_event(&parsed, "UTC", 60, day(2024, 1, 15)).unwrap();

        assert_eq!(event.start.date_time, "2024-01-15T23:45:00");
        assert_eq!(event.end.date_time, "2024-01-16T00:15:00");
    }

    #[test]
    fn end_time_rolls_over_year_boundary() {
        let parsed = parse_event_command(
            "/@cal Countdown /@date:2024-12-31 /@time:23:30 /@duration:1h",
            day(2024, 12, 30),
        )
        .unwrap();
        let event = build_calendar_event(&parsed, "UTC", 60, day(2024, 12, 30)).unwrap();

        assert_eq!(event.end.date_time, "2025-01-01T00:30:00");
    }

    #[test]
    fn unparseable_start_is_a_command_error() {
        let parsed = parse_event_command("/@cal Vague plans /@time:sometime", day(2024, 1, 15))
            .unwrap();

        assert!(build_calendar_event(&parsed, "UTC", 60, day(2024, 1, 15)).is_err());
    }

    #[test]
    fn completed_line_strips_marker() {
        assert_eq!(
            completed_line("/@cal Team standup /@time:9am"),
            "- [x] Team standup /@time:9am"
        );
        assert_eq!(completed_line("/@cal"), "- [x]");
    }
}
