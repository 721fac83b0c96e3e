use crate::calendar::models::CalendarEvent;
use crate::calendar::CalendarClient;
use crate::config::{Config, EventFormat};
use crate::error::CalResult;
use crate::vault::NoteVault;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use tracing::debug;

/// Per-import parameters, carved out of the flat settings record
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub schedule_heading: String,
    pub event_format: EventFormat,
    pub timezone: String,
    pub selected_calendar_ids: Vec<String>,
}

impl From<&Config> for ImportConfig {
    fn from(config: &Config) -> Self {
        Self {
            schedule_heading: config.schedule_heading.clone(),
            event_format: config.event_format,
            timezone: config.timezone.clone(),
            selected_calendar_ids: config.selected_calendar_ids.clone(),
        }
    }
}

/// Render an event start as a 12-hour wall-clock time (`9:00 AM`, `2:30 PM`).
///
/// Accepts the timestamp shapes the service produces: RFC 3339 with offset,
/// naive datetime, or an all-day date (rendered as midnight). Anything else
/// falls back to the raw string.
pub fn format_time_12h(date_time: &str) -> String {
    let naive = if let Ok(dt) = DateTime::parse_from_rfc3339(date_time) {
        dt.naive_local()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(date_time, "%Y-%m-%dT%H:%M:%S") {
        dt
    } else if let Ok(date) = NaiveDate::parse_from_str(date_time, "%Y-%m-%d") {
        match date.and_hms_opt(0, 0, 0) {
            Some(dt) => dt,
            None => return date_time.to_string(),
        }
    } else {
        return date_time.to_string();
    };

    let (is_pm, hour) = naive.hour12();
    let period = if is_pm { "PM" } else { "AM" };

    format!("{}:{:02} {}", hour, naive.minute(), period)
}

/// Render one event as a note line in the configured format
pub fn format_event_line(event: &CalendarEvent, format: EventFormat) -> String {
    let time = format_time_12h(&event.start.date_time);
    let prefix = match format {
        EventFormat::Task => "- [ ]",
        EventFormat::Bullet => "-",
    };

    format!("{} {} - {}", prefix, time, event.summary)
}

/// Length of a line's leading `#` run; 0 for non-headings
pub fn heading_level(line: &str) -> usize {
    line.chars().take_while(|c| *c == '#').count()
}

/// Line span of a heading's region: the heading line itself through the line
/// before the next same-or-higher-level heading (exclusive end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingRegion {
    pub start: usize,
    pub end: usize,
}

/// Locate the region owned by `heading` in `content`.
///
/// The heading matches on exact trim-equality; a deeper heading does not end
/// the region, a sibling or ancestor does. Returns `None` when the heading
/// never appears.
pub fn find_heading_region(content: &str, heading: &str) -> Option<HeadingRegion> {
    let lines: Vec<&str> = content.split('\n').collect();
    let target_level = heading_level(heading);

    let mut start = None;
    let mut end = None;

    for (i, line) in lines.iter().enumerate() {
        if line.trim() == heading.trim() {
            start = Some(i);
            continue;
        }

        if start.is_some() {
            let level = heading_level(line);
            if level > 0 && level <= target_level {
                end = Some(i);
                break;
            }
        }
    }

    Some(HeadingRegion {
        start: start?,
        end: end.unwrap_or(lines.len()),
    })
}

/// Splice freshly formatted event lines into the note text.
///
/// When the heading exists its region body is replaced by the new lines plus
/// one blank separator; everything from the next sibling heading on is kept
/// untouched. When the heading is absent, a new section is appended to the
/// end of the file.
pub fn build_new_content(content: &str, event_lines: &[String], schedule_heading: &str) -> String {
    match find_heading_region(content, schedule_heading) {
        Some(region) => {
            let lines: Vec<&str> = content.split('\n').collect();
            let mut result: Vec<&str> = Vec::with_capacity(lines.len() + event_lines.len() + 1);
            result.extend(&lines[..=region.start]);
            result.extend(event_lines.iter().map(String::as_str));
            result.push("");
            result.extend(&lines[region.end..]);
            result.join("\n")
        }
        None => {
            let mut result: Vec<&str> = Vec::with_capacity(event_lines.len() + 3);
            result.push(content);
            result.push("");
            result.push(schedule_heading);
            result.extend(event_lines.iter().map(String::as_str));
            result.push("");
            result.join("\n")
        }
    }
}

/// Fetch today's events and splice them into the note at `path`.
///
/// Zero fetched events is a no-op: the note is neither read nor written.
/// A missing note starts from empty content, so the import creates it.
pub async fn import_daily_events(
    client: &CalendarClient,
    vault: &dyn NoteVault,
    path: &str,
    config: &ImportConfig,
) -> CalResult<()> {
    let events = client
        .fetch_today_events(&config.timezone, &config.selected_calendar_ids)
        .await?;

    if events.is_empty() {
        debug!("No events for today; leaving {} untouched", path);
        return Ok(());
    }

    let content = if vault.exists(path).await {
        vault.read(path).await?
    } else {
        String::new()
    };

    let event_lines: Vec<String> = events
        .iter()
        .map(|event| format_event_line(event, config.event_format))
        .collect();
    let new_content = build_new_content(&content, &event_lines, &config.schedule_heading);

    vault.write(path, &new_content).await
}
