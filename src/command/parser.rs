use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

/// Literal marker identifying a line as an event-creation command
pub const CAL_COMMAND: &str = "/@cal";

/// Start time used when a command carries no `/@time:` parameter
pub const DEFAULT_TIME: &str = "09:00";

/// Duration in minutes used when a `/@duration:` value cannot be parsed
const FALLBACK_DURATION_MINUTES: i64 = 60;

lazy_static! {
    static ref CAL_MARKER: Regex = Regex::new(r"(?i)/@cal\s*").unwrap();
    static ref DATE_PARAM: Regex = Regex::new(r"(?i)/@date:(\S+)").unwrap();
    static ref TIME_PARAM: Regex = Regex::new(r"(?i)/@time:(\S+)").unwrap();
    static ref DURATION_PARAM: Regex = Regex::new(r"(?i)/@duration:(\S+)").unwrap();
    static ref WITH_PARAM: Regex = Regex::new(r"(?i)/@with:(\S+)").unwrap();
    static ref VIDEO_PARAM: Regex = Regex::new(r"(?i)/@video:(zoom|meet|teams)").unwrap();
    static ref TIME_PATTERN: Regex = Regex::new(r"^(\d{1,2})(?::(\d{2}))?(am|pm)?$").unwrap();
    static ref DURATION_PATTERN: Regex = Regex::new(r"(?i)^(\d+)(m|h)?$").unwrap();
    static ref CHECKBOX_PATTERN: Regex = Regex::new(r"^-\s*\[.\]\s*").unwrap();
}

/// Conferencing service requested with `/@video:`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoProvider {
    Zoom,
    Meet,
    Teams,
}

impl VideoProvider {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "zoom" => Some(Self::Zoom),
            "meet" => Some(Self::Meet),
            "teams" => Some(Self::Teams),
            _ => None,
        }
    }
}

/// Structured event-creation request extracted from one line of note text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub title: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<i64>,
    pub attendees: Option<Vec<String>>,
    pub video: Option<VideoProvider>,
}

/// Canonicalize a command time value to zero-padded 24-hour `HH:MM`.
///
/// Accepts `H`, `H:MM`, optionally suffixed `am`/`pm` (case-insensitive).
/// Anything else passes through unchanged.
pub fn parse_time(time_str: &str) -> String {
    let lower = time_str.to_lowercase();
    let Some(caps) = TIME_PATTERN.captures(&lower) else {
        return time_str.to_string();
    };

    let raw_hours: u32 = caps[1].parse().unwrap_or(0);
    let minutes = caps.get(2).map(|m| m.as_str()).unwrap_or("00");
    let period = caps.get(3).map(|p| p.as_str());

    let mut hours = raw_hours;
    if period == Some("pm") && hours < 12 {
        hours += 12;
    }
    if period == Some("am") && hours == 12 {
        hours = 0;
    }

    format!("{:02}:{}", hours, minutes)
}

/// Resolve a command date value to `YYYY-MM-DD`.
///
/// The literals `today` and `tomorrow` resolve against the supplied date;
/// anything else passes through unchanged (assumed already ISO-formatted).
pub fn parse_date(date_str: &str, today: NaiveDate) -> String {
    match date_str.to_lowercase().as_str() {
        "today" => today.format("%Y-%m-%d").to_string(),
        "tomorrow" => (today + Duration::days(1)).format("%Y-%m-%d").to_string(),
        _ => date_str.to_string(),
    }
}

/// Parse a command duration value into minutes.
///
/// `N` and `Nm` are minutes, `Nh` is hours; unparseable input yields 60.
pub fn parse_duration(duration_str: &str) -> i64 {
    let Some(caps) = DURATION_PATTERN.captures(duration_str) else {
        return FALLBACK_DURATION_MINUTES;
    };

    let Ok(value) = caps[1].parse::<i64>() else {
        return FALLBACK_DURATION_MINUTES;
    };

    let is_hours = caps
        .get(2)
        .map(|unit| unit.as_str().eq_ignore_ascii_case("h"))
        .unwrap_or(false);

    if is_hours {
        value * 60
    } else {
        value
    }
}

/// Compute the event title by stripping the command marker, every parameter
/// token and any leading checkbox marker, then trimming whitespace
pub fn clean_title(line: &str) -> String {
    let without_cal = CAL_MARKER.replace(line, "");
    let without_date = DATE_PARAM.replace(&without_cal, "");
    let without_time = TIME_PARAM.replace(&without_date, "");
    let without_duration = DURATION_PARAM.replace(&without_time, "");
    let without_with = WITH_PARAM.replace(&without_duration, "");
    let without_video = VIDEO_PARAM.replace(&without_with, "");
    let without_checkbox = CHECKBOX_PATTERN.replace(&without_video, "");

    without_checkbox.trim().to_string()
}

/// Parse one line of note text into an event-creation request.
///
/// Returns `None` when the line does not contain the command marker. Each
/// parameter is matched independently; `today` anchors the relative date
/// literals.
pub fn parse_event_command(line: &str, today: NaiveDate) -> Option<ParsedCommand> {
    if !line.contains(CAL_COMMAND) {
        return None;
    }

    let date = DATE_PARAM
        .captures(line)
        .map(|caps| parse_date(&caps[1], today));
    let time = TIME_PARAM.captures(line).map(|caps| parse_time(&caps[1]));
    let duration = DURATION_PARAM
        .captures(line)
        .map(|caps| parse_duration(&caps[1]));
    let attendees = WITH_PARAM
        .captures(line)
        .map(|caps| caps[1].split(',').map(String::from).collect());
    let video = VIDEO_PARAM
        .captures(line)
        .and_then(|caps| VideoProvider::parse(&caps[1]));
    let title = clean_title(line);

    Some(ParsedCommand {
        title,
        date,
        time,
        duration,
        attendees,
        video,
    })
}
