pub mod builder;
pub mod parser;

pub use parser::{ParsedCommand, VideoProvider};

use crate::calendar::{CalendarClient, PRIMARY_CALENDAR_ID};
use crate::config::Config;
use crate::error::CalResult;
use chrono::Local;
use tracing::info;

/// Create a calendar event from one line of note text.
///
/// Returns the checked-off replacement line when an event was created, or
/// `None` when the line is not a command or the service returned no event
/// identifier (a soft failure, not an error).
pub async fn create_event_from_line(
    client: &CalendarClient,
    config: &Config,
    line: &str,
) -> CalResult<Option<String>> {
    let today = Local::now().date_naive();

    let Some(parsed) = parser::parse_event_command(line, today) else {
        return Ok(None);
    };

    let event = builder::build_calendar_event(
        &parsed,
        &config.timezone,
        config.default_duration_minutes,
        today,
    )?;

    match client.create_event(&event, PRIMARY_CALENDAR_ID).await? {
        Some(id) => {
            info!("Created calendar event {}", id);
            Ok(Some(builder::completed_line(line)))
        }
        None => Ok(None),
    }
}
