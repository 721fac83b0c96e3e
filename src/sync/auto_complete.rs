use crate::error::CalResult;
use crate::vault::NoteVault;
use chrono::{Local, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

lazy_static! {
    static ref TASK_LINE_PATTERN: Regex =
        Regex::new(r"(?i)^- \[ \] (\d{1,2}:\d{2}\s*(?:AM|PM)?)").unwrap();
}

/// Path of today's note inside the daily-notes folder
pub fn today_note_path(folder: &str, today: NaiveDate) -> String {
    format!("{}/{}.md", folder, today.format("%Y-%m-%d"))
}

/// Parse the leading time of an unchecked task line against today's date.
///
/// Returns `None` for lines that are not unchecked tasks with a time prefix.
pub fn parse_event_time(line: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let caps = TASK_LINE_PATTERN.captures(line)?;
    let time_str = caps.get(1)?.as_str().trim();

    let mut parts = time_str.split_whitespace();
    let clock = parts.next()?;
    let period = parts.next();

    let (hours_str, minutes_str) = clock.split_once(':')?;
    let hours: u32 = hours_str.parse().ok()?;
    let minutes: u32 = minutes_str.parse().ok()?;

    let mut hour = hours;
    if let Some(period) = period {
        if period.eq_ignore_ascii_case("PM") && hour < 12 {
            hour += 12;
        }
        if period.eq_ignore_ascii_case("AM") && hour == 12 {
            hour = 0;
        }
    }

    today.and_hms_opt(hour, minutes, 0)
}

/// Check off an unchecked task line (first occurrence, literal match)
pub fn mark_line_complete(line: &str) -> String {
    line.replacen("- [ ]", "- [x]", 1)
}

/// Rewrite every past-due task line in the note text.
///
/// A line is past due when its parsed time is strictly before `now`.
pub fn process_content(content: &str, now: NaiveDateTime) -> (String, bool) {
    let today = now.date();
    let mut modified = false;

    let lines: Vec<String> = content
        .split('\n')
        .map(|line| match parse_event_time(line, today) {
            Some(event_time) if event_time < now => {
                modified = true;
                mark_line_complete(line)
            }
            _ => line.to_string(),
        })
        .collect();

    (lines.join("\n"), modified)
}

/// One poll pass: read today's note if it exists, check off past-due lines,
/// and write back only when something changed
pub async fn run_tick(vault: &dyn NoteVault, folder: &str) -> CalResult<bool> {
    let now = Local::now().naive_local();
    let path = today_note_path(folder, now.date());

    if !vault.exists(&path).await {
        return Ok(false);
    }

    let content = vault.read(&path).await?;
    let (new_content, modified) = process_content(&content, now);

    if modified {
        vault.write(&path, &new_content).await?;
        debug!("Checked off past events in {}", path);
    }

    Ok(modified)
}

/// Recurring auto-complete poller with explicit lifecycle management.
///
/// Ticks are chained: each tick finishes its work before the inter-tick
/// sleep starts, so ticks never overlap. The cancellation token is checked
/// before the work and raced against the sleep, so no side effects happen
/// after `stop` returns; an in-flight write started before cancellation is
/// allowed to complete (`stop` awaits the task).
pub struct AutoCompleteController {
    vault: Arc<dyn NoteVault>,
    folder: String,
    interval: Duration,
    cancellation: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl AutoCompleteController {
    pub fn new(vault: Arc<dyn NoteVault>, folder: impl Into<String>, interval: Duration) -> Self {
        Self {
            vault,
            folder: folder.into(),
            interval,
            cancellation: None,
            task: None,
        }
    }

    /// Start the recurring tick; a second start is a no-op
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let token = CancellationToken::new();
        let tick_token = token.clone();
        let vault = Arc::clone(&self.vault);
        let folder = self.folder.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            loop {
                if tick_token.is_cancelled() {
                    break;
                }

                if let Err(e) = run_tick(vault.as_ref(), &folder).await {
                    error!("Auto-complete tick failed: {:?}", e);
                }

                tokio::select! {
                    _ = tick_token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("Auto-complete poller exited");
        });

        self.cancellation = Some(token);
        self.task = Some(task);
        info!("Auto-complete poller started");
    }

    /// Cancel the schedule and wait for the current tick to finish
    pub async fn stop(&mut self) {
        if let Some(token) = self.cancellation.take() {
            token.cancel();
        }

        if let Some(task) = self.task.take() {
            if task.await.is_err() {
                error!("Auto-complete poller task panicked");
            }
        }

        info!("Auto-complete poller stopped");
    }

    pub fn is_running(&self) -> bool {
        self.cancellation.is_some()
    }
}

impl Drop for AutoCompleteController {
    fn drop(&mut self) {
        if let Some(token) = self.cancellation.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        day(2024, 1, 15).and_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_today_note_path() {
        assert_eq!(
            today_note_path("daily", day(2024, 1, 15)),
            "daily/2024-01-15.md"
        );
    }

    #[test]
    fn test_parse_event_time() {
        let today = day(2024, 1, 15);

        assert_eq!(
            parse_event_time("- [ ] 9:00 AM - Standup", today),
            Some(at(9, 0))
        );
        assert_eq!(
            parse_event_time("- [ ] 2:30 PM - Review", today),
            Some(at(14, 30))
        );
        assert_eq!(
            parse_event_time("- [ ] 12:00 AM - Midnight", today),
            Some(at(0, 0))
        );
        assert_eq!(
            parse_event_time("- [ ] 12:15 PM - Lunch", today),
            Some(at(12, 15))
        );
        // A bare 24-hour time needs no period
        assert_eq!(
            parse_event_time("- [ ] 14:30 - Review", today),
            Some(at(14, 30))
        );

        // Checked tasks and plain lines are not candidates
        assert!(parse_event_time("- [x] 9:00 AM - Standup", today).is_none());
        assert!(parse_event_time("- [ ] Standup", today).is_none());
        assert!(parse_event_time("9:00 AM - Standup", today).is_none());
    }

    #[test]
    fn past_line_is_checked_off() {
        let (content, modified) = process_content("- [ ] 9:00 AM - Standup", at(14, 0));

        assert!(modified);
        assert_eq!(content, "- [x] 9:00 AM - Standup");
    }

    #[test]
    fn future_line_is_unchanged() {
        let (content, modified) = process_content("- [ ] 9:00 AM - Standup", at(8, 0));

        assert!(!modified);
        assert_eq!(content, "- [ ] 9:00 AM - Standup");
    }

    #[test]
    fn exact_tick_time_is_not_past_due() {
        let (content, modified) = process_content("- [ ] 9:00 AM - Standup", at(9, 0));

        assert!(!modified);
        assert_eq!(content, "- [ ] 9:00 AM - Standup");
    }

    #[test]
    fn mixed_content_only_rewrites_past_tasks() {
        let content = "# Daily Note\n- [ ] 9:00 AM - Standup\n- [ ] 4:00 PM - Demo\nNotes here";
        let (result, modified) = process_content(content, at(14, 0));

        assert!(modified);
        assert_eq!(
            result,
            "# Daily Note\n- [x] 9:00 AM - Standup\n- [ ] 4:00 PM - Demo\nNotes here"
        );
    }
}
