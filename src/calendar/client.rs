use super::models::{Attendee, CalendarConfig, CalendarEvent, CalendarListEntry, EventDateTime};
use super::token::TokenManager;
use crate::error::{calendar_error, CalResult};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use futures::future::try_join_all;
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// Google Calendar REST API base
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar identifier of the account's primary calendar
pub const PRIMARY_CALENDAR_ID: &str = "primary";

/// Summary substituted for events the service returns without one
const UNTITLED_SUMMARY: &str = "Untitled";

/// Client for the remote calendar service.
///
/// Owns the access-token cache for its process lifetime; every request pair
/// (token, call) goes through `get_access_token` so the refresh-on-expiry
/// invariant holds.
pub struct CalendarClient {
    client: Client,
    token_manager: TokenManager,
    api_base: String,
}

impl CalendarClient {
    pub fn new(config: CalendarConfig) -> Self {
        Self {
            client: Client::new(),
            token_manager: TokenManager::new(config),
            api_base: GOOGLE_CALENDAR_API.to_string(),
        }
    }

    /// Client against non-default endpoints, used by the integration tests
    pub fn with_endpoints(
        config: CalendarConfig,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token_manager: TokenManager::with_token_url(config, token_url),
            api_base: api_base.into(),
        }
    }

    /// Get a bearer token from the cache, refreshing on expiry
    pub async fn get_access_token(&self) -> CalResult<String> {
        self.token_manager.get_access_token().await
    }

    /// Create an event on the target calendar.
    ///
    /// Returns the created event's identifier, or `None` when the response
    /// carries no identifier.
    pub async fn create_event(
        &self,
        event: &CalendarEvent,
        calendar_id: &str,
    ) -> CalResult<Option<String>> {
        let access_token = self.get_access_token().await?;
        let url = format!("{}/calendars/{}/events", self.api_base, calendar_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to create event: {}", e)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| calendar_error(&format!("Failed to parse create response: {}", e)))?;

        if !status.is_success() {
            return Err(calendar_error(&remote_error_message(
                &body,
                "Failed to create event",
            )));
        }

        Ok(body.get("id").and_then(|id| id.as_str()).map(String::from))
    }

    /// Fetch today's events across the given calendars.
    ///
    /// The query window is the invoking machine's local calendar day. One
    /// list request is issued per calendar, concurrently and fail-fast; the
    /// merged results are sorted ascending by start instant.
    pub async fn fetch_today_events(
        &self,
        timezone: &str,
        calendar_ids: &[String],
    ) -> CalResult<Vec<CalendarEvent>> {
        let (time_min, time_max) = local_day_bounds()?;

        let ids: Vec<&str> = if calendar_ids.is_empty() {
            vec![PRIMARY_CALENDAR_ID]
        } else {
            calendar_ids.iter().map(String::as_str).collect()
        };

        let fetches = ids
            .iter()
            .map(|id| self.fetch_day_events(id, &time_min, &time_max, timezone));
        let per_calendar = try_join_all(fetches).await?;

        let mut events: Vec<CalendarEvent> = per_calendar.into_iter().flatten().collect();
        events.sort_by(|a, b| {
            let key_a = (start_instant(a).unwrap_or(i64::MAX), &a.start.date_time);
            let key_b = (start_instant(b).unwrap_or(i64::MAX), &b.start.date_time);
            key_a.cmp(&key_b)
        });

        Ok(events)
    }

    async fn fetch_day_events(
        &self,
        calendar_id: &str,
        time_min: &str,
        time_max: &str,
        timezone: &str,
    ) -> CalResult<Vec<CalendarEvent>> {
        let access_token = self.get_access_token().await?;

        let mut url = Url::parse(&format!(
            "{}/calendars/{}/events",
            self.api_base, calendar_id
        ))
        .map_err(|e| calendar_error(&format!("Failed to parse URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("timeMin", time_min)
            .append_pair("timeMax", time_max)
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("timeZone", timezone);

        let response = self
            .client
            .get(url)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to fetch events: {}", e)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| calendar_error(&format!("Failed to parse events response: {}", e)))?;

        if !status.is_success() {
            return Err(calendar_error(&remote_error_message(
                &body,
                "Failed to fetch events",
            )));
        }

        let items = body
            .get("items")
            .and_then(|items| items.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(items
            .iter()
            .map(|item| map_event_item(item, timezone))
            .collect())
    }

    /// Fetch the account's calendar list
    pub async fn fetch_calendar_list(&self) -> CalResult<Vec<CalendarListEntry>> {
        let access_token = self.get_access_token().await?;
        let url = format!("{}/users/me/calendarList", self.api_base);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to fetch calendar list: {}", e)))?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            calendar_error(&format!("Failed to parse calendar list response: {}", e))
        })?;

        if !status.is_success() {
            return Err(calendar_error(&remote_error_message(
                &body,
                "Failed to fetch calendar list",
            )));
        }

        let items = body
            .get("items")
            .and_then(|items| items.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(items.iter().map(map_calendar_list_item).collect())
    }
}

/// Extract the remote error message from a non-success response body
fn remote_error_message(body: &Value, fallback: &str) -> String {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or(fallback)
        .to_string()
}

/// Today's local midnight-to-midnight window, rendered RFC 3339
fn local_day_bounds() -> CalResult<(String, String)> {
    let midnight = Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| calendar_error("Failed to create datetime"))?;

    let start = match Local.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(first, _) => first,
        chrono::LocalResult::None => {
            return Err(calendar_error("Invalid local midnight"));
        }
    };
    let end = start + Duration::days(1);

    Ok((start.to_rfc3339(), end.to_rfc3339()))
}

/// Map one remote event item, applying the documented fallbacks: missing
/// summary becomes "Untitled", a missing per-item timezone falls back to the
/// requested one, `dateTime` wins over the all-day `date`, and an attendee
/// without an email keeps an empty one rather than being dropped
fn map_event_item(item: &Value, fallback_timezone: &str) -> CalendarEvent {
    let id = item.get("id").and_then(|v| v.as_str()).map(String::from);
    let summary = item
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap_or(UNTITLED_SUMMARY)
        .to_string();
    let description = item
        .get("description")
        .and_then(|v| v.as_str())
        .map(String::from);

    let attendees = item.get("attendees").and_then(|v| v.as_array()).map(|list| {
        list.iter()
            .map(|attendee| Attendee {
                email: attendee
                    .get("email")
                    .and_then(|e| e.as_str())
                    .unwrap_or("")
                    .to_string(),
            })
            .collect()
    });

    CalendarEvent {
        id,
        summary,
        description,
        start: map_event_boundary(item.get("start"), fallback_timezone),
        end: map_event_boundary(item.get("end"), fallback_timezone),
        attendees,
    }
}

fn map_event_boundary(boundary: Option<&Value>, fallback_timezone: &str) -> EventDateTime {
    let date_time = boundary
        .and_then(|b| b.get("dateTime").and_then(|v| v.as_str()))
        .or_else(|| boundary.and_then(|b| b.get("date").and_then(|v| v.as_str())))
        .unwrap_or("")
        .to_string();
    let time_zone = boundary
        .and_then(|b| b.get("timeZone").and_then(|v| v.as_str()))
        .unwrap_or(fallback_timezone)
        .to_string();

    EventDateTime {
        date_time,
        time_zone,
    }
}

fn map_calendar_list_item(item: &Value) -> CalendarListEntry {
    CalendarListEntry {
        id: item
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        summary: item
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        primary: item
            .get("primary")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        background_color: item
            .get("backgroundColor")
            .and_then(|v| v.as_str())
            .map(String::from),
    }
}

/// Start instant of an event for cross-calendar ordering, tolerating the
/// offset, naive and all-day timestamp shapes the service produces
fn start_instant(event: &CalendarEvent) -> Option<i64> {
    let raw = event.start.date_time.as_str();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }

    None
}
