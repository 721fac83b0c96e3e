use crate::config::Config;
use serde::{Deserialize, Serialize};

/// Credentials and default timezone for one calendar service connection
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub timezone: String,
}

impl CalendarConfig {
    /// Carve the client credentials out of the flat settings record.
    ///
    /// Returns `None` when any credential is missing, so callers skip remote
    /// work instead of issuing requests that can only fail.
    pub fn from_settings(config: &Config) -> Option<Self> {
        if !config.has_credentials() {
            return None;
        }

        Some(Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            refresh_token: config.google_refresh_token.clone(),
            timezone: config.timezone.clone(),
        })
    }
}

/// Event boundary instant with its timezone carried separately
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

/// Event participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

/// Calendar event value object, both outgoing (create) and incoming (list)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
}

/// One entry of the remote calendar-list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarListEntry {
    pub id: String,
    pub summary: String,
    pub primary: bool,
    pub background_color: Option<String>,
}
