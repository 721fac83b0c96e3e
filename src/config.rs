use crate::error::{config_error, CalResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default daily notes folder
pub const DEFAULT_NOTES_FOLDER: &str = "daily";
/// Default heading under which imported events are inserted
pub const DEFAULT_SCHEDULE_HEADING: &str = "## Calendar";
/// Default auto-complete poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 60_000;
/// Default event duration in minutes
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Path of the persisted settings file
const CONFIG_FILE: &str = "config/calnote.toml";

/// Rendering style for imported event lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    #[default]
    Task,
    Bullet,
}

/// Main configuration structure for the sync daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Google OAuth client ID (environment only, never written to disk)
    #[serde(skip)]
    pub google_client_id: String,
    /// Google OAuth client secret (environment only, never written to disk)
    #[serde(skip)]
    pub google_client_secret: String,
    /// Google OAuth refresh token (environment only, never written to disk)
    #[serde(skip)]
    pub google_refresh_token: String,
    /// Folder holding one note file per calendar date
    pub daily_notes_folder: String,
    /// Heading line marking the imported-events region of a daily note
    pub schedule_heading: String,
    /// How imported events are rendered
    pub event_format: EventFormat,
    /// Import today's events into today's note on daemon startup
    pub auto_import_on_open: bool,
    /// Run the auto-complete poller
    pub auto_complete_enabled: bool,
    /// Auto-complete poll interval in milliseconds
    pub auto_complete_interval_ms: u64,
    /// Default event duration in minutes
    pub default_duration_minutes: i64,
    /// IANA timezone name attached to created events
    pub timezone: String,
    /// Calendar identifiers queried on import
    pub selected_calendar_ids: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_refresh_token: String::new(),
            daily_notes_folder: DEFAULT_NOTES_FOLDER.to_string(),
            schedule_heading: DEFAULT_SCHEDULE_HEADING.to_string(),
            event_format: EventFormat::Task,
            auto_import_on_open: true,
            auto_complete_enabled: true,
            auto_complete_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            timezone: String::from("UTC"),
            selected_calendar_ids: vec![String::from("primary")],
        }
    }
}

impl Config {
    /// Load configuration from the settings file and environment
    pub fn load() -> CalResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = if Path::new(CONFIG_FILE).exists() {
            let content = fs::read_to_string(CONFIG_FILE)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };

        // Credentials come from the environment only
        config.google_client_id = env::var("GOOGLE_CLIENT_ID").unwrap_or_default();
        config.google_client_secret = env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default();
        config.google_refresh_token = env::var("GOOGLE_REFRESH_TOKEN").unwrap_or_default();

        if let Ok(timezone) = env::var("TIMEZONE") {
            config.timezone = timezone;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> CalResult<()> {
        chrono_tz::Tz::from_str(&self.timezone)
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))?;

        if self.auto_complete_interval_ms == 0 {
            return Err(config_error("auto_complete_interval_ms must be positive"));
        }

        if self.default_duration_minutes <= 0 {
            return Err(config_error("default_duration_minutes must be positive"));
        }

        Ok(())
    }

    /// Whether the three OAuth credentials are all present
    pub fn has_credentials(&self) -> bool {
        !self.google_client_id.is_empty()
            && !self.google_client_secret.is_empty()
            && !self.google_refresh_token.is_empty()
    }

    /// Save the non-credential settings to the config file
    pub fn save(&self) -> CalResult<()> {
        if !Path::new("config").exists() {
            fs::create_dir("config")?;
        }

        let toml_str = toml::to_string(self)?;
        fs::write(CONFIG_FILE, toml_str)?;

        Ok(())
    }
}
