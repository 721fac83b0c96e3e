use crate::calendar::{CalendarClient, CalendarConfig};
use crate::command::create_event_from_line;
use crate::config::Config;
use crate::error::{config_error, Error};
use crate::shutdown;
use crate::sync::auto_complete::{today_note_path, AutoCompleteController};
use crate::sync::import::{import_daily_events, ImportConfig};
use crate::vault::{FsVault, NoteVault};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build a calendar client when credentials are configured
fn build_client(config: &Config) -> Option<CalendarClient> {
    CalendarConfig::from_settings(config).map(CalendarClient::new)
}

/// Require a calendar client for actions that cannot proceed without one
fn require_client(config: &Config) -> miette::Result<CalendarClient> {
    build_client(config).ok_or_else(|| {
        config_error(
            "Google credentials not configured; set GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REFRESH_TOKEN",
        )
        .into()
    })
}

/// Run the sync daemon until a termination signal arrives
pub async fn run_daemon(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let settings = config.read().await.clone();
    let vault: Arc<dyn NoteVault> = Arc::new(FsVault::new("."));

    let client = build_client(&settings);
    if client.is_none() {
        warn!("No Google credentials configured; calendar operations disabled");
    }

    // Daemon counterpart of import-on-open: refresh today's note at startup
    if settings.auto_import_on_open {
        if let Some(client) = &client {
            let path = today_note_path(&settings.daily_notes_folder, Local::now().date_naive());
            match import_daily_events(client, vault.as_ref(), &path, &ImportConfig::from(&settings))
                .await
            {
                Ok(()) => info!("Imported today's events into {}", path),
                Err(e) => error!("Failed to import today's events: {:?}", e),
            }
        }
    }

    let mut controller = AutoCompleteController::new(
        Arc::clone(&vault),
        settings.daily_notes_folder.clone(),
        Duration::from_millis(settings.auto_complete_interval_ms),
    );

    if settings.auto_complete_enabled {
        controller.start();
    }

    // Wait for a termination signal
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send).await;
    });

    let _ = shutdown_recv.await;
    info!("Shutting down sync tasks...");
    controller.stop().await;

    Ok(())
}

/// One-shot import of today's events into today's daily note
pub async fn run_import(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let settings = config.read().await.clone();
    let client = require_client(&settings)?;
    let vault = FsVault::new(".");

    let path = today_note_path(&settings.daily_notes_folder, Local::now().date_naive());
    import_daily_events(&client, &vault, &path, &ImportConfig::from(&settings)).await?;
    info!("Imported today's events into {}", path);

    Ok(())
}

/// Create a calendar event from one line of command text
pub async fn run_create(config: Arc<RwLock<Config>>, line: &str) -> miette::Result<()> {
    let settings = config.read().await.clone();
    let client = require_client(&settings)?;

    match create_event_from_line(&client, &settings, line).await? {
        Some(completed) => println!("{}", completed),
        None => println!("No event created (not a /@cal command, or the service returned no id)"),
    }

    Ok(())
}

/// List the account's calendars
pub async fn run_calendars(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let settings = config.read().await.clone();
    let client = require_client(&settings)?;

    for calendar in client.fetch_calendar_list().await? {
        let label = if calendar.primary {
            format!("{} (Primary)", calendar.summary)
        } else {
            calendar.summary.clone()
        };
        println!("{}\t{}", calendar.id, label);
    }

    Ok(())
}
