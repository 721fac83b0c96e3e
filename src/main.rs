use calnote::error::other_error;
use calnote::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calnote");

    // Load configuration
    let config = startup::load_config().await?;

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None | Some("daemon") => startup::run_daemon(config).await,
        Some("import") => startup::run_import(config).await,
        Some("create") => {
            let line = args[2..].join(" ");
            startup::run_create(config, &line).await
        }
        Some("calendars") => startup::run_calendars(config).await,
        Some(other) => Err(other_error(&format!(
            "Unknown action '{}'; expected daemon, import, create or calendars",
            other
        ))
        .into()),
    }
}
