use calnote::calendar::models::CalendarConfig;
use calnote::calendar::CalendarClient;
use calnote::config::EventFormat;
use calnote::sync::auto_complete::{today_note_path, AutoCompleteController};
use calnote::sync::import::{import_daily_events, ImportConfig};
use calnote::vault::{FsVault, NoteVault};
use chrono::Local;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> CalendarClient {
    CalendarClient::with_endpoints(
        CalendarConfig {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            refresh_token: "test_refresh_token".to_string(),
            timezone: "UTC".to_string(),
        },
        format!("{}/token", server.uri()),
        server.uri(),
    )
}

fn import_config() -> ImportConfig {
    ImportConfig {
        schedule_heading: "## Schedule".to_string(),
        event_format: EventFormat::Task,
        timezone: "UTC".to_string(),
        selected_calendar_ids: vec!["primary".to_string()],
    }
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "test-token"})),
        )
        .mount(server)
        .await;
}

async fn mount_events(server: &MockServer, items: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": items})))
        .mount(server)
        .await;
}

/// Importing into an existing heading inserts the event lines directly after
/// it and before the next section, leaving everything else byte-identical
#[tokio::test]
async fn import_splices_events_under_the_heading() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_events(
        &server,
        json!([
            {
                "summary": "Standup",
                "start": {"dateTime": "2024-01-15T09:00:00"},
                "end": {"dateTime": "2024-01-15T09:15:00"}
            },
            {
                "summary": "Design review",
                "start": {"dateTime": "2024-01-15T14:30:00"},
                "end": {"dateTime": "2024-01-15T15:30:00"}
            }
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let vault = FsVault::new(dir.path());
    vault
        .write(
            "daily/today.md",
            "# Daily Note\n\n## Schedule\n\n## Tasks\n- Task 1",
        )
        .await
        .unwrap();

    let client = test_client(&server);
    import_daily_events(&client, &vault, "daily/today.md", &import_config())
        .await
        .unwrap();

    let content = vault.read("daily/today.md").await.unwrap();
    assert_eq!(
        content,
        "# Daily Note\n\n## Schedule\n- [ ] 9:00 AM - Standup\n- [ ] 2:30 PM - Design review\n\n## Tasks\n- Task 1"
    );
}

/// A missing heading appends a fresh section to the end of the note
#[tokio::test]
async fn import_appends_section_when_heading_is_missing() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_events(
        &server,
        json!([
            {
                "summary": "Standup",
                "start": {"dateTime": "2024-01-15T09:00:00"},
                "end": {"dateTime": "2024-01-15T09:15:00"}
            }
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let vault = FsVault::new(dir.path());
    vault
        .write("daily/today.md", "# Daily Note\n\nSome content")
        .await
        .unwrap();

    let client = test_client(&server);
    import_daily_events(&client, &vault, "daily/today.md", &import_config())
        .await
        .unwrap();

    let content = vault.read("daily/today.md").await.unwrap();
    assert_eq!(
        content,
        "# Daily Note\n\nSome content\n\n## Schedule\n- [ ] 9:00 AM - Standup\n"
    );
}

/// Zero fetched events leaves the note alone, even when it does not exist
#[tokio::test]
async fn import_with_no_events_is_a_no_op() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    mount_events(&server, json!([])).await;

    let dir = tempfile::tempdir().unwrap();
    let vault = FsVault::new(dir.path());

    let client = test_client(&server);
    import_daily_events(&client, &vault, "daily/today.md", &import_config())
        .await
        .unwrap();

    assert!(!vault.exists("daily/today.md").await);
}

/// The poller checks off past-due lines while running and stops cleanly
#[tokio::test]
async fn poller_checks_off_past_events_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let vault: Arc<dyn NoteVault> = Arc::new(FsVault::new(dir.path()));

    let today_path = today_note_path("daily", Local::now().date_naive());
    vault
        .write(&today_path, "- [ ] 12:00 AM - Midnight review\n- [ ] 11:59 PM - Late task")
        .await
        .unwrap();

    let mut controller =
        AutoCompleteController::new(Arc::clone(&vault), "daily", Duration::from_millis(25));
    assert!(!controller.is_running());

    controller.start();
    assert!(controller.is_running());

    tokio::time::sleep(Duration::from_millis(100)).await;

    let content = vault.read(&today_path).await.unwrap();
    assert_eq!(
        content,
        "- [x] 12:00 AM - Midnight review\n- [ ] 11:59 PM - Late task"
    );

    controller.stop().await;
    assert!(!controller.is_running());

    // No further tick may touch the file after stop() returns
    vault
        .write(&today_path, "- [ ] 12:00 AM - Written after stop")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let content = vault.read(&today_path).await.unwrap();
    assert_eq!(content, "- [ ] 12:00 AM - Written after stop");
}

/// A tick without today's note does nothing and keeps the schedule alive
#[tokio::test]
async fn poller_skips_missing_notes() {
    let dir = tempfile::tempdir().unwrap();
    let vault: Arc<dyn NoteVault> = Arc::new(FsVault::new(dir.path()));

    let mut controller =
        AutoCompleteController::new(Arc::clone(&vault), "daily", Duration::from_millis(25));
    controller.start();

    tokio::time::sleep(Duration::from_millis(80)).await;

    // The note appears between ticks and is picked up by a later one
    let today_path = today_note_path("daily", Local::now().date_naive());
    vault
        .write(&today_path, "- [ ] 12:00 AM - Midnight review")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let content = vault.read(&today_path).await.unwrap();
    assert_eq!(content, "- [x] 12:00 AM - Midnight review");

    controller.stop().await;
}
