use calnote::calendar::GOOGLE_TOKEN_URL;
use calnote::error::{env_error, other_error, CalResult};

const REDIRECT_URI: &str = "http://localhost:8080";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

#[tokio::main]
async fn main() -> CalResult<()> {
    dotenvy::dotenv().ok();

    let client_id =
        std::env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
    let client_secret =
        std::env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();

    // Construct authorization URL
    let auth_url = format!(
        "https://accounts.google.com/o/oauth2/v2/auth?\
        client_id={}&\
        redirect_uri={}&\
        response_type=code&\
        access_type=offline&\
        prompt=consent&\
        scope={}&\
        state={}",
        client_id, REDIRECT_URI, CALENDAR_SCOPE, state
    );

    // Open browser for authorization
    println!("Opening browser for Google Calendar authorization...");
    webbrowser::open(&auth_url)?;

    // Start local server to receive the callback
    let server = tiny_http::Server::http("0.0.0.0:8080")
        .map_err(|e| other_error(&format!("Failed to start callback server: {}", e)))?;
    println!("Waiting for authorization callback...");

    // Handle the callback
    let request = server
        .recv()
        .map_err(|e| other_error(&format!("Failed to receive callback: {}", e)))?;
    let url = request.url().to_string();

    // Parse the authorization code from the URL
    let code = url
        .split("code=")
        .nth(1)
        .and_then(|s| s.split('&').next())
        .ok_or_else(|| other_error("No authorization code found in callback"))?;

    // Exchange code for tokens
    let client = reqwest::Client::new();
    let response = client
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code.to_string()),
            ("redirect_uri", REDIRECT_URI.to_string()),
            ("grant_type", "authorization_code".to_string()),
        ])
        .send()
        .await
        .map_err(|e| other_error(&format!("Token exchange request failed: {}", e)))?;

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .map_err(|e| other_error(&format!("Could not read error response: {}", e)))?;
        return Err(other_error(&format!("Failed to get token: {}", error_text)));
    }

    let token_data: serde_json::Value = response
        .json()
        .await
        .map_err(|e| other_error(&format!("Failed to parse token response: {}", e)))?;

    let refresh_token = token_data
        .get("refresh_token")
        .and_then(|t| t.as_str())
        .ok_or_else(|| other_error("No refresh token received"))?;

    // Send success response to browser
    let response =
        tiny_http::Response::from_string("Authorization successful! You can close this window.");
    request
        .respond(response)
        .map_err(|e| other_error(&format!("Failed to respond to callback: {}", e)))?;

    println!("Authorization successful.");
    println!("Add this to your environment (or .env file):");
    println!("GOOGLE_REFRESH_TOKEN={}", refresh_token);

    Ok(())
}
