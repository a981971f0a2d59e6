use log::{info, warn};
use serde_json::json;
use std::sync::Mutex;

use crate::client::{ApiResponse, Transport};
use crate::error::Result;

pub const LOGIN_PAGE: &str = "/login";

/// Where the panel goes after the session ends
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Navigator for headless use: logs the redirect and remembers it
#[derive(Debug, Default)]
pub struct LogNavigator {
    last: Mutex<Option<String>>,
}

impl LogNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_location(&self) -> Option<String> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl Navigator for LogNavigator {
    fn navigate(&self, location: &str) {
        info!("Redirecting to {}", location);
        if let Ok(mut last) = self.last.lock() {
            *last = Some(location.to_string());
        }
    }
}

/// Sign in with username and password; the transport keeps the session cookie
pub async fn login(transport: &dyn Transport, username: &str, password: &str) -> Result<ApiResponse> {
    info!("Logging in as '{}'", username);
    let response = transport
        .post(
            LOGIN_PAGE,
            json!({"username": username, "password": password}),
        )
        .await?;
    if !response.ok {
        warn!("Login rejected for '{}'", username);
    }
    Ok(response)
}

/// End the session, then go to the login page whatever the server said
pub async fn logout(transport: &dyn Transport, navigator: &dyn Navigator) {
    match transport.post("/logout", json!({})).await {
        Ok(response) if !response.ok => warn!("Logout returned a non-success status"),
        Ok(_) => info!("Session terminated"),
        Err(e) => warn!("Logout request failed: {}", e),
    }
    navigator.navigate(LOGIN_PAGE);
}
