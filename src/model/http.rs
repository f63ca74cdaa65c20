//! Shared HTTP client and status mapping.

use std::sync::OnceLock;

use crate::error::AideError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client. Requests carry no client-side
/// timeout; callers bound them with `util::run_bounded`.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> AideError {
    match status {
        401 | 403 => AideError::Authentication(error_message(body)),
        _ => AideError::api(status, error_message(body)),
    }
}

// Google and OpenAI-style bodies carry `{"error": {"message": ..}}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
