use crate::api::dsfm::FetchError;

/// One-line display text for a fetch failure, shown inline in the panel
/// region it affects. Shape errors read like API errors on screen.
pub fn format_fetch_error(error: &FetchError) -> String {
    match error {
        FetchError::Connection(_) => {
            "Backend server is not available. Retrying on the next refresh.".to_string()
        }
        FetchError::Api { status, message, .. } => {
            format!("API error ({}): {}", status, message)
        }
        FetchError::DataShape(message) => {
            format!("API error: unexpected response ({})", message)
        }
    }
}

/// Persistent banner shown while the backend is unreachable
pub fn connection_banner(base_url: &str) -> String {
    format!(
        "⚠ Backend Server Offline - showing fallback data. Start the API server at {} to see live data.",
        base_url
    )
}
