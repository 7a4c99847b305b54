use thiserror::Error;

/// Which remote resource a fetch was for. Drives the fallback messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Profile,
    Transactions,
}

impl Resource {
    fn service_fallback(self) -> &'static str {
        match self {
            Resource::Profile => "Failed to fetch user details",
            Resource::Transactions => "Failed to fetch transactions",
        }
    }

    fn transport_fallback(self) -> &'static str {
        match self {
            Resource::Profile => "An error occurred while fetching user details",
            Resource::Transactions => "An error occurred while fetching transactions",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The service answered, but with a non-success status in its envelope.
    #[error("Service error: {}", .0.as_deref().unwrap_or("no message"))]
    Service(Option<String>),

    /// The request failed before a usable envelope came back.
    #[error("Transport error: {}", .0.as_deref().unwrap_or("no message"))]
    Transport(Option<String>),
}

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// User-facing message for this failure, falling back to the resource's
    /// generic text when the service gave none.
    pub fn user_message(&self, resource: Resource) -> String {
        let (message, fallback) = match self {
            ApiError::Service(m) => (m, resource.service_fallback()),
            ApiError::Transport(m) => (m, resource.transport_fallback()),
        };
        message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    /// Build a transport error from an HTTP error status and its body.
    ///
    /// The message is taken from a JSON body's `message` field when there is
    /// one; anything else is only logged.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = extract_message(body);
        if message.is_none() {
            tracing::debug!(
                status = status.as_u16(),
                body = %truncate_body(body),
                "Error response carried no message"
            );
        }
        ApiError::Transport(message)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        tracing::debug!(error = %e, "Request failed");
        ApiError::Transport(None)
    }
}

/// Pull the `message` field out of a JSON error body, if any.
pub(crate) fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .filter(|m| !m.is_empty())
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}
