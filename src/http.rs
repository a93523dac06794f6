//! Shared HTTP plumbing for the three generative back-ends.
//!
//! Every client maps transport failures and non-success responses onto
//! [`BackendError`], so the pipeline can apply one failure policy regardless
//! of which provider answered.

use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Errors that can occur while calling a generative back-end.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("back-end request timed out")]
    Timeout,

    /// The back-end answered with a non-success status code.
    #[error("back-end returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded as expected.
    #[error("failed to decode back-end response: {0}")]
    Decode(String),

    /// The response was well-formed but carried no usable payload.
    #[error("back-end returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Longest error body kept in [`BackendError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Build a client with a per-request timeout.
///
/// A default client is used as a last resort if the builder fails.
pub fn client_with_timeout(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Pass successful responses through; turn anything else into
/// [`BackendError::Status`] carrying a truncated copy of the body.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}
