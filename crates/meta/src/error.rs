//! Ad-platform client error types.

/// Errors from ad-platform API calls.
#[derive(Debug, thiserror::Error)]
pub enum MetaApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0} s")]
    Timeout(u64),

    /// The platform returned a non-2xx status without an error object.
    #[error("Meta API returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response carried an `error { message, code }` object.
    #[error("Meta API error (code {code}): {message}")]
    Api { message: String, code: i64 },

    /// The response body was not the JSON shape we expected.
    #[error("Malformed Meta API response: {0}")]
    MalformedResponse(String),
}
