use thiserror::Error;

/// Top-level error type for the `superset-api` crate.
///
/// Covers every failure mode of the Superset REST surface: login,
/// transport, non-2xx responses, name resolution, and response decoding.
/// `superset-provider` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, disabled account, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-2xx response, with the raw body for diagnostics.
    #[error("Superset API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Identity resolution ─────────────────────────────────────────
    /// No remote entity matched the human-readable key.
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    /// More than one remote entity matched the key.
    #[error("{entity} '{key}' is ambiguous: matched ids {ids:?}")]
    AmbiguousName {
        entity: &'static str,
        key: String,
        ids: Vec<i64>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON decoding failed or a required field was missing, with the raw
    /// body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the remote side reported the entity as absent,
    /// either through an HTTP 404 or a failed name lookup.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Api { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// The HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
