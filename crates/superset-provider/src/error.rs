// ── Provider error types ──
//
// Domain errors raised by the reconcilers. `superset_api::Error` is
// translated into these before it reaches a diagnostic, so users see
// "role 'x' not found" rather than a raw status code wherever possible.

use thiserror::Error;

use crate::diagnostics::{Diagnostic, Diagnostics};

#[derive(Debug, Error)]
pub enum ProviderError {
    // ── Remote errors ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: String, key: String },

    #[error("{entity} '{key}' matches more than one remote object (ids {ids:?})")]
    AmbiguousName {
        entity: String,
        key: String,
        ids: Vec<i64>,
    },

    #[error("Superset API error{}: {message}", status_suffix(.status))]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Unexpected response shape: {message}")]
    Shape { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid import id '{id}': expected a numeric Superset id")]
    InvalidImportId { id: String },

    #[error("Provider has not been configured")]
    NotConfigured,
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ProviderError {
    /// Whether the remote side reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Api { status: Some(404), .. })
    }

    /// Render as an error diagnostic under the given summary title.
    pub fn to_diagnostic(&self, summary: &str) -> Diagnostic {
        Diagnostic::error(summary, self.to_string())
    }
}

// ── Conversion from API errors ───────────────────────────────────────

impl From<superset_api::Error> for ProviderError {
    fn from(err: superset_api::Error) -> Self {
        match err {
            superset_api::Error::Authentication { message } => {
                ProviderError::AuthenticationFailed { message }
            }
            superset_api::Error::Transport(ref e) => ProviderError::Api {
                message: e.to_string(),
                status: err.status(),
            },
            superset_api::Error::InvalidUrl(e) => ProviderError::Config {
                message: format!("Invalid URL: {e}"),
            },
            superset_api::Error::Tls(message) => ProviderError::Config {
                message: format!("TLS error: {message}"),
            },
            superset_api::Error::Api { status, body } => ProviderError::Api {
                message: body,
                status: Some(status),
            },
            superset_api::Error::NotFound { entity, key } => ProviderError::NotFound {
                entity: entity.to_owned(),
                key,
            },
            superset_api::Error::AmbiguousName { entity, key, ids } => {
                ProviderError::AmbiguousName {
                    entity: entity.to_owned(),
                    key,
                    ids,
                }
            }
            superset_api::Error::Deserialization { message, body: _ } => {
                ProviderError::Shape { message }
            }
        }
    }
}

/// Attach a summary title to a failing result, turning it into diagnostics.
pub(crate) trait Summarize<T> {
    fn summarize(self, summary: &str) -> Result<T, Diagnostics>;
}

impl<T, E> Summarize<T> for Result<T, E>
where
    E: Into<ProviderError>,
{
    fn summarize(self, summary: &str) -> Result<T, Diagnostics> {
        self.map_err(|e| {
            let err: ProviderError = e.into();
            Diagnostics::from(err.to_diagnostic(summary))
        })
    }
}
