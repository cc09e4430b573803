// Provider configuration
//
// Values merge lowest to highest: built-in defaults, `SUPERSET_*`
// environment variables, then the explicit provider block. Validation
// reports every missing or malformed field at once so users fix them in
// one pass.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use superset_api::{Credentials, DEFAULT_DATABASE_CACHE_TTL, TlsMode, TransportConfig};

use crate::diagnostics::{Diagnostic, Diagnostics};

pub const ENV_PREFIX: &str = "SUPERSET_";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── Raw configuration ───────────────────────────────────────────────

/// The provider block as written by the user. Every field is optional so
/// environment variables can fill the gaps.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
    /// Database listing cache lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
}

/// Merged, not yet validated values.
#[derive(Debug, Deserialize, Serialize)]
struct RawConfig {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    host: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    username: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    password: Option<String>,
    timeout: u64,
    insecure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ca_cert: Option<PathBuf>,
    cache_ttl: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT_SECS,
            insecure: false,
            ca_cert: None,
            cache_ttl: DEFAULT_DATABASE_CACHE_TTL.as_secs(),
        }
    }
}

/// Environment values are parsed loosely, so a numeric password arrives as
/// a number. Accept any scalar and keep its textual form.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

// ── Validated configuration ─────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub host: Url,
    pub username: String,
    pub password: SecretString,
    pub timeout: Duration,
    pub insecure: bool,
    pub ca_cert: Option<PathBuf>,
    pub database_cache_ttl: Duration,
}

impl ProviderConfig {
    /// Merge defaults, environment, and `block`, then validate.
    pub fn load(block: &ProviderBlock) -> Result<Self, Diagnostics> {
        let figment = Figment::new()
            .merge(Serialized::defaults(RawConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).only(&[
                "host", "username", "password", "timeout", "insecure", "ca_cert", "cache_ttl",
            ]))
            .merge(Serialized::defaults(block));
        Self::from_figment(&figment)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, Diagnostics> {
        let raw: RawConfig = figment.extract().map_err(|e| {
            Diagnostics::from(Diagnostic::error(
                "Invalid Provider Configuration",
                format!("The provider configuration could not be read: {e}"),
            ))
        })?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, Diagnostics> {
        let mut diags = Diagnostics::new();

        let host = non_empty(raw.host);
        let username = non_empty(raw.username);
        let password = non_empty(raw.password);

        if host.is_none() {
            diags.push(missing("host", "Host", "SUPERSET_HOST"));
        }
        if username.is_none() {
            diags.push(missing("username", "Username", "SUPERSET_USERNAME"));
        }
        if password.is_none() {
            diags.push(missing("password", "Password", "SUPERSET_PASSWORD"));
        }

        let host = match host.as_deref().map(Url::parse) {
            Some(Ok(url)) if matches!(url.scheme(), "http" | "https") => Some(url),
            Some(Ok(url)) => {
                diags.push(invalid_host(&format!("unsupported scheme '{}'", url.scheme())));
                None
            }
            Some(Err(e)) => {
                diags.push(invalid_host(&e.to_string()));
                None
            }
            None => None,
        };

        if raw.timeout == 0 {
            diags.push(
                Diagnostic::error(
                    "Invalid Superset API Timeout",
                    "The request timeout must be at least one second.",
                )
                .with_attribute("timeout"),
            );
        }

        match (host, username, password) {
            (Some(host), Some(username), Some(password)) if !diags.has_errors() => Ok(Self {
                host,
                username,
                password: SecretString::from(password),
                timeout: Duration::from_secs(raw.timeout),
                insecure: raw.insecure,
                ca_cert: raw.ca_cert,
                database_cache_ttl: Duration::from_secs(raw.cache_ttl),
            }),
            _ => Err(diags),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            cookie_jar: None,
        }
        .with_cookie_jar()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing(attribute: &str, label: &str, env: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Missing Superset API {label}"),
        format!(
            "The provider cannot create the Superset API client as there is a missing or empty \
             value for the Superset API {}. Set the {attribute} value in the configuration or \
             use the {env} environment variable.",
            label.to_lowercase()
        ),
    )
    .with_attribute(attribute)
}

fn invalid_host(reason: &str) -> Diagnostic {
    Diagnostic::error(
        "Invalid Superset API Host",
        format!("The Superset API host is not a valid http(s) URL: {reason}"),
    )
    .with_attribute("host")
}
