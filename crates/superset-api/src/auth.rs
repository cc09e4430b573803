// Superset authentication
//
// Database-backed login against the security API. The returned bearer
// token is stored on the client and attached to every later request.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use crate::client::{SupersetClient, decode};
use crate::error::Error;
use crate::models::LoginResponse;

/// Username/password pair for the `db` auth provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    provider: &'static str,
    refresh: bool,
}

impl SupersetClient {
    /// Authenticate and store the bearer token.
    ///
    /// `POST /api/v1/security/login` with `{"provider": "db", "refresh": true}`.
    /// Any non-2xx status is reported as `Error::Authentication`; a 2xx
    /// response without `access_token` is a shape error.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), Error> {
        let url = self.api_url("security/login")?;
        debug!(username = %credentials.username, "logging in at {}", url);

        let body = LoginRequest {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
            provider: "db",
            refresh: true,
        };

        let resp = self.http().post(url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {text}"),
            });
        }

        let parsed: LoginResponse = decode(&text)?;
        self.set_access_token(SecretString::from(parsed.access_token));

        debug!("login successful");
        Ok(())
    }
}
