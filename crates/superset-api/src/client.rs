// Superset REST client
//
// Wraps `reqwest::Client` with bearer-token authentication, `/api/v1` URL
// construction, CSRF session handling, and typed response decoding. The
// endpoint families (roles, permissions, databases, datasets) are
// implemented as inherent methods in sibling files so this module stays
// focused on transport mechanics.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::REFERER;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::cache::DatabaseCache;
use crate::error::Error;
use crate::models::CsrfResponse;
use crate::transport::TransportConfig;

/// Page size used for every listing call; Superset has no cursor paging.
pub const LISTING_PAGE_SIZE: u32 = 5000;

/// A CSRF token fetched for one mutation.
///
/// Database mutations are rejected unless the token, a matching `Referer`,
/// and the session cookie issued with the token are all present. The cookie
/// rides in the client's cookie jar, so only the token is kept here.
#[derive(Debug, Clone)]
pub struct CsrfSession {
    token: SecretString,
}

/// Raw HTTP client for the Superset REST API.
///
/// One client is built per provider configuration. The database listing
/// cache is injected so several clients in one process can share a single
/// snapshot.
pub struct SupersetClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: RwLock<Option<SecretString>>,
    databases: Arc<DatabaseCache>,
}

impl SupersetClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the Superset root (e.g. `https://superset.example.com`);
    /// the `/api/v1` prefix is added per request.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            access_token: RwLock::new(None),
            databases: Arc::new(DatabaseCache::default()),
        }
    }

    /// Replace the private listing cache with a shared one.
    pub fn with_database_cache(mut self, cache: Arc<DatabaseCache>) -> Self {
        self.databases = cache;
        self
    }

    /// The listing cache this client reads through.
    pub fn database_cache(&self) -> &Arc<DatabaseCache> {
        &self.databases
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token management ─────────────────────────────────────────────

    pub(crate) fn set_access_token(&self, token: SecretString) {
        debug!("storing access token");
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Whether a bearer token has been acquired.
    pub fn is_authenticated(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/v1/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/v1/{path}"))?)
    }

    /// Build a listing URL carrying the single large page query.
    pub(crate) fn listing_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.api_url(path)?;
        url.set_query(Some(&format!("q=(page_size:{LISTING_PAGE_SIZE})")));
        Ok(url)
    }

    fn referer(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    // ── CSRF ─────────────────────────────────────────────────────────

    /// Fetch a fresh CSRF token.
    ///
    /// `GET /api/v1/security/csrf_token/`
    ///
    /// The session cookie Superset binds the token to is stored by the
    /// cookie jar of the underlying `reqwest::Client`; build the client with
    /// [`TransportConfig::with_cookie_jar`] or mutations will be rejected.
    pub async fn csrf_session(&self) -> Result<CsrfSession, Error> {
        let url = self.api_url("security/csrf_token/")?;
        debug!("GET {}", url);

        let body = self
            .send(self.http.get(url).header(REFERER, self.referer()))
            .await?;
        let parsed: CsrfResponse = decode(&body)?;
        trace!("CSRF token acquired");
        Ok(CsrfSession {
            token: SecretString::from(parsed.result),
        })
    }

    fn apply_csrf(
        &self,
        builder: reqwest::RequestBuilder,
        csrf: Option<&CsrfSession>,
    ) -> reqwest::RequestBuilder {
        let Some(session) = csrf else {
            return builder;
        };
        builder
            .header("X-CSRFToken", session.token.expose_secret())
            .header(REFERER, self.referer())
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let body = self.send(self.http.get(url)).await?;
        decode(&body)
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        csrf: Option<&CsrfSession>,
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let builder = self.apply_csrf(self.http.post(url).json(body), csrf);
        let body = self.send(builder).await?;
        decode(&body)
    }

    /// Send a POST request whose response body is irrelevant.
    pub(crate) async fn post_unit(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        csrf: Option<&CsrfSession>,
    ) -> Result<(), Error> {
        debug!("POST {}", url);
        let builder = self.apply_csrf(self.http.post(url).json(body), csrf);
        self.send(builder).await.map(drop)
    }

    /// Send a PUT request with a JSON body and decode the JSON response.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        csrf: Option<&CsrfSession>,
    ) -> Result<T, Error> {
        debug!("PUT {}", url);
        let builder = self.apply_csrf(self.http.put(url).json(body), csrf);
        let body = self.send(builder).await?;
        decode(&body)
    }

    /// Send a PUT request whose response body is irrelevant.
    pub(crate) async fn put_unit(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        csrf: Option<&CsrfSession>,
    ) -> Result<(), Error> {
        debug!("PUT {}", url);
        let builder = self.apply_csrf(self.http.put(url).json(body), csrf);
        self.send(builder).await.map(drop)
    }

    /// Send a DELETE request. Both 200 and 204 count as success.
    pub(crate) async fn delete(&self, url: Url, csrf: Option<&CsrfSession>) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let builder = self.apply_csrf(self.http.delete(url), csrf);
        self.send(builder).await.map(drop)
    }

    /// Attach the bearer token, send, and return the raw body of a 2xx
    /// response. Anything else becomes `Error::Api` with status and body.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, Error> {
        let resp = self.authorize(builder).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            trace!(status = status.as_u16(), bytes = body.len(), "response received");
            Ok(body)
        } else {
            debug!(status = status.as_u16(), "request failed");
            Err(Error::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Decode a JSON body, keeping a preview of the payload on failure.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
