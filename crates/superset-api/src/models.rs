// Typed request and response shapes for the Superset REST API.
//
// Responses are decoded once at the client boundary. Required fields are
// plain types so a missing one surfaces as `Error::Deserialization`;
// fields older Superset releases omit are `Option` with `#[serde(default)]`.

use serde::{Deserialize, Serialize};

/// The sentinel connection string that marks a meta database.
pub const META_DATABASE_URI: &str = "superset://";

// ── Envelopes ───────────────────────────────────────────────────────

/// `{ "count": N, "result": [...] }` wrapper used by every listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub count: Option<u64>,
    pub result: Vec<T>,
}

/// `{ "id": N, "result": {...} }` wrapper used by single-item reads and writes.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemResponse<T> {
    #[serde(default)]
    pub id: Option<i64>,
    pub result: T,
}

/// Write responses where only the assigned id matters.
#[derive(Debug, Clone, Deserialize)]
pub struct IdResponse {
    pub id: i64,
}

// ── Security ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CsrfResponse {
    pub result: String,
}

/// A role as returned by `GET /security/roles/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Inner body of `GET /security/roles/{id}`; the id may sit on the envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RoleBody {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// A permission/view-menu pair from `GET /security/permissions-resources/`.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionResource {
    pub id: i64,
    pub permission: NamedRef,
    pub view_menu: NamedRef,
}

/// A permission attached to a role (`GET /security/roles/{id}/permissions/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: i64,
    pub permission_name: String,
    pub view_menu_name: String,
}

/// Human-readable key of a permission/view-menu pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionKey {
    pub permission: String,
    pub view_menu: String,
}

impl PermissionKey {
    pub fn new(permission: impl Into<String>, view_menu: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
            view_menu: view_menu.into(),
        }
    }
}

impl std::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.permission, self.view_menu)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PermissionReplaceRequest<'a> {
    pub permission_view_menu_ids: &'a [i64],
}

// ── Databases ───────────────────────────────────────────────────────

/// One row of the database listing (`GET /database/?q=(page_size:N)`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseSummary {
    pub id: i64,
    pub database_name: String,
    #[serde(default)]
    pub sqlalchemy_uri: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub extra: Option<String>,
}

impl DatabaseSummary {
    pub fn is_meta(&self) -> bool {
        self.sqlalchemy_uri.as_deref() == Some(META_DATABASE_URI)
    }
}

/// Connection parameters broken out by `GET /database/{id}/connection`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConnectionParameters {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

/// A database record from the detail, connection, or write endpoints.
///
/// The three endpoints return overlapping field sets, so every field is
/// optional. A missing name decodes as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct DatabaseRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub sqlalchemy_uri: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub configuration_method: Option<String>,
    #[serde(default)]
    pub expose_in_sqllab: Option<bool>,
    #[serde(default)]
    pub allow_ctas: Option<bool>,
    #[serde(default)]
    pub allow_cvas: Option<bool>,
    #[serde(default)]
    pub allow_dml: Option<bool>,
    #[serde(default)]
    pub allow_run_async: Option<bool>,
    #[serde(default)]
    pub is_managed_externally: Option<bool>,
    #[serde(default)]
    pub extra: Option<String>,
    #[serde(default)]
    pub parameters: Option<ConnectionParameters>,
}

/// Create/update body for `POST /database/` and `PUT /database/{id}`.
///
/// Superset takes whole-object PUT semantics, so updates send every field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct DatabasePayload {
    pub database_name: String,
    pub sqlalchemy_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_method: Option<String>,
    pub expose_in_sqllab: bool,
    pub allow_ctas: bool,
    pub allow_cvas: bool,
    pub allow_dml: bool,
    pub allow_run_async: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_csv_upload: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_multi_schema_metadata_fetch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_managed_externally: Option<bool>,
    pub extra: String,
}

/// Enriched listing entry: connection string plus schemas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseInfo {
    pub id: i64,
    pub database_name: String,
    pub schemas: Vec<String>,
    pub sqlalchemy_uri: String,
}

// ── Meta databases ──────────────────────────────────────────────────

/// A meta database: a connection federating queries over other databases.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MetaDatabase {
    pub id: i64,
    pub database_name: String,
    pub sqlalchemy_uri: String,
    pub expose_in_sqllab: bool,
    pub allow_ctas: bool,
    pub allow_cvas: bool,
    pub allow_dml: bool,
    pub allow_run_async: bool,
    pub is_managed_externally: bool,
    /// `None` when neither the detail nor the listing carried an `extra` blob.
    pub allowed_databases: Option<Vec<String>>,
}

/// Desired shape of a meta database, before an id is known.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MetaDatabaseSpec {
    pub database_name: String,
    pub sqlalchemy_uri: String,
    pub expose_in_sqllab: bool,
    pub allow_ctas: bool,
    pub allow_cvas: bool,
    pub allow_dml: bool,
    pub allow_run_async: bool,
    pub is_managed_externally: bool,
    pub allowed_databases: Vec<String>,
}

/// The JSON document Superset stores, stringified, in a database's `extra`
/// field. Only `engine_params.allowed_dbs` carries meaning for meta
/// databases; the rest is written empty the way the UI does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraDocument {
    #[serde(default)]
    pub metadata_params: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub engine_params: EngineParams,
    #[serde(default)]
    pub metadata_cache_timeout: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub schemas_allowed_for_csv_upload: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_dbs: Option<Vec<String>>,
}

impl ExtraDocument {
    pub fn with_allowed_databases(allowed: &[String]) -> Self {
        Self {
            engine_params: EngineParams {
                allowed_dbs: Some(allowed.to_vec()),
            },
            ..Self::default()
        }
    }

    /// Parse a stringified `extra` field. Empty strings mean "not returned".
    pub fn parse(raw: &str) -> Result<Option<Self>, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(raw).map(Some)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Datasets ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetDatabaseRef {
    pub id: i64,
    #[serde(default)]
    pub database_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetOwner {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A dataset from `GET /dataset/{id}` or the dataset listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub id: Option<i64>,
    pub table_name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub database: Option<DatasetDatabaseRef>,
    #[serde(default)]
    pub owners: Vec<DatasetOwner>,
}

/// Body for `POST /dataset/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDatasetRequest {
    pub table_name: String,
    pub database: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// Body for `PUT /dataset/{id}`. There is no database field: a dataset's
/// database is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateDatasetRequest {
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}
