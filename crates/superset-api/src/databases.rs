// Database and meta database endpoints
//
// Listing reads go through the shared `DatabaseCache`. Every mutation
// requires a CSRF session and invalidates the cache afterwards so later
// resolvers in the same run see the change.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::SupersetClient;
use crate::error::Error;
use crate::models::{
    DatabaseInfo, DatabasePayload, DatabaseRecord, DatabaseSummary, ExtraDocument, ItemResponse,
    ListResponse, META_DATABASE_URI, MetaDatabase, MetaDatabaseSpec,
};

/// How many databases `database_infos` enriches by default.
pub const DATABASE_INFOS_LIMIT: usize = 100;

const META_DATABASE_ENGINE: &str = "superset";
const META_DATABASE_CONFIGURATION_METHOD: &str = "sqlalchemy_form";
const URI_PLACEHOLDER: &str = "URI not provided";
const NAME_PLACEHOLDER: &str = "Name not provided";

impl SupersetClient {
    // ── Databases ────────────────────────────────────────────────────

    /// The database listing, served from the shared cache when fresh.
    ///
    /// `GET /api/v1/database/?q=(page_size:5000)`
    pub async fn list_databases(&self) -> Result<Arc<Vec<DatabaseSummary>>, Error> {
        self.database_cache()
            .get_or_fetch(|| self.fetch_databases())
            .await
    }

    async fn fetch_databases(&self) -> Result<Vec<DatabaseSummary>, Error> {
        let url = self.listing_url("database/")?;
        debug!("listing databases");
        let resp: ListResponse<DatabaseSummary> = self.get(url).await?;
        Ok(resp.result)
    }

    /// Full database detail.
    ///
    /// `GET /api/v1/database/{id}`
    pub async fn get_database(&self, id: i64) -> Result<DatabaseRecord, Error> {
        let url = self.api_url(&format!("database/{id}"))?;
        debug!(database_id = id, "fetching database");
        let resp: ItemResponse<DatabaseRecord> = self.get(url).await?;
        Ok(with_id(resp, id))
    }

    /// Database detail with connection parameters broken out.
    ///
    /// `GET /api/v1/database/{id}/connection`
    pub async fn get_database_connection(&self, id: i64) -> Result<DatabaseRecord, Error> {
        let url = self.api_url(&format!("database/{id}/connection"))?;
        debug!(database_id = id, "fetching database connection");
        let resp: ItemResponse<DatabaseRecord> = self.get(url).await?;
        Ok(with_id(resp, id))
    }

    /// Schema names visible through a database connection.
    ///
    /// `GET /api/v1/database/{id}/schemas/`
    pub async fn get_database_schemas(&self, id: i64) -> Result<Vec<String>, Error> {
        let url = self.api_url(&format!("database/{id}/schemas/"))?;
        debug!(database_id = id, "fetching database schemas");
        let resp: ListResponse<String> = self.get(url).await?;
        Ok(resp.result)
    }

    /// Create a database connection and return the created record.
    ///
    /// `POST /api/v1/database/` (CSRF protected)
    pub async fn create_database(&self, payload: &DatabasePayload) -> Result<DatabaseRecord, Error> {
        let url = self.api_url("database/")?;
        debug!(name = %payload.database_name, "creating database");
        let csrf = self.csrf_session().await?;
        let resp: ItemResponse<DatabaseRecord> = self.post(url, payload, Some(&csrf)).await?;
        self.database_cache().invalidate().await;

        let id = resp.id.or(resp.result.id).ok_or_else(|| Error::Deserialization {
            message: "create database response carried no id".into(),
            body: String::new(),
        })?;
        Ok(with_id(resp, id))
    }

    /// Replace a database connection's settings.
    ///
    /// `PUT /api/v1/database/{id}` (CSRF protected)
    pub async fn update_database(
        &self,
        id: i64,
        payload: &DatabasePayload,
    ) -> Result<DatabaseRecord, Error> {
        let url = self.api_url(&format!("database/{id}"))?;
        debug!(database_id = id, "updating database");
        let csrf = self.csrf_session().await?;
        let resp: ItemResponse<DatabaseRecord> = self.put(url, payload, Some(&csrf)).await?;
        self.database_cache().invalidate().await;
        Ok(with_id(resp, id))
    }

    /// Delete a database connection.
    ///
    /// `DELETE /api/v1/database/{id}` (CSRF protected)
    pub async fn delete_database(&self, id: i64) -> Result<(), Error> {
        let url = self.api_url(&format!("database/{id}"))?;
        debug!(database_id = id, "deleting database");
        let csrf = self.csrf_session().await?;
        let result = self.delete(url, Some(&csrf)).await;
        self.database_cache().invalidate().await;
        result
    }

    /// Connection string and schemas for the first `limit` listed databases.
    ///
    /// Missing names and URIs are replaced by readable placeholders rather
    /// than left empty.
    pub async fn database_infos(&self, limit: usize) -> Result<Vec<DatabaseInfo>, Error> {
        let databases = self.list_databases().await?;
        let mut infos = Vec::with_capacity(databases.len().min(limit));

        for db in databases.iter().take(limit) {
            let connection = self.get_database_connection(db.id).await?;
            let schemas = self.get_database_schemas(db.id).await?;

            let sqlalchemy_uri = connection
                .sqlalchemy_uri
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| URI_PLACEHOLDER.to_owned());
            let database_name = if connection.database_name.is_empty() {
                NAME_PLACEHOLDER.to_owned()
            } else {
                connection.database_name
            };

            infos.push(DatabaseInfo {
                id: db.id,
                database_name,
                schemas,
                sqlalchemy_uri,
            });
        }

        Ok(infos)
    }

    // ── Meta databases ───────────────────────────────────────────────

    /// Fetch a meta database and decode its allowed-database list.
    ///
    /// The detail endpoint omits `extra` on some Superset releases, so a
    /// non-empty `extra` from the cached listing takes precedence.
    pub async fn get_meta_database(&self, id: i64) -> Result<MetaDatabase, Error> {
        let record = self.get_database(id).await?;

        let listed_extra = match self.list_databases().await {
            Ok(listing) => listing
                .iter()
                .find(|db| db.id == id)
                .and_then(|db| db.extra.clone())
                .filter(|extra| !extra.trim().is_empty()),
            Err(e) => {
                warn!(database_id = id, error = %e, "listing unavailable, using detail extra");
                None
            }
        };

        let raw_extra = listed_extra.or_else(|| record.extra.clone());
        let allowed_databases = match raw_extra.as_deref().map(ExtraDocument::parse) {
            Some(Ok(Some(doc))) => doc.engine_params.allowed_dbs,
            Some(Ok(None)) | None => None,
            Some(Err(e)) => {
                return Err(Error::Deserialization {
                    message: format!("meta database {id} has malformed extra: {e}"),
                    body: raw_extra.unwrap_or_default(),
                });
            }
        };

        Ok(MetaDatabase {
            id,
            database_name: record.database_name,
            sqlalchemy_uri: record.sqlalchemy_uri.unwrap_or_default(),
            expose_in_sqllab: record.expose_in_sqllab.unwrap_or(true),
            allow_ctas: record.allow_ctas.unwrap_or(false),
            allow_cvas: record.allow_cvas.unwrap_or(false),
            allow_dml: record.allow_dml.unwrap_or(false),
            allow_run_async: record.allow_run_async.unwrap_or(true),
            is_managed_externally: record.is_managed_externally.unwrap_or(false),
            allowed_databases,
        })
    }

    /// Create a meta database and return its id.
    ///
    /// `POST /api/v1/database/` with engine `superset` (CSRF protected)
    pub async fn create_meta_database(&self, spec: &MetaDatabaseSpec) -> Result<i64, Error> {
        let payload = meta_database_payload(spec)?;
        let record = self.create_database(&payload).await?;
        record.id.ok_or_else(|| Error::Deserialization {
            message: "create meta database response carried no id".into(),
            body: String::new(),
        })
    }

    /// Replace a meta database's settings.
    ///
    /// `PUT /api/v1/database/{id}` (CSRF protected)
    pub async fn update_meta_database(&self, id: i64, spec: &MetaDatabaseSpec) -> Result<(), Error> {
        let payload = meta_database_payload(spec)?;
        self.update_database(id, &payload).await.map(drop)
    }

    /// Delete a meta database. Same endpoint as any other database.
    pub async fn delete_meta_database(&self, id: i64) -> Result<(), Error> {
        self.delete_database(id).await
    }
}

fn with_id(resp: ItemResponse<DatabaseRecord>, fallback: i64) -> DatabaseRecord {
    let mut record = resp.result;
    record.id = record.id.or(resp.id).or(Some(fallback));
    record
}

fn meta_database_payload(spec: &MetaDatabaseSpec) -> Result<DatabasePayload, Error> {
    let extra = ExtraDocument::with_allowed_databases(&spec.allowed_databases)
        .to_json_string()
        .map_err(|e| Error::Deserialization {
            message: format!("failed to encode meta database extra: {e}"),
            body: String::new(),
        })?;

    let sqlalchemy_uri = if spec.sqlalchemy_uri.is_empty() {
        META_DATABASE_URI.to_owned()
    } else {
        spec.sqlalchemy_uri.clone()
    };

    Ok(DatabasePayload {
        database_name: spec.database_name.clone(),
        sqlalchemy_uri,
        engine: Some(META_DATABASE_ENGINE.to_owned()),
        configuration_method: Some(META_DATABASE_CONFIGURATION_METHOD.to_owned()),
        expose_in_sqllab: spec.expose_in_sqllab,
        allow_ctas: spec.allow_ctas,
        allow_cvas: spec.allow_cvas,
        allow_dml: spec.allow_dml,
        allow_run_async: spec.allow_run_async,
        allow_csv_upload: None,
        allow_multi_schema_metadata_fetch: None,
        cache_timeout: None,
        is_managed_externally: Some(spec.is_managed_externally),
        extra,
    })
}
