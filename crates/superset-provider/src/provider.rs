// ── Provider entry point ──
//
// Owns the configured Superset client and routes engine callbacks, keyed by
// type name, to the typed resource and data source implementations. All
// JSON conversion happens here.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::IntoEnumIterator;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use superset_api::{DatabaseCache, SupersetClient};

use crate::config::{ProviderBlock, ProviderConfig};
use crate::data_sources::{
    DatabasesDataSource, DatasetsDataSource, RolePermissionsDataSource, RolesDataSource,
};
use crate::diagnostics::{Diagnostic, Diagnostics, Response};
use crate::error::{ProviderError, Summarize};
use crate::resource::{DataSource, DataSourceKind, ReadOutcome, Resource, ResourceKind};
use crate::resources::{
    DatabaseResource, DatasetResource, MetaDatabaseResource, RolePermissionsResource,
    RoleResource,
};
use crate::schema::{Attribute, AttributeType, Block, ProviderSchema, Schema};

pub const PROVIDER_NAME: &str = "superset";

const CONFIGURE_FAILED: &str = "Unable to Create Superset API Client";

/// One lifecycle call against a resource, with its untyped payloads.
enum Operation {
    Create { plan: Value },
    Read { state: Value },
    Update { prior: Value, plan: Value },
    Delete { state: Value },
    Import { id: String },
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Read { .. } => "read",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Import { .. } => "import",
        }
    }
}

/// The provider plugin.
///
/// Unconfigured until [`configure`](Self::configure) succeeds; every
/// callback before that fails with a "not configured" diagnostic.
#[derive(Default)]
pub struct SupersetProvider {
    /// Shared listing cache. When absent, `configure` builds one using the
    /// configured TTL.
    database_cache: Option<Arc<DatabaseCache>>,
    client: RwLock<Option<Arc<SupersetClient>>>,
}

impl SupersetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `cache` for database listings instead of a per-provider one.
    pub fn with_database_cache(mut self, cache: Arc<DatabaseCache>) -> Self {
        self.database_cache = Some(cache);
        self
    }

    /// Wrap an already authenticated client.
    pub fn with_client(client: Arc<SupersetClient>) -> Self {
        Self {
            database_cache: Some(Arc::clone(client.database_cache())),
            client: RwLock::new(Some(client)),
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Load configuration, build the client, and log in.
    pub async fn configure(&self, config: Value) -> Diagnostics {
        match self.try_configure(config).await {
            Ok(warnings) | Err(warnings) => warnings,
        }
    }

    async fn try_configure(&self, config: Value) -> Result<Diagnostics, Diagnostics> {
        let block: ProviderBlock = decode(config, "Invalid Provider Configuration")?;
        let config = ProviderConfig::load(&block)?;

        let cache = self
            .database_cache
            .clone()
            .unwrap_or_else(|| Arc::new(DatabaseCache::new(config.database_cache_ttl)));
        let client = SupersetClient::new(config.host.clone(), &config.transport())
            .summarize(CONFIGURE_FAILED)?
            .with_database_cache(cache);

        debug!(host = %config.host, username = %config.username, "logging in to Superset");
        client
            .login(&config.credentials())
            .await
            .summarize(CONFIGURE_FAILED)?;

        info!(host = %config.host, "configured Superset client");
        *self.client.write().await = Some(Arc::new(client));

        let mut warnings = Diagnostics::new();
        if config.insecure {
            warn!(host = %config.host, "TLS certificate verification disabled");
            warnings.push(
                Diagnostic::warning(
                    "Insecure Superset Connection",
                    "TLS certificate verification is disabled for the Superset API. \
                     Only use this against development instances.",
                )
                .with_attribute("insecure"),
            );
        }
        Ok(warnings)
    }

    async fn client(&self) -> Result<Arc<SupersetClient>, Diagnostics> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(ProviderError::NotConfigured)
            .summarize("Provider Not Configured")
    }

    // ── Schema ───────────────────────────────────────────────────────

    pub fn schema() -> ProviderSchema {
        let resources = ResourceKind::iter()
            .map(|kind| (kind.to_string(), resource_schema(kind)))
            .collect();
        let data_sources = DataSourceKind::iter()
            .map(|kind| (kind.to_string(), data_source_schema(kind)))
            .collect();

        ProviderSchema {
            provider: provider_block_schema(),
            resources,
            data_sources,
        }
    }

    // ── Resource callbacks ───────────────────────────────────────────

    pub async fn create(&self, type_name: &str, plan: Value) -> Response<Value> {
        self.dispatch(type_name, Operation::Create { plan }).await
    }

    /// `value` is `None` when the object was deleted out of band.
    pub async fn read(&self, type_name: &str, state: Value) -> Response<Value> {
        self.dispatch(type_name, Operation::Read { state }).await
    }

    pub async fn update(&self, type_name: &str, prior: Value, plan: Value) -> Response<Value> {
        self.dispatch(type_name, Operation::Update { prior, plan }).await
    }

    /// Succeeds with no value, including when the object was already gone.
    pub async fn delete(&self, type_name: &str, state: Value) -> Response<Value> {
        self.dispatch(type_name, Operation::Delete { state }).await
    }

    pub async fn import(&self, type_name: &str, id: &str) -> Response<Value> {
        let id = id.to_owned();
        self.dispatch(type_name, Operation::Import { id }).await
    }

    async fn dispatch(&self, type_name: &str, op: Operation) -> Response<Value> {
        let Ok(kind) = ResourceKind::from_str(type_name) else {
            return Response::failed(unknown_type("Resource", type_name));
        };
        let client = match self.client().await {
            Ok(client) => client,
            Err(diags) => return Response::failed(diags),
        };

        debug!(resource = %kind, operation = op.name(), "dispatching resource operation");
        match kind {
            ResourceKind::Role => run(RoleResource::new(client), op).await,
            ResourceKind::RolePermissions => run(RolePermissionsResource::new(client), op).await,
            ResourceKind::Database => run(DatabaseResource::new(client), op).await,
            ResourceKind::MetaDatabase => run(MetaDatabaseResource::new(client), op).await,
            ResourceKind::Dataset => run(DatasetResource::new(client), op).await,
        }
    }

    // ── Data source callbacks ────────────────────────────────────────

    pub async fn read_data_source(&self, type_name: &str, config: Value) -> Response<Value> {
        let Ok(kind) = DataSourceKind::from_str(type_name) else {
            return Response::failed(unknown_type("Data Source", type_name));
        };
        let client = match self.client().await {
            Ok(client) => client,
            Err(diags) => return Response::failed(diags),
        };

        debug!(data_source = %kind, "reading data source");
        match kind {
            DataSourceKind::Roles => query(RolesDataSource::new(client), config).await,
            DataSourceKind::RolePermissions => {
                query(RolePermissionsDataSource::new(client), config).await
            }
            DataSourceKind::Databases => query(DatabasesDataSource::new(client), config).await,
            DataSourceKind::Datasets => query(DatasetsDataSource::new(client), config).await,
        }
    }
}

// ── Typed execution ──────────────────────────────────────────────────

async fn run<R: Resource>(resource: R, op: Operation) -> Response<Value> {
    match execute(&resource, op).await {
        Ok(Some(value)) => Response::ok(value),
        Ok(None) => Response::empty(),
        Err(diags) => Response::failed(diags),
    }
}

/// `Ok(None)` for a delete, or a read of an object that is gone.
async fn execute<R: Resource>(resource: &R, op: Operation) -> Result<Option<Value>, Diagnostics> {
    match op {
        Operation::Create { plan } => {
            let plan = decode(plan, "Invalid Plan")?;
            encode(&resource.create(plan).await?).map(Some)
        }
        Operation::Read { state } => {
            let state = decode(state, "Invalid State")?;
            match resource.read(state).await? {
                ReadOutcome::Found(state) => encode(&state).map(Some),
                ReadOutcome::Gone => Ok(None),
            }
        }
        Operation::Update { prior, plan } => {
            let prior = decode(prior, "Invalid State")?;
            let plan = decode(plan, "Invalid Plan")?;
            encode(&resource.update(prior, plan).await?).map(Some)
        }
        Operation::Delete { state } => {
            let state = decode(state, "Invalid State")?;
            resource.delete(state).await?;
            Ok(None)
        }
        Operation::Import { id } => encode(&resource.import(&id).await?).map(Some),
    }
}

async fn query<D: DataSource>(data_source: D, config: Value) -> Response<Value> {
    query_typed(&data_source, config).await.into()
}

async fn query_typed<D: DataSource>(data_source: &D, config: Value) -> Result<Value, Diagnostics> {
    let config = decode(config, "Invalid Data Source Configuration")?;
    encode(&data_source.read(config).await?)
}

/// Null values from the engine decode like an empty object.
fn decode<T: DeserializeOwned>(value: Value, summary: &str) -> Result<T, Diagnostics> {
    let value = if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value
    };
    serde_json::from_value(value)
        .map_err(|e| Diagnostics::from(Diagnostic::error(summary, e.to_string())))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, Diagnostics> {
    serde_json::to_value(value).map_err(|e| {
        Diagnostics::from(Diagnostic::error("Unable to Encode State", e.to_string()))
    })
}

fn unknown_type(category: &str, type_name: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Unknown {category} Type"),
        format!("The {PROVIDER_NAME} provider does not register '{type_name}'."),
    )
}

// ── Schemas ──────────────────────────────────────────────────────────

fn resource_schema(kind: ResourceKind) -> Schema {
    match kind {
        ResourceKind::Role => RoleResource::schema(),
        ResourceKind::RolePermissions => RolePermissionsResource::schema(),
        ResourceKind::Database => DatabaseResource::schema(),
        ResourceKind::MetaDatabase => MetaDatabaseResource::schema(),
        ResourceKind::Dataset => DatasetResource::schema(),
    }
}

fn data_source_schema(kind: DataSourceKind) -> Schema {
    match kind {
        DataSourceKind::Roles => RolesDataSource::schema(),
        DataSourceKind::RolePermissions => RolePermissionsDataSource::schema(),
        DataSourceKind::Databases => DatabasesDataSource::schema(),
        DataSourceKind::Datasets => DatasetsDataSource::schema(),
    }
}

fn provider_block_schema() -> Schema {
    use AttributeType::{Bool, Number, String};

    Schema::new(
        "Interact with Apache Superset.",
        Block::new()
            .attribute(
                "host",
                Attribute::optional(String, "The URL of the Superset instance. May also be set with SUPERSET_HOST."),
            )
            .attribute(
                "username",
                Attribute::optional(String, "Username for Superset API. May also be set with SUPERSET_USERNAME."),
            )
            .attribute(
                "password",
                Attribute::optional(String, "Password for Superset API. May also be set with SUPERSET_PASSWORD.")
                    .sensitive(),
            )
            .attribute("timeout", Attribute::optional(Number, "Per-request timeout in seconds."))
            .attribute("insecure", Attribute::optional(Bool, "Skip TLS certificate verification."))
            .attribute("ca_cert", Attribute::optional(String, "Path to a PEM bundle of extra trusted CAs."))
            .attribute(
                "cache_ttl",
                Attribute::optional(Number, "Lifetime of the database listing cache in seconds."),
            ),
    )
}
