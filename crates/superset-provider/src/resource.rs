// Resource and data source contracts
//
// Each managed Superset object implements `Resource`: typed state in, typed
// state or diagnostics out. The provider handles JSON conversion and
// dispatch by type name; reconcilers never see untyped values.

use std::future::Future;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ProviderError;
use crate::schema::Schema;

/// Every resource type name this provider registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
pub enum ResourceKind {
    #[strum(serialize = "superset_role")]
    Role,
    #[strum(serialize = "superset_role_permissions")]
    RolePermissions,
    #[strum(serialize = "superset_database")]
    Database,
    #[strum(serialize = "superset_meta_database")]
    MetaDatabase,
    #[strum(serialize = "superset_dataset")]
    Dataset,
}

/// Every data source type name this provider registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
pub enum DataSourceKind {
    #[strum(serialize = "superset_roles")]
    Roles,
    #[strum(serialize = "superset_role_permissions")]
    RolePermissions,
    #[strum(serialize = "superset_databases")]
    Databases,
    #[strum(serialize = "superset_datasets")]
    Datasets,
}

/// Result of reading a tracked object back from Superset.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<S> {
    Found(S),
    /// Deleted out of band; the engine should drop it from state.
    Gone,
}

/// The five-verb lifecycle of a managed object.
///
/// Implementations must be safe to call concurrently from several engine
/// workers; the only shared mutable state underneath is the database
/// listing cache.
pub trait Resource: Send + Sync {
    type State: Serialize + DeserializeOwned + Send;

    const KIND: ResourceKind;

    fn schema() -> Schema;

    fn create(
        &self,
        plan: Self::State,
    ) -> impl Future<Output = Result<Self::State, Diagnostics>> + Send;

    /// `Gone` when the object no longer exists remotely.
    fn read(
        &self,
        state: Self::State,
    ) -> impl Future<Output = Result<ReadOutcome<Self::State>, Diagnostics>> + Send;

    fn update(
        &self,
        prior: Self::State,
        plan: Self::State,
    ) -> impl Future<Output = Result<Self::State, Diagnostics>> + Send;

    /// Succeeds when the object is already absent.
    fn delete(&self, state: Self::State) -> impl Future<Output = Result<(), Diagnostics>> + Send;

    /// Build full state from an opaque id.
    fn import(&self, id: &str) -> impl Future<Output = Result<Self::State, Diagnostics>> + Send;
}

/// A read-only query.
pub trait DataSource: Send + Sync {
    type Config: DeserializeOwned + Send;
    type State: Serialize + Send;

    const KIND: DataSourceKind;

    fn schema() -> Schema;

    fn read(
        &self,
        config: Self::Config,
    ) -> impl Future<Output = Result<Self::State, Diagnostics>> + Send;
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Parse an import or state id into Superset's numeric id.
pub(crate) fn parse_id(id: &str) -> Result<i64, ProviderError> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| ProviderError::InvalidImportId { id: id.to_owned() })
}

/// Numeric id from a tracked state, or a diagnostic when it is missing.
pub(crate) fn require_id(id: Option<i64>, summary: &str) -> Result<i64, Diagnostics> {
    id.ok_or_else(|| {
        Diagnostics::from(Diagnostic::error(
            summary,
            "The tracked state carries no id; the object was never created or the state is corrupt.",
        ))
    })
}

/// RFC 3339 timestamp recorded after each successful mutation.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Keep `prior` unless `remote` carries a non-empty value.
pub(crate) fn prefer_remote(remote: Option<String>, prior: Option<String>) -> Option<String> {
    match remote {
        Some(value) if !value.is_empty() => Some(value),
        _ => prior,
    }
}
