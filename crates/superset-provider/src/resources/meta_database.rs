// superset_meta_database
//
// A `superset://` connection that federates queries over other databases.
// The allowed database names live inside the stringified `extra` document;
// the API crate handles encoding it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use superset_api::SupersetClient;
use superset_api::models::{META_DATABASE_URI, MetaDatabase, MetaDatabaseSpec};

use crate::diagnostics::Diagnostics;
use crate::error::Summarize;
use crate::resource::{ReadOutcome, Resource, ResourceKind, parse_id, require_id};
use crate::schema::{Attribute, AttributeType, Block, Schema, string_list};

fn default_uri() -> String {
    META_DATABASE_URI.to_owned()
}

const fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct MetaDatabaseState {
    #[serde(default)]
    pub id: Option<i64>,
    pub database_name: String,
    #[serde(default = "default_uri")]
    pub sqlalchemy_uri: String,
    #[serde(default)]
    pub allowed_databases: Vec<String>,
    #[serde(default = "yes")]
    pub expose_in_sqllab: bool,
    #[serde(default)]
    pub allow_ctas: bool,
    #[serde(default)]
    pub allow_cvas: bool,
    #[serde(default)]
    pub allow_dml: bool,
    #[serde(default = "yes")]
    pub allow_run_async: bool,
    #[serde(default)]
    pub is_managed_externally: bool,
}

impl Default for MetaDatabaseState {
    fn default() -> Self {
        Self {
            id: None,
            database_name: String::new(),
            sqlalchemy_uri: default_uri(),
            allowed_databases: Vec::new(),
            expose_in_sqllab: true,
            allow_ctas: false,
            allow_cvas: false,
            allow_dml: false,
            allow_run_async: true,
            is_managed_externally: false,
        }
    }
}

impl MetaDatabaseState {
    fn spec(&self) -> MetaDatabaseSpec {
        MetaDatabaseSpec {
            database_name: self.database_name.clone(),
            sqlalchemy_uri: self.sqlalchemy_uri.clone(),
            expose_in_sqllab: self.expose_in_sqllab,
            allow_ctas: self.allow_ctas,
            allow_cvas: self.allow_cvas,
            allow_dml: self.allow_dml,
            allow_run_async: self.allow_run_async,
            is_managed_externally: self.is_managed_externally,
            allowed_databases: self.allowed_databases.clone(),
        }
    }

    /// Name and flags follow Superset. An empty URI or allowed list from the
    /// API keeps what was tracked, since some releases omit both.
    fn merge_remote(self, remote: MetaDatabase) -> Self {
        let sqlalchemy_uri = if remote.sqlalchemy_uri.is_empty() {
            self.sqlalchemy_uri
        } else {
            remote.sqlalchemy_uri
        };
        let allowed_databases = match remote.allowed_databases {
            Some(allowed) if !allowed.is_empty() => allowed,
            _ => self.allowed_databases,
        };

        Self {
            id: Some(remote.id),
            database_name: remote.database_name,
            sqlalchemy_uri,
            allowed_databases,
            expose_in_sqllab: remote.expose_in_sqllab,
            allow_ctas: remote.allow_ctas,
            allow_cvas: remote.allow_cvas,
            allow_dml: remote.allow_dml,
            allow_run_async: remote.allow_run_async,
            is_managed_externally: remote.is_managed_externally,
        }
    }
}

pub struct MetaDatabaseResource {
    client: Arc<SupersetClient>,
}

impl MetaDatabaseResource {
    pub fn new(client: Arc<SupersetClient>) -> Self {
        Self { client }
    }
}

impl Resource for MetaDatabaseResource {
    type State = MetaDatabaseState;

    const KIND: ResourceKind = ResourceKind::MetaDatabase;

    fn schema() -> Schema {
        use AttributeType::{Bool, Number, String};

        let flag = |description: &'static str, default: bool| {
            Attribute::optional_computed(Bool, description).with_default(default)
        };

        Schema::new(
            "Manages a meta database connection in Superset for cross-database queries.",
            Block::new()
                .attribute(
                    "id",
                    Attribute::computed(Number, "Numeric identifier of the meta database connection."),
                )
                .attribute(
                    "database_name",
                    Attribute::required(String, "Name of the meta database connection."),
                )
                .attribute(
                    "sqlalchemy_uri",
                    Attribute::optional_computed(
                        String,
                        "SQLAlchemy URI for the meta database connection. Defaults to 'superset://' for meta databases.",
                    )
                    .with_default(META_DATABASE_URI),
                )
                .attribute(
                    "allowed_databases",
                    Attribute::required(
                        string_list(),
                        "List of database names that can be accessed through this meta connection.",
                    ),
                )
                .attribute("expose_in_sqllab", flag("Whether to expose this connection in SQL Lab.", true))
                .attribute("allow_ctas", flag("Allow CREATE TABLE AS queries.", false))
                .attribute("allow_cvas", flag("Allow CREATE VIEW AS queries.", false))
                .attribute("allow_dml", flag("Allow DML queries (INSERT, UPDATE, DELETE).", false))
                .attribute("allow_run_async", flag("Allow asynchronous query execution.", true))
                .attribute(
                    "is_managed_externally",
                    flag("Whether this connection is managed externally.", false),
                ),
        )
    }

    async fn create(&self, plan: MetaDatabaseState) -> Result<MetaDatabaseState, Diagnostics> {
        let existing = self
            .client
            .find_meta_database(&plan.database_name)
            .await
            .summarize("Unable to Search for Existing Meta Database")?;

        let spec = plan.spec();
        let id = if let Some(existing) = existing {
            info!(
                name = %plan.database_name,
                database_id = existing.id,
                "meta database already exists, adopting it"
            );
            self.client
                .update_meta_database(existing.id, &spec)
                .await
                .summarize("Unable to Update Superset Meta Database")?;
            existing.id
        } else {
            self.client
                .create_meta_database(&spec)
                .await
                .summarize("Unable to Create Superset Meta Database")?
        };

        debug!(database_id = id, name = %plan.database_name, "meta database in place");
        Ok(MetaDatabaseState {
            id: Some(id),
            ..plan
        })
    }

    async fn read(
        &self,
        state: MetaDatabaseState,
    ) -> Result<ReadOutcome<MetaDatabaseState>, Diagnostics> {
        let id = require_id(state.id, "Unable to Read Meta Database")?;

        let remote = match self.client.get_meta_database(id).await {
            Ok(remote) => Some(remote),
            Err(e) if e.is_not_found() => {
                debug!(database_id = id, name = %state.database_name, "id gone, searching by name");
                // A cached listing may still carry the id that just 404'd.
                self.client.database_cache().invalidate().await;
                match self.client.find_meta_database(&state.database_name).await {
                    Ok(found) => found,
                    Err(e) if e.is_not_found() => None,
                    Err(e) => return Err(e).summarize("Unable to Read Meta Database"),
                }
            }
            Err(e) => return Err(e).summarize("Unable to Read Meta Database"),
        };

        match remote {
            Some(remote) => Ok(ReadOutcome::Found(state.merge_remote(remote))),
            None => {
                warn!(
                    database_id = id,
                    name = %state.database_name,
                    "meta database no longer exists, removing from state"
                );
                Ok(ReadOutcome::Gone)
            }
        }
    }

    async fn update(
        &self,
        prior: MetaDatabaseState,
        plan: MetaDatabaseState,
    ) -> Result<MetaDatabaseState, Diagnostics> {
        let id = require_id(prior.id, "Unable to Update Superset Meta Database")?;
        self.client
            .update_meta_database(id, &plan.spec())
            .await
            .summarize("Unable to Update Superset Meta Database")?;

        Ok(MetaDatabaseState {
            id: Some(id),
            ..plan
        })
    }

    async fn delete(&self, state: MetaDatabaseState) -> Result<(), Diagnostics> {
        let id = require_id(state.id, "Unable to Delete Superset Meta Database")?;
        match self.client.delete_meta_database(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(database_id = id, "meta database already absent");
                Ok(())
            }
            Err(e) => Err(e).summarize("Unable to Delete Superset Meta Database"),
        }
    }

    async fn import(&self, id: &str) -> Result<MetaDatabaseState, Diagnostics> {
        let id = parse_id(id).summarize("Unable to Parse Import ID")?;
        let remote = self
            .client
            .get_meta_database(id)
            .await
            .summarize("Meta Database Not Found During Import")?;
        Ok(MetaDatabaseState::default().merge_remote(remote))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn remote(allowed: Option<Vec<String>>) -> MetaDatabase {
        MetaDatabase {
            id: 9,
            database_name: "federated".into(),
            sqlalchemy_uri: String::new(),
            expose_in_sqllab: false,
            allow_ctas: false,
            allow_cvas: false,
            allow_dml: true,
            allow_run_async: true,
            is_managed_externally: false,
            allowed_databases: allowed,
        }
    }

    #[test]
    fn missing_fields_take_meta_defaults() {
        let state: MetaDatabaseState = serde_json::from_value(serde_json::json!({
            "database_name": "federated",
            "allowed_databases": ["a"]
        }))
        .unwrap();

        assert_eq!(state.sqlalchemy_uri, "superset://");
        assert!(state.expose_in_sqllab);
        assert!(state.allow_run_async);
        assert!(!state.allow_dml);
    }

    #[test]
    fn merge_keeps_tracked_uri_and_allowed_list_when_remote_is_empty() {
        let tracked = MetaDatabaseState {
            id: Some(9),
            database_name: "federated".into(),
            allowed_databases: vec!["sales".into(), "ops".into()],
            ..MetaDatabaseState::default()
        };

        let merged = tracked.clone().merge_remote(remote(None));
        assert_eq!(merged.sqlalchemy_uri, "superset://");
        assert_eq!(merged.allowed_databases, tracked.allowed_databases);
        assert!(!merged.expose_in_sqllab);
        assert!(merged.allow_dml);

        let merged = tracked.merge_remote(remote(Some(vec!["hr".into()])));
        assert_eq!(merged.allowed_databases, vec!["hr".to_owned()]);
    }
}
