// superset_dataset
//
// The database a dataset points at is fixed at creation: `database_name`
// forces replacement, and updates never send a database reference.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use superset_api::SupersetClient;
use superset_api::models::{CreateDatasetRequest, Dataset, DatasetDatabaseRef, UpdateDatasetRequest};

use crate::diagnostics::Diagnostics;
use crate::error::Summarize;
use crate::resource::{ReadOutcome, Resource, ResourceKind, parse_id, prefer_remote, require_id};
use crate::schema::{Attribute, AttributeType, Block, Schema};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetState {
    #[serde(default)]
    pub id: Option<i64>,
    pub table_name: String,
    pub database_name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
}

/// Treat empty strings from the plan as "not set".
fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

pub struct DatasetResource {
    client: Arc<SupersetClient>,
}

impl DatasetResource {
    pub fn new(client: Arc<SupersetClient>) -> Self {
        Self { client }
    }

    /// Name of the database a dataset references. The embedded name is used
    /// when present, otherwise it is looked up through the listing.
    async fn database_name(
        &self,
        database: &DatasetDatabaseRef,
    ) -> Result<String, superset_api::Error> {
        match database.database_name.as_deref() {
            Some(name) if !name.is_empty() => Ok(name.to_owned()),
            _ => self.client.database_name_by_id(database.id).await,
        }
    }

    /// Name of the database `remote` points at, or `None` when it carries
    /// no database reference.
    async fn remote_database_name(
        &self,
        remote: &Dataset,
    ) -> Result<Option<String>, superset_api::Error> {
        match &remote.database {
            Some(database) => self.database_name(database).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Overlay a fetched dataset on tracked state. `database_name` is the
/// already-resolved name; `None` keeps the tracked value.
fn merge_remote(
    mut state: DatasetState,
    remote: Dataset,
    database_name: Option<String>,
) -> DatasetState {
    state.id = remote.id.or(state.id);
    state.table_name = remote.table_name;
    state.schema = prefer_remote(remote.schema, state.schema);
    state.sql = prefer_remote(remote.sql, state.sql);
    if let Some(name) = database_name {
        state.database_name = name;
    }
    state
}

impl Resource for DatasetResource {
    type State = DatasetState;

    const KIND: ResourceKind = ResourceKind::Dataset;

    fn schema() -> Schema {
        use AttributeType::{Number, String};

        Schema::new(
            "Manages a dataset in Superset.",
            Block::new()
                .attribute("id", Attribute::computed(Number, "Numeric identifier of the dataset."))
                .attribute("table_name", Attribute::required(String, "Name of the table or dataset."))
                .attribute(
                    "database_name",
                    Attribute::required(
                        String,
                        "Name of the database where the dataset resides. Cannot be changed after creation.",
                    )
                    .requires_replace(),
                )
                .attribute("schema", Attribute::optional(String, "Database schema name (optional)."))
                .attribute(
                    "sql",
                    Attribute::optional(String, "SQL query for the dataset (optional, for SQL-based datasets)."),
                ),
        )
    }

    async fn create(&self, plan: DatasetState) -> Result<DatasetState, Diagnostics> {
        debug!(table_name = %plan.table_name, database_name = %plan.database_name, "creating dataset");
        let database = self
            .client
            .database_id_by_name(&plan.database_name)
            .await
            .summarize("Error finding database")?;

        let request = CreateDatasetRequest {
            table_name: plan.table_name.clone(),
            database,
            schema: non_empty(plan.schema.as_deref()),
            sql: non_empty(plan.sql.as_deref()),
        };
        let id = self
            .client
            .create_dataset(&request)
            .await
            .summarize("Error creating dataset")?;

        debug!(dataset_id = id, "created dataset");
        Ok(DatasetState {
            id: Some(id),
            ..plan
        })
    }

    async fn read(&self, state: DatasetState) -> Result<ReadOutcome<DatasetState>, Diagnostics> {
        let id = require_id(state.id, "Error reading dataset")?;
        match self.client.get_dataset(id).await {
            Ok(remote) => {
                let database_name = match self.remote_database_name(&remote).await {
                    Ok(name) => name,
                    Err(e) => {
                        warn!(
                            dataset_id = id,
                            error = %e,
                            "could not resolve dataset database name, keeping tracked value"
                        );
                        None
                    }
                };
                Ok(ReadOutcome::Found(merge_remote(state, remote, database_name)))
            }
            Err(e) if e.is_not_found() => {
                warn!(dataset_id = id, "dataset no longer exists, removing from state");
                Ok(ReadOutcome::Gone)
            }
            Err(e) => Err(e).summarize("Error reading dataset"),
        }
    }

    async fn update(
        &self,
        prior: DatasetState,
        plan: DatasetState,
    ) -> Result<DatasetState, Diagnostics> {
        let id = require_id(prior.id, "Error updating dataset")?;
        let request = UpdateDatasetRequest {
            table_name: plan.table_name.clone(),
            schema: non_empty(plan.schema.as_deref()),
            sql: non_empty(plan.sql.as_deref()),
        };
        self.client
            .update_dataset(id, &request)
            .await
            .summarize("Error updating dataset")?;

        debug!(dataset_id = id, "updated dataset");
        Ok(DatasetState {
            id: Some(id),
            ..plan
        })
    }

    async fn delete(&self, state: DatasetState) -> Result<(), Diagnostics> {
        let id = require_id(state.id, "Error deleting dataset")?;
        match self.client.delete_dataset(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(dataset_id = id, "dataset already absent");
                Ok(())
            }
            Err(e) => Err(e).summarize("Error deleting dataset"),
        }
    }

    async fn import(&self, id: &str) -> Result<DatasetState, Diagnostics> {
        let id = parse_id(id).summarize("Error importing dataset")?;
        let remote = self
            .client
            .get_dataset(id)
            .await
            .summarize("Error importing dataset")?;
        let database_name = self
            .remote_database_name(&remote)
            .await
            .summarize("Error importing dataset")?;

        let state = DatasetState {
            id: Some(id),
            ..DatasetState::default()
        };
        Ok(merge_remote(state, remote, database_name))
    }
}
