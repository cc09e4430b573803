// superset_datasets

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use superset_api::SupersetClient;
use superset_api::models::Dataset;

use super::NoConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Summarize;
use crate::resource::{DataSource, DataSourceKind};
use crate::schema::{Attribute, AttributeType, Block, Schema, object_list};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetOwnerState {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub id: i64,
    pub table_name: String,
    pub database_id: i64,
    pub database_name: String,
    pub schema: String,
    pub sql: String,
    pub kind: String,
    pub owners: Vec<DatasetOwnerState>,
}

impl TryFrom<Dataset> for DatasetSummary {
    type Error = Diagnostic;

    fn try_from(ds: Dataset) -> Result<Self, Self::Error> {
        let invalid = |field: &str| {
            Diagnostic::error(
                "Invalid Response",
                format!("Missing or invalid '{field}' field in the API response"),
            )
        };

        let id = ds.id.ok_or_else(|| invalid("id"))?;
        let database = ds.database.ok_or_else(|| invalid("database"))?;

        Ok(Self {
            id,
            table_name: ds.table_name,
            database_id: database.id,
            database_name: database.database_name.unwrap_or_default(),
            schema: ds.schema.unwrap_or_default(),
            sql: ds.sql.unwrap_or_default(),
            kind: ds.kind.unwrap_or_default(),
            owners: ds
                .owners
                .into_iter()
                .map(|o| DatasetOwnerState {
                    id: o.id,
                    first_name: o.first_name.unwrap_or_default(),
                    last_name: o.last_name.unwrap_or_default(),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetsState {
    pub datasets: Vec<DatasetSummary>,
}

pub struct DatasetsDataSource {
    client: Arc<SupersetClient>,
}

impl DatasetsDataSource {
    pub fn new(client: Arc<SupersetClient>) -> Self {
        Self { client }
    }
}

impl DataSource for DatasetsDataSource {
    type Config = NoConfig;
    type State = DatasetsState;

    const KIND: DataSourceKind = DataSourceKind::Datasets;

    fn schema() -> Schema {
        use AttributeType::{Number, String};

        let owner = Block::new()
            .attribute("id", Attribute::computed(Number, "Owner ID."))
            .attribute("first_name", Attribute::computed(String, "First name of the owner."))
            .attribute("last_name", Attribute::computed(String, "Last name of the owner."));

        let dataset = Block::new()
            .attribute("id", Attribute::computed(Number, "Dataset ID."))
            .attribute("table_name", Attribute::computed(String, "Name of the table."))
            .attribute("database_id", Attribute::computed(Number, "Database ID to which the dataset belongs."))
            .attribute(
                "database_name",
                Attribute::computed(String, "Database name to which the dataset belongs."),
            )
            .attribute("schema", Attribute::computed(String, "Schema of the dataset."))
            .attribute("sql", Attribute::computed(String, "SQL query of the dataset."))
            .attribute("kind", Attribute::computed(String, "Kind of the dataset."))
            .attribute("owners", Attribute::computed(object_list(owner), "List of owners of the dataset."));

        Schema::new(
            "Fetches all datasets from Superset.",
            Block::new().attribute(
                "datasets",
                Attribute::computed(object_list(dataset), "List of Superset datasets."),
            ),
        )
    }

    async fn read(&self, _config: NoConfig) -> Result<DatasetsState, Diagnostics> {
        let datasets = self
            .client
            .list_datasets()
            .await
            .summarize("Unable to Read Superset Datasets")?;
        debug!(count = datasets.len(), "read datasets");

        let datasets = datasets
            .into_iter()
            .map(DatasetSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DatasetsState { datasets })
    }
}
