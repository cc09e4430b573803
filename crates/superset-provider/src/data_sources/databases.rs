// superset_databases

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use superset_api::models::DatabaseInfo;
use superset_api::{DATABASE_INFOS_LIMIT, SupersetClient};

use super::NoConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Summarize;
use crate::resource::{DataSource, DataSourceKind};
use crate::schema::{Attribute, AttributeType, Block, Schema, object_list, string_list};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabasesState {
    pub databases: Vec<DatabaseInfo>,
}

pub struct DatabasesDataSource {
    client: Arc<SupersetClient>,
}

impl DatabasesDataSource {
    pub fn new(client: Arc<SupersetClient>) -> Self {
        Self { client }
    }
}

impl DataSource for DatabasesDataSource {
    type Config = NoConfig;
    type State = DatabasesState;

    const KIND: DataSourceKind = DataSourceKind::Databases;

    fn schema() -> Schema {
        use AttributeType::{Number, String};

        let database = Block::new()
            .attribute("id", Attribute::computed(Number, "Numeric identifier of the database."))
            .attribute("database_name", Attribute::computed(String, "Name of the database."))
            .attribute("schemas", Attribute::computed(string_list(), "List of schemas in the database."))
            .attribute("sqlalchemy_uri", Attribute::computed(String, "SQLAlchemy URI of the database."));

        Schema::new(
            "Fetches the list of databases and their schemas from Superset.",
            Block::new().attribute(
                "databases",
                Attribute::computed(object_list(database), "List of databases."),
            ),
        )
    }

    async fn read(&self, _config: NoConfig) -> Result<DatabasesState, Diagnostics> {
        let databases = self
            .client
            .database_infos(DATABASE_INFOS_LIMIT)
            .await
            .summarize("Unable to Read Superset Databases")?;
        debug!(count = databases.len(), "read database infos");
        Ok(DatabasesState { databases })
    }
}
