// superset_roles

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use superset_api::SupersetClient;

use super::NoConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Summarize;
use crate::resource::{DataSource, DataSourceKind};
use crate::schema::{Attribute, AttributeType, Block, Schema, object_list};

/// Fixed id; the engine requires one but the listing has no identity.
const LISTING_ID: &str = "placeholder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolesState {
    pub id: String,
    pub roles: Vec<RoleEntry>,
}

pub struct RolesDataSource {
    client: Arc<SupersetClient>,
}

impl RolesDataSource {
    pub fn new(client: Arc<SupersetClient>) -> Self {
        Self { client }
    }
}

impl DataSource for RolesDataSource {
    type Config = NoConfig;
    type State = RolesState;

    const KIND: DataSourceKind = DataSourceKind::Roles;

    fn schema() -> Schema {
        let role = Block::new()
            .attribute(
                "id",
                Attribute::computed(AttributeType::Number, "Numeric identifier of the role."),
            )
            .attribute(
                "name",
                Attribute::computed(AttributeType::String, "Name of the role."),
            );

        Schema::new(
            "Fetches the list of roles from Superset.",
            Block::new()
                .attribute(
                    "id",
                    Attribute::computed(AttributeType::String, "ID of the data source."),
                )
                .attribute("roles", Attribute::computed(object_list(role), "List of roles.")),
        )
    }

    async fn read(&self, _config: NoConfig) -> Result<RolesState, Diagnostics> {
        let roles = self
            .client
            .list_roles()
            .await
            .summarize("Unable to Read Superset Roles")?;
        debug!(count = roles.len(), "read roles");

        Ok(RolesState {
            id: LISTING_ID.to_owned(),
            roles: roles
                .into_iter()
                .map(|r| RoleEntry {
                    id: r.id,
                    name: r.name,
                })
                .collect(),
        })
    }
}
