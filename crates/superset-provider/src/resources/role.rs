// superset_role

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use superset_api::SupersetClient;

use crate::diagnostics::Diagnostics;
use crate::error::Summarize;
use crate::resource::{ReadOutcome, Resource, ResourceKind, parse_id, require_id, timestamp};
use crate::schema::{Attribute, AttributeType, Block, Schema};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleState {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub last_updated: Option<String>,
}

pub struct RoleResource {
    client: Arc<SupersetClient>,
}

impl RoleResource {
    pub fn new(client: Arc<SupersetClient>) -> Self {
        Self { client }
    }

    /// Id of an existing role with this name, if any.
    async fn existing_role(&self, name: &str) -> Result<Option<i64>, Diagnostics> {
        match self.client.role_id_by_name(name).await {
            Ok(id) => Ok(Some(id)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e).summarize("Unable to Create Superset Role"),
        }
    }
}

impl Resource for RoleResource {
    type State = RoleState;

    const KIND: ResourceKind = ResourceKind::Role;

    fn schema() -> Schema {
        Schema::new(
            "Manages a role in Superset.",
            Block::new()
                .attribute(
                    "id",
                    Attribute::computed(AttributeType::Number, "Numeric identifier of the role."),
                )
                .attribute(
                    "name",
                    Attribute::required(AttributeType::String, "Name of the role."),
                )
                .attribute(
                    "last_updated",
                    Attribute::computed(AttributeType::String, "Timestamp of the last update."),
                ),
        )
    }

    async fn create(&self, plan: RoleState) -> Result<RoleState, Diagnostics> {
        let id = match self.existing_role(&plan.name).await? {
            Some(id) => {
                info!(name = %plan.name, role_id = id, "adopting existing role");
                id
            }
            None => self
                .client
                .create_role(&plan.name)
                .await
                .summarize("Unable to Create Superset Role")?,
        };

        debug!(role_id = id, name = %plan.name, "created role");
        Ok(RoleState {
            id: Some(id),
            name: plan.name,
            last_updated: Some(timestamp()),
        })
    }

    async fn read(&self, state: RoleState) -> Result<ReadOutcome<RoleState>, Diagnostics> {
        let id = require_id(state.id, "Error reading role")?;
        let role = match self.client.get_role(id).await {
            Ok(role) => role,
            Err(e) if e.is_not_found() => {
                warn!(role_id = id, "role no longer exists, removing from state");
                return Ok(ReadOutcome::Gone);
            }
            Err(e) => return Err(e).summarize("Error reading role"),
        };

        if role.name.is_empty() {
            warn!(role_id = id, "received empty name for role");
        }

        Ok(ReadOutcome::Found(RoleState {
            id: Some(role.id),
            name: role.name,
            last_updated: state.last_updated,
        }))
    }

    async fn update(&self, prior: RoleState, plan: RoleState) -> Result<RoleState, Diagnostics> {
        let id = require_id(prior.id, "Failed to update role")?;
        if plan.name == prior.name {
            debug!(role_id = id, "role name unchanged, skipping update");
            return Ok(prior);
        }

        self.client
            .update_role(id, &plan.name)
            .await
            .summarize("Failed to update role")?;

        Ok(RoleState {
            id: Some(id),
            name: plan.name,
            last_updated: Some(timestamp()),
        })
    }

    async fn delete(&self, state: RoleState) -> Result<(), Diagnostics> {
        let id = require_id(state.id, "Unable to Delete Superset Role")?;
        match self.client.delete_role(id).await {
            Ok(()) => {
                debug!(role_id = id, "deleted role");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(role_id = id, "role already absent");
                Ok(())
            }
            Err(e) => Err(e).summarize("Unable to Delete Superset Role"),
        }
    }

    async fn import(&self, id: &str) -> Result<RoleState, Diagnostics> {
        let id = parse_id(id).summarize("Invalid Import ID")?;
        let role = self
            .client
            .get_role(id)
            .await
            .summarize("Error reading role")?;
        Ok(RoleState {
            id: Some(role.id),
            name: role.name,
            last_updated: None,
        })
    }
}
