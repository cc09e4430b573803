// superset_role_permissions
//
// The permission set of one role. Create and update resolve every
// permission/view-menu pair, dedupe by id, and replace the whole set in one
// call; delete empties the set and leaves the role alone.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use superset_api::SupersetClient;
use superset_api::models::{PermissionKey, RolePermission};

use crate::diagnostics::Diagnostics;
use crate::error::Summarize;
use crate::resource::{ReadOutcome, Resource, ResourceKind, parse_id, timestamp};
use crate::schema::{Attribute, AttributeType, Block, Schema, object_list};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermission {
    #[serde(default)]
    pub id: Option<i64>,
    pub permission: String,
    pub view_menu: String,
}

impl ResourcePermission {
    fn key(&self) -> PermissionKey {
        PermissionKey::new(self.permission.clone(), self.view_menu.clone())
    }
}

impl From<RolePermission> for ResourcePermission {
    fn from(p: RolePermission) -> Self {
        Self {
            id: Some(p.id),
            permission: p.permission_name,
            view_menu: p.view_menu_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionsState {
    /// The role id, as a string.
    #[serde(default)]
    pub id: Option<String>,
    pub role_name: String,
    #[serde(default)]
    pub resource_permissions: Vec<ResourcePermission>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

pub struct RolePermissionsResource {
    client: Arc<SupersetClient>,
}

impl RolePermissionsResource {
    pub fn new(client: Arc<SupersetClient>) -> Self {
        Self { client }
    }

    /// Resolve, dedupe, and bulk-replace. Shared by create and update.
    async fn apply(&self, plan: RolePermissionsState) -> Result<RolePermissionsState, Diagnostics> {
        let role_id = self
            .client
            .role_id_by_name(&plan.role_name)
            .await
            .summarize("Error finding role")?;

        let keys: Vec<PermissionKey> = plan
            .resource_permissions
            .iter()
            .map(ResourcePermission::key)
            .collect();
        let ids = self
            .client
            .permission_ids(&keys)
            .await
            .summarize("Error finding permission ID")?;

        let resolved = dedupe_by_id(plan.resource_permissions, &ids);
        let unique_ids: Vec<i64> = resolved.keys().copied().collect();
        debug!(
            role_id,
            requested = ids.len(),
            unique = unique_ids.len(),
            "replacing role permissions"
        );

        self.client
            .replace_role_permissions(role_id, &unique_ids)
            .await
            .summarize("Error updating role permissions")?;

        Ok(RolePermissionsState {
            id: Some(role_id.to_string()),
            role_name: plan.role_name,
            resource_permissions: resolved.into_values().collect(),
            last_updated: Some(timestamp()),
        })
    }
}

/// Pair each planned permission with its resolved id, keeping the first
/// occurrence of every id in plan order.
fn dedupe_by_id(
    permissions: Vec<ResourcePermission>,
    ids: &[i64],
) -> IndexMap<i64, ResourcePermission> {
    let mut resolved = IndexMap::with_capacity(ids.len());
    for (mut permission, &id) in permissions.into_iter().zip(ids) {
        permission.id = Some(id);
        resolved.entry(id).or_insert(permission);
    }
    resolved
}

impl Resource for RolePermissionsResource {
    type State = RolePermissionsState;

    const KIND: ResourceKind = ResourceKind::RolePermissions;

    fn schema() -> Schema {
        let permission = Block::new()
            .attribute(
                "id",
                Attribute::computed(
                    AttributeType::Number,
                    "The unique identifier of the permission.",
                ),
            )
            .attribute(
                "permission",
                Attribute::required(AttributeType::String, "The name of the permission."),
            )
            .attribute(
                "view_menu",
                Attribute::required(
                    AttributeType::String,
                    "The name of the view menu associated with the permission.",
                ),
            );

        Schema::new(
            "Manages the permissions associated with a role in Superset.",
            Block::new()
                .attribute(
                    "id",
                    Attribute::computed(
                        AttributeType::String,
                        "The unique identifier for the role permissions resource.",
                    ),
                )
                .attribute(
                    "last_updated",
                    Attribute::computed(
                        AttributeType::String,
                        "The timestamp of the last update to the role permissions.",
                    ),
                )
                .attribute(
                    "role_name",
                    Attribute::required(
                        AttributeType::String,
                        "The name of the role to which the permissions are assigned.",
                    ),
                )
                .attribute(
                    "resource_permissions",
                    Attribute::required(
                        object_list(permission),
                        "A list of permissions associated with the role.",
                    ),
                ),
        )
    }

    async fn create(&self, plan: RolePermissionsState) -> Result<RolePermissionsState, Diagnostics> {
        self.apply(plan).await
    }

    async fn read(
        &self,
        state: RolePermissionsState,
    ) -> Result<ReadOutcome<RolePermissionsState>, Diagnostics> {
        let role_id = match self.client.role_id_by_name(&state.role_name).await {
            Ok(id) => id,
            Err(e) if e.is_not_found() => {
                warn!(role = %state.role_name, "role no longer exists, removing permissions from state");
                return Ok(ReadOutcome::Gone);
            }
            Err(e) => return Err(e).summarize("Error finding role"),
        };

        let permissions = self
            .client
            .role_permissions(role_id)
            .await
            .summarize("Error reading role permissions")?;
        debug!(role_id, count = permissions.len(), "read role permissions");

        Ok(ReadOutcome::Found(RolePermissionsState {
            id: Some(role_id.to_string()),
            role_name: state.role_name,
            resource_permissions: permissions.into_iter().map(Into::into).collect(),
            last_updated: state.last_updated,
        }))
    }

    async fn update(
        &self,
        _prior: RolePermissionsState,
        plan: RolePermissionsState,
    ) -> Result<RolePermissionsState, Diagnostics> {
        self.apply(plan).await
    }

    async fn delete(&self, state: RolePermissionsState) -> Result<(), Diagnostics> {
        let role_id = match self.client.role_id_by_name(&state.role_name).await {
            Ok(id) => id,
            Err(e) if e.is_not_found() => {
                debug!(role = %state.role_name, "role already absent, nothing to clear");
                return Ok(());
            }
            Err(e) => return Err(e).summarize("Error finding role"),
        };

        match self.client.clear_role_permissions(role_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e).summarize("Error clearing role permissions"),
        }
    }

    async fn import(&self, id: &str) -> Result<RolePermissionsState, Diagnostics> {
        let role_id = parse_id(id).summarize("Error parsing role ID")?;
        let role = self
            .client
            .get_role(role_id)
            .await
            .summarize("Error fetching role")?;
        let permissions = self
            .client
            .role_permissions(role_id)
            .await
            .summarize("Error reading role permissions")?;

        Ok(RolePermissionsState {
            id: Some(role_id.to_string()),
            role_name: role.name,
            resource_permissions: permissions.into_iter().map(Into::into).collect(),
            last_updated: None,
        })
    }
}
