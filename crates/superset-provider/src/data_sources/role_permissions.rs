// superset_role_permissions (data source)

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use superset_api::SupersetClient;

use crate::diagnostics::Diagnostics;
use crate::error::Summarize;
use crate::resource::{DataSource, DataSourceKind};
use crate::schema::{Attribute, AttributeType, Block, Schema, object_list};

#[derive(Debug, Clone, Deserialize)]
pub struct RolePermissionsConfig {
    pub role_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionEntry {
    pub id: i64,
    pub permission_name: String,
    pub view_menu_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePermissionsList {
    pub role_name: String,
    pub permissions: Vec<PermissionEntry>,
}

pub struct RolePermissionsDataSource {
    client: Arc<SupersetClient>,
}

impl RolePermissionsDataSource {
    pub fn new(client: Arc<SupersetClient>) -> Self {
        Self { client }
    }
}

impl DataSource for RolePermissionsDataSource {
    type Config = RolePermissionsConfig;
    type State = RolePermissionsList;

    const KIND: DataSourceKind = DataSourceKind::RolePermissions;

    fn schema() -> Schema {
        use AttributeType::{Number, String};

        let permission = Block::new()
            .attribute("id", Attribute::computed(Number, "Numeric identifier of the permission."))
            .attribute("permission_name", Attribute::computed(String, "Name of the permission."))
            .attribute(
                "view_menu_name",
                Attribute::computed(String, "Name of the view menu associated with the permission."),
            );

        Schema::new(
            "Fetches the permissions for a role from Superset.",
            Block::new()
                .attribute("role_name", Attribute::required(String, "Name of the role."))
                .attribute(
                    "permissions",
                    Attribute::computed(object_list(permission), "List of permissions."),
                ),
        )
    }

    async fn read(&self, config: RolePermissionsConfig) -> Result<RolePermissionsList, Diagnostics> {
        let role_id = self
            .client
            .role_id_by_name(&config.role_name)
            .await
            .summarize("Unable to Find Role")?;

        let permissions = self
            .client
            .role_permissions(role_id)
            .await
            .summarize("Unable to Read Superset Role Permissions")?;
        debug!(role_id, count = permissions.len(), "read role permissions");

        Ok(RolePermissionsList {
            role_name: config.role_name,
            permissions: permissions
                .into_iter()
                .map(|p| PermissionEntry {
                    id: p.id,
                    permission_name: p.permission_name,
                    view_menu_name: p.view_menu_name,
                })
                .collect(),
        })
    }
}
