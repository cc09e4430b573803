// Role permission endpoints
//
// A role's permissions are a set of permission/view-menu pair ids. Superset
// only offers a bulk replace, so clearing is a replace with no ids.

use tracing::debug;

use crate::client::SupersetClient;
use crate::error::Error;
use crate::models::{ListResponse, PermissionReplaceRequest, PermissionResource, RolePermission};

impl SupersetClient {
    /// List the full permission/view-menu catalogue.
    ///
    /// `GET /api/v1/security/permissions-resources/?q=(page_size:5000)`
    pub async fn list_permission_resources(&self) -> Result<Vec<PermissionResource>, Error> {
        let url = self.listing_url("security/permissions-resources/")?;
        debug!("listing permission resources");
        let resp: ListResponse<PermissionResource> = self.get(url).await?;
        Ok(resp.result)
    }

    /// Permissions currently attached to a role.
    ///
    /// `GET /api/v1/security/roles/{id}/permissions/`
    pub async fn role_permissions(&self, role_id: i64) -> Result<Vec<RolePermission>, Error> {
        let url = self.api_url(&format!("security/roles/{role_id}/permissions/"))?;
        debug!(role_id, "fetching role permissions");
        let resp: ListResponse<RolePermission> = self.get(url).await?;
        Ok(resp.result)
    }

    /// Replace every permission on a role with `permission_ids`.
    ///
    /// `POST /api/v1/security/roles/{id}/permissions` with
    /// `{"permission_view_menu_ids": [...]}`
    pub async fn replace_role_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("security/roles/{role_id}/permissions"))?;
        debug!(role_id, count = permission_ids.len(), "replacing role permissions");
        let body = PermissionReplaceRequest {
            permission_view_menu_ids: permission_ids,
        };
        self.post_unit(url, &body, None).await
    }

    /// Detach every permission from a role, leaving the role in place.
    pub async fn clear_role_permissions(&self, role_id: i64) -> Result<(), Error> {
        self.replace_role_permissions(role_id, &[]).await
    }
}
