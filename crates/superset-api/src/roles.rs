// Security role endpoints

use serde_json::json;
use tracing::debug;

use crate::client::SupersetClient;
use crate::error::Error;
use crate::models::{IdResponse, ItemResponse, ListResponse, Role, RoleBody};

impl SupersetClient {
    /// List every role.
    ///
    /// `GET /api/v1/security/roles/?q=(page_size:5000)`
    pub async fn list_roles(&self) -> Result<Vec<Role>, Error> {
        let url = self.listing_url("security/roles/")?;
        debug!("listing roles");
        let resp: ListResponse<Role> = self.get(url).await?;
        Ok(resp.result)
    }

    /// Fetch a single role.
    ///
    /// `GET /api/v1/security/roles/{id}`. A 404 surfaces as
    /// `Error::Api { status: 404, .. }`.
    pub async fn get_role(&self, id: i64) -> Result<Role, Error> {
        let url = self.api_url(&format!("security/roles/{id}"))?;
        debug!(role_id = id, "fetching role");
        let resp: ItemResponse<RoleBody> = self.get(url).await?;
        Ok(Role {
            id: resp.result.id.or(resp.id).unwrap_or(id),
            name: resp.result.name,
        })
    }

    /// Create a role and return its assigned id.
    ///
    /// `POST /api/v1/security/roles/` with `{"name": "..."}`
    pub async fn create_role(&self, name: &str) -> Result<i64, Error> {
        let url = self.api_url("security/roles/")?;
        debug!(name, "creating role");
        let resp: IdResponse = self.post(url, &json!({ "name": name }), None).await?;
        Ok(resp.id)
    }

    /// Rename a role.
    ///
    /// `PUT /api/v1/security/roles/{id}` with `{"name": "..."}`
    pub async fn update_role(&self, id: i64, name: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("security/roles/{id}"))?;
        debug!(role_id = id, name, "updating role");
        self.put_unit(url, &json!({ "name": name }), None).await
    }

    /// Delete a role.
    ///
    /// `DELETE /api/v1/security/roles/{id}`
    pub async fn delete_role(&self, id: i64) -> Result<(), Error> {
        let url = self.api_url(&format!("security/roles/{id}"))?;
        debug!(role_id = id, "deleting role");
        self.delete(url, None).await
    }
}
