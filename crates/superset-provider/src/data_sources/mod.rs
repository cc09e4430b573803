// Read-only data sources.

mod databases;
mod datasets;
mod role_permissions;
mod roles;

pub use databases::{DatabasesDataSource, DatabasesState};
pub use datasets::{DatasetOwnerState, DatasetSummary, DatasetsDataSource, DatasetsState};
pub use role_permissions::{
    PermissionEntry, RolePermissionsConfig, RolePermissionsDataSource, RolePermissionsList,
};
pub use roles::{RoleEntry, RolesDataSource, RolesState};

use serde::Deserialize;

/// Configuration of a data source that takes no arguments.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NoConfig {}
