// Resource reconcilers, one per managed Superset object.

mod database;
mod dataset;
mod meta_database;
mod role;
mod role_permissions;

pub use database::{DatabaseResource, DatabaseState};
pub use dataset::{DatasetResource, DatasetState};
pub use meta_database::{MetaDatabaseResource, MetaDatabaseState};
pub use role::{RoleResource, RoleState};
pub use role_permissions::{ResourcePermission, RolePermissionsResource, RolePermissionsState};
