// Identity resolution
//
// Maps human-readable keys (role name, permission/view-menu pair, database
// name) to Superset's numeric ids by scanning a full listing for exact
// matches. No match is `Error::NotFound`; more than one is
// `Error::AmbiguousName` so a duplicate name never picks an arbitrary id.

use tracing::{debug, info};

use crate::client::SupersetClient;
use crate::error::Error;
use crate::models::{MetaDatabase, PermissionKey, PermissionResource};

/// Return the single item matching `predicate`.
pub fn find_unique<'a, T>(
    items: &'a [T],
    entity: &'static str,
    key: &str,
    predicate: impl Fn(&T) -> bool,
    id_of: impl Fn(&T) -> i64,
) -> Result<&'a T, Error> {
    let mut matches = items.iter().filter(|item| predicate(item));
    let Some(first) = matches.next() else {
        return Err(Error::NotFound {
            entity,
            key: key.to_owned(),
        });
    };

    let rest: Vec<i64> = matches.map(&id_of).collect();
    if rest.is_empty() {
        Ok(first)
    } else {
        let mut ids = Vec::with_capacity(rest.len() + 1);
        ids.push(id_of(first));
        ids.extend(rest);
        Err(Error::AmbiguousName {
            entity,
            key: key.to_owned(),
            ids,
        })
    }
}

fn find_permission<'a>(
    catalogue: &'a [PermissionResource],
    key: &PermissionKey,
) -> Result<&'a PermissionResource, Error> {
    find_unique(
        catalogue,
        "permission",
        &key.to_string(),
        |p| p.permission.name == key.permission && p.view_menu.name == key.view_menu,
        |p| p.id,
    )
}

impl SupersetClient {
    /// Resolve a role name to its id.
    pub async fn role_id_by_name(&self, name: &str) -> Result<i64, Error> {
        let roles = self.list_roles().await?;
        let role = find_unique(&roles, "role", name, |r| r.name == name, |r| r.id)?;
        debug!(name, role_id = role.id, "resolved role");
        Ok(role.id)
    }

    /// Resolve many pairs against a single catalogue fetch.
    ///
    /// Ids come back in input order, one per key, duplicates included.
    pub async fn permission_ids(&self, keys: &[PermissionKey]) -> Result<Vec<i64>, Error> {
        let catalogue = self.list_permission_resources().await?;
        keys.iter()
            .map(|key| find_permission(&catalogue, key).map(|p| p.id))
            .collect()
    }

    /// Resolve a database name to its id through the cached listing.
    pub async fn database_id_by_name(&self, name: &str) -> Result<i64, Error> {
        let databases = self.list_databases().await?;
        let db = find_unique(
            &databases,
            "database",
            name,
            |db| db.database_name == name,
            |db| db.id,
        )?;
        Ok(db.id)
    }

    /// Resolve a database id to its name through the cached listing.
    pub async fn database_name_by_id(&self, id: i64) -> Result<String, Error> {
        let databases = self.list_databases().await?;
        databases
            .iter()
            .find(|db| db.id == id)
            .map(|db| db.database_name.clone())
            .ok_or_else(|| Error::NotFound {
                entity: "database",
                key: id.to_string(),
            })
    }

    /// Find a meta database by name, matching only entries that carry the
    /// `superset://` marker. `Ok(None)` means no such meta database exists.
    pub async fn find_meta_database(&self, name: &str) -> Result<Option<MetaDatabase>, Error> {
        let databases = self.list_databases().await?;
        let found = find_unique(
            &databases,
            "meta database",
            name,
            |db| db.database_name == name && db.is_meta(),
            |db| db.id,
        );

        match found {
            Ok(db) => {
                info!(name, database_id = db.id, "found existing meta database");
                self.get_meta_database(db.id).await.map(Some)
            }
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
