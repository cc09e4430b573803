// superset-provider: infrastructure-as-code provider for Apache Superset
//
// Manages roles, role permissions, database connections, meta databases,
// and datasets, plus read-only listings of each.

pub mod config;
pub mod data_sources;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;

pub use config::{ProviderBlock, ProviderConfig};
pub use diagnostics::{Diagnostic, Diagnostics, Response, Severity};
pub use error::ProviderError;
pub use logging::{init_logging, try_init_json_logging, try_init_logging};
pub use provider::{PROVIDER_NAME, SupersetProvider};
pub use resource::{DataSource, DataSourceKind, ReadOutcome, Resource, ResourceKind};
