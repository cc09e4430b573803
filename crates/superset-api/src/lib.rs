// superset-api: Async Rust client for the Apache Superset REST API

pub mod auth;
pub mod cache;
pub mod client;
pub mod databases;
pub mod datasets;
pub mod error;
pub mod models;
pub mod permissions;
pub mod resolve;
pub mod roles;
pub mod transport;

pub use auth::Credentials;
pub use cache::{DEFAULT_DATABASE_CACHE_TTL, DatabaseCache};
pub use client::{CsrfSession, SupersetClient};
pub use databases::DATABASE_INFOS_LIMIT;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
