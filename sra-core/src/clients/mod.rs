// sra-core/src/clients/mod.rs
//! Live adapters: the service traits implemented against the real provider
//! REST APIs. Endpoints are overridable so the adapters can be pointed at a
//! local mock server.

pub mod auth;
pub mod cloudsql;
mod http;
pub mod security_center;

pub use auth::{Credentials, TokenSource};
pub use cloudsql::{CloudSqlClient, DEFAULT_SQL_ADMIN_ENDPOINT};
pub use http::build_http_client;
pub use security_center::{SecurityCenterClient, DEFAULT_SECURITY_CENTER_ENDPOINT};
