//! PingFederate admin API client

pub mod client;
pub mod common;
pub mod endpoint;
pub mod error;
pub mod pool;
pub mod version;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Auth, Client, ClientConfig, RetryConfig};
pub use common::{ValidationError, VersionInfo};
pub use endpoint::{CollectionApi, SingletonApi};
pub use error::ApiError;
pub use pool::TlsConfig;
