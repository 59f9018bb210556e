use super::client::Client;
use super::common::VersionInfo;
use super::error::ApiError;
use pfplug::Context;

impl Client {
    /// Version reported by the server, e.g. `12.1.0.4`
    pub async fn version(&self, ctx: &Context) -> Result<VersionInfo, ApiError> {
        self.get(ctx, "/version").await
    }
}

/// Registered `X.Y.Z` prefix of a server version string
///
/// The server reports a fourth build component that the registry does not
/// track, so it is cut before comparing.
pub fn product_version_prefix(server_version: &str) -> String {
    server_version
        .split('.')
        .take(3)
        .collect::<Vec<_>>()
        .join(".")
}
