//! PingFederate versions this provider knows how to talk to
//!
//! The table order is the version order. Patch releases must be listed
//! explicitly; a version missing here cannot be configured.

use pfplug::{AvailabilityResolver, Result, SupportedVersion, VersionRegistry};
use std::sync::Arc;

pub const PINGFEDERATE_1120: SupportedVersion = SupportedVersion::from_static("11.2.0");
pub const PINGFEDERATE_1130: SupportedVersion = SupportedVersion::from_static("11.3.0");
pub const PINGFEDERATE_1200: SupportedVersion = SupportedVersion::from_static("12.0.0");
pub const PINGFEDERATE_1210: SupportedVersion = SupportedVersion::from_static("12.1.0");
pub const PINGFEDERATE_1220: SupportedVersion = SupportedVersion::from_static("12.2.0");
pub const PINGFEDERATE_1300: SupportedVersion = SupportedVersion::from_static("13.0.0");

const SORTED_VERSIONS: &[&str] = &[
    "11.2.0", "11.2.1", "11.2.2", "11.2.3", "11.2.4", "11.2.5", "11.2.6", "11.2.7", "11.2.8",
    "11.2.9", "11.2.10", "11.2.11", //
    "11.3.0", "11.3.1", "11.3.2", "11.3.3", "11.3.4", "11.3.5", "11.3.6", "11.3.7", "11.3.8",
    "11.3.9", "11.3.10", //
    "12.0.0", "12.0.1", "12.0.2", "12.0.3", "12.0.4", "12.0.5", "12.0.6", //
    "12.1.0", "12.1.1", "12.1.2", "12.1.3", "12.1.4", //
    "12.2.0", "12.2.1", "12.2.2", "12.2.3", //
    "13.0.0", "13.0.1",
];

/// Registry of every supported PingFederate release
pub fn registry() -> Result<Arc<VersionRegistry>> {
    let registry =
        VersionRegistry::new(SORTED_VERSIONS.iter().copied().map(SupportedVersion::from_static))?;
    Ok(Arc::new(registry))
}

/// Resolver for `target` whose diagnostics point at the provider setting
pub fn resolver(registry: Arc<VersionRegistry>, target: SupportedVersion) -> Result<AvailabilityResolver> {
    let source = format!(
        "the 'product_version' field in your provider configuration or the '{}' environment variable",
        crate::config::PRODUCT_VERSION_ENV
    );
    Ok(AvailabilityResolver::new(registry, target)?.with_product("PingFederate", &source))
}
