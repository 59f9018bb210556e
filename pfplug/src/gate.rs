//! Attribute availability for the configured target version

use crate::error::Result;
use crate::types::{AttributePath, Diagnostics};
use crate::version::{SupportedVersion, VersionRegistry};
use std::sync::Arc;

/// Diagnostic summary for attributes or resources the target cannot handle
pub const UNSUPPORTED_ATTRIBUTE_SUMMARY: &str = "Invalid product version attribute";

/// Version window in which the server recognizes an attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionGate {
    /// Inclusive minimum; `None` means available since the oldest version
    pub introduced: Option<SupportedVersion>,
    /// First version that no longer accepts the attribute
    pub removed: Option<SupportedVersion>,
}

impl VersionGate {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn since(version: SupportedVersion) -> Self {
        Self {
            introduced: Some(version),
            removed: None,
        }
    }

    pub fn removed_in(mut self, version: SupportedVersion) -> Self {
        self.removed = Some(version);
        self
    }

    pub fn is_unconditional(&self) -> bool {
        self.introduced.is_none() && self.removed.is_none()
    }
}

/// Outcome of checking a gate against the target version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    NotYetIntroduced { minimum: SupportedVersion },
    Removed { removed_in: SupportedVersion },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Decides attribute legality for one target version
#[derive(Debug, Clone)]
pub struct AvailabilityResolver {
    registry: Arc<VersionRegistry>,
    target: SupportedVersion,
    product: String,
    version_source: Option<String>,
}

impl AvailabilityResolver {
    pub fn new(registry: Arc<VersionRegistry>, target: SupportedVersion) -> Result<Self> {
        // compare() rejects a target the registry does not know
        registry.compare(&target, &target)?;
        Ok(Self {
            registry,
            target,
            product: "Product".to_string(),
            version_source: None,
        })
    }

    /// Names the product and where its version came from in diagnostics
    pub fn with_product(mut self, product: &str, version_source: &str) -> Self {
        self.product = product.to_string();
        self.version_source = Some(version_source.to_string());
        self
    }

    pub fn registry(&self) -> &Arc<VersionRegistry> {
        &self.registry
    }

    pub fn target(&self) -> &SupportedVersion {
        &self.target
    }

    /// Target is at or above `threshold`
    pub fn at_least(&self, threshold: &SupportedVersion) -> Result<bool> {
        self.registry.at_least(&self.target, threshold)
    }

    pub fn availability(&self, gate: &VersionGate) -> Result<Availability> {
        if let Some(minimum) = &gate.introduced {
            if !self.at_least(minimum)? {
                return Ok(Availability::NotYetIntroduced {
                    minimum: minimum.clone(),
                });
            }
        }
        if let Some(removed_in) = &gate.removed {
            if self.at_least(removed_in)? {
                return Ok(Availability::Removed {
                    removed_in: removed_in.clone(),
                });
            }
        }
        Ok(Availability::Available)
    }

    pub fn is_available(&self, gate: &VersionGate) -> Result<bool> {
        Ok(self.availability(gate)?.is_available())
    }

    /// Appends a diagnostic when the attribute at `path` is unavailable.
    /// Returns whether it is available; other checks are never aborted.
    pub fn require_available(
        &self,
        path: &AttributePath,
        gate: &VersionGate,
        diags: &mut Diagnostics,
    ) -> bool {
        match self.availability(gate) {
            Ok(Availability::Available) => true,
            Ok(Availability::NotYetIntroduced { minimum }) => {
                diags.add_attribute_error(
                    path.clone(),
                    UNSUPPORTED_ATTRIBUTE_SUMMARY,
                    format!(
                        "{} version {} or later is required for attribute {}. {}",
                        self.product,
                        minimum,
                        path,
                        self.provided_version_note()
                    ),
                );
                false
            }
            Ok(Availability::Removed { removed_in }) => {
                diags.add_attribute_error(
                    path.clone(),
                    UNSUPPORTED_ATTRIBUTE_SUMMARY,
                    format!(
                        "Attribute {} is not supported by {} version {} or later. {}",
                        path,
                        self.product,
                        removed_in,
                        self.provided_version_note()
                    ),
                );
                false
            }
            Err(err) => {
                diags.add_attribute_error(
                    path.clone(),
                    crate::INTERNAL_ERROR_SUMMARY,
                    err.to_string(),
                );
                false
            }
        }
    }

    /// Whole-resource counterpart of [`AvailabilityResolver::require_available`]
    pub fn require_resource_available(
        &self,
        type_name: &str,
        gate: &VersionGate,
        diags: &mut Diagnostics,
    ) -> bool {
        match self.availability(gate) {
            Ok(Availability::Available) => true,
            Ok(Availability::NotYetIntroduced { minimum }) => {
                diags.add_error(
                    UNSUPPORTED_ATTRIBUTE_SUMMARY,
                    format!(
                        "{} version {} or later is required for resource {}. {}",
                        self.product,
                        minimum,
                        type_name,
                        self.provided_version_note()
                    ),
                );
                false
            }
            Ok(Availability::Removed { removed_in }) => {
                diags.add_error(
                    UNSUPPORTED_ATTRIBUTE_SUMMARY,
                    format!(
                        "Resource {} is not supported by {} version {} or later. {}",
                        type_name,
                        self.product,
                        removed_in,
                        self.provided_version_note()
                    ),
                );
                false
            }
            Err(err) => {
                diags.add_error(crate::INTERNAL_ERROR_SUMMARY, err.to_string());
                false
            }
        }
    }

    fn provided_version_note(&self) -> String {
        match &self.version_source {
            Some(source) => format!(
                "{} version {} was provided via {}.",
                self.product, self.target, source
            ),
            None => format!("{} version {} was provided.", self.product, self.target),
        }
    }
}
