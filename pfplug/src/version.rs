//! Product version registry
//!
//! Versions are ordered by their position in a curated list rather than by
//! numeric major/minor/patch comparison. Not every numeric triple is a real
//! release, so a version outside the list cannot be ordered at all.

use crate::error::{PfplugError, Result};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A released product version in canonical `X.Y.Z` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SupportedVersion(Cow<'static, str>);

impl SupportedVersion {
    /// Version from a compiled-in literal
    pub const fn from_static(text: &'static str) -> Self {
        Self(Cow::Borrowed(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SupportedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered allow-list of product versions
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    versions: Vec<SupportedVersion>,
    positions: HashMap<SupportedVersion, usize>,
}

impl VersionRegistry {
    /// Build a registry; construction order is the version order
    pub fn new(versions: impl IntoIterator<Item = SupportedVersion>) -> Result<Self> {
        let versions: Vec<SupportedVersion> = versions.into_iter().collect();
        if versions.is_empty() {
            return Err(PfplugError::InvalidRegistry(
                "at least one version is required".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(versions.len());
        for (idx, version) in versions.iter().enumerate() {
            if !is_canonical(version.as_str()) {
                return Err(PfplugError::InvalidRegistry(format!(
                    "'{}' is not of the form X.Y.Z",
                    version
                )));
            }
            if positions.insert(version.clone(), idx).is_some() {
                return Err(PfplugError::InvalidRegistry(format!(
                    "duplicate version '{}'",
                    version
                )));
            }
        }

        Ok(Self {
            versions,
            positions,
        })
    }

    /// Parse `X.Y` or `X.Y.Z`; `X.Y` is read as `X.Y.0`
    pub fn parse(&self, text: &str) -> Result<SupportedVersion> {
        let fail = |reason: String| PfplugError::VersionParse {
            input: text.to_string(),
            reason,
        };

        if text.is_empty() {
            return Err(fail("version is empty".to_string()));
        }

        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(fail(
                "expected a version of the form X.Y or X.Y.Z".to_string(),
            ));
        }
        if parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(fail("version parts must be numeric".to_string()));
        }

        let normalized = if parts.len() == 2 {
            format!("{}.0", text)
        } else {
            text.to_string()
        };

        self.find(&normalized).cloned().ok_or_else(|| {
            fail(format!(
                "not a supported version. {}",
                self.supported_versions_message()
            ))
        })
    }

    /// Exact membership, without normalization
    pub fn is_valid(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Order two registered versions by list position
    pub fn compare(&self, a: &SupportedVersion, b: &SupportedVersion) -> Result<Ordering> {
        Ok(self.index(a)?.cmp(&self.index(b)?))
    }

    /// `target >= threshold`
    pub fn at_least(
        &self,
        target: &SupportedVersion,
        threshold: &SupportedVersion,
    ) -> Result<bool> {
        Ok(self.compare(target, threshold)? != Ordering::Less)
    }

    pub fn contains(&self, version: &SupportedVersion) -> bool {
        self.positions.contains_key(version)
    }

    pub fn versions(&self) -> &[SupportedVersion] {
        &self.versions
    }

    pub fn oldest(&self) -> &SupportedVersion {
        // non-empty is checked in new()
        &self.versions[0]
    }

    pub fn latest(&self) -> &SupportedVersion {
        &self.versions[self.versions.len() - 1]
    }

    pub fn supported_versions_message(&self) -> String {
        let list: Vec<&str> = self.versions.iter().map(|v| v.as_str()).collect();
        format!("Supported versions are: {}", list.join(", "))
    }

    fn find(&self, text: &str) -> Option<&SupportedVersion> {
        self.versions.iter().find(|v| v.as_str() == text)
    }

    fn index(&self, version: &SupportedVersion) -> Result<usize> {
        self.positions.get(version).copied().ok_or_else(|| {
            PfplugError::InvalidVersion(format!(
                "{} is not in the version registry",
                version
            ))
        })
    }
}

fn is_canonical(text: &str) -> bool {
    let parts: Vec<&str> = text.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}
