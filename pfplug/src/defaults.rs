//! Version-conditional default values
//!
//! A default may change between product versions, or not exist at all
//! before some version. A [`VersionedDefault`] is an ordered list of steps,
//! "from version V the default is X", and resolves to the step with the
//! greatest threshold the target version satisfies.
//!
//! ```no_run
//! use pfplug::defaults::VersionedDefault;
//! use pfplug::types::Dynamic;
//! use pfplug::version::SupportedVersion;
//!
//! // no default before 12.1, "HOURS" from 12.1 on
//! let unit = VersionedDefault::since(
//!     SupportedVersion::from_static("12.1.0"),
//!     Dynamic::string("HOURS"),
//! );
//! ```

use crate::error::Result;
use crate::gate::AvailabilityResolver;
use crate::types::Dynamic;
use crate::version::SupportedVersion;

#[derive(Debug, Clone, PartialEq)]
struct DefaultStep {
    threshold: Option<SupportedVersion>,
    value: Dynamic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDefault {
    steps: Vec<DefaultStep>,
}

impl VersionedDefault {
    /// Same default on every version
    pub fn always(value: Dynamic) -> Self {
        Self {
            steps: vec![DefaultStep {
                threshold: None,
                value,
            }],
        }
    }

    /// Default that only exists from `version` on
    pub fn since(version: SupportedVersion, value: Dynamic) -> Self {
        Self {
            steps: vec![DefaultStep {
                threshold: Some(version),
                value,
            }],
        }
    }

    /// Add a step that replaces earlier ones from `version` on
    pub fn then_since(mut self, version: SupportedVersion, value: Dynamic) -> Self {
        self.steps.push(DefaultStep {
            threshold: Some(version),
            value,
        });
        self
    }

    pub fn bool(value: bool) -> Self {
        Self::always(Dynamic::Bool(value))
    }

    pub fn number(value: f64) -> Self {
        Self::always(Dynamic::Number(value))
    }

    pub fn string(value: &str) -> Self {
        Self::always(Dynamic::string(value))
    }

    /// Value for the resolver's target, if any step applies
    pub fn resolve(&self, resolver: &AvailabilityResolver) -> Result<Option<Dynamic>> {
        let registry = resolver.registry();
        let mut best: Option<&DefaultStep> = None;

        for step in &self.steps {
            let applies = match &step.threshold {
                None => true,
                Some(threshold) => resolver.at_least(threshold)?,
            };
            if !applies {
                continue;
            }

            let better = match (best.map(|b| &b.threshold), &step.threshold) {
                (None, _) => true,
                (Some(None), _) => true,
                (Some(Some(_)), None) => false,
                (Some(Some(current)), Some(candidate)) => {
                    registry.at_least(candidate, current)?
                }
            };
            if better {
                best = Some(step);
            }
        }

        Ok(best.map(|step| step.value.clone()))
    }

    pub fn description(&self) -> String {
        let parts: Vec<String> = self
            .steps
            .iter()
            .map(|step| match &step.threshold {
                None => format!("{:?}", step.value),
                Some(v) => format!("{:?} from {}", step.value, v),
            })
            .collect();
        format!("default {}", parts.join(", "))
    }
}
