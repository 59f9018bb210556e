//! pfplug - version-aware Terraform resource framework
//!
//! Besides the usual resource, data source and provider traits this crate
//! holds the version reconciliation engine: an ordered registry of product
//! versions, per-attribute availability gates, a plan reconciler and a state
//! reader. The engine is synchronous; only [`Context`] touches the runtime.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Version reconciliation
pub mod defaults;
pub mod gate;
pub mod payload;
pub mod plan;
pub mod state;
pub mod version;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod import;
pub mod plan_modifier;
pub mod validator;

/// Diagnostic summary for failures the user cannot fix in configuration
pub const INTERNAL_ERROR_SUMMARY: &str = "Internal provider error";

// Re-exports for convenience
pub use context::Context;
pub use data_source::DataSource;
pub use defaults::VersionedDefault;
pub use error::{PfplugError, Result};
pub use gate::{Availability, AvailabilityResolver, VersionGate};
pub use import::import_state_passthrough_id;
pub use payload::encode_request;
pub use plan::{propose_new_state, validate_config, PlanReconciler, ReconciledPlan};
pub use provider::Provider;
pub use resource::Resource;
pub use schema::{AttributeBuilder, AttributeType, NestingMode, Schema, SchemaBuilder};
pub use state::{ReadMode, StateReader};
pub use types::{AttributePath, Diagnostic, Diagnostics, Dynamic, DynamicValue, PrivateStateData};
pub use version::{SupportedVersion, VersionRegistry};
