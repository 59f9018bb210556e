//! Provider data structure passed to resources and data sources

use crate::api::Client;
use pfplug::{AvailabilityResolver, Diagnostics};
use std::any::Any;
use std::sync::Arc;

#[derive(Clone)]
pub struct PingFederateProviderData {
    pub client: Arc<Client>,
    /// Availability of attributes at the configured product version
    pub resolver: Arc<AvailabilityResolver>,
}

impl PingFederateProviderData {
    pub fn new(client: Client, resolver: AvailabilityResolver) -> Self {
        Self {
            client: Arc::new(client),
            resolver: Arc::new(resolver),
        }
    }

    /// Recover provider data handed to a resource or data source configure call.
    /// `None` input means the provider is not configured yet, which is fine
    /// during validation.
    pub fn from_configure(
        provider_data: Option<Arc<dyn Any + Send + Sync>>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Self> {
        let data = provider_data?;
        match data.downcast_ref::<PingFederateProviderData>() {
            Some(data) => Some(data.clone()),
            None => {
                diagnostics.add_error(
                    "Unexpected provider data",
                    "Expected PingFederateProviderData. Please report this issue to the provider developers.",
                );
                None
            }
        }
    }
}
