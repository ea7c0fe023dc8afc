//! Strata Azure Resource Manager Provider
//!
//! Maps declarative resource configuration onto Azure Resource Manager REST
//! calls.
//!
//! ## Module Structure
//!
//! - `config` - Provider settings from the host and `ARM_*` variables
//! - `auth` - Bearer tokens for Resource Manager
//! - `client` - ARM REST client and transports
//! - `resourceids` - Segment-wise ARM resource ID parsing
//! - `convert` / `generic` - Schema-driven resources
//! - `services` - Resource implementations, one package per Azure service
//! - `acceptance` - Fixtures for live acceptance tests

pub mod acceptance;
pub mod auth;
pub mod client;
pub mod config;
pub mod convert;
pub mod generic;
pub mod provider;
pub mod resourceids;
pub mod services;

// Re-export main types
pub use config::ProviderConfig;
pub use provider::AzureRmProvider;

use strata_core::provider::{BoxFuture, Provider, ProviderResult, ServiceRegistration};
use strata_core::resource::{Resource, ResourceId, State};

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AzureRmProvider {
    fn name(&self) -> &'static str {
        "azurerm"
    }

    fn registrations(&self) -> Vec<Box<dyn ServiceRegistration>> {
        services::registrations()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.read_data_source_resource(&resource).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &from, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
