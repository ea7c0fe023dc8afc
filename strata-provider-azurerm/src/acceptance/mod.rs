//! Acceptance test fixtures
//!
//! Fixtures render the resources of each live scenario. Resources the
//! provider does not manage (resource groups, storage accounts, API
//! Management APIs) must already exist; their IDs come from `ARM_TEST_*`
//! variables.

mod apimanagement;
mod data;
mod eventgrid;

pub use apimanagement::ApiTagDescriptionFixture;
pub use data::{Locations, TestData};
pub use eventgrid::EventSubscriptionFixture;

use std::collections::HashMap;

use strata_core::provider::{BoxFuture, ProviderResult};
use strata_core::resource::{Resource, Value};

use crate::provider::AzureRmProvider;

/// Live tests run only with `ARM_ACC=1`
pub fn enabled() -> bool {
    std::env::var("ARM_ACC").is_ok_and(|v| v == "1")
}

/// Value of `ARM_TEST_{name}`, if set
pub fn prerequisite(name: &str) -> Option<String> {
    std::env::var(format!("ARM_TEST_{}", name))
        .ok()
        .filter(|v| !v.is_empty())
}

/// Checks a created object directly against the service
pub trait ExistsInAzure {
    fn exists<'a>(
        &'a self,
        provider: &'a AzureRmProvider,
        identifier: &'a str,
    ) -> BoxFuture<'a, ProviderResult<bool>>;
}

/// Resources of one scenario, in creation order
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub resources: Vec<Resource>,
}

impl Config {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// Resource with the given label
    pub fn resource(&self, label: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id.name == label)
    }

    /// Resource documents as a JSON array
    pub fn render(&self) -> String {
        let documents = self.resources.iter().map(Resource::to_document).collect();
        format!("{:#}", serde_json::Value::Array(documents))
    }
}

pub(crate) fn s(value: impl Into<String>) -> Value {
    Value::String(value.into())
}

pub(crate) fn block(entries: Vec<(&str, Value)>) -> Value {
    Value::block(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<HashMap<_, _>>())
}
