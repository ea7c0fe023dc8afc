//! Azure Resource Manager provider
//!
//! Dispatches each operation to the resource's service module by type name:
//! hand-written resources first, then the schema-driven configurations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use strata_core::provider::{Provider, ProviderError, ProviderResult, validate_resource};
use strata_core::resource::{Resource, ResourceId, State, Value};
use strata_core::schema::ResourceSchema;

use crate::client::{ArmClient, ArmError, ArmResultExt, HttpTransport};
use crate::config::{ProviderConfig, Timeouts};
use crate::convert::normalize_location;
use crate::generic::{ArmSchemaConfig, GenericResource};
use crate::services::apimanagement::api_tag_description;
use crate::services::eventgrid::event_subscription;
use crate::services::network::{backend_address_pool_association, web_application_firewall_policy};
use crate::services::paloalto;

/// Implementation backing a resource type
enum Handler {
    EventSubscription,
    ApiTagDescription,
    BackendAddressPoolAssociation,
    WebApplicationFirewallPolicy,
    SchemaDriven(ArmSchemaConfig),
}

fn handler(resource_type: &str, data_source: bool) -> Option<Handler> {
    if !data_source {
        let typed = match resource_type {
            event_subscription::TYPE_NAME => Some(Handler::EventSubscription),
            api_tag_description::TYPE_NAME => Some(Handler::ApiTagDescription),
            backend_address_pool_association::TYPE_NAME => {
                Some(Handler::BackendAddressPoolAssociation)
            }
            web_application_firewall_policy::TYPE_NAME => {
                Some(Handler::WebApplicationFirewallPolicy)
            }
            _ => None,
        };
        if typed.is_some() {
            return typed;
        }
    }
    paloalto::config(resource_type, data_source).map(Handler::SchemaDriven)
}

/// Whether two values of a force-new attribute name the same remote object
///
/// ARM names and IDs compare case-insensitively; locations also ignore spaces.
fn same_value(name: &str, current: &Value, desired: &Value) -> bool {
    match (current, desired) {
        (Value::String(a), Value::String(b)) if name == "location" => {
            normalize_location(a) == normalize_location(b)
        }
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        // names read back from an ID are text
        (Value::String(text), Value::Int(n)) | (Value::Int(n), Value::String(text)) => {
            *text == n.to_string()
        }
        _ => current == desired,
    }
}

/// Force-new attributes whose value differs between `from` and `to`
///
/// Attributes absent on either side are not compared; a missing desired value
/// falls back to the schema default.
fn force_new_changes(schema: &ResourceSchema, from: &State, to: &Resource) -> Vec<String> {
    schema
        .force_new_attributes()
        .into_iter()
        .filter(|name| {
            let desired = to
                .attributes
                .get(*name)
                .or_else(|| schema.attributes.get(*name).and_then(|a| a.default.as_ref()));
            match (from.attributes.get(*name), desired) {
                (Some(current), Some(desired)) => !same_value(name, current, desired),
                _ => false,
            }
        })
        .map(str::to_string)
        .collect()
}

fn unknown_type(id: &ResourceId) -> ProviderError {
    ProviderError::validation(format!("Unknown resource type: {}", id.resource_type))
        .for_resource(id.clone())
}

/// Azure Resource Manager provider
pub struct AzureRmProvider {
    client: ArmClient,
    timeouts: Timeouts,
}

impl AzureRmProvider {
    /// Create a provider talking to Resource Manager over HTTPS
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let transport = HttpTransport::new(&config)
            .map_err(|e| ProviderError::configuration(e.to_string()).with_cause(e))?;
        let client = ArmClient::new(Arc::new(transport), config.subscription_id.clone());
        Ok(Self::with_client(client, config.timeouts))
    }

    /// Create a provider over an existing client
    pub fn with_client(client: ArmClient, timeouts: Timeouts) -> Self {
        Self { client, timeouts }
    }

    pub fn client(&self) -> &ArmClient {
        &self.client
    }

    /// Run `operation` under its deadline
    async fn deadline<T>(
        &self,
        operation: &str,
        limit: Duration,
        id: &ResourceId,
        future: impl Future<Output = ProviderResult<T>>,
    ) -> ProviderResult<T> {
        match tokio::time::timeout(limit, future).await {
            Ok(result) => result,
            Err(_) => Err::<T, _>(ArmError::Timeout(limit))
                .context(|| format!("waiting for {} of {}", operation, id))
                .map_err(|e| e.for_resource(id.clone())),
        }
    }

    fn resource_schema(&self, type_name: &str) -> Option<ResourceSchema> {
        self.resource_types()
            .into_iter()
            .find(|t| t.name() == type_name && !t.is_data_source())
            .map(|t| t.schema())
    }

    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        validate_resource(self, resource)?;
        let handler = handler(&resource.id.resource_type, false)
            .ok_or_else(|| unknown_type(&resource.id))?;
        let client = &self.client;

        self.deadline("creation", self.timeouts.create, &resource.id, async {
            match &handler {
                Handler::EventSubscription => event_subscription::create(client, resource).await,
                Handler::ApiTagDescription => api_tag_description::create(client, resource).await,
                Handler::BackendAddressPoolAssociation => {
                    backend_address_pool_association::create(client, resource).await
                }
                Handler::WebApplicationFirewallPolicy => {
                    web_application_firewall_policy::create(client, resource).await
                }
                Handler::SchemaDriven(config) => {
                    GenericResource::new(client, config).create(resource).await
                }
            }
        })
        .await
    }

    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let handler = handler(&id.resource_type, false).ok_or_else(|| unknown_type(id))?;
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };
        let client = &self.client;

        self.deadline("read", self.timeouts.read, id, async {
            match &handler {
                Handler::EventSubscription => event_subscription::read(client, id, identifier).await,
                Handler::ApiTagDescription => {
                    api_tag_description::read(client, id, identifier).await
                }
                Handler::BackendAddressPoolAssociation => {
                    backend_address_pool_association::read(client, id, identifier).await
                }
                Handler::WebApplicationFirewallPolicy => {
                    web_application_firewall_policy::read(client, id, identifier).await
                }
                Handler::SchemaDriven(config) => {
                    GenericResource::new(client, config).read(id, identifier).await
                }
            }
        })
        .await
    }

    pub async fn read_data_source_resource(&self, resource: &Resource) -> ProviderResult<State> {
        validate_resource(self, resource)?;
        let Some(Handler::SchemaDriven(config)) = handler(&resource.id.resource_type, true) else {
            return Err(unknown_type(&resource.id));
        };

        self.deadline(
            "read",
            self.timeouts.read,
            &resource.id,
            GenericResource::new(&self.client, &config).read_data_source(resource),
        )
        .await
    }

    /// Update in place; changes to force-new attributes are rejected
    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        validate_resource(self, to)?;
        let handler = handler(&id.resource_type, false).ok_or_else(|| unknown_type(id))?;
        if let Some(schema) = self.resource_schema(&id.resource_type) {
            let changed = force_new_changes(&schema, from, to);
            if !changed.is_empty() {
                return Err(ProviderError::validation(format!(
                    "changing {} requires replacing the resource, delete and recreate it",
                    changed.join(", ")
                ))
                .for_resource(id.clone()));
            }
        }
        let client = &self.client;

        self.deadline("update", self.timeouts.update, id, async {
            match &handler {
                Handler::EventSubscription => {
                    event_subscription::update(client, id, identifier, to).await
                }
                Handler::ApiTagDescription => {
                    api_tag_description::update(client, id, identifier, to).await
                }
                Handler::BackendAddressPoolAssociation => Err(ProviderError::validation(format!(
                    "{} has no updatable attributes, delete and recreate",
                    id.resource_type
                ))
                .for_resource(id.clone())),
                Handler::WebApplicationFirewallPolicy => {
                    web_application_firewall_policy::update(client, id, identifier, to).await
                }
                Handler::SchemaDriven(config) => {
                    GenericResource::new(client, config)
                        .update(id, identifier, to)
                        .await
                }
            }
        })
        .await
    }

    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let handler = handler(&id.resource_type, false).ok_or_else(|| unknown_type(id))?;
        let client = &self.client;

        self.deadline("deletion", self.timeouts.delete, id, async {
            match &handler {
                Handler::EventSubscription => {
                    event_subscription::delete(client, id, identifier).await
                }
                Handler::ApiTagDescription => {
                    api_tag_description::delete(client, id, identifier).await
                }
                Handler::BackendAddressPoolAssociation => {
                    backend_address_pool_association::delete(client, id, identifier).await
                }
                Handler::WebApplicationFirewallPolicy => {
                    web_application_firewall_policy::delete(client, id, identifier).await
                }
                Handler::SchemaDriven(config) => {
                    GenericResource::new(client, config)
                        .delete(id, identifier)
                        .await
                }
            }
        })
        .await
    }

    /// Whether the remote object with `identifier` exists
    pub async fn exists(&self, resource_type: &str, identifier: &str) -> ProviderResult<bool> {
        let id = ResourceId::new(resource_type, identifier);
        let handler = handler(resource_type, false).ok_or_else(|| unknown_type(&id))?;
        let client = &self.client;

        self.deadline("read", self.timeouts.read, &id, async {
            match &handler {
                Handler::EventSubscription => event_subscription::exists(client, identifier).await,
                Handler::ApiTagDescription => {
                    api_tag_description::exists(client, identifier).await
                }
                Handler::BackendAddressPoolAssociation => {
                    backend_address_pool_association::exists(client, identifier).await
                }
                Handler::WebApplicationFirewallPolicy => {
                    web_application_firewall_policy::exists(client, identifier).await
                }
                Handler::SchemaDriven(config) => {
                    GenericResource::new(client, config).exists(identifier).await
                }
            }
        })
        .await
    }
}
