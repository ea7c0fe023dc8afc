//! Event Grid event subscription wire types (api-version 2022-06-15)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<EventSubscriptionProperties>,
}

/// Properties of a subscription; also the body of an update (PATCH)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscriptionProperties {
    #[serde(default, skip_serializing)]
    pub topic: Option<String>,
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<EventSubscriptionDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_with_resource_identity: Option<DeliveryWithResourceIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<EventSubscriptionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_delivery_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_letter_destination: Option<DeadLetterDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_letter_with_resource_identity: Option<DeadLetterWithResourceIdentity>,
}

impl EventSubscriptionProperties {
    /// Destination, whether or not it is delivered with a managed identity
    pub fn effective_destination(&self) -> Option<&EventSubscriptionDestination> {
        self.destination.as_ref().or_else(|| {
            self.delivery_with_resource_identity
                .as_ref()
                .and_then(|d| d.destination.as_ref())
        })
    }

    pub fn effective_dead_letter_destination(&self) -> Option<&DeadLetterDestination> {
        self.dead_letter_destination.as_ref().or_else(|| {
            self.dead_letter_with_resource_identity
                .as_ref()
                .and_then(|d| d.dead_letter_destination.as_ref())
        })
    }
}

/// Where events are delivered, discriminated by `endpointType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "endpointType", content = "properties")]
pub enum EventSubscriptionDestination {
    WebHook(WebHookDestinationProperties),
    EventHub(ResourceIdDestinationProperties),
    StorageQueue(StorageQueueDestinationProperties),
    HybridConnection(ResourceIdDestinationProperties),
    ServiceBusQueue(ResourceIdDestinationProperties),
    ServiceBusTopic(ResourceIdDestinationProperties),
    AzureFunction(AzureFunctionDestinationProperties),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdDestinationProperties {
    pub resource_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebHookDestinationProperties {
    /// Write-only: the API never returns it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub endpoint_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_events_per_batch: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_batch_size_in_kilobytes: Option<i64>,
    #[serde(
        rename = "azureActiveDirectoryTenantId",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_directory_tenant_id: Option<String>,
    #[serde(
        rename = "azureActiveDirectoryApplicationIdOrUri",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_directory_app_id_or_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageQueueDestinationProperties {
    pub resource_id: Option<String>,
    pub queue_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_message_time_to_live_in_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureFunctionDestinationProperties {
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_events_per_batch: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_batch_size_in_kilobytes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscriptionIdentity {
    #[serde(rename = "type")]
    pub identity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_assigned_identity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryWithResourceIdentity {
    pub identity: Option<EventSubscriptionIdentity>,
    pub destination: Option<EventSubscriptionDestination>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterWithResourceIdentity {
    pub identity: Option<EventSubscriptionIdentity>,
    pub dead_letter_destination: Option<DeadLetterDestination>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "endpointType", content = "properties")]
pub enum DeadLetterDestination {
    StorageBlob(StorageBlobDeadLetterDestinationProperties),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageBlobDeadLetterDestinationProperties {
    pub resource_id: Option<String>,
    pub blob_container_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delivery_attempts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time_to_live_in_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSubscriptionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_begins_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_ends_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_event_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subject_case_sensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_advanced_filtering_on_arrays: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_filters: Option<Vec<AdvancedFilter>>,
}

/// One advanced filter, discriminated by `operatorType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operatorType")]
pub enum AdvancedFilter {
    BoolEquals { key: String, value: bool },
    NumberGreaterThan { key: String, value: f64 },
    NumberGreaterThanOrEquals { key: String, value: f64 },
    NumberLessThan { key: String, value: f64 },
    NumberLessThanOrEquals { key: String, value: f64 },
    NumberIn { key: String, values: Vec<f64> },
    NumberNotIn { key: String, values: Vec<f64> },
    NumberInRange { key: String, values: Vec<[f64; 2]> },
    NumberNotInRange { key: String, values: Vec<[f64; 2]> },
    StringBeginsWith { key: String, values: Vec<String> },
    StringNotBeginsWith { key: String, values: Vec<String> },
    StringEndsWith { key: String, values: Vec<String> },
    StringNotEndsWith { key: String, values: Vec<String> },
    StringContains { key: String, values: Vec<String> },
    StringNotContains { key: String, values: Vec<String> },
    StringIn { key: String, values: Vec<String> },
    StringNotIn { key: String, values: Vec<String> },
    IsNotNull { key: String },
    IsNullOrUndefined { key: String },
}

impl AdvancedFilter {
    /// Number of values counted against the per-subscription limit
    pub fn value_count(&self) -> usize {
        match self {
            AdvancedFilter::NumberIn { values, .. } | AdvancedFilter::NumberNotIn { values, .. } => {
                values.len()
            }
            AdvancedFilter::NumberInRange { values, .. }
            | AdvancedFilter::NumberNotInRange { values, .. } => values.len(),
            AdvancedFilter::StringBeginsWith { values, .. }
            | AdvancedFilter::StringNotBeginsWith { values, .. }
            | AdvancedFilter::StringEndsWith { values, .. }
            | AdvancedFilter::StringNotEndsWith { values, .. }
            | AdvancedFilter::StringContains { values, .. }
            | AdvancedFilter::StringNotContains { values, .. }
            | AdvancedFilter::StringIn { values, .. }
            | AdvancedFilter::StringNotIn { values, .. } => values.len(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn destination_uses_adjacent_endpoint_type() {
        let destination =
            EventSubscriptionDestination::ServiceBusQueue(ResourceIdDestinationProperties {
                resource_id: Some("/subscriptions/s/queue".to_string()),
            });
        assert_eq!(
            serde_json::to_value(&destination).unwrap(),
            json!({
                "endpointType": "ServiceBusQueue",
                "properties": {"resourceId": "/subscriptions/s/queue"}
            })
        );
    }

    #[test]
    fn advanced_filter_uses_operator_type_tag() {
        let filter: AdvancedFilter = serde_json::from_value(json!({
            "operatorType": "NumberInRange",
            "key": "data.contentLength",
            "values": [[0, 1], [2, 3]]
        }))
        .unwrap();
        assert_eq!(
            filter,
            AdvancedFilter::NumberInRange {
                key: "data.contentLength".to_string(),
                values: vec![[0.0, 1.0], [2.0, 3.0]],
            }
        );
        assert_eq!(filter.value_count(), 2);
        assert_eq!(
            AdvancedFilter::IsNotNull {
                key: "subject".to_string()
            }
            .value_count(),
            1
        );
    }

    #[test]
    fn read_only_fields_are_not_sent() {
        let properties = EventSubscriptionProperties {
            topic: Some("/subscriptions/s".to_string()),
            provisioning_state: Some("Succeeded".to_string()),
            labels: Some(vec!["test".to_string()]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&properties).unwrap(),
            json!({"labels": ["test"]})
        );
    }

    #[test]
    fn identity_destination_is_effective() {
        let destination = EventSubscriptionDestination::EventHub(ResourceIdDestinationProperties {
            resource_id: Some("/hub".to_string()),
        });
        let properties = EventSubscriptionProperties {
            delivery_with_resource_identity: Some(DeliveryWithResourceIdentity {
                identity: Some(EventSubscriptionIdentity {
                    identity_type: "SystemAssigned".to_string(),
                    user_assigned_identity: None,
                }),
                destination: Some(destination.clone()),
            }),
            ..Default::default()
        };
        assert_eq!(properties.effective_destination(), Some(&destination));
        assert!(properties.effective_dead_letter_destination().is_none());
    }
}
