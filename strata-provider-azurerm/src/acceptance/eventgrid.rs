use strata_core::provider::{BoxFuture, ProviderResult};
use strata_core::resource::{Resource, Value};

use super::{Config, ExistsInAzure, TestData, block, prerequisite, s};
use crate::provider::AzureRmProvider;
use crate::services::eventgrid::event_subscription::{self, TYPE_NAME};

/// Existing infrastructure the event subscription scenarios deliver to
///
/// `ARM_TEST_RESOURCE_GROUP_ID`, `ARM_TEST_STORAGE_ACCOUNT_ID`,
/// `ARM_TEST_STORAGE_QUEUE_NAME` and `ARM_TEST_STORAGE_CONTAINER_NAME` are
/// required; the Event Hub and Service Bus endpoints are optional.
#[derive(Debug, Clone)]
pub struct EventSubscriptionFixture {
    pub resource_group_id: String,
    pub storage_account_id: String,
    pub queue_name: String,
    pub container_name: String,
    pub eventhub_id: Option<String>,
    pub service_bus_queue_id: Option<String>,
    pub service_bus_topic_id: Option<String>,
}

impl EventSubscriptionFixture {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            resource_group_id: prerequisite("RESOURCE_GROUP_ID")?,
            storage_account_id: prerequisite("STORAGE_ACCOUNT_ID")?,
            queue_name: prerequisite("STORAGE_QUEUE_NAME")?,
            container_name: prerequisite("STORAGE_CONTAINER_NAME")?,
            eventhub_id: prerequisite("EVENTHUB_ID"),
            service_bus_queue_id: prerequisite("SERVICEBUS_QUEUE_ID"),
            service_bus_topic_id: prerequisite("SERVICEBUS_TOPIC_ID"),
        })
    }

    fn subscription(&self, label: &str, name: String, scope: &str) -> Resource {
        Resource::new(TYPE_NAME, label)
            .with_attribute("name", s(name))
            .with_attribute("scope", s(scope))
    }

    fn storage_queue(&self) -> Value {
        block(vec![
            ("storage_account_id", s(&self.storage_account_id)),
            ("queue_name", s(&self.queue_name)),
        ])
    }

    fn dead_letter(&self) -> Value {
        block(vec![
            ("storage_account_id", s(&self.storage_account_id)),
            ("storage_blob_container_name", s(&self.container_name)),
        ])
    }

    fn retry_policy(time_to_live: i64, attempts: i64) -> Value {
        block(vec![
            ("event_time_to_live", Value::Int(time_to_live)),
            ("max_delivery_attempts", Value::Int(attempts)),
        ])
    }

    fn subject_filter() -> Value {
        block(vec![
            ("subject_begins_with", s("test/test")),
            ("subject_ends_with", s(".jpg")),
        ])
    }

    pub fn basic(&self, data: &TestData) -> Config {
        Config::new(vec![
            self.subscription(
                "test",
                format!("acctesteg-{}", data.random_integer),
                &self.resource_group_id,
            )
            .with_attribute("storage_queue_endpoint", self.storage_queue())
            .with_attribute("storage_blob_dead_letter_destination", self.dead_letter())
            .with_attribute("retry_policy", Self::retry_policy(11, 11))
            .with_attribute("labels", Value::string_list(["test", "test1", "test2"])),
        ])
    }

    /// `basic` plus a copy of its subscription under another label
    pub fn requires_import(&self, data: &TestData) -> Config {
        let mut config = self.basic(data);
        let import = config.resource("test").cloned().map(|mut resource| {
            resource.id.name = "import".to_string();
            resource
        });
        config.resources.extend(import);
        config
    }

    pub fn update(&self, data: &TestData) -> Config {
        Config::new(vec![
            self.subscription(
                "test",
                format!("acctesteg-{}", data.random_integer),
                &self.resource_group_id,
            )
            .with_attribute("storage_queue_endpoint", self.storage_queue())
            .with_attribute("storage_blob_dead_letter_destination", self.dead_letter())
            .with_attribute("retry_policy", Self::retry_policy(12, 10))
            .with_attribute("subject_filter", Self::subject_filter())
            .with_attribute(
                "included_event_types",
                Value::string_list(["Microsoft.Storage.BlobCreated", "Microsoft.Storage.BlobDeleted"]),
            )
            .with_attribute("labels", Value::string_list(["test4", "test5", "test6"])),
        ])
    }

    fn cloud_event_endpoint(
        &self,
        data: &TestData,
        attribute: &str,
        endpoint: Option<&str>,
    ) -> Option<Config> {
        let endpoint = endpoint?;
        Some(Config::new(vec![
            self.subscription(
                "test",
                format!("acctest-eg-{}", data.random_integer),
                &self.resource_group_id,
            )
            .with_attribute("event_delivery_schema", s("CloudEventSchemaV1_0"))
            .with_attribute(attribute, s(endpoint)),
        ]))
    }

    /// `None` without `ARM_TEST_EVENTHUB_ID`
    pub fn event_hub_id(&self, data: &TestData) -> Option<Config> {
        self.cloud_event_endpoint(data, "eventhub_endpoint_id", self.eventhub_id.as_deref())
    }

    pub fn service_bus_queue_id(&self, data: &TestData) -> Option<Config> {
        self.cloud_event_endpoint(
            data,
            "service_bus_queue_endpoint_id",
            self.service_bus_queue_id.as_deref(),
        )
    }

    pub fn service_bus_topic_id(&self, data: &TestData) -> Option<Config> {
        self.cloud_event_endpoint(
            data,
            "service_bus_topic_endpoint_id",
            self.service_bus_topic_id.as_deref(),
        )
    }

    pub fn filter(&self, data: &TestData) -> Config {
        Config::new(vec![
            self.subscription(
                "test",
                format!("acctest-eg-{}", data.random_integer),
                &self.resource_group_id,
            )
            .with_attribute("storage_queue_endpoint", self.storage_queue())
            .with_attribute("advanced_filtering_on_arrays_enabled", Value::Bool(true))
            .with_attribute(
                "included_event_types",
                Value::string_list(["Microsoft.Storage.BlobCreated", "Microsoft.Storage.BlobDeleted"]),
            )
            .with_attribute("subject_filter", Self::subject_filter()),
        ])
    }

    /// Two subscriptions on the storage account covering every operator
    pub fn advanced_filter(&self, data: &TestData) -> Config {
        let numbers = |values: &[f64]| Value::List(values.iter().map(|v| Value::Float(*v)).collect());
        let ranges = |pairs: &[(f64, f64)]| {
            Value::List(
                pairs
                    .iter()
                    .map(|(low, high)| Value::List(vec![Value::Float(*low), Value::Float(*high)]))
                    .collect(),
            )
        };
        let strings = |values: &[&str]| Value::string_list(values.iter().copied());
        let key_only = |key: &str| block(vec![("key", s(key))]);

        let first = block(vec![
            ("bool_equals", block(vec![("key", s("subject")), ("value", Value::Bool(true))])),
            (
                "number_greater_than",
                block(vec![("key", s("data.metadataVersion")), ("value", Value::Int(1))]),
            ),
            (
                "number_greater_than_or_equals",
                block(vec![("key", s("data.contentLength")), ("value", Value::Float(42.0))]),
            ),
            (
                "number_less_than",
                block(vec![("key", s("data.contentLength")), ("value", Value::Float(42.1))]),
            ),
            (
                "number_less_than_or_equals",
                block(vec![("key", s("data.metadataVersion")), ("value", Value::Int(2))]),
            ),
            (
                "number_in",
                block(vec![
                    ("key", s("data.contentLength")),
                    ("values", numbers(&[0.0, 1.0, 1.0, 2.0, 3.0])),
                ]),
            ),
            (
                "number_not_in",
                block(vec![
                    ("key", s("data.contentLength")),
                    ("values", numbers(&[5.0, 8.0, 13.0, 21.0, 34.0])),
                ]),
            ),
            (
                "number_in_range",
                block(vec![
                    ("key", s("data.contentLength")),
                    ("values", ranges(&[(0.0, 1.0), (2.0, 3.0)])),
                ]),
            ),
            (
                "number_not_in_range",
                block(vec![
                    ("key", s("data.contentLength")),
                    ("values", ranges(&[(5.0, 13.0), (21.0, 34.0)])),
                ]),
            ),
            (
                "string_begins_with",
                block(vec![("key", s("subject")), ("values", strings(&["foo"]))]),
            ),
        ]);
        let second = block(vec![
            (
                "string_ends_with",
                block(vec![("key", s("subject")), ("values", strings(&["bar"]))]),
            ),
            (
                "string_not_begins_with",
                block(vec![("key", s("subject")), ("values", strings(&["lorem"]))]),
            ),
            (
                "string_not_ends_with",
                block(vec![("key", s("subject")), ("values", strings(&["ipsum"]))]),
            ),
            (
                "string_contains",
                block(vec![
                    ("key", s("data.contentType")),
                    ("values", strings(&["application", "octet-stream"])),
                ]),
            ),
            (
                "string_not_contains",
                block(vec![("key", s("data.contentType")), ("values", strings(&["text"]))]),
            ),
            (
                "string_in",
                block(vec![("key", s("data.blobType")), ("values", strings(&["Block"]))]),
            ),
            (
                "string_not_in",
                block(vec![("key", s("data.blobType")), ("values", strings(&["Page"]))]),
            ),
            ("is_not_null", key_only("subject")),
            ("is_null_or_undefined", key_only("subject")),
        ]);

        let on_storage = |label: &str, suffix: u8, filter: Value| {
            self.subscription(
                label,
                format!("acctesteg-{}-{}", data.random_integer, suffix),
                &self.storage_account_id,
            )
            .with_attribute("storage_queue_endpoint", self.storage_queue())
            .with_attribute("advanced_filter", filter)
        };
        Config::new(vec![on_storage("test1", 1, first), on_storage("test2", 2, second)])
    }

    /// Advanced filters totalling exactly the maximum number of values
    pub fn advanced_filter_max_items(&self, data: &TestData) -> Config {
        let single = |key: &str, value: i64| block(vec![("key", s(key)), ("value", Value::Int(value))]);
        let numbers = |key: &str, values: &[i64]| {
            block(vec![
                ("key", s(key)),
                ("values", Value::List(values.iter().map(|v| Value::Int(*v)).collect())),
            ])
        };
        let strings = |key: &str, values: &[&str]| {
            block(vec![("key", s(key)), ("values", Value::string_list(values.iter().copied()))])
        };

        let filter = block(vec![
            ("bool_equals", block(vec![("key", s("subject")), ("value", Value::Bool(true))])),
            ("number_greater_than", single("data.metadataVersion", 2)),
            ("number_greater_than_or_equals", single("data.contentLength", 3)),
            ("number_less_than", single("data.contentLength", 4)),
            ("number_less_than_or_equals", single("data.metadataVersion", 5)),
            ("number_in", numbers("data.contentLength", &[6, 7, 8])),
            ("number_not_in", numbers("data.contentLength", &[9, 10, 11])),
            ("string_begins_with", strings("subject", &["12", "13", "14"])),
            ("string_ends_with", strings("subject", &["15", "16", "17"])),
            ("string_contains", strings("data.contentType", &["18", "19", "20"])),
            ("string_in", strings("data.blobType", &["21", "22", "23"])),
            ("string_not_in", strings("data.blobType", &["24", "25"])),
        ]);
        Config::new(vec![
            self.subscription(
                "test",
                format!("acctesteg-{}", data.random_integer),
                &self.storage_account_id,
            )
            .with_attribute("storage_queue_endpoint", self.storage_queue())
            .with_attribute("advanced_filter", filter),
        ])
    }

    pub fn identity(&self, data: &TestData) -> Config {
        let system_assigned = || block(vec![("type", s("SystemAssigned"))]);
        Config::new(vec![
            self.subscription(
                "test",
                format!("acctesteg-{}", data.random_integer),
                &self.resource_group_id,
            )
            .with_attribute("delivery_identity", system_assigned())
            .with_attribute("dead_letter_identity", system_assigned())
            .with_attribute("storage_queue_endpoint", self.storage_queue())
            .with_attribute("storage_blob_dead_letter_destination", self.dead_letter()),
        ])
    }
}

impl ExistsInAzure for EventSubscriptionFixture {
    fn exists<'a>(
        &'a self,
        provider: &'a AzureRmProvider,
        identifier: &'a str,
    ) -> BoxFuture<'a, ProviderResult<bool>> {
        Box::pin(event_subscription::exists(provider.client(), identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptance::data::TestData;
    use crate::client::memory::InMemoryArm;
    use crate::config::Timeouts;
    use strata_core::provider::Provider;
    use crate::services::eventgrid::event_subscription::{expand, expand_advanced_filters, schema};
    use strata_core::resource::Attributes;

    const RG: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG-eg-1";

    fn fixture() -> EventSubscriptionFixture {
        EventSubscriptionFixture {
            resource_group_id: RG.to_string(),
            storage_account_id: format!("{}/providers/Microsoft.Storage/storageAccounts/acctestacc1", RG),
            queue_name: "mysamplequeue-1".to_string(),
            container_name: "vhds".to_string(),
            eventhub_id: None,
            service_bus_queue_id: Some(format!(
                "{}/providers/Microsoft.ServiceBus/namespaces/ns/queues/q",
                RG
            )),
            service_bus_topic_id: None,
        }
    }

    fn data() -> TestData {
        TestData::build_with_env(TYPE_NAME, "test", |_| None)
    }

    #[test]
    fn every_scenario_passes_schema_validation() {
        let fixture = fixture();
        let data = data();
        let configs = [
            fixture.basic(&data),
            fixture.requires_import(&data),
            fixture.update(&data),
            fixture.filter(&data),
            fixture.advanced_filter(&data),
            fixture.advanced_filter_max_items(&data),
            fixture.identity(&data),
        ];
        for config in configs {
            for resource in &config.resources {
                assert!(
                    schema().validate(&resource.attributes).is_ok(),
                    "{}",
                    config.render()
                );
                assert!(expand(&resource.attributes).is_ok());
            }
        }
    }

    #[test]
    fn optional_endpoints_need_their_prerequisite() {
        let fixture = fixture();
        let data = data();
        assert!(fixture.event_hub_id(&data).is_none());
        let config = fixture.service_bus_queue_id(&data).unwrap();
        let resource = config.resource("test").unwrap();
        assert_eq!(
            resource.attributes.get_str("event_delivery_schema"),
            Some("CloudEventSchemaV1_0")
        );
    }

    #[test]
    fn max_items_scenario_uses_every_value_slot() {
        let config = fixture().advanced_filter_max_items(&data());
        let resource = config.resource("test").unwrap();
        let filter = resource.attributes.get_block("advanced_filter").unwrap();
        assert_eq!(expand_advanced_filters(filter).unwrap().len(), 12);
    }

    #[test]
    fn requires_import_repeats_the_whole_subscription() {
        let config = fixture().requires_import(&data());
        let test = config.resource("test").unwrap();
        let import = config.resource("import").unwrap();
        assert_eq!(test.attributes, import.attributes);
        assert!(config.render().contains("\"import\""));
    }

    #[tokio::test]
    async fn second_create_of_the_same_subscription_requires_import() {
        let arm = InMemoryArm::new();
        let provider = AzureRmProvider::with_client(arm.client(), Timeouts::default());
        let config = fixture().requires_import(&data());

        let state = provider.create(config.resource("test").unwrap()).await.unwrap();
        assert!(state.exists);
        let identifier = state.identifier.unwrap();
        assert!(fixture().exists(&provider, &identifier).await.unwrap());

        let err = provider
            .create(config.resource("import").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_requires_import(), "{}", err);
        assert!(err.message.contains(&identifier));
    }
}
