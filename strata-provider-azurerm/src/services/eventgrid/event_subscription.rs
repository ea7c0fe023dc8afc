//! `eventgrid_event_subscription`
//!
//! Subscribes an endpoint to the events raised at any ARM scope. Exactly one
//! endpoint attribute is set; the endpoint written to the API is picked from
//! whichever attribute is present, and read back from the `endpointType`
//! discriminator.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use strata_core::provider::{ProviderError, ProviderResult, ResourceType};
use strata_core::resource::{Attributes, Resource, ResourceId, State, Value};
use strata_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::models::*;
use super::parse::EventSubscriptionId;
use crate::client::{ArmClient, ArmResultExt};

pub const TYPE_NAME: &str = "eventgrid_event_subscription";
pub const API_VERSION: &str = "2022-06-15";

const MAX_ADVANCED_FILTERS: usize = 25;
const MAX_ADVANCED_FILTER_VALUES: usize = 25;

pub const ENDPOINT_ATTRIBUTES: &[&str] = &[
    "azure_function_endpoint",
    "eventhub_endpoint_id",
    "hybrid_connection_endpoint_id",
    "service_bus_queue_endpoint_id",
    "service_bus_topic_endpoint_id",
    "storage_queue_endpoint",
    "webhook_endpoint",
];

const DELIVERY_SCHEMAS: &[&str] = &["EventGridSchema", "CloudEventSchemaV1_0", "CustomInputSchema"];
const DEFAULT_DELIVERY_SCHEMA: &str = "EventGridSchema";

/// Advanced filter operators in the order they are rendered
const SINGLE_NUMBER_OPERATORS: &[&str] = &[
    "number_greater_than",
    "number_greater_than_or_equals",
    "number_less_than",
    "number_less_than_or_equals",
];
const NUMBER_LIST_OPERATORS: &[&str] = &["number_in", "number_not_in"];
const NUMBER_RANGE_OPERATORS: &[&str] = &["number_in_range", "number_not_in_range"];
const STRING_LIST_OPERATORS: &[&str] = &[
    "string_begins_with",
    "string_not_begins_with",
    "string_ends_with",
    "string_not_ends_with",
    "string_contains",
    "string_not_contains",
    "string_in",
    "string_not_in",
];
const KEY_ONLY_OPERATORS: &[&str] = &["is_not_null", "is_null_or_undefined"];

pub struct EventSubscriptionType;

impl ResourceType for EventSubscriptionType {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }
}

fn validate_name(value: &Value) -> Result<(), String> {
    static PATTERN: LazyLock<Option<Regex>> =
        LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9]{3,64}$").ok());

    let Value::String(name) = value else {
        return Err("Expected string".to_string());
    };
    match PATTERN.as_ref() {
        Some(pattern) if pattern.is_match(name) => Ok(()),
        _ => Err(format!(
            "EventGrid subscription name {:?} must be 3 - 64 characters long, contain only letters, numbers and hyphens",
            name
        )),
    }
}

fn validate_rfc3339(value: &Value) -> Result<(), String> {
    match value {
        Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|_| ())
            .map_err(|e| format!("{:?} is not an RFC3339 timestamp: {}", s, e)),
        _ => Err("Expected string".to_string()),
    }
}

fn identity_block() -> AttributeType {
    AttributeType::Block(
        BlockSchema::single()
            .attribute(
                AttributeSchema::new(
                    "type",
                    AttributeType::enumeration(&["SystemAssigned", "UserAssigned"]),
                )
                .required(),
            )
            .attribute(AttributeSchema::new(
                "user_assigned_identity",
                AttributeType::String,
            )),
    )
}

fn advanced_filter_block() -> AttributeType {
    let key = || AttributeSchema::new("key", AttributeType::String).required();
    let operator = |values: AttributeSchema| {
        AttributeType::Block(BlockSchema::new().attribute(key()).attribute(values))
    };

    let mut block = BlockSchema::single().attribute(AttributeSchema::new(
        "bool_equals",
        operator(AttributeSchema::new("value", AttributeType::Bool).required()),
    ));
    for name in SINGLE_NUMBER_OPERATORS {
        block = block.attribute(AttributeSchema::new(
            *name,
            operator(AttributeSchema::new("value", AttributeType::Float).required()),
        ));
    }
    for name in NUMBER_LIST_OPERATORS {
        block = block.attribute(AttributeSchema::new(
            *name,
            operator(
                AttributeSchema::new("values", AttributeType::list_of(AttributeType::Float))
                    .required(),
            ),
        ));
    }
    for name in NUMBER_RANGE_OPERATORS {
        block = block.attribute(AttributeSchema::new(
            *name,
            operator(
                AttributeSchema::new(
                    "values",
                    AttributeType::list_of(AttributeType::list_of(AttributeType::Float)),
                )
                .required(),
            ),
        ));
    }
    for name in STRING_LIST_OPERATORS {
        block = block.attribute(AttributeSchema::new(
            *name,
            operator(
                AttributeSchema::new("values", AttributeType::list_of(AttributeType::String))
                    .required(),
            ),
        ));
    }
    for name in KEY_ONLY_OPERATORS {
        block = block.attribute(AttributeSchema::new(
            *name,
            AttributeType::Block(BlockSchema::new().attribute(key())),
        ));
    }
    AttributeType::Block(block)
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Manages an EventGrid Event Subscription")
        .attribute(
            AttributeSchema::new(
                "name",
                AttributeType::Custom {
                    name: "EventSubscriptionName".to_string(),
                    base: Box::new(AttributeType::String),
                    validate: validate_name,
                },
            )
            .required()
            .force_new(),
        )
        .attribute(
            AttributeSchema::new("scope", AttributeType::String)
                .required()
                .force_new()
                .with_description("ARM ID of the subscription, resource group or resource to subscribe to"),
        )
        .attribute(
            AttributeSchema::new(
                "event_delivery_schema",
                AttributeType::enumeration(DELIVERY_SCHEMAS),
            )
            .force_new()
            .with_default(Value::String(DEFAULT_DELIVERY_SCHEMA.to_string())),
        )
        .attribute(AttributeSchema::new(
            "expiration_time_utc",
            AttributeType::Custom {
                name: "Rfc3339".to_string(),
                base: Box::new(AttributeType::String),
                validate: validate_rfc3339,
            },
        ))
        .attribute(AttributeSchema::new(
            "azure_function_endpoint",
            AttributeType::Block(
                BlockSchema::single()
                    .attribute(
                        AttributeSchema::new("function_id", types::arm_resource_id()).required(),
                    )
                    .attribute(AttributeSchema::new(
                        "max_events_per_batch",
                        types::int_between::<1, 5000>(),
                    ))
                    .attribute(AttributeSchema::new(
                        "preferred_batch_size_in_kilobytes",
                        types::int_between::<1, 1024>(),
                    )),
            ),
        ))
        .attribute(AttributeSchema::new("eventhub_endpoint_id", types::arm_resource_id()))
        .attribute(AttributeSchema::new(
            "hybrid_connection_endpoint_id",
            types::arm_resource_id(),
        ))
        .attribute(AttributeSchema::new(
            "service_bus_queue_endpoint_id",
            types::arm_resource_id(),
        ))
        .attribute(AttributeSchema::new(
            "service_bus_topic_endpoint_id",
            types::arm_resource_id(),
        ))
        .attribute(AttributeSchema::new(
            "storage_queue_endpoint",
            AttributeType::Block(
                BlockSchema::single()
                    .attribute(
                        AttributeSchema::new("storage_account_id", types::arm_resource_id())
                            .required(),
                    )
                    .attribute(AttributeSchema::new("queue_name", AttributeType::String).required())
                    .attribute(AttributeSchema::new(
                        "queue_message_time_to_live_in_seconds",
                        AttributeType::Int,
                    )),
            ),
        ))
        .attribute(AttributeSchema::new(
            "webhook_endpoint",
            AttributeType::Block(
                BlockSchema::single()
                    .attribute(AttributeSchema::new("url", types::https_url()).required())
                    .attribute(AttributeSchema::new("base_url", AttributeType::String).computed())
                    .attribute(AttributeSchema::new(
                        "max_events_per_batch",
                        types::int_between::<1, 5000>(),
                    ))
                    .attribute(AttributeSchema::new(
                        "preferred_batch_size_in_kilobytes",
                        types::int_between::<1, 1024>(),
                    ))
                    .attribute(AttributeSchema::new(
                        "active_directory_tenant_id",
                        AttributeType::String,
                    ))
                    .attribute(AttributeSchema::new(
                        "active_directory_app_id_or_uri",
                        AttributeType::String,
                    )),
            ),
        ))
        .exactly_one_of(ENDPOINT_ATTRIBUTES)
        .attribute(
            AttributeSchema::new(
                "included_event_types",
                AttributeType::list_of(AttributeType::String),
            )
            .computed(),
        )
        .attribute(AttributeSchema::new(
            "subject_filter",
            AttributeType::Block(
                BlockSchema::single()
                    .attribute(AttributeSchema::new("subject_begins_with", AttributeType::String))
                    .attribute(AttributeSchema::new("subject_ends_with", AttributeType::String))
                    .attribute(AttributeSchema::new("case_sensitive", AttributeType::Bool)),
            ),
        ))
        .attribute(
            AttributeSchema::new("advanced_filtering_on_arrays_enabled", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
        .attribute(AttributeSchema::new("advanced_filter", advanced_filter_block()))
        .attribute(AttributeSchema::new(
            "storage_blob_dead_letter_destination",
            AttributeType::Block(
                BlockSchema::single()
                    .attribute(
                        AttributeSchema::new("storage_account_id", types::arm_resource_id())
                            .required(),
                    )
                    .attribute(
                        AttributeSchema::new("storage_blob_container_name", AttributeType::String)
                            .required(),
                    ),
            ),
        ))
        .attribute(AttributeSchema::new(
            "retry_policy",
            AttributeType::Block(
                BlockSchema::single()
                    .attribute(
                        AttributeSchema::new("max_delivery_attempts", types::int_between::<1, 30>())
                            .required(),
                    )
                    .attribute(
                        AttributeSchema::new("event_time_to_live", types::int_between::<1, 1440>())
                            .required()
                            .with_description("Minutes"),
                    ),
            ),
        ))
        .attribute(AttributeSchema::new(
            "labels",
            AttributeType::list_of(AttributeType::String),
        ))
        .attribute(AttributeSchema::new("delivery_identity", identity_block()))
        .attribute(AttributeSchema::new("dead_letter_identity", identity_block()))
}

// =============================================================================
// Expand: attributes -> API model
// =============================================================================

fn validation(message: impl Into<String>) -> ProviderError {
    ProviderError::validation(message)
}

fn required_str<'a>(block: &'a HashMap<String, Value>, key: &str, owner: &str) -> ProviderResult<&'a str> {
    block
        .get_str(key)
        .ok_or_else(|| validation(format!("`{}` requires `{}`", owner, key)))
}

/// Properties to PUT (or PATCH) for the configured subscription
pub fn expand(attributes: &HashMap<String, Value>) -> ProviderResult<EventSubscriptionProperties> {
    let destination = expand_destination(attributes)?;
    let dead_letter = expand_dead_letter(attributes)?;

    let mut properties = EventSubscriptionProperties {
        filter: Some(expand_filter(attributes)?),
        labels: Some(attributes.get_strings("labels")),
        expiration_time_utc: attributes.get_str("expiration_time_utc").map(str::to_string),
        event_delivery_schema: Some(
            attributes
                .get_str("event_delivery_schema")
                .unwrap_or(DEFAULT_DELIVERY_SCHEMA)
                .to_string(),
        ),
        retry_policy: attributes.get_block("retry_policy").map(|policy| RetryPolicy {
            max_delivery_attempts: policy.get_int("max_delivery_attempts"),
            event_time_to_live_in_minutes: policy.get_int("event_time_to_live"),
        }),
        ..Default::default()
    };

    match expand_identity(attributes.get_block("delivery_identity")) {
        Some(identity) => {
            properties.delivery_with_resource_identity = Some(DeliveryWithResourceIdentity {
                identity: Some(identity),
                destination: Some(destination),
            })
        }
        None => properties.destination = Some(destination),
    }

    match (
        expand_identity(attributes.get_block("dead_letter_identity")),
        dead_letter,
    ) {
        (Some(identity), Some(dead_letter)) => {
            properties.dead_letter_with_resource_identity = Some(DeadLetterWithResourceIdentity {
                identity: Some(identity),
                dead_letter_destination: Some(dead_letter),
            })
        }
        (Some(_), None) => {
            return Err(validation(
                "`dead_letter_identity` requires `storage_blob_dead_letter_destination`",
            ));
        }
        (None, dead_letter) => properties.dead_letter_destination = dead_letter,
    }

    Ok(properties)
}

fn expand_destination(
    attributes: &HashMap<String, Value>,
) -> ProviderResult<EventSubscriptionDestination> {
    let resource_id = |key: &str| {
        attributes
            .get_str(key)
            .map(|id| ResourceIdDestinationProperties {
                resource_id: Some(id.to_string()),
            })
    };

    if let Some(function) = attributes.get_block("azure_function_endpoint") {
        return Ok(EventSubscriptionDestination::AzureFunction(
            AzureFunctionDestinationProperties {
                resource_id: Some(
                    required_str(function, "function_id", "azure_function_endpoint")?.to_string(),
                ),
                max_events_per_batch: function.get_int("max_events_per_batch"),
                preferred_batch_size_in_kilobytes: function
                    .get_int("preferred_batch_size_in_kilobytes"),
            },
        ));
    }
    if let Some(props) = resource_id("eventhub_endpoint_id") {
        return Ok(EventSubscriptionDestination::EventHub(props));
    }
    if let Some(props) = resource_id("hybrid_connection_endpoint_id") {
        return Ok(EventSubscriptionDestination::HybridConnection(props));
    }
    if let Some(props) = resource_id("service_bus_queue_endpoint_id") {
        return Ok(EventSubscriptionDestination::ServiceBusQueue(props));
    }
    if let Some(props) = resource_id("service_bus_topic_endpoint_id") {
        return Ok(EventSubscriptionDestination::ServiceBusTopic(props));
    }
    if let Some(queue) = attributes.get_block("storage_queue_endpoint") {
        return Ok(EventSubscriptionDestination::StorageQueue(
            StorageQueueDestinationProperties {
                resource_id: Some(
                    required_str(queue, "storage_account_id", "storage_queue_endpoint")?
                        .to_string(),
                ),
                queue_name: Some(
                    required_str(queue, "queue_name", "storage_queue_endpoint")?.to_string(),
                ),
                queue_message_time_to_live_in_seconds: queue
                    .get_int("queue_message_time_to_live_in_seconds"),
            },
        ));
    }
    if let Some(webhook) = attributes.get_block("webhook_endpoint") {
        return Ok(EventSubscriptionDestination::WebHook(
            WebHookDestinationProperties {
                endpoint_url: Some(required_str(webhook, "url", "webhook_endpoint")?.to_string()),
                endpoint_base_url: None,
                max_events_per_batch: webhook.get_int("max_events_per_batch"),
                preferred_batch_size_in_kilobytes: webhook
                    .get_int("preferred_batch_size_in_kilobytes"),
                active_directory_tenant_id: webhook
                    .get_str("active_directory_tenant_id")
                    .map(str::to_string),
                active_directory_app_id_or_uri: webhook
                    .get_str("active_directory_app_id_or_uri")
                    .map(str::to_string),
            },
        ));
    }

    Err(validation(format!(
        "one of `{}` must be specified",
        ENDPOINT_ATTRIBUTES.join("`, `")
    )))
}

fn expand_dead_letter(
    attributes: &HashMap<String, Value>,
) -> ProviderResult<Option<DeadLetterDestination>> {
    let Some(block) = attributes.get_block("storage_blob_dead_letter_destination") else {
        return Ok(None);
    };
    const OWNER: &str = "storage_blob_dead_letter_destination";
    Ok(Some(DeadLetterDestination::StorageBlob(
        StorageBlobDeadLetterDestinationProperties {
            resource_id: Some(required_str(block, "storage_account_id", OWNER)?.to_string()),
            blob_container_name: Some(
                required_str(block, "storage_blob_container_name", OWNER)?.to_string(),
            ),
        },
    )))
}

fn expand_identity(block: Option<&HashMap<String, Value>>) -> Option<EventSubscriptionIdentity> {
    let block = block?;
    Some(EventSubscriptionIdentity {
        identity_type: block.get_str("type").unwrap_or("SystemAssigned").to_string(),
        user_assigned_identity: block.get_str("user_assigned_identity").map(str::to_string),
    })
}

fn expand_filter(attributes: &HashMap<String, Value>) -> ProviderResult<EventSubscriptionFilter> {
    let mut filter = EventSubscriptionFilter {
        enable_advanced_filtering_on_arrays: Some(
            attributes
                .get_bool("advanced_filtering_on_arrays_enabled")
                .unwrap_or(false),
        ),
        ..Default::default()
    };

    if attributes.contains_key("included_event_types") {
        filter.included_event_types = Some(attributes.get_strings("included_event_types"));
    }
    if let Some(subject) = attributes.get_block("subject_filter") {
        filter.subject_begins_with = subject.get_str("subject_begins_with").map(str::to_string);
        filter.subject_ends_with = subject.get_str("subject_ends_with").map(str::to_string);
        filter.is_subject_case_sensitive = subject.get_bool("case_sensitive");
    }
    if let Some(advanced) = attributes.get_block("advanced_filter") {
        filter.advanced_filters = Some(expand_advanced_filters(advanced)?);
    }
    Ok(filter)
}

fn float_values(values: &[Value], operator: &str) -> ProviderResult<Vec<f64>> {
    values
        .iter()
        .map(|v| {
            v.as_float()
                .ok_or_else(|| validation(format!("`{}` values must be numbers", operator)))
        })
        .collect()
}

fn range_values(values: &[Value], operator: &str) -> ProviderResult<Vec<[f64; 2]>> {
    values
        .iter()
        .map(|range| match range.as_list().map(|r| float_values(r, operator)) {
            Some(Ok(bounds)) if bounds.len() == 2 => Ok([bounds[0], bounds[1]]),
            Some(Err(e)) => Err(e),
            _ => Err(validation(format!(
                "`{}` values must be pairs of numbers",
                operator
            ))),
        })
        .collect()
}

/// Build advanced filters, enforcing the per-subscription limits
pub fn expand_advanced_filters(
    block: &HashMap<String, Value>,
) -> ProviderResult<Vec<AdvancedFilter>> {
    let mut filters = Vec::new();

    let operators = std::iter::once("bool_equals")
        .chain(SINGLE_NUMBER_OPERATORS.iter().copied())
        .chain(NUMBER_LIST_OPERATORS.iter().copied())
        .chain(NUMBER_RANGE_OPERATORS.iter().copied())
        .chain(STRING_LIST_OPERATORS.iter().copied())
        .chain(KEY_ONLY_OPERATORS.iter().copied());

    for operator in operators {
        for item in block.get_blocks(operator) {
            let key = required_str(item, "key", operator)?.to_string();
            let number = || {
                item.get_float("value")
                    .ok_or_else(|| validation(format!("`{}` requires a numeric `value`", operator)))
            };
            let values = || item.get_list("values").unwrap_or_default();
            let strings = || item.get_strings("values");

            let filter = match operator {
                "bool_equals" => AdvancedFilter::BoolEquals {
                    key,
                    value: item.get_bool("value").ok_or_else(|| {
                        validation("`bool_equals` requires a boolean `value`")
                    })?,
                },
                "number_greater_than" => AdvancedFilter::NumberGreaterThan { key, value: number()? },
                "number_greater_than_or_equals" => {
                    AdvancedFilter::NumberGreaterThanOrEquals { key, value: number()? }
                }
                "number_less_than" => AdvancedFilter::NumberLessThan { key, value: number()? },
                "number_less_than_or_equals" => {
                    AdvancedFilter::NumberLessThanOrEquals { key, value: number()? }
                }
                "number_in" => AdvancedFilter::NumberIn {
                    key,
                    values: float_values(values(), operator)?,
                },
                "number_not_in" => AdvancedFilter::NumberNotIn {
                    key,
                    values: float_values(values(), operator)?,
                },
                "number_in_range" => AdvancedFilter::NumberInRange {
                    key,
                    values: range_values(values(), operator)?,
                },
                "number_not_in_range" => AdvancedFilter::NumberNotInRange {
                    key,
                    values: range_values(values(), operator)?,
                },
                "string_begins_with" => AdvancedFilter::StringBeginsWith { key, values: strings() },
                "string_not_begins_with" => {
                    AdvancedFilter::StringNotBeginsWith { key, values: strings() }
                }
                "string_ends_with" => AdvancedFilter::StringEndsWith { key, values: strings() },
                "string_not_ends_with" => {
                    AdvancedFilter::StringNotEndsWith { key, values: strings() }
                }
                "string_contains" => AdvancedFilter::StringContains { key, values: strings() },
                "string_not_contains" => {
                    AdvancedFilter::StringNotContains { key, values: strings() }
                }
                "string_in" => AdvancedFilter::StringIn { key, values: strings() },
                "string_not_in" => AdvancedFilter::StringNotIn { key, values: strings() },
                "is_not_null" => AdvancedFilter::IsNotNull { key },
                _ => AdvancedFilter::IsNullOrUndefined { key },
            };
            filters.push(filter);
        }
    }

    if filters.len() > MAX_ADVANCED_FILTERS {
        return Err(validation(format!(
            "`advanced_filter` may contain at most {} filters, got {}",
            MAX_ADVANCED_FILTERS,
            filters.len()
        )));
    }
    let total_values: usize = filters.iter().map(AdvancedFilter::value_count).sum();
    if total_values > MAX_ADVANCED_FILTER_VALUES {
        return Err(validation(format!(
            "`advanced_filter` may contain at most {} values in total, got {}",
            MAX_ADVANCED_FILTER_VALUES, total_values
        )));
    }
    Ok(filters)
}

// =============================================================================
// Flatten: API model -> attributes
// =============================================================================

fn insert_opt(map: &mut HashMap<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

fn text(value: &Option<String>) -> Option<Value> {
    value.clone().map(Value::String)
}

/// Attributes for a subscription read from the API
///
/// `prior` supplies write-only values (the webhook URL) the API never returns.
pub fn flatten(
    id: &EventSubscriptionId,
    properties: &EventSubscriptionProperties,
    prior: Option<&HashMap<String, Value>>,
) -> HashMap<String, Value> {
    let mut attributes = HashMap::from([
        ("name".to_string(), Value::String(id.name.clone())),
        ("scope".to_string(), Value::String(id.scope.clone())),
        (
            "event_delivery_schema".to_string(),
            Value::String(
                properties
                    .event_delivery_schema
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DELIVERY_SCHEMA.to_string()),
            ),
        ),
    ]);
    insert_opt(
        &mut attributes,
        "expiration_time_utc",
        text(&properties.expiration_time_utc),
    );

    if let Some(destination) = properties.effective_destination() {
        let prior_url = prior
            .and_then(|p| p.get_block("webhook_endpoint"))
            .and_then(|w| w.get_str("url"));
        let (key, value) = flatten_destination(destination, prior_url);
        attributes.insert(key.to_string(), value);
    }

    if let Some(filter) = &properties.filter {
        flatten_filter(filter, &mut attributes);
    }

    if let Some(labels) = properties.labels.as_ref().filter(|l| !l.is_empty()) {
        attributes.insert("labels".to_string(), Value::string_list(labels.iter().cloned()));
    }

    if let Some(policy) = &properties.retry_policy {
        let mut block = HashMap::new();
        insert_opt(
            &mut block,
            "max_delivery_attempts",
            policy.max_delivery_attempts.map(Value::Int),
        );
        insert_opt(
            &mut block,
            "event_time_to_live",
            policy.event_time_to_live_in_minutes.map(Value::Int),
        );
        attributes.insert("retry_policy".to_string(), Value::block(block));
    }

    if let Some(DeadLetterDestination::StorageBlob(blob)) =
        properties.effective_dead_letter_destination()
    {
        let mut block = HashMap::new();
        insert_opt(&mut block, "storage_account_id", text(&blob.resource_id));
        insert_opt(
            &mut block,
            "storage_blob_container_name",
            text(&blob.blob_container_name),
        );
        attributes.insert(
            "storage_blob_dead_letter_destination".to_string(),
            Value::block(block),
        );
    }

    let delivery_identity = properties
        .delivery_with_resource_identity
        .as_ref()
        .and_then(|d| d.identity.as_ref());
    insert_opt(
        &mut attributes,
        "delivery_identity",
        delivery_identity.map(flatten_identity),
    );
    let dead_letter_identity = properties
        .dead_letter_with_resource_identity
        .as_ref()
        .and_then(|d| d.identity.as_ref());
    insert_opt(
        &mut attributes,
        "dead_letter_identity",
        dead_letter_identity.map(flatten_identity),
    );

    attributes
}

fn flatten_identity(identity: &EventSubscriptionIdentity) -> Value {
    let mut block = HashMap::from([(
        "type".to_string(),
        Value::String(identity.identity_type.clone()),
    )]);
    insert_opt(
        &mut block,
        "user_assigned_identity",
        text(&identity.user_assigned_identity),
    );
    Value::block(block)
}

fn flatten_destination(
    destination: &EventSubscriptionDestination,
    prior_webhook_url: Option<&str>,
) -> (&'static str, Value) {
    let resource_id = |props: &ResourceIdDestinationProperties| {
        Value::String(props.resource_id.clone().unwrap_or_default())
    };
    match destination {
        EventSubscriptionDestination::EventHub(props) => ("eventhub_endpoint_id", resource_id(props)),
        EventSubscriptionDestination::HybridConnection(props) => {
            ("hybrid_connection_endpoint_id", resource_id(props))
        }
        EventSubscriptionDestination::ServiceBusQueue(props) => {
            ("service_bus_queue_endpoint_id", resource_id(props))
        }
        EventSubscriptionDestination::ServiceBusTopic(props) => {
            ("service_bus_topic_endpoint_id", resource_id(props))
        }
        EventSubscriptionDestination::AzureFunction(props) => {
            let mut block = HashMap::new();
            insert_opt(&mut block, "function_id", text(&props.resource_id));
            insert_opt(
                &mut block,
                "max_events_per_batch",
                props.max_events_per_batch.map(Value::Int),
            );
            insert_opt(
                &mut block,
                "preferred_batch_size_in_kilobytes",
                props.preferred_batch_size_in_kilobytes.map(Value::Int),
            );
            ("azure_function_endpoint", Value::block(block))
        }
        EventSubscriptionDestination::StorageQueue(props) => {
            let mut block = HashMap::new();
            insert_opt(&mut block, "storage_account_id", text(&props.resource_id));
            insert_opt(&mut block, "queue_name", text(&props.queue_name));
            insert_opt(
                &mut block,
                "queue_message_time_to_live_in_seconds",
                props.queue_message_time_to_live_in_seconds.map(Value::Int),
            );
            ("storage_queue_endpoint", Value::block(block))
        }
        EventSubscriptionDestination::WebHook(props) => {
            let mut block = HashMap::new();
            let url = prior_webhook_url
                .map(str::to_string)
                .or_else(|| props.endpoint_url.clone())
                .or_else(|| props.endpoint_base_url.clone());
            insert_opt(&mut block, "url", url.map(Value::String));
            insert_opt(&mut block, "base_url", text(&props.endpoint_base_url));
            insert_opt(
                &mut block,
                "max_events_per_batch",
                props.max_events_per_batch.map(Value::Int),
            );
            insert_opt(
                &mut block,
                "preferred_batch_size_in_kilobytes",
                props.preferred_batch_size_in_kilobytes.map(Value::Int),
            );
            insert_opt(
                &mut block,
                "active_directory_tenant_id",
                text(&props.active_directory_tenant_id),
            );
            insert_opt(
                &mut block,
                "active_directory_app_id_or_uri",
                text(&props.active_directory_app_id_or_uri),
            );
            ("webhook_endpoint", Value::block(block))
        }
    }
}

fn flatten_filter(filter: &EventSubscriptionFilter, attributes: &mut HashMap<String, Value>) {
    if let Some(types) = &filter.included_event_types {
        attributes.insert(
            "included_event_types".to_string(),
            Value::string_list(types.iter().cloned()),
        );
    }

    if filter.subject_begins_with.as_deref().is_some_and(|s| !s.is_empty())
        || filter.subject_ends_with.as_deref().is_some_and(|s| !s.is_empty())
    {
        let mut block = HashMap::new();
        insert_opt(&mut block, "subject_begins_with", text(&filter.subject_begins_with));
        insert_opt(&mut block, "subject_ends_with", text(&filter.subject_ends_with));
        insert_opt(
            &mut block,
            "case_sensitive",
            filter.is_subject_case_sensitive.map(Value::Bool),
        );
        attributes.insert("subject_filter".to_string(), Value::block(block));
    }

    attributes.insert(
        "advanced_filtering_on_arrays_enabled".to_string(),
        Value::Bool(filter.enable_advanced_filtering_on_arrays.unwrap_or(false)),
    );

    if let Some(filters) = filter.advanced_filters.as_ref().filter(|f| !f.is_empty()) {
        attributes.insert(
            "advanced_filter".to_string(),
            flatten_advanced_filters(filters),
        );
    }
}

fn flatten_advanced_filters(filters: &[AdvancedFilter]) -> Value {
    let mut operators: HashMap<String, Vec<Value>> = HashMap::new();

    for filter in filters {
        let floats = |values: &[f64]| Value::List(values.iter().copied().map(Value::Float).collect());
        let strings = |values: &[String]| Value::string_list(values.iter().cloned());
        let ranges = |values: &[[f64; 2]]| {
            Value::List(values.iter().map(|range| floats(&range[..])).collect())
        };

        let (operator, key, value) = match filter {
            AdvancedFilter::BoolEquals { key, value } => {
                ("bool_equals", key, Some(("value", Value::Bool(*value))))
            }
            AdvancedFilter::NumberGreaterThan { key, value } => {
                ("number_greater_than", key, Some(("value", Value::Float(*value))))
            }
            AdvancedFilter::NumberGreaterThanOrEquals { key, value } => (
                "number_greater_than_or_equals",
                key,
                Some(("value", Value::Float(*value))),
            ),
            AdvancedFilter::NumberLessThan { key, value } => {
                ("number_less_than", key, Some(("value", Value::Float(*value))))
            }
            AdvancedFilter::NumberLessThanOrEquals { key, value } => (
                "number_less_than_or_equals",
                key,
                Some(("value", Value::Float(*value))),
            ),
            AdvancedFilter::NumberIn { key, values } => {
                ("number_in", key, Some(("values", floats(values))))
            }
            AdvancedFilter::NumberNotIn { key, values } => {
                ("number_not_in", key, Some(("values", floats(values))))
            }
            AdvancedFilter::NumberInRange { key, values } => {
                ("number_in_range", key, Some(("values", ranges(values))))
            }
            AdvancedFilter::NumberNotInRange { key, values } => {
                ("number_not_in_range", key, Some(("values", ranges(values))))
            }
            AdvancedFilter::StringBeginsWith { key, values } => {
                ("string_begins_with", key, Some(("values", strings(values))))
            }
            AdvancedFilter::StringNotBeginsWith { key, values } => {
                ("string_not_begins_with", key, Some(("values", strings(values))))
            }
            AdvancedFilter::StringEndsWith { key, values } => {
                ("string_ends_with", key, Some(("values", strings(values))))
            }
            AdvancedFilter::StringNotEndsWith { key, values } => {
                ("string_not_ends_with", key, Some(("values", strings(values))))
            }
            AdvancedFilter::StringContains { key, values } => {
                ("string_contains", key, Some(("values", strings(values))))
            }
            AdvancedFilter::StringNotContains { key, values } => {
                ("string_not_contains", key, Some(("values", strings(values))))
            }
            AdvancedFilter::StringIn { key, values } => {
                ("string_in", key, Some(("values", strings(values))))
            }
            AdvancedFilter::StringNotIn { key, values } => {
                ("string_not_in", key, Some(("values", strings(values))))
            }
            AdvancedFilter::IsNotNull { key } => ("is_not_null", key, None),
            AdvancedFilter::IsNullOrUndefined { key } => ("is_null_or_undefined", key, None),
        };

        let mut item = HashMap::from([("key".to_string(), Value::String(key.clone()))]);
        if let Some((name, value)) = value {
            item.insert(name.to_string(), value);
        }
        operators
            .entry(operator.to_string())
            .or_default()
            .push(Value::Map(item));
    }

    Value::block(
        operators
            .into_iter()
            .map(|(operator, items)| (operator, Value::List(items)))
            .collect(),
    )
}

// =============================================================================
// CRUD
// =============================================================================

fn describe(id: &EventSubscriptionId) -> String {
    format!("EventGrid Event Subscription {:?} (scope {:?})", id.name, id.scope)
}

fn subscription_id_from(attributes: &HashMap<String, Value>) -> ProviderResult<EventSubscriptionId> {
    let scope = attributes
        .get_str("scope")
        .ok_or_else(|| validation("'scope' is required"))?;
    let name = attributes
        .get_str("name")
        .ok_or_else(|| validation("'name' is required"))?;
    Ok(EventSubscriptionId::new(scope, name))
}

pub async fn create(client: &ArmClient, resource: &Resource) -> ProviderResult<State> {
    let attributes = &resource.attributes;
    let id = subscription_id_from(attributes).map_err(|e| e.for_resource(resource.id.clone()))?;
    let path = id.to_string();

    let existing = client
        .get::<EventSubscription>(&path, API_VERSION)
        .await
        .context(|| format!("checking for presence of existing {}", describe(&id)))
        .map_err(|e| e.for_resource(resource.id.clone()))?;
    if existing.is_some_and(|s| s.id.is_some()) {
        return Err(ProviderError::requires_import(TYPE_NAME, &path).for_resource(resource.id.clone()));
    }

    let properties = expand(attributes).map_err(|e| e.for_resource(resource.id.clone()))?;
    log::info!("Creating {}", describe(&id));
    let body = EventSubscription {
        properties: Some(properties),
        ..Default::default()
    };
    client
        .put(&path, API_VERSION, &body)
        .await
        .context(|| format!("creating {}", describe(&id)))
        .map_err(|e| e.for_resource(resource.id.clone()))?;

    read_with_prior(client, &resource.id, &id, Some(attributes)).await
}

pub async fn read(client: &ArmClient, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
    let subscription_id = EventSubscriptionId::parse(identifier)
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    read_with_prior(client, id, &subscription_id, None).await
}

async fn read_with_prior(
    client: &ArmClient,
    id: &ResourceId,
    subscription_id: &EventSubscriptionId,
    prior: Option<&HashMap<String, Value>>,
) -> ProviderResult<State> {
    let path = subscription_id.to_string();
    let response = client
        .get::<EventSubscription>(&path, API_VERSION)
        .await
        .context(|| format!("retrieving {}", describe(subscription_id)))
        .map_err(|e| e.for_resource(id.clone()))?;

    let Some(properties) = response.and_then(|s| s.properties) else {
        log::info!("{} was not found - removing from state", describe(subscription_id));
        return Ok(State::not_found(id.clone()));
    };

    let attributes = flatten(subscription_id, &properties, prior);
    Ok(State::existing(id.clone(), attributes).with_identifier(path))
}

/// Updates PATCH the mutable properties
pub async fn update(
    client: &ArmClient,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let subscription_id = EventSubscriptionId::parse(identifier)
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    let properties = expand(&to.attributes).map_err(|e| e.for_resource(id.clone()))?;

    log::info!("Updating {}", describe(&subscription_id));
    client
        .patch(identifier, API_VERSION, &properties)
        .await
        .context(|| format!("updating {}", describe(&subscription_id)))
        .map_err(|e| e.for_resource(id.clone()))?;

    read_with_prior(client, id, &subscription_id, Some(&to.attributes)).await
}

pub async fn delete(client: &ArmClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    let subscription_id = EventSubscriptionId::parse(identifier)
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    log::info!("Deleting {}", describe(&subscription_id));
    client
        .delete(&subscription_id.to_string(), API_VERSION, None)
        .await
        .context(|| format!("deleting {}", describe(&subscription_id)))
        .map_err(|e| e.for_resource(id.clone()))
}

pub async fn exists(client: &ArmClient, identifier: &str) -> ProviderResult<bool> {
    let subscription_id = EventSubscriptionId::parse(identifier)?;
    let response = client
        .get::<EventSubscription>(&subscription_id.to_string(), API_VERSION)
        .await
        .context(|| format!("retrieving {}", describe(&subscription_id)))?;
    Ok(response.is_some_and(|s| s.properties.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::client::memory::InMemoryArm;
    use serde_json::json;
    use strata_core::provider::ProviderErrorKind;

    const SCOPE: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG-eg-1";
    const STORAGE: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG-eg-1/providers/Microsoft.Storage/storageAccounts/acctestacc1";

    fn block(entries: &[(&str, Value)]) -> Value {
        Value::block(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn s(value: &str) -> Value {
        Value::String(value.to_string())
    }

    fn basic() -> Resource {
        Resource::new(TYPE_NAME, "test")
            .with_attribute("name", s("acctesteg-1"))
            .with_attribute("scope", s(SCOPE))
            .with_attribute(
                "storage_queue_endpoint",
                block(&[
                    ("storage_account_id", s(STORAGE)),
                    ("queue_name", s("mysamplequeue-1")),
                ]),
            )
            .with_attribute(
                "storage_blob_dead_letter_destination",
                block(&[
                    ("storage_account_id", s(STORAGE)),
                    ("storage_blob_container_name", s("vhds")),
                ]),
            )
            .with_attribute(
                "retry_policy",
                block(&[
                    ("event_time_to_live", Value::Int(11)),
                    ("max_delivery_attempts", Value::Int(11)),
                ]),
            )
            .with_attribute("labels", Value::string_list(["test", "test1", "test2"]))
    }

    fn subscription_path() -> String {
        format!("{}/providers/Microsoft.EventGrid/eventSubscriptions/acctesteg-1", SCOPE)
    }

    #[test]
    fn schema_accepts_basic_configuration() {
        assert!(schema().validate(&basic().attributes).is_ok());
    }

    #[test]
    fn schema_requires_exactly_one_endpoint() {
        let mut attributes = basic().attributes;
        attributes.insert("eventhub_endpoint_id".to_string(), s(STORAGE));
        assert!(schema().validate(&attributes).is_err());

        attributes.remove("eventhub_endpoint_id");
        attributes.remove("storage_queue_endpoint");
        assert!(schema().validate(&attributes).is_err());
    }

    #[test]
    fn schema_enforces_name_and_retry_bounds() {
        let mut attributes = basic().attributes;
        attributes.insert("name".to_string(), s("a_b"));
        assert!(schema().validate(&attributes).is_err());

        let mut attributes = basic().attributes;
        attributes.insert(
            "retry_policy".to_string(),
            block(&[
                ("event_time_to_live", Value::Int(1441)),
                ("max_delivery_attempts", Value::Int(11)),
            ]),
        );
        assert!(schema().validate(&attributes).is_err());

        let mut attributes = basic().attributes;
        attributes.insert("expiration_time_utc".to_string(), s("tomorrow"));
        assert!(schema().validate(&attributes).is_err());
        attributes.insert("expiration_time_utc".to_string(), s("2030-01-01T00:00:00Z"));
        assert!(schema().validate(&attributes).is_ok());
    }

    #[test]
    fn expand_basic_configuration() {
        let properties = expand(&basic().attributes).unwrap();
        assert_eq!(
            serde_json::to_value(&properties).unwrap(),
            json!({
                "destination": {
                    "endpointType": "StorageQueue",
                    "properties": {"resourceId": STORAGE, "queueName": "mysamplequeue-1"}
                },
                "filter": {"enableAdvancedFilteringOnArrays": false},
                "labels": ["test", "test1", "test2"],
                "eventDeliverySchema": "EventGridSchema",
                "retryPolicy": {"maxDeliveryAttempts": 11, "eventTimeToLiveInMinutes": 11},
                "deadLetterDestination": {
                    "endpointType": "StorageBlob",
                    "properties": {"resourceId": STORAGE, "blobContainerName": "vhds"}
                }
            })
        );
    }

    #[test]
    fn identities_wrap_destinations() {
        let resource = basic()
            .with_attribute("delivery_identity", block(&[("type", s("SystemAssigned"))]))
            .with_attribute("dead_letter_identity", block(&[("type", s("SystemAssigned"))]));
        let properties = expand(&resource.attributes).unwrap();
        assert!(properties.destination.is_none());
        assert!(properties.dead_letter_destination.is_none());
        let body = serde_json::to_value(&properties).unwrap();
        assert_eq!(
            body["deliveryWithResourceIdentity"]["identity"],
            json!({"type": "SystemAssigned"})
        );
        assert_eq!(
            body["deadLetterWithResourceIdentity"]["deadLetterDestination"]["endpointType"],
            json!("StorageBlob")
        );

        let id = EventSubscriptionId::parse(&subscription_path()).unwrap();
        let attributes = flatten(&id, &properties, None);
        assert!(attributes.contains_key("storage_queue_endpoint"));
        assert!(attributes.contains_key("storage_blob_dead_letter_destination"));
        assert_eq!(
            attributes
                .get_block("delivery_identity")
                .and_then(|b| b.get_str("type")),
            Some("SystemAssigned")
        );
    }

    #[test]
    fn dead_letter_identity_needs_a_destination() {
        let mut attributes = basic().attributes;
        attributes.remove("storage_blob_dead_letter_destination");
        attributes.insert(
            "dead_letter_identity".to_string(),
            block(&[("type", s("SystemAssigned"))]),
        );
        let err = expand(&attributes).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Validation);
    }

    fn filter_items(items: &[(&str, Value)]) -> HashMap<String, Value> {
        items
            .iter()
            .map(|(operator, value)| (operator.to_string(), value.clone()))
            .collect()
    }

    fn keyed(key: &str, name: &str, value: Value) -> Value {
        Value::List(vec![Value::Map(HashMap::from([
            ("key".to_string(), s(key)),
            (name.to_string(), value),
        ]))])
    }

    fn numbers(values: &[i64]) -> Value {
        Value::List(values.iter().map(|v| Value::Int(*v)).collect())
    }

    #[test]
    fn advanced_filters_expand_in_operator_order() {
        let block = filter_items(&[
            ("string_begins_with", keyed("subject", "values", Value::string_list(["foo"]))),
            ("bool_equals", keyed("subject", "value", Value::Bool(true))),
            (
                "number_in_range",
                keyed(
                    "data.contentLength",
                    "values",
                    Value::List(vec![numbers(&[0, 1]), numbers(&[2, 3])]),
                ),
            ),
            (
                "is_not_null",
                Value::List(vec![Value::Map(HashMap::from([(
                    "key".to_string(),
                    s("subject"),
                )]))]),
            ),
        ]);
        let filters = expand_advanced_filters(&block).unwrap();
        assert_eq!(
            filters,
            vec![
                AdvancedFilter::BoolEquals {
                    key: "subject".to_string(),
                    value: true
                },
                AdvancedFilter::NumberInRange {
                    key: "data.contentLength".to_string(),
                    values: vec![[0.0, 1.0], [2.0, 3.0]],
                },
                AdvancedFilter::StringBeginsWith {
                    key: "subject".to_string(),
                    values: vec!["foo".to_string()],
                },
                AdvancedFilter::IsNotNull {
                    key: "subject".to_string()
                },
            ]
        );
    }

    #[test]
    fn advanced_filter_value_limit() {
        // 5 single-value filters plus 20 list values is exactly the limit
        let at_limit = filter_items(&[
            ("bool_equals", keyed("subject", "value", Value::Bool(true))),
            ("number_greater_than", keyed("a", "value", Value::Int(2))),
            ("number_greater_than_or_equals", keyed("b", "value", Value::Int(3))),
            ("number_less_than", keyed("c", "value", Value::Int(4))),
            ("number_less_than_or_equals", keyed("d", "value", Value::Int(5))),
            ("number_in", keyed("e", "values", numbers(&[6, 7, 8]))),
            ("number_not_in", keyed("f", "values", numbers(&[9, 10, 11]))),
            ("string_begins_with", keyed("g", "values", Value::string_list(["12", "13", "14"]))),
            ("string_ends_with", keyed("h", "values", Value::string_list(["15", "16", "17"]))),
            ("string_contains", keyed("i", "values", Value::string_list(["18", "19", "20"]))),
            ("string_in", keyed("j", "values", Value::string_list(["21", "22", "23"]))),
            ("string_not_in", keyed("k", "values", Value::string_list(["24", "25"]))),
        ]);
        assert_eq!(expand_advanced_filters(&at_limit).unwrap().len(), 12);

        let mut over = at_limit.clone();
        over.insert(
            "string_not_in".to_string(),
            keyed("k", "values", Value::string_list(["24", "25", "26"])),
        );
        let err = expand_advanced_filters(&over).unwrap_err();
        assert!(err.message.contains("at most 25 values"), "{}", err.message);
    }

    #[test]
    fn advanced_filter_count_limit() {
        let many: Vec<Value> = (0..26)
            .map(|i| {
                Value::Map(HashMap::from([("key".to_string(), s(&format!("data.k{}", i)))]))
            })
            .collect();
        let block = filter_items(&[("is_not_null", Value::List(many))]);
        let err = expand_advanced_filters(&block).unwrap_err();
        assert!(err.message.contains("at most 25 filters"), "{}", err.message);
    }

    #[test]
    fn flatten_groups_advanced_filters_by_operator() {
        let filters = vec![
            AdvancedFilter::StringIn {
                key: "data.blobType".to_string(),
                values: vec!["Block".to_string()],
            },
            AdvancedFilter::StringIn {
                key: "data.other".to_string(),
                values: vec!["x".to_string()],
            },
            AdvancedFilter::NumberNotInRange {
                key: "data.contentLength".to_string(),
                values: vec![[5.0, 13.0]],
            },
        ];
        let value = flatten_advanced_filters(&filters);
        let block = value.as_block().unwrap();
        assert_eq!(block.get_blocks("string_in").len(), 2);
        assert_eq!(
            block.get_blocks("number_not_in_range")[0].get("values"),
            Some(&Value::List(vec![Value::List(vec![
                Value::Float(5.0),
                Value::Float(13.0)
            ])]))
        );
    }

    #[test]
    fn flatten_prefers_configured_webhook_url() {
        let properties = EventSubscriptionProperties {
            destination: Some(EventSubscriptionDestination::WebHook(
                WebHookDestinationProperties {
                    endpoint_base_url: Some("https://hooks.example.com/api".to_string()),
                    ..Default::default()
                },
            )),
            ..Default::default()
        };
        let id = EventSubscriptionId::parse(&subscription_path()).unwrap();
        let prior = HashMap::from([(
            "webhook_endpoint".to_string(),
            block(&[("url", s("https://hooks.example.com/api?code=secret"))]),
        )]);

        let attributes = flatten(&id, &properties, Some(&prior));
        let webhook = attributes.get_block("webhook_endpoint").unwrap();
        assert_eq!(webhook.get_str("url"), Some("https://hooks.example.com/api?code=secret"));
        assert_eq!(webhook.get_str("base_url"), Some("https://hooks.example.com/api"));

        let attributes = flatten(&id, &properties, None);
        let webhook = attributes.get_block("webhook_endpoint").unwrap();
        assert_eq!(webhook.get_str("url"), Some("https://hooks.example.com/api"));
        assert_eq!(
            attributes.get_str("event_delivery_schema"),
            Some("EventGridSchema")
        );
    }

    #[tokio::test]
    async fn create_read_update_delete() {
        let arm = InMemoryArm::long_running();
        let client = arm.client();
        let resource = basic();

        let state = create(&client, &resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some(subscription_path().as_str()));
        assert_eq!(state.attributes.get_str("event_delivery_schema"), Some("EventGridSchema"));
        assert_eq!(state.attributes.get_strings("labels"), vec!["test", "test1", "test2"]);
        assert_eq!(
            state
                .attributes
                .get_block("retry_policy")
                .and_then(|p| p.get_int("max_delivery_attempts")),
            Some(11)
        );

        let updated = basic()
            .with_attribute("labels", Value::string_list(["test4", "test5", "test6"]))
            .with_attribute(
                "subject_filter",
                block(&[
                    ("subject_begins_with", s("test/test")),
                    ("subject_ends_with", s(".jpg")),
                ]),
            );
        let state = update(&client, &resource.id, &subscription_path(), &updated)
            .await
            .unwrap();
        assert_eq!(state.attributes.get_strings("labels"), vec!["test4", "test5", "test6"]);
        assert_eq!(
            state
                .attributes
                .get_block("subject_filter")
                .and_then(|f| f.get_str("subject_ends_with")),
            Some(".jpg")
        );
        assert!(
            arm.requests()
                .iter()
                .any(|(method, _)| *method == Method::Patch)
        );

        assert!(exists(&client, &subscription_path()).await.unwrap());
        delete(&client, &resource.id, &subscription_path()).await.unwrap();
        assert!(!exists(&client, &subscription_path()).await.unwrap());
        let state = read(&client, &resource.id, &subscription_path()).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn create_requires_import_of_existing_subscription() {
        let arm = InMemoryArm::new();
        let client = arm.client();
        create(&client, &basic()).await.unwrap();

        let import = Resource::new(TYPE_NAME, "import")
            .with_attribute("name", s("acctesteg-1"))
            .with_attribute("scope", s(SCOPE))
            .with_attribute("eventhub_endpoint_id", s(STORAGE));
        let err = create(&client, &import).await.unwrap_err();
        assert!(err.is_requires_import());
        assert_eq!(err.resource_id, Some(import.id.clone()));
        assert!(err.message.contains("acctesteg-1"));
    }

    #[tokio::test]
    async fn read_reports_endpoint_from_endpoint_type() {
        let arm = InMemoryArm::new();
        arm.insert(
            &subscription_path(),
            json!({
                "id": subscription_path(),
                "name": "acctesteg-1",
                "properties": {
                    "topic": SCOPE,
                    "provisioningState": "Succeeded",
                    "eventDeliverySchema": "CloudEventSchemaV1_0",
                    "destination": {
                        "endpointType": "ServiceBusTopic",
                        "properties": {"resourceId": "/subscriptions/s/topic"}
                    },
                    "filter": {"includedEventTypes": null}
                }
            }),
        );
        let client = arm.client();
        let state = read(&client, &ResourceId::new(TYPE_NAME, "test"), &subscription_path())
            .await
            .unwrap();
        assert_eq!(
            state.attributes.get_str("service_bus_topic_endpoint_id"),
            Some("/subscriptions/s/topic")
        );
        assert_eq!(
            state.attributes.get_str("event_delivery_schema"),
            Some("CloudEventSchemaV1_0")
        );
        assert!(!state.attributes.contains_key("storage_queue_endpoint"));
    }

    #[tokio::test]
    async fn malformed_identifier_is_rejected() {
        let client = InMemoryArm::new().client();
        let err = read(&client, &ResourceId::new(TYPE_NAME, "test"), "/subscriptions/x")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Validation);
    }
}
