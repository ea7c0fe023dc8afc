//! `web_application_firewall_policy`

use std::collections::HashMap;

use strata_core::provider::{ProviderError, ProviderResult, ResourceType};
use strata_core::resource::{Attributes, Resource, ResourceId, State, Value};
use strata_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::API_VERSION;
use super::models::{
    ManagedRuleGroupOverride, ManagedRuleOverride, ManagedRuleSet, ManagedRulesDefinition,
    PolicySettings, WebApplicationFirewallPolicy, WebApplicationFirewallPolicyPropertiesFormat,
};
use super::parse::WebApplicationFirewallPolicyId;
use crate::client::{ArmClient, ArmResultExt};
use crate::convert::normalize_location;
use crate::resourceids::ResourceGroupId;

pub const TYPE_NAME: &str = "web_application_firewall_policy";

const ENABLED: &str = "Enabled";
const DISABLED: &str = "Disabled";

pub struct WebApplicationFirewallPolicyType;

impl ResourceType for WebApplicationFirewallPolicyType {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }
}

fn rule_block() -> AttributeType {
    AttributeType::Block(
        BlockSchema::new()
            .attribute(AttributeSchema::new("id", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("enabled", AttributeType::Bool)
                    .with_default(Value::Bool(false)),
            )
            .attribute(AttributeSchema::new(
                "action",
                AttributeType::enumeration(&["Allow", "AnomalyScoring", "Block", "Log"]),
            )),
    )
}

fn managed_rules_block() -> AttributeType {
    let rule_group_override = BlockSchema::new()
        .attribute(AttributeSchema::new("rule_group_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("rule", rule_block()));

    let managed_rule_set = BlockSchema::new()
        .with_min_items(1)
        .attribute(
            AttributeSchema::new(
                "type",
                AttributeType::enumeration(&[
                    "OWASP",
                    "Microsoft_BotManagerRuleSet",
                    "Microsoft_DefaultRuleSet",
                ]),
            )
            .with_default(Value::String("OWASP".to_string())),
        )
        .attribute(AttributeSchema::new("version", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "rule_group_override",
            AttributeType::Block(rule_group_override),
        ));

    AttributeType::Block(
        BlockSchema::single().with_min_items(1).attribute(
            AttributeSchema::new("managed_rule_set", AttributeType::Block(managed_rule_set))
                .required(),
        ),
    )
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Manages an Azure Web Application Firewall Policy")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("location", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new(
            "policy_settings",
            AttributeType::Block(
                BlockSchema::single()
                    .attribute(
                        AttributeSchema::new("enabled", AttributeType::Bool)
                            .with_default(Value::Bool(true)),
                    )
                    .attribute(
                        AttributeSchema::new(
                            "mode",
                            AttributeType::enumeration(&["Prevention", "Detection"]),
                        )
                        .with_default(Value::String("Prevention".to_string())),
                    )
                    .attribute(
                        AttributeSchema::new("request_body_check", AttributeType::Bool)
                            .with_default(Value::Bool(true)),
                    )
                    .attribute(
                        AttributeSchema::new(
                            "file_upload_limit_in_mb",
                            types::int_between::<1, 4000>(),
                        )
                        .with_default(Value::Int(100)),
                    )
                    .attribute(
                        AttributeSchema::new(
                            "max_request_body_size_in_kb",
                            types::int_between::<8, 2000>(),
                        )
                        .with_default(Value::Int(128)),
                    ),
            ),
        ))
        .attribute(AttributeSchema::new("managed_rules", managed_rules_block()).required())
        .attribute(AttributeSchema::new(
            "tags",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
}

fn state_word(enabled: bool) -> String {
    let word = if enabled { ENABLED } else { DISABLED };
    word.to_string()
}

fn is_enabled(state: Option<&str>) -> bool {
    state.is_some_and(|s| s.eq_ignore_ascii_case(ENABLED))
}

fn expand_policy_settings(block: Option<&HashMap<String, Value>>) -> PolicySettings {
    let empty = HashMap::new();
    let block = block.unwrap_or(&empty);
    PolicySettings {
        state: Some(state_word(block.get_bool("enabled").unwrap_or(true))),
        mode: Some(block.get_str("mode").unwrap_or("Prevention").to_string()),
        request_body_check: Some(block.get_bool("request_body_check").unwrap_or(true)),
        file_upload_limit_in_mb: Some(block.get_int("file_upload_limit_in_mb").unwrap_or(100)),
        max_request_body_size_in_kb: Some(
            block.get_int("max_request_body_size_in_kb").unwrap_or(128),
        ),
    }
}

fn expand_rule_group_override(block: &HashMap<String, Value>) -> ManagedRuleGroupOverride {
    let rules: Vec<ManagedRuleOverride> = block
        .get_blocks("rule")
        .into_iter()
        .map(|rule| ManagedRuleOverride {
            rule_id: rule.get_str("id").unwrap_or_default().to_string(),
            state: Some(state_word(rule.get_bool("enabled").unwrap_or(false))),
            action: rule.get_str("action").map(str::to_string),
        })
        .collect();
    ManagedRuleGroupOverride {
        rule_group_name: block.get_str("rule_group_name").unwrap_or_default().to_string(),
        rules: (!rules.is_empty()).then_some(rules),
    }
}

fn expand_managed_rules(block: Option<&HashMap<String, Value>>) -> ManagedRulesDefinition {
    let managed_rule_sets = block
        .map(|b| b.get_blocks("managed_rule_set"))
        .unwrap_or_default()
        .into_iter()
        .map(|set| {
            let overrides: Vec<ManagedRuleGroupOverride> = set
                .get_blocks("rule_group_override")
                .into_iter()
                .map(expand_rule_group_override)
                .collect();
            ManagedRuleSet {
                rule_set_type: set.get_str("type").unwrap_or("OWASP").to_string(),
                rule_set_version: set.get_str("version").unwrap_or_default().to_string(),
                rule_group_overrides: (!overrides.is_empty()).then_some(overrides),
            }
        })
        .collect();
    ManagedRulesDefinition { managed_rule_sets }
}

fn expand_tags(attributes: &HashMap<String, Value>) -> Option<HashMap<String, String>> {
    attributes.get("tags").and_then(Value::as_map).map(|tags| {
        tags.iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect()
    })
}

pub fn expand(attributes: &HashMap<String, Value>) -> WebApplicationFirewallPolicy {
    WebApplicationFirewallPolicy {
        location: attributes.get_str("location").map(normalize_location),
        tags: expand_tags(attributes),
        properties: Some(WebApplicationFirewallPolicyPropertiesFormat {
            policy_settings: Some(expand_policy_settings(attributes.get_block("policy_settings"))),
            managed_rules: expand_managed_rules(attributes.get_block("managed_rules")),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn flatten_policy_settings(settings: &PolicySettings) -> Value {
    let mut block = HashMap::from([(
        "enabled".to_string(),
        Value::Bool(is_enabled(settings.state.as_deref())),
    )]);
    if let Some(mode) = &settings.mode {
        block.insert("mode".to_string(), Value::String(mode.clone()));
    }
    if let Some(check) = settings.request_body_check {
        block.insert("request_body_check".to_string(), Value::Bool(check));
    }
    if let Some(limit) = settings.file_upload_limit_in_mb {
        block.insert("file_upload_limit_in_mb".to_string(), Value::Int(limit));
    }
    if let Some(size) = settings.max_request_body_size_in_kb {
        block.insert("max_request_body_size_in_kb".to_string(), Value::Int(size));
    }
    Value::block(block)
}

fn flatten_managed_rules(definition: &ManagedRulesDefinition) -> Value {
    let sets = definition
        .managed_rule_sets
        .iter()
        .map(|set| {
            let overrides = set
                .rule_group_overrides
                .iter()
                .flatten()
                .map(|group| {
                    let rules = group
                        .rules
                        .iter()
                        .flatten()
                        .map(|rule| {
                            let mut item = HashMap::from([
                                ("id".to_string(), Value::String(rule.rule_id.clone())),
                                (
                                    "enabled".to_string(),
                                    Value::Bool(is_enabled(rule.state.as_deref())),
                                ),
                            ]);
                            if let Some(action) = &rule.action {
                                item.insert("action".to_string(), Value::String(action.clone()));
                            }
                            Value::Map(item)
                        })
                        .collect::<Vec<_>>();
                    let mut item = HashMap::from([(
                        "rule_group_name".to_string(),
                        Value::String(group.rule_group_name.clone()),
                    )]);
                    if !rules.is_empty() {
                        item.insert("rule".to_string(), Value::List(rules));
                    }
                    Value::Map(item)
                })
                .collect::<Vec<_>>();
            let mut item = HashMap::from([
                ("type".to_string(), Value::String(set.rule_set_type.clone())),
                (
                    "version".to_string(),
                    Value::String(set.rule_set_version.clone()),
                ),
            ]);
            if !overrides.is_empty() {
                item.insert("rule_group_override".to_string(), Value::List(overrides));
            }
            Value::Map(item)
        })
        .collect();
    Value::block(HashMap::from([(
        "managed_rule_set".to_string(),
        Value::List(sets),
    )]))
}

pub fn flatten(
    id: &WebApplicationFirewallPolicyId,
    policy: &WebApplicationFirewallPolicy,
) -> HashMap<String, Value> {
    let mut attributes = HashMap::from([
        ("name".to_string(), Value::String(id.name.clone())),
        (
            "resource_group_name".to_string(),
            Value::String(id.resource_group.clone()),
        ),
    ]);
    if let Some(location) = &policy.location {
        attributes.insert(
            "location".to_string(),
            Value::String(normalize_location(location)),
        );
    }
    if let Some(tags) = policy.tags.as_ref().filter(|t| !t.is_empty()) {
        attributes.insert(
            "tags".to_string(),
            Value::Map(
                tags.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
    }
    if let Some(properties) = &policy.properties {
        if let Some(settings) = &properties.policy_settings {
            attributes.insert("policy_settings".to_string(), flatten_policy_settings(settings));
        }
        attributes.insert(
            "managed_rules".to_string(),
            flatten_managed_rules(&properties.managed_rules),
        );
    }
    attributes
}

fn describe(id: &WebApplicationFirewallPolicyId) -> String {
    format!(
        "Web Application Firewall Policy {:?} (Resource Group {:?})",
        id.name, id.resource_group
    )
}

fn policy_id_from(
    client: &ArmClient,
    attributes: &HashMap<String, Value>,
) -> ProviderResult<WebApplicationFirewallPolicyId> {
    let resource_group = attributes
        .get_str("resource_group_name")
        .ok_or_else(|| ProviderError::validation("'resource_group_name' is required"))?;
    let name = attributes
        .get_str("name")
        .ok_or_else(|| ProviderError::validation("'name' is required"))?;
    Ok(WebApplicationFirewallPolicyId::new(
        &ResourceGroupId::new(client.subscription_id(), resource_group),
        name,
    ))
}

pub async fn create(client: &ArmClient, resource: &Resource) -> ProviderResult<State> {
    let for_resource = |e: ProviderError| e.for_resource(resource.id.clone());
    let id = policy_id_from(client, &resource.attributes).map_err(for_resource)?;
    let path = id.to_string();

    let existing = client
        .get::<WebApplicationFirewallPolicy>(&path, API_VERSION)
        .await
        .context(|| format!("checking for presence of existing {}", describe(&id)))
        .map_err(for_resource)?;
    if existing.is_some() {
        return Err(for_resource(ProviderError::requires_import(TYPE_NAME, &path)));
    }

    log::info!("Creating {}", describe(&id));
    client
        .put(&path, API_VERSION, &expand(&resource.attributes))
        .await
        .context(|| format!("creating {}", describe(&id)))
        .map_err(for_resource)?;

    read(client, &resource.id, &path).await
}

pub async fn read(client: &ArmClient, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
    let policy_id = WebApplicationFirewallPolicyId::parse(identifier)
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    let response = client
        .get::<WebApplicationFirewallPolicy>(identifier, API_VERSION)
        .await
        .context(|| format!("retrieving {}", describe(&policy_id)))
        .map_err(|e| e.for_resource(id.clone()))?;

    match response {
        Some(policy) => Ok(State::existing(id.clone(), flatten(&policy_id, &policy))
            .with_identifier(policy_id.to_string())),
        None => {
            log::info!("{} was not found - removing from state", describe(&policy_id));
            Ok(State::not_found(id.clone()))
        }
    }
}

pub async fn update(
    client: &ArmClient,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let policy_id = WebApplicationFirewallPolicyId::parse(identifier)
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    let existing = client
        .get::<WebApplicationFirewallPolicy>(identifier, API_VERSION)
        .await
        .context(|| format!("retrieving {}", describe(&policy_id)))
        .map_err(|e| e.for_resource(id.clone()))?
        .ok_or_else(|| {
            ProviderError::not_found(format!("{} was not found", describe(&policy_id)))
                .for_resource(id.clone())
        })?;

    let mut policy = expand(&to.attributes);
    policy.extra = existing.extra;
    if let (Some(properties), Some(current)) = (policy.properties.as_mut(), existing.properties) {
        properties.extra = current.extra;
    }

    log::info!("Updating {}", describe(&policy_id));
    client
        .put(identifier, API_VERSION, &policy)
        .await
        .context(|| format!("updating {}", describe(&policy_id)))
        .map_err(|e| e.for_resource(id.clone()))?;
    read(client, id, identifier).await
}

pub async fn delete(client: &ArmClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    let policy_id = WebApplicationFirewallPolicyId::parse(identifier)
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    log::info!("Deleting {}", describe(&policy_id));
    client
        .delete(identifier, API_VERSION, None)
        .await
        .context(|| format!("deleting {}", describe(&policy_id)))
        .map_err(|e| e.for_resource(id.clone()))
}

pub async fn exists(client: &ArmClient, identifier: &str) -> ProviderResult<bool> {
    let policy_id = WebApplicationFirewallPolicyId::parse(identifier)?;
    let response = client
        .get::<WebApplicationFirewallPolicy>(identifier, API_VERSION)
        .await
        .context(|| format!("retrieving {}", describe(&policy_id)))?;
    Ok(response.is_some())
}
