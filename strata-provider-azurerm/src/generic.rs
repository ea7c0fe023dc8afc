//! Schema-driven ARM resources
//!
//! Resource types without bespoke logic are described by an
//! `ArmSchemaConfig`: where the resource lives, which attribute maps to which
//! JSON path (`AttributeSchema::provider_name`) and how values are encoded.
//! One engine then performs create, read, update and delete for all of them.

use std::collections::HashMap;

use serde_json::{Value as JsonValue, json};
use strata_core::provider::{ProviderError, ProviderResult, ResourceType};
use strata_core::resource::{Attributes, Resource, ResourceId, State, Value};
use strata_core::schema::{AttributeType, ResourceSchema};

use crate::client::{ArmClient, ArmResultExt};
use crate::convert::{
    Codec, Converter, get_path, normalize_location, remove_path, set_path, tags_from_arm,
    tags_to_arm,
};
use crate::resourceids::ResourceGroupId;

/// Where a schema-driven resource lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// `{resource_group}/providers/{arm_type}/{name}`
    ResourceGroup,
    /// `{parent}/{segment}/{name}`, the parent ID held in `parent_attribute`
    Child {
        parent_attribute: &'static str,
        segment: &'static str,
    },
    /// `{resource_group}/providers/{arm_type}/{name}` in the resource group of
    /// the resource whose ID is held in `reference_attribute`
    SameResourceGroup { reference_attribute: &'static str },
    /// A member of a parent resource recorded at `path` on that parent
    ///
    /// `member_attribute` holds the member's ID; the parent is the resource
    /// two segments up and the member's name is the value written. The
    /// member's ID doubles as this resource's identifier.
    ParentProperty {
        member_attribute: &'static str,
        path: &'static str,
    },
}

/// Description of a schema-driven resource type
pub struct ArmSchemaConfig {
    /// Resource provider namespace and type (e.g., "PaloAltoNetworks.Cloudngfw/localRulestacks")
    pub arm_type: &'static str,
    pub api_version: &'static str,
    pub placement: Placement,
    /// Attribute holding the last ID segment
    pub name_attribute: &'static str,
    pub has_location: bool,
    pub has_tags: bool,
    /// Per-attribute encodings; attributes not listed are `Codec::Plain`
    pub codecs: &'static [(&'static str, Codec)],
    /// Constant values set at dotted paths on write when absent
    pub defaults: Vec<(&'static str, JsonValue)>,
    pub schema: ResourceSchema,
}

/// Resource type (or data source) backed by an `ArmSchemaConfig`
pub struct SchemaDrivenType {
    name: &'static str,
    schema: ResourceSchema,
    data_source: bool,
}

impl SchemaDrivenType {
    pub fn resource(name: &'static str, config: ArmSchemaConfig) -> Self {
        Self {
            name,
            schema: config.schema,
            data_source: false,
        }
    }

    pub fn data_source(name: &'static str, config: ArmSchemaConfig) -> Self {
        Self {
            name,
            schema: config.schema,
            data_source: true,
        }
    }
}

impl ResourceType for SchemaDrivenType {
    fn name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> ResourceSchema {
        self.schema.clone()
    }

    fn is_data_source(&self) -> bool {
        self.data_source
    }
}

/// Attributes carried by the ID or envelope rather than by `properties`
const RESOURCE_GROUP_ATTRIBUTE: &str = "resource_group_name";
const LOCATION_ATTRIBUTE: &str = "location";
const TAGS_ATTRIBUTE: &str = "tags";

/// Envelope fields the API returns but rejects on write
const READ_ONLY_PATHS: &[&str] = &[
    "id",
    "name",
    "type",
    "etag",
    "systemData",
    "properties.provisioningState",
];

impl ArmSchemaConfig {
    fn converter(&self) -> Converter<'static> {
        Converter::new(self.codecs)
    }

    /// ARM ID of the resource described by `attributes`
    pub fn resource_id(
        &self,
        subscription_id: &str,
        attributes: &HashMap<String, Value>,
    ) -> ProviderResult<String> {
        let required = |name: &str| {
            attribute_text(attributes, name)
                .ok_or_else(|| ProviderError::validation(format!("'{}' is required", name)))
        };
        match self.placement {
            Placement::ResourceGroup => Ok(format!(
                "{}/providers/{}/{}",
                ResourceGroupId::new(subscription_id, required(RESOURCE_GROUP_ATTRIBUTE)?),
                self.arm_type,
                required(self.name_attribute)?
            )),
            Placement::SameResourceGroup {
                reference_attribute,
            } => {
                let reference = required(reference_attribute)?;
                let group = ResourceGroupId::containing(&reference)?;
                Ok(format!(
                    "{}/providers/{}/{}",
                    group,
                    self.arm_type,
                    required(self.name_attribute)?
                ))
            }
            Placement::Child {
                parent_attribute,
                segment,
            } => Ok(format!(
                "{}/{}/{}",
                required(parent_attribute)?.trim_end_matches('/'),
                segment,
                required(self.name_attribute)?
            )),
            Placement::ParentProperty {
                member_attribute, ..
            } => required(member_attribute),
        }
    }

    /// JSON body for a PUT of the resource
    pub fn build_body(&self, attributes: &HashMap<String, Value>) -> JsonValue {
        let converter = self.converter();
        let mut body = json!({ "properties": {} });

        for (name, schema) in &self.schema.attributes {
            let Some(path) = &schema.provider_name else {
                continue;
            };
            if let Some(value) = attributes.get(name)
                && let Some(json) = converter.attribute_to_arm(schema, value)
            {
                set_path(&mut body, path, json);
            }
        }
        for (path, value) in &self.defaults {
            if get_path(&body, path).is_none() {
                set_path(&mut body, path, value.clone());
            }
        }
        if self.has_location
            && let Some(location) = attributes.get_str(LOCATION_ATTRIBUTE)
        {
            set_path(&mut body, "location", json!(normalize_location(location)));
        }
        if self.has_tags {
            set_path(&mut body, "tags", tags_to_arm(attributes.get(TAGS_ATTRIBUTE)));
        }
        body
    }

    /// Attributes of the resource with ID `arm_id` from its GET body
    pub fn flatten(&self, arm_id: &str, body: &JsonValue) -> HashMap<String, Value> {
        let converter = self.converter();
        let mut attributes = HashMap::new();

        for (name, schema) in &self.schema.attributes {
            let Some(path) = &schema.provider_name else {
                continue;
            };
            if let Some(json) = get_path(body, path)
                && let Some(value) = converter.attribute_from_arm(schema, json)
            {
                attributes.insert(name.clone(), value);
            }
        }

        let (parent, name) = split_last_segment(arm_id);
        let name_value = match self.schema.attributes.get(self.name_attribute) {
            Some(schema) if matches!(schema.attr_type, AttributeType::Int) => name
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::String(name.to_string())),
            _ => Value::String(name.to_string()),
        };
        attributes.insert(self.name_attribute.to_string(), name_value);

        match self.placement {
            Placement::ResourceGroup => {
                if let Ok(group) = ResourceGroupId::containing(arm_id) {
                    attributes.insert(
                        RESOURCE_GROUP_ATTRIBUTE.to_string(),
                        Value::String(group.resource_group),
                    );
                }
            }
            Placement::Child {
                parent_attribute, ..
            } => {
                attributes.insert(
                    parent_attribute.to_string(),
                    Value::String(parent.to_string()),
                );
            }
            Placement::SameResourceGroup { .. } | Placement::ParentProperty { .. } => {}
        }

        if self.has_location
            && let Some(location) = body.get("location").and_then(JsonValue::as_str)
        {
            attributes.insert(
                LOCATION_ATTRIBUTE.to_string(),
                Value::String(normalize_location(location)),
            );
        }
        if self.has_tags
            && let Some(tags) = tags_from_arm(body.get("tags"))
        {
            attributes.insert(TAGS_ATTRIBUTE.to_string(), tags);
        }
        attributes
    }
}

/// Attribute rendered as an ID segment (names may be integers, e.g. rule priorities)
fn attribute_text(attributes: &HashMap<String, Value>, name: &str) -> Option<String> {
    match attributes.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        _ => None,
    }
}

/// `("/a/b/c/d", "d")` style split of an ID into its parent path and name;
/// the parent drops the `key/name` pair
fn split_last_segment(id: &str) -> (&str, &str) {
    let trimmed = id.trim_end_matches('/');
    let (rest, name) = trimmed.rsplit_once('/').unwrap_or(("", trimmed));
    let parent = rest.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
    (parent, name)
}

fn strip_read_only(body: &mut JsonValue) {
    for path in READ_ONLY_PATHS {
        remove_path(body, path);
    }
}

/// CRUD engine for schema-driven resources
pub struct GenericResource<'a> {
    client: &'a ArmClient,
    config: &'a ArmSchemaConfig,
}

impl<'a> GenericResource<'a> {
    pub fn new(client: &'a ArmClient, config: &'a ArmSchemaConfig) -> Self {
        Self { client, config }
    }

    fn api_version(&self) -> &'static str {
        self.config.api_version
    }

    pub async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        let arm_id = self
            .config
            .resource_id(self.client.subscription_id(), &resource.attributes)
            .map_err(|e| e.for_resource(resource.id.clone()))?;

        if let Placement::ParentProperty { path, .. } = self.config.placement {
            return self.create_member(resource, &arm_id, path).await;
        }

        let existing = self
            .client
            .get_json(&arm_id, self.api_version())
            .await
            .context(|| format!("checking for presence of existing {}", arm_id))
            .map_err(|e| e.for_resource(resource.id.clone()))?;
        if existing.is_some() {
            return Err(
                ProviderError::requires_import(&resource.id.resource_type, &arm_id)
                    .for_resource(resource.id.clone()),
            );
        }

        log::info!("Creating {} {}", resource.id, arm_id);
        let body = self.config.build_body(&resource.attributes);
        self.client
            .put(&arm_id, self.api_version(), &body)
            .await
            .context(|| format!("creating {}", arm_id))
            .map_err(|e| e.for_resource(resource.id.clone()))?;

        self.read(&resource.id, &arm_id).await
    }

    pub async fn read(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        if let Placement::ParentProperty {
            member_attribute,
            path,
        } = self.config.placement
        {
            return self.read_member(id, identifier, member_attribute, path).await;
        }

        let body = self
            .client
            .get_json(identifier, self.api_version())
            .await
            .context(|| format!("retrieving {}", identifier))
            .map_err(|e| e.for_resource(id.clone()))?;
        match body {
            Some(body) => {
                let attributes = self.config.flatten(identifier, &body);
                Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
            }
            None => {
                log::info!("{} was not found - removing from state", identifier);
                Ok(State::not_found(id.clone()))
            }
        }
    }

    /// Look up an existing resource from its configuration
    pub async fn read_data_source(&self, resource: &Resource) -> ProviderResult<State> {
        let arm_id = self
            .config
            .resource_id(self.client.subscription_id(), &resource.attributes)
            .map_err(|e| e.for_resource(resource.id.clone()))?;
        let state = self.read(&resource.id, &arm_id).await?;
        if !state.exists {
            return Err(ProviderError::not_found(format!("{} was not found", arm_id))
                .for_resource(resource.id.clone()));
        }
        Ok(state)
    }

    /// Updates re-PUT the whole resource
    pub async fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> ProviderResult<State> {
        if let Placement::ParentProperty { .. } = self.config.placement {
            return Err(ProviderError::validation(format!(
                "{} has no updatable attributes, delete and recreate",
                id.resource_type
            ))
            .for_resource(id.clone()));
        }

        log::info!("Updating {} {}", id, identifier);
        let body = self.config.build_body(&to.attributes);
        self.client
            .put(identifier, self.api_version(), &body)
            .await
            .context(|| format!("updating {}", identifier))
            .map_err(|e| e.for_resource(id.clone()))?;

        self.read(id, identifier).await
    }

    pub async fn delete(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        if let Placement::ParentProperty { path, .. } = self.config.placement {
            return self.delete_member(id, identifier, path).await;
        }

        log::info!("Deleting {} {}", id, identifier);
        self.client
            .delete(identifier, self.api_version(), None)
            .await
            .context(|| format!("deleting {}", identifier))
            .map_err(|e| e.for_resource(id.clone()))
    }

    pub async fn exists(&self, identifier: &str) -> ProviderResult<bool> {
        let id = ResourceId::new("", "");
        Ok(self.read(&id, identifier).await?.exists)
    }

    async fn parent_body(&self, id: &ResourceId, parent_id: &str) -> ProviderResult<JsonValue> {
        self.client
            .get_json(parent_id, self.api_version())
            .await
            .context(|| format!("retrieving {}", parent_id))
            .map_err(|e| e.for_resource(id.clone()))?
            .ok_or_else(|| {
                ProviderError::not_found(format!("{} was not found", parent_id))
                    .for_resource(id.clone())
            })
    }

    async fn put_parent(
        &self,
        id: &ResourceId,
        parent_id: &str,
        mut body: JsonValue,
    ) -> ProviderResult<()> {
        strip_read_only(&mut body);
        self.client
            .put(parent_id, self.api_version(), &body)
            .await
            .context(|| format!("updating {}", parent_id))
            .map_err(|e| e.for_resource(id.clone()))
    }

    async fn create_member(
        &self,
        resource: &Resource,
        member_id: &str,
        path: &str,
    ) -> ProviderResult<State> {
        let (parent_id, member) = split_last_segment(member_id);
        let mut body = self.parent_body(&resource.id, parent_id).await?;

        if get_path(&body, path).and_then(JsonValue::as_str) == Some(member) {
            return Err(
                ProviderError::requires_import(&resource.id.resource_type, member_id)
                    .for_resource(resource.id.clone()),
            );
        }

        log::info!("Associating {} with {} at {}", member, parent_id, path);
        set_path(&mut body, path, json!(member));
        self.put_parent(&resource.id, parent_id, body).await?;

        self.read(&resource.id, member_id).await
    }

    async fn read_member(
        &self,
        id: &ResourceId,
        member_id: &str,
        member_attribute: &str,
        path: &str,
    ) -> ProviderResult<State> {
        let (parent_id, member) = split_last_segment(member_id);
        let body = self
            .client
            .get_json(parent_id, self.api_version())
            .await
            .context(|| format!("retrieving {}", parent_id))
            .map_err(|e| e.for_resource(id.clone()))?;

        let associated = body
            .as_ref()
            .and_then(|b| get_path(b, path))
            .and_then(JsonValue::as_str)
            == Some(member);
        if !associated {
            log::info!("{} is not associated with {} - removing from state", member, parent_id);
            return Ok(State::not_found(id.clone()));
        }

        let attributes = HashMap::from([(
            member_attribute.to_string(),
            Value::String(member_id.to_string()),
        )]);
        Ok(State::existing(id.clone(), attributes).with_identifier(member_id))
    }

    async fn delete_member(&self, id: &ResourceId, member_id: &str, path: &str) -> ProviderResult<()> {
        let (parent_id, member) = split_last_segment(member_id);
        let mut body = match self
            .client
            .get_json(parent_id, self.api_version())
            .await
            .context(|| format!("retrieving {}", parent_id))
            .map_err(|e| e.for_resource(id.clone()))?
        {
            Some(body) => body,
            None => return Ok(()),
        };
        if get_path(&body, path).and_then(JsonValue::as_str) != Some(member) {
            return Ok(());
        }

        log::info!("Removing {} from {} at {}", member, parent_id, path);
        remove_path(&mut body, path);
        self.put_parent(id, parent_id, body).await
    }
}
