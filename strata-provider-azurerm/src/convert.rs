//! Conversion between attribute values and ARM JSON bodies
//!
//! Attribute names are snake_case; ARM property names are lowerCamelCase.
//! Nested block keys are converted using the block schema, so an explicit
//! `provider_name` on a block attribute wins over the derived camel case
//! name. Map attributes (tags and the like) keep their keys verbatim.

use std::collections::HashMap;

use heck::ToLowerCamelCase;
use serde_json::{Map, Value as JsonValue};
use strata_core::resource::Value;
use strata_core::schema::{AttributeSchema, AttributeType, BlockSchema};

/// Value at a dotted path (e.g., `properties.securityServices`)
pub fn get_path<'a>(json: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.')
        .try_fold(json, |current, key| current.get(key))
        .filter(|v| !v.is_null())
}

/// Set the value at a dotted path, creating intermediate objects
pub fn set_path(json: &mut JsonValue, path: &str, value: JsonValue) {
    let mut current = json;
    let mut keys = path.split('.').peekable();
    while let Some(key) = keys.next() {
        if !current.is_object() {
            *current = JsonValue::Object(Map::new());
        }
        let JsonValue::Object(map) = current else {
            return;
        };
        if keys.peek().is_none() {
            map.insert(key.to_string(), value);
            return;
        }
        current = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
    }
}

/// Remove and return the value at a dotted path
pub fn remove_path(json: &mut JsonValue, path: &str) -> Option<JsonValue> {
    let (parent, last) = match path.rsplit_once('.') {
        Some((parent, last)) => {
            let parent = parent
                .split('.')
                .try_fold(json, |current, key| current.get_mut(key))?;
            (parent, last)
        }
        None => (json, path),
    };
    parent.as_object_mut()?.remove(last)
}

/// JSON property name of an attribute
pub fn json_name(schema: &AttributeSchema) -> String {
    schema
        .provider_name
        .clone()
        .unwrap_or_else(|| schema.name.to_lower_camel_case())
}

/// Wire encoding of a single attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// JSON form of the value as is
    Plain,
    /// Booleans sent as words (e.g., `ENABLED`/`DISABLED`)
    BoolWord {
        on: &'static str,
        off: &'static str,
    },
    /// `["id"]` sent as `[{"resourceId": "id"}]`
    ResourceIdList,
}

impl Codec {
    pub fn encode(&self, json: JsonValue) -> JsonValue {
        match (self, json) {
            (Codec::BoolWord { on, off }, JsonValue::Bool(b)) => {
                JsonValue::from(if b { *on } else { *off })
            }
            (Codec::ResourceIdList, JsonValue::Array(items)) => JsonValue::Array(
                items
                    .into_iter()
                    .map(|id| serde_json::json!({ "resourceId": id }))
                    .collect(),
            ),
            (_, json) => json,
        }
    }

    pub fn decode(&self, json: &JsonValue) -> JsonValue {
        match (self, json) {
            (Codec::BoolWord { on, off }, JsonValue::String(s)) => {
                if s.eq_ignore_ascii_case(on) {
                    JsonValue::Bool(true)
                } else if s.eq_ignore_ascii_case(off) {
                    JsonValue::Bool(false)
                } else {
                    json.clone()
                }
            }
            (Codec::ResourceIdList, JsonValue::Array(items)) => JsonValue::Array(
                items
                    .iter()
                    .filter_map(|item| item.get("resourceId").cloned())
                    .collect(),
            ),
            _ => json.clone(),
        }
    }
}

/// Converts attributes to and from ARM JSON, applying per-attribute codecs
///
/// Single blocks become objects and repeatable blocks arrays of objects.
/// Codecs are looked up by attribute name at every nesting level.
#[derive(Debug, Clone, Copy, Default)]
pub struct Converter<'a> {
    codecs: &'a [(&'static str, Codec)],
}

impl<'a> Converter<'a> {
    pub fn new(codecs: &'a [(&'static str, Codec)]) -> Self {
        Self { codecs }
    }

    fn codec(&self, name: &str) -> Codec {
        self.codecs
            .iter()
            .find(|(attribute, _)| *attribute == name)
            .map(|(_, codec)| *codec)
            .unwrap_or(Codec::Plain)
    }

    /// ARM form of one attribute; unresolved references yield `None`
    pub fn attribute_to_arm(&self, schema: &AttributeSchema, value: &Value) -> Option<JsonValue> {
        self.to_arm(&schema.attr_type, value)
            .map(|json| self.codec(&schema.name).encode(json))
    }

    /// Attribute value from its ARM form; empty blocks read back as absent
    pub fn attribute_from_arm(&self, schema: &AttributeSchema, json: &JsonValue) -> Option<Value> {
        let decoded = self.codec(&schema.name).decode(json);
        self.from_arm(&schema.attr_type, &decoded)
    }

    fn to_arm(&self, attr_type: &AttributeType, value: &Value) -> Option<JsonValue> {
        match (attr_type, value) {
            (AttributeType::Block(block), Value::List(items)) => {
                let objects: Vec<JsonValue> = items
                    .iter()
                    .filter_map(Value::as_map)
                    .map(|map| self.block_to_arm(block, map))
                    .collect();
                if block.max_items == 1 {
                    objects.into_iter().next()
                } else {
                    Some(JsonValue::Array(objects))
                }
            }
            (AttributeType::Block(block), Value::Map(map)) => {
                let object = self.block_to_arm(block, map);
                if block.max_items == 1 {
                    Some(object)
                } else {
                    Some(JsonValue::Array(vec![object]))
                }
            }
            (AttributeType::List(inner), Value::List(items)) => Some(JsonValue::Array(
                items.iter().filter_map(|v| self.to_arm(inner, v)).collect(),
            )),
            (AttributeType::Custom { base, .. }, v) => self.to_arm(base, v),
            (_, v) => v.to_json(),
        }
    }

    fn block_to_arm(&self, block: &BlockSchema, map: &HashMap<String, Value>) -> JsonValue {
        let mut object = JsonValue::Object(Map::new());
        for (name, value) in map {
            let Some(schema) = block.attributes.get(name) else {
                continue;
            };
            if let Some(json) = self.attribute_to_arm(schema, value) {
                set_path(&mut object, &json_name(schema), json);
            }
        }
        object
    }

    fn from_arm(&self, attr_type: &AttributeType, json: &JsonValue) -> Option<Value> {
        match (attr_type, json) {
            (_, JsonValue::Null) => None,
            (AttributeType::Block(block), JsonValue::Object(_)) => {
                self.block_from_arm(block, json).map(Value::block)
            }
            (AttributeType::Block(block), JsonValue::Array(items)) => {
                let maps: Vec<Value> = items
                    .iter()
                    .filter_map(|item| self.block_from_arm(block, item))
                    .map(Value::Map)
                    .collect();
                (!maps.is_empty()).then_some(Value::List(maps))
            }
            (AttributeType::List(inner), JsonValue::Array(items)) => Some(Value::List(
                items.iter().filter_map(|v| self.from_arm(inner, v)).collect(),
            )),
            (AttributeType::Custom { base, .. }, v) => self.from_arm(base, v),
            (AttributeType::Float, JsonValue::Number(n)) => n.as_f64().map(Value::Float),
            (_, v) => Value::from_json(v),
        }
    }

    fn block_from_arm(&self, block: &BlockSchema, json: &JsonValue) -> Option<HashMap<String, Value>> {
        let map: HashMap<String, Value> = block
            .attributes
            .values()
            .filter_map(|schema| {
                let value = get_path(json, &json_name(schema))?;
                self.attribute_from_arm(schema, value)
                    .map(|v| (schema.name.clone(), v))
            })
            .collect();
        (!map.is_empty()).then_some(map)
    }
}

/// Tags attribute to the ARM `tags` object
pub fn tags_to_arm(tags: Option<&Value>) -> JsonValue {
    let map = tags
        .and_then(Value::as_map)
        .map(|tags| {
            tags.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), JsonValue::from(s))))
                .collect()
        })
        .unwrap_or_default();
    JsonValue::Object(map)
}

/// ARM `tags` object to the tags attribute; empty tags read back as absent
pub fn tags_from_arm(json: Option<&JsonValue>) -> Option<Value> {
    let tags: HashMap<String, Value> = json?
        .as_object()?
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), Value::String(s.to_string()))))
        .collect();
    (!tags.is_empty()).then_some(Value::Map(tags))
}

/// Canonical form of an Azure location ("West Europe" -> "westeurope")
pub fn normalize_location(location: &str) -> String {
    location.replace(' ', "").to_lowercase()
}
