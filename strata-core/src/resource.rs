//! Resource - Representing resources and their state

use std::collections::HashMap;

use thiserror::Error;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "eventgrid_event_subscription")
    pub resource_type: String,
    /// Resource name (the label given to the block by the host)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to another resource's attribute (binding_name, attribute_name)
    ///
    /// The host resolves these before handing a resource to a provider.
    ResourceRef(String, String),
}

impl Value {
    /// Convert a JSON value into a `Value`
    ///
    /// `null` has no counterpart and yields `None`; nulls inside arrays and
    /// objects are dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::Array(arr) => {
                Some(Value::List(arr.iter().filter_map(Value::from_json).collect()))
            }
            serde_json::Value::Object(map) => Some(Value::Map(
                map.iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// Convert to JSON. Unresolved references have no JSON form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Int(i) => Some(serde_json::Value::from(*i)),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::List(items) => Some(serde_json::Value::Array(
                items.iter().filter_map(Value::to_json).collect(),
            )),
            Value::Map(map) => Some(serde_json::Value::Object(
                map.iter()
                    .filter_map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect(),
            )),
            Value::ResourceRef(_, _) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numbers widen to f64, so `Int` is accepted too
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Single nested block: either a bare map or the first map of a block list
    pub fn as_block(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            Value::List(items) => items.first().and_then(Value::as_map),
            _ => None,
        }
    }

    /// Build a single-item block list from an attribute map
    pub fn block(attributes: HashMap<String, Value>) -> Value {
        Value::List(vec![Value::Map(attributes)])
    }

    /// List of strings from any iterator of string-likes
    pub fn string_list<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }
}

/// Typed lookups over an attribute map
pub trait Attributes {
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_int(&self, key: &str) -> Option<i64>;
    fn get_float(&self, key: &str) -> Option<f64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_list(&self, key: &str) -> Option<&[Value]>;
    fn get_block(&self, key: &str) -> Option<&HashMap<String, Value>>;
    /// Every map of a repeatable block
    fn get_blocks(&self, key: &str) -> Vec<&HashMap<String, Value>>;
    fn get_strings(&self, key: &str) -> Vec<String>;
}

impl Attributes for HashMap<String, Value> {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_float)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn get_list(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_list)
    }

    fn get_block(&self, key: &str) -> Option<&HashMap<String, Value>> {
        self.get(key).and_then(Value::as_block)
    }

    fn get_blocks(&self, key: &str) -> Vec<&HashMap<String, Value>> {
        match self.get(key) {
            Some(Value::List(items)) => items.iter().filter_map(Value::as_map).collect(),
            Some(Value::Map(map)) => vec![map],
            _ => Vec::new(),
        }
    }

    fn get_strings(&self, key: &str) -> Vec<String> {
        self.get_list(key)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Desired state declared by the host
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// If true, this is a data source (read-only) that won't be modified
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }

    /// Parse a resource document: `{"type", "name", "data_source"?, "attributes"}`
    pub fn from_document(document: &serde_json::Value) -> Result<Self, DocumentError> {
        let field = |name: &'static str| {
            document
                .get(name)
                .and_then(serde_json::Value::as_str)
                .ok_or(DocumentError::MissingField(name))
        };
        let mut resource = Resource::new(field("type")?, field("name")?).with_read_only(
            document
                .get("data_source")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
        );
        match document.get("attributes") {
            None | Some(serde_json::Value::Null) => {}
            Some(attributes @ serde_json::Value::Object(_)) => {
                if let Some(Value::Map(map)) = Value::from_json(attributes) {
                    resource.attributes = map;
                }
            }
            Some(_) => return Err(DocumentError::AttributesNotObject),
        }
        Ok(resource)
    }

    /// Document form read by `from_document`
    pub fn to_document(&self) -> serde_json::Value {
        let attributes: serde_json::Map<String, serde_json::Value> = self
            .attributes
            .iter()
            .filter_map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
            .collect();
        let mut document = serde_json::json!({
            "type": self.id.resource_type,
            "name": self.id.name,
            "attributes": attributes,
        });
        if self.read_only {
            document["data_source"] = serde_json::Value::Bool(true);
        }
        document
    }
}

/// Malformed resource document
#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("resource document is missing '{0}'")]
    MissingField(&'static str),

    #[error("'attributes' must be an object")]
    AttributesNotObject,
}

/// Current state fetched from actual infrastructure
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// ARM resource ID, or the composite ID of an association resource
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn documents_carry_type_name_and_attributes() {
        let document = json!({
            "type": "eventgrid_event_subscription",
            "name": "test",
            "attributes": {"name": "acctesteg-1", "labels": ["test"]}
        });
        let resource = Resource::from_document(&document).unwrap();
        assert_eq!(resource.id, ResourceId::new("eventgrid_event_subscription", "test"));
        assert_eq!(resource.attributes.get_str("name"), Some("acctesteg-1"));
        assert!(!resource.is_data_source());
        assert_eq!(resource.to_document(), document);

        assert_eq!(
            Resource::from_document(&json!({"name": "x"})),
            Err(DocumentError::MissingField("type"))
        );
        assert_eq!(
            Resource::from_document(&json!({"type": "t", "name": "x", "attributes": []})),
            Err(DocumentError::AttributesNotObject)
        );
    }

    #[test]
    fn from_json_keeps_integers_and_floats_apart() {
        assert_eq!(Value::from_json(&json!(11)), Some(Value::Int(11)));
        assert_eq!(Value::from_json(&json!(42.1)), Some(Value::Float(42.1)));
        assert_eq!(Value::from_json(&json!(null)), None);
    }

    #[test]
    fn from_json_drops_nulls_in_objects() {
        let value = Value::from_json(&json!({"a": "x", "b": null})).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_str("a"), Some("x"));
    }

    #[test]
    fn resource_refs_have_no_json_form() {
        let value = Value::ResourceRef("rg".to_string(), "id".to_string());
        assert_eq!(value.to_json(), None);

        let list = Value::List(vec![Value::String("a".to_string()), value]);
        assert_eq!(list.to_json(), Some(json!(["a"])));
    }

    #[test]
    fn block_accessors() {
        let mut inner = HashMap::new();
        inner.insert("max_delivery_attempts".to_string(), Value::Int(11));
        let mut attrs = HashMap::new();
        attrs.insert("retry_policy".to_string(), Value::block(inner));
        attrs.insert(
            "labels".to_string(),
            Value::string_list(["test", "test1", "test2"]),
        );

        let retry = attrs.get_block("retry_policy").unwrap();
        assert_eq!(retry.get_int("max_delivery_attempts"), Some(11));
        assert_eq!(attrs.get_blocks("retry_policy").len(), 1);
        assert_eq!(attrs.get_strings("labels"), vec!["test", "test1", "test2"]);
        assert!(attrs.get_block("missing").is_none());
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
        assert_eq!(Value::String("2".to_string()).as_float(), None);
    }

    #[test]
    fn resource_id_display() {
        let id = ResourceId::new("eventgrid_event_subscription", "test");
        assert_eq!(id.to_string(), "eventgrid_event_subscription.test");
    }
}
