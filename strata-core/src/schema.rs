//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type,
//! enabling validation before any API call is made.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Floating point number (integers are accepted)
    Float,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block, represented as a list of attribute maps
    Block(BlockSchema),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            // ResourceRef values resolve to strings at runtime, so they're valid for String types
            (AttributeType::String, Value::String(_) | Value::ResourceRef(_, _)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Float, Value::Float(_) | Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { base, .. }, Value::ResourceRef(_, _)) => base.validate(value),
            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::List(items)) => block.validate_items(items),
            (AttributeType::Block(block), Value::Map(map)) => {
                block.validate_items(&[Value::Map(map.clone())])
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Float => "Float".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }

    /// Shorthand for an enum over static strings
    pub fn enumeration(variants: &[&str]) -> Self {
        AttributeType::Enum(variants.iter().map(|v| v.to_string()).collect())
    }

    pub fn list_of(inner: AttributeType) -> Self {
        AttributeType::List(Box::new(inner))
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' conflicts with '{other}'")]
    Conflict { name: String, other: String },

    #[error("Exactly one of {} must be set, got {got}", names.join(", "))]
    ExactlyOneOf { names: Vec<String>, got: usize },

    #[error("Expected between {min} and {max} blocks, got {got}")]
    BlockCount { min: usize, max: usize, got: usize },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("In attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::ResourceRef(binding, attr) => format!("ResourceRef({}.{})", binding, attr),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the remote API; may also be supplied when not `required`
    pub computed: bool,
    /// Changing this attribute requires the resource to be recreated
    pub force_new: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Provider-side property path (e.g., "properties.auditComment")
    pub provider_name: Option<String>,
    pub conflicts_with: Vec<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            default: None,
            description: None,
            provider_name: None,
            conflicts_with: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    pub fn conflicts_with(mut self, names: &[&str]) -> Self {
        self.conflicts_with = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

/// Schema of a nested block
#[derive(Debug, Clone)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
    pub min_items: usize,
    pub max_items: usize,
}

impl BlockSchema {
    /// A block that may appear any number of times
    pub fn new() -> Self {
        Self {
            attributes: HashMap::new(),
            min_items: 0,
            max_items: usize::MAX,
        }
    }

    /// A block that may appear at most once
    pub fn single() -> Self {
        Self {
            max_items: 1,
            ..Self::new()
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = max;
        self
    }

    pub fn with_min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    fn validate_items(&self, items: &[Value]) -> Result<(), TypeError> {
        if items.len() < self.min_items || items.len() > self.max_items {
            return Err(TypeError::BlockCount {
                min: self.min_items,
                max: self.max_items,
                got: items.len(),
            });
        }
        for (index, item) in items.iter().enumerate() {
            let map = match item {
                Value::Map(map) => map,
                other => {
                    return Err(TypeError::ListItemError {
                        index,
                        inner: Box::new(TypeError::TypeMismatch {
                            expected: "Map".to_string(),
                            got: other.type_name(),
                        }),
                    });
                }
            };
            let errors = validate_attributes(&self.attributes, map);
            if let Some(first) = errors.into_iter().next() {
                return Err(TypeError::ListItemError {
                    index,
                    inner: Box::new(first),
                });
            }
        }
        Ok(())
    }
}

impl Default for BlockSchema {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> Vec<TypeError> {
    let mut errors = Vec::new();
    let mut conflicts = BTreeSet::new();

    // Check required attributes
    for (name, schema) in schemas {
        if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired { name: name.clone() });
        }
    }

    // Type check each attribute
    for (name, value) in attributes {
        match schemas.get(name) {
            Some(schema) => {
                if let Err(e) = schema.attr_type.validate(value) {
                    errors.push(TypeError::AttributeError {
                        name: name.clone(),
                        inner: Box::new(e),
                    });
                }
                for other in &schema.conflicts_with {
                    if attributes.contains_key(other) {
                        let pair = if name < other {
                            (name.clone(), other.clone())
                        } else {
                            (other.clone(), name.clone())
                        };
                        conflicts.insert(pair);
                    }
                }
            }
            None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
        }
    }

    // Each pair once, whichever side declared it
    for (name, other) in conflicts {
        errors.push(TypeError::Conflict { name, other });
    }

    errors
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
    /// Groups of attributes of which exactly one must be set
    pub exactly_one_of: Vec<Vec<String>>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
            exactly_one_of: Vec::new(),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn exactly_one_of(mut self, names: &[&str]) -> Self {
        self.exactly_one_of
            .push(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Names of attributes whose change forces recreation
    pub fn force_new_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = validate_attributes(&self.attributes, attributes);

        for group in &self.exactly_one_of {
            let got = group.iter().filter(|n| attributes.contains_key(*n)).count();
            if got != 1 {
                errors.push(TypeError::ExactlyOneOf {
                    names: group.clone(),
                    got,
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// Integer in the closed range `[MIN, MAX]`
    pub fn int_between<const MIN: i64, const MAX: i64>() -> AttributeType {
        AttributeType::Custom {
            name: format!("Int({}..={})", MIN, MAX),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if (MIN..=MAX).contains(n) => Ok(()),
                Value::Int(n) => Err(format!(
                    "Value {} out of range, expected {} to {}",
                    n, MIN, MAX
                )),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// Azure Resource Manager ID (e.g., "/subscriptions/.../resourceGroups/rg")
    pub fn arm_resource_id() -> AttributeType {
        AttributeType::Custom {
            name: "ResourceId".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_arm_resource_id(s),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// Absolute https URL
    pub fn https_url() -> AttributeType {
        AttributeType::Custom {
            name: "HttpsUrl".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) if s.starts_with("https://") && s.len() > "https://".len() => {
                    Ok(())
                }
                Value::String(s) => Err(format!("'{}' is not an https URL", s)),
                _ => Err("Expected string".to_string()),
            },
        }
    }
}

/// Validate the shape of an ARM resource ID
pub fn validate_arm_resource_id(id: &str) -> Result<(), String> {
    if !id.starts_with('/') {
        return Err(format!("Invalid resource ID '{}': must start with '/'", id));
    }
    let segments: Vec<&str> = id.trim_start_matches('/').split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(format!("Invalid resource ID '{}': empty segment", id));
    }
    // Management group scopes are the only IDs not rooted at a subscription
    let root = segments[0];
    if !root.eq_ignore_ascii_case("subscriptions") && !root.eq_ignore_ascii_case("providers") {
        return Err(format!(
            "Invalid resource ID '{}': expected '/subscriptions/...' or '/providers/...'",
            id
        ));
    }
    if segments.len() % 2 != 0 {
        return Err(format!(
            "Invalid resource ID '{}': segments must come in key/value pairs",
            id
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_float_accepts_int() {
        let t = AttributeType::Float;
        assert!(t.validate(&Value::Float(42.1)).is_ok());
        assert!(t.validate(&Value::Int(42)).is_ok());
        assert!(t.validate(&Value::Bool(true)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::enumeration(&["EventGridSchema", "CloudEventSchemaV1_0"]);
        assert!(
            t.validate(&Value::String("CloudEventSchemaV1_0".to_string()))
                .is_ok()
        );
        assert!(t.validate(&Value::String("Other".to_string())).is_err());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(100)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
    }

    #[test]
    fn validate_int_between() {
        let t = types::int_between::<1, 30>();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(30)).is_ok());
        assert!(t.validate(&Value::Int(31)).is_err());
        assert!(t.validate(&Value::String("1".to_string())).is_err());
    }

    #[test]
    fn validate_resource_id() {
        let t = types::arm_resource_id();
        assert!(
            t.validate(&Value::String(
                "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg".to_string()
            ))
            .is_ok()
        );
        assert!(
            t.validate(&Value::String(
                "/providers/Microsoft.Management/managementGroups/mg".to_string()
            ))
            .is_ok()
        );
        assert!(t.validate(&Value::String("rg".to_string())).is_err());
        assert!(
            t.validate(&Value::String("/subscriptions/abc/resourceGroups".to_string()))
                .is_err()
        );
        // References are resolved by the host later
        assert!(
            t.validate(&Value::ResourceRef("rg".to_string(), "id".to_string()))
                .is_ok()
        );
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", types::positive_int()))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("count".to_string(), Value::Int(5));
        attrs.insert("enabled".to_string(), Value::Bool(true));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("tag_description")
            .attribute(AttributeSchema::new("api_tag_id", AttributeType::String).required());

        let attrs = HashMap::new();
        let errors = schema.validate(&attrs).unwrap_err();
        assert!(matches!(errors[0], TypeError::MissingRequired { .. }));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let schema = ResourceSchema::new("r")
            .attribute(AttributeSchema::new("name", AttributeType::String));
        let mut attrs = HashMap::new();
        attrs.insert("nmae".to_string(), Value::String("x".to_string()));
        let errors = schema.validate(&attrs).unwrap_err();
        assert!(matches!(&errors[0], TypeError::UnknownAttribute { name } if name == "nmae"));
    }

    #[test]
    fn exactly_one_of_endpoints() {
        let schema = ResourceSchema::new("subscription")
            .attribute(AttributeSchema::new("a", AttributeType::String))
            .attribute(AttributeSchema::new("b", AttributeType::String))
            .exactly_one_of(&["a", "b"]);

        let mut attrs = HashMap::new();
        assert!(schema.validate(&attrs).is_err());
        attrs.insert("a".to_string(), Value::String("x".to_string()));
        assert!(schema.validate(&attrs).is_ok());
        attrs.insert("b".to_string(), Value::String("y".to_string()));
        let errors = schema.validate(&attrs).unwrap_err();
        assert!(matches!(errors[0], TypeError::ExactlyOneOf { got: 2, .. }));
    }

    #[test]
    fn conflicting_attributes_reported_once() {
        let schema = ResourceSchema::new("r")
            .attribute(AttributeSchema::new("a", AttributeType::String).conflicts_with(&["b"]))
            .attribute(AttributeSchema::new("b", AttributeType::String).conflicts_with(&["a"]));
        let mut attrs = HashMap::new();
        attrs.insert("a".to_string(), Value::String("x".to_string()));
        attrs.insert("b".to_string(), Value::String("y".to_string()));
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn block_validation_recurses_and_counts() {
        let retry = BlockSchema::single()
            .attribute(
                AttributeSchema::new("max_delivery_attempts", types::int_between::<1, 30>())
                    .required(),
            );
        let t = AttributeType::Block(retry);

        let mut ok = HashMap::new();
        ok.insert("max_delivery_attempts".to_string(), Value::Int(11));
        assert!(t.validate(&Value::block(ok.clone())).is_ok());

        let mut bad = HashMap::new();
        bad.insert("max_delivery_attempts".to_string(), Value::Int(31));
        assert!(t.validate(&Value::block(bad)).is_err());

        let two = Value::List(vec![Value::Map(ok.clone()), Value::Map(ok)]);
        assert!(matches!(
            t.validate(&two),
            Err(TypeError::BlockCount { max: 1, got: 2, .. })
        ));
    }

    #[test]
    fn force_new_attributes_sorted() {
        let schema = ResourceSchema::new("r")
            .attribute(AttributeSchema::new("scope", AttributeType::String).force_new())
            .attribute(AttributeSchema::new("name", AttributeType::String).force_new())
            .attribute(AttributeSchema::new("labels", AttributeType::String));
        assert_eq!(schema.force_new_attributes(), vec!["name", "scope"]);
    }
}
