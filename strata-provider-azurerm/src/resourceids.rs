//! Parsing of Azure Resource Manager IDs
//!
//! An ARM ID is a sequence of `key/value` segment pairs. Parsers describe the
//! expected pairs; keys match case-insensitively, values are kept verbatim.

use std::collections::HashMap;
use std::fmt;

use strata_core::provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("parsing {id:?}: expected the segment {expected:?}")]
    MissingSegment { id: String, expected: String },

    #[error("parsing {id:?}: {reason}")]
    Invalid { id: String, reason: String },
}

impl From<IdParseError> for ProviderError {
    fn from(error: IdParseError) -> Self {
        ProviderError::validation(error.to_string()).with_cause(error)
    }
}

/// One `key/value` pair of an ID pattern
#[derive(Debug, Clone, Copy)]
pub enum Segment {
    /// Key and value are both fixed (e.g. `providers/Microsoft.EventGrid`)
    Fixed(&'static str, &'static str),
    /// Fixed key, user-supplied value captured under a name
    Named(&'static str, &'static str),
}

/// Values captured while parsing an ID
#[derive(Debug, Default)]
pub struct ParsedId {
    values: HashMap<&'static str, String>,
}

impl ParsedId {
    /// Captured value; patterns guarantee every named segment is present
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// Match `id` against a complete pattern
pub fn parse_segments(id: &str, pattern: &[Segment]) -> Result<ParsedId, IdParseError> {
    let trimmed = id.strip_prefix('/').ok_or_else(|| IdParseError::Invalid {
        id: id.to_string(),
        reason: "ID must start with '/'".to_string(),
    })?;
    let parts: Vec<&str> = trimmed.split('/').collect();

    let mut parsed = ParsedId::default();
    let mut index = 0;
    for segment in pattern {
        let (key, expected) = match segment {
            Segment::Fixed(key, value) => (*key, format!("{}/{}", key, value)),
            Segment::Named(key, name) => (*key, format!("{}/{{{}}}", key, name)),
        };
        let missing = || IdParseError::MissingSegment {
            id: id.to_string(),
            expected: expected.clone(),
        };

        let actual_key = parts.get(index).ok_or_else(missing)?;
        let value = parts.get(index + 1).filter(|v| !v.is_empty()).ok_or_else(missing)?;
        if !actual_key.eq_ignore_ascii_case(key) {
            return Err(missing());
        }
        match segment {
            Segment::Fixed(_, fixed) => {
                if !value.eq_ignore_ascii_case(fixed) {
                    return Err(missing());
                }
            }
            Segment::Named(_, name) => {
                parsed.values.insert(*name, value.to_string());
            }
        }
        index += 2;
    }

    if index != parts.len() {
        return Err(IdParseError::Invalid {
            id: id.to_string(),
            reason: format!("unexpected trailing segments '{}'", parts[index..].join("/")),
        });
    }
    Ok(parsed)
}

/// `/subscriptions/{subscription_id}/resourceGroups/{resource_group}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroupId {
    pub subscription_id: String,
    pub resource_group: String,
}

impl ResourceGroupId {
    pub fn new(subscription_id: impl Into<String>, resource_group: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
        }
    }

    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let parsed = parse_segments(
            id,
            &[
                Segment::Named("subscriptions", "subscription_id"),
                Segment::Named("resourceGroups", "resource_group"),
            ],
        )?;
        Ok(Self::new(
            parsed.get("subscription_id"),
            parsed.get("resource_group"),
        ))
    }

    /// Resource group prefix of any ID inside a resource group
    pub fn containing(id: &str) -> Result<Self, IdParseError> {
        let prefix: Vec<&str> = id.trim_start_matches('/').splitn(5, '/').take(4).collect();
        Self::parse(&format!("/{}", prefix.join("/")))
    }
}

impl fmt::Display for ResourceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )
    }
}
