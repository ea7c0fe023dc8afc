use std::fmt;

use crate::resourceids::IdParseError;

const PROVIDER_SEGMENT: &str = "/providers/Microsoft.EventGrid/eventSubscriptions/";

/// `{scope}/providers/Microsoft.EventGrid/eventSubscriptions/{name}`
///
/// The scope is any ARM ID (subscription, resource group, topic, storage
/// account, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSubscriptionId {
    pub scope: String,
    pub name: String,
}

impl EventSubscriptionId {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }

    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let lower = id.to_ascii_lowercase();
        let index = lower
            .rfind(&PROVIDER_SEGMENT.to_ascii_lowercase())
            .ok_or_else(|| IdParseError::MissingSegment {
                id: id.to_string(),
                expected: "providers/Microsoft.EventGrid/eventSubscriptions/{name}".to_string(),
            })?;

        let scope = &id[..index];
        let name = &id[index + PROVIDER_SEGMENT.len()..];
        if scope.is_empty() || !scope.starts_with('/') {
            return Err(IdParseError::Invalid {
                id: id.to_string(),
                reason: "the scope must be an absolute resource ID".to_string(),
            });
        }
        if name.is_empty() || name.contains('/') {
            return Err(IdParseError::Invalid {
                id: id.to_string(),
                reason: format!("invalid event subscription name {:?}", name),
            });
        }
        Ok(Self::new(scope, name))
    }
}

impl fmt::Display for EventSubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.scope, PROVIDER_SEGMENT, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resource_group_scope() {
        let id = EventSubscriptionId::parse(
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.EventGrid/eventSubscriptions/sub1",
        )
        .unwrap();
        assert_eq!(id.scope, "/subscriptions/sub/resourceGroups/rg");
        assert_eq!(id.name, "sub1");
    }

    #[test]
    fn parses_nested_scope_case_insensitively() {
        let raw = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/acc/providers/microsoft.eventgrid/eventsubscriptions/sub1";
        let id = EventSubscriptionId::parse(raw).unwrap();
        assert_eq!(
            id.scope,
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/acc"
        );
        assert_eq!(id.name, "sub1");
    }

    #[test]
    fn display_round_trips() {
        let raw = "/subscriptions/sub/providers/Microsoft.EventGrid/eventSubscriptions/sub1";
        assert_eq!(EventSubscriptionId::parse(raw).unwrap().to_string(), raw);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(EventSubscriptionId::parse("/subscriptions/sub/resourceGroups/rg").is_err());
        assert!(
            EventSubscriptionId::parse("/providers/Microsoft.EventGrid/eventSubscriptions/x")
                .is_err()
        );
        assert!(
            EventSubscriptionId::parse(
                "/subscriptions/sub/providers/Microsoft.EventGrid/eventSubscriptions/"
            )
            .is_err()
        );
    }
}
