//! Provider - Trait abstracting resource operations
//!
//! A Provider maps resource configuration onto a remote management API.
//! Resource types are grouped into service registrations, which is what the
//! host enumerates to learn which resources and data sources exist.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Broad classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Other,
    /// The remote object does not exist
    NotFound,
    /// Create found an object that is not yet tracked by the host
    RequiresImport,
    /// The configuration failed schema validation
    Validation,
    /// Provider credentials or settings are unusable
    Configuration,
    /// The remote API rejected the request
    Api,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Other,
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ProviderErrorKind::Validation)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ProviderErrorKind::Configuration)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ProviderErrorKind::NotFound)
    }

    /// The object already exists remotely and must be imported before it can be managed
    pub fn requires_import(resource_type: &str, identifier: &str) -> Self {
        Self::new(format!(
            "A resource with the ID {:?} already exists - to be managed via this provider \
             this resource needs to be imported into the State. Please see the resource \
             documentation for {:?} for more information",
            identifier, resource_type
        ))
        .with_kind(ProviderErrorKind::RequiresImport)
    }

    pub fn with_kind(mut self, kind: ProviderErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_requires_import(&self) -> bool {
        self.kind == ProviderErrorKind::RequiresImport
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of a resource type (or data source) that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "eventgrid_event_subscription")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema;

    /// Data sources are read-only
    fn is_data_source(&self) -> bool {
        false
    }
}

/// Registration of one service package with the host
///
/// The host asks each registration for its display name, the data sources
/// and resources it contributes, and the documentation categories it
/// belongs to.
pub trait ServiceRegistration: Send + Sync {
    /// Display name (e.g., "Palo Alto")
    fn name(&self) -> &'static str;

    fn data_sources(&self) -> Vec<Box<dyn ResourceType>>;

    fn resources(&self) -> Vec<Box<dyn ResourceType>>;

    /// Documentation categories
    fn website_categories(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Main Provider trait
///
/// All operations are async and involve side effects.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "azurerm")
    fn name(&self) -> &'static str;

    /// Service registrations contributing resource types
    fn registrations(&self) -> Vec<Box<dyn ServiceRegistration>>;

    /// List of resource types and data sources this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        self.registrations()
            .into_iter()
            .flat_map(|r| {
                let mut types = r.resources();
                types.extend(r.data_sources());
                types
            })
            .collect()
    }

    /// Get the current state of a resource
    ///
    /// Data sources are looked up from their configuration; resources need
    /// the identifier returned by `create`.
    /// Returns `State::not_found()` if the resource does not exist.
    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Read a data source from its configuration
    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the remote ID
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn registrations(&self) -> Vec<Box<dyn ServiceRegistration>> {
        (**self).registrations()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, identifier)
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(resource)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier)
    }
}

/// Look up a resource type or data source by name
pub fn find_resource_type<P: Provider + ?Sized>(
    provider: &P,
    type_name: &str,
) -> Option<Box<dyn ResourceType>> {
    provider
        .resource_types()
        .into_iter()
        .find(|t| t.name() == type_name)
}

/// Validate a resource against its type's schema
///
/// Data sources are checked against the data source of that name.
pub fn validate_resource<P: Provider + ?Sized>(
    provider: &P,
    resource: &Resource,
) -> ProviderResult<()> {
    let resource_type = provider
        .resource_types()
        .into_iter()
        .find(|t| {
            t.name() == resource.id.resource_type && t.is_data_source() == resource.is_data_source()
        })
        .ok_or_else(|| {
            ProviderError::validation(format!(
                "Unknown resource type: {}",
                resource.id.resource_type
            ))
            .for_resource(resource.id.clone())
        })?;

    resource_type
        .schema()
        .validate(&resource.attributes)
        .map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ProviderError::validation(messages.join("; ")).for_resource(resource.id.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Value;
    use crate::schema::{AttributeSchema, AttributeType};

    struct MockType;

    impl ResourceType for MockType {
        fn name(&self) -> &'static str {
            "mock_thing"
        }

        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new("mock_thing")
                .attribute(AttributeSchema::new("name", AttributeType::String).required())
        }
    }

    struct MockRegistration;

    impl ServiceRegistration for MockRegistration {
        fn name(&self) -> &'static str {
            "Mock"
        }

        fn data_sources(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn resources(&self) -> Vec<Box<dyn ResourceType>> {
            vec![Box::new(MockType)]
        }
    }

    // Mock Provider for testing
    struct MockProvider;

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn registrations(&self) -> Vec<Box<dyn ServiceRegistration>> {
            vec![Box::new(MockRegistration)]
        }

        fn read(
            &self,
            id: &ResourceId,
            _identifier: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs).with_identifier("mock-id-123")) })
        }

        fn update(
            &self,
            id: &ResourceId,
            _identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs)) })
        }

        fn delete(&self, _id: &ResourceId, _identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider = MockProvider;
        let id = ResourceId::new("mock_thing", "example");
        let state = provider.read(&id, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn mock_provider_create_returns_existing() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let resource = Resource::new("mock_thing", "example");
        let state = provider.create(&resource).await.unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier, Some("mock-id-123".to_string()));
    }

    #[test]
    fn resource_types_come_from_registrations() {
        let provider = MockProvider;
        let names: Vec<_> = provider.resource_types().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["mock_thing"]);
        assert!(find_resource_type(&provider, "mock_thing").is_some());
        assert!(find_resource_type(&provider, "other").is_none());
    }

    #[test]
    fn validate_resource_reports_schema_errors() {
        let provider = MockProvider;
        let resource = Resource::new("mock_thing", "example");
        let err = validate_resource(&provider, &resource).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Validation);
        assert!(err.to_string().contains("'name' is missing"));

        let resource = resource.with_attribute("name", Value::String("x".to_string()));
        assert!(validate_resource(&provider, &resource).is_ok());
    }

    #[test]
    fn requires_import_message() {
        let err = ProviderError::requires_import("eventgrid_event_subscription", "/subscriptions/x");
        assert!(err.is_requires_import());
        assert!(err.message.contains("already exists"));
        assert!(err.message.contains("\"/subscriptions/x\""));
    }
}
