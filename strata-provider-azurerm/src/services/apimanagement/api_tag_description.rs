//! `api_management_api_tag_description`

use std::collections::HashMap;

use strata_core::provider::{ProviderError, ProviderResult, ResourceType};
use strata_core::resource::{Attributes, Resource, ResourceId, State, Value};
use strata_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::models::{TagDescriptionContract, TagDescriptionContractProperties};
use super::parse::{ApiTagDescriptionId, ApiTagId};
use crate::client::{ArmClient, ArmResultExt};

pub const TYPE_NAME: &str = "api_management_api_tag_description";
pub const API_VERSION: &str = "2022-08-01";

pub struct ApiTagDescriptionType;

impl ResourceType for ApiTagDescriptionType {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }
}

fn validate_api_tag_id(value: &Value) -> Result<(), String> {
    match value {
        Value::String(s) => ApiTagId::parse(s).map(|_| ()).map_err(|e| e.to_string()),
        _ => Err("Expected string".to_string()),
    }
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Manages the description of a tag on an API Management API")
        .attribute(
            AttributeSchema::new(
                "api_tag_id",
                AttributeType::Custom {
                    name: "ApiTagId".to_string(),
                    base: Box::new(AttributeType::String),
                    validate: validate_api_tag_id,
                },
            )
            .required()
            .force_new(),
        )
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(AttributeSchema::new(
            "external_documentation_url",
            types::https_url(),
        ))
        .attribute(AttributeSchema::new(
            "external_documentation_description",
            AttributeType::String,
        ))
}

fn expand(attributes: &HashMap<String, Value>) -> TagDescriptionContract {
    let text = |key: &str| attributes.get_str(key).map(str::to_string);
    TagDescriptionContract {
        properties: Some(TagDescriptionContractProperties {
            description: text("description"),
            external_docs_url: text("external_documentation_url"),
            external_docs_description: text("external_documentation_description"),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn flatten(
    id: &ApiTagDescriptionId,
    properties: &TagDescriptionContractProperties,
) -> HashMap<String, Value> {
    let mut attributes = HashMap::from([(
        "api_tag_id".to_string(),
        Value::String(id.tag_id().to_string()),
    )]);
    let fields = [
        ("description", &properties.description),
        ("external_documentation_url", &properties.external_docs_url),
        (
            "external_documentation_description",
            &properties.external_docs_description,
        ),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            attributes.insert(key.to_string(), Value::String(value.clone()));
        }
    }
    attributes
}

fn describe(id: &ApiTagDescriptionId) -> String {
    format!(
        "Tag Description {:?} (API {:?} / Service {:?} / Resource Group {:?})",
        id.tag_description_name, id.api_name, id.service_name, id.resource_group
    )
}

fn parse_identifier(id: &ResourceId, identifier: &str) -> ProviderResult<ApiTagDescriptionId> {
    ApiTagDescriptionId::parse(identifier).map_err(|e| ProviderError::from(e).for_resource(id.clone()))
}

pub async fn create(client: &ArmClient, resource: &Resource) -> ProviderResult<State> {
    let tag_id = resource
        .attributes
        .get_str("api_tag_id")
        .ok_or_else(|| ProviderError::validation("'api_tag_id' is required"))
        .and_then(|raw| ApiTagId::parse(raw).map_err(ProviderError::from))
        .map_err(|e| e.for_resource(resource.id.clone()))?;
    let id = ApiTagDescriptionId::for_tag(&tag_id);
    let path = id.to_string();

    let existing = client
        .get::<TagDescriptionContract>(&path, API_VERSION)
        .await
        .context(|| format!("checking for presence of existing {}", describe(&id)))
        .map_err(|e| e.for_resource(resource.id.clone()))?;
    if existing.is_some() {
        return Err(ProviderError::requires_import(TYPE_NAME, &path).for_resource(resource.id.clone()));
    }

    log::info!("Creating {}", describe(&id));
    client
        .put(&path, API_VERSION, &expand(&resource.attributes))
        .await
        .context(|| format!("creating {}", describe(&id)))
        .map_err(|e| e.for_resource(resource.id.clone()))?;

    read(client, &resource.id, &path).await
}

pub async fn read(client: &ArmClient, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
    let description_id = parse_identifier(id, identifier)?;
    let response = client
        .get::<TagDescriptionContract>(identifier, API_VERSION)
        .await
        .context(|| format!("retrieving {}", describe(&description_id)))
        .map_err(|e| e.for_resource(id.clone()))?;

    let Some(contract) = response else {
        log::info!("{} was not found - removing from state", describe(&description_id));
        return Ok(State::not_found(id.clone()));
    };
    let properties = contract.properties.unwrap_or_default();
    Ok(State::existing(id.clone(), flatten(&description_id, &properties))
        .with_identifier(description_id.to_string()))
}

/// Updates replace the whole description
pub async fn update(
    client: &ArmClient,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let description_id = parse_identifier(id, identifier)?;
    log::info!("Updating {}", describe(&description_id));
    client
        .put(identifier, API_VERSION, &expand(&to.attributes))
        .await
        .context(|| format!("updating {}", describe(&description_id)))
        .map_err(|e| e.for_resource(id.clone()))?;
    read(client, id, identifier).await
}

pub async fn delete(client: &ArmClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    let description_id = parse_identifier(id, identifier)?;
    log::info!("Deleting {}", describe(&description_id));
    client
        .delete(identifier, API_VERSION, Some("*"))
        .await
        .context(|| format!("deleting {}", describe(&description_id)))
        .map_err(|e| e.for_resource(id.clone()))
}

pub async fn exists(client: &ArmClient, identifier: &str) -> ProviderResult<bool> {
    let description_id = ApiTagDescriptionId::parse(identifier)?;
    let response = client
        .get::<TagDescriptionContract>(identifier, API_VERSION)
        .await
        .context(|| format!("retrieving {}", describe(&description_id)))?;
    Ok(response.is_some_and(|c| c.id.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::InMemoryArm;
    use serde_json::json;
    use strata_core::provider::ProviderErrorKind;

    const TAG: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG-1/providers/Microsoft.ApiManagement/service/acctestAM-1/apis/acctestapi-1/tags/acctest-Tag-1";
    const DESCRIPTION: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG-1/providers/Microsoft.ApiManagement/service/acctestAM-1/apis/acctestapi-1/tagDescriptions/acctest-Tag-1";

    fn s(value: &str) -> Value {
        Value::String(value.to_string())
    }

    fn basic() -> Resource {
        Resource::new(TYPE_NAME, "test")
            .with_attribute("api_tag_id", s(TAG))
            .with_attribute("description", s("tag description"))
            .with_attribute(
                "external_documentation_url",
                s("https://learn.microsoft.com/azure/api-management/"),
            )
            .with_attribute(
                "external_documentation_description",
                s("external tag description"),
            )
    }

    #[test]
    fn schema_validates_tag_id_and_url() {
        assert!(schema().validate(&basic().attributes).is_ok());

        let bad_tag = basic().with_attribute("api_tag_id", s("/subscriptions/x"));
        assert!(schema().validate(&bad_tag.attributes).is_err());

        let bad_url = basic().with_attribute("external_documentation_url", s("http://example.com"));
        assert!(schema().validate(&bad_url.attributes).is_err());
    }

    #[tokio::test]
    async fn lifecycle() {
        let arm = InMemoryArm::new();
        let client = arm.client();
        let resource = basic();

        let state = create(&client, &resource).await.unwrap();
        assert_eq!(state.identifier.as_deref(), Some(DESCRIPTION));
        assert_eq!(state.attributes.get_str("api_tag_id"), Some(TAG));
        assert_eq!(
            arm.stored(DESCRIPTION).unwrap()["properties"],
            json!({
                "description": "tag description",
                "externalDocsUrl": "https://learn.microsoft.com/azure/api-management/",
                "externalDocsDescription": "external tag description"
            })
        );

        let updated = basic()
            .with_attribute("description", s("tag description update"))
            .with_attribute(
                "external_documentation_url",
                s("https://learn.microsoft.com/azure/"),
            )
            .with_attribute(
                "external_documentation_description",
                s("external tag description update"),
            );
        let state = update(&client, &resource.id, DESCRIPTION, &updated).await.unwrap();
        assert_eq!(state.attributes.get_str("description"), Some("tag description update"));
        assert_eq!(
            state.attributes.get_str("external_documentation_description"),
            Some("external tag description update")
        );

        assert!(exists(&client, DESCRIPTION).await.unwrap());
        delete(&client, &resource.id, DESCRIPTION).await.unwrap();
        assert!(!exists(&client, DESCRIPTION).await.unwrap());
        assert!(!read(&client, &resource.id, DESCRIPTION).await.unwrap().exists);
    }

    #[tokio::test]
    async fn second_create_requires_import() {
        let arm = InMemoryArm::new();
        let client = arm.client();
        create(&client, &basic()).await.unwrap();

        let import = Resource::new(TYPE_NAME, "import").with_attribute("api_tag_id", s(TAG));
        let err = create(&client, &import).await.unwrap_err();
        assert!(err.is_requires_import());
        assert!(err.message.contains(DESCRIPTION));
    }

    #[tokio::test]
    async fn read_rejects_tag_ids() {
        let client = InMemoryArm::new().client();
        let err = read(&client, &ResourceId::new(TYPE_NAME, "test"), TAG)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Validation);
    }
}
