use std::fmt;

use crate::resourceids::{IdParseError, Segment, parse_segments};

/// Segments shared by every ID below an API of an API Management service
const API_PREFIX: [Segment; 5] = [
    Segment::Named("subscriptions", "subscription_id"),
    Segment::Named("resourceGroups", "resource_group"),
    Segment::Fixed("providers", "Microsoft.ApiManagement"),
    Segment::Named("service", "service_name"),
    Segment::Named("apis", "api_name"),
];

fn parse_api_child(
    id: &str,
    child: Segment,
) -> Result<(String, String, String, String, String), IdParseError> {
    let mut pattern = API_PREFIX.to_vec();
    pattern.push(child);
    let parsed = parse_segments(id, &pattern)?;
    Ok((
        parsed.get("subscription_id").to_string(),
        parsed.get("resource_group").to_string(),
        parsed.get("service_name").to_string(),
        parsed.get("api_name").to_string(),
        parsed.get("tag_name").to_string(),
    ))
}

/// Tag assigned to an API:
/// `/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ApiManagement/service/{}/apis/{}/tags/{}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTagId {
    pub subscription_id: String,
    pub resource_group: String,
    pub service_name: String,
    pub api_name: String,
    pub tag_name: String,
}

impl ApiTagId {
    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let (subscription_id, resource_group, service_name, api_name, tag_name) =
            parse_api_child(id, Segment::Named("tags", "tag_name"))?;
        Ok(Self {
            subscription_id,
            resource_group,
            service_name,
            api_name,
            tag_name,
        })
    }
}

impl fmt::Display for ApiTagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ApiManagement/service/{}/apis/{}/tags/{}",
            self.subscription_id, self.resource_group, self.service_name, self.api_name, self.tag_name
        )
    }
}

/// Description of a tag on an API; shares its name with the tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTagDescriptionId {
    pub subscription_id: String,
    pub resource_group: String,
    pub service_name: String,
    pub api_name: String,
    pub tag_description_name: String,
}

impl ApiTagDescriptionId {
    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let (subscription_id, resource_group, service_name, api_name, tag_name) =
            parse_api_child(id, Segment::Named("tagDescriptions", "tag_name"))?;
        Ok(Self {
            subscription_id,
            resource_group,
            service_name,
            api_name,
            tag_description_name: tag_name,
        })
    }

    pub fn for_tag(tag: &ApiTagId) -> Self {
        Self {
            subscription_id: tag.subscription_id.clone(),
            resource_group: tag.resource_group.clone(),
            service_name: tag.service_name.clone(),
            api_name: tag.api_name.clone(),
            tag_description_name: tag.tag_name.clone(),
        }
    }

    pub fn tag_id(&self) -> ApiTagId {
        ApiTagId {
            subscription_id: self.subscription_id.clone(),
            resource_group: self.resource_group.clone(),
            service_name: self.service_name.clone(),
            api_name: self.api_name.clone(),
            tag_name: self.tag_description_name.clone(),
        }
    }
}

impl fmt::Display for ApiTagDescriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ApiManagement/service/{}/apis/{}/tagDescriptions/{}",
            self.subscription_id,
            self.resource_group,
            self.service_name,
            self.api_name,
            self.tag_description_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ApiManagement/service/apim1/apis/api1/tags/tag1";

    #[test]
    fn tag_id_round_trip() {
        let id = ApiTagId::parse(TAG).unwrap();
        assert_eq!(id.service_name, "apim1");
        assert_eq!(id.api_name, "api1");
        assert_eq!(id.tag_name, "tag1");
        assert_eq!(id.to_string(), TAG);
    }

    #[test]
    fn description_id_mirrors_the_tag() {
        let tag = ApiTagId::parse(TAG).unwrap();
        let description = ApiTagDescriptionId::for_tag(&tag);
        assert_eq!(
            description.to_string(),
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ApiManagement/service/apim1/apis/api1/tagDescriptions/tag1"
        );
        assert_eq!(
            ApiTagDescriptionId::parse(&description.to_string()).unwrap(),
            description
        );
        assert_eq!(description.tag_id(), tag);
    }

    #[test]
    fn tag_and_description_ids_are_not_interchangeable() {
        assert!(ApiTagDescriptionId::parse(TAG).is_err());
        assert!(
            ApiTagId::parse(
                "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ApiManagement/service/apim1/apis/api1"
            )
            .is_err()
        );
    }
}
