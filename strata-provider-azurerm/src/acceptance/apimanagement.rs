use strata_core::provider::{BoxFuture, ProviderResult};
use strata_core::resource::Resource;

use super::{Config, ExistsInAzure, TestData, prerequisite, s};
use crate::provider::AzureRmProvider;
use crate::services::apimanagement::api_tag_description::{self, TYPE_NAME};

/// Existing API tag (`ARM_TEST_API_MANAGEMENT_API_TAG_ID`) the descriptions attach to
#[derive(Debug, Clone)]
pub struct ApiTagDescriptionFixture {
    pub api_tag_id: String,
}

impl ApiTagDescriptionFixture {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_tag_id: prerequisite("API_MANAGEMENT_API_TAG_ID")?,
        })
    }

    fn description(&self, label: &str, description: &str, url: &str, docs: &str) -> Resource {
        Resource::new(TYPE_NAME, label)
            .with_attribute("api_tag_id", s(&self.api_tag_id))
            .with_attribute("description", s(description))
            .with_attribute("external_documentation_url", s(url))
            .with_attribute("external_documentation_description", s(docs))
    }

    pub fn basic(&self, _data: &TestData) -> Config {
        Config::new(vec![self.description(
            "test",
            "tag description",
            "https://learn.microsoft.com/azure/api-management/",
            "external tag description",
        )])
    }

    /// `basic` plus a copy of its description under another label
    pub fn requires_import(&self, data: &TestData) -> Config {
        let mut config = self.basic(data);
        let import = config.resource("test").cloned().map(|mut resource| {
            resource.id.name = "import".to_string();
            resource
        });
        config.resources.extend(import);
        config
    }

    pub fn update(&self, _data: &TestData) -> Config {
        Config::new(vec![self.description(
            "test",
            "tag description update",
            "https://learn.microsoft.com/azure/",
            "external tag description update",
        )])
    }
}

impl ExistsInAzure for ApiTagDescriptionFixture {
    fn exists<'a>(
        &'a self,
        provider: &'a AzureRmProvider,
        identifier: &'a str,
    ) -> BoxFuture<'a, ProviderResult<bool>> {
        Box::pin(api_tag_description::exists(provider.client(), identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::apimanagement::api_tag_description::schema;
    use strata_core::resource::Attributes;

    fn fixture() -> ApiTagDescriptionFixture {
        ApiTagDescriptionFixture {
            api_tag_id: "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG-1/providers/Microsoft.ApiManagement/service/acctestAM-1/apis/acctestapi-1/tags/acctest-Tag-1".to_string(),
        }
    }

    #[test]
    fn scenarios_validate() {
        let data = TestData::build_with_env(TYPE_NAME, "test", |_| None);
        for config in [
            fixture().basic(&data),
            fixture().requires_import(&data),
            fixture().update(&data),
        ] {
            for resource in &config.resources {
                assert!(schema().validate(&resource.attributes).is_ok());
            }
        }
    }

    #[test]
    fn import_copies_the_tag() {
        let data = TestData::build_with_env(TYPE_NAME, "test", |_| None);
        let config = fixture().requires_import(&data);
        assert_eq!(config.resources.len(), 2);
        assert_eq!(
            config.resource("import").unwrap().attributes.get_str("api_tag_id"),
            Some(fixture().api_tag_id.as_str())
        );
    }
}
