use strata_core::provider::{ResourceType, ServiceRegistration};

use super::api_tag_description::ApiTagDescriptionType;

pub struct Registration;

impl ServiceRegistration for Registration {
    fn name(&self) -> &'static str {
        "API Management"
    }

    fn data_sources(&self) -> Vec<Box<dyn ResourceType>> {
        Vec::new()
    }

    fn resources(&self) -> Vec<Box<dyn ResourceType>> {
        vec![Box::new(ApiTagDescriptionType)]
    }

    fn website_categories(&self) -> Vec<&'static str> {
        vec!["API Management"]
    }
}
