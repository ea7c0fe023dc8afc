use strata_core::provider::{ResourceType, ServiceRegistration};

use super::event_subscription::EventSubscriptionType;

pub struct Registration;

impl ServiceRegistration for Registration {
    fn name(&self) -> &'static str {
        "EventGrid"
    }

    fn data_sources(&self) -> Vec<Box<dyn ResourceType>> {
        Vec::new()
    }

    fn resources(&self) -> Vec<Box<dyn ResourceType>> {
        vec![Box::new(EventSubscriptionType)]
    }

    fn website_categories(&self) -> Vec<&'static str> {
        vec!["Messaging"]
    }
}
