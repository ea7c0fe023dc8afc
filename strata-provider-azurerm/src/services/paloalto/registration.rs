use strata_core::provider::{ResourceType, ServiceRegistration};

use crate::generic::SchemaDrivenType;

pub struct Registration;

impl ServiceRegistration for Registration {
    fn name(&self) -> &'static str {
        "Palo Alto"
    }

    fn data_sources(&self) -> Vec<Box<dyn ResourceType>> {
        super::data_source_configs()
            .into_iter()
            .map(|(name, config)| {
                Box::new(SchemaDrivenType::data_source(name, config)) as Box<dyn ResourceType>
            })
            .collect()
    }

    fn resources(&self) -> Vec<Box<dyn ResourceType>> {
        super::configs()
            .into_iter()
            .map(|(name, config)| {
                Box::new(SchemaDrivenType::resource(name, config)) as Box<dyn ResourceType>
            })
            .collect()
    }

    fn website_categories(&self) -> Vec<&'static str> {
        vec!["Palo Alto"]
    }
}
