use strata_core::provider::{ResourceType, ServiceRegistration};

use super::backend_address_pool_association::BackendAddressPoolAssociationType;
use super::web_application_firewall_policy::WebApplicationFirewallPolicyType;

pub struct Registration;

impl ServiceRegistration for Registration {
    fn name(&self) -> &'static str {
        "Network"
    }

    fn data_sources(&self) -> Vec<Box<dyn ResourceType>> {
        Vec::new()
    }

    fn resources(&self) -> Vec<Box<dyn ResourceType>> {
        vec![
            Box::new(BackendAddressPoolAssociationType),
            Box::new(WebApplicationFirewallPolicyType),
        ]
    }

    fn website_categories(&self) -> Vec<&'static str> {
        vec!["Network"]
    }
}
