//! Palo Alto Networks Cloud NGFW
//!
//! Every Palo Alto resource is schema-driven; `configs` holds one
//! `ArmSchemaConfig` per resource type.

pub mod firewall;
mod registration;
pub mod rulestack;

pub use registration::Registration;

use crate::generic::ArmSchemaConfig;

pub const API_VERSION: &str = "2022-08-29";
pub const RULESTACKS: &str = "PaloAltoNetworks.Cloudngfw/localRulestacks";

/// Resource configurations keyed by type name
pub fn configs() -> Vec<(&'static str, ArmSchemaConfig)> {
    vec![
        (rulestack::LOCAL_RULESTACK, rulestack::local_rulestack()),
        (rulestack::CERTIFICATE, rulestack::certificate()),
        (rulestack::FQDN_LIST, rulestack::fqdn_list()),
        (
            rulestack::OUTBOUND_TRUST_CERTIFICATE_ASSOCIATION,
            rulestack::outbound_trust_certificate_association(),
        ),
        (
            rulestack::OUTBOUND_UNTRUST_CERTIFICATE_ASSOCIATION,
            rulestack::outbound_untrust_certificate_association(),
        ),
        (rulestack::PREFIX_LIST, rulestack::prefix_list()),
        (rulestack::RULE, rulestack::rule()),
        (
            firewall::VIRTUAL_NETWORK_APPLIANCE,
            firewall::virtual_network_appliance(),
        ),
        (firewall::VHUB_LOCAL_RULESTACK, firewall::vhub_local_rulestack()),
        (firewall::VHUB_PANORAMA, firewall::vhub_panorama()),
        (firewall::VNET_LOCAL_RULESTACK, firewall::vnet_local_rulestack()),
        (firewall::VNET_PANORAMA, firewall::vnet_panorama()),
    ]
}

/// Data source configurations keyed by type name
pub fn data_source_configs() -> Vec<(&'static str, ArmSchemaConfig)> {
    vec![(
        rulestack::LOCAL_RULESTACK,
        rulestack::local_rulestack_data_source(),
    )]
}

/// Configuration of the resource (or data source) `type_name`
pub fn config(type_name: &str, data_source: bool) -> Option<ArmSchemaConfig> {
    let configs = if data_source {
        data_source_configs()
    } else {
        configs()
    };
    configs
        .into_iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, config)| config)
}
