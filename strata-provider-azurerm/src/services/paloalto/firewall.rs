//! Next generation firewalls and the virtual hub appliance they attach to

use serde_json::json;
use strata_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::API_VERSION;
use crate::convert::Codec;
use crate::generic::{ArmSchemaConfig, Placement};

pub const VIRTUAL_NETWORK_APPLIANCE: &str = "palo_alto_virtual_network_appliance";
pub const VHUB_LOCAL_RULESTACK: &str =
    "palo_alto_next_generation_firewall_virtual_hub_local_rulestack";
pub const VHUB_PANORAMA: &str = "palo_alto_next_generation_firewall_virtual_hub_panorama";
pub const VNET_LOCAL_RULESTACK: &str =
    "palo_alto_next_generation_firewall_virtual_network_local_rulestack";
pub const VNET_PANORAMA: &str = "palo_alto_next_generation_firewall_virtual_network_panorama";

const FIREWALLS: &str = "PaloAltoNetworks.Cloudngfw/firewalls";
const APPLIANCES: &str = "Microsoft.Network/networkVirtualAppliances";
const NETWORK_API_VERSION: &str = "2023-04-01";

const CODECS: &[(&str, Codec)] = &[
    ("public_ip_address_ids", Codec::ResourceIdList),
    ("egress_nat_ip_address_ids", Codec::ResourceIdList),
];

pub fn virtual_network_appliance() -> ArmSchemaConfig {
    ArmSchemaConfig {
        arm_type: APPLIANCES,
        api_version: NETWORK_API_VERSION,
        placement: Placement::SameResourceGroup {
            reference_attribute: "virtual_hub_id",
        },
        name_attribute: "name",
        has_location: false,
        has_tags: false,
        codecs: &[],
        defaults: vec![(
            "properties.delegation.serviceName",
            json!("PaloAltoNetworks.Cloudngfw/firewalls"),
        )],
        schema: ResourceSchema::new(VIRTUAL_NETWORK_APPLIANCE)
            .with_description("Palo Alto Networks virtual appliance in a Virtual Hub")
            .attribute(
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("virtual_hub_id", types::arm_resource_id())
                    .required()
                    .force_new()
                    .with_provider_name("properties.virtualHub.id"),
            ),
    }
}

fn ip_ids(name: &str, path: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::list_of(types::arm_resource_id()))
        .with_provider_name(path)
}

fn vnet_network_profile() -> AttributeType {
    AttributeType::Block(
        BlockSchema::single()
            .with_min_items(1)
            .attribute(ip_ids("public_ip_address_ids", "publicIps").required())
            .attribute(ip_ids("egress_nat_ip_address_ids", "egressNatIp"))
            .attribute(
                AttributeSchema::new(
                    "vnet_configuration",
                    AttributeType::Block(
                        BlockSchema::single()
                            .with_min_items(1)
                            .attribute(
                                AttributeSchema::new("virtual_network_id", types::arm_resource_id())
                                    .required()
                                    .with_provider_name("vnet.resourceId"),
                            )
                            .attribute(
                                AttributeSchema::new("trusted_subnet_id", types::arm_resource_id())
                                    .with_provider_name("trustSubnet.resourceId"),
                            )
                            .attribute(
                                AttributeSchema::new(
                                    "untrusted_subnet_id",
                                    types::arm_resource_id(),
                                )
                                .with_provider_name("unTrustSubnet.resourceId"),
                            ),
                    ),
                )
                .required()
                .with_provider_name("vnetConfiguration"),
            ),
    )
}

fn vhub_network_profile() -> AttributeType {
    AttributeType::Block(
        BlockSchema::single()
            .with_min_items(1)
            .attribute(ip_ids("public_ip_address_ids", "publicIps").required())
            .attribute(ip_ids("egress_nat_ip_address_ids", "egressNatIp"))
            .attribute(
                AttributeSchema::new("virtual_hub_id", types::arm_resource_id())
                    .required()
                    .with_provider_name("vwanConfiguration.vHub.resourceId"),
            )
            .attribute(
                AttributeSchema::new("network_virtual_appliance_id", types::arm_resource_id())
                    .required()
                    .with_provider_name("vwanConfiguration.networkVirtualApplianceId"),
            ),
    )
}

enum Network {
    VirtualNetwork,
    VirtualHub,
}

enum Management {
    LocalRulestack,
    Panorama,
}

fn firewall(type_name: &str, network: Network, management: Management) -> ArmSchemaConfig {
    let (profile, network_type) = match network {
        Network::VirtualNetwork => (vnet_network_profile(), "VNET"),
        Network::VirtualHub => (vhub_network_profile(), "VWAN"),
    };

    let mut schema = ResourceSchema::new(type_name)
        .with_description("Palo Alto Networks Next Generation Firewall")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("location", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("network_profile", profile)
                .required()
                .with_provider_name("properties.networkProfile"),
        )
        .attribute(
            AttributeSchema::new(
                "dns_settings",
                AttributeType::Block(
                    BlockSchema::single()
                        .attribute(
                            AttributeSchema::new(
                                "dns_servers",
                                AttributeType::list_of(AttributeType::String),
                            )
                            .with_provider_name("dnsServers"),
                        )
                        .attribute(
                            AttributeSchema::new("use_azure_dns", AttributeType::Bool)
                                .with_provider_name("enableDnsProxy"),
                        ),
                ),
            )
            .with_provider_name("properties.dnsSettings"),
        )
        .attribute(AttributeSchema::new(
            "tags",
            AttributeType::Map(Box::new(AttributeType::String)),
        ));

    schema = match management {
        Management::LocalRulestack => schema.attribute(
            AttributeSchema::new("rulestack_id", types::arm_resource_id())
                .required()
                .with_provider_name("properties.associatedRulestack.resourceId"),
        ),
        Management::Panorama => schema.attribute(
            AttributeSchema::new("panorama_base64_config", AttributeType::String)
                .required()
                .with_provider_name("properties.panoramaConfig.configString"),
        ),
    };

    let mut defaults = vec![
        ("properties.networkProfile.networkType", json!(network_type)),
        ("properties.networkProfile.enableEgressNat", json!("ENABLED")),
        (
            "properties.marketplaceDetails",
            json!({"offerId": "pan_swfw_cloud_ngfw", "publisherId": "paloaltonetworks"}),
        ),
        (
            "properties.planData",
            json!({"billingCycle": "MONTHLY", "planId": "panw-cloud-ngfw-payg"}),
        ),
    ];
    if let Management::Panorama = management {
        defaults.push(("properties.isPanoramaManaged", json!("TRUE")));
    }

    ArmSchemaConfig {
        arm_type: FIREWALLS,
        api_version: API_VERSION,
        placement: Placement::ResourceGroup,
        name_attribute: "name",
        has_location: true,
        has_tags: true,
        codecs: CODECS,
        defaults,
        schema,
    }
}

pub fn vhub_local_rulestack() -> ArmSchemaConfig {
    firewall(VHUB_LOCAL_RULESTACK, Network::VirtualHub, Management::LocalRulestack)
}

pub fn vhub_panorama() -> ArmSchemaConfig {
    firewall(VHUB_PANORAMA, Network::VirtualHub, Management::Panorama)
}

pub fn vnet_local_rulestack() -> ArmSchemaConfig {
    firewall(VNET_LOCAL_RULESTACK, Network::VirtualNetwork, Management::LocalRulestack)
}

pub fn vnet_panorama() -> ArmSchemaConfig {
    firewall(VNET_PANORAMA, Network::VirtualNetwork, Management::Panorama)
}
