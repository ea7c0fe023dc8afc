use std::fmt;

use crate::resourceids::{IdParseError, ResourceGroupId, Segment, parse_segments};

const SUBSCRIPTION: Segment = Segment::Named("subscriptions", "subscription_id");
const RESOURCE_GROUP: Segment = Segment::Named("resourceGroups", "resource_group");
const PROVIDER: Segment = Segment::Fixed("providers", "Microsoft.Network");

/// `.../providers/Microsoft.Network/networkInterfaces/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterfaceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl NetworkInterfaceId {
    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let parsed = parse_segments(
            id,
            &[
                SUBSCRIPTION,
                RESOURCE_GROUP,
                PROVIDER,
                Segment::Named("networkInterfaces", "name"),
            ],
        )?;
        Ok(Self {
            subscription_id: parsed.get("subscription_id").to_string(),
            resource_group: parsed.get("resource_group").to_string(),
            name: parsed.get("name").to_string(),
        })
    }
}

impl fmt::Display for NetworkInterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/providers/Microsoft.Network/networkInterfaces/{}",
            ResourceGroupId::new(&self.subscription_id, &self.resource_group),
            self.name
        )
    }
}

/// `.../networkInterfaces/{nic}/ipConfigurations/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterfaceIpConfigurationId {
    pub network_interface: NetworkInterfaceId,
    pub name: String,
}

impl NetworkInterfaceIpConfigurationId {
    pub fn new(network_interface: NetworkInterfaceId, name: impl Into<String>) -> Self {
        Self {
            network_interface,
            name: name.into(),
        }
    }

    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let parsed = parse_segments(
            id,
            &[
                SUBSCRIPTION,
                RESOURCE_GROUP,
                PROVIDER,
                Segment::Named("networkInterfaces", "network_interface_name"),
                Segment::Named("ipConfigurations", "name"),
            ],
        )?;
        Ok(Self::new(
            NetworkInterfaceId {
                subscription_id: parsed.get("subscription_id").to_string(),
                resource_group: parsed.get("resource_group").to_string(),
                name: parsed.get("network_interface_name").to_string(),
            },
            parsed.get("name"),
        ))
    }
}

impl fmt::Display for NetworkInterfaceIpConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/ipConfigurations/{}", self.network_interface, self.name)
    }
}

/// `.../loadBalancers/{lb}/backendAddressPools/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddressPoolId {
    pub subscription_id: String,
    pub resource_group: String,
    pub load_balancer_name: String,
    pub name: String,
}

impl BackendAddressPoolId {
    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let parsed = parse_segments(
            id,
            &[
                SUBSCRIPTION,
                RESOURCE_GROUP,
                PROVIDER,
                Segment::Named("loadBalancers", "load_balancer_name"),
                Segment::Named("backendAddressPools", "name"),
            ],
        )?;
        Ok(Self {
            subscription_id: parsed.get("subscription_id").to_string(),
            resource_group: parsed.get("resource_group").to_string(),
            load_balancer_name: parsed.get("load_balancer_name").to_string(),
            name: parsed.get("name").to_string(),
        })
    }
}

impl fmt::Display for BackendAddressPoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/providers/Microsoft.Network/loadBalancers/{}/backendAddressPools/{}",
            ResourceGroupId::new(&self.subscription_id, &self.resource_group),
            self.load_balancer_name,
            self.name
        )
    }
}

/// Composite `{ipConfigurationId}|{backendAddressPoolId}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddressPoolAssociationId {
    pub ip_configuration: NetworkInterfaceIpConfigurationId,
    pub backend_address_pool: BackendAddressPoolId,
}

impl BackendAddressPoolAssociationId {
    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let (ip_configuration, pool) = id.split_once('|').ok_or_else(|| IdParseError::Invalid {
            id: id.to_string(),
            reason: "expected {ipConfigurationId}|{backendAddressPoolId}".to_string(),
        })?;
        Ok(Self {
            ip_configuration: NetworkInterfaceIpConfigurationId::parse(ip_configuration)?,
            backend_address_pool: BackendAddressPoolId::parse(pool)?,
        })
    }
}

impl fmt::Display for BackendAddressPoolAssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.ip_configuration, self.backend_address_pool)
    }
}

/// `.../ApplicationGatewayWebApplicationFirewallPolicies/{name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebApplicationFirewallPolicyId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl WebApplicationFirewallPolicyId {
    pub fn new(resource_group: &ResourceGroupId, name: impl Into<String>) -> Self {
        Self {
            subscription_id: resource_group.subscription_id.clone(),
            resource_group: resource_group.resource_group.clone(),
            name: name.into(),
        }
    }

    pub fn parse(id: &str) -> Result<Self, IdParseError> {
        let parsed = parse_segments(
            id,
            &[
                SUBSCRIPTION,
                RESOURCE_GROUP,
                PROVIDER,
                Segment::Named("ApplicationGatewayWebApplicationFirewallPolicies", "name"),
            ],
        )?;
        Ok(Self {
            subscription_id: parsed.get("subscription_id").to_string(),
            resource_group: parsed.get("resource_group").to_string(),
            name: parsed.get("name").to_string(),
        })
    }
}

impl fmt::Display for WebApplicationFirewallPolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/providers/Microsoft.Network/ApplicationGatewayWebApplicationFirewallPolicies/{}",
            ResourceGroupId::new(&self.subscription_id, &self.resource_group),
            self.name
        )
    }
}
