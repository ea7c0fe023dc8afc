//! Network wire types (api-version 2023-04-01)
//!
//! Only the fields this provider edits are modelled. Everything else a
//! network interface or firewall policy returns is kept in `extra` and
//! written back unchanged, so a read-modify-write never drops configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<InterfacePropertiesFormat>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfacePropertiesFormat {
    #[serde(rename = "ipConfigurations", skip_serializing_if = "Option::is_none")]
    pub ip_configurations: Option<Vec<InterfaceIPConfiguration>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceIPConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<InterfaceIPConfigurationPropertiesFormat>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceIPConfigurationPropertiesFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_backend_address_pools: Option<Vec<SubResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(rename = "privateIPAddress", skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to another resource by ID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

// =============================================================================
// Web Application Firewall policies
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebApplicationFirewallPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<WebApplicationFirewallPolicyPropertiesFormat>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebApplicationFirewallPolicyPropertiesFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_settings: Option<PolicySettings>,
    pub managed_rules: ManagedRulesDefinition,
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
    /// Custom rules, associations and other unmodelled properties
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySettings {
    /// `Enabled` or `Disabled`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// `Prevention` or `Detection`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body_check: Option<bool>,
    #[serde(rename = "fileUploadLimitInMb", skip_serializing_if = "Option::is_none")]
    pub file_upload_limit_in_mb: Option<i64>,
    #[serde(rename = "maxRequestBodySizeInKb", skip_serializing_if = "Option::is_none")]
    pub max_request_body_size_in_kb: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRulesDefinition {
    #[serde(default)]
    pub managed_rule_sets: Vec<ManagedRuleSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRuleSet {
    pub rule_set_type: String,
    pub rule_set_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_group_overrides: Option<Vec<ManagedRuleGroupOverride>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRuleGroupOverride {
    pub rule_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<ManagedRuleOverride>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRuleOverride {
    pub rule_id: String,
    /// `Enabled` or `Disabled`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn interface_keeps_unmodelled_fields() {
        let body = json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/nic",
            "name": "nic",
            "location": "westeurope",
            "etag": "W/\"1\"",
            "properties": {
                "enableAcceleratedNetworking": false,
                "ipConfigurations": [{
                    "name": "testconfiguration1",
                    "properties": {
                        "privateIPAllocationMethod": "Dynamic",
                        "subnet": {"id": "/subscriptions/s/subnet"}
                    }
                }]
            }
        });
        let nic: Interface = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(nic.extra.get("etag"), Some(&json!("W/\"1\"")));
        let config = &nic.properties.as_ref().unwrap().ip_configurations.as_ref().unwrap()[0];
        assert_eq!(config.name.as_deref(), Some("testconfiguration1"));
        assert_eq!(serde_json::to_value(&nic).unwrap(), body);
    }

    #[test]
    fn rule_group_override_omits_absent_rules() {
        let group = ManagedRuleGroupOverride {
            rule_group_name: "REQUEST-920-PROTOCOL-ENFORCEMENT".to_string(),
            rules: None,
        };
        assert_eq!(
            serde_json::to_value(&group).unwrap(),
            json!({"ruleGroupName": "REQUEST-920-PROTOCOL-ENFORCEMENT"})
        );
    }
}
