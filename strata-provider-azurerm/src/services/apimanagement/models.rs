//! API Management tag description wire types (api-version 2022-08-01)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDescriptionContract {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<TagDescriptionContractProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDescriptionContractProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs_description: Option<String>,
    /// Name of the tag, returned on read
    #[serde(default, skip_serializing)]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub tag_id: Option<String>,
}
