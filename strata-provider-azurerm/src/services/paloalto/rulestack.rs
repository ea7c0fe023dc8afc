//! Local rulestacks and the objects that live inside them

use serde_json::json;
use strata_core::resource::Value;
use strata_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::{API_VERSION, RULESTACKS};
use crate::convert::Codec;
use crate::generic::{ArmSchemaConfig, Placement};

pub const LOCAL_RULESTACK: &str = "palo_alto_local_rulestack";
pub const CERTIFICATE: &str = "palo_alto_local_rulestack_certificate";
pub const FQDN_LIST: &str = "palo_alto_local_rulestack_fqdn_list";
pub const OUTBOUND_TRUST_CERTIFICATE_ASSOCIATION: &str =
    "palo_alto_local_rulestack_outbound_trust_certificate_association";
pub const OUTBOUND_UNTRUST_CERTIFICATE_ASSOCIATION: &str =
    "palo_alto_local_rulestack_outbound_untrust_certificate_association";
pub const PREFIX_LIST: &str = "palo_alto_local_rulestack_prefix_list";
pub const RULE: &str = "palo_alto_local_rulestack_rule";

const RULESTACK_ID: &str = "rulestack_id";

const SECURITY_PROFILES: &[(&str, &str)] = &[
    ("anti_spyware_profile", "properties.securityServices.antiSpywareProfile"),
    ("anti_virus_profile", "properties.securityServices.antiVirusProfile"),
    ("dns_subscription", "properties.securityServices.dnsSubscription"),
    ("file_blocking_profile", "properties.securityServices.fileBlockingProfile"),
    ("url_filtering_profile", "properties.securityServices.urlFilteringProfile"),
    ("vulnerability_profile", "properties.securityServices.vulnerabilityProfile"),
];

fn rulestack_schema(type_name: &str, data_source: bool) -> ResourceSchema {
    let optional = |schema: AttributeSchema| {
        if data_source {
            schema.computed()
        } else {
            schema
        }
    };

    let mut schema = ResourceSchema::new(type_name)
        .with_description("Palo Alto Networks Local Rulestack")
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
        .attribute(if data_source {
            AttributeSchema::new("location", AttributeType::String).computed()
        } else {
            AttributeSchema::new("location", AttributeType::String)
                .required()
                .force_new()
        })
        .attribute(optional(
            AttributeSchema::new("description", AttributeType::String)
                .with_provider_name("properties.description"),
        ));
    for (name, path) in SECURITY_PROFILES {
        schema = schema.attribute(optional(
            AttributeSchema::new(*name, AttributeType::String).with_provider_name(*path),
        ));
    }
    schema
}

fn rulestack_config(type_name: &str, data_source: bool) -> ArmSchemaConfig {
    ArmSchemaConfig {
        arm_type: RULESTACKS,
        api_version: API_VERSION,
        placement: Placement::ResourceGroup,
        name_attribute: "name",
        has_location: true,
        has_tags: false,
        codecs: &[],
        defaults: vec![
            ("properties.scope", json!("LOCAL")),
            ("properties.defaultMode", json!("NONE")),
        ],
        schema: rulestack_schema(type_name, data_source),
    }
}

pub fn local_rulestack() -> ArmSchemaConfig {
    rulestack_config(LOCAL_RULESTACK, false)
}

pub fn local_rulestack_data_source() -> ArmSchemaConfig {
    rulestack_config(LOCAL_RULESTACK, true)
}

/// Objects named inside a rulestack (`{rulestack}/{segment}/{name}`)
fn child(
    segment: &'static str,
    name_attribute: &'static str,
    codecs: &'static [(&'static str, Codec)],
    schema: ResourceSchema,
) -> ArmSchemaConfig {
    ArmSchemaConfig {
        arm_type: RULESTACKS,
        api_version: API_VERSION,
        placement: Placement::Child {
            parent_attribute: RULESTACK_ID,
            segment,
        },
        name_attribute,
        has_location: false,
        has_tags: false,
        codecs,
        defaults: Vec::new(),
        schema: schema.attribute(
            AttributeSchema::new(RULESTACK_ID, types::arm_resource_id())
                .required()
                .force_new(),
        ),
    }
}

fn named(type_name: &str) -> ResourceSchema {
    ResourceSchema::new(type_name)
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("audit_comment", AttributeType::String)
                .with_provider_name("properties.auditComment"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .with_provider_name("properties.description"),
        )
}

pub fn certificate() -> ArmSchemaConfig {
    const CODECS: &[(&str, Codec)] = &[(
        "self_signed",
        Codec::BoolWord {
            on: "TRUE",
            off: "FALSE",
        },
    )];
    child(
        "certificates",
        "name",
        CODECS,
        named(CERTIFICATE)
            .with_description("Certificate Object in a Palo Alto Local Rulestack")
            .attribute(
                AttributeSchema::new("key_vault_certificate_id", AttributeType::String)
                    .with_provider_name("properties.certificateSignerResourceId")
                    .conflicts_with(&["self_signed"]),
            )
            .attribute(
                AttributeSchema::new("self_signed", AttributeType::Bool)
                    .with_provider_name("properties.certificateSelfSigned"),
            )
            .exactly_one_of(&["key_vault_certificate_id", "self_signed"]),
    )
}

pub fn fqdn_list() -> ArmSchemaConfig {
    child(
        "fqdnlists",
        "name",
        &[],
        named(FQDN_LIST)
            .with_description("FQDN List in a Palo Alto Local Rulestack")
            .attribute(
                AttributeSchema::new(
                    "fully_qualified_domain_names",
                    AttributeType::list_of(AttributeType::String),
                )
                .required()
                .with_provider_name("properties.fqdnList"),
            ),
    )
}

pub fn prefix_list() -> ArmSchemaConfig {
    child(
        "prefixlists",
        "name",
        &[],
        named(PREFIX_LIST)
            .with_description("Prefix List in a Palo Alto Local Rulestack")
            .attribute(
                AttributeSchema::new("prefix_list", AttributeType::list_of(AttributeType::String))
                    .required()
                    .with_provider_name("properties.prefixList"),
            ),
    )
}

fn strings(name: &str, path: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::list_of(AttributeType::String)).with_provider_name(path)
}

fn endpoint_block(with_fqdn_lists: bool) -> AttributeType {
    let mut block = BlockSchema::single()
        .with_min_items(1)
        .attribute(strings("cidrs", "cidrs"))
        .attribute(strings("countries", "countries"))
        .attribute(strings("feeds", "feeds"))
        .attribute(strings("local_rulestack_prefix_list_ids", "prefixLists"));
    if with_fqdn_lists {
        block = block.attribute(strings("local_rulestack_fqdn_list_ids", "fqdnlist"));
    }
    AttributeType::Block(block)
}

/// Rules are named by their priority
pub fn rule() -> ArmSchemaConfig {
    const ON_OFF: Codec = Codec::BoolWord {
        on: "ENABLED",
        off: "DISABLED",
    };
    const TRUE_FALSE: Codec = Codec::BoolWord {
        on: "TRUE",
        off: "FALSE",
    };
    const CODECS: &[(&str, Codec)] = &[
        ("enabled", ON_OFF),
        ("logging_enabled", ON_OFF),
        ("negate_destination", TRUE_FALSE),
        ("negate_source", TRUE_FALSE),
    ];

    let schema = ResourceSchema::new(RULE)
        .with_description("Rule in a Palo Alto Local Rulestack")
        .attribute(
            AttributeSchema::new("priority", types::int_between::<1, 1_000_000>())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_provider_name("properties.ruleName"),
        )
        .attribute(
            AttributeSchema::new(
                "action",
                AttributeType::enumeration(&[
                    "Allow",
                    "DenyResetBoth",
                    "DenyResetServer",
                    "DenySilent",
                ]),
            )
            .required()
            .with_provider_name("properties.actionType"),
        )
        .attribute(strings("applications", "properties.applications").required())
        .attribute(
            AttributeSchema::new("audit_comment", AttributeType::String)
                .with_provider_name("properties.auditComment"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .with_provider_name("properties.description"),
        )
        .attribute(
            AttributeSchema::new("enabled", AttributeType::Bool)
                .with_default(Value::Bool(true))
                .with_provider_name("properties.ruleState"),
        )
        .attribute(
            AttributeSchema::new("logging_enabled", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_provider_name("properties.enableLogging"),
        )
        .attribute(
            AttributeSchema::new("negate_destination", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_provider_name("properties.negateDestination"),
        )
        .attribute(
            AttributeSchema::new("negate_source", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_provider_name("properties.negateSource"),
        )
        .attribute(
            AttributeSchema::new("protocol", AttributeType::String)
                .with_provider_name("properties.protocol")
                .conflicts_with(&["protocol_ports"]),
        )
        .attribute(strings("protocol_ports", "properties.protocolPortList"))
        .attribute(
            AttributeSchema::new("inspection_certificate_id", AttributeType::String)
                .with_provider_name("properties.inboundInspectionCertificate"),
        )
        .attribute(
            AttributeSchema::new("source", endpoint_block(false))
                .required()
                .with_provider_name("properties.source"),
        )
        .attribute(
            AttributeSchema::new("destination", endpoint_block(true))
                .required()
                .with_provider_name("properties.destination"),
        )
        .attribute(
            AttributeSchema::new(
                "category",
                AttributeType::Block(
                    BlockSchema::single()
                        .attribute(strings("custom_urls", "urlCustom").required())
                        .attribute(strings("feeds", "feeds")),
                ),
            )
            .with_provider_name("properties.category"),
        );

    child("localRules", "priority", CODECS, schema)
}

fn certificate_association(type_name: &str, path: &'static str) -> ArmSchemaConfig {
    ArmSchemaConfig {
        arm_type: RULESTACKS,
        api_version: API_VERSION,
        placement: Placement::ParentProperty {
            member_attribute: "certificate_id",
            path,
        },
        name_attribute: "certificate_id",
        has_location: false,
        has_tags: false,
        codecs: &[],
        defaults: Vec::new(),
        schema: ResourceSchema::new(type_name).attribute(
            AttributeSchema::new("certificate_id", types::arm_resource_id())
                .required()
                .force_new(),
        ),
    }
}

pub fn outbound_trust_certificate_association() -> ArmSchemaConfig {
    certificate_association(
        OUTBOUND_TRUST_CERTIFICATE_ASSOCIATION,
        "properties.securityServices.outboundTrustCertificate",
    )
}

pub fn outbound_untrust_certificate_association() -> ArmSchemaConfig {
    certificate_association(
        OUTBOUND_UNTRUST_CERTIFICATE_ASSOCIATION,
        "properties.securityServices.outboundUnTrustCertificate",
    )
}
