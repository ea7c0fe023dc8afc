//! Provider configuration
//!
//! Settings come from the host's provider block first and fall back to the
//! `ARM_*` environment variables.

use std::collections::HashMap;
use std::time::Duration;

use strata_core::provider::ProviderError;
use strata_core::resource::{Attributes, Value};
use thiserror::Error;

use crate::auth::Credential;

/// Errors raised while assembling the provider configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Unknown cloud environment '{0}', expected one of: public, usgovernment, china")]
    UnknownEnvironment(String),

    #[error(
        "No credentials configured: set access_token, or client_id and client_secret (ARM_ACCESS_TOKEN / ARM_CLIENT_ID / ARM_CLIENT_SECRET)"
    )]
    NoCredentials,

    #[error("Invalid timeout for '{operation}': {reason}")]
    InvalidTimeout {
        operation: &'static str,
        reason: String,
    },
}

impl From<ConfigError> for ProviderError {
    fn from(error: ConfigError) -> Self {
        ProviderError::configuration(error.to_string()).with_cause(error)
    }
}

/// Sovereign cloud the provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudEnvironment {
    #[default]
    Public,
    UsGovernment,
    China,
}

impl CloudEnvironment {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "public" | "azurecloud" => Ok(Self::Public),
            "usgovernment" | "azureusgovernmentcloud" => Ok(Self::UsGovernment),
            "china" | "azurechinacloud" => Ok(Self::China),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }

    pub fn resource_manager_endpoint(&self) -> &'static str {
        match self {
            Self::Public => "https://management.azure.com",
            Self::UsGovernment => "https://management.usgovcloudapi.net",
            Self::China => "https://management.chinacloudapi.cn",
        }
    }

    pub fn authority_host(&self) -> &'static str {
        match self {
            Self::Public => "https://login.microsoftonline.com",
            Self::UsGovernment => "https://login.microsoftonline.us",
            Self::China => "https://login.chinacloudapi.cn",
        }
    }
}

/// Per-operation deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(30 * 60),
            delete: Duration::from_secs(30 * 60),
        }
    }
}

impl Timeouts {
    /// Overrides from a `timeouts` block, in minutes
    fn from_block(block: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        let mut timeouts = Self::default();
        let fields: [(&'static str, &mut Duration); 4] = [
            ("create", &mut timeouts.create),
            ("read", &mut timeouts.read),
            ("update", &mut timeouts.update),
            ("delete", &mut timeouts.delete),
        ];
        for (operation, slot) in fields {
            match block.get(operation) {
                None => {}
                Some(Value::Int(minutes)) if *minutes > 0 => {
                    *slot = Duration::from_secs(*minutes as u64 * 60);
                }
                Some(other) => {
                    return Err(ConfigError::InvalidTimeout {
                        operation,
                        reason: format!("expected a positive number of minutes, got {:?}", other),
                    });
                }
            }
        }
        Ok(timeouts)
    }
}

/// Resolved provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub credential: Credential,
    pub environment: CloudEnvironment,
    /// Appended to the User-Agent for partner attribution
    pub partner_id: Option<String>,
    pub timeouts: Timeouts,
}

impl ProviderConfig {
    /// Build from the host's provider block, falling back to the process environment
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        Self::from_sources(attributes, |key| std::env::var(key).ok())
    }

    /// Build from the process environment only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_attributes(&HashMap::new())
    }

    pub fn from_sources(
        attributes: &HashMap<String, Value>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |attr: &str, var: &str| -> Option<String> {
            attributes
                .get_str(attr)
                .map(str::to_string)
                .or_else(|| env(var))
                .filter(|s| !s.is_empty())
        };

        let subscription_id = lookup("subscription_id", "ARM_SUBSCRIPTION_ID")
            .ok_or(ConfigError::Missing("subscription_id"))?;

        let environment = match lookup("environment", "ARM_ENVIRONMENT") {
            Some(name) => CloudEnvironment::parse(&name)?,
            None => CloudEnvironment::default(),
        };

        let credential = match lookup("access_token", "ARM_ACCESS_TOKEN") {
            Some(token) => Credential::StaticToken(token),
            None => {
                let client_id = lookup("client_id", "ARM_CLIENT_ID");
                let client_secret = lookup("client_secret", "ARM_CLIENT_SECRET");
                match (client_id, client_secret) {
                    (Some(client_id), Some(client_secret)) => Credential::ClientSecret {
                        tenant_id: lookup("tenant_id", "ARM_TENANT_ID")
                            .ok_or(ConfigError::Missing("tenant_id"))?,
                        client_id,
                        client_secret,
                        authority: environment.authority_host().to_string(),
                    },
                    _ => return Err(ConfigError::NoCredentials),
                }
            }
        };

        let timeouts = match attributes.get_block("timeouts") {
            Some(block) => Timeouts::from_block(block)?,
            None => Timeouts::default(),
        };

        Ok(Self {
            subscription_id,
            credential,
            environment,
            partner_id: lookup("partner_id", "ARM_PARTNER_ID"),
            timeouts,
        })
    }
}
