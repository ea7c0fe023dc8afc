//! Bearer token acquisition for Azure Resource Manager

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::client::ArmError;

/// Tokens are refreshed this long before they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// How the provider authenticates
#[derive(Clone)]
pub enum Credential {
    /// Pre-issued bearer token (ARM_ACCESS_TOKEN)
    StaticToken(String),
    /// Service principal with a client secret (OAuth2 client credentials grant)
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
        /// Authority host, e.g. "https://login.microsoftonline.com"
        authority: String,
    },
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::StaticToken(_) => f.write_str("StaticToken(<redacted>)"),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                authority,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("authority", authority)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

/// Supplies bearer tokens, caching them until shortly before expiry
pub struct TokenSource {
    credential: Credential,
    /// OAuth2 scope, e.g. "https://management.azure.com/.default"
    scope: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(credential: Credential, resource_manager_endpoint: &str, http: reqwest::Client) -> Self {
        Self {
            credential,
            scope: format!("{}/.default", resource_manager_endpoint.trim_end_matches('/')),
            http,
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a new one when needed
    pub async fn token(&self) -> Result<String, ArmError> {
        let (tenant_id, client_id, client_secret, authority) = match &self.credential {
            Credential::StaticToken(token) => return Ok(token.clone()),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
                authority,
            } => (tenant_id, client_id, client_secret, authority),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Instant::now())
        {
            return Ok(token.value.clone());
        }

        log::debug!("Requesting access token for client {}", client_id);
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            authority.trim_end_matches('/'),
            tenant_id
        );
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ArmError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArmError::Auth(format!(
                "token endpoint returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ArmError::Auth(format!("invalid token response: {}", e)))?;

        let fresh = CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        };
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_refreshes_inside_margin() {
        let now = Instant::now();
        let token = CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::from_secs(3600),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::from_secs(3600 - 60)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let credential = Credential::ClientSecret {
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "hunter2".to_string(),
            authority: "https://login.microsoftonline.com".to_string(),
        };
        let shown = format!("{:?}", credential);
        assert!(shown.contains("client"));
        assert!(!shown.contains("hunter2"));
        assert!(!format!("{:?}", Credential::StaticToken("abc".to_string())).contains("abc"));
    }

    #[tokio::test]
    async fn static_token_is_returned_as_is() {
        let source = TokenSource::new(
            Credential::StaticToken("abc".to_string()),
            "https://management.azure.com/",
            reqwest::Client::new(),
        );
        assert_eq!(source.scope, "https://management.azure.com/.default");
        assert_eq!(source.token().await.unwrap(), "abc");
    }
}
