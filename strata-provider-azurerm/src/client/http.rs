//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{ArmError, ArmRequest, ArmResponse, ArmTransport, Method};
use crate::auth::TokenSource;
use crate::config::ProviderConfig;

const USER_AGENT: &str = concat!("strata-provider-azurerm/", env!("CARGO_PKG_VERSION"));

/// Sends requests to Resource Manager over HTTPS with bearer authentication
pub struct HttpTransport {
    http: Client,
    endpoint: String,
    tokens: TokenSource,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Result<Self, ArmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ArmError::Transport(format!("failed to create HTTP client: {}", e)))?;

        let endpoint = config.environment.resource_manager_endpoint().to_string();
        let user_agent = match &config.partner_id {
            Some(partner) => format!("{} pid-{}", USER_AGENT, partner),
            None => USER_AGENT.to_string(),
        };

        Ok(Self {
            tokens: TokenSource::new(config.credential.clone(), &endpoint, http.clone()),
            http,
            endpoint,
            user_agent,
        })
    }

    /// Absolute URLs (operation status links) must be https on the Resource
    /// Manager host, since the bearer token goes with them.
    fn url_for(&self, path: &str) -> Result<String, ArmError> {
        if path.starts_with('/') {
            return Ok(format!("{}{}", self.endpoint, path));
        }
        let url = Url::parse(path)
            .map_err(|e| ArmError::Transport(format!("invalid request URL {:?}: {}", path, e)))?;
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| ArmError::Transport(format!("invalid endpoint {:?}: {}", self.endpoint, e)))?;
        if url.scheme() != "https" || url.host_str() != endpoint.host_str() {
            return Err(ArmError::Transport(format!(
                "refusing to send credentials to {}: not the Resource Manager endpoint {}",
                path, self.endpoint
            )));
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl ArmTransport for HttpTransport {
    async fn send(&self, request: ArmRequest) -> Result<ArmResponse, ArmError> {
        let url = self.url_for(&request.path)?;
        let token = self.tokens.token().await?;

        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Put => self.http.put(&url),
            Method::Patch => self.http.patch(&url),
            Method::Delete => self.http.delete(&url),
        };
        builder = builder
            .bearer_auth(token)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .header("x-ms-client-request-id", uuid::Uuid::new_v4().to_string());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ArmError::Transport(format!("{} {}: {}", request.method, url, e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ArmError::Transport(format!("reading body of {}: {}", url, e)))?;
        let body = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => Some(body),
                Err(e) => {
                    log::warn!("Non-JSON response body from {}: {}", url, e);
                    None
                }
            }
        };

        Ok(ArmResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credential;
    use crate::config::{CloudEnvironment, Timeouts};

    fn config(partner_id: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            subscription_id: "sub".to_string(),
            credential: Credential::StaticToken("t".to_string()),
            environment: CloudEnvironment::UsGovernment,
            partner_id: partner_id.map(str::to_string),
            timeouts: Timeouts::default(),
        }
    }

    #[test]
    fn relative_paths_use_environment_endpoint() {
        let transport = HttpTransport::new(&config(None)).unwrap();
        assert_eq!(
            transport.url_for("/subscriptions/sub?api-version=1").unwrap(),
            "https://management.usgovcloudapi.net/subscriptions/sub?api-version=1"
        );
        assert_eq!(
            transport
                .url_for("https://management.usgovcloudapi.net/subscriptions/sub/operations/op?api-version=1")
                .unwrap(),
            "https://management.usgovcloudapi.net/subscriptions/sub/operations/op?api-version=1"
        );
    }

    #[test]
    fn status_links_off_the_endpoint_are_refused() {
        let transport = HttpTransport::new(&config(None)).unwrap();
        for url in [
            "https://poll.example.com/op",
            "http://management.usgovcloudapi.net/subscriptions/sub/operations/op",
            "https://management.azure.com/subscriptions/sub/operations/op",
            "not a url",
        ] {
            assert!(
                matches!(transport.url_for(url), Err(ArmError::Transport(_))),
                "{}",
                url
            );
        }
    }

    #[test]
    fn partner_id_is_appended_to_user_agent() {
        let transport = HttpTransport::new(&config(Some("abc"))).unwrap();
        assert!(transport.user_agent.ends_with(" pid-abc"));
        assert!(transport.user_agent.starts_with("strata-provider-azurerm/"));
    }
}
