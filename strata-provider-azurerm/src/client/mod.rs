//! Azure Resource Manager client
//!
//! `ArmClient` speaks the ARM REST conventions (api-version query parameter,
//! error envelopes, long-running operations) over an `ArmTransport`.
//! `HttpTransport` is the production transport.

mod http;
#[cfg(test)]
pub(crate) mod memory;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use strata_core::provider::{ProviderError, ProviderErrorKind, ProviderResult};
use thiserror::Error;

pub use http::HttpTransport;

/// Default delay between polls of a long-running operation
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Errors returned by the ARM client
#[derive(Debug, Error)]
pub enum ArmError {
    /// The API answered with a non-success status
    #[error("unexpected status {status} ({code}): {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A long-running operation finished without succeeding
    #[error("long-running operation {status}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl ArmError {
    /// True for 404 responses and ResourceNotFound-style error codes
    pub fn is_not_found(&self) -> bool {
        match self {
            ArmError::Status { status, code, .. } => {
                *status == 404 || code == "ResourceNotFound" || code == "NotFound"
            }
            _ => false,
        }
    }

    /// Build an error from a failed response's ARM error envelope
    pub fn from_response(response: &ArmResponse) -> Self {
        let envelope = response
            .body
            .as_ref()
            .map(|b| b.get("error").unwrap_or(b));
        let field = |name: &str| {
            envelope
                .and_then(|e| e.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        ArmError::Status {
            status: response.status,
            code: field("code").unwrap_or_else(|| format!("HTTP{}", response.status)),
            message: field("message").unwrap_or_else(|| "no error details returned".to_string()),
        }
    }
}

impl From<ArmError> for ProviderError {
    fn from(err: ArmError) -> Self {
        let kind = if err.is_not_found() {
            ProviderErrorKind::NotFound
        } else {
            ProviderErrorKind::Api
        };
        ProviderError::new(err.to_string())
            .with_kind(kind)
            .with_cause(err)
    }
}

/// Prefix ARM failures with what was being attempted
pub trait ArmResultExt<T> {
    fn context<F: FnOnce() -> String>(self, what: F) -> ProviderResult<T>;
}

impl<T> ArmResultExt<T> for Result<T, ArmError> {
    fn context<F: FnOnce() -> String>(self, what: F) -> ProviderResult<T> {
        self.map_err(|err| {
            let mut error = ProviderError::from(err);
            error.message = format!("{}: {}", what(), error.message);
            error
        })
    }
}

/// HTTP method of an ARM request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Request handed to a transport
#[derive(Debug, Clone)]
pub struct ArmRequest {
    pub method: Method,
    /// Path and query relative to the Resource Manager endpoint, or an absolute URL
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ArmRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Response returned by a transport
#[derive(Debug, Clone, Default)]
pub struct ArmResponse {
    pub status: u16,
    /// Header names are lower-case
    pub headers: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl ArmResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

/// Sends a single request to Resource Manager
#[async_trait]
pub trait ArmTransport: Send + Sync {
    async fn send(&self, request: ArmRequest) -> Result<ArmResponse, ArmError>;
}

enum PollMode {
    AsyncOperation,
    Location,
}

/// Resource Manager client shared by all resources of a provider instance
#[derive(Clone)]
pub struct ArmClient {
    transport: Arc<dyn ArmTransport>,
    subscription_id: String,
    poll_interval: Duration,
}

impl ArmClient {
    pub fn new(transport: Arc<dyn ArmTransport>, subscription_id: impl Into<String>) -> Self {
        Self {
            transport,
            subscription_id: subscription_id.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Delay between polls when the API sends no Retry-After
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// GET a resource, returning `None` when it does not exist
    pub async fn get_json(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Option<serde_json::Value>, ArmError> {
        let request = ArmRequest::new(Method::Get, with_api_version(path, api_version));
        match self.execute(request).await {
            Ok(response) => Ok(Some(response.body.unwrap_or(serde_json::Value::Null))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// GET a resource and decode it into a DTO
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Option<T>, ArmError> {
        match self.get_json(path, api_version).await? {
            Some(body) => serde_json::from_value(body)
                .map(Some)
                .map_err(|e| ArmError::Decode(format!("{}: {}", path, e))),
            None => Ok(None),
        }
    }

    /// PUT (create or replace) a resource and wait for it to be provisioned
    pub async fn put<T: Serialize>(
        &self,
        path: &str,
        api_version: &str,
        body: &T,
    ) -> Result<(), ArmError> {
        let body = serde_json::to_value(body).map_err(|e| ArmError::Decode(e.to_string()))?;
        let request =
            ArmRequest::new(Method::Put, with_api_version(path, api_version)).with_body(body);
        self.execute(request).await.map(|_| ())
    }

    /// PATCH a resource and wait for the update to complete
    pub async fn patch<T: Serialize>(
        &self,
        path: &str,
        api_version: &str,
        body: &T,
    ) -> Result<(), ArmError> {
        let body = serde_json::to_value(body).map_err(|e| ArmError::Decode(e.to_string()))?;
        let request =
            ArmRequest::new(Method::Patch, with_api_version(path, api_version)).with_body(body);
        self.execute(request).await.map(|_| ())
    }

    /// DELETE a resource; a resource that is already gone is not an error
    pub async fn delete(
        &self,
        path: &str,
        api_version: &str,
        if_match: Option<&str>,
    ) -> Result<(), ArmError> {
        let mut request = ArmRequest::new(Method::Delete, with_api_version(path, api_version));
        if let Some(etag) = if_match {
            request = request.with_header("If-Match", etag);
        }
        match self.execute(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn execute(&self, request: ArmRequest) -> Result<ArmResponse, ArmError> {
        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        log::debug!("{} {} -> {}", method, path, response.status);

        if !response.is_success() {
            return Err(ArmError::from_response(&response));
        }
        if method != Method::Get && (response.status == 201 || response.status == 202) {
            self.wait_for_operation(&response).await?;
        }
        Ok(response)
    }

    /// Poll a long-running operation until it reaches a terminal state
    async fn wait_for_operation(&self, initial: &ArmResponse) -> Result<(), ArmError> {
        let (url, mode) = if let Some(url) = initial.header("azure-asyncoperation") {
            (url.to_string(), PollMode::AsyncOperation)
        } else if let Some(url) = initial.header("location") {
            (url.to_string(), PollMode::Location)
        } else {
            return Ok(());
        };

        let mut delay = initial.retry_after().unwrap_or(self.poll_interval);
        loop {
            tokio::time::sleep(delay).await;
            let poll = self
                .transport
                .send(ArmRequest::new(Method::Get, url.clone()))
                .await?;
            if !poll.is_success() {
                return Err(ArmError::from_response(&poll));
            }
            delay = poll.retry_after().unwrap_or(self.poll_interval);

            match mode {
                PollMode::AsyncOperation => {
                    let status = poll
                        .body
                        .as_ref()
                        .and_then(|b| b.get("status"))
                        .and_then(|s| s.as_str())
                        .unwrap_or("InProgress");
                    match status {
                        "Succeeded" => return Ok(()),
                        "Failed" | "Canceled" => {
                            let message = poll
                                .body
                                .as_ref()
                                .and_then(|b| b.pointer("/error/message"))
                                .and_then(|m| m.as_str())
                                .unwrap_or("no error details returned")
                                .to_string();
                            return Err(ArmError::OperationFailed {
                                status: status.to_string(),
                                message,
                            });
                        }
                        other => log::debug!("Operation {} is {}", url, other),
                    }
                }
                PollMode::Location => {
                    if poll.status != 202 {
                        return Ok(());
                    }
                    log::debug!("Operation {} still running", url);
                }
            }
        }
    }
}

fn with_api_version(path: &str, api_version: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}api-version={}", path, separator, api_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records requests
    struct Scripted {
        responses: Mutex<VecDeque<ArmResponse>>,
        requests: Mutex<Vec<ArmRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<ArmResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ArmTransport for Scripted {
        async fn send(&self, request: ArmRequest) -> Result<ArmResponse, ArmError> {
            self.requests.lock().unwrap().push(request);
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left"))
        }
    }

    fn client(transport: Arc<Scripted>) -> ArmClient {
        ArmClient::new(transport, "sub").with_poll_interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn get_missing_resource_is_none() {
        let transport = Scripted::new(vec![ArmResponse::new(404).with_body(json!({
            "error": {"code": "ResourceNotFound", "message": "gone"}
        }))]);
        let result = client(transport.clone()).get_json("/x", "2022-06-15").await;
        assert!(result.unwrap().is_none());
        assert_eq!(
            transport.requests.lock().unwrap()[0].path,
            "/x?api-version=2022-06-15"
        );
    }

    #[tokio::test]
    async fn error_envelope_is_parsed() {
        let transport = Scripted::new(vec![ArmResponse::new(400).with_body(json!({
            "error": {"code": "InvalidRequest", "message": "bad retry policy"}
        }))]);
        let err = client(transport)
            .put("/x", "v", &json!({}))
            .await
            .unwrap_err();
        match err {
            ArmError::Status {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "InvalidRequest");
                assert_eq!(message, "bad retry policy");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn async_operation_is_polled_until_succeeded() {
        let transport = Scripted::new(vec![
            ArmResponse::new(201)
                .with_header("Azure-AsyncOperation", "https://management.azure.com/op/1"),
            ArmResponse::new(200).with_body(json!({"status": "InProgress"})),
            ArmResponse::new(200).with_body(json!({"status": "Succeeded"})),
        ]);
        client(transport.clone())
            .put("/x", "v", &json!({"properties": {}}))
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].method, Method::Get);
        assert_eq!(requests[2].path, "https://management.azure.com/op/1");
    }

    #[tokio::test]
    async fn failed_operation_surfaces_message() {
        let transport = Scripted::new(vec![
            ArmResponse::new(202).with_header("Azure-AsyncOperation", "https://op"),
            ArmResponse::new(200).with_body(json!({
                "status": "Failed",
                "error": {"code": "Conflict", "message": "queue does not exist"}
            })),
        ]);
        let err = client(transport)
            .delete("/x", "v", None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "long-running operation Failed: queue does not exist"
        );
    }

    #[tokio::test]
    async fn location_polling_stops_when_not_accepted() {
        let transport = Scripted::new(vec![
            ArmResponse::new(202).with_header("Location", "https://loc"),
            ArmResponse::new(202),
            ArmResponse::new(204),
        ]);
        client(transport.clone())
            .delete("/x", "v", Some("*"))
            .await
            .unwrap();
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[0].headers,
            vec![("If-Match".to_string(), "*".to_string())]
        );
    }

    #[tokio::test]
    async fn delete_of_missing_resource_succeeds() {
        let transport = Scripted::new(vec![ArmResponse::new(404)]);
        assert!(client(transport).delete("/x", "v", None).await.is_ok());
    }

    #[test]
    fn not_found_maps_to_provider_kind() {
        let err: ProviderError = ArmError::Status {
            status: 404,
            code: "ResourceNotFound".to_string(),
            message: "m".to_string(),
        }
        .into();
        assert_eq!(err.kind, ProviderErrorKind::NotFound);

        let err: ProviderError = ArmError::Transport("reset".to_string()).into();
        assert_eq!(err.kind, ProviderErrorKind::Api);
    }

    #[test]
    fn context_prefixes_the_message() {
        let result: Result<(), ArmError> = Err(ArmError::Status {
            status: 409,
            code: "Conflict".to_string(),
            message: "busy".to_string(),
        });
        let err = result.context(|| "deleting thing \"x\"".to_string()).unwrap_err();
        assert_eq!(
            err.message,
            "deleting thing \"x\": unexpected status 409 (Conflict): busy"
        );
        assert_eq!(err.kind, ProviderErrorKind::Api);
    }

    #[test]
    fn api_version_appends_to_existing_query() {
        assert_eq!(with_api_version("/a", "1"), "/a?api-version=1");
        assert_eq!(with_api_version("/a?x=y", "1"), "/a?x=y&api-version=1");
    }
}
