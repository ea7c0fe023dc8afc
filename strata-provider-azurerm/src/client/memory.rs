//! In-memory Resource Manager used by unit tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ArmClient, ArmError, ArmRequest, ArmResponse, ArmTransport, Method};

pub(crate) const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// Stores resources by (case-insensitive) path.
///
/// PUT replaces, PATCH merges into `properties`, DELETE removes. With
/// `long_running` set, writes answer 201/202 and must be polled.
#[derive(Default)]
pub(crate) struct InMemoryArm {
    resources: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<(Method, String)>>,
    long_running: bool,
}

impl InMemoryArm {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn long_running() -> Arc<Self> {
        Arc::new(Self {
            long_running: true,
            ..Self::default()
        })
    }

    pub(crate) fn client(self: &Arc<Self>) -> ArmClient {
        ArmClient::new(self.clone(), SUBSCRIPTION).with_poll_interval(Duration::ZERO)
    }

    pub(crate) fn insert(&self, path: &str, body: Value) {
        self.resources
            .lock()
            .unwrap()
            .insert(path.to_ascii_lowercase(), body);
    }

    pub(crate) fn stored(&self, path: &str) -> Option<Value> {
        self.resources
            .lock()
            .unwrap()
            .get(&path.to_ascii_lowercase())
            .cloned()
    }

    pub(crate) fn requests(&self) -> Vec<(Method, String)> {
        self.requests.lock().unwrap().clone()
    }

    fn not_found(path: &str) -> ArmResponse {
        ArmResponse::new(404).with_body(json!({
            "error": {
                "code": "ResourceNotFound",
                "message": format!("The Resource '{}' was not found.", path),
            }
        }))
    }
}

#[async_trait]
impl ArmTransport for InMemoryArm {
    async fn send(&self, request: ArmRequest) -> Result<ArmResponse, ArmError> {
        let path = request
            .path
            .split('?')
            .next()
            .unwrap_or_default()
            .to_string();
        self.requests
            .lock()
            .unwrap()
            .push((request.method, path.clone()));

        if path.starts_with("https://operations/") {
            return Ok(ArmResponse::new(200).with_body(json!({"status": "Succeeded"})));
        }

        let key = path.to_ascii_lowercase();
        let mut resources = self.resources.lock().unwrap();
        let response = match request.method {
            Method::Get => match resources.get(&key) {
                Some(body) => ArmResponse::new(200).with_body(body.clone()),
                None => Self::not_found(&path),
            },
            Method::Put => {
                let mut body = request.body.unwrap_or_else(|| json!({}));
                if let Some(obj) = body.as_object_mut() {
                    obj.insert("id".to_string(), json!(path));
                    let name = path.rsplit('/').next().unwrap_or_default();
                    obj.insert("name".to_string(), json!(name));
                }
                let created = !resources.contains_key(&key);
                resources.insert(key, body.clone());
                if self.long_running {
                    ArmResponse::new(201)
                        .with_header("Azure-AsyncOperation", "https://operations/put")
                        .with_body(body)
                } else {
                    ArmResponse::new(if created { 201 } else { 200 }).with_body(body)
                }
            }
            Method::Patch => match resources.get_mut(&key) {
                Some(existing) => {
                    if let (Some(props), Some(Value::Object(patch))) = (
                        existing.get_mut("properties").and_then(Value::as_object_mut),
                        request.body,
                    ) {
                        for (k, v) in patch {
                            props.insert(k, v);
                        }
                    }
                    ArmResponse::new(200).with_body(existing.clone())
                }
                None => Self::not_found(&path),
            },
            Method::Delete => match resources.remove(&key) {
                Some(_) if self.long_running => {
                    ArmResponse::new(202).with_header("Location", "https://operations/delete")
                }
                Some(_) => ArmResponse::new(200),
                None => ArmResponse::new(204),
            },
        };
        Ok(response)
    }
}
