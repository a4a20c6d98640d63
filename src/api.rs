//! Typed client for the fasting REST backend.
//!
//! Every call attaches the auth headers and collapses the three failure shapes
//! (transport error, HTTP error status, in-band error body) into [`ApiError`].

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{
    Circle, CircleMember, CheckInResult, CoachingReply, CompletedFast, Fast, FastSnapshot, Recipe,
    RecipeQuery, Settings,
};
use crate::offline::ResponseCache;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const NOT_LOGGED_IN_CODES: [&str; 3] = [
    "rest_not_logged_in",
    "rest_cookie_invalid_nonce",
    "jwt_auth_invalid_token",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Weight,
    Hydration,
    Mood,
    Meal,
}

impl LogKind {
    pub fn path(self) -> &'static str {
        match self {
            LogKind::Weight => "/weight",
            LogKind::Hydration => "/hydration",
            LogKind::Mood => "/mood",
            LogKind::Meal => "/meals",
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    nonce: Option<String>,
    cache: Arc<ResponseCache>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!("falling back to a default HTTP client without a request timeout: {err}");
                Client::new()
            });

        Self {
            client,
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
            nonce: config.api_nonce.clone(),
            cache: Arc::new(ResponseCache::default()),
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {url}");

        let mut request = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(nonce) = &self.nonce {
            request = request.header("X-WP-Nonce", nonce);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            warn!("{method} {url} failed: {err}");
            ApiError::Network(err.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;

        let result = normalize(status, &text);
        if let Err(err) = &result {
            warn!("{method} {url}: {err}");
        }
        result
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let value = self.send(method, path, &[], body).await?;
        decode(value)
    }

    /// GET that falls back to the last good body when the network is down.
    async fn get_cached<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let key = cache_key(path, query);
        match self.send(Method::GET, path, query, None).await {
            Ok(value) => {
                self.cache.put(&key, value.clone()).await;
                decode(value)
            }
            Err(err) if err.is_network() => match self.cache.get(&key).await {
                Some(value) => {
                    warn!("serving cached {key} while offline");
                    decode(value)
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    pub async fn active_fast(&self) -> Result<Option<Fast>, ApiError> {
        let fast: Option<Fast> = self.call(Method::GET, "/fasts/active", None).await?;
        Ok(fast.filter(|fast| fast.is_running()).map(Fast::normalized))
    }

    pub async fn start_fast(
        &self,
        target_hours: f64,
        protocol: Option<&str>,
    ) -> Result<Fast, ApiError> {
        let body = json!({ "target_hours": target_hours, "protocol": protocol });
        let fast: Fast = self.call(Method::POST, "/fasts", Some(&body)).await?;
        Ok(fast.normalized())
    }

    pub async fn pause_fast(&self, id: &str) -> Result<Fast, ApiError> {
        let fast: Fast = self.call(Method::POST, &format!("/fasts/{id}/pause"), None).await?;
        Ok(fast.normalized())
    }

    pub async fn resume_fast(&self, id: &str) -> Result<Fast, ApiError> {
        let fast: Fast = self.call(Method::POST, &format!("/fasts/{id}/resume"), None).await?;
        Ok(fast.normalized())
    }

    pub async fn end_fast(&self, id: &str) -> Result<Fast, ApiError> {
        let fast: Fast = self.call(Method::POST, &format!("/fasts/{id}/end"), None).await?;
        Ok(fast.normalized())
    }

    pub async fn fast_history(&self) -> Result<Vec<CompletedFast>, ApiError> {
        self.get_cached("/fasts/history", &[]).await
    }

    pub async fn log(&self, kind: LogKind, payload: &Value) -> Result<Value, ApiError> {
        self.call(Method::POST, kind.path(), Some(payload)).await
    }

    pub async fn analytics(&self) -> Result<Value, ApiError> {
        self.get_cached("/analytics", &[]).await
    }

    pub async fn circles(&self) -> Result<Vec<Circle>, ApiError> {
        self.get_cached("/circles", &[]).await
    }

    pub async fn create_circle(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Circle, ApiError> {
        let body = json!({ "name": name, "description": description });
        self.call(Method::POST, "/circles", Some(&body)).await
    }

    pub async fn join_circle(&self, id: &str) -> Result<Circle, ApiError> {
        self.call(Method::POST, &format!("/circles/{id}/join"), None).await
    }

    pub async fn leave_circle(&self, id: &str) -> Result<Value, ApiError> {
        self.call(Method::POST, &format!("/circles/{id}/leave"), None).await
    }

    pub async fn circle_members(&self, id: &str) -> Result<Vec<CircleMember>, ApiError> {
        self.get_cached(&format!("/circles/{id}/members"), &[]).await
    }

    pub async fn set_buddies(&self, id: &str, buddy_ids: &[String]) -> Result<Value, ApiError> {
        let body = json!({ "buddy_ids": buddy_ids });
        self.call(Method::POST, &format!("/circles/{id}/buddies"), Some(&body)).await
    }

    pub async fn recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, ApiError> {
        let mut params = Vec::new();
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.trim().to_string()));
        }
        if let Some(tag) = query.tag.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("tag", tag.trim().to_string()));
        }
        self.get_cached("/recipes", &params).await
    }

    pub async fn coaching(
        &self,
        topic: &str,
        question: Option<&str>,
        context: &FastSnapshot,
    ) -> Result<CoachingReply, ApiError> {
        let body = json!({
            "topic": topic,
            "question": question,
            "context": {
                "elapsed_ms": context.elapsed_ms,
                "progress": context.progress,
                "zone": context.zone,
                "target_hours": context.fast.as_ref().map(|fast| fast.target_hours),
            },
        });
        self.call(Method::POST, "/coaching", Some(&body)).await
    }

    pub async fn settings(&self) -> Result<Settings, ApiError> {
        self.get_cached("/settings", &[]).await
    }

    pub async fn update_settings(&self, settings: &Settings) -> Result<Settings, ApiError> {
        let body = serde_json::to_value(settings).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.call(Method::PUT, "/settings", Some(&body)).await
    }

    pub async fn save_checkin(&self, result: &CheckInResult) -> Result<Value, ApiError> {
        let body = serde_json::to_value(result).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.call(Method::POST, "/checkins", Some(&body)).await
    }

    pub async fn submit_cognitive(&self, summary: &Value) -> Result<Value, ApiError> {
        self.call(Method::POST, "/cognitive-tests", Some(summary)).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
}

fn cache_key(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let params: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{path}?{}", params.join("&"))
}

/// Turns a raw status and body into the payload or an [`ApiError`].
///
/// Success bodies of the form `{success: true, data}` are unwrapped to `data`.
/// A WordPress error object (`{code, message}`) or `{success: false}` is a
/// failure even under a 2xx status.
pub fn normalize(status: u16, body: &str) -> Result<Value, ApiError> {
    let parsed: Option<Value> = if body.trim().is_empty() {
        Some(Value::Null)
    } else {
        serde_json::from_str(body).ok()
    };

    let ok = (200..300).contains(&status);
    let Some(value) = parsed else {
        return if ok {
            Err(ApiError::Decode("response was not JSON".to_string()))
        } else {
            Err(status_error(status, None, None))
        };
    };

    if !ok {
        return Err(status_error(status, error_message(&value), error_code(&value)));
    }

    if let Some(code) = error_code(&value) {
        if value.get("message").and_then(Value::as_str).is_some() {
            let message = error_message(&value).unwrap_or_default();
            return Err(if NOT_LOGGED_IN_CODES.contains(&code.as_str()) {
                ApiError::Unauthorized { message }
            } else {
                ApiError::Envelope { message }
            });
        }
    }

    match value.get("success").and_then(Value::as_bool) {
        Some(false) => Err(ApiError::Envelope {
            message: error_message(&value).unwrap_or_else(|| "Request failed".to_string()),
        }),
        Some(true) => Ok(value.get("data").cloned().unwrap_or(Value::Null)),
        None => Ok(value),
    }
}

fn status_error(status: u16, message: Option<String>, code: Option<String>) -> ApiError {
    let message = message.unwrap_or_else(|| format!("Request failed with status {status}"));
    let not_logged_in = code
        .as_deref()
        .is_some_and(|code| NOT_LOGGED_IN_CODES.contains(&code));
    if status == 401 || not_logged_in {
        ApiError::Unauthorized { message }
    } else {
        ApiError::Status { status, message }
    }
}

fn error_code(value: &Value) -> Option<String> {
    value.get("code").and_then(Value::as_str).map(str::to_string)
}

fn error_message(value: &Value) -> Option<String> {
    let direct = value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str);
    let nested = value
        .get("data")
        .and_then(|data| data.get("message"))
        .and_then(Value::as_str);
    direct.or(nested).map(str::to_string)
}
