//! HTTP implementation of the API surface.
//!
//! Every request carries `Content-Type: application/json` and, when a token
//! is held, `Authorization: Bearer <token>`. Responses are content-type
//! gated: only `application/json` bodies are parsed, anything else is a
//! protocol error carrying the HTTP status. A 401 clears the session and
//! fires the registered auth-failure hook — hard logout, no retry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::api::SecretaryApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::SessionStore;
use crate::types::{
    ActivityItem, Approval, CalendarEvent, DashboardStats, Email, EmailQuery, LoginResponse,
    Notification, Task, TaskDraft, TaskQuery, UserProfile,
};

/// Called after a 401 has cleared the session; the embedding UI uses it to
/// navigate to its login view.
pub type AuthFailureHook = Box<dyn Fn() + Send + Sync>;

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    on_auth_failure: Option<AuthFailureHook>,
}

impl HttpApi {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            on_auth_failure: None,
        })
    }

    /// Register the hard-logout hook. At most one; later calls replace it.
    pub fn with_auth_failure_hook(mut self, hook: AuthFailureHook) -> Self {
        self.on_auth_failure = Some(hook);
        self
    }

    fn auth_header(&self) -> Option<String> {
        self.session.token().map(|t| format!("Bearer {t}"))
    }

    /// 401 policy: wipe the session, then notify the UI. Deliberate hard
    /// logout, not a refresh attempt.
    fn force_logout(&self) {
        if let Err(err) = self.session.clear() {
            log::warn!("failed to clear session after 401: {err}");
        }
        if let Some(hook) = &self.on_auth_failure {
            hook();
        }
    }

    /// Core request primitive. URL is `base_url + endpoint`.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut builder = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(header) = self.auth_header() {
            builder = builder.header(AUTHORIZATION, header);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let text = response.text().await?;

        match interpret_response(status, content_type.as_deref(), &text) {
            Interpreted::Success(value) => Ok(value),
            Interpreted::Unauthorized => {
                self.force_logout();
                Err(ClientError::Auth)
            }
            Interpreted::Failed { status, message } => {
                Err(ClientError::Api { status, message })
            }
            Interpreted::NotJson { status } => Err(ClientError::Protocol { status }),
        }
    }

    /// GET with a flat, order-preserving key→value query.
    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Value, ClientError> {
        self.request(Method::GET, &endpoint_with_query(endpoint, params), None)
            .await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, ClientError> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> Result<Value, ClientError> {
        self.request(Method::PUT, endpoint, Some(body)).await
    }

    pub async fn patch(&self, endpoint: &str, body: Value) -> Result<Value, ClientError> {
        self.request(Method::PATCH, endpoint, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, ClientError> {
        self.request(Method::DELETE, endpoint, None).await
    }
}

/// What a completed HTTP exchange means, decided from status, content type
/// and body alone. Pulled out of `request` so the policy is testable without
/// a live server.
#[derive(Debug, PartialEq)]
enum Interpreted {
    Success(Value),
    Unauthorized,
    Failed { status: u16, message: String },
    NotJson { status: u16 },
}

fn interpret_response(status: u16, content_type: Option<&str>, body: &str) -> Interpreted {
    let is_json = content_type
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Interpreted::NotJson { status };
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return Interpreted::NotJson { status },
    };

    if (200..300).contains(&status) {
        return Interpreted::Success(value);
    }
    if status == 401 {
        return Interpreted::Unauthorized;
    }

    let message = value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or("API error")
        .to_string();
    Interpreted::Failed { status, message }
}

/// Append `params` as an order-preserving, URL-encoded query string.
fn endpoint_with_query(endpoint: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return endpoint.to_string();
    }
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    format!("{}?{}", endpoint, serializer.finish())
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(ClientError::Json)
}

/// The source's API variants disagree on whether lists arrive bare or
/// wrapped (`[..]` vs `{"approvals": [..]}`). Accept both.
fn decode_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>, ClientError> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => map.remove(key).unwrap_or_else(|| Value::Array(Vec::new())),
        _ => Value::Array(Vec::new()),
    };
    decode(list)
}

/// Unwrap `{"user": {..}}` style envelopes, tolerating the bare form.
fn unwrap_key(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(key) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl SecretaryApi for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = json!({ "email": email, "password": password });
        let value = self.post("/auth/login", body).await?;
        let login: LoginResponse = decode(value)?;
        self.session
            .set_session(login.token.clone(), login.user.clone())?;
        log::info!("logged in as {}", login.user.email);
        Ok(login)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        // Local clear first: a dead backend must not keep us logged in.
        self.session.clear()?;
        if let Err(err) = self.post("/auth/logout", json!({})).await {
            log::warn!("logout request failed (session already cleared): {err}");
        }
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, ClientError> {
        let value = self.get("/auth/me", &[]).await?;
        let user: UserProfile = decode(unwrap_key(value, "user"))?;
        self.session.set_user(Some(user.clone()))?;
        Ok(user)
    }

    async fn google_auth_url(&self) -> Result<String, ClientError> {
        let value = self.get("/auth/google/url", &[]).await?;
        decode(unwrap_key(value, "url"))
    }

    async fn oauth_callback(
        &self,
        code: &str,
        state: &str,
    ) -> Result<LoginResponse, ClientError> {
        let body = json!({ "code": code, "state": state });
        let value = self.post("/auth/oauth/callback", body).await?;
        let login: LoginResponse = decode(value)?;
        self.session
            .set_session(login.token.clone(), login.user.clone())?;
        Ok(login)
    }

    async fn pending_approvals(&self) -> Result<Vec<Approval>, ClientError> {
        let value = self.get("/approvals", &[]).await?;
        decode_list(value, "approvals")
    }

    async fn approve_task(&self, id: i64, edits: &TaskDraft) -> Result<(), ClientError> {
        let body = json!({ "task": edits });
        self.post(&format!("/approvals/{id}/approve"), body).await?;
        Ok(())
    }

    async fn reject_task(&self, id: i64, reason: Option<&str>) -> Result<(), ClientError> {
        let body = match reason {
            Some(reason) => json!({ "reason": reason }),
            None => json!({}),
        };
        self.post(&format!("/approvals/{id}/reject"), body).await?;
        Ok(())
    }

    async fn update_approval(&self, id: i64, edits: &TaskDraft) -> Result<(), ClientError> {
        let body = json!({ "task": edits });
        self.patch(&format!("/approvals/{id}"), body).await?;
        Ok(())
    }

    async fn emails(&self, query: &EmailQuery) -> Result<Vec<Email>, ClientError> {
        let value = self.get("/emails", &query.to_params()).await?;
        decode_list(value, "emails")
    }

    async fn sync_emails(&self) -> Result<(), ClientError> {
        self.post("/emails/sync", json!({})).await?;
        Ok(())
    }

    async fn approve_email(&self, id: i64) -> Result<(), ClientError> {
        self.post(&format!("/emails/{id}/approve"), json!({})).await?;
        Ok(())
    }

    async fn reject_email(&self, id: i64) -> Result<(), ClientError> {
        self.post(&format!("/emails/{id}/reject"), json!({})).await?;
        Ok(())
    }

    async fn tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let value = self.get("/tasks", &query.to_params()).await?;
        decode_list(value, "tasks")
    }

    async fn complete_task(&self, id: i64) -> Result<(), ClientError> {
        self.post(&format!("/tasks/{id}/complete"), json!({})).await?;
        Ok(())
    }

    async fn calendar_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, ClientError> {
        let params = vec![
            ("start".to_string(), start.to_rfc3339()),
            ("end".to_string(), end.to_rfc3339()),
        ];
        let value = self.get("/tasks/calendar", &params).await?;
        decode_list(value, "events")
    }

    async fn sync_calendar(&self) -> Result<(), ClientError> {
        self.post("/calendar/sync", json!({})).await?;
        Ok(())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let value = self.get("/dashboard/stats", &[]).await?;
        decode(unwrap_key(value, "stats"))
    }

    async fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityItem>, ClientError> {
        let params = vec![("limit".to_string(), limit.to_string())];
        let value = self.get("/dashboard/activity", &params).await?;
        decode_list(value, "activities")
    }

    async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        let value = self.get("/notifications", &[]).await?;
        decode_list(value, "notifications")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    fn test_client() -> HttpApi {
        HttpApi::new(
            &ClientConfig::default(),
            Arc::new(SessionStore::in_memory()),
        )
        .unwrap()
    }

    // --- query building ---

    #[test]
    fn test_query_order_preserved() {
        let params = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        assert_eq!(endpoint_with_query("/tasks", &params), "/tasks?a=1&b=2");
    }

    #[test]
    fn test_query_url_encoded() {
        let params = vec![("q".to_string(), "board deck & slides".to_string())];
        assert_eq!(
            endpoint_with_query("/emails", &params),
            "/emails?q=board+deck+%26+slides"
        );
    }

    #[test]
    fn test_query_empty_params_bare_endpoint() {
        assert_eq!(endpoint_with_query("/approvals", &[]), "/approvals");
    }

    // --- response interpretation ---

    #[test]
    fn test_interpret_success_json() {
        let out = interpret_response(200, Some("application/json"), r#"{"ok":true}"#);
        assert_eq!(out, Interpreted::Success(json!({"ok": true})));
    }

    #[test]
    fn test_interpret_json_with_charset() {
        let out = interpret_response(200, Some("application/json; charset=utf-8"), "[]");
        assert_eq!(out, Interpreted::Success(json!([])));
    }

    #[test]
    fn test_interpret_401_is_unauthorized() {
        let out = interpret_response(401, Some("application/json"), r#"{"error":"unauthorized"}"#);
        assert_eq!(out, Interpreted::Unauthorized);
    }

    #[test]
    fn test_interpret_error_key() {
        let out = interpret_response(400, Some("application/json"), r#"{"error":"bad input"}"#);
        assert_eq!(
            out,
            Interpreted::Failed {
                status: 400,
                message: "bad input".to_string()
            }
        );
    }

    #[test]
    fn test_interpret_message_key_fallback() {
        let out = interpret_response(500, Some("application/json"), r#"{"message":"boom"}"#);
        assert_eq!(
            out,
            Interpreted::Failed {
                status: 500,
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_interpret_generic_message_when_body_has_neither() {
        let out = interpret_response(503, Some("application/json"), r#"{}"#);
        assert_eq!(
            out,
            Interpreted::Failed {
                status: 503,
                message: "API error".to_string()
            }
        );
    }

    #[test]
    fn test_interpret_html_body_is_protocol_error() {
        let out = interpret_response(502, Some("text/html"), "<html>Bad Gateway</html>");
        assert_eq!(out, Interpreted::NotJson { status: 502 });
    }

    #[test]
    fn test_interpret_missing_content_type_is_protocol_error() {
        let out = interpret_response(204, None, "");
        assert_eq!(out, Interpreted::NotJson { status: 204 });
    }

    #[test]
    fn test_interpret_malformed_json_is_protocol_error() {
        let out = interpret_response(200, Some("application/json"), "{not json");
        assert_eq!(out, Interpreted::NotJson { status: 200 });
    }

    // --- auth header ---

    #[test]
    fn test_no_token_no_authorization_header() {
        let client = test_client();
        assert!(client.auth_header().is_none());
    }

    #[test]
    fn test_token_produces_bearer_header() {
        let client = test_client();
        client.session.set_token(Some("tok-123".to_string())).unwrap();
        assert_eq!(client.auth_header().as_deref(), Some("Bearer tok-123"));
    }

    // --- 401 policy ---

    #[test]
    fn test_force_logout_clears_session_and_fires_hook() {
        let fired = Arc::new(AtomicBool::new(false));
        let observed = fired.clone();

        let session = Arc::new(SessionStore::in_memory());
        session.set_token(Some("tok".to_string())).unwrap();

        let client = HttpApi::new(&ClientConfig::default(), session.clone())
            .unwrap()
            .with_auth_failure_hook(Box::new(move || {
                observed.store(true, Ordering::SeqCst);
            }));

        client.force_logout();

        assert!(session.token().is_none());
        assert!(!session.is_authenticated());
        assert!(fired.load(Ordering::SeqCst));
    }

    // --- envelope tolerance ---

    #[test]
    fn test_decode_list_bare_array() {
        let emails: Vec<i64> = decode_list(json!([1, 2, 3]), "emails").unwrap();
        assert_eq!(emails, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_list_wrapped() {
        let emails: Vec<i64> = decode_list(json!({"emails": [4, 5]}), "emails").unwrap();
        assert_eq!(emails, vec![4, 5]);
    }

    #[test]
    fn test_decode_list_missing_key_is_empty() {
        let emails: Vec<i64> = decode_list(json!({"other": 1}), "emails").unwrap();
        assert!(emails.is_empty());
    }

    #[test]
    fn test_unwrap_key_envelope_and_bare() {
        assert_eq!(unwrap_key(json!({"url": "https://x"}), "url"), json!("https://x"));
        assert_eq!(unwrap_key(json!("https://x"), "url"), json!("https://x"));
    }
}
