use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{AuthClient, AuthError, AuthSession, AuthUser, SignUpOutcome, SignUpRequest};
use crate::config::AuthConfig;

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthServiceConfig {
    pub api_url: String,
    pub api_key: String,
}

impl From<&AuthConfig> for AuthServiceConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            api_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

impl std::fmt::Debug for AuthServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServiceConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Client for the hosted auth service (`/auth/v1`).
#[derive(Debug, Clone)]
pub struct AuthServiceClient {
    config: AuthServiceConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl AuthServiceClient {
    pub fn new(config: AuthServiceConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    async fn post_json(&self, url: String, body: &Value) -> Result<Value, AuthError> {
        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&error_text)
                .unwrap_or_else(|| format!("Authentication request failed with status {status}"));
            warn!("Auth service rejected request ({}): {}", status, message);
            return Err(AuthError::Rejected(message));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| parsed.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn session_from(payload: TokenPayload) -> AuthSession {
    AuthSession {
        access_token: payload.access_token,
        refresh_token: payload.refresh_token,
        expires_in: payload.expires_in,
        user: payload.user,
    }
}

/// Sign-up answers with a token payload when the account is usable right
/// away, and with the bare user (top level or under `user`) otherwise.
fn parse_sign_up(body: Value) -> Result<SignUpOutcome, AuthError> {
    if body.get("access_token").is_some() {
        let payload: TokenPayload =
            serde_json::from_value(body).map_err(|e| AuthError::Decode(e.to_string()))?;
        let session = session_from(payload);
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user_value = body.get("user").cloned().unwrap_or(body);
    let user: AuthUser =
        serde_json::from_value(user_value).map_err(|e| AuthError::Decode(e.to_string()))?;
    Ok(SignUpOutcome {
        user,
        session: None,
    })
}

#[async_trait]
impl AuthClient for AuthServiceClient {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AuthError> {
        let url = format!("{}/auth/v1/signup", self.config.api_url);
        let body = serde_json::json!({
            "email": request.email,
            "password": request.password,
            "data": {
                "first_name": request.first_name.clone().unwrap_or_default(),
                "last_name": request.last_name.clone().unwrap_or_default()
            }
        });

        let response = self.post_json(url, &body).await?;
        let outcome = parse_sign_up(response)?;
        info!(
            "Account created for {} (session issued: {})",
            request.email,
            outcome.session.is_some()
        );
        Ok(outcome)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.config.api_url);
        let body = serde_json::json!({
            "email": email,
            "password": password
        });

        let response = self.post_json(url, &body).await?;
        let payload: TokenPayload =
            serde_json::from_value(response).map_err(|e| AuthError::Decode(e.to_string()))?;
        Ok(session_from(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(url: String) -> AuthServiceClient {
        AuthServiceClient::new(AuthServiceConfig {
            api_url: url,
            api_key: "anon-key".to_string(),
        })
        .expect("client builds")
    }

    fn sign_up_request() -> SignUpRequest {
        SignUpRequest {
            email: "jane@insurer.co".to_string(),
            password: "secret-pass".to_string(),
            first_name: Some("Jane".to_string()),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_sign_up_with_session() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/v1/signup")
            .match_header("apikey", "anon-key")
            .match_body(Matcher::PartialJson(json!({
                "email": "jane@insurer.co",
                "data": {"first_name": "Jane", "last_name": ""}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"tok","refresh_token":"ref","expires_in":3600,
                    "user":{"id":"u-1","email":"jane@insurer.co"}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let outcome = client_for(server.url())
            .sign_up(&sign_up_request())
            .await
            .expect("sign up succeeds");

        assert_eq!(outcome.user.id, "u-1");
        let session = outcome.session.expect("session issued");
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.expires_in, Some(3600));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation_has_no_session() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/v1/signup")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"u-2","email":"jane@insurer.co","confirmation_sent_at":"2024-01-01T00:00:00Z"}"#)
            .create_async()
            .await;

        let outcome = client_for(server.url())
            .sign_up(&sign_up_request())
            .await
            .expect("sign up succeeds");

        assert_eq!(outcome.user.id, "u-2");
        assert!(outcome.session.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rejection_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth/v1/signup")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":422,"msg":"User already registered"}"#)
            .create_async()
            .await;

        let result = client_for(server.url()).sign_up(&sign_up_request()).await;
        assert_eq!(
            result,
            Err(AuthError::Rejected("User already registered".to_string()))
        );
    }

    #[tokio::test]
    async fn test_sign_in_with_password() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .match_body(Matcher::Json(json!({"email": "jane@insurer.co", "password": "right"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok","user":{"id":"u-1"}}"#)
            .create_async()
            .await;
        let _bad = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .match_body(Matcher::Json(json!({"email": "jane@insurer.co", "password": "wrong"})))
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let session = client
            .sign_in_with_password("jane@insurer.co", "right")
            .await
            .expect("sign in succeeds");
        assert_eq!(session.user.id, "u-1");
        assert_eq!(session.refresh_token, None);

        let rejected = client.sign_in_with_password("jane@insurer.co", "wrong").await;
        assert_eq!(
            rejected,
            Err(AuthError::Rejected("Invalid login credentials".to_string()))
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", sign_up_request());
        assert!(!rendered.contains("secret-pass"));
        assert!(rendered.contains("<redacted>"));

        let config = AuthServiceConfig {
            api_url: "http://localhost:54321".to_string(),
            api_key: "anon-key".to_string(),
        };
        assert!(!format!("{:?}", config).contains("anon-key"));
    }

    #[test]
    fn test_transport_errors_get_generic_user_message() {
        let err = AuthError::Transport("connection refused".to_string());
        assert!(!err.user_message().contains("refused"));
        assert_eq!(
            AuthError::Rejected("Signups not allowed".to_string()).user_message(),
            "Signups not allowed"
        );
    }
}
