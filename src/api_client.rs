use crate::auth::CredentialProvider;
use crate::config::ConsoleConfig;
use crate::dto::*;
use crate::error::{ConsoleError, Result};
use crate::query::QueryParams;
use crate::retry::{RetryConfig, RetryPolicy};
use reqwest::{Client, Method, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const LOGIN_PATH: &str = "/auth/login";

/// HTTP client for the admin backend.
///
/// Every call returns the envelope's `data` on status `0000` and a
/// [`ConsoleError`] otherwise. Reads are retried on transport errors and
/// 5xx responses; writes are sent once.
#[derive(Clone)]
pub struct AdminApiClient {
    client: Client,
    config: Arc<ConsoleConfig>,
    credentials: Arc<dyn CredentialProvider>,
    retry_policy: RetryPolicy,
}

impl AdminApiClient {
    pub fn new(config: ConsoleConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let retry_policy = RetryPolicy::new(RetryConfig {
            max_attempts: config.max_retries.max(1),
            ..RetryConfig::default()
        });
        Ok(Self {
            client,
            config: Arc::new(config),
            credentials,
            retry_policy,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root(), path)
    }

    async fn execute<T>(
        &self,
        method: Method,
        path: &str,
        query: Option<&QueryParams>,
        body: Option<&Value>,
    ) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            request = request.query(query.as_map());
        }
        if let Some(token) = self.credentials.bearer_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("{} -> {}", url, status);
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED && path == LOGIN_PATH {
            let message = envelope_message(&text)
                .unwrap_or_else(|| "invalid username or password".to_string());
            warn!("Login rejected: {}", message);
            return Err(ConsoleError::InvalidCredentials(message));
        }
        if status == StatusCode::UNAUTHORIZED {
            warn!("{} rejected the session token", path);
            self.credentials.invalidate();
            return Err(ConsoleError::Unauthorized);
        }
        if status == StatusCode::NOT_IMPLEMENTED {
            let message = envelope_message(&text).unwrap_or_else(|| path.to_string());
            return Err(ConsoleError::NotImplemented(message));
        }
        if !status.is_success() {
            let message = envelope_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(ConsoleError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// GET with retries.
    pub async fn get<T>(&self, path: &str, query: Option<&QueryParams>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.retry_policy
            .retry_if(
                || async move {
                    self.execute::<T>(Method::GET, path, query, None)
                        .await?
                        .into_result()
                },
                ConsoleError::is_retryable,
            )
            .await
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        self.execute::<IgnoredAny>(method, path, None, body.as_ref())
            .await?
            .into_ack()
    }

    async fn send_for<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.execute::<T>(method, path, None, Some(&body))
            .await?
            .into_result()
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.send_for(Method::POST, LOGIN_PATH, &request).await?;
        info!(
            "Logged in as {} ({:?})",
            response.admin.username, response.admin.role
        );
        Ok(response)
    }

    pub async fn logout(&self) -> Result<()> {
        self.send(Method::POST, "/auth/logout", Some(&serde_json::json!({})))
            .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.send_for(Method::POST, "/auth/refresh", &request).await
    }

    /// Not retried: a stale token should surface at once.
    pub async fn me(&self) -> Result<Admin> {
        self.execute::<Admin>(Method::GET, "/auth/me", None, None)
            .await?
            .into_result()
    }

    // ========================================================================
    // Lists and lookups
    // ========================================================================

    /// Rows of a paginated list endpoint such as `/bets`.
    pub async fn list_page<T>(&self, path: &str, params: &QueryParams) -> Result<Page<T>>
    where
        T: DeserializeOwned,
    {
        self.get(path, Some(params)).await
    }

    /// Aggregates of a list endpoint over the whole filtered set.
    pub async fn list_totals<T>(&self, path: &str, params: &QueryParams) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get(&format!("{path}/totals"), Some(params)).await
    }

    pub async fn filter_options(&self, path: &str) -> Result<FilterOptions> {
        self.get(&format!("{path}/filter-options"), None).await
    }

    pub async fn active_games(&self) -> Result<Vec<Game>> {
        self.get("/games/active", None).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.get("/dashboard/overview", None).await
    }

    // ========================================================================
    // Bets
    // ========================================================================

    pub async fn get_bet(&self, bet_id: &str) -> Result<Bet> {
        self.get(&format!("/bets/{}", segment(bet_id)), None).await
    }

    // ========================================================================
    // Agents
    // ========================================================================

    /// Full agent records for the management screen.
    pub async fn list_all_agents(&self) -> Result<Vec<Agent>> {
        self.get("/agents/all", None).await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.get(&format!("/agents/{}", segment(agent_id)), None)
            .await
    }

    pub async fn create_agent(&self, request: &CreateAgentRequest) -> Result<()> {
        let request = request.clone().normalized();
        request.validate()?;
        info!("Creating agent {}", request.agent_id);
        self.send(Method::POST, "/agents", Some(&request)).await
    }

    pub async fn update_agent(&self, agent_id: &str, request: &UpdateAgentRequest) -> Result<()> {
        let request = request.clone().normalized();
        info!("Updating agent {}", agent_id);
        self.send(
            Method::PATCH,
            &format!("/agents/{}", segment(agent_id)),
            Some(&request),
        )
        .await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        info!("Deleting agent {}", agent_id);
        self.send::<()>(Method::DELETE, &format!("/agents/{}", segment(agent_id)), None)
            .await
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_user(&self, user_id: &str, agent_id: &str) -> Result<User> {
        self.get(&user_path(user_id, agent_id), None).await
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<()> {
        info!("Creating user {}/{}", request.user_id, request.agent_id);
        self.send(Method::POST, "/users", Some(request)).await
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        agent_id: &str,
        request: &UpdateUserRequest,
    ) -> Result<()> {
        self.send(Method::PATCH, &user_path(user_id, agent_id), Some(request))
            .await
    }

    pub async fn delete_user(&self, user_id: &str, agent_id: &str) -> Result<()> {
        info!("Deleting user {}/{}", user_id, agent_id);
        self.send::<()>(Method::DELETE, &user_path(user_id, agent_id), None)
            .await
    }

    // ========================================================================
    // Game config
    // ========================================================================

    pub async fn list_configs(&self) -> Result<Vec<GameConfig>> {
        self.get("/config", None).await
    }

    pub async fn get_config(&self, key: &str) -> Result<GameConfig> {
        self.get(&format!("/config/{}", segment(key)), None).await
    }

    pub async fn create_config(&self, key: &str, value: &str) -> Result<()> {
        let request = ConfigEntryRequest {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.send(Method::POST, "/config", Some(&request)).await
    }

    pub async fn update_config(&self, key: &str, value: &str) -> Result<()> {
        let request = ConfigValueRequest {
            value: value.to_string(),
        };
        self.send(
            Method::PATCH,
            &format!("/config/{}", segment(key)),
            Some(&request),
        )
        .await
    }

    pub async fn delete_config(&self, key: &str) -> Result<()> {
        self.send::<()>(Method::DELETE, &format!("/config/{}", segment(key)), None)
            .await
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value.trim()).into_owned()
}

fn user_path(user_id: &str, agent_id: &str) -> String {
    format!("/users/{}/{}", segment(user_id), segment(agent_id))
}

/// The `message` of an error body, if it is an envelope.
fn envelope_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<IgnoredAny>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(user_path("user 1", "agent/7"), "/users/user%201/agent%2F7");
    }

    #[test]
    fn test_envelope_message_extraction() {
        assert_eq!(
            envelope_message(r#"{"status":"1002","message":"Invalid agentId"}"#).as_deref(),
            Some("Invalid agentId")
        );
        assert_eq!(envelope_message("<html>502</html>"), None);
        assert_eq!(envelope_message(r#"{"status":"1","message":" "}"#), None);
    }
}
