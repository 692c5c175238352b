use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_AGENT_CURRENCY: &str = "INR";
pub const MAX_AGENT_ID_LEN: usize = 20;
pub const MIN_AGENT_PASSWORD_LEN: usize = 8;

/// Row of the agents report: one agent on one platform and game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub agent_id: String,
    pub platform: String,
    pub game: String,
    pub bet_count: u64,
    pub bet_amount: Decimal,
    pub win_loss: Decimal,
    #[serde(default)]
    pub adjustment: Decimal,
    pub total_win_loss: Decimal,
    pub margin_percent: Decimal,
    pub company_total_win_loss: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTotals {
    pub total_bet_count: u64,
    pub total_bet_amount: Decimal,
    pub total_win_loss: Decimal,
    pub total_margin_percent: Decimal,
    pub company_total_win_loss: Decimal,
}

/// An operator integration as managed on the agents screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
    #[serde(rename = "agentIPaddress")]
    pub agent_ip_address: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    #[serde(default)]
    pub is_whitelisted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub allowed_game_codes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<AgentStatistics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatistics {
    pub user_count: u64,
    pub total_bets: u64,
    pub total_bet_volume: Decimal,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub agent_id: String,
    pub cert: String,
    #[serde(rename = "agentIPaddress")]
    pub agent_ip_address: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: String,
    pub currency: String,
    pub is_whitelisted: bool,
    pub allowed_game_codes: Vec<String>,
    pub password: String,
}

impl std::fmt::Debug for CreateAgentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAgentRequest")
            .field("agent_id", &self.agent_id)
            .field("agent_ip_address", &self.agent_ip_address)
            .field("callback_url", &self.callback_url)
            .field("currency", &self.currency)
            .field("is_whitelisted", &self.is_whitelisted)
            .field("allowed_game_codes", &self.allowed_game_codes)
            .field("password", &"***")
            .finish()
    }
}

impl CreateAgentRequest {
    pub fn new(
        agent_id: impl Into<String>,
        cert: impl Into<String>,
        agent_ip_address: impl Into<String>,
        callback_url: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            cert: cert.into(),
            agent_ip_address: agent_ip_address.into(),
            callback_url: callback_url.into(),
            currency: DEFAULT_AGENT_CURRENCY.to_string(),
            is_whitelisted: false,
            allowed_game_codes: Vec::new(),
            password: password.into(),
        }
    }

    /// Form rules checked before the create request is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            &self.agent_id,
            &self.cert,
            &self.agent_ip_address,
            &self.callback_url,
            &self.password,
        ];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(ValidationError::Form(
                "Please fill in all required fields".to_string(),
            ));
        }
        if !self.agent_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::Form(
                "Agent ID must contain only alphanumeric characters".to_string(),
            ));
        }
        if self.agent_id.len() > MAX_AGENT_ID_LEN {
            return Err(ValidationError::Form(format!(
                "Agent ID must be {MAX_AGENT_ID_LEN} characters or less"
            )));
        }
        if self.password.chars().count() < MIN_AGENT_PASSWORD_LEN {
            return Err(ValidationError::Form(format!(
                "Password must be at least {MIN_AGENT_PASSWORD_LEN} characters long"
            )));
        }
        Ok(())
    }

    /// Blank currency falls back to the platform default.
    pub fn normalized(mut self) -> Self {
        if self.currency.trim().is_empty() {
            self.currency = DEFAULT_AGENT_CURRENCY.to_string();
        }
        self
    }
}

/// Partial update; empty strings are dropped before sending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
    #[serde(rename = "agentIPaddress", skip_serializing_if = "Option::is_none")]
    pub agent_ip_address: Option<String>,
    #[serde(rename = "callbackURL", skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_whitelisted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_game_codes: Option<Vec<String>>,
}

impl UpdateAgentRequest {
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            cert: keep(self.cert),
            agent_ip_address: keep(self.agent_ip_address),
            callback_url: keep(self.callback_url),
            currency: keep(self.currency),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateAgentRequest {
        CreateAgentRequest::new(
            "agent007",
            "cert-abc",
            "10.0.0.1",
            "https://operator.example/callback",
            "s3cretpass",
        )
    }

    #[test]
    fn test_valid_agent_passes() {
        let req = request();
        assert!(req.validate().is_ok());
        assert_eq!(req.currency, "INR");
    }

    #[test]
    fn test_missing_required_field() {
        let mut req = request();
        req.cert = "  ".to_string();
        assert_eq!(
            req.validate(),
            Err(ValidationError::Form(
                "Please fill in all required fields".to_string()
            ))
        );
    }

    #[test]
    fn test_agent_id_rules() {
        let mut req = request();
        req.agent_id = "agent-007".to_string();
        assert!(req.validate().is_err());

        req.agent_id = "a".repeat(21);
        assert!(req.validate().is_err());

        req.agent_id = "a".repeat(20);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_short_password_rejected() {
        let mut req = request();
        req.password = "short".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let rendered = format!("{:?}", request());
        assert!(!rendered.contains("s3cretpass"));
    }

    #[test]
    fn test_update_drops_blank_fields() {
        let update = UpdateAgentRequest {
            cert: Some("".to_string()),
            callback_url: Some(" https://cb ".to_string()),
            is_whitelisted: Some(true),
            ..Default::default()
        }
        .normalized();

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"callbackURL": "https://cb", "isWhitelisted": true})
        );
    }
}
