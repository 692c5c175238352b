use super::common::{BetStatus, Difficulty};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_platform_tx_id: Option<String>,
    pub user_id: String,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    pub difficulty: Difficulty,
    pub bet_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_amount: Option<Decimal>,
    pub currency: String,
    pub status: BetStatus,
    pub bet_placed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl Bet {
    /// Player win minus stake; zero while the bet is still open.
    pub fn net_result(&self) -> Decimal {
        match self.status {
            BetStatus::Pending | BetStatus::Cancelled => Decimal::ZERO,
            BetStatus::Won | BetStatus::Lost => {
                self.win_amount.unwrap_or(Decimal::ZERO) - self.bet_amount
            }
        }
    }
}

/// Aggregates over every bet matching the filters, not just the current page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetTotals {
    pub total_bets: u64,
    pub total_bet_amount: Decimal,
    pub total_win_amount: Decimal,
    pub net_revenue: Decimal,
}
