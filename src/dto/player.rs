use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One player's activity on one platform and game within the filtered window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_id: String,
    pub platform: String,
    pub game: String,
    pub bet_count: u64,
    pub bet_amount: Decimal,
    pub player_win_loss: Decimal,
    pub total_win_loss: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummaryTotals {
    pub total_players: u64,
    pub total_bet_count: u64,
    pub total_bet_amount: Decimal,
    pub total_player_win_loss: Decimal,
    pub total_win_loss: Decimal,
}
