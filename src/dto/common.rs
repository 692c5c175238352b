use crate::error::{ConsoleError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Envelope status the backend uses for success.
pub const SUCCESS_STATUS: &str = "0000";
/// Envelope status returned by endpoints that exist but are not built yet.
pub const NOT_IMPLEMENTED_STATUS: &str = "9999";

/*
{"status":"0000","data":{"rows":[...],"pagination":{"page":1,"limit":20,"total":42,"totalPages":3}}}
{"status":"1002","message":"Invalid agentId"}
*/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Success carries data; any other status becomes a typed error.
    pub fn into_result(self) -> Result<T, ConsoleError> {
        if self.is_success() {
            self.data
                .ok_or_else(|| ConsoleError::Decode("success envelope without data".to_string()))
        } else {
            Err(self.into_error())
        }
    }

    /// For endpoints whose success carries no payload (deletes, logout).
    pub fn into_ack(self) -> Result<(), ConsoleError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    fn into_error(self) -> ConsoleError {
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("request failed with status {}", self.status));
        if self.status == NOT_IMPLEMENTED_STATUS {
            ConsoleError::NotImplemented(message)
        } else {
            ConsoleError::Api {
                status: self.status,
                message,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            total: 0,
            total_pages: 0,
        }
    }
}

impl Pagination {
    pub fn expected_total_pages(total: u64, limit: u32) -> u32 {
        if limit == 0 {
            return 0;
        }
        let pages = total.div_ceil(u64::from(limit));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// `total_pages == ceil(total / limit)` and `page` within `1..=max(total_pages, 1)`.
    pub fn is_consistent(&self) -> bool {
        let pages_ok = self.limit == 0
            || self.total_pages == Self::expected_total_pages(self.total, self.limit);
        pages_ok && self.page >= 1 && self.page <= self.total_pages.max(1)
    }

    /// Recomputes `total_pages` and clamps `page` into range.
    pub fn normalized(self) -> Self {
        let total_pages = if self.limit == 0 {
            self.total_pages
        } else {
            Self::expected_total_pages(self.total, self.limit)
        };
        Self {
            page: self.page.clamp(1, total_pages.max(1)),
            total_pages,
            ..self
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// One page of rows. Older endpoints name the row array after the entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(
        alias = "bets",
        alias = "agents",
        alias = "players",
        alias = "users"
    )]
    pub rows: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    SuperAdmin,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Cancelled,
}

impl BetStatus {
    pub const ALL: [BetStatus; 4] = [
        BetStatus::Pending,
        BetStatus::Won,
        BetStatus::Lost,
        BetStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "PENDING",
            BetStatus::Won => "WON",
            BetStatus::Lost => "LOST",
            BetStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BetStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::invalid_value("status", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Daredevil,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Daredevil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
            Difficulty::Daredevil => "DAREDEVIL",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::invalid_value("difficulty", s))
    }
}

/// Distinct values offered by the dropdown filters of a list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub games: Vec<String>,
    #[serde(default)]
    pub currencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_code: String,
    pub game_name: String,
    #[serde(default)]
    pub is_active: bool,
}
