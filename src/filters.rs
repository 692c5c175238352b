//! Typed filter sets for the list views.
//!
//! Each view has its own filter struct; the shared [`FilterSet`] trait gives
//! them one query-parameter contract and one way of assigning a field from
//! its string form (draft edits, deep links, CLI flags).

use crate::dates::{parse_date_input, DateRange, DayBound};
use crate::dto::{BetStatus, Difficulty};
use crate::error::ValidationError;
use crate::query::QueryParams;
use chrono::FixedOffset;
use std::fmt::Debug;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

pub const PAGE_KEY: &str = "page";
pub const LIMIT_KEY: &str = "limit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page == 0 {
            return Err(ValidationError::NotPositive {
                field: PAGE_KEY,
                value: self.page.to_string(),
            });
        }
        if self.limit == 0 {
            return Err(ValidationError::NotPositive {
                field: LIMIT_KEY,
                value: self.limit.to_string(),
            });
        }
        Ok(())
    }
}

/// Parses a page or limit value; zero, negatives and garbage are rejected.
pub fn parse_positive(field: &'static str, value: &str) -> Result<u32, ValidationError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::NotPositive {
            field,
            value: value.to_string(),
        }),
    }
}

/// Trimmed text, `None` when blank.
pub fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_optional<T>(value: &str) -> Result<Option<T>, ValidationError>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    if value.trim().is_empty() {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

pub trait FilterSet: Debug + Clone + Default + PartialEq + Send + Sync + 'static {
    const FROM_KEY: &'static str = "fromDate";
    const TO_KEY: &'static str = "toDate";
    /// Text and enum fields this set understands, by wire name.
    const FIELDS: &'static [&'static str];

    fn page_request(&self) -> &PageRequest;
    fn page_request_mut(&mut self) -> &mut PageRequest;
    fn date_range(&self) -> &DateRange;
    fn date_range_mut(&mut self) -> &mut DateRange;

    /// Sets one text or enum field; a blank value clears it.
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError>;

    /// Emits the text and enum fields that are set.
    fn push_fields(&self, params: &mut QueryParams);

    fn agent_id(&self) -> Option<&str>;
    fn agent_id_mut(&mut self) -> &mut Option<String>;

    fn is_date_key(key: &str) -> bool {
        key == Self::FROM_KEY || key == Self::TO_KEY
    }

    fn is_pagination_key(key: &str) -> bool {
        key == PAGE_KEY || key == LIMIT_KEY
    }

    /// Assigns any field from its string form. Dates are snapped to the
    /// boundary of their local day in `offset`.
    fn assign(
        &mut self,
        key: &str,
        value: &str,
        offset: &FixedOffset,
    ) -> Result<(), ValidationError> {
        if key == Self::FROM_KEY || key == Self::TO_KEY {
            let bound = if key == Self::FROM_KEY {
                DayBound::Start
            } else {
                DayBound::End
            };
            let parsed = if value.trim().is_empty() {
                None
            } else {
                Some(parse_date_input(value, bound, offset)?)
            };
            let range = self.date_range_mut();
            match bound {
                DayBound::Start => range.from = parsed,
                DayBound::End => range.to = parsed,
            }
            Ok(())
        } else if key == PAGE_KEY {
            self.page_request_mut().page = parse_positive(PAGE_KEY, value)?;
            Ok(())
        } else if key == LIMIT_KEY {
            self.page_request_mut().limit = parse_positive(LIMIT_KEY, value)?;
            Ok(())
        } else {
            self.set_field(key, value)
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.date_range().validate()?;
        self.page_request().validate()
    }

    fn query_params(&self) -> QueryParams {
        let mut params = self.totals_params();
        let page = self.page_request();
        params
            .push_value(PAGE_KEY, Some(page.page))
            .push_value(LIMIT_KEY, Some(page.limit));
        params
    }

    /// Same mapping as [`FilterSet::query_params`] without pagination.
    fn totals_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        self.push_fields(&mut params);
        let range = self.date_range();
        params
            .push_timestamp(Self::FROM_KEY, range.from.as_ref())
            .push_timestamp(Self::TO_KEY, range.to.as_ref());
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BetFilters {
    pub user_id: Option<String>,
    pub agent_id: Option<String>,
    pub platform: Option<String>,
    pub game: Option<String>,
    pub currency: Option<String>,
    pub status: Option<BetStatus>,
    pub difficulty: Option<Difficulty>,
    pub dates: DateRange,
    pub page: PageRequest,
}

impl FilterSet for BetFilters {
    const FIELDS: &'static [&'static str] = &[
        "userId",
        "agentId",
        "platform",
        "game",
        "currency",
        "status",
        "difficulty",
    ];

    fn page_request(&self) -> &PageRequest {
        &self.page
    }

    fn page_request_mut(&mut self) -> &mut PageRequest {
        &mut self.page
    }

    fn date_range(&self) -> &DateRange {
        &self.dates
    }

    fn date_range_mut(&mut self) -> &mut DateRange {
        &mut self.dates
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "userId" => self.user_id = normalize_text(value),
            "agentId" => self.agent_id = normalize_text(value),
            "platform" => self.platform = normalize_text(value),
            "game" => self.game = normalize_text(value),
            "currency" => self.currency = normalize_text(value),
            "status" => self.status = parse_optional(value)?,
            "difficulty" => self.difficulty = parse_optional(value)?,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn push_fields(&self, params: &mut QueryParams) {
        params
            .push_text("userId", self.user_id.as_deref())
            .push_text("agentId", self.agent_id.as_deref())
            .push_text("platform", self.platform.as_deref())
            .push_text("game", self.game.as_deref())
            .push_text("currency", self.currency.as_deref())
            .push_value("status", self.status)
            .push_value("difficulty", self.difficulty);
    }

    fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    fn agent_id_mut(&mut self) -> &mut Option<String> {
        &mut self.agent_id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSummaryFilters {
    pub player_id: Option<String>,
    pub agent_id: Option<String>,
    pub platform: Option<String>,
    pub game: Option<String>,
    pub dates: DateRange,
    pub page: PageRequest,
}

impl FilterSet for PlayerSummaryFilters {
    const FIELDS: &'static [&'static str] = &["playerId", "agentId", "platform", "game"];

    fn page_request(&self) -> &PageRequest {
        &self.page
    }

    fn page_request_mut(&mut self) -> &mut PageRequest {
        &mut self.page
    }

    fn date_range(&self) -> &DateRange {
        &self.dates
    }

    fn date_range_mut(&mut self) -> &mut DateRange {
        &mut self.dates
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "playerId" => self.player_id = normalize_text(value),
            "agentId" => self.agent_id = normalize_text(value),
            "platform" => self.platform = normalize_text(value),
            "game" => self.game = normalize_text(value),
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn push_fields(&self, params: &mut QueryParams) {
        params
            .push_text("playerId", self.player_id.as_deref())
            .push_text("agentId", self.agent_id.as_deref())
            .push_text("platform", self.platform.as_deref())
            .push_text("game", self.game.as_deref());
    }

    fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    fn agent_id_mut(&mut self) -> &mut Option<String> {
        &mut self.agent_id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentFilters {
    pub agent_id: Option<String>,
    pub platform: Option<String>,
    pub game: Option<String>,
    pub dates: DateRange,
    pub page: PageRequest,
}

impl FilterSet for AgentFilters {
    const FIELDS: &'static [&'static str] = &["agentId", "platform", "game"];

    fn page_request(&self) -> &PageRequest {
        &self.page
    }

    fn page_request_mut(&mut self) -> &mut PageRequest {
        &mut self.page
    }

    fn date_range(&self) -> &DateRange {
        &self.dates
    }

    fn date_range_mut(&mut self) -> &mut DateRange {
        &mut self.dates
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "agentId" => self.agent_id = normalize_text(value),
            "platform" => self.platform = normalize_text(value),
            "game" => self.game = normalize_text(value),
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn push_fields(&self, params: &mut QueryParams) {
        params
            .push_text("agentId", self.agent_id.as_deref())
            .push_text("platform", self.platform.as_deref())
            .push_text("game", self.game.as_deref());
    }

    fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    fn agent_id_mut(&mut self) -> &mut Option<String> {
        &mut self.agent_id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilters {
    pub agent_id: Option<String>,
    pub currency: Option<String>,
    pub search: Option<String>,
    pub created: DateRange,
    pub page: PageRequest,
}

impl FilterSet for UserFilters {
    const FROM_KEY: &'static str = "createdFrom";
    const TO_KEY: &'static str = "createdTo";
    const FIELDS: &'static [&'static str] = &["agentId", "currency", "search"];

    fn page_request(&self) -> &PageRequest {
        &self.page
    }

    fn page_request_mut(&mut self) -> &mut PageRequest {
        &mut self.page
    }

    fn date_range(&self) -> &DateRange {
        &self.created
    }

    fn date_range_mut(&mut self) -> &mut DateRange {
        &mut self.created
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "agentId" => self.agent_id = normalize_text(value),
            "currency" => self.currency = normalize_text(value),
            "search" => self.search = normalize_text(value),
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn push_fields(&self, params: &mut QueryParams) {
        params
            .push_text("agentId", self.agent_id.as_deref())
            .push_text("currency", self.currency.as_deref())
            .push_text("search", self.search.as_deref());
    }

    fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    fn agent_id_mut(&mut self) -> &mut Option<String> {
        &mut self.agent_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_default_pagination() {
        let filters = BetFilters::default();
        let params = filters.query_params();
        assert_eq!(params.get("page"), Some("1"));
        assert_eq!(params.get("limit"), Some("20"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_assign_enum_rejects_unknown_value() {
        let mut filters = BetFilters::default();
        filters.assign("status", "won", &utc()).unwrap();
        assert_eq!(filters.status, Some(BetStatus::Won));

        let err = filters.assign("status", "MAYBE", &utc()).unwrap_err();
        assert_eq!(err, ValidationError::invalid_value("status", "MAYBE"));
        assert_eq!(filters.status, Some(BetStatus::Won));

        filters.assign("status", "", &utc()).unwrap();
        assert_eq!(filters.status, None);
    }

    #[test]
    fn test_assign_dates_snaps_to_day_bounds() {
        let mut filters = PlayerSummaryFilters::default();
        filters.assign("fromDate", "2024-03-01", &utc()).unwrap();
        filters.assign("toDate", "2024-03-10", &utc()).unwrap();

        assert_eq!(
            filters.dates.from,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        let to = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 999)
            .unwrap()
            .and_utc();
        assert_eq!(filters.dates.to, Some(to));
    }

    #[test]
    fn test_user_filters_use_created_keys() {
        let mut filters = UserFilters::default();
        filters.assign("createdFrom", "2024-01-01", &utc()).unwrap();
        filters.assign("search", "  alice ", &utc()).unwrap();

        let params = filters.totals_params();
        assert_eq!(params.get("createdFrom"), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(params.get("search"), Some("alice"));
        assert!(!params.contains_key("fromDate"));
        assert!(filters.assign("fromDate", "2024-01-01", &utc()).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut filters = AgentFilters::default();
        assert_eq!(
            filters.assign("difficulty", "EASY", &utc()),
            Err(ValidationError::UnknownField("difficulty".to_string()))
        );
    }

    #[test]
    fn test_non_positive_pagination_rejected() {
        let mut filters = AgentFilters::default();
        assert!(filters.assign("page", "0", &utc()).is_err());
        assert!(filters.assign("limit", "-5", &utc()).is_err());
        assert!(filters.assign("limit", "ten", &utc()).is_err());
        filters.assign("limit", "50", &utc()).unwrap();
        assert_eq!(filters.page.limit, 50);
    }

    #[test]
    fn test_totals_params_have_no_pagination() {
        let mut filters = BetFilters::default();
        filters.assign("game", "ChickenRoad", &utc()).unwrap();
        let params = filters.totals_params();
        assert_eq!(params.len(), 1);
        assert!(!params.contains_key("page"));
    }
}
