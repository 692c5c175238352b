//! The four paginated list domains and their remote sources.

use crate::api_client::AdminApiClient;
use crate::dates::QuickRange;
use crate::dto::*;
use crate::error::Result;
use crate::filters::{AgentFilters, BetFilters, FilterSet, PlayerSummaryFilters, UserFilters};
use crate::query::QueryParams;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Binds a filter type, row type and totals type to an endpoint.
pub trait Domain: Debug + Clone + Send + Sync + 'static {
    type Filters: FilterSet;
    type Row: DeserializeOwned + Clone + Debug + Send + Sync + 'static;
    type Totals: DeserializeOwned + Clone + Debug + Send + Sync + 'static;

    const NAME: &'static str;
    const PATH: &'static str;
    /// Whether the endpoint has a `/totals` aggregate.
    const HAS_TOTALS: bool = true;

    /// Filters a view starts with before any seed or edit.
    fn default_filters(now: &DateTime<FixedOffset>) -> Self::Filters;
}

#[derive(Debug, Clone, Copy)]
pub struct Bets;

#[derive(Debug, Clone, Copy)]
pub struct Agents;

#[derive(Debug, Clone, Copy)]
pub struct Players;

#[derive(Debug, Clone, Copy)]
pub struct Users;

impl Domain for Bets {
    type Filters = BetFilters;
    type Row = Bet;
    type Totals = BetTotals;

    const NAME: &'static str = "bets";
    const PATH: &'static str = "/bets";

    fn default_filters(now: &DateTime<FixedOffset>) -> BetFilters {
        BetFilters {
            dates: QuickRange::ThisWeek.range(now),
            ..Default::default()
        }
    }
}

impl Domain for Agents {
    type Filters = AgentFilters;
    type Row = AgentSummary;
    type Totals = AgentTotals;

    const NAME: &'static str = "agents";
    const PATH: &'static str = "/agents";

    fn default_filters(now: &DateTime<FixedOffset>) -> AgentFilters {
        AgentFilters {
            dates: QuickRange::LastTwoMonths.range(now),
            ..Default::default()
        }
    }
}

impl Domain for Players {
    type Filters = PlayerSummaryFilters;
    type Row = PlayerSummary;
    type Totals = PlayerSummaryTotals;

    const NAME: &'static str = "player summary";
    const PATH: &'static str = "/player-summary";

    fn default_filters(now: &DateTime<FixedOffset>) -> PlayerSummaryFilters {
        PlayerSummaryFilters {
            dates: QuickRange::LastTwoMonths.range(now),
            ..Default::default()
        }
    }
}

impl Domain for Users {
    type Filters = UserFilters;
    type Row = User;
    type Totals = NoTotals;

    const NAME: &'static str = "users";
    const PATH: &'static str = "/users";
    const HAS_TOTALS: bool = false;

    fn default_filters(_now: &DateTime<FixedOffset>) -> UserFilters {
        UserFilters::default()
    }
}

/// Remote "list + totals" contract a domain store fetches from.
#[async_trait]
pub trait DomainSource<D: Domain>: Send + Sync {
    async fn list(&self, params: &QueryParams) -> Result<Page<D::Row>>;

    async fn totals(&self, params: &QueryParams) -> Result<D::Totals>;
}

#[async_trait]
impl<D: Domain> DomainSource<D> for AdminApiClient {
    async fn list(&self, params: &QueryParams) -> Result<Page<D::Row>> {
        self.list_page(D::PATH, params).await
    }

    async fn totals(&self, params: &QueryParams) -> Result<D::Totals> {
        self.list_totals(D::PATH, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, 10, 0, 0)
            .unwrap()
    }

    fn day(ts: Option<chrono::DateTime<chrono::Utc>>) -> NaiveDate {
        ts.unwrap().date_naive()
    }

    #[test]
    fn test_default_ranges() {
        let bets = Bets::default_filters(&now());
        assert_eq!(day(bets.dates.from), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(day(bets.dates.to), NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());

        let players = Players::default_filters(&now());
        assert_eq!(day(players.dates.from), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(day(players.dates.to), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());

        assert_eq!(Agents::default_filters(&now()).dates, players.dates);
        assert!(Users::default_filters(&now()).created.is_empty());
    }
}
