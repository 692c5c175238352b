#![allow(dead_code)]

use async_trait::async_trait;
use chicken_road_admin::dates::FixedClock;
use chicken_road_admin::domains::{Domain, DomainSource};
use chicken_road_admin::dto::*;
use chicken_road_admin::error::{ConsoleError, Result};
use chicken_road_admin::query::QueryParams;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub enum Reply<T> {
    Now(Result<T>),
    /// Resolves when the test sends on the paired channel.
    Gated(oneshot::Receiver<Result<T>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T> {
        match self {
            Reply::Now(result) => result,
            Reply::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ConsoleError::Transport("gate dropped".into()))),
        }
    }
}

/// In-memory list + totals source with scripted replies.
///
/// When a queue runs dry the source answers with an empty page echoing the
/// requested pagination and default totals.
pub struct ScriptedSource<D: Domain> {
    lists: Mutex<VecDeque<Reply<Page<D::Row>>>>,
    totals: Mutex<VecDeque<Reply<D::Totals>>>,
    list_calls: Mutex<Vec<QueryParams>>,
    totals_calls: Mutex<Vec<QueryParams>>,
}

impl<D: Domain> ScriptedSource<D> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            lists: Mutex::new(VecDeque::new()),
            totals: Mutex::new(VecDeque::new()),
            list_calls: Mutex::new(Vec::new()),
            totals_calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push_list(&self, reply: Reply<Page<D::Row>>) {
        self.lists.lock().unwrap().push_back(reply);
    }

    pub fn push_totals(&self, reply: Reply<D::Totals>) {
        self.totals.lock().unwrap().push_back(reply);
    }

    pub fn list_ok(&self, page: Page<D::Row>) {
        self.push_list(Reply::Now(Ok(page)));
    }

    pub fn list_err(&self, err: ConsoleError) {
        self.push_list(Reply::Now(Err(err)));
    }

    pub fn totals_ok(&self, totals: D::Totals) {
        self.push_totals(Reply::Now(Ok(totals)));
    }

    pub fn totals_err(&self, err: ConsoleError) {
        self.push_totals(Reply::Now(Err(err)));
    }

    pub fn list_calls(&self) -> Vec<QueryParams> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn totals_calls(&self) -> Vec<QueryParams> {
        self.totals_calls.lock().unwrap().clone()
    }

    pub fn last_list_call(&self) -> QueryParams {
        self.list_calls().last().cloned().expect("no list call recorded")
    }
}

#[async_trait]
impl<D: Domain> DomainSource<D> for ScriptedSource<D>
where
    D::Totals: Default,
{
    async fn list(&self, params: &QueryParams) -> Result<Page<D::Row>> {
        self.list_calls.lock().unwrap().push(params.clone());
        let reply = self.lists.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => {
                let number = |key: &str, default: u32| {
                    params
                        .get(key)
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(default)
                };
                Ok(Page {
                    rows: Vec::new(),
                    pagination: Pagination {
                        page: number("page", 1),
                        limit: number("limit", 20),
                        total: 0,
                        total_pages: 0,
                    },
                })
            }
        }
    }

    async fn totals(&self, params: &QueryParams) -> Result<D::Totals> {
        self.totals_calls.lock().unwrap().push(params.clone());
        let reply = self.totals.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(D::Totals::default()),
        }
    }
}

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}

/// Friday 2024-03-15 14:30 in India Standard Time.
pub fn now() -> DateTime<FixedOffset> {
    ist().with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap()
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(now()))
}

pub fn page_of<T>(rows: Vec<T>, page: u32, limit: u32, total: u64) -> Page<T> {
    Page {
        rows,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: Pagination::expected_total_pages(total, limit),
        },
    }
}

pub fn bet(id: &str, agent_id: &str) -> Bet {
    Bet {
        id: id.to_string(),
        external_platform_tx_id: None,
        user_id: "player1".to_string(),
        agent_id: agent_id.to_string(),
        operator_id: None,
        round_id: Some(format!("round-{id}")),
        platform: Some("SPADE".to_string()),
        game: Some("ChickenRoad".to_string()),
        difficulty: Difficulty::Medium,
        bet_amount: Decimal::new(10000, 2),
        win_amount: Some(Decimal::new(25000, 2)),
        currency: "INR".to_string(),
        status: BetStatus::Won,
        bet_placed_at: Utc.with_ymd_and_hms(2024, 3, 12, 9, 0, 0).unwrap(),
        settled_at: Some(Utc.with_ymd_and_hms(2024, 3, 12, 9, 1, 0).unwrap()),
    }
}

pub fn bets(count: usize) -> Vec<Bet> {
    (1..=count)
        .map(|n| bet(&format!("b{n}"), "agent007"))
        .collect()
}

pub fn bet_totals(total_bets: u64) -> BetTotals {
    BetTotals {
        total_bets,
        total_bet_amount: Decimal::new(total_bets as i64 * 10000, 2),
        total_win_amount: Decimal::new(total_bets as i64 * 8000, 2),
        net_revenue: Decimal::new(total_bets as i64 * 2000, 2),
    }
}

pub fn transport_error() -> ConsoleError {
    ConsoleError::Transport("connection reset by peer".into())
}
