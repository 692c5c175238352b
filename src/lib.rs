//! # chicken-road-admin
//!
//! Client core of the Chicken Road admin console: a typed API client for the
//! admin backend, filter sets that map to a canonical query contract, and
//! per-domain stores that fetch a page of rows together with totals over the
//! whole filtered set.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chicken_road_admin::{AdminConsole, Config, QuickRange};
//! use chicken_road_admin::reconcile::ExternalSeed;
//!
//! # async fn example() -> anyhow::Result<()> {
//! // Load configuration from config.toml
//! let config = Config::new()?;
//! let console = AdminConsole::new(config.console)?;
//! console.login_from_config().await?;
//!
//! // Open the bets view with an agent from a deep link
//! let mut bets = console.bets_view()?;
//! bets.seed_from_external(ExternalSeed::new().with("agentId", "agent007")).await?;
//!
//! // Narrow it down and apply
//! bets.set_draft_field("status", "WON")?;
//! bets.apply_quick_range(QuickRange::ThisMonth).await?;
//!
//! let state = console.bets().snapshot();
//! println!("{} bets, totals {:?}", state.pagination.total, state.totals);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Query contract**: empty fields are omitted, dates are emitted as UTC
//!   ISO-8601 with milliseconds
//! - **Draft/applied filters**: edits stay local until committed
//! - **Totals**: fetched concurrently from a dedicated aggregate endpoint
//! - **Last request wins**: stale responses never overwrite newer ones
//! - **Retry Logic**: reads retry with exponential backoff on transient failures
//!
//! ## Configuration
//!
//! Create a `config.toml` file:
//!
//! ```toml
//! [console]
//! base_url = "https://admin.example.com"
//! username = "ops"
//! password = "your_password"
//! ```
//!
//! `CRC_BASE_URL`, `CRC_USERNAME` and `CRC_PASSWORD` override the file.

pub mod api_client;
pub mod auth;
pub mod config;
pub mod console;
pub mod dates;
pub mod domains;
pub mod dto;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod format;
pub mod query;
pub mod reconcile;
pub mod retry;
pub mod store;

// Re-export commonly used types at the crate root
pub use api_client::AdminApiClient;
pub use config::Config;
pub use console::AdminConsole;
pub use dates::QuickRange;
pub use dto::*;
pub use error::{ConsoleError, ValidationError};
pub use filters::FilterSet;
