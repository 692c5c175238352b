pub mod agent;
pub mod auth;
pub mod bet;
pub mod common;
pub mod dashboard;
pub mod game_config;
pub mod player;
pub mod user;

pub use agent::*;
pub use auth::*;
pub use bet::*;
pub use common::*;
pub use dashboard::*;
pub use game_config::*;
pub use player::*;
pub use user::*;
