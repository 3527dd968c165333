//! NHL schedule sync and date-range standings.
//!
//! Completed games are pulled day by day from the NHL web API into Postgres,
//! and standings are folded from stored games for any date range, with
//! relocated franchises labelled by the names they used during that range.

pub mod api;
pub mod config;
pub mod health;
pub mod identity;
pub mod models;
pub mod nhl;
pub mod season;
pub mod standings;
pub mod store;
pub mod sync;

pub use config::Config;
pub use season::Season;
