//! Upstream sports-data provider
//!
//! - `types`: typed records for every payload shape the pipeline consumes
//! - `http`: the HTTP client that fetches and decodes them

pub mod http;
pub mod types;

pub use http::SportsDataClient;
pub use types::{GameStatRecord, PlayerRecord, SeasonStatRecord, TeamRecord, Timeframe};
