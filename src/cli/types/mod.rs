//! Type-safe wrappers for provider identifiers and sports.

pub mod ids;
pub mod sport;

pub use ids::{AthleteApiId, TeamApiId};
pub use sport::Sport;
