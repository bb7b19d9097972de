//! Artist scoring: "Street Cred" (cumulative) and "Heat Check" (snapshot).

mod engine;
mod formulas;

pub use engine::{ScoreBreakdown, ScoringEngine};
pub use formulas::{certification_value, cumulative_score, project_value, snapshot_score};
