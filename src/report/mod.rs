//! Terminal output. Everything here only reads engine and storage data.

pub mod bars;
pub mod leaderboard;
pub mod results;
pub mod user;
