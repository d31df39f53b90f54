//!  Storage is split in two files inside the data directory:
//!   - `activity_log.csv`: append-only log of finished sessions, one row per session.
//!   - `focus_scores.json`: cache of daily scores, rewritten in full on every update.

pub mod activity_log;
pub mod csv;
pub mod entities;
pub mod score_store;
