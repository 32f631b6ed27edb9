//! printhost-stats - health checks and yearly usage statistics for a
//! 3D-printer host
//!
//! - `health`: checks that inspect server state and classify it
//! - `achievements`: per-year counters persisted as `<year>.json`, with lazy
//!   year rollover and the one-time issue #5223 repair
//! - `access`, `settings`: narrow capabilities standing in for the host's
//!   user manager and settings store

pub mod access;
pub mod achievements;
pub mod config;
pub mod health;
pub mod logging;
pub mod settings;
pub mod util;
