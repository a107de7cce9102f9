//! Wardline — treatment plan timelines for hospital wards.
//!
//! The core is the treatment plan aggregate (`models` + `timeline`):
//! recurring reviews, investigations, procedures, medication courses and
//! a single discharge target on one timeline, with completion, delay and
//! overdue semantics computed from an injected clock. Persistence is
//! offline-first: a local SQLite replica (`db`) mirrors a remote
//! authoritative store (`remote`), and the sync coordinator (`sync`)
//! reconciles the two whenever connectivity allows.

pub mod clock;
pub mod config;
pub mod db;
pub mod delay;
pub mod models;
pub mod overdue;
pub mod recurrence;
pub mod remote;
pub mod service;
pub mod sync;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testutil;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Call once at startup; the
/// filter honours RUST_LOG and falls back to the app default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
