//! AeroSense Core Library
//!
//! Change-detection and notification-dispatch pipeline for tracked flights:
//! poll the flight-data provider, diff against persisted state, recompute
//! connection risk, and deliver prioritized push notifications.

use shadow_rs::shadow;
shadow!(build);

pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod logger;
pub mod models;
pub mod poller;
pub mod queue;
pub mod repositories;
pub mod schema;
pub mod services;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}
