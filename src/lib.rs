//! Aniview - Anime catalog aggregation core
//!
//! This library crate exposes the caching-and-refresh subsystem: a TTL keyed
//! store plus a background updater that polls catalog resources per key and
//! fans out change notifications to registered observers.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod provider;
pub mod types;
pub mod updater;

pub use error::{Error, Result};
