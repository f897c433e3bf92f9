//! Core domain + application logic for the number-queue bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and SQLite live
//! behind ports (traits) implemented in adapter crates.

pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod policy;
pub mod ports;
pub mod settings;
pub mod users;

pub use errors::{Error, Result};
