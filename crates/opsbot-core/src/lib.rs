//! Core domain + application logic for the ops monitoring bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / SSH / Postgres
//! live behind ports (traits) implemented in adapter code, so the dispatcher
//! and the conversation flows can be tested against fakes.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod remote;
pub mod session;
pub mod store;

pub use errors::{Error, Result};
