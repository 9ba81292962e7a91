//! Core of the task bot: task storage, CSV export and configuration.
//!
//! This crate is framework-agnostic. Telegram lives behind the
//! [`messaging::port::MessagingPort`] trait implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod export;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod store;
pub mod task;

pub use errors::{Error, Result};
