//! Core engine for the comment placement service.
//!
//! This crate is backend-agnostic. The chat client and the directory store
//! live behind ports (traits) so the engine can run against the in-memory
//! backend as well as a real deployment adapter.

pub mod config;
pub mod dedup;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod poster;
pub mod selector;
pub mod service;
pub mod store;
pub mod sync;
pub mod telegram;

pub use errors::{Error, Result};
