//! HTTP surface of the comment placement service.

pub mod handlers;
pub mod server;

pub use server::{build_router, serve, AppState};
