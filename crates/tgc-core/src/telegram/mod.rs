//! Chat backend ports and the in-memory implementation.

pub mod memory;
pub mod port;
