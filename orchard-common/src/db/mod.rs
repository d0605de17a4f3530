//! Observation store (SQLite)

pub mod init;
pub mod observations;

pub use init::*;
pub use observations::*;
