//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Gateway calls happen here, never inside a unit of work.

pub mod handlers;

pub use handlers::*;
