//! # relay-core
//!
//! Core types, traits, configuration, and error handling for Relay.

pub mod assistant;
pub mod config;
pub mod error;
pub mod mention;
pub mod message;
pub mod traits;

pub use config::shellexpand;
