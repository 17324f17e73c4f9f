//! # relay-channels
//!
//! Messaging platform integrations for Relay.

pub mod discord;
