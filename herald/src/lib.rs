//! herald watches monitored chats for messages matching keyword rules and
//! relays every match, at least once, to each destination the matching
//! rules name.
//!
//! - [`config`]: the RON configuration file
//! - [`ingest`]: matching inbound messages and enqueueing records
//! - [`controller`]: wiring, signal handling and rule reloads

pub mod config;
pub mod controller;
pub mod ingest;
