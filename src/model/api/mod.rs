//! Request and response bodies of the HTTP API.
//!
//! Field names are camelCase on the wire.

pub mod auth;
pub mod email;
pub mod sms;
pub mod vote;
