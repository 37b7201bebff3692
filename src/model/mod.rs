pub mod api;
pub mod auth;
pub mod mongodb;
pub mod notifier;
pub mod otp;
pub mod store;
pub mod vote;
pub mod voter;
