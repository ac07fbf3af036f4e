//! Coolify HTTP access

pub mod client;
pub mod coolify;
