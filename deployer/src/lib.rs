//! Aedify Deployer Library
//!
//! Port allocation, deployment orchestration and status polling against the
//! Coolify API, plus the HTTP surface that exposes them.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod ports;
pub mod remote;
pub mod server;
pub mod storage;
pub mod utils;
