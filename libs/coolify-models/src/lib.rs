//! Wire models for the Coolify v1 API

pub mod models;
