//! Request and response models for the Aedify deployment API

pub mod models;
