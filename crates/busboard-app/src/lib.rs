//! Busboard App Services
//!
//! Transit providers, ETA polling, favorites and settings persistence.
//! Depends on the `busboard` core crate.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod network;
pub mod providers;
