//! Busboard: bus arrival core
//!
//! Route and stop types, ETA computation, route search, localized string
//! tables and the Leaflet map document.
//!
//! ## Quick start
//!
//! ```no_run
//! use busboard::transit::{filter_routes, EtaLabel};
//! use busboard::map::MapDocument;
//! ```

pub mod config;
pub mod error;
pub mod i18n;
pub mod map;
pub mod transit;
