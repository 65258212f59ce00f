//! Routes, stops and arrival estimates

pub mod eta;
pub mod search;
pub mod types;

// Re-exports
pub use eta::{minutes_until, stop_etas, stop_labels, EtaLabel};
pub use search::{filter_routes, find_route};
pub use types::{Bound, EtaEntry, Route, RouteBoard, RouteStop, StopEta, StopInfo};
