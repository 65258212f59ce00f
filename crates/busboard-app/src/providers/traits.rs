//! Transit provider trait
//!
//! Defines the interface a bus operator's open-data API must implement.

use crate::error::Result;
use busboard::transit::{EtaEntry, Route, RouteStop, StopInfo};

/// A source of routes, stops and arrival predictions
///
/// All calls block; callers that must stay responsive run them on a
/// worker thread.
pub trait TransitProvider: Send + Sync {
    /// Display name for the provider (e.g., "KMB")
    fn name(&self) -> &'static str;

    /// Machine-readable identifier (e.g., "kmb")
    fn id(&self) -> &'static str;

    /// Every route variant the operator runs
    fn fetch_routes(&self) -> Result<Vec<Route>>;

    /// Ordered stop sequence of a route, by ascending `seq`
    fn fetch_route_stops(&self, route: &Route) -> Result<Vec<RouteStop>>;

    /// Metadata for a single stop
    fn fetch_stop(&self, stop_id: &str) -> Result<StopInfo>;

    /// Raw predictions for a route at a stop
    ///
    /// May include entries for other stop positions or directions; callers
    /// filter with [`busboard::transit::stop_etas`].
    fn fetch_etas(&self, stop_id: &str, route: &Route) -> Result<Vec<EtaEntry>>;
}
