//! Configuration constants for the busboard core

/// Transit API configuration
pub mod api {
    /// KMB open data API root
    pub const KMB_BASE_URL: &str = "https://data.etabus.gov.hk/v1/transport/kmb";

    /// Service type used when none is given (normal service)
    pub const DEFAULT_SERVICE_TYPE: &str = "1";
}

/// ETA polling configuration
pub mod poll {
    /// Default refresh interval while a route is open, in seconds
    pub const DEFAULT_INTERVAL_SECS: u64 = 20;

    /// Lower bound for the refresh interval
    pub const MIN_INTERVAL_SECS: u64 = 20;

    /// Upper bound for the refresh interval
    pub const MAX_INTERVAL_SECS: u64 = 60;

    /// Clamp a requested interval into the supported range
    pub fn clamp_interval(secs: u64) -> u64 {
        secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
    }
}

/// Map document configuration
pub mod map {
    /// Leaflet release loaded by the generated document
    pub const LEAFLET_VERSION: &str = "1.9.4";

    /// Tile layer URL template (CARTO light)
    pub const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";

    /// Tile attribution HTML
    pub const TILE_ATTRIBUTION: &str = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";

    /// Maximum tile zoom
    pub const MAX_ZOOM: u8 = 19;

    /// Zoom used when centering on the first stop
    pub const OVERVIEW_ZOOM: u8 = 15;

    /// Zoom used when centering on a selected stop
    pub const STOP_ZOOM: u8 = 16;

    /// Delay before the map initializes after DOMContentLoaded (milliseconds)
    pub const INIT_DELAY_MS: u32 = 100;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_interval() {
        assert_eq!(poll::clamp_interval(5), 20);
        assert_eq!(poll::clamp_interval(30), 30);
        assert_eq!(poll::clamp_interval(600), 60);
    }

    #[test]
    fn test_default_interval_in_range() {
        assert_eq!(
            poll::clamp_interval(poll::DEFAULT_INTERVAL_SECS),
            poll::DEFAULT_INTERVAL_SECS
        );
    }
}
