//! Configuration constants for busboard app services

/// Application metadata
pub mod app {
    /// Application name (used for config directory, etc.)
    pub const NAME: &str = "busboard";

    /// Favorites data file name
    pub const FAVORITES_FILE: &str = "favorites.json";

    /// Settings data file name
    pub const SETTINGS_FILE: &str = "settings.json";
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("busboard/", env!("CARGO_PKG_VERSION"));

    /// Connection timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Read timeout in seconds
    pub const READ_TIMEOUT_SECS: u64 = 20;
}

/// Provider-related configuration
pub mod providers {
    /// Identifier stored for the KMB provider
    pub const KMB_ID: &str = "kmb";
}

/// Controller configuration
pub mod controller {
    /// How long the controller blocks on its command channel per loop
    pub const TICK_MS: u64 = 100;

    /// Command channel capacity
    pub const COMMAND_CAPACITY: usize = 64;
}
