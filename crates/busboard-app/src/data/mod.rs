//! Data persistence
//!
//! Handles favorites and settings.

pub mod favorites;
pub mod settings;
pub mod storage;

// Re-export common types
pub use favorites::{FavoriteRoute, FavoritesManager};
pub use settings::{Settings, Theme};
pub use storage::{config_dir, data_path, load, save};
