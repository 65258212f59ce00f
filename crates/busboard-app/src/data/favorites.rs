//! Favorites management
//!
//! Favorite routes are (route number, direction) pairs kept in the order the
//! user added them. The file is a plain JSON array of
//! `{"routeId": "...", "bound": "O"}` objects.

use crate::config::app::FAVORITES_FILE;
use crate::data::storage;
use crate::error::{AppError, Result};
use busboard::transit::{Bound, Route};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A favorited route direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteRoute {
    #[serde(rename = "routeId")]
    pub route_id: String,
    pub bound: Bound,
}

impl FavoriteRoute {
    pub fn new(route_id: impl Into<String>, bound: Bound) -> Self {
        Self {
            route_id: route_id.into(),
            bound,
        }
    }

    /// Whether this favorite refers to `route`
    pub fn matches(&self, route: &Route) -> bool {
        route.matches(&self.route_id, self.bound)
    }
}

impl From<&Route> for FavoriteRoute {
    fn from(route: &Route) -> Self {
        Self::new(route.route.clone(), route.bound)
    }
}

/// Manages favorites in memory
#[derive(Debug, Default)]
pub struct FavoritesManager {
    favorites: Vec<FavoriteRoute>,
    /// Whether there are unsaved changes
    dirty: bool,
}

impl FavoritesManager {
    /// Create a new empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Load favorites from default storage location
    pub fn load() -> Result<Self> {
        let path = storage::data_path(FAVORITES_FILE)?;
        Self::load_from(&path)
    }

    /// Load favorites from a specific path
    ///
    /// Duplicate entries in the file are collapsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut manager = Self::new();

        if let Some(list) = storage::load_from::<Vec<FavoriteRoute>>(path)? {
            for favorite in list {
                if !manager.favorites.contains(&favorite) {
                    manager.favorites.push(favorite);
                }
            }
        }

        log::debug!("Loaded {} favorites from {:?}", manager.count(), path);
        Ok(manager)
    }

    /// Save favorites to default storage location
    pub fn save(&mut self) -> Result<()> {
        let path = storage::data_path(FAVORITES_FILE)?;
        self.save_to(&path)
    }

    /// Save favorites to a specific path; no-op without changes
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        storage::save_to(path, &self.favorites)?;
        self.dirty = false;
        Ok(())
    }

    /// Force save to default location (ignore dirty flag)
    pub fn force_save(&mut self) -> Result<()> {
        self.dirty = true;
        self.save()
    }

    /// Force save to a specific path (ignore dirty flag)
    pub fn force_save_to(&mut self, path: &Path) -> Result<()> {
        self.dirty = true;
        self.save_to(path)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Add a favorite; errors if already present
    pub fn add(&mut self, favorite: FavoriteRoute) -> Result<()> {
        if self.favorites.contains(&favorite) {
            return Err(AppError::Config(format!(
                "Route {} ({}) is already a favorite",
                favorite.route_id, favorite.bound
            )));
        }

        self.favorites.push(favorite);
        self.dirty = true;
        Ok(())
    }

    /// Remove a favorite; errors if absent
    pub fn remove(&mut self, route_id: &str, bound: Bound) -> Result<FavoriteRoute> {
        let pos = self
            .position(route_id, bound)
            .ok_or_else(|| AppError::NotFound(format!("Favorite {route_id} ({bound})")))?;

        self.dirty = true;
        Ok(self.favorites.remove(pos))
    }

    /// Flip membership of a route direction
    ///
    /// Returns `true` if it is a favorite afterwards.
    pub fn toggle(&mut self, route_id: &str, bound: Bound) -> bool {
        self.dirty = true;
        match self.position(route_id, bound) {
            Some(pos) => {
                self.favorites.remove(pos);
                false
            }
            None => {
                self.favorites.push(FavoriteRoute::new(route_id, bound));
                true
            }
        }
    }

    pub fn is_favorite(&self, route_id: &str, bound: Bound) -> bool {
        self.position(route_id, bound).is_some()
    }

    /// All favorites in insertion order
    pub fn all(&self) -> &[FavoriteRoute] {
        &self.favorites
    }

    pub fn count(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    /// Merge favorites from another list
    ///
    /// Returns `(added, skipped)` counts.
    pub fn import(&mut self, favorites: Vec<FavoriteRoute>) -> (usize, usize) {
        let mut added = 0;
        let mut skipped = 0;

        for favorite in favorites {
            if self.favorites.contains(&favorite) {
                skipped += 1;
            } else {
                self.favorites.push(favorite);
                added += 1;
            }
        }

        if added > 0 {
            self.dirty = true;
        }
        (added, skipped)
    }

    /// Map favorites onto full routes, in favorite order
    ///
    /// A route listed under several service types resolves to the first one.
    /// Favorites with no matching route are left out.
    pub fn resolve<'a>(&self, routes: &'a [Route]) -> Vec<&'a Route> {
        self.favorites
            .iter()
            .filter_map(|fav| routes.iter().find(|r| fav.matches(r)))
            .collect()
    }

    fn position(&self, route_id: &str, bound: Bound) -> Option<usize> {
        self.favorites
            .iter()
            .position(|f| f.route_id == route_id && f.bound == bound)
    }
}
