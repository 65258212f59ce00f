//! Transit domain types
//!
//! Routes, stops and arrival predictions as used throughout busboard.
//! Provider-specific wire formats convert into these.

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BusError;
use crate::i18n::Language;

// =============================================================================
// Bound
// =============================================================================

/// Direction of travel along a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound {
    #[serde(rename = "O")]
    Outbound,
    #[serde(rename = "I")]
    Inbound,
}

impl Bound {
    /// Single-letter API code ("O" / "I")
    pub fn code(&self) -> &'static str {
        match self {
            Bound::Outbound => "O",
            Bound::Inbound => "I",
        }
    }

    /// URL path segment ("outbound" / "inbound")
    pub fn path_segment(&self) -> &'static str {
        match self {
            Bound::Outbound => "outbound",
            Bound::Inbound => "inbound",
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Bound {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "o" | "outbound" => Ok(Bound::Outbound),
            "i" | "inbound" => Ok(Bound::Inbound),
            _ => Err(BusError::InvalidBound(s.to_string())),
        }
    }
}

// =============================================================================
// Route
// =============================================================================

/// A bus route variant in one direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route number, e.g. "1A"
    pub route: String,
    pub bound: Bound,
    /// Service variant, "1" for the normal service
    pub service_type: String,
    pub orig_en: String,
    pub orig_tc: String,
    pub dest_en: String,
    pub dest_tc: String,
}

impl Route {
    /// Create a route with empty place names
    pub fn new(route: impl Into<String>, bound: Bound, service_type: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            bound,
            service_type: service_type.into(),
            orig_en: String::new(),
            orig_tc: String::new(),
            dest_en: String::new(),
            dest_tc: String::new(),
        }
    }

    /// Set origin names
    pub fn with_origin(mut self, en: impl Into<String>, tc: impl Into<String>) -> Self {
        self.orig_en = en.into();
        self.orig_tc = tc.into();
        self
    }

    /// Set destination names
    pub fn with_destination(mut self, en: impl Into<String>, tc: impl Into<String>) -> Self {
        self.dest_en = en.into();
        self.dest_tc = tc.into();
        self
    }

    /// Origin name in the given language
    pub fn origin(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.orig_en,
            Language::Zh => &self.orig_tc,
        }
    }

    /// Destination name in the given language
    pub fn destination(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.dest_en,
            Language::Zh => &self.dest_tc,
        }
    }

    /// Unique key across route, bound and service type
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.route, self.bound, self.service_type)
    }

    /// Whether this route is the given (route id, bound) pair
    pub fn matches(&self, route_id: &str, bound: Bound) -> bool {
        self.route == route_id && self.bound == bound
    }
}

// =============================================================================
// Stops
// =============================================================================

/// One entry of a route's ordered stop sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStop {
    /// Stop identifier
    pub stop: String,
    /// 1-based position along the route
    pub seq: u32,
    pub bound: Bound,
    pub service_type: String,
}

/// Stop metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopInfo {
    pub stop: String,
    pub name_en: String,
    pub name_tc: String,
    pub lat: f64,
    pub long: f64,
}

impl StopInfo {
    /// Stop name in the given language
    pub fn name(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.name_en,
            Language::Zh => &self.name_tc,
        }
    }
}

/// A single arrival prediction for a stop
#[derive(Debug, Clone, PartialEq)]
pub struct EtaEntry {
    /// Stop position this prediction applies to
    pub seq: u32,
    /// Direction of the predicted trip
    pub bound: Bound,
    /// Rank of this prediction (1 = next bus)
    pub eta_seq: u32,
    /// Predicted arrival; `None` when the operator has no estimate
    pub eta: Option<DateTime<FixedOffset>>,
    pub dest_en: String,
    pub dest_tc: String,
    pub rmk_en: String,
    pub rmk_tc: String,
}

/// A stop with the arrival strings of the current poll cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopEta {
    pub info: StopInfo,
    /// 1-based position along the route
    pub seq: u32,
    /// Rendered ETA strings, soonest first
    pub eta: Vec<String>,
}

/// A route with all of its stops and their current ETAs
#[derive(Debug, Clone, PartialEq)]
pub struct RouteBoard {
    pub route: Route,
    pub stops: Vec<StopEta>,
    /// When the board was fetched
    pub fetched_at: DateTime<Local>,
    /// Number of stops that could not be loaded this cycle
    pub failed: usize,
}

impl RouteBoard {
    /// Whether the board has no stops to show
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
