//! Localization
//!
//! Language preference and the static string table for each language.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BusError;
use crate::transit::Bound;

/// Display language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    En,
    /// Traditional Chinese
    #[default]
    Zh,
}

impl Language {
    /// String table for this language
    pub fn strings(&self) -> &'static Strings {
        match self {
            Language::En => &EN,
            Language::Zh => &ZH,
        }
    }

    /// The other language
    pub fn toggle(&self) -> Self {
        match self {
            Language::En => Language::Zh,
            Language::Zh => Language::En,
        }
    }

    /// Short code as persisted ("en" / "zh")
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "eng" | "english" => Ok(Language::En),
            "zh" | "tc" | "chinese" => Ok(Language::Zh),
            other => Err(BusError::Parse(format!("Unknown language '{other}'"))),
        }
    }
}

/// Static UI strings for one language
#[derive(Debug)]
pub struct Strings {
    pub title: &'static str,
    pub no_favorites: &'static str,
    pub outbound: &'static str,
    pub inbound: &'static str,
    pub close: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    pub stop: &'static str,
    pub eta: &'static str,
    pub no_eta: &'static str,
    pub no_stops_found: &'static str,
    pub close_map: &'static str,
    pub route_map: &'static str,
    pub arriving: &'static str,
    pub minutes: &'static str,
    pub your_location: &'static str,
    pub settings: &'static str,
    pub language: &'static str,
    pub search_placeholder: &'static str,
    pub no_routes_matching: &'static str,
    pub loading: &'static str,
}

impl Strings {
    /// Localized direction word
    pub fn bound_label(&self, bound: Bound) -> &'static str {
        match bound {
            Bound::Outbound => self.outbound,
            Bound::Inbound => self.inbound,
        }
    }
}

static EN: Strings = Strings {
    title: "Favorite Routes",
    no_favorites: "No favorites added.",
    outbound: "Outbound",
    inbound: "Inbound",
    close: "Close",
    from: "From",
    to: "To",
    stop: "Stop",
    eta: "ETA",
    no_eta: "No ETA available",
    no_stops_found: "No stops found for route",
    close_map: "Close Map",
    route_map: "Route Map",
    arriving: "Arriving soon",
    minutes: "mins",
    your_location: "Your location",
    settings: "Settings",
    language: "Language",
    search_placeholder: "Search routes or bus stops...",
    no_routes_matching: "No routes found matching",
    loading: "Loading...",
};

static ZH: Strings = Strings {
    title: "收藏路線",
    no_favorites: "未有收藏路線",
    outbound: "往",
    inbound: "往",
    close: "關閉",
    from: "由",
    to: "往",
    stop: "站",
    eta: "預計到站時間",
    no_eta: "暫無到站資訊",
    no_stops_found: "未能找到路線站點",
    close_map: "關閉地圖",
    route_map: "路線地圖",
    arriving: "即將到達",
    minutes: "分鐘",
    your_location: "你的位置",
    settings: "設定",
    language: "語言",
    search_placeholder: "搜尋路線或巴士站...",
    no_routes_matching: "找不到符合的路線",
    loading: "載入中...",
};
