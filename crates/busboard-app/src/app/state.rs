//! Shared board state and commands
//!
//! `BoardCommand` is the command type sent by any frontend.
//! `BoardSnapshot` is the shared state the frontend reads to draw.

use std::time::Duration;

use chrono::{DateTime, Local};

use busboard::config::poll::DEFAULT_INTERVAL_SECS;
use busboard::i18n::Language;
use busboard::map::{MapMessage, MapView};
use busboard::transit::{Route, RouteBoard, StopEta};

/// Commands sent to the board controller
#[derive(Debug)]
pub enum BoardCommand {
    /// Show a route and start polling it
    Open(Route),
    /// Stop polling and clear the board
    Close,
    /// Poll now instead of waiting for the timer
    Refresh,
    SetInterval(Duration),
    SetLanguage(Language),
    SelectStop(Option<usize>),
    Shutdown,

    // Internal: sent by the fetch worker (not by frontends)
    BoardFetched {
        generation: u64,
        result: Result<RouteBoard, String>,
    },
    StopFetched {
        generation: u64,
        index: usize,
        stop: StopEta,
    },
}

/// Snapshot of board state, shared between the controller and the frontend
#[derive(Clone, Debug)]
pub struct BoardSnapshot {
    pub route: Option<Route>,
    pub stops: Vec<StopEta>,
    pub selected: Option<usize>,
    pub language: Language,
    pub interval: Duration,
    /// True while a poll is in flight
    pub is_loading: bool,
    /// Last fetch error; cleared by the next successful poll
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
    /// Completed polls since the route was opened
    pub poll_count: u64,
    /// Stops left out of the last poll
    pub failed_stops: usize,
    /// Bumped whenever stops are added to or removed from the board
    ///
    /// Map messages address stops by index, so a live map document must be
    /// regenerated when this changes.
    pub layout_version: u64,
    pub(crate) map_messages: Vec<MapMessage>,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            route: None,
            stops: Vec::new(),
            selected: None,
            language: Language::default(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            is_loading: false,
            last_error: None,
            last_updated: None,
            poll_count: 0,
            failed_stops: 0,
            layout_version: 0,
            map_messages: Vec::new(),
        }
    }
}

impl BoardSnapshot {
    pub fn selected_stop(&self) -> Option<&StopEta> {
        self.selected.and_then(|i| self.stops.get(i))
    }

    /// Queue a message for the map document
    pub fn push_map_message(&mut self, message: MapMessage) {
        self.map_messages.push(message);
    }

    /// Take the map messages queued since the last drain
    pub fn drain_map_messages(&mut self) -> Vec<MapMessage> {
        std::mem::take(&mut self.map_messages)
    }

    /// Clear everything tied to the open route
    pub(crate) fn clear_board(&mut self) {
        if !self.stops.is_empty() {
            self.layout_version += 1;
        }
        self.route = None;
        self.stops.clear();
        self.selected = None;
        self.is_loading = false;
        self.last_error = None;
        self.last_updated = None;
        self.poll_count = 0;
        self.failed_stops = 0;
        self.map_messages.clear();
    }

    /// Map session for the current board
    pub fn map_view(&self) -> MapView {
        let title = self
            .route
            .as_ref()
            .map(|r| {
                format!(
                    "{} {} {}",
                    r.route,
                    self.language.strings().to,
                    r.destination(self.language)
                )
            })
            .unwrap_or_default();

        let mut view = MapView::new(self.stops.clone(), self.language).with_title(title);
        if let Some(index) = self.selected {
            view.select(index);
        }
        view
    }
}
