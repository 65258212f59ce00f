//! Host-side map session
//!
//! Tracks the stops shown on the map and the selected stop, answers
//! messages coming from the document and produces messages going to it.

use crate::error::Result;
use crate::i18n::Language;
use crate::transit::StopEta;

use super::document::MapDocument;
use super::message::MapMessage;

/// State of an open route map
#[derive(Debug, Clone, Default)]
pub struct MapView {
    stops: Vec<StopEta>,
    selected: Option<usize>,
    language: Language,
    title: String,
}

impl MapView {
    pub fn new(stops: Vec<StopEta>, language: Language) -> Self {
        Self {
            stops,
            selected: None,
            language,
            title: String::new(),
        }
    }

    /// Set the page title used by [`MapView::document`]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn stops(&self) -> &[StopEta] {
        &self.stops
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Replace the stop list, dropping a selection that no longer exists
    pub fn set_stops(&mut self, stops: Vec<StopEta>) {
        self.stops = stops;
        if self.selected.is_some_and(|i| i >= self.stops.len()) {
            self.selected = None;
        }
    }

    /// Select a stop; returns the message that pans the map to it
    pub fn select(&mut self, index: usize) -> Option<MapMessage> {
        if index >= self.stops.len() {
            return None;
        }
        self.selected = Some(index);
        Some(MapMessage::CenterStop { index })
    }

    /// Record fresh ETAs for a stop; returns the popup update message
    pub fn update_eta(&mut self, index: usize, eta: Vec<String>) -> Option<MapMessage> {
        let stop = self.stops.get_mut(index)?;
        stop.eta = eta.clone();
        Some(MapMessage::UpdateEta { index, eta })
    }

    /// Handle a raw message posted by the document
    ///
    /// Returns the reply to post back, if any.
    pub fn handle_incoming(&mut self, json: &str) -> Result<Option<MapMessage>> {
        let message = MapMessage::parse(json)?;
        Ok(self.handle_message(message))
    }

    /// Handle a parsed message from the document
    pub fn handle_message(&mut self, message: MapMessage) -> Option<MapMessage> {
        match message {
            MapMessage::StopSelected { index } => {
                let reply = self.select(index);
                if reply.is_none() {
                    log::debug!("Ignoring selection of stop {index} (have {})", self.stops.len());
                }
                reply
            }
            MapMessage::Error { message } => {
                log::error!("Map document error: {message}");
                None
            }
            other => {
                log::debug!("Ignoring host-bound message from map document: {other:?}");
                None
            }
        }
    }

    /// Regenerate the map page from the current state
    pub fn document(&self) -> Result<String> {
        MapDocument::new(&self.stops)
            .selected(self.selected)
            .language(self.language)
            .title(self.title.clone())
            .render()
    }
}
