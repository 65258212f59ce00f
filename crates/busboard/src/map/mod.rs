//! Route map
//!
//! Leaflet document generation and the JSON message channel between the
//! host and the document.

pub mod document;
pub mod message;
pub mod view;

// Re-exports
pub use document::MapDocument;
pub use message::MapMessage;
pub use view::MapView;
