//! Board controller, fetching, and shared state

pub mod controller;
pub mod fetcher;
pub mod state;

#[cfg(test)]
mod mock;

pub use controller::{BoardController, BoardHandle};
pub use fetcher::fetch_board;
pub use state::{BoardCommand, BoardSnapshot};
