//! Transit data providers
//!
//! The [`TransitProvider`] trait and its KMB implementation.

pub mod kmb;
pub mod traits;

pub use kmb::KmbProvider;
pub use traits::TransitProvider;

use crate::error::Result;

/// Build the default provider, optionally pointed at another base URL
pub fn default_provider(base_url: Option<&str>) -> Result<KmbProvider> {
    match base_url {
        Some(url) => KmbProvider::with_base_url(url),
        None => KmbProvider::new(),
    }
}
