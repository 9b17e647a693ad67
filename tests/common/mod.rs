//! Common test infrastructure
//!
//! Fixture payloads shaped like the real API responses, plus helpers to open a
//! stats store in a temporary directory. Tests should only import from this
//! module, not from internal submodules.

mod constants;
mod fixtures;

pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{
    catalog_search_payload, open_store, recent_tracks_payload, scraped_scrobble_rows,
    top_tracks_payload, weather_archive_payload, TestStore,
};
