//! Shared constants for end-to-end tests

#![allow(dead_code)]

// ============================================================================
// Subjects and places
// ============================================================================

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const PERIOD_7DAY: &str = "7day";
pub const PLACE: &str = "Ann Arbor";

// ============================================================================
// Listening data in the fixtures
// ============================================================================

pub const ARTIST_A: &str = "Artist A";
pub const ARTIST_B: &str = "Artist B";
pub const TRACK_1: &str = "Track 1";
pub const TRACK_2: &str = "Track 2";
pub const TRACK_3: &str = "Track 3";

/// Distinct (track, artist) pairs in `top_tracks_payload`.
pub const TOP_TRACKS_IN_PAYLOAD: usize = 3;

/// Days in `weather_archive_payload`.
pub const WEATHER_DAYS: usize = 4;
