//! Extractors for the scrobbling service: the top tracks API and the recent
//! scrobbles (API `recenttracks` or rows scraped from the library page).

use super::extractor::{
    integer_field, required_text, text_field, MalformedRecord, RecordExtractor, SourceRecord,
};
use crate::stats_store::TrackRef;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

/// Scrobble times are stored in UTC at minute precision, the resolution of
/// the text forms, so a listen keys the same whichever shape it came in.
pub const SCROBBLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const TEXT_TIME_FORMATS: [&str; 6] = [
    "%d %b %Y, %H:%M",
    "%A %d %b %Y, %I:%M%p",
    "%d %b %Y, %I:%M%p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// The artist shows up as a plain string, `{"name": ..}` or `{"#text": ..}`
/// depending on the endpoint.
fn artist_name(raw: &Value) -> Result<String, MalformedRecord> {
    let artist = match raw.get("artist") {
        Some(nested @ Value::Object(_)) => {
            text_field(nested, "name").or_else(|| text_field(nested, "#text"))
        }
        _ => text_field(raw, "artist"),
    };
    artist.ok_or_else(|| MalformedRecord::missing("artist"))
}

fn track_name(raw: &Value) -> Result<String, MalformedRecord> {
    text_field(raw, "name")
        .or_else(|| text_field(raw, "track"))
        .ok_or_else(|| MalformedRecord::missing("name"))
}

pub struct TopTracksExtractor {
    pub username: String,
    pub period: String,
}

impl TopTracksExtractor {
    pub fn new(username: impl Into<String>, period: impl Into<String>) -> Self {
        TopTracksExtractor {
            username: username.into(),
            period: period.into(),
        }
    }
}

impl RecordExtractor for TopTracksExtractor {
    fn source(&self) -> &'static str {
        "top_tracks"
    }

    fn extract(&self, raw: &Value) -> Result<SourceRecord, MalformedRecord> {
        let name = required_text(raw, "name")?;
        let artist = artist_name(raw)?;
        let playcount = integer_field(raw, "playcount")?.unwrap_or(0);
        if playcount < 0 {
            return Err(MalformedRecord::invalid(
                "playcount",
                format!("{} is negative", playcount),
            ));
        }

        Ok(SourceRecord::TopTrack {
            username: self.username.clone(),
            period: self.period.clone(),
            track: TrackRef { name, artist },
            playcount,
        })
    }
}

pub struct RecentScrobblesExtractor {
    pub username: String,
}

impl RecentScrobblesExtractor {
    pub fn new(username: impl Into<String>) -> Self {
        RecentScrobblesExtractor {
            username: username.into(),
        }
    }
}

/// Unix seconds (`date.uts`), RFC 3339, or one of the text forms the API
/// and the library page render.
pub fn canonical_scrobble_time(text: &str) -> Option<String> {
    let parsed = if text.bytes().all(|b| b.is_ascii_digit()) {
        DateTime::from_timestamp(text.parse().ok()?, 0)?.naive_utc()
    } else if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        date_time.naive_utc()
    } else {
        TEXT_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())?
    };
    Some(parsed.format(SCROBBLE_TIME_FORMAT).to_string())
}

/// `timestamp` for scraped rows, `date.uts` or `date.#text` for API entries.
/// The track currently playing carries none of them.
fn scrobble_time(raw: &Value) -> Result<String, MalformedRecord> {
    let text = match raw.get("date") {
        Some(date @ Value::Object(_)) => text_field(date, "uts").or_else(|| text_field(date, "#text")),
        _ => text_field(raw, "date"),
    };
    let Some(text) = text_field(raw, "timestamp").or(text) else {
        let now_playing = raw
            .get("@attr")
            .and_then(|attr| text_field(attr, "nowplaying"))
            .is_some_and(|flag| flag == "true");
        return Err(if now_playing {
            MalformedRecord::invalid("timestamp", "is missing (track is playing now)")
        } else {
            MalformedRecord::missing("timestamp")
        });
    };
    canonical_scrobble_time(&text).ok_or_else(|| {
        MalformedRecord::invalid("timestamp", format!("'{}' is not a recognized date", text))
    })
}

impl RecordExtractor for RecentScrobblesExtractor {
    fn source(&self) -> &'static str {
        "recent_scrobbles"
    }

    fn extract(&self, raw: &Value) -> Result<SourceRecord, MalformedRecord> {
        let name = track_name(raw)?;
        let artist = artist_name(raw)?;
        let scrobbled_at = scrobble_time(raw)?;

        Ok(SourceRecord::Scrobble {
            username: self.username.clone(),
            track: TrackRef { name, artist },
            scrobbled_at,
        })
    }
}
