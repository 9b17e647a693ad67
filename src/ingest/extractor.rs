//! Record extraction: loosely typed JSON in, natural keys and attributes out.

use crate::stats_store::{CatalogEntry, TrackRef, WeatherDay};
use serde_json::Value;
use thiserror::Error;

/// A record an extractor could not map onto a target row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed record: field '{field}' {reason}")]
pub struct MalformedRecord {
    pub field: &'static str,
    pub reason: String,
}

impl MalformedRecord {
    pub fn missing(field: &'static str) -> Self {
        MalformedRecord {
            field,
            reason: "is missing".to_string(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        MalformedRecord {
            field,
            reason: reason.into(),
        }
    }
}

/// What one source record resolves to: the parent natural keys plus the
/// target row's key and attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    TopTrack {
        username: String,
        period: String,
        track: TrackRef,
        playcount: i64,
    },
    Scrobble {
        username: String,
        track: TrackRef,
        scrobbled_at: String,
    },
    Catalog(CatalogEntry),
    Weather {
        place: String,
        day: WeatherDay,
    },
}

/// Per-source strategy plugged into the [`Ingestor`](super::Ingestor).
pub trait RecordExtractor {
    /// Short source name used in logs.
    fn source(&self) -> &'static str;

    fn extract(&self, raw: &Value) -> Result<SourceRecord, MalformedRecord>;
}

/// Trimmed string value of `key`. Numbers are accepted and rendered as text;
/// empty strings count as missing.
pub(crate) fn text_field(raw: &Value, key: &str) -> Option<String> {
    let text = match raw.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub(crate) fn required_text(
    raw: &Value,
    key: &'static str,
) -> Result<String, MalformedRecord> {
    text_field(raw, key).ok_or_else(|| MalformedRecord::missing(key))
}

/// Numeric value of `key`, accepting JSON numbers and numeric strings.
/// `Ok(None)` when the key is absent, null or blank.
pub(crate) fn number_field(raw: &Value, key: &'static str) -> Result<Option<f64>, MalformedRecord> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| MalformedRecord::invalid(key, "is not a finite number")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| MalformedRecord::invalid(key, format!("'{}' is not a number", s))),
        Some(other) => Err(MalformedRecord::invalid(
            key,
            format!("unexpected value {}", other),
        )),
    }
}

/// Integer value of `key`, accepting JSON integers and integer strings.
pub(crate) fn integer_field(raw: &Value, key: &'static str) -> Result<Option<i64>, MalformedRecord> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| MalformedRecord::invalid(key, format!("{} is not an integer", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| MalformedRecord::invalid(key, format!("'{}' is not an integer", s))),
        Some(other) => Err(MalformedRecord::invalid(
            key,
            format!("unexpected value {}", other),
        )),
    }
}

fn items_at(payload: &Value, outer: &str, inner: &str) -> Option<Vec<Value>> {
    match payload.get(outer)?.get(inner)? {
        Value::Array(items) => Some(items.clone()),
        record @ Value::Object(_) => Some(vec![record.clone()]),
        _ => Some(Vec::new()),
    }
}

/// Flattens an input document into individual records.
///
/// Accepts a JSON array of records or one of the known API envelopes:
/// `toptracks.track`, `recenttracks.track`, storefront `results` and the
/// weather archive's columnar `daily` object. Anything else is treated as a
/// single record.
pub fn unwrap_records(payload: &Value) -> Vec<Value> {
    if let Value::Array(items) = payload {
        return items.clone();
    }
    if let Some(items) = items_at(payload, "toptracks", "track") {
        return items;
    }
    if let Some(items) = items_at(payload, "recenttracks", "track") {
        return items;
    }
    if let Some(Value::Array(results)) = payload.get("results") {
        return results.clone();
    }
    if payload.get("daily").is_some() {
        return super::weather::daily_records(payload);
    }
    match payload {
        Value::Object(_) => vec![payload.clone()],
        _ => Vec::new(),
    }
}
