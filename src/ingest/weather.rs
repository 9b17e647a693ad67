//! Daily weather archive.

use super::extractor::{number_field, required_text, MalformedRecord, RecordExtractor, SourceRecord};
use crate::stats_store::WeatherDay;
use chrono::NaiveDate;
use serde_json::{Map, Value};

pub struct WeatherExtractor {
    pub place: String,
}

impl WeatherExtractor {
    pub fn new(place: impl Into<String>) -> Self {
        WeatherExtractor {
            place: place.into(),
        }
    }
}

fn required_number(raw: &Value, key: &'static str) -> Result<f64, MalformedRecord> {
    number_field(raw, key)?.ok_or_else(|| MalformedRecord::missing(key))
}

impl RecordExtractor for WeatherExtractor {
    fn source(&self) -> &'static str {
        "weather"
    }

    fn extract(&self, raw: &Value) -> Result<SourceRecord, MalformedRecord> {
        let date_text = required_text(raw, "date").or_else(|_| required_text(raw, "time"))?;
        let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|e| {
            MalformedRecord::invalid("date", format!("'{}' is not YYYY-MM-DD: {}", date_text, e))
        })?;

        let precipitation = match number_field(raw, "precipitation_sum")? {
            Some(value) => value,
            None => number_field(raw, "rain_sum")?.unwrap_or(0.0),
        };

        Ok(SourceRecord::Weather {
            place: self.place.clone(),
            day: WeatherDay {
                date,
                temperature_max: required_number(raw, "temperature_2m_max")?,
                temperature_min: required_number(raw, "temperature_2m_min")?,
                precipitation,
                snowfall: number_field(raw, "snowfall_sum")?.unwrap_or(0.0),
            },
        })
    }
}

/// Turns the archive's columnar `daily` object (one array per variable, aligned
/// with `daily.time`) into one JSON record per day.
///
/// Arrays shorter than `time` leave the missing values null.
pub fn daily_records(archive: &Value) -> Vec<Value> {
    let Some(Value::Object(daily)) = archive.get("daily") else {
        return Vec::new();
    };
    let Some(Value::Array(times)) = daily.get("time") else {
        return Vec::new();
    };

    times
        .iter()
        .enumerate()
        .map(|(i, time)| {
            let mut day = Map::new();
            day.insert("date".to_string(), time.clone());
            for (key, values) in daily {
                if key == "time" {
                    continue;
                }
                if let Value::Array(values) = values {
                    day.insert(key.clone(), values.get(i).cloned().unwrap_or(Value::Null));
                }
            }
            Value::Object(day)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(raw: Value) -> Result<WeatherDay, MalformedRecord> {
        match WeatherExtractor::new("Ann Arbor").extract(&raw)? {
            SourceRecord::Weather { day, .. } => Ok(day),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn daily_arrays_become_records() {
        let archive = json!({
            "latitude": 42.28,
            "daily_units": {"time": "iso8601"},
            "daily": {
                "time": ["2024-01-01", "2024-01-02"],
                "temperature_2m_max": [2.1, 3.4],
                "temperature_2m_min": [-4.0, -1.5],
                "rain_sum": [0.0],
                "snowfall_sum": [1.4, 0.0]
            }
        });
        let records = daily_records(&archive);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["date"], "2024-01-01");
        assert_eq!(records[1]["temperature_2m_min"], -1.5);
        assert_eq!(records[1]["rain_sum"], Value::Null);
    }

    #[test]
    fn missing_daily_object_means_no_records() {
        assert!(daily_records(&json!({"error": true, "reason": "bad range"})).is_empty());
    }

    #[test]
    fn precipitation_falls_back_to_rain() {
        let day = day(json!({
            "date": "2024-01-01",
            "temperature_2m_max": 2.0,
            "temperature_2m_min": -4.0,
            "rain_sum": 3.5
        }))
        .unwrap();
        assert_eq!(day.precipitation, 3.5);
        assert_eq!(day.snowfall, 0.0);
    }

    #[test]
    fn temperatures_are_required() {
        let err = day(json!({
            "date": "2024-01-01",
            "temperature_2m_max": 2.0,
            "temperature_2m_min": null
        }))
        .unwrap_err();
        assert_eq!(err.field, "temperature_2m_min");
    }

    #[test]
    fn date_must_parse() {
        let err = day(json!({
            "time": "01/02/2024",
            "temperature_2m_max": 2.0,
            "temperature_2m_min": 1.0
        }))
        .unwrap_err();
        assert_eq!(err.field, "date");

        let err = day(json!({"temperature_2m_max": 2.0, "temperature_2m_min": 1.0})).unwrap_err();
        assert_eq!(err.field, "time");
    }
}
