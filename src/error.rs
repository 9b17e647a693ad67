use thiserror::Error;

/// Errors surfaced by the stats store, the ingestor and the report queries.
///
/// Duplicate keys and malformed source records are not represented here: the
/// deduplicator turns the former into `inserted = false`, and the ingestor
/// counts and skips the latter.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("Schema error: {0}")]
    Schema(#[source] anyhow::Error),
}

impl StatsError {
    pub fn subject_not_found(username: &str) -> Self {
        StatsError::NotFound {
            kind: "Subject",
            key: username.to_string(),
        }
    }

    pub fn place_not_found(place: &str) -> Self {
        StatsError::NotFound {
            kind: "Place",
            key: place.to_string(),
        }
    }
}

pub type StatsResult<T> = Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_contains_key() {
        let err = StatsError::subject_not_found("alice");
        assert_eq!(err.to_string(), "Subject not found: alice");

        let err = StatsError::place_not_found("Ann Arbor");
        assert!(err.to_string().contains("Ann Arbor"));
    }

    #[test]
    fn sqlite_errors_become_store_unavailable() {
        let err: StatsError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, StatsError::StoreUnavailable(_)));
    }
}
