//! # Timestamp
//!
//! The built-in opaque host type: a UTC instant. The global deserializer
//! table converts RFC 3339 strings and unix-seconds integers into it.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::{HostObject, Value};

/// A UTC instant carried through validation as an opaque host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Registry name for this host type.
    pub const TYPE_NAME: &'static str = "Timestamp";

    pub fn new(instant: DateTime<Utc>) -> Self {
        Timestamp(instant)
    }

    /// From whole seconds since the unix epoch. Out-of-range values are
    /// rejected.
    pub fn from_unix(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Timestamp)
    }

    /// Parses an RFC 3339 timestamp, falling back to a bare
    /// `YYYY-MM-DDTHH:MM:SS` form interpreted as UTC.
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Some(Timestamp(parsed.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|naive| Timestamp(naive.and_utc()))
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }
}

impl HostObject for Timestamp {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn render(&self) -> Value {
        Value::Str(self.0.to_rfc3339())
    }

    fn eq_dyn(&self, other: &dyn HostObject) -> bool {
        other
            .as_any()
            .downcast_ref::<Timestamp>()
            .is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339() {
        let ts = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(ts.instant().timestamp(), 1_705_314_600);
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let naive = Timestamp::parse("2024-01-15T10:30:00").unwrap();
        let explicit = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(naive, explicit);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timestamp::parse("not a timestamp").is_none());
        assert!(Timestamp::parse("").is_none());
    }

    #[test]
    fn test_render_round_trips() {
        let ts = Timestamp::from_unix(1_700_000_000).unwrap();
        let rendered = ts.render();
        let text = rendered.as_str().unwrap();
        assert_eq!(Timestamp::parse(text), Some(ts));
    }
}
