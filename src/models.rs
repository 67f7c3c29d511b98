use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const CACHE_PREFIX: &str = "events_";
const FEATURED_CACHE_KEY: &str = "events_featured";

const DEFAULT_ARTIST: &str = "Various Artists";
const DEFAULT_VENUE: &str = "TBD";
const DEFAULT_CITY: &str = "Unknown";
const DEFAULT_COUNTRY: &str = "US";
const UNKNOWN_DATE: &str = "Date TBA";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Please enter an artist name or city.")]
pub struct EmptyQueryError;

/// A trimmed, non-empty artist name or city.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    pub fn parse(input: &str) -> Result<Self, EmptyQueryError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmptyQueryError);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_query(query: Option<&Query>) -> Self {
        match query {
            Some(query) => Self(format!("{CACHE_PREFIX}{}", query.as_str())),
            None => Self(FEATURED_CACHE_KEY.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
#[error("event at index {index} is not a JSON object")]
pub struct MalformedEvent {
    pub index: usize,
}

/// Display projection of one upstream Discovery API event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub artist: String,
    pub venue: String,
    pub city: String,
    pub country_code: String,
    pub date: String,
    pub ticket_url: Option<String>,
}

impl EventRecord {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let event = raw.as_object()?;
        let embedded = event.get("_embedded");
        let venue = embedded.and_then(|e| first_of(e, "venues"));

        let artist = embedded
            .and_then(|e| first_of(e, "attractions"))
            .and_then(|attraction| text_at(attraction, &["name"]))
            .or_else(|| text_at(raw, &["name"]))
            .unwrap_or_else(|| DEFAULT_ARTIST.to_string());

        Some(Self {
            artist,
            venue: venue
                .and_then(|v| text_at(v, &["name"]))
                .unwrap_or_else(|| DEFAULT_VENUE.to_string()),
            city: venue
                .and_then(|v| text_at(v, &["city", "name"]))
                .unwrap_or_else(|| DEFAULT_CITY.to_string()),
            country_code: venue
                .and_then(|v| text_at(v, &["country", "countryCode"]))
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            date: text_at(raw, &["dates", "start", "localDate"])
                .and_then(|value| format_long_date(&value))
                .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
            ticket_url: text_at(raw, &["url"]),
        })
    }
}

pub fn normalize_events(raw: &[Value]) -> Result<Vec<EventRecord>, MalformedEvent> {
    raw.iter()
        .enumerate()
        .map(|(index, event)| EventRecord::from_raw(event).ok_or(MalformedEvent { index }))
        .collect()
}

/// Formats a `YYYY-MM-DD` calendar date as e.g. `July 4, 2025`.
pub fn format_long_date(local_date: &str) -> Option<String> {
    NaiveDate::parse_from_str(local_date.trim(), "%Y-%m-%d")
        .ok()
        .map(|date| date.format("%B %-d, %Y").to_string())
}

fn first_of<'a>(embedded: &'a Value, field: &str) -> Option<&'a Value> {
    embedded
        .get(field)
        .and_then(|list| list.as_array())
        .and_then(|list| list.first())
}

// Empty strings count as absent.
fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |node, key| node.get(key))
        .and_then(|node| node.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
