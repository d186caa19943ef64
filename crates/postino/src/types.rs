use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ClientError;

/// A photo attached to a date record
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Photo {
    #[serde(default)]
    pub id: Option<i64>,
    pub filename: String,
    /// Path relative to the service root, e.g. `uploads/20240310_120000_a.jpg`
    pub filepath: String,
}

/// A single tracked date, as returned by the dates API
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct DateRecord {
    pub id: i64,

    pub activity_name: String,

    pub location: String,

    /// Calendar day as sent by the service. Kept raw so that a malformed
    /// value only drops the record from date-based views.
    pub date_day: String,

    /// 1 to 5 stars
    #[serde(default)]
    pub rating: Option<u8>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub photos: Vec<Photo>,

    #[serde(default)]
    pub created_by_name: Option<String>,

    #[serde(default)]
    pub notes_edited_by_name: Option<String>,
}

impl DateRecord {
    /// Parsed calendar day, `None` when `date_day` is malformed.
    pub fn day(&self) -> Option<NaiveDate> {
        parse_date_day(&self.date_day)
    }

    /// Star string for the rating, e.g. "★★★☆☆".
    pub fn stars(&self) -> Option<String> {
        self.rating.map(|r| {
            let r = r.min(5) as usize;
            format!("{}{}", "★".repeat(r), "☆".repeat(5 - r))
        })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a `date_day` value.
///
/// The service sends SQL dates either as `YYYY-MM-DD` or in HTTP date form
/// (`Sun, 10 Mar 2024 00:00:00 GMT`). Full RFC 3339 timestamps and naive
/// `YYYY-MM-DDTHH:MM:SS` values are accepted too. The date component is taken
/// as written, without shifting to the local timezone.
pub fn parse_date_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

/// Body of `POST /api/dates` and `PUT /api/dates/{id}`.
///
/// Updates always carry every field, the same way creates do.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct DateInput {
    pub activity_name: String,
    pub location: String,
    pub date_day: NaiveDate,
    pub rating: Option<u8>,
    pub notes: String,
}

impl DateInput {
    pub fn new(activity_name: String, location: String, date_day: NaiveDate) -> Self {
        Self {
            activity_name,
            location,
            date_day,
            rating: None,
            notes: String::new(),
        }
    }

    /// Prefill an edit from an existing record. Fails when the record's
    /// `date_day` cannot be parsed.
    pub fn from_record(record: &DateRecord) -> Result<Self, ClientError> {
        let date_day = record.day().ok_or_else(|| {
            ClientError::Validation(format!("Invalid date on record: {}", record.date_day))
        })?;
        Ok(Self {
            activity_name: record.activity_name.clone(),
            location: record.location.clone(),
            date_day,
            rating: record.rating,
            notes: record.notes.clone(),
        })
    }

    /// Client-side checks done before anything is sent.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.activity_name.trim().is_empty() || self.location.trim().is_empty() {
            return Err(ClientError::Validation(
                "Activity name, location, and date are required".to_string(),
            ));
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(ClientError::Validation(format!(
                    "Rating must be between 1 and 5, got {}",
                    rating
                )));
            }
        }
        Ok(())
    }
}

/// Query filters for `GET /api/dates`. Unset fields are not sent.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DateFilter {
    /// Case-insensitive substring of the activity name
    pub activity_name: Option<String>,
    /// Case-insensitive substring of the location
    pub location: Option<String>,
    pub rating: Option<u8>,
    pub date_day: Option<NaiveDate>,
}

impl DateFilter {
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(activity) = non_blank(&self.activity_name) {
            pairs.push(("activity_name", activity.to_string()));
        }
        if let Some(location) = non_blank(&self.location) {
            pairs.push(("location", location.to_string()));
        }
        if let Some(rating) = self.rating {
            pairs.push(("rating", rating.to_string()));
        }
        if let Some(day) = self.date_day {
            pairs.push(("date_day", day.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
