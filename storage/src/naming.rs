//! Object key naming for stored scenarios and solutions.
//!
//! Keys have the shape `<prefix>/<date>/<filename>.json`. The date segment is
//! `YEAR-MONTH-DAY` with only the day zero-padded (`2024-3-07`). Existing
//! objects were written with this format, so it must not be normalized to
//! ISO 8601.

use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;

pub const JSON_EXTENSION: &str = ".json";

/// The two logical collections kept in the bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Scenarios,
    Solutions,
}

impl Collection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Collection::Scenarios => "scenarios",
            Collection::Solutions => "solutions",
        }
    }

    /// Listing prefix covering every object of the collection.
    pub fn list_prefix(&self) -> String {
        format!("{}/", self.as_str())
    }

    pub fn key(&self, filename: &str, date: Option<&str>) -> String {
        build_key(self.as_str(), filename, date)
    }
}

pub fn storage_date(date: NaiveDate) -> String {
    format!("{}-{}-{:02}", date.year(), date.month(), date.day())
}

/// Today's date in the local timezone, in storage key format.
pub fn today() -> String {
    storage_date(Local::now().date_naive())
}

pub fn build_key(prefix: &str, filename: &str, date: Option<&str>) -> String {
    let date = match date {
        Some(date) => date.to_string(),
        None => today(),
    };

    if filename.ends_with(JSON_EXTENSION) {
        format!("{prefix}/{date}/{filename}")
    } else {
        format!("{prefix}/{date}/{filename}{JSON_EXTENSION}")
    }
}

/// Strips the first path segment of a key. Keys without a `/` are returned as is.
pub fn shorten_key(key: &str) -> &str {
    match key.split_once('/') {
        Some((_, rest)) => rest,
        None => key,
    }
}
