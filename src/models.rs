//! Core data models for featured-sync
//!
//! Defines the domain types shared across the tool:
//! - `DeviationId`: stable opaque identifier for a deviation
//! - `Deviation`: a ranked snapshot of one artwork item
//! - `Folder`: a gallery folder as listed by the API
//! - `RawDeviation`: the wire form returned by gallery endpoints

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Stable opaque identifier for a deviation, unique within the service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviationId(String);

impl DeviationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A read-only snapshot of one artwork item, valid for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct Deviation {
    /// Stable opaque identifier
    pub id: DeviationId,

    /// Title, carried for reporting only
    pub title: Option<String>,

    /// Favourite count at snapshot time
    pub favourites: u64,

    /// Publication timestamp; ranking tie-break only
    pub published: DateTime<Utc>,
}

impl Deviation {
    pub fn new(
        id: impl Into<DeviationId>,
        favourites: u64,
        published: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: None,
            favourites,
            published,
        }
    }
}

impl From<String> for DeviationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A gallery folder as returned by `/gallery/folders`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Folder {
    pub folderid: String,
    pub name: String,

    /// Parent folder id; `None` for root folders
    #[serde(default)]
    pub parent: Option<String>,

    /// Deviation count, present when requested with `calculate_size`
    #[serde(default)]
    pub size: Option<u64>,
}

/// Favourite statistics embedded in deviation objects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviationStats {
    #[serde(default)]
    pub favourites: u64,
}

/// Wire form of a deviation as returned by gallery listing endpoints.
///
/// Every field is optional on the wire; `into_deviation` decides what is
/// usable. The API serialises `published_time` as epoch seconds, sometimes
/// as a string and sometimes as a number.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDeviation {
    #[serde(default)]
    pub deviationid: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub stats: Option<DeviationStats>,

    #[serde(default, deserialize_with = "epoch_seconds_opt")]
    pub published_time: Option<DateTime<Utc>>,
}

impl RawDeviation {
    /// Convert to the domain model. Returns `None` when the item has no id
    /// (the listing endpoints occasionally include placeholder entries).
    /// Missing stats count as zero favourites; a missing publication time
    /// sorts last among ties.
    pub fn into_deviation(self) -> Option<Deviation> {
        let id = self.deviationid?;
        Some(Deviation {
            id: DeviationId::new(id),
            title: self.title,
            favourites: self.stats.unwrap_or_default().favourites,
            published: self.published_time.unwrap_or(DateTime::UNIX_EPOCH),
        })
    }
}

fn epoch_seconds_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Num(i64),
        Str(String),
    }

    let raw = Option::<Epoch>::deserialize(deserializer)?;
    let secs = match raw {
        None => return Ok(None),
        Some(Epoch::Num(n)) => n,
        Some(Epoch::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid epoch timestamp '{s}'")))?,
    };

    DateTime::from_timestamp(secs, 0)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("epoch timestamp out of range: {secs}")))
}
