//! Core data types shared by every layer: articles as the backend sends them,
//! the closed set of known content agents, and the filter options the search
//! pipeline consumes.
//!
//! Field names follow the backend's JSON (`meta_title`, `source_links`,
//! `videoId`, ...) via serde renames. Every field defaults when missing so a
//! partial payload or an older cache entry still decodes.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when parsing a filter option from a string (CLI flags, config).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseOptionError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

// ============================================================================
// Agents and Sources
// ============================================================================

/// A content agent known to the backend pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Agent {
    YouTube,
    Google,
    Forbes,
    Wikipedia,
    DallE,
    Unsplash,
}

impl Agent {
    pub const ALL: [Agent; 6] = [
        Agent::YouTube,
        Agent::Google,
        Agent::Forbes,
        Agent::Wikipedia,
        Agent::DallE,
        Agent::Unsplash,
    ];

    /// The exact name the backend uses for this agent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::YouTube => "YouTube",
            Agent::Google => "Google",
            Agent::Forbes => "Forbes",
            Agent::Wikipedia => "Wikipedia",
            Agent::DallE => "DALL-E",
            Agent::Unsplash => "Unsplash",
        }
    }

    /// Case-sensitive lookup by backend name.
    pub fn from_name(name: &str) -> Option<Agent> {
        Agent::ALL.into_iter().find(|agent| agent.as_str() == name)
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a source link came from: one of the known agents, or any other
/// publisher name the backend reports.
///
/// Serialized as the plain name string, so `"Wikipedia"` round-trips to
/// `Source::Known(Agent::Wikipedia)` and `"Reuters"` to `Source::Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Known(Agent),
    Other(String),
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::Known(agent) => agent.as_str(),
            Source::Other(name) => name,
        }
    }

    pub fn agent(&self) -> Option<Agent> {
        match self {
            Source::Known(agent) => Some(*agent),
            Source::Other(_) => None,
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Other(String::new())
    }
}

impl From<String> for Source {
    fn from(name: String) -> Self {
        match Agent::from_name(&name) {
            Some(agent) => Source::Known(agent),
            None => Source::Other(name),
        }
    }
}

impl From<&str> for Source {
    fn from(name: &str) -> Self {
        Source::from(name.to_string())
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        match source {
            Source::Known(agent) => agent.as_str().to_string(),
            Source::Other(name) => name,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Fallback article time as the backend (or the merge step) supplied it.
///
/// Numbers are epoch milliseconds; strings are date/time text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Timestamp {
    /// Epoch milliseconds, or 0 when the value cannot be interpreted as a time.
    pub fn as_millis(&self) -> i64 {
        match self {
            Timestamp::Integer(ms) => *ms,
            Timestamp::Float(ms) if ms.is_finite() => ms.trunc() as i64,
            Timestamp::Float(_) => 0,
            Timestamp::Text(text) => parse_datetime(text)
                .map(|dt| dt.timestamp_millis())
                .unwrap_or(0),
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Integer(ms) => DateTime::from_timestamp_millis(*ms),
            Timestamp::Float(ms) if ms.is_finite() => {
                DateTime::from_timestamp_millis(ms.trunc() as i64)
            }
            Timestamp::Float(_) => None,
            Timestamp::Text(text) => parse_datetime(text),
        }
    }
}

/// Parse a date/time string the way the backend emits them.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`), a bare date (`2024-05-01`,
/// midnight UTC) and a zone-less date-time (`2024-05-01T12:00:00`, UTC).
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Article
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLink {
    pub title: String,
    pub url: String,
    pub source: Source,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoLink {
    pub title: String,
    pub url: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLink {
    pub url: String,
    pub alt: String,
    pub source: String,
    pub generated: bool,
}

/// A news article as produced by the backend and kept in the local cache.
///
/// `id` is empty until the remote layer backfills it; every cached article
/// has a non-empty id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: String,
    #[serde(rename = "meta_title")]
    pub title: String,
    #[serde(rename = "meta_description")]
    pub description: String,
    #[serde(rename = "meta_image_prompt", skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    pub slug: String,
    pub tags: Vec<String>,
    pub content: Vec<ContentSection>,
    pub source_links: Vec<SourceLink>,
    pub video_links: Vec<VideoLink>,
    pub images: Vec<ImageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fetched_by: Vec<Source>,
}

impl Article {
    pub fn has_video(&self) -> bool {
        !self.video_links.is_empty()
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// True if any source link names `source` exactly.
    pub fn has_source(&self, source: &str) -> bool {
        self.source_links
            .iter()
            .any(|link| link.source.as_str() == source)
    }

    /// Sort key for "recent" ordering: timestamp in epoch millis, 0 when absent.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.as_ref().map(Timestamp::as_millis).unwrap_or(0)
    }
}

// ============================================================================
// Filter Options
// ============================================================================

/// Content-type facet of the filter sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Article,
    Wikipedia,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Article => "article",
            ContentType::Wikipedia => "wikipedia",
        }
    }
}

impl FromStr for ContentType {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ContentType::Video),
            "article" => Ok(ContentType::Article),
            "wikipedia" => Ok(ContentType::Wikipedia),
            _ => Err(ParseOptionError {
                kind: "content type",
                value: s.to_string(),
                expected: "video, article, wikipedia",
            }),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering applied at the end of the search pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Recent,
    /// View counts are not tracked; this mode keeps input order.
    Watched,
    Highlighted,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Recent => "recent",
            SortMode::Watched => "watched",
            SortMode::Highlighted => "highlighted",
        }
    }
}

impl FromStr for SortMode {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(SortMode::Recent),
            "watched" => Ok(SortMode::Watched),
            "highlighted" => Ok(SortMode::Highlighted),
            _ => Err(ParseOptionError {
                kind: "sort mode",
                value: s.to_string(),
                expected: "recent, watched, highlighted",
            }),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current filter selection. Sets are OR within a facet, AND across facets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub content_types: BTreeSet<ContentType>,
    pub sources: BTreeSet<String>,
    pub topics: BTreeSet<String>,
    pub sort_by: SortMode,
}

impl FilterOptions {
    /// Merge a partial update over these options; unset fields keep their value.
    pub fn merged(&self, update: FilterUpdate) -> FilterOptions {
        FilterOptions {
            content_types: update
                .content_types
                .unwrap_or_else(|| self.content_types.clone()),
            sources: update.sources.unwrap_or_else(|| self.sources.clone()),
            topics: update.topics.unwrap_or_else(|| self.topics.clone()),
            sort_by: update.sort_by.unwrap_or(self.sort_by),
        }
    }

    /// True when no facet narrows the list (sorting may still apply).
    pub fn is_unfiltered(&self) -> bool {
        self.content_types.is_empty() && self.sources.is_empty() && self.topics.is_empty()
    }
}

/// Partial filter change, as produced by a single sidebar interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub content_types: Option<BTreeSet<ContentType>>,
    pub sources: Option<BTreeSet<String>>,
    pub topics: Option<BTreeSet<String>>,
    pub sort_by: Option<SortMode>,
}

impl FilterUpdate {
    /// An update that resets every facet and the sort mode.
    pub fn clear_all() -> Self {
        FilterUpdate {
            content_types: Some(BTreeSet::new()),
            sources: Some(BTreeSet::new()),
            topics: Some(BTreeSet::new()),
            sort_by: Some(SortMode::default()),
        }
    }
}
