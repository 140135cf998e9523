//! Ambient sound entries
//!
//! An entry is one named playable source from the persisted resource list.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    /// Create a new entry ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Kind of source an entry points at
///
/// Stored as `0 | 1 | 2` in the resource list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SourceKind {
    /// A file on the local filesystem
    LocalFile,
    /// A directly playable web URL
    WebUrl,
    /// A video page link that must be resolved to an audio stream first
    VideoLink,
}

impl SourceKind {
    /// Whether the locator has to go through the resolver before playback
    pub fn needs_resolution(self) -> bool {
        matches!(self, SourceKind::VideoLink)
    }
}

impl TryFrom<u8> for SourceKind {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SourceKind::LocalFile),
            1 => Ok(SourceKind::WebUrl),
            2 => Ok(SourceKind::VideoLink),
            other => Err(CoreError::UnknownSourceKind(other)),
        }
    }
}

impl From<SourceKind> for u8 {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::LocalFile => 0,
            SourceKind::WebUrl => 1,
            SourceKind::VideoLink => 2,
        }
    }
}

/// A named playable source
///
/// Owned by the settings store and passed by value into the session
/// controller; never mutated once read for an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identifier
    pub id: EntryId,

    /// Display name
    pub name: String,

    /// How `locator` has to be interpreted
    #[serde(rename = "type")]
    pub source_kind: SourceKind,

    /// File path, URL or video page link
    #[serde(rename = "uri")]
    pub locator: String,
}

impl Entry {
    /// Create a new entry
    pub fn new(
        id: impl Into<EntryId>,
        name: impl Into<String>,
        source_kind: SourceKind,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_kind,
            locator: locator.into(),
        }
    }
}
