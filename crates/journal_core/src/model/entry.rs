//! Entry domain model.
//!
//! # Responsibility
//! - Define the canonical journal entry record.
//! - Own the content and timestamp validation rules shared by every backend.
//!
//! # Invariants
//! - `id` is stable and never reused for another entry.
//! - `content` is never empty or whitespace-only at rest.
//! - `modified_at` is absent until the first update and never earlier than
//!   `created_at`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Opaque stable identifier for one journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generates a random 128-bit identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its canonical text form.
    pub fn parse(value: &str) -> Result<Self, InvalidEntryId> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| InvalidEntryId(value.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for EntryId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = InvalidEntryId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Raised when text cannot be parsed as an [`EntryId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntryId(pub String);

impl Display for InvalidEntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid entry id `{}`", self.0)
    }
}

impl Error for InvalidEntryId {}

/// Validation failures for entry content and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Content is empty or contains only whitespace.
    EmptyContent,
    /// `modified_at` precedes `created_at`.
    ModifiedBeforeCreated { created_at: i64, modified_at: i64 },
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "entry content must not be empty"),
            Self::ModifiedBeforeCreated {
                created_at,
                modified_at,
            } => write!(
                f,
                "entry modified_at {modified_at} is earlier than created_at {created_at}"
            ),
        }
    }
}

impl Error for EntryValidationError {}

/// One journal entry as committed to storage.
///
/// Serialized with camelCase keys, the shape returned to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    /// Free-form text body.
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of the latest successful update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
}

impl Entry {
    /// Builds a never-modified entry.
    ///
    /// Fails when `content` is empty or whitespace-only.
    pub fn new(
        id: EntryId,
        content: impl Into<String>,
        created_at: i64,
    ) -> Result<Self, EntryValidationError> {
        let entry = Self {
            id,
            content: content.into(),
            created_at,
            modified_at: None,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Returns a copy with new content and modification time.
    ///
    /// `now_ms` is clamped so modification times never move backwards
    /// relative to `created_at` or a previous `modified_at`.
    pub fn revised(
        &self,
        content: impl Into<String>,
        now_ms: i64,
    ) -> Result<Self, EntryValidationError> {
        let floor = self.modified_at.unwrap_or(self.created_at);
        let revised = Self {
            id: self.id,
            content: content.into(),
            created_at: self.created_at,
            modified_at: Some(now_ms.max(floor)),
        };
        revised.validate()?;
        Ok(revised)
    }

    /// Checks content and timestamp invariants.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        validate_content(&self.content)?;
        if let Some(modified_at) = self.modified_at {
            if modified_at < self.created_at {
                return Err(EntryValidationError::ModifiedBeforeCreated {
                    created_at: self.created_at,
                    modified_at,
                });
            }
        }
        Ok(())
    }
}

/// Rejects empty or whitespace-only content.
pub fn validate_content(content: &str) -> Result<(), EntryValidationError> {
    if content.trim().is_empty() {
        return Err(EntryValidationError::EmptyContent);
    }
    Ok(())
}
