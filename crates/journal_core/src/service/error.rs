//! Entry store error taxonomy.
//!
//! # Invariants
//! - `InvalidArgument`, `NotFound` and `Conflict` are the only domain
//!   outcomes; each is recoverable by the caller.
//! - `Backend` carries storage transport failures and never stands in for
//!   one of the domain outcomes.

use crate::model::entry::{EntryId, EntryValidationError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure outcome of an entry store operation.
#[derive(Debug)]
pub enum StoreError {
    /// Input content is empty or whitespace-only.
    InvalidArgument(EntryValidationError),
    /// The target id has no live entry.
    NotFound(EntryId),
    /// Another writer committed to the id after it was read.
    Conflict(EntryId),
    /// Storage failure.
    Backend(RepoError),
}

/// Payload-free classification of [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    Backend,
}

impl StoreErrorKind {
    /// Status code an HTTP layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Backend => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Backend => "backend",
        }
    }
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::InvalidArgument(_) => StoreErrorKind::InvalidArgument,
            Self::NotFound(_) => StoreErrorKind::NotFound,
            Self::Conflict(_) => StoreErrorKind::Conflict,
            Self::Backend(_) => StoreErrorKind::Backend,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(err) => write!(f, "invalid argument: {err}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::Conflict(id) => write!(f, "entry {id} was modified concurrently"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            Self::Backend(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) => None,
        }
    }
}

impl From<EntryValidationError> for StoreError {
    fn from(value: EntryValidationError) -> Self {
        Self::InvalidArgument(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidArgument(err),
            other => Self::Backend(other),
        }
    }
}
