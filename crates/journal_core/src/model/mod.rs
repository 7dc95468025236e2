//! Domain model for journal entries.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`.
//! - Version markers are not part of the model; repositories hand them out
//!   next to the entry they describe.

pub mod entry;
