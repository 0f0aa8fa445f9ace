//! Catalog use-case services.
//!
//! # Responsibility
//! - Carry out the obligations repositories leave to their callers:
//!   duplicate-name checks, existence pre-checks and delete ordering.
//! - Turn boolean write results into typed errors for UI/API layers.
//!
//! # Invariants
//! - Services never bypass repository contracts.
//! - Services stay storage-agnostic (generic over repository traits).

use crate::model::EntityKind;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_service;
pub mod pokemon_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Name is empty after trimming.
    InvalidName,
    /// Another entity of the same kind already uses this normalized name.
    DuplicateName { kind: EntityKind, name: String },
    NotFound { kind: EntityKind, id: i64 },
    /// Entity is still referenced and cannot be removed.
    InUse { kind: EntityKind, id: i64 },
    /// Commit changed no rows for the named operation.
    WriteFailed(&'static str),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name cannot be empty"),
            Self::DuplicateName { kind, name } => write!(f, "{kind} already exists: `{name}`"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InUse { kind, id } => write!(f, "{kind} {id} is still in use"),
            Self::WriteFailed(operation) => write!(f, "nothing was saved during {operation}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ReferenceNotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

/// Normalizes a name for duplicate comparison: trimmed and lowercased.
///
/// Returns `None` for blank input.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Maps a boolean write result to `WriteFailed` when nothing changed.
fn require_write(saved: bool, operation: &'static str) -> ServiceResult<()> {
    if saved {
        Ok(())
    } else {
        Err(ServiceError::WriteFailed(operation))
    }
}
