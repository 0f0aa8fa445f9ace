//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Keep SQL and join-record maintenance inside the core boundary.
//!
//! # Invariants
//! - Every mutation stages its writes on the shared [`UnitOfWork`] and
//!   issues exactly one commit.
//! - Mutations report `Ok(false)` when the commit changed no rows.
//! - Single-entity reads return `None` for missing rows, never a default.
//!
//! [`UnitOfWork`]: crate::db::UnitOfWork

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, UnitOfWork};
use crate::model::EntityKind;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_repo;
pub mod owner_repo;
pub mod pokemon_repo;
pub mod review_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A referenced owner/category/pokemon does not exist.
    ReferenceNotFound { kind: EntityKind, id: i64 },
    InvalidData(String),
    /// A detached blocking read could not be joined.
    Task(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ReferenceNotFound { kind, id } => {
                write!(f, "referenced {kind} not found: {id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
            Self::Task(message) => write!(f, "background read failed: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ReferenceNotFound { .. } => None,
            Self::InvalidData(_) => None,
            Self::Task(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Commits the unit of work and maps the row count to the boolean contract.
pub(crate) fn save_changes(uow: &UnitOfWork) -> RepoResult<bool> {
    Ok(uow.save()?.has_changes())
}

/// Runs a single `SELECT EXISTS(...)` query bound to one id.
pub(crate) fn exists_by_id(uow: &UnitOfWork, sql: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = uow.connection().query_row(sql, [id], |row| row.get(0))?;
    Ok(exists == 1)
}

/// Fails with `ReferenceNotFound` unless the referenced row exists.
pub(crate) fn ensure_reference(uow: &UnitOfWork, kind: EntityKind, id: i64) -> RepoResult<()> {
    let sql = match kind {
        EntityKind::Category => "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1);",
        EntityKind::Owner => "SELECT EXISTS(SELECT 1 FROM owners WHERE id = ?1);",
        EntityKind::Pokemon => "SELECT EXISTS(SELECT 1 FROM pokemon WHERE id = ?1);",
        EntityKind::Review => "SELECT EXISTS(SELECT 1 FROM reviews WHERE id = ?1);",
    };
    if exists_by_id(uow, sql, id)? {
        return Ok(());
    }
    warn!("event=reference_check module=repo status=missing kind={kind} id={id}");
    Err(RepoError::ReferenceNotFound { kind, id })
}

/// Fails unless the unit of work's schema is at the latest migration.
pub(crate) fn ensure_schema_current(uow: &UnitOfWork) -> RepoResult<()> {
    let actual_version = current_user_version(uow.connection())?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        warn!(
            "event=repo_open module=repo status=rejected expected_version={expected_version} actual_version={actual_version}"
        );
        return Err(RepoError::Db(DbError::SchemaMismatch {
            expected_version,
            actual_version,
        }));
    }
    Ok(())
}
