//! Category repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD and existence checks for categories.
//! - Follow `pokemon_categories` to list the pokemon of one category.
//!
//! # Invariants
//! - Name uniqueness is not enforced here; callers check before creating.
//! - `get_category_async` never reads through the writer's staged state.

use crate::db::{open_db_read_only, DbLocation, StagedWrite, UnitOfWork};
use crate::model::category::{Category, CategoryId};
use crate::model::pokemon::Pokemon;
use crate::repo::pokemon_repo::{parse_pokemon_row, POKEMON_SELECT_SQL};
use crate::repo::{ensure_schema_current, exists_by_id, save_changes, RepoError, RepoResult};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row};
use std::future::Future;
use std::path::PathBuf;

/// Repository interface for category operations.
pub trait CategoryRepository {
    fn category_exists(&self, id: CategoryId) -> RepoResult<bool>;
    /// Lists every category in id order.
    fn get_categories(&self) -> RepoResult<Vec<Category>>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Lists pokemon linked to the category, without their own categories loaded.
    fn get_pokemon_by_category(&self, category_id: CategoryId) -> RepoResult<Vec<Pokemon>>;
    /// Inserts the category and writes the assigned id back into it.
    fn create_category(&self, category: &mut Category) -> RepoResult<bool>;
    fn update_category(&self, category: &Category) -> RepoResult<bool>;
    /// Removes a previously fetched category.
    fn delete_category(&self, category: &Category) -> RepoResult<bool>;
    /// Commits pending writes; `true` when at least one row changed.
    fn save(&self) -> RepoResult<bool>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'uow> {
    uow: &'uow UnitOfWork,
}

impl<'uow> SqliteCategoryRepository<'uow> {
    pub fn new(uow: &'uow UnitOfWork) -> Self {
        Self { uow }
    }

    /// Like [`Self::new`], but first confirms the schema is current.
    pub fn try_new(uow: &'uow UnitOfWork) -> RepoResult<Self> {
        ensure_schema_current(uow)?;
        Ok(Self::new(uow))
    }

    /// Non-blocking variant of [`CategoryRepository::get_category`].
    ///
    /// The returned future owns everything it needs, so it can be handed to
    /// `tokio::spawn`. File databases are read on a blocking worker through a
    /// separate read-only connection and only see committed rows. In-memory
    /// databases cannot be reopened; they are read before this returns and
    /// the future resolves immediately.
    pub fn get_category_async(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = RepoResult<Option<Category>>> + Send + 'static {
        let source = match self.uow.location() {
            DbLocation::File(path) => CategoryRead::Detached(path.clone()),
            DbLocation::Memory => CategoryRead::Ready(query_category(self.uow.connection(), id)),
        };
        async move {
            match source {
                CategoryRead::Detached(path) => {
                    tokio::task::spawn_blocking(move || -> RepoResult<Option<Category>> {
                        let conn = open_db_read_only(&path)?;
                        query_category(&conn, id)
                    })
                    .await
                    .map_err(|err| RepoError::Task(err.to_string()))?
                }
                CategoryRead::Ready(result) => result,
            }
        }
    }
}

enum CategoryRead {
    Detached(PathBuf),
    Ready(RepoResult<Option<Category>>),
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn category_exists(&self, id: CategoryId) -> RepoResult<bool> {
        exists_by_id(
            self.uow,
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1);",
            id,
        )
    }

    fn get_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .uow
            .connection()
            .prepare("SELECT id, name FROM categories ORDER BY id ASC;")?;
        let categories = stmt
            .query_map([], parse_category_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        query_category(self.uow.connection(), id)
    }

    fn get_pokemon_by_category(&self, category_id: CategoryId) -> RepoResult<Vec<Pokemon>> {
        let mut stmt = self.uow.connection().prepare(&format!(
            "{POKEMON_SELECT_SQL}
             INNER JOIN pokemon_categories pc ON pc.pokemon_id = p.id
             WHERE pc.category_id = ?1
             ORDER BY p.id ASC;"
        ))?;
        let pokemon = stmt
            .query_map([category_id], parse_pokemon_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pokemon)
    }

    fn create_category(&self, category: &mut Category) -> RepoResult<bool> {
        let key = self
            .uow
            .stage(StagedWrite::InsertCategory(category.clone()));
        let outcome = self.uow.save()?;
        if let Some(id) = outcome.assigned_id(key) {
            category.id = id;
            debug!("event=category_create module=repo status=ok category_id={id}");
        }
        Ok(outcome.has_changes())
    }

    fn update_category(&self, category: &Category) -> RepoResult<bool> {
        self.uow
            .stage(StagedWrite::UpdateCategory(category.clone()));
        save_changes(self.uow)
    }

    fn delete_category(&self, category: &Category) -> RepoResult<bool> {
        self.uow.stage(StagedWrite::RemoveCategory(category.id));
        save_changes(self.uow)
    }

    fn save(&self) -> RepoResult<bool> {
        save_changes(self.uow)
    }
}

fn query_category(conn: &Connection, id: CategoryId) -> RepoResult<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, name FROM categories WHERE id = ?1;",
            [id],
            parse_category_row,
        )
        .optional()?;
    Ok(category)
}

pub(crate) fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}
