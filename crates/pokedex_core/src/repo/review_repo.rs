//! Review repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Supply the reviews of one pokemon so callers can remove them before
//!   deleting the pokemon itself.
//! - Basic review CRUD.
//!
//! # Invariants
//! - `delete_reviews` removes the whole batch in one commit.

use crate::db::{StagedWrite, UnitOfWork};
use crate::model::pokemon::PokemonId;
use crate::model::review::{Review, ReviewId};
use crate::model::EntityKind;
use crate::repo::{ensure_reference, ensure_schema_current, exists_by_id, save_changes, RepoResult};
use rusqlite::{OptionalExtension, Row};

const REVIEW_SELECT_SQL: &str = "SELECT
    id,
    title,
    text,
    rating,
    pokemon_id
FROM reviews";

/// Repository interface for review operations.
pub trait ReviewRepository {
    fn get_reviews_of_a_pokemon(&self, poke_id: PokemonId) -> RepoResult<Vec<Review>>;
    /// Removes every given review in one commit.
    fn delete_reviews(&self, reviews: &[Review]) -> RepoResult<bool>;
    fn review_exists(&self, id: ReviewId) -> RepoResult<bool>;
    fn get_reviews(&self) -> RepoResult<Vec<Review>>;
    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>>;
    /// Inserts the review and writes the assigned id back into it.
    ///
    /// # Errors
    /// - `ReferenceNotFound` when the reviewed pokemon does not exist.
    fn create_review(&self, review: &mut Review) -> RepoResult<bool>;
    fn delete_review(&self, review: &Review) -> RepoResult<bool>;
    fn save(&self) -> RepoResult<bool>;
}

/// SQLite-backed review repository.
pub struct SqliteReviewRepository<'uow> {
    uow: &'uow UnitOfWork,
}

impl<'uow> SqliteReviewRepository<'uow> {
    pub fn new(uow: &'uow UnitOfWork) -> Self {
        Self { uow }
    }

    /// Like [`Self::new`], but first confirms the schema is current.
    pub fn try_new(uow: &'uow UnitOfWork) -> RepoResult<Self> {
        ensure_schema_current(uow)?;
        Ok(Self::new(uow))
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn get_reviews_of_a_pokemon(&self, poke_id: PokemonId) -> RepoResult<Vec<Review>> {
        let mut stmt = self.uow.connection().prepare(&format!(
            "{REVIEW_SELECT_SQL} WHERE pokemon_id = ?1 ORDER BY id ASC;"
        ))?;
        let reviews = stmt
            .query_map([poke_id], parse_review_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn delete_reviews(&self, reviews: &[Review]) -> RepoResult<bool> {
        for review in reviews {
            self.uow.stage(StagedWrite::RemoveReview(review.id));
        }
        save_changes(self.uow)
    }

    fn review_exists(&self, id: ReviewId) -> RepoResult<bool> {
        exists_by_id(
            self.uow,
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE id = ?1);",
            id,
        )
    }

    fn get_reviews(&self) -> RepoResult<Vec<Review>> {
        let mut stmt = self
            .uow
            .connection()
            .prepare(&format!("{REVIEW_SELECT_SQL} ORDER BY id ASC;"))?;
        let reviews = stmt
            .query_map([], parse_review_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>> {
        let review = self
            .uow
            .connection()
            .query_row(
                &format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_review_row,
            )
            .optional()?;
        Ok(review)
    }

    fn create_review(&self, review: &mut Review) -> RepoResult<bool> {
        ensure_reference(self.uow, EntityKind::Pokemon, review.pokemon_id)?;

        let key = self.uow.stage(StagedWrite::InsertReview(review.clone()));
        let outcome = self.uow.save()?;
        if let Some(id) = outcome.assigned_id(key) {
            review.id = id;
        }
        Ok(outcome.has_changes())
    }

    fn delete_review(&self, review: &Review) -> RepoResult<bool> {
        self.uow.stage(StagedWrite::RemoveReview(review.id));
        save_changes(self.uow)
    }

    fn save(&self) -> RepoResult<bool> {
        save_changes(self.uow)
    }
}

fn parse_review_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get("id")?,
        title: row.get("title")?,
        text: row.get("text")?,
        rating: row.get("rating")?,
        pokemon_id: row.get("pokemon_id")?,
    })
}
