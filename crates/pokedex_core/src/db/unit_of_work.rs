//! Unit of work over one SQLite connection.
//!
//! # Responsibility
//! - Own the connection shared by every repository.
//! - Queue staged entity and join-record writes.
//! - Commit the queue in one transaction and report affected rows.
//!
//! # Invariants
//! - `save` applies all staged writes or none of them.
//! - The queue is empty after `save` returns, whatever the outcome.
//! - Reads through [`UnitOfWork::connection`] never observe staged writes.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use crate::model::category::{Category, CategoryId};
use crate::model::join::{PokemonCategory, PokemonOwner};
use crate::model::owner::{Owner, OwnerId};
use crate::model::pokemon::{Pokemon, PokemonId};
use crate::model::review::{Review, ReviewId};
use crate::model::UNASSIGNED_ID;
use log::{debug, error};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Position of a write inside the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagedKey(usize);

impl StagedKey {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Pokemon end of a join record: either persisted, or inserted earlier in
/// the same commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PokemonKey {
    Id(PokemonId),
    Staged(StagedKey),
}

/// One pending write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedWrite {
    InsertCategory(Category),
    UpdateCategory(Category),
    RemoveCategory(CategoryId),
    InsertOwner(Owner),
    UpdateOwner(Owner),
    RemoveOwner(OwnerId),
    InsertPokemon(Pokemon),
    UpdatePokemon(Pokemon),
    RemovePokemon(PokemonId),
    InsertReview(Review),
    RemoveReview(ReviewId),
    InsertPokemonCategory {
        pokemon: PokemonKey,
        category_id: CategoryId,
    },
    RemovePokemonCategory(PokemonCategory),
    InsertPokemonOwner {
        pokemon: PokemonKey,
        owner_id: OwnerId,
    },
    RemovePokemonOwner(PokemonOwner),
}

impl StagedWrite {
    fn event_name(&self) -> &'static str {
        match self {
            Self::InsertCategory(_) => "insert_category",
            Self::UpdateCategory(_) => "update_category",
            Self::RemoveCategory(_) => "remove_category",
            Self::InsertOwner(_) => "insert_owner",
            Self::UpdateOwner(_) => "update_owner",
            Self::RemoveOwner(_) => "remove_owner",
            Self::InsertPokemon(_) => "insert_pokemon",
            Self::UpdatePokemon(_) => "update_pokemon",
            Self::RemovePokemon(_) => "remove_pokemon",
            Self::InsertReview(_) => "insert_review",
            Self::RemoveReview(_) => "remove_review",
            Self::InsertPokemonCategory { .. } => "insert_pokemon_category",
            Self::RemovePokemonCategory(_) => "remove_pokemon_category",
            Self::InsertPokemonOwner { .. } => "insert_pokemon_owner",
            Self::RemovePokemonOwner(_) => "remove_pokemon_owner",
        }
    }
}

/// Result of one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Rows changed by the staged statements (cascades not included).
    pub rows_affected: usize,
    assigned_ids: Vec<(StagedKey, i64)>,
}

impl SaveOutcome {
    /// Returns the row id produced by a staged insert.
    pub fn assigned_id(&self, key: StagedKey) -> Option<i64> {
        self.assigned_ids
            .iter()
            .find(|(staged, _)| *staged == key)
            .map(|(_, id)| *id)
    }

    /// Whether the commit changed at least one row.
    pub fn has_changes(&self) -> bool {
        self.rows_affected > 0
    }
}

/// Where the underlying database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private to this connection; cannot be reopened by another one.
    Memory,
}

/// Connection plus the queue of writes awaiting commit.
#[derive(Debug)]
pub struct UnitOfWork {
    conn: Connection,
    location: DbLocation,
    pending: RefCell<Vec<StagedWrite>>,
}

impl UnitOfWork {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_db(&path)?;
        Ok(Self::from_parts(conn, DbLocation::File(path)))
    }

    /// Opens a fresh, migrated in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self::from_parts(conn, DbLocation::Memory))
    }

    fn from_parts(conn: Connection, location: DbLocation) -> Self {
        Self {
            conn,
            location,
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Connection used for reads. Staged writes are not visible here.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    /// Queues one write and returns its key for later id resolution.
    pub fn stage(&self, write: StagedWrite) -> StagedKey {
        let mut pending = self.pending.borrow_mut();
        pending.push(write);
        StagedKey(pending.len() - 1)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Drops every staged write without touching the database.
    pub fn discard(&self) -> usize {
        let dropped = self.pending.borrow_mut().drain(..).count();
        if dropped > 0 {
            debug!("event=uow_discard module=db status=ok staged={dropped}");
        }
        dropped
    }

    /// Applies all staged writes in one immediate transaction.
    ///
    /// Returns zero affected rows when nothing was staged. On error the
    /// transaction rolls back and the staged writes are dropped.
    pub fn save(&self) -> DbResult<SaveOutcome> {
        let writes = std::mem::take(&mut *self.pending.borrow_mut());
        if writes.is_empty() {
            return Ok(SaveOutcome::default());
        }

        let started_at = Instant::now();
        match apply_writes(&self.conn, &writes) {
            Ok(outcome) => {
                debug!(
                    "event=uow_save module=db status=ok staged={} rows={} duration_ms={}",
                    writes.len(),
                    outcome.rows_affected,
                    started_at.elapsed().as_millis()
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    "event=uow_save module=db status=error staged={} duration_ms={} error={}",
                    writes.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn apply_writes(conn: &Connection, writes: &[StagedWrite]) -> DbResult<SaveOutcome> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let mut outcome = SaveOutcome::default();
    let mut inserted: Vec<Option<i64>> = Vec::with_capacity(writes.len());

    for (index, write) in writes.iter().enumerate() {
        let (changed, assigned) = apply_write(&tx, write, &inserted).map_err(|err| {
            debug!(
                "event=uow_write module=db status=error index={index} write={}",
                write.event_name()
            );
            err
        })?;
        outcome.rows_affected += changed;
        if let Some(id) = assigned {
            outcome.assigned_ids.push((StagedKey(index), id));
        }
        inserted.push(assigned);
    }

    tx.commit()?;
    Ok(outcome)
}

fn apply_write(
    tx: &Transaction<'_>,
    write: &StagedWrite,
    inserted: &[Option<i64>],
) -> DbResult<(usize, Option<i64>)> {
    let changed = match write {
        StagedWrite::InsertCategory(category) => {
            let changed = tx.execute(
                "INSERT INTO categories (id, name) VALUES (?1, ?2);",
                params![id_param(category.id), category.name.as_str()],
            )?;
            return Ok(with_row_id(tx, changed));
        }
        StagedWrite::UpdateCategory(category) => tx.execute(
            "UPDATE categories SET name = ?2 WHERE id = ?1;",
            params![category.id, category.name.as_str()],
        )?,
        StagedWrite::RemoveCategory(id) => {
            tx.execute("DELETE FROM categories WHERE id = ?1;", [id])?
        }
        StagedWrite::InsertOwner(owner) => {
            let changed = tx.execute(
                "INSERT INTO owners (id, first_name, last_name, gym) VALUES (?1, ?2, ?3, ?4);",
                params![
                    id_param(owner.id),
                    owner.first_name.as_str(),
                    owner.last_name.as_str(),
                    owner.gym.as_str(),
                ],
            )?;
            return Ok(with_row_id(tx, changed));
        }
        StagedWrite::UpdateOwner(owner) => tx.execute(
            "UPDATE owners
             SET first_name = ?2,
                 last_name = ?3,
                 gym = ?4
             WHERE id = ?1;",
            params![
                owner.id,
                owner.first_name.as_str(),
                owner.last_name.as_str(),
                owner.gym.as_str(),
            ],
        )?,
        StagedWrite::RemoveOwner(id) => tx.execute("DELETE FROM owners WHERE id = ?1;", [id])?,
        StagedWrite::InsertPokemon(pokemon) => {
            let changed = tx.execute(
                "INSERT INTO pokemon (id, name, birth_date) VALUES (?1, ?2, ?3);",
                params![
                    id_param(pokemon.id),
                    pokemon.name.as_str(),
                    pokemon.birth_date
                ],
            )?;
            return Ok(with_row_id(tx, changed));
        }
        StagedWrite::UpdatePokemon(pokemon) => tx.execute(
            "UPDATE pokemon
             SET name = ?2,
                 birth_date = ?3
             WHERE id = ?1;",
            params![pokemon.id, pokemon.name.as_str(), pokemon.birth_date],
        )?,
        StagedWrite::RemovePokemon(id) => tx.execute("DELETE FROM pokemon WHERE id = ?1;", [id])?,
        StagedWrite::InsertReview(review) => {
            let changed = tx.execute(
                "INSERT INTO reviews (id, title, text, rating, pokemon_id)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id_param(review.id),
                    review.title.as_str(),
                    review.text.as_str(),
                    review.rating,
                    review.pokemon_id,
                ],
            )?;
            return Ok(with_row_id(tx, changed));
        }
        StagedWrite::RemoveReview(id) => tx.execute("DELETE FROM reviews WHERE id = ?1;", [id])?,
        StagedWrite::InsertPokemonCategory {
            pokemon,
            category_id,
        } => tx.execute(
            "INSERT INTO pokemon_categories (pokemon_id, category_id) VALUES (?1, ?2);",
            params![resolve_pokemon(*pokemon, inserted)?, category_id],
        )?,
        StagedWrite::RemovePokemonCategory(join) => tx.execute(
            "DELETE FROM pokemon_categories WHERE pokemon_id = ?1 AND category_id = ?2;",
            params![join.pokemon_id, join.category_id],
        )?,
        StagedWrite::InsertPokemonOwner { pokemon, owner_id } => tx.execute(
            "INSERT INTO pokemon_owners (pokemon_id, owner_id) VALUES (?1, ?2);",
            params![resolve_pokemon(*pokemon, inserted)?, owner_id],
        )?,
        StagedWrite::RemovePokemonOwner(join) => tx.execute(
            "DELETE FROM pokemon_owners WHERE pokemon_id = ?1 AND owner_id = ?2;",
            params![join.pokemon_id, join.owner_id],
        )?,
    };

    Ok((changed, None))
}

fn with_row_id(tx: &Transaction<'_>, changed: usize) -> (usize, Option<i64>) {
    if changed == 0 {
        (0, None)
    } else {
        (changed, Some(tx.last_insert_rowid()))
    }
}

fn resolve_pokemon(key: PokemonKey, inserted: &[Option<i64>]) -> DbResult<PokemonId> {
    match key {
        PokemonKey::Id(id) => Ok(id),
        PokemonKey::Staged(staged) => inserted
            .get(staged.index())
            .copied()
            .flatten()
            .ok_or(DbError::UnresolvedStagedKey(staged)),
    }
}

/// Unassigned ids bind as NULL so SQLite allocates the row id.
fn id_param(id: i64) -> Option<i64> {
    (id != UNASSIGNED_ID).then_some(id)
}
