//! Owner repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Owners still linked through `pokemon_owners` cannot be deleted; the
//!   commit fails with a foreign key error.

use crate::db::{StagedWrite, UnitOfWork};
use crate::model::owner::{Owner, OwnerId};
use crate::model::pokemon::{Pokemon, PokemonId};
use crate::repo::pokemon_repo::{parse_pokemon_row, POKEMON_SELECT_SQL};
use crate::repo::{ensure_schema_current, exists_by_id, save_changes, RepoResult};
use rusqlite::{OptionalExtension, Row};

const OWNER_SELECT_SQL: &str = "SELECT
    o.id AS id,
    o.first_name AS first_name,
    o.last_name AS last_name,
    o.gym AS gym
FROM owners o";

/// Repository interface for owner operations.
pub trait OwnerRepository {
    fn owner_exists(&self, id: OwnerId) -> RepoResult<bool>;
    fn get_owners(&self) -> RepoResult<Vec<Owner>>;
    fn get_owner(&self, id: OwnerId) -> RepoResult<Option<Owner>>;
    /// Owner currently linked to the pokemon, if any.
    fn get_owner_of_pokemon(&self, pokemon_id: PokemonId) -> RepoResult<Option<Owner>>;
    fn get_pokemon_by_owner(&self, owner_id: OwnerId) -> RepoResult<Vec<Pokemon>>;
    /// Inserts the owner and writes the assigned id back into it.
    fn create_owner(&self, owner: &mut Owner) -> RepoResult<bool>;
    fn update_owner(&self, owner: &Owner) -> RepoResult<bool>;
    fn delete_owner(&self, owner: &Owner) -> RepoResult<bool>;
    fn save(&self) -> RepoResult<bool>;
}

/// SQLite-backed owner repository.
pub struct SqliteOwnerRepository<'uow> {
    uow: &'uow UnitOfWork,
}

impl<'uow> SqliteOwnerRepository<'uow> {
    pub fn new(uow: &'uow UnitOfWork) -> Self {
        Self { uow }
    }

    /// Like [`Self::new`], but first confirms the schema is current.
    pub fn try_new(uow: &'uow UnitOfWork) -> RepoResult<Self> {
        ensure_schema_current(uow)?;
        Ok(Self::new(uow))
    }
}

impl OwnerRepository for SqliteOwnerRepository<'_> {
    fn owner_exists(&self, id: OwnerId) -> RepoResult<bool> {
        exists_by_id(
            self.uow,
            "SELECT EXISTS(SELECT 1 FROM owners WHERE id = ?1);",
            id,
        )
    }

    fn get_owners(&self) -> RepoResult<Vec<Owner>> {
        let mut stmt = self
            .uow
            .connection()
            .prepare(&format!("{OWNER_SELECT_SQL} ORDER BY o.id ASC;"))?;
        let owners = stmt
            .query_map([], parse_owner_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(owners)
    }

    fn get_owner(&self, id: OwnerId) -> RepoResult<Option<Owner>> {
        let owner = self
            .uow
            .connection()
            .query_row(
                &format!("{OWNER_SELECT_SQL} WHERE o.id = ?1;"),
                [id],
                parse_owner_row,
            )
            .optional()?;
        Ok(owner)
    }

    fn get_owner_of_pokemon(&self, pokemon_id: PokemonId) -> RepoResult<Option<Owner>> {
        let owner = self
            .uow
            .connection()
            .query_row(
                &format!(
                    "{OWNER_SELECT_SQL}
                     INNER JOIN pokemon_owners po ON po.owner_id = o.id
                     WHERE po.pokemon_id = ?1
                     ORDER BY o.id ASC
                     LIMIT 1;"
                ),
                [pokemon_id],
                parse_owner_row,
            )
            .optional()?;
        Ok(owner)
    }

    fn get_pokemon_by_owner(&self, owner_id: OwnerId) -> RepoResult<Vec<Pokemon>> {
        let mut stmt = self.uow.connection().prepare(&format!(
            "{POKEMON_SELECT_SQL}
             INNER JOIN pokemon_owners po ON po.pokemon_id = p.id
             WHERE po.owner_id = ?1
             ORDER BY p.id ASC;"
        ))?;
        let pokemon = stmt
            .query_map([owner_id], parse_pokemon_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pokemon)
    }

    fn create_owner(&self, owner: &mut Owner) -> RepoResult<bool> {
        let key = self.uow.stage(StagedWrite::InsertOwner(owner.clone()));
        let outcome = self.uow.save()?;
        if let Some(id) = outcome.assigned_id(key) {
            owner.id = id;
        }
        Ok(outcome.has_changes())
    }

    fn update_owner(&self, owner: &Owner) -> RepoResult<bool> {
        self.uow.stage(StagedWrite::UpdateOwner(owner.clone()));
        save_changes(self.uow)
    }

    fn delete_owner(&self, owner: &Owner) -> RepoResult<bool> {
        self.uow.stage(StagedWrite::RemoveOwner(owner.id));
        save_changes(self.uow)
    }

    fn save(&self) -> RepoResult<bool> {
        save_changes(self.uow)
    }
}

fn parse_owner_row(row: &Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        gym: row.get("gym")?,
    })
}
