//! Pokemon repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create pokemon together with their owner and category join records.
//! - Replace join records on update.
//! - Aggregate review ratings.
//!
//! # Invariants
//! - Create and update verify referenced owners/categories before staging,
//!   so no dangling join record is ever written.
//! - Update stages nothing unless both existing join records are found.
//! - Every mutation commits once; all staged rows land together or not at all.
//! - Lists are ordered by `id ASC`.

use crate::db::{PokemonKey, StagedWrite, UnitOfWork};
use crate::model::category::{Category, CategoryId};
use crate::model::join::{PokemonCategory, PokemonOwner};
use crate::model::owner::OwnerId;
use crate::model::pokemon::{Pokemon, PokemonId};
use crate::model::EntityKind;
use crate::repo::category_repo::parse_category_row;
use crate::repo::{
    ensure_reference, ensure_schema_current, exists_by_id, save_changes, RepoError, RepoResult,
};
use log::{debug, warn};
use rust_decimal::Decimal;
use rusqlite::{Connection, OptionalExtension, Row};

pub(crate) const POKEMON_SELECT_SQL: &str = "SELECT
    p.id AS id,
    p.name AS name,
    p.birth_date AS birth_date
FROM pokemon p";

/// Relations to load together with a pokemon read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PokemonFetch {
    /// Load categories through `pokemon_categories` in the same read.
    pub with_categories: bool,
}

impl PokemonFetch {
    /// Entity columns only; `Pokemon::categories` stays `None`.
    pub const PLAIN: Self = Self {
        with_categories: false,
    };
    pub const WITH_CATEGORIES: Self = Self {
        with_categories: true,
    };
}

/// Repository interface for pokemon operations.
pub trait PokemonRepository {
    /// Inserts the pokemon plus one owner and one category join record,
    /// writing the assigned id back into `pokemon`.
    ///
    /// # Errors
    /// - `ReferenceNotFound` when the owner or category does not exist.
    fn create_pokemon(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
        pokemon: &mut Pokemon,
    ) -> RepoResult<bool>;
    /// Replaces the owner and category join records and updates fields.
    ///
    /// Returns `Ok(false)` without changes when either existing join record
    /// is missing.
    ///
    /// # Errors
    /// - `ReferenceNotFound` when the target owner or category does not exist.
    fn update_pokemon(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
        pokemon: &Pokemon,
    ) -> RepoResult<bool>;
    /// Removes a previously fetched pokemon. Its reviews must be gone already.
    fn delete_pokemon(&self, pokemon: &Pokemon) -> RepoResult<bool>;
    /// Loads one pokemon with its categories.
    fn get_pokemon(&self, id: PokemonId) -> RepoResult<Option<Pokemon>>;
    fn get_pokemon_with(&self, id: PokemonId, fetch: PokemonFetch) -> RepoResult<Option<Pokemon>>;
    /// First pokemon (lowest id) whose name matches exactly.
    fn get_pokemon_by_name(&self, name: &str) -> RepoResult<Option<Pokemon>>;
    /// All pokemon with categories, ordered by id.
    fn get_pokemons(&self) -> RepoResult<Vec<Pokemon>>;
    fn get_pokemons_with(&self, fetch: PokemonFetch) -> RepoResult<Vec<Pokemon>>;
    fn pokemon_exists(&self, id: PokemonId) -> RepoResult<bool>;
    /// Average review rating; exactly zero when there are no reviews.
    fn get_pokemon_rating(&self, id: PokemonId) -> RepoResult<Decimal>;
    fn save(&self) -> RepoResult<bool>;
}

/// SQLite-backed pokemon repository.
pub struct SqlitePokemonRepository<'uow> {
    uow: &'uow UnitOfWork,
}

impl<'uow> SqlitePokemonRepository<'uow> {
    pub fn new(uow: &'uow UnitOfWork) -> Self {
        Self { uow }
    }

    /// Like [`Self::new`], but first confirms the schema is current.
    pub fn try_new(uow: &'uow UnitOfWork) -> RepoResult<Self> {
        ensure_schema_current(uow)?;
        Ok(Self::new(uow))
    }

    fn find_owner_join(&self, pokemon_id: PokemonId) -> RepoResult<Option<PokemonOwner>> {
        let join = self
            .uow
            .connection()
            .query_row(
                "SELECT pokemon_id, owner_id
                 FROM pokemon_owners
                 WHERE pokemon_id = ?1
                 ORDER BY owner_id ASC
                 LIMIT 1;",
                [pokemon_id],
                |row| {
                    Ok(PokemonOwner {
                        pokemon_id: row.get(0)?,
                        owner_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(join)
    }

    fn find_category_join(&self, pokemon_id: PokemonId) -> RepoResult<Option<PokemonCategory>> {
        let join = self
            .uow
            .connection()
            .query_row(
                "SELECT pokemon_id, category_id
                 FROM pokemon_categories
                 WHERE pokemon_id = ?1
                 ORDER BY category_id ASC
                 LIMIT 1;",
                [pokemon_id],
                |row| {
                    Ok(PokemonCategory {
                        pokemon_id: row.get(0)?,
                        category_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(join)
    }

    fn attach_categories(&self, pokemon: &mut Pokemon) -> RepoResult<()> {
        pokemon.categories = Some(load_categories_for_pokemon(
            self.uow.connection(),
            pokemon.id,
        )?);
        Ok(())
    }
}

impl PokemonRepository for SqlitePokemonRepository<'_> {
    fn create_pokemon(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
        pokemon: &mut Pokemon,
    ) -> RepoResult<bool> {
        ensure_reference(self.uow, EntityKind::Owner, owner_id)?;
        ensure_reference(self.uow, EntityKind::Category, category_id)?;

        let key = self.uow.stage(StagedWrite::InsertPokemon(pokemon.clone()));
        self.uow.stage(StagedWrite::InsertPokemonOwner {
            pokemon: PokemonKey::Staged(key),
            owner_id,
        });
        self.uow.stage(StagedWrite::InsertPokemonCategory {
            pokemon: PokemonKey::Staged(key),
            category_id,
        });

        let outcome = self.uow.save()?;
        if let Some(id) = outcome.assigned_id(key) {
            pokemon.id = id;
            debug!(
                "event=pokemon_create module=repo status=ok pokemon_id={id} owner_id={owner_id} category_id={category_id}"
            );
        }
        Ok(outcome.has_changes())
    }

    fn update_pokemon(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
        pokemon: &Pokemon,
    ) -> RepoResult<bool> {
        let Some(old_owner) = self.find_owner_join(pokemon.id)? else {
            warn!(
                "event=pokemon_update module=repo status=rejected reason=owner_join_missing pokemon_id={}",
                pokemon.id
            );
            return Ok(false);
        };
        let Some(old_category) = self.find_category_join(pokemon.id)? else {
            warn!(
                "event=pokemon_update module=repo status=rejected reason=category_join_missing pokemon_id={}",
                pokemon.id
            );
            return Ok(false);
        };
        ensure_reference(self.uow, EntityKind::Owner, owner_id)?;
        ensure_reference(self.uow, EntityKind::Category, category_id)?;

        let target = PokemonKey::Id(pokemon.id);
        self.uow.stage(StagedWrite::RemovePokemonOwner(old_owner));
        self.uow.stage(StagedWrite::InsertPokemonOwner {
            pokemon: target,
            owner_id,
        });
        self.uow
            .stage(StagedWrite::RemovePokemonCategory(old_category));
        self.uow.stage(StagedWrite::InsertPokemonCategory {
            pokemon: target,
            category_id,
        });
        self.uow.stage(StagedWrite::UpdatePokemon(pokemon.clone()));

        save_changes(self.uow)
    }

    fn delete_pokemon(&self, pokemon: &Pokemon) -> RepoResult<bool> {
        self.uow.stage(StagedWrite::RemovePokemon(pokemon.id));
        save_changes(self.uow)
    }

    fn get_pokemon(&self, id: PokemonId) -> RepoResult<Option<Pokemon>> {
        self.get_pokemon_with(id, PokemonFetch::WITH_CATEGORIES)
    }

    fn get_pokemon_with(&self, id: PokemonId, fetch: PokemonFetch) -> RepoResult<Option<Pokemon>> {
        let found = self
            .uow
            .connection()
            .query_row(
                &format!("{POKEMON_SELECT_SQL} WHERE p.id = ?1;"),
                [id],
                parse_pokemon_row,
            )
            .optional()?;

        let Some(mut pokemon) = found else {
            return Ok(None);
        };
        if fetch.with_categories {
            self.attach_categories(&mut pokemon)?;
        }
        Ok(Some(pokemon))
    }

    fn get_pokemon_by_name(&self, name: &str) -> RepoResult<Option<Pokemon>> {
        let pokemon = self
            .uow
            .connection()
            .query_row(
                &format!("{POKEMON_SELECT_SQL} WHERE p.name = ?1 ORDER BY p.id ASC LIMIT 1;"),
                [name],
                parse_pokemon_row,
            )
            .optional()?;
        Ok(pokemon)
    }

    fn get_pokemons(&self) -> RepoResult<Vec<Pokemon>> {
        self.get_pokemons_with(PokemonFetch::WITH_CATEGORIES)
    }

    fn get_pokemons_with(&self, fetch: PokemonFetch) -> RepoResult<Vec<Pokemon>> {
        let mut stmt = self
            .uow
            .connection()
            .prepare(&format!("{POKEMON_SELECT_SQL} ORDER BY p.id ASC;"))?;
        let mut pokemon = stmt
            .query_map([], parse_pokemon_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if fetch.with_categories {
            for item in &mut pokemon {
                self.attach_categories(item)?;
            }
        }
        Ok(pokemon)
    }

    fn pokemon_exists(&self, id: PokemonId) -> RepoResult<bool> {
        exists_by_id(
            self.uow,
            "SELECT EXISTS(SELECT 1 FROM pokemon WHERE id = ?1);",
            id,
        )
    }

    fn get_pokemon_rating(&self, id: PokemonId) -> RepoResult<Decimal> {
        // Count and sum come from one statement, so both see the same rows.
        let (count, sum): (i64, i64) = self.uow.connection().query_row(
            "SELECT COUNT(*), COALESCE(SUM(rating), 0)
             FROM reviews
             WHERE pokemon_id = ?1;",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        average_rating(sum, count)
    }

    fn save(&self) -> RepoResult<bool> {
        save_changes(self.uow)
    }
}

/// Exact decimal mean of `count` ratings summing to `sum`; zero for no ratings.
pub fn average_rating(sum: i64, count: i64) -> RepoResult<Decimal> {
    if count <= 0 {
        return Ok(Decimal::ZERO);
    }
    Decimal::from(sum)
        .checked_div(Decimal::from(count))
        .ok_or_else(|| RepoError::InvalidData(format!("rating average overflow: {sum}/{count}")))
}

pub(crate) fn parse_pokemon_row(row: &Row<'_>) -> rusqlite::Result<Pokemon> {
    Ok(Pokemon {
        id: row.get("id")?,
        name: row.get("name")?,
        birth_date: row.get("birth_date")?,
        categories: None,
    })
}

fn load_categories_for_pokemon(
    conn: &Connection,
    pokemon_id: PokemonId,
) -> RepoResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT c.id AS id, c.name AS name
         FROM pokemon_categories pc
         INNER JOIN categories c ON c.id = pc.category_id
         WHERE pc.pokemon_id = ?1
         ORDER BY c.id ASC;",
    )?;
    let categories = stmt
        .query_map([pokemon_id], parse_category_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}
