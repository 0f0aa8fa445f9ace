//! Pokemon use-case service.
//!
//! # Responsibility
//! - Reject duplicate pokemon names before creation.
//! - Order the cross-repository delete: reviews first, then the pokemon.
//!
//! # Invariants
//! - Pokemon names are unique after `normalize_name`.
//! - A pokemon is never deleted while reviews still reference it.

use crate::model::category::CategoryId;
use crate::model::owner::OwnerId;
use crate::model::pokemon::{Pokemon, PokemonId};
use crate::model::EntityKind;
use crate::repo::pokemon_repo::{PokemonFetch, PokemonRepository};
use crate::repo::review_repo::ReviewRepository;
use crate::service::{normalize_name, require_write, ServiceError, ServiceResult};
use log::info;
use rust_decimal::Decimal;

/// Use-case service over the pokemon and review repositories.
pub struct PokemonService<P: PokemonRepository, R: ReviewRepository> {
    pokemon: P,
    reviews: R,
}

impl<P: PokemonRepository, R: ReviewRepository> PokemonService<P, R> {
    pub fn new(pokemon: P, reviews: R) -> Self {
        Self { pokemon, reviews }
    }

    /// All pokemon with categories, ordered by id.
    pub fn list_pokemon(&self) -> ServiceResult<Vec<Pokemon>> {
        Ok(self.pokemon.get_pokemons()?)
    }

    pub fn get_pokemon(&self, id: PokemonId) -> ServiceResult<Pokemon> {
        self.pokemon.get_pokemon(id)?.ok_or(not_found(id))
    }

    pub fn pokemon_rating(&self, id: PokemonId) -> ServiceResult<Decimal> {
        self.ensure_exists(id)?;
        Ok(self.pokemon.get_pokemon_rating(id)?)
    }

    /// Creates a pokemon linked to an owner and a category.
    ///
    /// # Errors
    /// - `InvalidName` / `DuplicateName` for blank or taken names.
    /// - `NotFound` when the owner or category does not exist.
    pub fn create_pokemon(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
        mut pokemon: Pokemon,
    ) -> ServiceResult<Pokemon> {
        let normalized = normalize_name(&pokemon.name).ok_or(ServiceError::InvalidName)?;
        let taken = self
            .pokemon
            .get_pokemons_with(PokemonFetch::PLAIN)?
            .into_iter()
            .find(|existing| {
                normalize_name(&existing.name).as_deref() == Some(normalized.as_str())
            });
        if let Some(existing) = taken {
            return Err(ServiceError::DuplicateName {
                kind: EntityKind::Pokemon,
                name: existing.name,
            });
        }

        require_write(
            self.pokemon
                .create_pokemon(owner_id, category_id, &mut pokemon)?,
            "pokemon create",
        )?;
        info!(
            "event=pokemon_create module=service status=ok pokemon_id={}",
            pokemon.id
        );
        Ok(pokemon)
    }

    /// Relinks owner/category and updates fields of an existing pokemon.
    pub fn update_pokemon(
        &self,
        owner_id: OwnerId,
        category_id: CategoryId,
        pokemon: &Pokemon,
    ) -> ServiceResult<()> {
        self.ensure_exists(pokemon.id)?;
        require_write(
            self.pokemon
                .update_pokemon(owner_id, category_id, pokemon)?,
            "pokemon update",
        )
    }

    /// Deletes the pokemon's reviews, then the pokemon.
    ///
    /// Join records are removed by the storage cascade.
    pub fn delete_pokemon(&self, id: PokemonId) -> ServiceResult<()> {
        self.ensure_exists(id)?;

        let reviews = self.reviews.get_reviews_of_a_pokemon(id)?;
        if !reviews.is_empty() {
            require_write(self.reviews.delete_reviews(&reviews)?, "review delete")?;
        }

        let pokemon = self
            .pokemon
            .get_pokemon_with(id, PokemonFetch::PLAIN)?
            .ok_or(not_found(id))?;
        require_write(self.pokemon.delete_pokemon(&pokemon)?, "pokemon delete")?;
        info!(
            "event=pokemon_delete module=service status=ok pokemon_id={id} reviews_removed={}",
            reviews.len()
        );
        Ok(())
    }

    fn ensure_exists(&self, id: PokemonId) -> ServiceResult<()> {
        if self.pokemon.pokemon_exists(id)? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}

fn not_found(id: PokemonId) -> ServiceError {
    ServiceError::NotFound {
        kind: EntityKind::Pokemon,
        id,
    }
}
