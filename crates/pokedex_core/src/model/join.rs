//! Join records for the pokemon many-to-many relations.
//!
//! # Invariants
//! - Both ends of a join record reference persisted entities.
//! - A relation change removes the old record before adding the new one.

use super::category::CategoryId;
use super::owner::OwnerId;
use super::pokemon::PokemonId;
use serde::{Deserialize, Serialize};

/// Links one pokemon to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PokemonCategory {
    pub pokemon_id: PokemonId,
    pub category_id: CategoryId,
}

/// Links one pokemon to one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PokemonOwner {
    pub pokemon_id: PokemonId,
    pub owner_id: OwnerId,
}
