//! Pokemon entity.
//!
//! # Invariants
//! - `categories` is `None` unless the read asked for eager loading, so an
//!   unloaded relation is never confused with an empty one.

use super::category::Category;
use super::UNASSIGNED_ID;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type PokemonId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: PokemonId,
    pub name: String,
    pub birth_date: NaiveDate,
    /// Categories linked through `pokemon_categories`, when eager-loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

impl Pokemon {
    /// Creates an unsaved pokemon; storage assigns the id on insert.
    pub fn new(name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self::with_id(UNASSIGNED_ID, name, birth_date)
    }

    pub fn with_id(id: PokemonId, name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            birth_date,
            categories: None,
        }
    }

    /// Returns whether category associations were loaded with this value.
    pub fn categories_loaded(&self) -> bool {
        self.categories.is_some()
    }
}
