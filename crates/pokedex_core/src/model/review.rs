//! Review entity.

use super::pokemon::PokemonId;
use super::UNASSIGNED_ID;
use serde::{Deserialize, Serialize};

pub type ReviewId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Score aggregated by the pokemon rating query.
    pub rating: i32,
    /// Reviewed pokemon; must exist when the review is saved.
    pub pokemon_id: PokemonId,
}

impl Review {
    pub fn new(
        pokemon_id: PokemonId,
        title: impl Into<String>,
        text: impl Into<String>,
        rating: i32,
    ) -> Self {
        Self {
            id: UNASSIGNED_ID,
            title: title.into(),
            text: text.into(),
            rating,
            pokemon_id,
        }
    }
}
