//! Core catalog logic for Pokedex.
//! This crate owns the relational invariants between pokemon, owners,
//! categories and reviews.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{DbError, DbLocation, UnitOfWork};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{Category, CategoryId};
pub use model::join::{PokemonCategory, PokemonOwner};
pub use model::owner::{Owner, OwnerId};
pub use model::pokemon::{Pokemon, PokemonId};
pub use model::review::{Review, ReviewId};
pub use model::EntityKind;
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::owner_repo::{OwnerRepository, SqliteOwnerRepository};
pub use repo::pokemon_repo::{PokemonFetch, PokemonRepository, SqlitePokemonRepository};
pub use repo::review_repo::{ReviewRepository, SqliteReviewRepository};
pub use repo::{RepoError, RepoResult};
pub use service::category_service::CategoryService;
pub use service::pokemon_service::PokemonService;
pub use service::{normalize_name, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
