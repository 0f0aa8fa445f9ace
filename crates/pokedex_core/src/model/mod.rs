//! Catalog domain model.
//!
//! # Responsibility
//! - Define the four catalog entities and the two join records.
//! - Keep identity types explicit in repository signatures.
//!
//! # Invariants
//! - An id of `0` means "not yet assigned"; persisted rows always carry a
//!   positive id.
//! - A Pokemon has at most one live join record per relation kind.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod category;
pub mod join;
pub mod owner;
pub mod pokemon;
pub mod review;

/// Id value carried by entities that have not been persisted yet.
pub const UNASSIGNED_ID: i64 = 0;

/// Entity kinds addressable by id, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Owner,
    Pokemon,
    Review,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Category => "category",
            Self::Owner => "owner",
            Self::Pokemon => "pokemon",
            Self::Review => "review",
        };
        f.write_str(name)
    }
}
