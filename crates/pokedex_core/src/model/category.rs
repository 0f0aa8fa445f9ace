//! Category entity.

use super::UNASSIGNED_ID;
use serde::{Deserialize, Serialize};

pub type CategoryId = i64;

/// Pokemon grouping such as "Electric" or "Water".
///
/// Name uniqueness is a caller concern; storage accepts duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Creates an unsaved category; storage assigns the id on insert.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(UNASSIGNED_ID, name)
    }

    pub fn with_id(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
