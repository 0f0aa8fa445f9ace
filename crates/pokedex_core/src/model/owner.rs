//! Owner entity.
//!
//! The catalog core only relies on owner identity; the remaining fields are
//! carried through for callers.

use super::UNASSIGNED_ID;
use serde::{Deserialize, Serialize};

pub type OwnerId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub first_name: String,
    pub last_name: String,
    /// Home gym name, empty when unknown.
    #[serde(default)]
    pub gym: String,
}

impl Owner {
    /// Creates an unsaved owner without a gym.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_ID,
            first_name: first_name.into(),
            last_name: last_name.into(),
            gym: String::new(),
        }
    }

    pub fn with_gym(mut self, gym: impl Into<String>) -> Self {
        self.gym = gym.into();
        self
    }
}
