//! Category use-case service.
//!
//! # Invariants
//! - Category names are unique after `normalize_name`.
//! - A category is only deleted when no pokemon links to it.

use crate::model::category::{Category, CategoryId};
use crate::model::pokemon::Pokemon;
use crate::model::EntityKind;
use crate::repo::category_repo::CategoryRepository;
use crate::service::{normalize_name, require_write, ServiceError, ServiceResult};
use log::info;

/// Use-case service wrapper for category operations.
pub struct CategoryService<C: CategoryRepository> {
    repo: C,
}

impl<C: CategoryRepository> CategoryService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    pub fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.repo.get_categories()?)
    }

    pub fn get_category(&self, id: CategoryId) -> ServiceResult<Category> {
        self.repo
            .get_category(id)?
            .ok_or(ServiceError::NotFound {
                kind: EntityKind::Category,
                id,
            })
    }

    /// Lists pokemon of an existing category.
    pub fn pokemon_of_category(&self, id: CategoryId) -> ServiceResult<Vec<Pokemon>> {
        self.ensure_exists(id)?;
        Ok(self.repo.get_pokemon_by_category(id)?)
    }

    /// Creates a category after rejecting blank and duplicate names.
    ///
    /// The stored name keeps the caller's casing, trimmed.
    pub fn create_category(&self, name: &str) -> ServiceResult<Category> {
        let normalized = normalize_name(name).ok_or(ServiceError::InvalidName)?;
        self.ensure_name_available(&normalized, None)?;

        let mut category = Category::new(name.trim());
        require_write(self.repo.create_category(&mut category)?, "category create")?;
        info!(
            "event=category_create module=service status=ok category_id={}",
            category.id
        );
        Ok(category)
    }

    pub fn update_category(&self, category: &Category) -> ServiceResult<()> {
        self.ensure_exists(category.id)?;
        let normalized = normalize_name(&category.name).ok_or(ServiceError::InvalidName)?;
        self.ensure_name_available(&normalized, Some(category.id))?;
        require_write(self.repo.update_category(category)?, "category update")
    }

    /// Deletes a category that no pokemon references anymore.
    pub fn delete_category(&self, id: CategoryId) -> ServiceResult<()> {
        let category = self.get_category(id)?;
        if !self.repo.get_pokemon_by_category(id)?.is_empty() {
            return Err(ServiceError::InUse {
                kind: EntityKind::Category,
                id,
            });
        }
        require_write(self.repo.delete_category(&category)?, "category delete")?;
        info!("event=category_delete module=service status=ok category_id={id}");
        Ok(())
    }

    fn ensure_exists(&self, id: CategoryId) -> ServiceResult<()> {
        if self.repo.category_exists(id)? {
            Ok(())
        } else {
            Err(ServiceError::NotFound {
                kind: EntityKind::Category,
                id,
            })
        }
    }

    fn ensure_name_available(
        &self,
        normalized: &str,
        except: Option<CategoryId>,
    ) -> ServiceResult<()> {
        let taken = self.repo.get_categories()?.into_iter().find(|existing| {
            Some(existing.id) != except
                && normalize_name(&existing.name).as_deref() == Some(normalized)
        });
        match taken {
            Some(existing) => Err(ServiceError::DuplicateName {
                kind: EntityKind::Category,
                name: existing.name,
            }),
            None => Ok(()),
        }
    }
}
