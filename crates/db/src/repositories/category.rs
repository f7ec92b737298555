//! Category repository.

use std::sync::Arc;

use crate::entities::{Category, category};
use crate::{map_delete_err, map_write_err};
use quire_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a category by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<category::Model>> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a category by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<category::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::CategoryNotFound(slug.to_string()))
    }

    /// Check whether a category slug is taken.
    pub async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let count = Category::find()
            .filter(category::Column::Slug.eq(slug))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Load every category, ordered by title.
    pub async fn find_all(&self) -> AppResult<Vec<category::Model>> {
        Category::find()
            .order_by_asc(category::Column::Title)
            .order_by_asc(category::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Direct children of a category, ordered by title.
    pub async fn find_children(&self, parent_id: &str) -> AppResult<Vec<category::Model>> {
        Category::find()
            .filter(category::Column::ParentId.eq(parent_id))
            .order_by_asc(category::Column::Title)
            .order_by_asc(category::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new category.
    pub async fn create(&self, model: category::ActiveModel) -> AppResult<category::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(e, "Category"))
    }

    /// Delete a category. Descendants are removed by the `ON DELETE CASCADE`
    /// parent key; an article filed anywhere in the subtree makes this a
    /// [`AppError::Conflict`].
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if let Some(c) = self.find_by_id(id).await? {
            c.delete(self.db.as_ref())
                .await
                .map_err(|e| map_delete_err(e, "Category"))?;
        }
        Ok(())
    }
}
