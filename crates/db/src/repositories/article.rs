//! Article repository.

use std::sync::Arc;

use crate::entities::{Article, Comment, article, comment};
use crate::map_write_err;
use quire_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, sea_query::Expr,
};

/// Article repository for database operations.
#[derive(Clone)]
pub struct ArticleRepository {
    db: Arc<DatabaseConnection>,
}

/// Published articles in listing order: pinned first, then newest first.
fn published() -> Select<Article> {
    Article::find()
        .filter(article::Column::Status.eq(article::Status::Published))
        .order_by_desc(article::Column::Fixed)
        .order_by_desc(article::Column::CreatedAt)
        .order_by_desc(article::Column::Id)
}

impl ArticleRepository {
    /// Create a new article repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an article by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<article::Model>> {
        Article::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an article by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<article::Model>> {
        Article::find()
            .filter(article::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an article by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<article::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::ArticleNotFound(slug.to_string()))
    }

    /// Check whether an article slug is taken.
    pub async fn slug_exists(&self, slug: &str) -> AppResult<bool> {
        let count = Article::find()
            .filter(article::Column::Slug.eq(slug))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new article.
    pub async fn create(&self, model: article::ActiveModel) -> AppResult<article::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(e, "Article"))
    }

    /// Update an article.
    pub async fn update(&self, model: article::ActiveModel) -> AppResult<article::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(e, "Article"))
    }

    /// Increment the view counter atomically (single UPDATE query, no fetch).
    pub async fn increment_views(&self, id: &str) -> AppResult<()> {
        Article::update_many()
            .col_expr(
                article::Column::Views,
                Expr::col(article::Column::Views).add(1),
            )
            .filter(article::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Published articles, paginated.
    pub async fn find_published(&self, page: PageRequest) -> AppResult<Vec<article::Model>> {
        published()
            .offset(page.offset())
            .limit(page.per_page())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count published articles.
    pub async fn count_published(&self) -> AppResult<u64> {
        Article::find()
            .filter(article::Column::Status.eq(article::Status::Published))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Published articles whose category is one of `category_ids`, paginated.
    pub async fn find_published_in_categories(
        &self,
        category_ids: &[String],
        page: PageRequest,
    ) -> AppResult<Vec<article::Model>> {
        if category_ids.is_empty() {
            return Ok(vec![]);
        }

        published()
            .filter(article::Column::CategoryId.is_in(category_ids.to_vec()))
            .offset(page.offset())
            .limit(page.per_page())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count published articles whose category is one of `category_ids`.
    pub async fn count_published_in_categories(&self, category_ids: &[String]) -> AppResult<u64> {
        if category_ids.is_empty() {
            return Ok(0);
        }

        Article::find()
            .filter(article::Column::Status.eq(article::Status::Published))
            .filter(article::Column::CategoryId.is_in(category_ids.to_vec()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count articles of any status referencing one of `category_ids`.
    pub async fn count_in_categories(&self, category_ids: &[String]) -> AppResult<u64> {
        if category_ids.is_empty() {
            return Ok(0);
        }

        Article::find()
            .filter(article::Column::CategoryId.is_in(category_ids.to_vec()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Published articles by an author, paginated.
    pub async fn find_published_by_author(
        &self,
        author_id: &str,
        page: PageRequest,
    ) -> AppResult<Vec<article::Model>> {
        published()
            .filter(article::Column::AuthorId.eq(author_id))
            .offset(page.offset())
            .limit(page.per_page())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count published articles by an author.
    pub async fn count_published_by_author(&self, author_id: &str) -> AppResult<u64> {
        Article::find()
            .filter(article::Column::Status.eq(article::Status::Published))
            .filter(article::Column::AuthorId.eq(author_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Published articles with the most views.
    pub async fn find_most_viewed(&self, limit: u64) -> AppResult<Vec<article::Model>> {
        Article::find()
            .filter(article::Column::Status.eq(article::Status::Published))
            .order_by_desc(article::Column::Views)
            .order_by_desc(article::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Published articles with at least one comment, most commented first.
    pub async fn find_most_commented(
        &self,
        limit: u64,
    ) -> AppResult<Vec<(article::Model, i64)>> {
        let totals: Vec<(String, i64)> = Comment::find()
            .select_only()
            .column(comment::Column::ArticleId)
            .column_as(comment::Column::Id.count(), "total")
            .inner_join(Article)
            .filter(article::Column::Status.eq(article::Status::Published))
            .group_by(comment::Column::ArticleId)
            .order_by_desc(Expr::cust("total"))
            .order_by_asc(comment::Column::ArticleId)
            .limit(limit)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if totals.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = totals.iter().map(|(id, _)| id.clone()).collect();
        let mut articles = Article::find()
            .filter(article::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(totals
            .into_iter()
            .filter_map(|(id, total)| {
                let pos = articles.iter().position(|a| a.id == id)?;
                Some((articles.swap_remove(pos), total))
            })
            .collect())
    }
}
