//! Article service.

use chrono::Utc;
use quire_common::{AppError, AppResult, IdGenerator, Page, PageRequest};
use quire_db::{
    entities::article::{self, Status},
    repositories::{ArticleRepository, CategoryRepository, RatingRepository, UserRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::slug::assign_unique_slug;

/// Thumbnail used when an article is created without one.
const DEFAULT_THUMBNAIL: &str = "default.jpg";

/// Article service for business logic.
#[derive(Clone)]
pub struct ArticleService {
    article_repo: ArticleRepository,
    category_repo: CategoryRepository,
    user_repo: UserRepository,
    rating_repo: RatingRepository,
    id_gen: IdGenerator,
    popular_limit: u64,
}

/// Input for creating an article.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 500))]
    pub description: String,

    #[validate(length(min = 1))]
    pub text: String,

    #[validate(length(min = 1, max = 255))]
    pub thumbnail: Option<String>,

    pub status: Option<Status>,

    /// Slug of the category to file the article under.
    pub category: String,

    pub fixed: Option<bool>,
}

/// Input for editing an article. Absent fields are left untouched; the slug
/// never changes.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    #[validate(length(min = 1))]
    pub text: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub thumbnail: Option<String>,

    pub status: Option<Status>,

    pub category: Option<String>,

    pub fixed: Option<bool>,
}

/// An article page: the article after counting this view, and its score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    pub article: article::Model,
    pub rating_sum: i64,
}

/// An article with its comment count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentedArticle {
    pub article: article::Model,
    pub comment_count: i64,
}

impl ArticleService {
    /// Create a new article service.
    #[must_use]
    pub const fn new(
        article_repo: ArticleRepository,
        category_repo: CategoryRepository,
        user_repo: UserRepository,
        rating_repo: RatingRepository,
        popular_limit: u64,
    ) -> Self {
        Self {
            article_repo,
            category_repo,
            user_repo,
            rating_repo,
            id_gen: IdGenerator::new(),
            popular_limit,
        }
    }

    async fn resolve_category(&self, slug: &str) -> AppResult<String> {
        self.category_repo
            .find_by_slug(slug)
            .await?
            .map(|c| c.id)
            .ok_or_else(|| AppError::Validation(format!("category {slug} does not exist")))
    }

    /// Create an article authored by `author_id`.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateArticleInput,
    ) -> AppResult<article::Model> {
        input.validate()?;

        let category_id = self.resolve_category(&input.category).await?;

        let repo = &self.article_repo;
        let slug = assign_unique_slug(None, &input.title, |candidate| async move {
            repo.slug_exists(&candidate).await
        })
        .await?;

        let model = article::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            slug: Set(slug),
            description: Set(input.description),
            text: Set(input.text),
            thumbnail: Set(input
                .thumbnail
                .unwrap_or_else(|| DEFAULT_THUMBNAIL.to_string())),
            status: Set(input.status.unwrap_or(Status::Published)),
            category_id: Set(category_id),
            author_id: Set(author_id.to_string()),
            updater_id: Set(None),
            fixed: Set(input.fixed.unwrap_or(false)),
            views: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let article = self.article_repo.create(model).await?;
        tracing::info!(article_id = %article.id, slug = %article.slug, "Created article");
        Ok(article)
    }

    /// Show an article, counting the view.
    ///
    /// Drafts are only visible to their author.
    pub async fn view(&self, slug: &str, viewer_id: Option<&str>) -> AppResult<ArticleDetail> {
        let mut article = self.article_repo.get_by_slug(slug).await?;
        if article.status == Status::Draft && viewer_id != Some(article.author_id.as_str()) {
            return Err(AppError::ArticleNotFound(slug.to_string()));
        }

        self.article_repo.increment_views(&article.id).await?;
        article.views += 1;

        let rating_sum = self.rating_repo.rating_sum(&article.id).await?;

        Ok(ArticleDetail {
            article,
            rating_sum,
        })
    }

    /// Edit an article. Only its author may do so; the editor is recorded as
    /// the updater.
    pub async fn update(
        &self,
        user_id: &str,
        slug: &str,
        input: UpdateArticleInput,
    ) -> AppResult<article::Model> {
        input.validate()?;

        let article = self.article_repo.get_by_slug(slug).await?;
        if article.author_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can edit this article".to_string(),
            ));
        }

        let category_id = match input.category.as_deref() {
            Some(category) => Some(self.resolve_category(category).await?),
            None => None,
        };

        let mut active = article.into_active_model();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(text) = input.text {
            active.text = Set(text);
        }
        if let Some(thumbnail) = input.thumbnail {
            active.thumbnail = Set(thumbnail);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(category_id) = category_id {
            active.category_id = Set(category_id);
        }
        if let Some(fixed) = input.fixed {
            active.fixed = Set(fixed);
        }
        active.updater_id = Set(Some(user_id.to_string()));
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.article_repo.update(active).await?;
        tracing::info!(article_id = %updated.id, updater = %user_id, "Updated article");
        Ok(updated)
    }

    /// Published articles, pinned first, then newest first.
    pub async fn list(&self, page: PageRequest) -> AppResult<Page<article::Model>> {
        let total = self.article_repo.count_published().await?;
        let items = self.article_repo.find_published(page).await?;
        Ok(Page::new(items, page, total))
    }

    /// Published articles of the user with profile slug `author_slug`.
    pub async fn by_author(
        &self,
        author_slug: &str,
        page: PageRequest,
    ) -> AppResult<Page<article::Model>> {
        let author = self.user_repo.get_by_slug(author_slug).await?;
        let total = self.article_repo.count_published_by_author(&author.id).await?;
        let items = self
            .article_repo
            .find_published_by_author(&author.id, page)
            .await?;
        Ok(Page::new(items, page, total))
    }

    /// Most viewed published articles.
    pub async fn popular(&self) -> AppResult<Vec<article::Model>> {
        self.article_repo.find_most_viewed(self.popular_limit).await
    }

    /// Published articles with the most comments. Uncommented articles are
    /// left out.
    pub async fn most_commented(&self) -> AppResult<Vec<CommentedArticle>> {
        Ok(self
            .article_repo
            .find_most_commented(self.popular_limit)
            .await?
            .into_iter()
            .map(|(article, comment_count)| CommentedArticle {
                article,
                comment_count,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quire_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn count_row(n: i64) -> [BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    fn empty() -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres).into_connection()
    }

    fn service(
        article_db: DatabaseConnection,
        category_db: DatabaseConnection,
        user_db: DatabaseConnection,
        rating_db: DatabaseConnection,
    ) -> ArticleService {
        ArticleService::new(
            ArticleRepository::new(Arc::new(article_db)),
            CategoryRepository::new(Arc::new(category_db)),
            UserRepository::new(Arc::new(user_db)),
            RatingRepository::new(Arc::new(rating_db)),
            5,
        )
    }

    fn create_input(title: &str, category: &str) -> CreateArticleInput {
        CreateArticleInput {
            title: title.to_string(),
            description: "About things".to_string(),
            text: "Body".to_string(),
            thumbnail: None,
            status: None,
            category: category.to_string(),
            fixed: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_colliding_title_gets_suffix() {
        let mut created = fixtures::article("a2", "hello-world-0badf00d", "c1", "u1");
        created.title = "Hello World".to_string();

        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(1)])
            .append_query_results([count_row(0)])
            .append_query_results([[created]])
            .into_connection();
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::category("c1", "Rust", None)]])
            .into_connection();

        let article = service(article_db, category_db, empty(), empty())
            .create("u1", create_input("Hello World", "rust"))
            .await
            .unwrap();

        assert!(article.slug.starts_with("hello-world-"));
    }

    #[tokio::test]
    async fn test_create_with_unknown_category() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<quire_db::entities::category::Model>::new()])
            .into_connection();

        let result = service(empty(), category_db, empty(), empty())
            .create("u1", create_input("Hello", "ghost"))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_with_symbol_only_title() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::category("c1", "Rust", None)]])
            .into_connection();

        let result = service(empty(), category_db, empty(), empty())
            .create("u1", create_input("?!", "rust"))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_view_counts_and_reports_rating() {
        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::article("a1", "hello", "c1", "u1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let rating_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "sum" => sea_orm::Value::BigInt(Some(3))
            }]])
            .into_connection();

        let detail = service(article_db, empty(), empty(), rating_db)
            .view("hello", None)
            .await
            .unwrap();

        assert_eq!(detail.article.views, 1);
        assert_eq!(detail.rating_sum, 3);
    }

    #[tokio::test]
    async fn test_draft_hidden_from_others() {
        let mut draft = fixtures::article("a1", "secret", "c1", "u1");
        draft.status = Status::Draft;

        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[draft]])
            .into_connection();

        let result = service(article_db, empty(), empty(), empty())
            .view("secret", Some("u2"))
            .await;

        assert!(matches!(result, Err(AppError::ArticleNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_by_non_author_is_forbidden() {
        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::article("a1", "hello", "c1", "u1")]])
            .into_connection();

        let result = service(article_db, empty(), empty(), empty())
            .update("u2", "hello", UpdateArticleInput::default())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_records_updater() {
        let mut updated = fixtures::article("a1", "hello", "c1", "u1");
        updated.title = "Hello again".to_string();
        updated.updater_id = Some("u1".to_string());

        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::article("a1", "hello", "c1", "u1")]])
            .append_query_results([[updated]])
            .into_connection();

        let article = service(article_db, empty(), empty(), empty())
            .update(
                "u1",
                "hello",
                UpdateArticleInput {
                    title: Some("Hello again".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(article.slug, "hello");
        assert_eq!(article.updater_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(17)])
            .append_query_results([[
                fixtures::article("a1", "one", "c1", "u1"),
                fixtures::article("a2", "two", "c1", "u1"),
            ]])
            .into_connection();

        let page = service(article_db, empty(), empty(), empty())
            .list(PageRequest::new(Some(3), Some(8), 8, 50))
            .await
            .unwrap();

        assert_eq!(page.page, 3);
        assert_eq!(page.total, 17);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_by_unknown_author() {
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<quire_db::entities::user::Model>::new()])
            .into_connection();

        let result = service(empty(), empty(), user_db, empty())
            .by_author("nobody", PageRequest::first(8))
            .await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }
}
