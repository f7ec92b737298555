//! Category service.

use chrono::Utc;
use quire_common::{AppError, AppResult, IdGenerator, Page, PageRequest};
use quire_db::{
    entities::{article, category},
    repositories::{ArticleRepository, CategoryRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::slug::assign_unique_slug;
use crate::tree::Forest;

/// Category service for business logic.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    article_repo: ArticleRepository,
    id_gen: IdGenerator,
}

/// Input for creating a category.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(max = 2048))]
    pub description: Option<String>,

    /// Slug of the parent category; omitted for a top-level category.
    pub parent: Option<String>,
}

/// A category with its depth in the forest.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub depth: usize,
    #[serde(flatten)]
    pub category: category::Model,
}

/// A category with its direct children and its ancestors (root first).
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    pub category: category::Model,
    pub children: Vec<category::Model>,
    pub ancestors: Vec<category::Model>,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository, article_repo: ArticleRepository) -> Self {
        Self {
            category_repo,
            article_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Load every category into a forest.
    pub async fn forest(&self) -> AppResult<Forest<category::Model>> {
        let all = self.category_repo.find_all().await?;
        Ok(Forest::build(all)?)
    }

    /// Every category in pre-order with its depth.
    pub async fn list_tree(&self) -> AppResult<Vec<CategoryNode>> {
        let forest = self.forest().await?;
        Ok(forest
            .walk()
            .into_iter()
            .map(|(depth, category)| CategoryNode {
                depth,
                category: category.clone(),
            })
            .collect())
    }

    /// Create a category, optionally under an existing parent.
    pub async fn create(&self, input: CreateCategoryInput) -> AppResult<category::Model> {
        input.validate()?;

        let parent_id = match input.parent.as_deref() {
            None => None,
            Some(parent_slug) => {
                let parent = self
                    .category_repo
                    .find_by_slug(parent_slug)
                    .await?
                    .ok_or_else(|| {
                        AppError::Validation(format!("parent category {parent_slug} does not exist"))
                    })?;
                Some(parent.id)
            }
        };

        let repo = &self.category_repo;
        let slug = assign_unique_slug(None, &input.title, |candidate| async move {
            repo.slug_exists(&candidate).await
        })
        .await?;

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            slug: Set(slug),
            description: Set(input.description),
            parent_id: Set(parent_id),
            created_at: Set(Utc::now().into()),
        };

        let category = self.category_repo.create(model).await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Created category");
        Ok(category)
    }

    /// A category with its children and breadcrumbs.
    pub async fn detail(&self, slug: &str) -> AppResult<CategoryDetail> {
        let forest = self.forest().await?;
        let category = forest
            .walk()
            .into_iter()
            .map(|(_, c)| c)
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or_else(|| AppError::CategoryNotFound(slug.to_string()))?;

        let children = forest.children_of(&category.id).into_iter().cloned().collect();
        let ancestors = forest.ancestors_of(&category.id).into_iter().cloned().collect();

        Ok(CategoryDetail {
            category,
            children,
            ancestors,
        })
    }

    /// Published articles filed directly under a category.
    ///
    /// When the category holds none, articles of its direct children are
    /// listed instead. Grandchildren are never included.
    pub async fn articles(&self, slug: &str, page: PageRequest) -> AppResult<Page<article::Model>> {
        let category = self.category_repo.get_by_slug(slug).await?;

        let mut ids = vec![category.id.clone()];
        let mut total = self.article_repo.count_published_in_categories(&ids).await?;

        if total == 0 {
            ids = self
                .category_repo
                .find_children(&category.id)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();
            total = self.article_repo.count_published_in_categories(&ids).await?;
            tracing::debug!(
                category = %category.slug,
                children = ids.len(),
                "No direct articles, falling back to child categories"
            );
        }

        let items = if total == 0 {
            vec![]
        } else {
            self.article_repo
                .find_published_in_categories(&ids, page)
                .await?
        };

        Ok(Page::new(items, page, total))
    }

    /// Delete a category and all its descendants.
    ///
    /// Refused while any article, published or not, is filed in the
    /// subtree. Returns the removed ids in pre-order.
    pub async fn delete(&self, slug: &str) -> AppResult<Vec<String>> {
        let mut forest = self.forest().await?;
        let id = forest
            .walk()
            .into_iter()
            .map(|(_, c)| c)
            .find(|c| c.slug == slug)
            .map(|c| c.id.clone())
            .ok_or_else(|| AppError::CategoryNotFound(slug.to_string()))?;

        let subtree = forest.subtree_ids(&id);
        let referenced = self.article_repo.count_in_categories(&subtree).await?;
        if referenced > 0 {
            tracing::warn!(
                category = %slug,
                articles = referenced,
                "Refusing to delete category with articles"
            );
            return Err(AppError::Conflict(format!(
                "category {slug} still holds {referenced} article(s)"
            )));
        }

        self.category_repo.delete(&id).await?;
        let removed = forest.delete_subtree(&id);
        tracing::info!(category = %slug, removed = removed.len(), "Deleted category subtree");
        Ok(removed)
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

    fn service(category_db: DatabaseConnection, article_db: DatabaseConnection) -> CategoryService {
        CategoryService::new(
            CategoryRepository::new(Arc::new(category_db)),
            ArticleRepository::new(Arc::new(article_db)),
        )
    }

    fn languages() -> Vec<category::Model> {
        vec![
            fixtures::category("c1", "Languages", None),
            fixtures::category("c2", "Rust", Some("c1")),
            fixtures::category("c3", "Async", Some("c2")),
            fixtures::category("c4", "Go", Some("c1")),
        ]
    }

    #[tokio::test]
    async fn test_list_tree() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([languages()])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let tree = service(category_db, article_db).list_tree().await.unwrap();
        let flat: Vec<(usize, &str)> = tree
            .iter()
            .map(|n| (n.depth, n.category.title.as_str()))
            .collect();

        assert_eq!(
            flat,
            vec![(0, "Languages"), (1, "Go"), (1, "Rust"), (2, "Async")]
        );
    }

    #[tokio::test]
    async fn test_detail_has_breadcrumbs() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([languages()])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let detail = service(category_db, article_db).detail("rust").await.unwrap();

        assert_eq!(detail.category.id, "c2");
        assert_eq!(detail.children.len(), 1);
        assert_eq!(detail.children[0].id, "c3");
        assert_eq!(detail.ancestors.len(), 1);
        assert_eq!(detail.ancestors[0].id, "c1");
    }

    #[tokio::test]
    async fn test_create_with_missing_parent() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(category_db, article_db)
            .create(CreateCategoryInput {
                title: "Orphan".to_string(),
                description: None,
                parent: Some("ghost".to_string()),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_under_parent() {
        let created = fixtures::category("c9", "Tokio", Some("c2"));
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::category("c2", "Rust", Some("c1"))]])
            .append_query_results([count_row(0)])
            .append_query_results([[created]])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let category = service(category_db, article_db)
            .create(CreateCategoryInput {
                title: "Tokio".to_string(),
                description: None,
                parent: Some("rust".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(category.parent_id.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn test_articles_direct() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::category("c2", "Rust", Some("c1"))]])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(1)])
            .append_query_results([[fixtures::article("a1", "ownership", "c2", "u1")]])
            .into_connection();

        let page = service(category_db, article_db)
            .articles("rust", PageRequest::first(8))
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, "a1");
    }

    #[tokio::test]
    async fn test_articles_fall_back_to_direct_children() {
        // A has no articles of its own; its child B has two
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::category("a", "A", None)]])
            .append_query_results([[fixtures::category("b", "B", Some("a"))]])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(0)])
            .append_query_results([count_row(2)])
            .append_query_results([[
                fixtures::article("x1", "first", "b", "u1"),
                fixtures::article("x2", "second", "b", "u1"),
            ]])
            .into_connection();

        let page = service(category_db, article_db)
            .articles("a", PageRequest::first(8))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        let ids: Vec<&str> = page.items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["x1", "x2"]);
        assert!(page.items.iter().all(|a| a.category_id == "b"));
    }

    #[tokio::test]
    async fn test_articles_fallback_on_later_page_keeps_direct_results() {
        // Page 2 of a category with direct articles must not fall back even
        // when that page itself is empty
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::category("c2", "Rust", None)]])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(3)])
            .append_query_results([Vec::<article::Model>::new()])
            .into_connection();

        let page = service(category_db, article_db)
            .articles("rust", PageRequest::new(Some(5), Some(8), 8, 50))
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_delete_refused_when_subtree_has_articles() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([languages()])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(1)])
            .into_connection();

        let result = service(category_db, article_db).delete("rust").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_subtree() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([languages()])
            .append_query_results([[fixtures::category("c2", "Rust", Some("c1"))]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(0)])
            .into_connection();

        let removed = service(category_db, article_db).delete("rust").await.unwrap();

        assert_eq!(removed, vec!["c2".to_string(), "c3".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_unknown() {
        let category_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([languages()])
            .into_connection();
        let article_db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(category_db, article_db).delete("cobol").await;

        assert!(matches!(result, Err(AppError::CategoryNotFound(_))));
    }
}
