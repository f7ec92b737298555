//! Comment service.

use chrono::Utc;
use quire_common::{AppError, AppResult, IdGenerator};
use quire_db::{
    entities::{article, comment},
    repositories::{ArticleRepository, CommentRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::tree::Forest;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    article_repo: ArticleRepository,
    id_gen: IdGenerator,
}

/// Input for posting a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,

    /// Comment being replied to.
    pub parent_id: Option<String>,
}

/// A comment with its depth in the thread.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub depth: usize,
    #[serde(flatten)]
    pub comment: comment::Model,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, article_repo: ArticleRepository) -> Self {
        Self {
            comment_repo,
            article_repo,
            id_gen: IdGenerator::new(),
        }
    }

    async fn thread(&self, article_id: &str) -> AppResult<Forest<comment::Model>> {
        let comments = self.comment_repo.find_by_article(article_id).await?;
        Ok(Forest::build(comments)?)
    }

    async fn published_article(&self, slug: &str) -> AppResult<article::Model> {
        let article = self.article_repo.get_by_slug(slug).await?;
        if article.status != article::Status::Published {
            return Err(AppError::ArticleNotFound(slug.to_string()));
        }
        Ok(article)
    }

    /// The whole comment thread of an article in pre-order with depth.
    pub async fn list(&self, article_slug: &str) -> AppResult<Vec<CommentNode>> {
        let article = self.published_article(article_slug).await?;
        let thread = self.thread(&article.id).await?;
        Ok(thread
            .walk()
            .into_iter()
            .map(|(depth, comment)| CommentNode {
                depth,
                comment: comment.clone(),
            })
            .collect())
    }

    /// Post a comment, optionally as a reply within the same article.
    pub async fn create(
        &self,
        author_id: &str,
        article_slug: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let article = self.published_article(article_slug).await?;

        if let Some(parent_id) = input.parent_id.as_deref() {
            let parent = self
                .comment_repo
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| {
                    AppError::Validation(format!("parent comment {parent_id} does not exist"))
                })?;
            if parent.article_id != article.id {
                return Err(AppError::Validation(format!(
                    "parent comment {parent_id} belongs to another article"
                )));
            }
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            article_id: Set(article.id),
            author_id: Set(author_id.to_string()),
            parent_id: Set(input.parent_id),
            content: Set(input.content),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(comment_id = %comment.id, article_id = %comment.article_id, "Created comment");
        Ok(comment)
    }

    /// Delete a comment together with its replies. Only the author may do
    /// so. Returns the removed ids in pre-order.
    pub async fn delete(&self, user_id: &str, comment_id: &str) -> AppResult<Vec<String>> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.author_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete this comment".to_string(),
            ));
        }

        let mut thread = self.thread(&comment.article_id).await?;
        self.comment_repo.delete(&comment.id).await?;
        let removed = thread.delete_subtree(&comment.id);

        tracing::info!(comment_id = %comment.id, removed = removed.len(), "Deleted comment subtree");
        Ok(removed)
    }
}
