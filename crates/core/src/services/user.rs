//! User service.

use chrono::{NaiveDate, Utc};
use quire_common::{AppError, AppResult, IdGenerator, PageRequest};
use quire_db::{
    entities::{article, user},
    repositories::{ArticleRepository, UserRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::slug::assign_unique_slug;

/// Number of recent articles shown on a profile page.
const PROFILE_RECENT_ARTICLES: u64 = 5;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    article_repo: ArticleRepository,
    id_gen: IdGenerator,
}

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,
}

/// Input for updating the caller's own profile.
///
/// Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    pub birth_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 255))]
    pub avatar_url: Option<String>,
}

/// Public profile page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub user: user::Model,
    pub latest_articles: Vec<article::Model>,
    pub article_count: u64,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, article_repo: ArticleRepository) -> Self {
        Self {
            user_repo,
            article_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new user with a fresh bearer token.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let repo = &self.user_repo;
        let slug = assign_unique_slug(None, &input.username, |candidate| async move {
            repo.slug_exists(&candidate).await
        })
        .await?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            slug: Set(slug),
            email: Set(input.email),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            bio: Set(None),
            birth_date: Set(None),
            avatar_url: Set("images/avatars/default.png".to_string()),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, slug = %user.slug, "Created user");
        Ok(user)
    }

    /// Resolve the user owning a bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_slug(slug).await
    }

    /// Profile page: the user, their latest published articles and how many
    /// they have published in total.
    pub async fn profile(&self, slug: &str) -> AppResult<ProfileView> {
        let user = self.user_repo.get_by_slug(slug).await?;
        let latest_articles = self
            .article_repo
            .find_published_by_author(&user.id, PageRequest::first(PROFILE_RECENT_ARTICLES))
            .await?;
        let article_count = self.article_repo.count_published_by_author(&user.id).await?;

        Ok(ProfileView {
            user,
            latest_articles,
            article_count,
        })
    }

    /// Update the caller's profile fields.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active = user.into_active_model();

        if let Some(first_name) = input.first_name {
            active.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(Some(last_name));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(birth_date) = input.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(avatar_url);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.user_repo.update(active).await?;
        tracing::debug!(user_id = %updated.id, "Updated profile");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quire_db::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    #[tokio::test]
    async fn test_create_assigns_slug_and_token() {
        let created = fixtures::user("u1", "Alice");

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([count_row(0)])
                .append_query_results([[created]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(user_db), ArticleRepository::new(empty_db()));
        let user = service
            .create(CreateUserInput {
                username: "Alice".to_string(),
                email: None,
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();

        assert_eq!(user.slug, "alice");
        assert!(user.token.is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_taken_username() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::user("u1", "Alice")]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(user_db), ArticleRepository::new(empty_db()));
        let result = service
            .create(CreateUserInput {
                username: "Alice".to_string(),
                email: None,
                first_name: None,
                last_name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_email() {
        let service = UserService::new(UserRepository::new(empty_db()), ArticleRepository::new(empty_db()));
        let result = service
            .create(CreateUserInput {
                username: "Alice".to_string(),
                email: Some("not-an-email".to_string()),
                first_name: None,
                last_name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(user_db), ArticleRepository::new(empty_db()));
        let result = service.authenticate_by_token("bogus").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_profile() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::user("u1", "Alice")]])
                .into_connection(),
        );
        let article_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    fixtures::article("a2", "second", "c1", "u1"),
                    fixtures::article("a1", "first", "c1", "u1"),
                ]])
                .append_query_results([count_row(9)])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(user_db), ArticleRepository::new(article_db));
        let profile = service.profile("alice").await.unwrap();

        assert_eq!(profile.user.id, "u1");
        assert_eq!(profile.latest_articles.len(), 2);
        assert_eq!(profile.article_count, 9);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_long_bio() {
        let service = UserService::new(UserRepository::new(empty_db()), ArticleRepository::new(empty_db()));
        let result = service
            .update_profile(
                "u1",
                UpdateProfileInput {
                    bio: Some("x".repeat(501)),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let mut updated = fixtures::user("u1", "Alice");
        updated.bio = Some("Writes about Rust".to_string());

        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::user("u1", "Alice")]])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(user_db), ArticleRepository::new(empty_db()));
        let user = service
            .update_profile(
                "u1",
                UpdateProfileInput {
                    bio: Some("Writes about Rust".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(user.bio.as_deref(), Some("Writes about Rust"));
    }
}
