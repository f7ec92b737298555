//! Rating service.

use chrono::Utc;
use quire_common::{AppError, AppResult, IdGenerator};
use quire_db::{
    entities::{article, rating},
    repositories::{ArticleRepository, RatingRepository},
};
use sea_orm::Set;

use crate::rating::{RatingOutcome, RatingTransition, RatingValue};

/// Rating service for business logic.
#[derive(Clone)]
pub struct RatingService {
    rating_repo: RatingRepository,
    article_repo: ArticleRepository,
    id_gen: IdGenerator,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(rating_repo: RatingRepository, article_repo: ArticleRepository) -> Self {
        Self {
            rating_repo,
            article_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle the vote cast from `origin` on an article.
    ///
    /// The stored vote is read with a row lock and changed in the same
    /// transaction; the returned sum is read before commit.
    ///
    /// Two first votes racing from the same origin cannot both lock a row
    /// that does not exist yet: the loser hits the unique index and gets
    /// [`AppError::Conflict`] (409) instead of a rating status.
    pub async fn submit(
        &self,
        article_slug: &str,
        origin: &str,
        value: i64,
        user_id: Option<&str>,
    ) -> AppResult<RatingOutcome> {
        let requested = RatingValue::try_from(value)?;
        let article = self.article_repo.get_by_slug(article_slug).await?;
        if article.status != article::Status::Published {
            return Err(AppError::ArticleNotFound(article_slug.to_string()));
        }

        let txn = self.rating_repo.begin().await?;

        let existing = RatingRepository::find_for_update(&txn, &article.id, origin).await?;
        let current = existing
            .as_ref()
            .map(|r| RatingValue::try_from(r.value))
            .transpose()
            .map_err(|e| AppError::Internal(format!("stored rating is invalid: {e}")))?;

        let transition = RatingTransition::decide(current, requested);
        match (transition, existing) {
            (RatingTransition::Create(v), _) => {
                let model = rating::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    article_id: Set(article.id.clone()),
                    user_id: Set(user_id.map(str::to_string)),
                    ip_address: Set(origin.to_string()),
                    value: Set(v.as_i16()),
                    created_at: Set(Utc::now().into()),
                };
                RatingRepository::insert(&txn, model).await?;
            }
            (RatingTransition::Update(v), Some(row)) => {
                RatingRepository::update_value(
                    &txn,
                    row,
                    v.as_i16(),
                    user_id.map(str::to_string),
                )
                .await?;
            }
            (RatingTransition::Delete, Some(row)) => {
                RatingRepository::delete(&txn, &row.id).await?;
            }
            (RatingTransition::Update(_) | RatingTransition::Delete, None) => {
                return Err(AppError::Internal(
                    "rating transition without a stored vote".to_string(),
                ));
            }
        }

        let rating_sum = RatingRepository::sum_for_article(&txn, &article.id).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(
            article_id = %article.id,
            origin = %origin,
            transition = ?transition,
            rating_sum,
            "Applied rating"
        );

        Ok(RatingOutcome {
            status: transition.status(),
            rating_sum,
        })
    }
}
