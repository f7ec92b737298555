//! Rating repository.
//!
//! Toggling a vote is a read-then-write on the `(article_id, ip_address)`
//! row, so the row-level operations take any [`ConnectionTrait`] and are
//! meant to run inside the transaction returned by [`RatingRepository::begin`].

use std::sync::Arc;

use crate::entities::{Rating, rating};
use crate::map_write_err;
use quire_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, IntoActiveModel, QueryFilter, QuerySelect,
    TransactionTrait,
};

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Start a transaction for a vote.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the vote cast from `ip_address` on an article, locking the row
    /// (`SELECT ... FOR UPDATE`) until the surrounding transaction ends.
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        article_id: &str,
        ip_address: &str,
    ) -> AppResult<Option<rating::Model>> {
        Rating::find()
            .filter(rating::Column::ArticleId.eq(article_id))
            .filter(rating::Column::IpAddress.eq(ip_address))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new vote.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        model: rating::ActiveModel,
    ) -> AppResult<rating::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| map_write_err(e, "Rating"))
    }

    /// Replace the value of an existing vote, recording who cast it.
    pub async fn update_value<C: ConnectionTrait>(
        conn: &C,
        existing: rating::Model,
        value: i16,
        user_id: Option<String>,
    ) -> AppResult<rating::Model> {
        let mut active = existing.into_active_model();
        active.value = Set(value);
        active.user_id = Set(user_id);
        active
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a vote.
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<()> {
        Rating::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Sum of all vote values on an article; 0 when nobody has voted.
    pub async fn sum_for_article<C: ConnectionTrait>(conn: &C, article_id: &str) -> AppResult<i64> {
        let sum: Option<Option<i64>> = Rating::find()
            .select_only()
            .column_as(rating::Column::Value.sum(), "sum")
            .filter(rating::Column::ArticleId.eq(article_id))
            .into_tuple()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(sum.flatten().unwrap_or(0))
    }

    /// Rating sum read outside any transaction.
    pub async fn rating_sum(&self, article_id: &str) -> AppResult<i64> {
        Self::sum_for_article(self.db.as_ref(), article_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_for_update_locks_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::rating("r1", "a1", "10.0.0.1", 1)]])
            .into_connection();

        let found = RatingRepository::find_for_update(&db, "a1", "10.0.0.1")
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.value), Some(1));

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
        assert!(format!("{:?}", log[0]).contains("FOR UPDATE"));
    }

    #[tokio::test]
    async fn test_sum_for_article() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "sum" => sea_orm::Value::BigInt(Some(-3))
            }]])
            .into_connection();

        let sum = RatingRepository::sum_for_article(&db, "a1").await.unwrap();
        assert_eq!(sum, -3);
    }

    #[tokio::test]
    async fn test_sum_without_votes_is_zero() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "sum" => sea_orm::Value::BigInt(None)
            }]])
            .into_connection();

        let sum = RatingRepository::sum_for_article(&db, "a1").await.unwrap();
        assert_eq!(sum, 0);
    }

    #[tokio::test]
    async fn test_update_value() {
        let existing = fixtures::rating("r1", "a1", "10.0.0.1", 1);
        let mut flipped = existing.clone();
        flipped.value = -1;
        flipped.user_id = Some("u1".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[flipped]])
            .into_connection();

        let updated = RatingRepository::update_value(&db, existing, -1, Some("u1".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.value, -1);
        assert_eq!(updated.user_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        assert!(RatingRepository::delete(&db, "r1").await.is_ok());
    }
}
