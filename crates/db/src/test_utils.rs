//! Test utilities for database operations.
//!
//! Provides a live `PostgreSQL` test database wrapper and model fixtures for
//! tests that run against `MockDatabase`.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// Tables in child-to-parent order, so truncation never trips a foreign key.
const TABLES: [&str; 5] = ["rating", "comment", "article", "category", "user"];

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "quire_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "quire_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "quire_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Shared database connection, ready to hand to repositories.
    pub conn: Arc<DatabaseConnection>,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect with the default configuration and apply all migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and apply all migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to migrated test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.conn.as_ref()
    }

    /// Get a shared handle for constructing repositories.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Remove all rows from the application tables.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        for table in TABLES {
            let truncate = format!("TRUNCATE TABLE \"{table}\" CASCADE");
            self.conn
                .execute(Statement::from_string(DatabaseBackend::Postgres, truncate))
                .await?;
        }

        info!("Cleaned up test database");
        Ok(())
    }
}

/// Model builders for mock-database tests.
pub mod fixtures {
    use chrono::{Duration, TimeZone, Utc};
    use sea_orm::prelude::DateTimeWithTimeZone;

    use crate::entities::{article, category, comment, rating, user};

    /// A fixed timestamp `minutes` after 2025-01-01T00:00:00Z.
    #[must_use]
    pub fn at_minute(minutes: i64) -> DateTimeWithTimeZone {
        let base = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        (base + Duration::minutes(minutes)).into()
    }

    /// A user whose slug equals the lowercased username.
    #[must_use]
    pub fn user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            slug: username.to_lowercase(),
            email: None,
            first_name: None,
            last_name: None,
            bio: None,
            birth_date: None,
            avatar_url: "images/avatars/default.png".to_string(),
            token: Some(format!("token-{id}")),
            created_at: at_minute(0),
            updated_at: None,
        }
    }

    /// A category; the slug is the lowercased title with spaces as hyphens.
    #[must_use]
    pub fn category(id: &str, title: &str, parent_id: Option<&str>) -> category::Model {
        category::Model {
            id: id.to_string(),
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            description: None,
            parent_id: parent_id.map(str::to_string),
            created_at: at_minute(0),
        }
    }

    /// A published, unpinned article with zero views.
    #[must_use]
    pub fn article(id: &str, slug: &str, category_id: &str, author_id: &str) -> article::Model {
        article::Model {
            id: id.to_string(),
            title: slug.replace('-', " "),
            slug: slug.to_string(),
            description: "Short description".to_string(),
            text: "Full text".to_string(),
            thumbnail: "default.jpg".to_string(),
            status: article::Status::Published,
            category_id: category_id.to_string(),
            author_id: author_id.to_string(),
            updater_id: None,
            fixed: false,
            views: 0,
            created_at: at_minute(0),
            updated_at: None,
        }
    }

    /// A comment created `minute` minutes after the fixture epoch.
    #[must_use]
    pub fn comment(
        id: &str,
        article_id: &str,
        parent_id: Option<&str>,
        minute: i64,
    ) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            article_id: article_id.to_string(),
            author_id: "author1".to_string(),
            parent_id: parent_id.map(str::to_string),
            content: format!("comment {id}"),
            created_at: at_minute(minute),
            updated_at: None,
        }
    }

    /// An anonymous rating.
    #[must_use]
    pub fn rating(id: &str, article_id: &str, ip_address: &str, value: i16) -> rating::Model {
        rating::Model {
            id: id.to_string(),
            article_id: article_id.to_string(),
            user_id: None,
            ip_address: ip_address.to_string(),
            value,
            created_at: at_minute(0),
        }
    }
}
