//! # appdb: persistence layer for the application registry
//!
//! `appdb` owns the relational schema behind an application registry: who the users are and
//! what role they hold, which applications exist and who works on them, the configuration
//! documents attached to each application, the customers and departments that use them, the
//! git and JIRA connections used to inspect them, and the history of discovery queries users
//! have asked about them.
//!
//! ## What It Does
//!
//! The crate provides the PostgreSQL schema (as embedded SQLx migrations) and one repository per
//! table. Integrity lives in the database: every reference is a declared foreign key with an
//! explicit delete policy, enumerated columns are guarded by check constraints, and update
//! timestamps come from a trigger. Repositories add input validation and map driver errors to
//! [`db::errors::DbError`], so callers can tell a missing row from a constraint violation.
//!
//! Credentials held by git and JIRA connections are encrypted before they are written. The
//! caller supplies the key material as a [`crypto::SecretCipher`]; see [`crypto`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use appdb::db::handlers::{Applications, Repository};
//! use appdb::db::models::applications::ApplicationCreateDBRequest;
//!
//! # async fn example(config: appdb::Config) -> anyhow::Result<()> {
//! let pool = appdb::setup_database(&config).await?;
//!
//! let mut tx = pool.begin().await?;
//! let app = Applications::new(&mut tx)
//!     .create(&ApplicationCreateDBRequest {
//!         application_name: "Billing".to_string(),
//!         description: None,
//!     })
//!     .await?;
//! tx.commit().await?;
//!
//! println!("created application {}", app.application_id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod config;
pub mod crypto;
pub mod db;
pub mod errors;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;

use crate::config::DatabaseConfig;
use crate::crypto::{SecretCipher, SecretColumn, encrypt_plaintext_column};
use crate::errors::Error;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use tracing::{info, instrument};

/// Get the appdb database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open a connection pool with the configured pool settings and slow statement logging.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, Error> {
    let options = PgConnectOptions::from_str(&config.url)?
        .log_slow_statements(log::LevelFilter::Warn, config.slow_statement_threshold);

    let pool = PgPoolOptions::new()
        .max_connections(config.pool.max_connections)
        .min_connections(config.pool.min_connections)
        .acquire_timeout(config.pool.acquire_timeout())
        .idle_timeout(config.pool.idle_timeout())
        .max_lifetime(config.pool.max_lifetime())
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Connect and, unless disabled, bring the schema up to date.
#[instrument(skip(config), err)]
pub async fn setup_database(config: &Config) -> Result<PgPool, Error> {
    let pool = connect(&config.database).await?;
    info!(max_connections = config.database.pool.max_connections, "Connected to database");

    if config.database.run_migrations {
        migrator().run(&pool).await?;
        info!("Database migrations applied");
    }

    Ok(pool)
}

/// Encrypt every credential column that still holds plaintext, in one transaction.
///
/// For data imported from a store that did not encrypt credentials. Values that already
/// decrypt with `cipher` are skipped, so repository-written rows are untouched.
#[instrument(skip(pool, cipher), err)]
pub async fn encrypt_plaintext_credentials(pool: &PgPool, cipher: &dyn SecretCipher) -> Result<usize, Error> {
    let mut tx = pool.begin().await?;

    let mut total = 0;
    for column in SecretColumn::ALL {
        total += encrypt_plaintext_column(&mut tx, cipher, column).await?;
    }

    tx.commit().await?;
    info!(total, "Encrypted plaintext credentials");

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{GitConnections, JiraConnections, Repository};
    use crate::db::models::connections::{GitAuth, GitConnectionCreateDBRequest, JiraAuth, JiraConnectionCreateDBRequest};
    use crate::test_utils::{create_test_application, test_cipher};

    #[sqlx::test]
    #[test_log::test]
    async fn test_encrypt_plaintext_credentials_covers_both_tables(pool: PgPool) {
        let cipher = test_cipher();
        let app = create_test_application(&pool, "Imported").await;

        sqlx::query("INSERT INTO git_connections (application_id, repo_url, auth_type, ssh_key) VALUES ($1, $2, 'SSH', 'raw-key')")
            .bind(app.application_id)
            .bind("git@example.com:imported.git")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO jira_connections (application_id, jira_base_url, project_key, jira_api_token) VALUES ($1, $2, 'IMP', 'raw-token')",
        )
        .bind(app.application_id)
        .bind("https://example.atlassian.net")
        .execute(&pool)
        .await
        .unwrap();

        let count = encrypt_plaintext_credentials(&pool, &cipher).await.unwrap();
        assert_eq!(count, 2);

        let key: String = sqlx::query_scalar("SELECT ssh_key FROM git_connections").fetch_one(&pool).await.unwrap();
        assert_eq!(cipher.decrypt(&key).unwrap(), "raw-key");
        let token: String = sqlx::query_scalar("SELECT jira_api_token FROM jira_connections").fetch_one(&pool).await.unwrap();
        assert_eq!(cipher.decrypt(&token).unwrap(), "raw-token");

        // Already converted values are skipped on a second run
        assert_eq!(encrypt_plaintext_credentials(&pool, &cipher).await.unwrap(), 0);
        let key_again: String = sqlx::query_scalar("SELECT ssh_key FROM git_connections").fetch_one(&pool).await.unwrap();
        assert_eq!(key_again, key);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_encrypt_plaintext_credentials_leaves_repository_rows_intact(pool: PgPool) {
        let cipher = test_cipher();
        let app = create_test_application(&pool, "Billing").await;

        let mut conn = pool.acquire().await.unwrap();
        let git = GitConnections::new(&mut conn, &cipher)
            .create(&GitConnectionCreateDBRequest {
                application_id: app.application_id,
                repo_url: "https://git.example.com/billing.git".to_string(),
                auth: GitAuth::Https {
                    username: Some("ci-bot".to_string()),
                    access_token: Some("ghp_secret".to_string()),
                },
                default_branch: None,
            })
            .await
            .unwrap();
        let jira = JiraConnections::new(&mut conn, &cipher)
            .create(&JiraConnectionCreateDBRequest {
                application_id: app.application_id,
                jira_base_url: "https://example.atlassian.net".to_string(),
                project_key: "BILL".to_string(),
                jira_email: Some("ops@example.com".to_string()),
                auth: JiraAuth::ApiToken {
                    api_token: Some("jira-secret".to_string()),
                },
            })
            .await
            .unwrap();

        let count = encrypt_plaintext_credentials(&pool, &cipher).await.unwrap();
        assert_eq!(count, 0);

        let git = GitConnections::new(&mut conn, &cipher).get_by_id(git.git_id).await.unwrap().unwrap();
        assert_eq!(
            git.credentials(&cipher).unwrap(),
            GitAuth::Https {
                username: Some("ci-bot".to_string()),
                access_token: Some("ghp_secret".to_string()),
            }
        );
        let jira = JiraConnections::new(&mut conn, &cipher).get_by_id(jira.jira_id).await.unwrap().unwrap();
        assert_eq!(
            jira.credentials(&cipher).unwrap(),
            JiraAuth::ApiToken {
                api_token: Some("jira-secret".to_string()),
            }
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_migrations_are_idempotent(pool: PgPool) {
        // sqlx::test has already applied them; a second run finds nothing to do
        migrator().run(&pool).await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public' AND table_name <> '_sqlx_migrations'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 13);
    }
}
