//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Callers   │  (application code, owns transactions and the cipher)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - validation & queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │  (keys, foreign keys, cascades, checks, triggers)
//! └─────────────┘
//! ```
//!
//! # Integrity
//!
//! Every invariant lives in the schema so concurrent writers cannot race past it: composite
//! and unique keys, foreign keys with an explicit `ON DELETE` policy, check constraints for
//! enumerated columns and credential consistency, and a trigger that refreshes `updated_at`.
//! Repositories add input validation on top so malformed requests fail early with
//! [`errors::DbError::Validation`].
//!
//! # Transactions
//!
//! Repositories borrow a `PgConnection`. Each create, update and delete is a single statement,
//! so a cascading delete is applied completely or not at all. Use a transaction when several
//! calls must commit together:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let app = Applications::new(&mut tx).create(&request).await?;
//! Configurations::new(&mut tx).create(&config_for(app.application_id)).await?;
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/` directory.
//! The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! appdb::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
pub mod validation;
