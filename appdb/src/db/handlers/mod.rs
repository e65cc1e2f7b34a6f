//! Repository implementations for database access.
//!
//! Each table has a repository struct implementing [`Repository`]. Repositories follow a
//! consistent pattern:
//!
//! - Wrap a borrowed `PgConnection`, which may be a pooled connection or a transaction
//! - Validate requests before any SQL is sent
//! - Issue one SQL statement per operation, so cascades happen atomically
//! - Return models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Users`], [`UserRoles`]: accounts and their global role
//! - [`Applications`], [`ApplicationUsers`], [`Configurations`]: applications, per-application
//!   roles and configuration documents
//! - [`Customers`], [`Departments`], [`CustomerDepartments`], [`DepartmentApplications`]:
//!   organisational structure
//! - [`GitConnections`], [`JiraConnections`]: external tool connections, built with a
//!   [`SecretCipher`](crate::crypto::SecretCipher)
//! - [`Sessions`], [`Messages`]: discovery query history
//!
//! # Usage
//!
//! ```ignore
//! use appdb::db::handlers::{Applications, Configurations, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!
//!     let app = Applications::new(&mut tx).create(&new_app).await?;
//!     Configurations::new(&mut tx).create(&config_for(app.application_id)).await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod application_users;
pub mod applications;
pub mod configurations;
pub mod customer_departments;
pub mod customers;
pub mod department_applications;
pub mod departments;
pub mod discovery_messages;
pub mod discovery_sessions;
pub mod git_connections;
pub mod jira_connections;
pub mod repository;
pub mod user_roles;
pub mod users;

pub use application_users::ApplicationUsers;
pub use applications::Applications;
pub use configurations::Configurations;
pub use customer_departments::CustomerDepartments;
pub use customers::Customers;
pub use department_applications::DepartmentApplications;
pub use departments::Departments;
pub use discovery_messages::Messages;
pub use discovery_sessions::Sessions;
pub use git_connections::GitConnections;
pub use jira_connections::JiraConnections;
pub use repository::Repository;
pub use user_roles::UserRoles;
pub use users::Users;
