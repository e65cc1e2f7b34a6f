//! Database record models matching table schemas.
//!
//! Each entity has a create request, an update request (partial patch, `None` leaves a field
//! unchanged) and a response type that mirrors the stored row. Requests carry a `validate`
//! method that repositories call before touching the database.
//!
//! # Model Categories
//!
//! - [`users`]: user accounts and roles
//! - [`applications`]: tracked applications, per-application role assignments and
//!   configuration documents
//! - [`organizations`]: customers, departments and their links to applications
//! - [`connections`]: git and JIRA connection settings with encrypted credentials
//! - [`discovery`]: discovery query sessions and messages

pub mod applications;
pub mod connections;
pub mod discovery;
pub mod organizations;
pub mod users;
