//! Fixtures shared by the unit tests.

use crate::crypto::Aes256GcmCipher;
use crate::db::handlers::{Applications, Repository, Sessions, Users};
use crate::db::models::{
    applications::{ApplicationCreateDBRequest, ApplicationDBResponse},
    discovery::{SessionCreateDBRequest, SessionDBResponse},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::UserId;
use base64::{Engine as _, engine::general_purpose};
use sqlx::PgPool;

/// Cipher with a fixed all-zero key. Only for tests.
pub fn test_cipher() -> Aes256GcmCipher {
    Aes256GcmCipher::from_base64_key(&general_purpose::STANDARD.encode([0u8; 32])).expect("Failed to build test cipher")
}

pub fn user_request(username: &str) -> UserCreateDBRequest {
    UserCreateDBRequest {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        enrolled: None,
        role_id: None,
    }
}

pub async fn create_test_user(pool: &PgPool, username: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&user_request(username))
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_application(pool: &PgPool, name: &str) -> ApplicationDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Applications::new(&mut conn)
        .create(&ApplicationCreateDBRequest {
            application_name: name.to_string(),
            description: Some(format!("{name} test application")),
        })
        .await
        .expect("Failed to create test application")
}

pub async fn create_test_session(pool: &PgPool, user_id: UserId, title: &str) -> SessionDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Sessions::new(&mut conn)
        .create(&SessionCreateDBRequest::new(user_id, title))
        .await
        .expect("Failed to create test session")
}

/// Rows in `table` whose `column` equals `id`. Used to check for orphans after deletes.
pub async fn count_rows(pool: &PgPool, table: &str, column: &str, id: i32) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}
