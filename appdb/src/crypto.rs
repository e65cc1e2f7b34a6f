//! Encryption boundary for credentials stored at rest.
//!
//! Git and JIRA connections hold access tokens, SSH keys, passphrases, API tokens and OAuth
//! secrets. The repositories never persist these in plaintext: they are constructed with a
//! [`SecretCipher`] supplied by the caller and encrypt every sensitive value before binding it.
//! Reads hand back [`EncryptedSecret`] values, which only turn into plaintext through an
//! explicit [`EncryptedSecret::reveal`] call with a cipher.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Row};

/// Length of the AES-GCM nonce prepended to every ciphertext.
const NONCE_LEN: usize = 12;

/// Encrypts and decrypts credential values. Implementations must be safe to share across tasks.
pub trait SecretCipher: Send + Sync {
    /// Encrypt a plaintext value into its stored representation.
    fn encrypt(&self, plaintext: &str) -> anyhow::Result<String>;

    /// Decrypt a stored representation back into plaintext.
    fn decrypt(&self, ciphertext: &str) -> anyhow::Result<String>;
}

/// AES-256-GCM cipher keyed from a base64-encoded 32 byte key.
///
/// Stored values are `base64(nonce || ciphertext)` with a fresh random 96-bit nonce per value,
/// so encrypting the same plaintext twice produces different output.
#[derive(Clone)]
pub struct Aes256GcmCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for Aes256GcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Aes256GcmCipher(..)")
    }
}

impl Aes256GcmCipher {
    /// Build a cipher from a base64-encoded key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not valid base64 or does not decode to 32 bytes.
    pub fn from_base64_key(key_b64: &str) -> anyhow::Result<Self> {
        let key_bytes = general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|e| anyhow::anyhow!("Failed to decode encryption key: {}", e))?;

        if key_bytes.len() != 32 {
            return Err(anyhow::anyhow!(
                "Encryption key must be 32 bytes (256 bits), got {} bytes",
                key_bytes.len()
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| anyhow::anyhow!("Failed to create cipher: {}", e))?;

        Ok(Self { cipher })
    }
}

impl SecretCipher for Aes256GcmCipher {
    fn encrypt(&self, plaintext: &str) -> anyhow::Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

        // Combine nonce + ciphertext and encode as base64
        let mut result = nonce.to_vec();
        result.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(result))
    }

    fn decrypt(&self, ciphertext: &str) -> anyhow::Result<String> {
        let encrypted_data = general_purpose::STANDARD
            .decode(ciphertext)
            .map_err(|e| anyhow::anyhow!("Failed to decode encrypted data: {}", e))?;

        if encrypted_data.len() < NONCE_LEN {
            return Err(anyhow::anyhow!("Encrypted data too short"));
        }

        let (nonce_bytes, ciphertext) = encrypted_data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| anyhow::anyhow!("Decryption failed: {}", e))?;

        String::from_utf8(plaintext).map_err(|e| anyhow::anyhow!("Decrypted value is not UTF-8: {}", e))
    }
}

/// Generates a fresh base64-encoded 256-bit key suitable for [`Aes256GcmCipher::from_base64_key`].
pub fn generate_encryption_key() -> String {
    let key = Aes256Gcm::generate_key(OsRng);
    general_purpose::STANDARD.encode(key)
}

/// A credential value as stored in the database (ciphertext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct EncryptedSecret(String);

impl EncryptedSecret {
    /// Encrypt a plaintext value with the given cipher.
    pub fn seal(cipher: &dyn SecretCipher, plaintext: &str) -> anyhow::Result<Self> {
        Ok(Self(cipher.encrypt(plaintext)?))
    }

    /// Decrypt the stored value. Only callers holding the cipher can do this.
    pub fn reveal(&self, cipher: &dyn SecretCipher) -> anyhow::Result<String> {
        cipher.decrypt(&self.0)
    }

    /// The stored ciphertext.
    pub fn as_ciphertext(&self) -> &str {
        &self.0
    }
}

/// Credential columns that hold encrypted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretColumn {
    GitAccessToken,
    GitSshKey,
    GitSshPassphrase,
    JiraApiToken,
    JiraOauthClientSecret,
}

impl SecretColumn {
    pub const ALL: [SecretColumn; 5] = [
        SecretColumn::GitAccessToken,
        SecretColumn::GitSshKey,
        SecretColumn::GitSshPassphrase,
        SecretColumn::JiraApiToken,
        SecretColumn::JiraOauthClientSecret,
    ];

    /// (table, id column, value column)
    fn location(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            SecretColumn::GitAccessToken => ("git_connections", "git_id", "access_token"),
            SecretColumn::GitSshKey => ("git_connections", "git_id", "ssh_key"),
            SecretColumn::GitSshPassphrase => ("git_connections", "git_id", "ssh_passphrase"),
            SecretColumn::JiraApiToken => ("jira_connections", "jira_id", "jira_api_token"),
            SecretColumn::JiraOauthClientSecret => ("jira_connections", "jira_id", "oauth_client_secret"),
        }
    }
}

/// Encrypts a credential column in place for every non-null value that is still plaintext.
///
/// This is for rows imported from a store that kept credentials in plaintext. Values the
/// cipher already decrypts are left alone, so rows written through the repositories survive
/// and running it again is a no-op. Run it inside a transaction so a failure leaves no column
/// half-converted.
///
/// Returns the number of rows that were encrypted.
pub async fn encrypt_plaintext_column(conn: &mut PgConnection, cipher: &dyn SecretCipher, column: SecretColumn) -> anyhow::Result<usize> {
    let (table, id_column, value_column) = column.location();

    let select_query = format!("SELECT {id_column}, {value_column} FROM {table} WHERE {value_column} IS NOT NULL");
    let rows = sqlx::query(&select_query).fetch_all(&mut *conn).await?;

    let update_query = format!("UPDATE {table} SET {value_column} = $1 WHERE {id_column} = $2");

    let mut count = 0;
    for row in rows {
        let id: i32 = row.try_get(id_column)?;
        let plaintext: String = row.try_get(value_column)?;

        // AES-GCM authenticates, so plaintext never decrypts by accident
        if cipher.decrypt(&plaintext).is_ok() {
            continue;
        }

        let encrypted = cipher.encrypt(&plaintext)?;

        sqlx::query(&update_query).bind(&encrypted).bind(id).execute(&mut *conn).await?;

        count += 1;
    }

    tracing::info!(table, column = value_column, count, "Encrypted plaintext credential column");

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_application, test_cipher};
    use sqlx::PgPool;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = test_cipher();
        let plaintext = "ghp_exampletoken";

        let encrypted = cipher.encrypt(plaintext).expect("Encryption should succeed");
        assert_ne!(encrypted, plaintext);
        assert!(general_purpose::STANDARD.decode(&encrypted).is_ok());

        let decrypted = cipher.decrypt(&encrypted).expect("Decryption should succeed");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_encryption_produces_different_ciphertexts() {
        let cipher = test_cipher();

        let encrypted1 = cipher.encrypt("same plaintext").unwrap();
        let encrypted2 = cipher.encrypt("same plaintext").unwrap();

        // Random nonce per value
        assert_ne!(encrypted1, encrypted2);
        assert_eq!(cipher.decrypt(&encrypted1).unwrap(), "same plaintext");
        assert_eq!(cipher.decrypt(&encrypted2).unwrap(), "same plaintext");
    }

    #[test]
    fn test_invalid_key_length() {
        let short_key = general_purpose::STANDARD.encode([0u8; 16]);
        let err = Aes256GcmCipher::from_base64_key(&short_key).unwrap_err();
        assert!(err.to_string().contains("32 bytes"));

        assert!(Aes256GcmCipher::from_base64_key("not base64!").is_err());
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let cipher = test_cipher();
        let other = Aes256GcmCipher::from_base64_key(&general_purpose::STANDARD.encode([7u8; 32])).unwrap();

        let encrypted = cipher.encrypt("secret").unwrap();
        assert!(other.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_decrypt_with_invalid_data() {
        let cipher = test_cipher();
        assert!(cipher.decrypt(&general_purpose::STANDARD.encode([0u8; 5])).is_err());
        assert!(cipher.decrypt("%%%").is_err());
    }

    #[test]
    fn test_generated_key_is_usable() {
        let key = generate_encryption_key();
        assert_eq!(general_purpose::STANDARD.decode(&key).unwrap().len(), 32);
        assert_ne!(key, generate_encryption_key());

        let cipher = Aes256GcmCipher::from_base64_key(&key).unwrap();
        let sealed = EncryptedSecret::seal(&cipher, "passphrase").unwrap();
        assert_eq!(sealed.reveal(&cipher).unwrap(), "passphrase");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_encrypt_plaintext_column(pool: PgPool) {
        let cipher = test_cipher();
        let app = create_test_application(&pool, "legacy").await;

        // Rows written by an older store that kept tokens in plaintext
        sqlx::query("INSERT INTO git_connections (application_id, repo_url, auth_type, access_token) VALUES ($1, $2, 'HTTPS', $3)")
            .bind(app.application_id)
            .bind("https://example.com/repo.git")
            .bind("plain-token")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO git_connections (application_id, repo_url, auth_type) VALUES ($1, $2, 'HTTPS')")
            .bind(app.application_id)
            .bind("https://example.com/public.git")
            .execute(&pool)
            .await
            .unwrap();

        let mut tx = pool.begin().await.unwrap();
        let count = encrypt_plaintext_column(&mut tx, &cipher, SecretColumn::GitAccessToken).await.unwrap();
        tx.commit().await.unwrap();

        // Null values are left alone
        assert_eq!(count, 1);

        let stored: String = sqlx::query_scalar("SELECT access_token FROM git_connections WHERE access_token IS NOT NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_ne!(stored, "plain-token");
        assert_eq!(cipher.decrypt(&stored).unwrap(), "plain-token");

        // A second run finds nothing left to convert
        let mut tx = pool.begin().await.unwrap();
        let count = encrypt_plaintext_column(&mut tx, &cipher, SecretColumn::GitAccessToken).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(count, 0);

        let after: String = sqlx::query_scalar("SELECT access_token FROM git_connections WHERE access_token IS NOT NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(after, stored);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_every_secret_column_exists(pool: PgPool) {
        let cipher = test_cipher();
        let mut conn = pool.acquire().await.unwrap();

        for column in SecretColumn::ALL {
            let count = encrypt_plaintext_column(&mut conn, &cipher, column).await.unwrap();
            assert_eq!(count, 0);
        }
    }
}
