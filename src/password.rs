use crate::domain::user::driven_ports::HashPassword;
use anyhow::{Context, anyhow};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use tokio::task;

/// Hashes passwords with Argon2id and a random salt, producing PHC-format strings
/// such as `$argon2id$v=19$m=19456,t=2,p=1$...`. Hashing is CPU-heavy, so the work
/// runs on tokio's blocking pool.
pub struct Argon2Hasher;

impl HashPassword for Argon2Hasher {
    async fn hash(&self, plaintext: &str) -> Result<String, anyhow::Error> {
        let plaintext = plaintext.to_owned();

        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(plaintext.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|err| anyhow!("Failed to hash password: {err}"))
        })
        .await
        .context("Password hashing task panicked")?
    }

    async fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, anyhow::Error> {
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();

        task::spawn_blocking(move || {
            let parsed_hash =
                PasswordHash::new(&hash).map_err(|err| anyhow!("Invalid password hash format: {err}"))?;

            Ok(Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .context("Password verification task panicked")?
    }
}
