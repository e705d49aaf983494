use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

fn argon2() -> Argon2<'static> {
    Argon2::default()
}

/// PHC-encoded Argon2id hash of a registration password, salted from the OS RNG.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "could not hash registration password");
            PasswordError::Hashing(e.to_string())
        })
}

/// Checks a login password against the stored hash. A mismatch is `Ok(false)`;
/// only an unreadable stored hash is an error.
pub fn verify_password(plain: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let stored = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "stored user password hash is unreadable");
        PasswordError::MalformedHash(e.to_string())
    })?;
    match argon2().verify_password(plain.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            warn!(error = %e, "password verification failed");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_password_verifies_at_login() {
        let password = "secret1";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn stored_hash_hides_password_and_differs_per_user() {
        let first = hash_password("secret1").expect("hash");
        let second = hash_password("secret1").expect("hash");
        assert!(!first.contains("secret1"));
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
    }

    #[test]
    fn wrong_login_password_is_a_mismatch() {
        let hash = hash_password("correct-horse").expect("hashing should succeed");
        assert!(!verify_password("wrong-horse", &hash).expect("verify should not error"));
    }

    #[test]
    fn corrupted_stored_hash_is_an_error() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, PasswordError::MalformedHash(_)));
    }
}
