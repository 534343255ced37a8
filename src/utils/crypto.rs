use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(plain.as_bytes(), &salt)?.to_string();
    Ok(password_hash)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hashed)?;
    let ok = Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(ok)
}

static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Runs a full verification against a throwaway hash. Used when the username is
/// unknown so both login failures cost the same.
pub fn burn_verification(plain: &str) {
    let dummy = DUMMY_HASH.get_or_init(|| hash_password("applicant-tracker-dummy").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(plain, hash);
    }
}
