use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Prefix marking a password hash that can never verify (OAuth-only accounts).
const UNUSABLE_PREFIX: &str = "!oauth$";

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    if is_unusable(hash) {
        return Ok(false);
    }
    let parsed_hash = PasswordHash::new(hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// A random value that is not a PHC string, so no password ever matches it.
pub fn unusable_hash() -> String {
    format!("{UNUSABLE_PREFIX}{}", crate::auth::csrf::generate_token())
}

pub fn is_unusable(hash: &str) -> bool {
    hash.starts_with(UNUSABLE_PREFIX)
}
