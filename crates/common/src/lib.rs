mod crypto;
mod document_id;
mod env;

pub use crypto::{hash_password, verify_password, AuthClaims, TokenKeys};
pub use document_id::DocumentId;
pub use env::{env_or, EnvVars};

pub fn get_current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
