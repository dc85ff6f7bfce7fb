use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, hash_password, verify_password, DocumentId, TokenKeys};

use crate::store::{LearningStore, WriteOutcome};
use crate::user::{PublicUser, User, DEFAULT_COUNTRY};
use crate::{LearningError, LearningResult};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: PublicUser,
    pub token: String,
}

pub(crate) fn validate_username(username: &str) -> LearningResult<()> {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err(LearningError::validation("username must be 3 to 20 characters"));
    }
    Ok(())
}

fn normalize_email(email: &str) -> LearningResult<String> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(LearningError::validation("invalid email address"));
    }
    Ok(email)
}

fn validate_password(password: &str) -> LearningResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LearningError::validation(format!("password must be at least {} characters", MIN_PASSWORD_LEN)));
    }
    Ok(())
}

async fn hash_off_thread(password: String) -> LearningResult<String> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow!("[hash_off_thread] hashing task failed: {}", e))??;
    Ok(hashed)
}

async fn verify_off_thread(password: String, phc_hash: String) -> LearningResult<bool> {
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &phc_hash))
        .await
        .map_err(|e| anyhow!("[verify_off_thread] verification task failed: {}", e))?;
    Ok(ok)
}

fn issue_session(keys: &TokenKeys, user: &User) -> LearningResult<AuthSession> {
    let token = keys.issue(&user.id, user.role.as_str())?;
    Ok(AuthSession { user: user.to_public(), token })
}

pub async fn register<S: LearningStore + ?Sized>(
    store: &S, keys: &TokenKeys, request: RegisterRequest,
) -> LearningResult<AuthSession> {
    let username = request.username.trim().to_string();
    validate_username(&username)?;
    let email = normalize_email(&request.email)?;
    validate_password(&request.password)?;

    if store.find_user_by_email(&email).await?.is_some()
        || store.find_user_by_username(&username).await?.is_some()
    {
        return Err(LearningError::Conflict("User with this email or username already exists".into()));
    }

    let mut user = User::new(&username, &email, hash_off_thread(request.password).await?);
    if let Some(name) = request.name.filter(|n| !n.trim().is_empty()) {
        user.name = name.trim().to_string();
    }
    user.preferred_country = request.preferred_country
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

    // the unique indexes settle a race between two identical registrations
    if store.insert_user(&user).await? == WriteOutcome::Conflict {
        return Err(LearningError::Conflict("User with this email or username already exists".into()));
    }

    tracing::info!("[register] new user {} ({})", user.username, user.id);
    issue_session(keys, &user)
}

pub async fn login<S: LearningStore + ?Sized>(
    store: &S, keys: &TokenKeys, request: LoginRequest,
) -> LearningResult<AuthSession> {
    let invalid = || LearningError::Unauthorized("Invalid email or password".into());

    let email = request.email.trim().to_lowercase();
    let mut user = store.find_user_by_email(&email).await?.ok_or_else(invalid)?;
    if !verify_off_thread(request.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    user.last_login = get_current_timestamp();
    store.update_user(&user).await?;
    issue_session(keys, &user)
}

pub async fn current_user<S: LearningStore + ?Sized>(store: &S, user_id: &DocumentId) -> LearningResult<User> {
    store.find_user(user_id).await?
        .ok_or_else(|| LearningError::not_found("User"))
}

pub async fn change_password<S: LearningStore + ?Sized>(
    store: &S, user_id: &DocumentId, request: ChangePasswordRequest,
) -> LearningResult<()> {
    let mut user = current_user(store, user_id).await?;
    if !verify_off_thread(request.current_password, user.password_hash.clone()).await? {
        return Err(LearningError::Unauthorized("Current password is incorrect".into()));
    }
    validate_password(&request.new_password)?;

    user.password_hash = hash_off_thread(request.new_password).await?;
    user.updated_at = get_current_timestamp();
    store.update_user(&user).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn keys() -> TokenKeys {
        TokenKeys::new("account-test-secret", 7)
    }

    fn request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "secret-pass".into(),
            name: None,
            preferred_country: None,
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let store = MemoryStore::new();
        let session = register(&store, &keys(), request("patel", "Patel@Example.com")).await.unwrap();
        assert_eq!(session.user.email, "patel@example.com");
        assert_eq!(session.user.name, "patel");
        assert_eq!(session.user.preferred_country, "India");
        assert_eq!(keys().verify(&session.token).unwrap().user_id().unwrap(), session.user.id);

        let login_session = login(&store, &keys(), LoginRequest {
            email: "patel@example.com".into(),
            password: "secret-pass".into(),
        }).await.unwrap();
        assert_eq!(login_session.user.id, session.user.id);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let store = MemoryStore::new();
        register(&store, &keys(), request("bose", "bose@example.com")).await.unwrap();

        let by_email = register(&store, &keys(), request("other", "bose@example.com")).await;
        assert!(matches!(by_email, Err(LearningError::Conflict(_))));
        let by_username = register(&store, &keys(), request("bose", "other@example.com")).await;
        assert!(matches!(by_username, Err(LearningError::Conflict(_))));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let store = MemoryStore::new();
        let short = register(&store, &keys(), request("ab", "ab@example.com")).await;
        assert!(matches!(short, Err(LearningError::Validation(_))));

        let mut weak = request("valid_name", "v@example.com");
        weak.password = "123".into();
        assert!(matches!(register(&store, &keys(), weak).await, Err(LearningError::Validation(_))));

        let bad_email = register(&store, &keys(), request("valid_name", "no-at-sign")).await;
        assert!(matches!(bad_email, Err(LearningError::Validation(_))));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let store = MemoryStore::new();
        register(&store, &keys(), request("azad", "azad@example.com")).await.unwrap();
        let result = login(&store, &keys(), LoginRequest {
            email: "azad@example.com".into(),
            password: "not-the-password".into(),
        }).await;
        assert!(matches!(result, Err(LearningError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn change_password_requires_the_current_one() {
        let store = MemoryStore::new();
        let session = register(&store, &keys(), request("naidu", "naidu@example.com")).await.unwrap();
        let id = session.user.id;

        let wrong = change_password(&store, &id, ChangePasswordRequest {
            current_password: "nope-nope".into(),
            new_password: "brand-new-pass".into(),
        }).await;
        assert!(matches!(wrong, Err(LearningError::Unauthorized(_))));

        change_password(&store, &id, ChangePasswordRequest {
            current_password: "secret-pass".into(),
            new_password: "brand-new-pass".into(),
        }).await.unwrap();

        let relogin = login(&store, &keys(), LoginRequest {
            email: "naidu@example.com".into(),
            password: "brand-new-pass".into(),
        }).await;
        assert!(relogin.is_ok());
    }
}
