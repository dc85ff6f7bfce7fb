mod account;
mod profile;

use std::fmt;

use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, DocumentId};
use civitas_database::{doc, IndexModel, IndexOptions, MongoDbObject};

pub use account::{change_password, current_user, login, register, AuthSession, ChangePasswordRequest, LoginRequest, RegisterRequest};
pub use profile::{update_profile, ProfileUpdate};

pub const DEFAULT_COUNTRY: &str = "India";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub username: String,
    pub email: String,
    /// argon2 PHC string; never leaves the server.
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preferred_country: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub profile_picture: String,
    /// Earned badge ids, each present at most once.
    #[serde(default)]
    pub badges: Vec<DocumentId>,

    #[serde(default)]
    pub last_login: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl User {
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        let now = get_current_timestamp();
        Self {
            id: DocumentId::random(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            name: username.to_string(),
            preferred_country: DEFAULT_COUNTRY.to_string(),
            role: UserRole::User,
            profile_picture: String::new(),
            badges: Vec::new(),
            last_login: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_badge(&self, badge_id: &DocumentId) -> bool {
        self.badges.contains(badge_id)
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            preferred_country: self.preferred_country.clone(),
            role: self.role,
            profile_picture: self.profile_picture.clone(),
            badges: self.badges.clone(),
            last_login: self.last_login,
            created_at: self.created_at,
        }
    }
}

impl MongoDbObject for User {
    const COLLECTION_NAME: &'static str = "users";

    fn populate_id(&mut self) {
        if self.id.is_nil() {
            self.id = DocumentId::random();
        }
    }

    fn get_id(&self) -> DocumentId {
        self.id
    }

    fn indexes() -> Vec<IndexModel> {
        let unique = || IndexOptions::builder().unique(true).build();
        vec![
            IndexModel::builder().keys(doc! { "username": 1 }).options(unique()).build(),
            IndexModel::builder().keys(doc! { "email": 1 }).options(unique()).build(),
        ]
    }
}

/// What a client may see of a user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: DocumentId,
    pub username: String,
    pub email: String,
    pub name: String,
    pub preferred_country: String,
    pub role: UserRole,
    pub profile_picture: String,
    pub badges: Vec<DocumentId>,
    pub last_login: i64,
    pub created_at: i64,
}
