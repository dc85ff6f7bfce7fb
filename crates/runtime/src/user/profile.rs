use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, DocumentId};

use crate::store::{LearningStore, WriteOutcome};
use crate::user::account::{current_user, validate_username};
use crate::user::User;
use crate::{LearningError, LearningResult};

/// Editable profile fields; absent fields are left untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub name: Option<String>,
    pub preferred_country: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.name.is_none()
            && self.preferred_country.is_none()
            && self.profile_picture.is_none()
    }
}

pub async fn update_profile<S: LearningStore + ?Sized>(
    store: &S, user_id: &DocumentId, update: ProfileUpdate,
) -> LearningResult<User> {
    let mut user = current_user(store, user_id).await?;
    if update.is_empty() {
        return Ok(user);
    }

    if let Some(username) = update.username.map(|u| u.trim().to_string()) {
        if username != user.username {
            validate_username(&username)?;
            if let Some(other) = store.find_user_by_username(&username).await? {
                if other.id != user.id {
                    return Err(LearningError::Conflict("Username is already taken".into()));
                }
            }
            user.username = username;
        }
    }
    if let Some(name) = update.name {
        user.name = name.trim().to_string();
    }
    if let Some(country) = update.preferred_country.filter(|c| !c.trim().is_empty()) {
        user.preferred_country = country.trim().to_string();
    }
    if let Some(picture) = update.profile_picture {
        user.profile_picture = picture;
    }
    user.updated_at = get_current_timestamp();

    if store.update_user(&user).await? == WriteOutcome::Conflict {
        return Err(LearningError::Conflict("Username is already taken".into()));
    }
    tracing::debug!("[update_profile] updated user {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, username: &str) -> User {
        let user = User::new(username, &format!("{}@example.com", username), "hash".into());
        store.insert_user(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn updates_only_given_fields() {
        let store = MemoryStore::new();
        let user = seed(&store, "kalam").await;

        let updated = update_profile(&store, &user.id, ProfileUpdate {
            preferred_country: Some("United States".into()),
            ..Default::default()
        }).await.unwrap();

        assert_eq!(updated.preferred_country, "United States");
        assert_eq!(updated.username, "kalam");
        assert_eq!(updated.name, "kalam");
    }

    #[tokio::test]
    async fn taken_username_conflicts() {
        let store = MemoryStore::new();
        seed(&store, "sarojini").await;
        let user = seed(&store, "tilak").await;

        let result = update_profile(&store, &user.id, ProfileUpdate {
            username: Some("sarojini".into()),
            ..Default::default()
        }).await;
        assert!(matches!(result, Err(LearningError::Conflict(_))));
    }

    #[tokio::test]
    async fn keeping_own_username_is_fine() {
        let store = MemoryStore::new();
        let user = seed(&store, "gokhale").await;
        let updated = update_profile(&store, &user.id, ProfileUpdate {
            username: Some("gokhale".into()),
            name: Some("G. K. Gokhale".into()),
            ..Default::default()
        }).await.unwrap();
        assert_eq!(updated.name, "G. K. Gokhale");
    }
}
