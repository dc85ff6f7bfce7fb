use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::RwLock;

use civitas_common::DocumentId;

use crate::badge::Badge;
use crate::content::{Content, ContentType, GameType};
use crate::progress::Progress;
use crate::store::{LearningStore, WriteOutcome};
use crate::topic::Topic;
use crate::user::User;

#[derive(Default)]
struct Tables {
    users: HashMap<DocumentId, User>,
    topics: HashMap<DocumentId, Topic>,
    contents: HashMap<DocumentId, Content>,
    badges: HashMap<DocumentId, Badge>,
    progress: HashMap<DocumentId, Progress>,
}

/// Process-local store. One lock over every table keeps the uniqueness
/// checks and revision checks atomic, the way the database indexes do.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn by_order<T>(mut items: Vec<T>, order: impl Fn(&T) -> i32) -> Vec<T> {
    items.sort_by_key(order);
    items
}

#[async_trait::async_trait]
impl LearningStore for MemoryStore {
    async fn find_user(&self, id: &DocumentId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<WriteOutcome> {
        let mut tables = self.tables.write().await;
        let taken = tables.users.contains_key(&user.id)
            || tables.users.values().any(|u| u.username == user.username || u.email == user.email);
        if taken {
            return Ok(WriteOutcome::Conflict);
        }
        tables.users.insert(user.id, user.clone());
        Ok(WriteOutcome::Written)
    }

    async fn update_user(&self, user: &User) -> Result<WriteOutcome> {
        let mut tables = self.tables.write().await;
        let taken = tables.users.values()
            .any(|u| u.id != user.id && (u.username == user.username || u.email == user.email));
        if taken {
            return Ok(WriteOutcome::Conflict);
        }
        match tables.users.get_mut(&user.id) {
            Some(stored) => {
                // badge awards go through add_badges only
                let badges = std::mem::take(&mut stored.badges);
                *stored = user.clone();
                stored.badges = badges;
            }
            None => anyhow::bail!("[MemoryStore::update_user] user {} does not exist", user.id),
        }
        Ok(WriteOutcome::Written)
    }

    async fn add_badges(&self, user_id: &DocumentId, badge_ids: &[DocumentId]) -> Result<()> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(user_id)
            .ok_or_else(|| anyhow::anyhow!("[MemoryStore::add_badges] user {} does not exist", user_id))?;
        for id in badge_ids {
            if !user.badges.contains(id) {
                user.badges.push(*id);
            }
        }
        Ok(())
    }

    async fn insert_topic(&self, topic: &Topic) -> Result<WriteOutcome> {
        let mut tables = self.tables.write().await;
        let slug_taken = topic.custom_id.as_ref().is_some_and(|slug| {
            tables.topics.values().any(|t| t.custom_id.as_ref() == Some(slug))
        });
        if slug_taken || tables.topics.contains_key(&topic.id) {
            return Ok(WriteOutcome::Conflict);
        }
        tables.topics.insert(topic.id, topic.clone());
        Ok(WriteOutcome::Written)
    }

    async fn find_topic(&self, id: &DocumentId) -> Result<Option<Topic>> {
        Ok(self.tables.read().await.topics.get(id).cloned())
    }

    async fn find_topic_by_custom_id(&self, custom_id: &str) -> Result<Option<Topic>> {
        let tables = self.tables.read().await;
        Ok(tables.topics.values().find(|t| t.custom_id.as_deref() == Some(custom_id)).cloned())
    }

    async fn find_topics(&self, ids: &[DocumentId]) -> Result<Vec<Topic>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.topics.get(id).cloned()).collect())
    }

    async fn top_level_topics(&self, country: &str) -> Result<Vec<Topic>> {
        let tables = self.tables.read().await;
        let topics: Vec<Topic> = tables.topics.values()
            .filter(|t| t.is_active && t.country == country && t.is_top_level())
            .cloned()
            .collect();
        Ok(by_order(topics, |t| t.order))
    }

    async fn subtopics(&self, parent: &DocumentId) -> Result<Vec<Topic>> {
        let tables = self.tables.read().await;
        let topics: Vec<Topic> = tables.topics.values()
            .filter(|t| t.is_active && t.parent_topic.as_ref() == Some(parent))
            .cloned()
            .collect();
        Ok(by_order(topics, |t| t.order))
    }

    async fn countries(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        let mut countries: Vec<String> = tables.topics.values().map(|t| t.country.clone()).collect();
        countries.sort();
        countries.dedup();
        Ok(countries)
    }

    async fn search_topics(&self, query: &str, country: Option<&str>, limit: usize) -> Result<Vec<Topic>> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.topics.values()
            .filter(|t| t.is_active && country.map_or(true, |c| t.country == c))
            .filter(|t| contains_ci(&t.title, &needle) || contains_ci(&t.description, &needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_content(&self, content: &Content) -> Result<WriteOutcome> {
        let mut tables = self.tables.write().await;
        if tables.contents.contains_key(&content.id) {
            return Ok(WriteOutcome::Conflict);
        }
        tables.contents.insert(content.id, content.clone());
        Ok(WriteOutcome::Written)
    }

    async fn find_content(&self, id: &DocumentId) -> Result<Option<Content>> {
        Ok(self.tables.read().await.contents.get(id).cloned())
    }

    async fn find_contents(&self, ids: &[DocumentId]) -> Result<Vec<Content>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.contents.get(id).cloned()).collect())
    }

    async fn topic_contents(&self, topic: &DocumentId) -> Result<Vec<Content>> {
        let tables = self.tables.read().await;
        let contents: Vec<Content> = tables.contents.values()
            .filter(|c| c.is_active && c.topic == *topic)
            .cloned()
            .collect();
        Ok(by_order(contents, |c| c.order))
    }

    async fn games_by_type(&self, game_type: GameType) -> Result<Vec<Content>> {
        let tables = self.tables.read().await;
        let games: Vec<Content> = tables.contents.values()
            .filter(|c| c.is_active && c.content_type == ContentType::Game && c.game_type() == Some(game_type))
            .cloned()
            .collect();
        Ok(by_order(games, |c| c.order))
    }

    async fn search_contents(&self, query: &str, limit: usize) -> Result<Vec<Content>> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.contents.values()
            .filter(|c| c.is_active)
            .filter(|c| contains_ci(&c.title, &needle) || contains_ci(&c.content, &needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_badge(&self, badge: &Badge) -> Result<WriteOutcome> {
        let mut tables = self.tables.write().await;
        if tables.badges.contains_key(&badge.id) || tables.badges.values().any(|b| b.name == badge.name) {
            return Ok(WriteOutcome::Conflict);
        }
        tables.badges.insert(badge.id, badge.clone());
        Ok(WriteOutcome::Written)
    }

    async fn active_badges(&self) -> Result<Vec<Badge>> {
        let tables = self.tables.read().await;
        let mut badges: Vec<Badge> = tables.badges.values().filter(|b| b.is_active).cloned().collect();
        badges.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(badges)
    }

    async fn find_badges(&self, ids: &[DocumentId]) -> Result<Vec<Badge>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.badges.get(id).cloned()).collect())
    }

    async fn find_progress(&self, user: &DocumentId, topic: &DocumentId, country: &str) -> Result<Option<Progress>> {
        let tables = self.tables.read().await;
        Ok(tables.progress.values()
            .find(|p| p.user == *user && p.topic == *topic && p.country == country)
            .cloned())
    }

    async fn find_user_topic_progress(&self, user: &DocumentId, topic: &DocumentId) -> Result<Option<Progress>> {
        let tables = self.tables.read().await;
        Ok(tables.progress.values()
            .find(|p| p.user == *user && p.topic == *topic)
            .cloned())
    }

    async fn user_progress(&self, user: &DocumentId, country: Option<&str>) -> Result<Vec<Progress>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Progress> = tables.progress.values()
            .filter(|p| p.user == *user && country.map_or(true, |c| p.country == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(rows)
    }

    async fn insert_progress(&self, progress: &Progress) -> Result<WriteOutcome> {
        let mut tables = self.tables.write().await;
        let exists = tables.progress.contains_key(&progress.id)
            || tables.progress.values().any(|p| {
                p.user == progress.user && p.topic == progress.topic && p.country == progress.country
            });
        if exists {
            return Ok(WriteOutcome::Conflict);
        }
        tables.progress.insert(progress.id, progress.clone());
        Ok(WriteOutcome::Written)
    }

    async fn replace_progress(&self, progress: &Progress, expected_revision: u64) -> Result<WriteOutcome> {
        let mut tables = self.tables.write().await;
        match tables.progress.get_mut(&progress.id) {
            Some(stored) if stored.revision == expected_revision => {
                *stored = progress.clone();
                Ok(WriteOutcome::Written)
            }
            _ => Ok(WriteOutcome::Conflict),
        }
    }
}
