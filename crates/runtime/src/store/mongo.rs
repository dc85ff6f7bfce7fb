use anyhow::Result;

use civitas_common::DocumentId;
use civitas_database::{bson, connect, doc, is_duplicate_key, Database, Document, MongoDbEnv, MongoDbObject};

use crate::badge::Badge;
use crate::content::{Content, GameType};
use crate::progress::Progress;
use crate::store::{LearningStore, WriteOutcome};
use crate::topic::Topic;
use crate::user::User;

/// `LearningStore` over the MongoDB collections of each model.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connects and makes sure every collection has its indexes.
    pub async fn connect(env: &MongoDbEnv) -> Result<Self> {
        let store = Self::new(connect(env).await?);
        store.ensure_indexes().await?;
        Ok(store)
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        User::ensure_indexes(&self.db).await?;
        Topic::ensure_indexes(&self.db).await?;
        Content::ensure_indexes(&self.db).await?;
        Badge::ensure_indexes(&self.db).await?;
        Progress::ensure_indexes(&self.db).await?;
        tracing::info!("[MongoStore::ensure_indexes] indexes in place");
        Ok(())
    }
}

fn write_outcome(result: Result<()>) -> Result<WriteOutcome> {
    match result {
        Ok(()) => Ok(WriteOutcome::Written),
        Err(e) if is_duplicate_key(&e) => Ok(WriteOutcome::Conflict),
        Err(e) => Err(e),
    }
}

fn hex(ids: &[DocumentId]) -> Vec<String> {
    ids.iter().map(DocumentId::to_hex_string).collect()
}

fn matches_text(query: &str) -> Document {
    doc! { "$regex": regex::escape(query), "$options": "i" }
}

fn by_order() -> Option<Document> {
    Some(doc! { "order": 1 })
}

#[async_trait::async_trait]
impl LearningStore for MongoStore {
    async fn find_user(&self, id: &DocumentId) -> Result<Option<User>> {
        User::select_one_by_index(&self.db, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        User::select_one_by_filter(&self.db, doc! { "email": email }).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        User::select_one_by_filter(&self.db, doc! { "username": username }).await
    }

    async fn insert_user(&self, user: &User) -> Result<WriteOutcome> {
        write_outcome(user.save(&self.db).await)
    }

    async fn update_user(&self, user: &User) -> Result<WriteOutcome> {
        let mut fields = bson::to_document(user)?;
        fields.remove("_id");
        fields.remove("badges");

        let matched = User::update_where(&self.db, User::id_filter(&user.id), doc! { "$set": fields }).await;
        match matched {
            Ok(0) => anyhow::bail!("[MongoStore::update_user] user {} does not exist", user.id),
            Ok(_) => Ok(WriteOutcome::Written),
            Err(e) if is_duplicate_key(&e) => Ok(WriteOutcome::Conflict),
            Err(e) => Err(e),
        }
    }

    async fn add_badges(&self, user_id: &DocumentId, badge_ids: &[DocumentId]) -> Result<()> {
        let update = doc! { "$addToSet": { "badges": { "$each": hex(badge_ids) } } };
        User::update_where(&self.db, User::id_filter(user_id), update).await?;
        Ok(())
    }

    async fn insert_topic(&self, topic: &Topic) -> Result<WriteOutcome> {
        write_outcome(topic.save(&self.db).await)
    }

    async fn find_topic(&self, id: &DocumentId) -> Result<Option<Topic>> {
        Topic::select_one_by_index(&self.db, id).await
    }

    async fn find_topic_by_custom_id(&self, custom_id: &str) -> Result<Option<Topic>> {
        Topic::select_one_by_filter(&self.db, doc! { "customId": custom_id }).await
    }

    async fn find_topics(&self, ids: &[DocumentId]) -> Result<Vec<Topic>> {
        Topic::select_many_by_ids(&self.db, ids).await
    }

    async fn top_level_topics(&self, country: &str) -> Result<Vec<Topic>> {
        let filter = doc! { "country": country, "isActive": true, "parentTopic": null };
        Topic::select_many(&self.db, filter, by_order(), None).await
    }

    async fn subtopics(&self, parent: &DocumentId) -> Result<Vec<Topic>> {
        let filter = doc! { "parentTopic": parent.to_hex_string(), "isActive": true };
        Topic::select_many(&self.db, filter, by_order(), None).await
    }

    async fn countries(&self) -> Result<Vec<String>> {
        Topic::distinct_strings(&self.db, "country", doc! {}).await
    }

    async fn search_topics(&self, query: &str, country: Option<&str>, limit: usize) -> Result<Vec<Topic>> {
        let mut filter = doc! {
            "isActive": true,
            "$or": [ { "title": matches_text(query) }, { "description": matches_text(query) } ],
        };
        if let Some(country) = country {
            filter.insert("country", country);
        }
        Topic::select_many(&self.db, filter, None, Some(limit as i64)).await
    }

    async fn insert_content(&self, content: &Content) -> Result<WriteOutcome> {
        write_outcome(content.save(&self.db).await)
    }

    async fn find_content(&self, id: &DocumentId) -> Result<Option<Content>> {
        Content::select_one_by_index(&self.db, id).await
    }

    async fn find_contents(&self, ids: &[DocumentId]) -> Result<Vec<Content>> {
        Content::select_many_by_ids(&self.db, ids).await
    }

    async fn topic_contents(&self, topic: &DocumentId) -> Result<Vec<Content>> {
        let filter = doc! { "topic": topic.to_hex_string(), "isActive": true };
        Content::select_many(&self.db, filter, by_order(), None).await
    }

    async fn games_by_type(&self, game_type: GameType) -> Result<Vec<Content>> {
        let filter = doc! { "type": "game", "gameConfig.type": game_type.as_str(), "isActive": true };
        Content::select_many(&self.db, filter, by_order(), None).await
    }

    async fn search_contents(&self, query: &str, limit: usize) -> Result<Vec<Content>> {
        let filter = doc! {
            "isActive": true,
            "$or": [ { "title": matches_text(query) }, { "content": matches_text(query) } ],
        };
        Content::select_many(&self.db, filter, None, Some(limit as i64)).await
    }

    async fn insert_badge(&self, badge: &Badge) -> Result<WriteOutcome> {
        write_outcome(badge.save(&self.db).await)
    }

    async fn active_badges(&self) -> Result<Vec<Badge>> {
        Badge::select_many(&self.db, doc! { "isActive": true }, Some(doc! { "name": 1 }), None).await
    }

    async fn find_badges(&self, ids: &[DocumentId]) -> Result<Vec<Badge>> {
        Badge::select_many_by_ids(&self.db, ids).await
    }

    async fn find_progress(&self, user: &DocumentId, topic: &DocumentId, country: &str) -> Result<Option<Progress>> {
        let filter = doc! { "user": user.to_hex_string(), "topic": topic.to_hex_string(), "country": country };
        Progress::select_one_by_filter(&self.db, filter).await
    }

    async fn find_user_topic_progress(&self, user: &DocumentId, topic: &DocumentId) -> Result<Option<Progress>> {
        let filter = doc! { "user": user.to_hex_string(), "topic": topic.to_hex_string() };
        Progress::select_one_by_filter(&self.db, filter).await
    }

    async fn user_progress(&self, user: &DocumentId, country: Option<&str>) -> Result<Vec<Progress>> {
        let mut filter = doc! { "user": user.to_hex_string() };
        if let Some(country) = country {
            filter.insert("country", country);
        }
        Progress::select_many(&self.db, filter, Some(doc! { "lastUpdated": -1 }), None).await
    }

    async fn insert_progress(&self, progress: &Progress) -> Result<WriteOutcome> {
        write_outcome(progress.save(&self.db).await)
    }

    async fn replace_progress(&self, progress: &Progress, expected_revision: u64) -> Result<WriteOutcome> {
        let revision = expected_revision as i64;
        let guard = doc! { "revision": revision };
        match progress.replace_where(&self.db, guard).await? {
            true => Ok(WriteOutcome::Written),
            false => Ok(WriteOutcome::Conflict),
        }
    }
}
