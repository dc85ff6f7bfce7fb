mod memory;
mod mongo;

use anyhow::Result;

use civitas_common::DocumentId;

use crate::badge::Badge;
use crate::content::{Content, GameType};
use crate::progress::Progress;
use crate::topic::Topic;
use crate::user::User;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Result of a write guarded by a uniqueness or revision check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// A unique key was taken, or the guarded document changed underneath us.
    Conflict,
}

/// Everything the learning logic reads and writes. Listing methods return
/// active documents only, sorted by `order` where the documents have one.
#[async_trait::async_trait]
pub trait LearningStore: Send + Sync {
    async fn find_user(&self, id: &DocumentId) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn insert_user(&self, user: &User) -> Result<WriteOutcome>;
    /// Full replace; `Conflict` when the new username or email is taken.
    async fn update_user(&self, user: &User) -> Result<WriteOutcome>;
    /// Set-union of `badge_ids` into the user's badge list.
    async fn add_badges(&self, user_id: &DocumentId, badge_ids: &[DocumentId]) -> Result<()>;

    async fn insert_topic(&self, topic: &Topic) -> Result<WriteOutcome>;
    async fn find_topic(&self, id: &DocumentId) -> Result<Option<Topic>>;
    async fn find_topic_by_custom_id(&self, custom_id: &str) -> Result<Option<Topic>>;
    /// Topics by id regardless of the active flag.
    async fn find_topics(&self, ids: &[DocumentId]) -> Result<Vec<Topic>>;
    async fn top_level_topics(&self, country: &str) -> Result<Vec<Topic>>;
    async fn subtopics(&self, parent: &DocumentId) -> Result<Vec<Topic>>;
    async fn countries(&self) -> Result<Vec<String>>;
    async fn search_topics(&self, query: &str, country: Option<&str>, limit: usize) -> Result<Vec<Topic>>;

    async fn insert_content(&self, content: &Content) -> Result<WriteOutcome>;
    async fn find_content(&self, id: &DocumentId) -> Result<Option<Content>>;
    /// Content by id regardless of the active flag.
    async fn find_contents(&self, ids: &[DocumentId]) -> Result<Vec<Content>>;
    async fn topic_contents(&self, topic: &DocumentId) -> Result<Vec<Content>>;
    async fn games_by_type(&self, game_type: GameType) -> Result<Vec<Content>>;
    async fn search_contents(&self, query: &str, limit: usize) -> Result<Vec<Content>>;

    async fn insert_badge(&self, badge: &Badge) -> Result<WriteOutcome>;
    async fn active_badges(&self) -> Result<Vec<Badge>>;
    async fn find_badges(&self, ids: &[DocumentId]) -> Result<Vec<Badge>>;

    async fn find_progress(&self, user: &DocumentId, topic: &DocumentId, country: &str) -> Result<Option<Progress>>;
    /// The user's row for `topic` in whichever country it was recorded.
    async fn find_user_topic_progress(&self, user: &DocumentId, topic: &DocumentId) -> Result<Option<Progress>>;
    /// Most recently updated first.
    async fn user_progress(&self, user: &DocumentId, country: Option<&str>) -> Result<Vec<Progress>>;
    /// `Conflict` when a row for the same (user, topic, country) already exists.
    async fn insert_progress(&self, progress: &Progress) -> Result<WriteOutcome>;
    /// Replaces the stored row only while its revision is still `expected_revision`.
    async fn replace_progress(&self, progress: &Progress, expected_revision: u64) -> Result<WriteOutcome>;
}
