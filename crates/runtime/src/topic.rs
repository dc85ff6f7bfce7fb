use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, DocumentId};
use civitas_database::{doc, IndexModel, IndexOptions, MongoDbObject};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TopicCategory {
    FundamentalRights,
    DirectivePrinciples,
    Judiciary,
    Legislature,
    Executive,
    Amendments,
    #[default]
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TopicDifficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

fn default_icon() -> String { "default-icon.svg".to_string() }
fn default_color() -> String { "#3498db".to_string() }
fn default_true() -> bool { true }

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(rename = "_id", default)]
    pub id: DocumentId,
    /// Human-readable slug; absent rather than null so the sparse unique index skips it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,

    pub title: String,
    pub description: String,
    pub country: String,
    pub category: TopicCategory,
    #[serde(default)]
    pub difficulty: TopicDifficulty,

    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub parent_topic: Option<DocumentId>,

    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Topic {
    pub fn new(title: &str, country: &str, category: TopicCategory) -> Self {
        let now = get_current_timestamp();
        Self {
            id: DocumentId::random(),
            custom_id: None,
            title: title.to_string(),
            description: String::new(),
            country: country.to_string(),
            category,
            difficulty: TopicDifficulty::default(),
            icon: default_icon(),
            color: default_color(),
            order: 0,
            is_active: true,
            parent_topic: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_topic.is_none()
    }
}

impl MongoDbObject for Topic {
    const COLLECTION_NAME: &'static str = "topics";

    fn populate_id(&mut self) {
        if self.id.is_nil() {
            self.id = DocumentId::random();
        }
    }

    fn get_id(&self) -> DocumentId {
        self.id
    }

    fn indexes() -> Vec<IndexModel> {
        vec![
            IndexModel::builder()
                .keys(doc! { "country": 1, "category": 1, "order": 1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "customId": 1 })
                .options(IndexOptions::builder().unique(true).sparse(true).build())
                .build(),
        ]
    }
}
