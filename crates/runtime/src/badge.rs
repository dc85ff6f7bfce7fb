use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, DocumentId};
use civitas_database::{doc, IndexModel, IndexOptions, MongoDbObject};

use crate::topic::TopicCategory;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    #[default]
    Achievement,
    Progress,
    Mastery,
    Participation,
    Special,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Threshold a badge without a named rule is checked against.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BadgeRequirement {
    /// Mean completion across every touched topic.
    ProgressThreshold { total_progress: u32 },
    /// Topics at 100%.
    TopicsCompleted { count: u32 },
    QuizAverage {
        average_score: f64,
        #[serde(default)]
        min_quizzes: u32,
    },
    /// Topics at 100% within one category.
    CategoryCount { category: TopicCategory, count: u32 },
    ActivityCount { total_activities: u32 },
    QuizCount { min_quizzes: u32 },
    ScenarioCount { min_scenarios: u32 },
    /// Topics at or above the near-complete threshold.
    CompletedTopics { min_completed_topics: u32 },
    /// Only awarded by a named rule.
    #[default]
    Manual,
}

fn default_icon() -> String { "badge-default.svg".to_string() }
fn default_points() -> u32 { 50 }
fn default_true() -> bool { true }

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(rename = "_id", default)]
    pub id: DocumentId,
    pub name: String,
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub category: BadgeCategory,
    #[serde(default)]
    pub requirements: BadgeRequirement,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub rarity: BadgeRarity,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
}

impl Badge {
    pub fn new(name: &str, description: &str, requirements: BadgeRequirement) -> Self {
        Self {
            id: DocumentId::random(),
            name: name.to_string(),
            description: description.to_string(),
            icon: default_icon(),
            category: BadgeCategory::default(),
            requirements,
            points: default_points(),
            rarity: BadgeRarity::default(),
            is_active: true,
            created_at: get_current_timestamp(),
        }
    }
}

impl MongoDbObject for Badge {
    const COLLECTION_NAME: &'static str = "badges";

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
                .keys(doc! { "name": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ]
    }
}
