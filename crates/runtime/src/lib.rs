mod error;
mod topic;
mod content;
mod badge;

pub mod user;
pub mod progress;
pub mod achievements;
pub mod catalog;
pub mod store;

pub use error::{LearningError, LearningResult};
pub use topic::{Topic, TopicCategory, TopicDifficulty};
pub use content::{
    Content, ContentType, GameConfig, GameType, Quiz, QuizOption, QuizQuestion,
    QuizGame, Scenario, ScenarioGame, ScenarioOption, MatchingGame, MatchingPair,
    SpiralGame, SpiralLevel, TimelineEvent, TimelineGame,
};
pub use badge::{Badge, BadgeCategory, BadgeRarity, BadgeRequirement};
pub use user::{PublicUser, User, UserRole};
pub use progress::{ActivityRecord, Progress, QuizScore};
pub use achievements::{AchievementOutcome, AchievementStats, RuleRegistry};
pub use store::{LearningStore, MemoryStore, MongoStore, WriteOutcome};
