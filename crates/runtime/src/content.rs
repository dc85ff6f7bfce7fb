use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, DocumentId};
use civitas_database::{doc, IndexModel, MongoDbObject};

use crate::{LearningError, LearningResult};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Lesson,
    Quiz,
    Game,
    Article,
    Video,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Quiz,
    Scenario,
    Matching,
    Spiral,
    Timeline,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Quiz => "quiz",
            GameType::Scenario => "scenario",
            GameType::Matching => "matching",
            GameType::Spiral => "spiral",
            GameType::Timeline => "timeline",
        }
    }
}

impl std::str::FromStr for GameType {
    type Err = LearningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiz" => Ok(GameType::Quiz),
            "scenario" => Ok(GameType::Scenario),
            "matching" => Ok(GameType::Matching),
            "spiral" => Ok(GameType::Spiral),
            "timeline" => Ok(GameType::Timeline),
            other => Err(LearningError::validation(format!("unknown game type `{}`", other))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<QuizOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    fn validate(&self, index: usize) -> LearningResult<()> {
        if self.options.len() < 2 {
            return Err(LearningError::validation(format!("question {} needs at least two options", index + 1)));
        }
        if !self.options.iter().any(|o| o.is_correct) {
            return Err(LearningError::validation(format!("question {} has no correct option", index + 1)));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Quiz {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizGame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<u32>,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub title: String,
    pub situation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub options: Vec<ScenarioOption>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScenarioGame {
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchingPair {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchingGame {
    pub pairs: Vec<MatchingPair>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpiralLevel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpiralGame {
    pub levels: Vec<SpiralLevel>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimelineEvent {
    pub year: i32,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimelineGame {
    pub events: Vec<TimelineEvent>,
}

/// Game payload, stored as `{ "type": <game type>, "config": { .. } }`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum GameConfig {
    Quiz(QuizGame),
    Scenario(ScenarioGame),
    Matching(MatchingGame),
    Spiral(SpiralGame),
    Timeline(TimelineGame),
}

impl GameConfig {
    pub fn game_type(&self) -> GameType {
        match self {
            GameConfig::Quiz(_) => GameType::Quiz,
            GameConfig::Scenario(_) => GameType::Scenario,
            GameConfig::Matching(_) => GameType::Matching,
            GameConfig::Spiral(_) => GameType::Spiral,
            GameConfig::Timeline(_) => GameType::Timeline,
        }
    }

    pub fn validate(&self) -> LearningResult<()> {
        match self {
            GameConfig::Quiz(quiz) => {
                if quiz.questions.is_empty() {
                    return Err(LearningError::validation("quiz game has no questions"));
                }
                if quiz.passing_score.is_some_and(|s| s > 100) {
                    return Err(LearningError::validation("passing score must be within 0..=100"));
                }
                quiz.questions.iter().enumerate().try_for_each(|(i, q)| q.validate(i))
            }
            GameConfig::Scenario(game) => {
                if game.scenarios.is_empty() {
                    return Err(LearningError::validation("scenario game has no scenarios"));
                }
                for (i, scenario) in game.scenarios.iter().enumerate() {
                    if !scenario.options.iter().any(|o| o.is_correct) {
                        return Err(LearningError::validation(format!("scenario {} has no correct option", i + 1)));
                    }
                }
                Ok(())
            }
            GameConfig::Matching(game) if game.pairs.is_empty() => {
                Err(LearningError::validation("matching game has no pairs"))
            }
            GameConfig::Spiral(game) if game.levels.iter().all(|l| l.items.is_empty()) => {
                Err(LearningError::validation("spiral game has no items"))
            }
            GameConfig::Timeline(game) if game.events.len() < 2 => {
                Err(LearningError::validation("timeline game needs at least two events"))
            }
            _ => Ok(()),
        }
    }
}

fn default_true() -> bool { true }
fn default_estimated_time() -> u32 { 5 }
fn default_points() -> u32 { 10 }

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(rename = "_id", default)]
    pub id: DocumentId,
    pub topic: DocumentId,

    pub title: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Lesson or article body.
    pub content: String,

    #[serde(default)]
    pub order: i32,
    /// Minutes.
    #[serde(default = "default_estimated_time")]
    pub estimated_time: u32,
    #[serde(default = "default_points")]
    pub points: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_config: Option<GameConfig>,

    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Content {
    pub fn new(topic: DocumentId, title: &str, content_type: ContentType) -> Self {
        let now = get_current_timestamp();
        Self {
            id: DocumentId::random(),
            topic,
            title: title.to_string(),
            content_type,
            content: String::new(),
            order: 0,
            estimated_time: default_estimated_time(),
            points: default_points(),
            quiz: None,
            game_config: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn game_type(&self) -> Option<GameType> {
        match self.content_type {
            ContentType::Game => self.game_config.as_ref().map(GameConfig::game_type),
            _ => None,
        }
    }

    pub fn is_scenario_game(&self) -> bool {
        self.game_type() == Some(GameType::Scenario)
    }

    pub fn title_contains(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
    }

    pub fn validate(&self) -> LearningResult<()> {
        if self.title.trim().is_empty() {
            return Err(LearningError::validation("content title is required"));
        }
        if let Some(quiz) = &self.quiz {
            quiz.questions.iter().enumerate().try_for_each(|(i, q)| q.validate(i))?;
        }
        match (&self.content_type, &self.game_config) {
            (ContentType::Game, None) => Err(LearningError::validation("game content requires a game config")),
            (ContentType::Game, Some(config)) => config.validate(),
            (_, Some(_)) => Err(LearningError::validation("only game content may carry a game config")),
            _ => Ok(()),
        }
    }
}

impl MongoDbObject for Content {
    const COLLECTION_NAME: &'static str = "contents";

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
                .keys(doc! { "topic": 1, "type": 1, "order": 1 })
                .build(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn game_config_uses_type_and_config_keys() {
        let config: GameConfig = serde_json::from_value(json!({
            "type": "timeline",
            "config": { "events": [
                { "year": 1950, "event": "Constitution comes into force" },
                { "year": 1976, "event": "42nd Amendment" }
            ]}
        })).unwrap();

        assert_eq!(config.game_type(), GameType::Timeline);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn scenario_game_is_detected() {
        let mut content = Content::new(DocumentId::random(), "Defend Article 21", ContentType::Game);
        content.game_config = Some(GameConfig::Scenario(ScenarioGame {
            scenarios: vec![Scenario {
                title: "Detention".into(),
                situation: "A citizen is detained without trial.".into(),
                hint: None,
                options: vec![
                    ScenarioOption { text: "File habeas corpus".into(), is_correct: true, feedback: None },
                    ScenarioOption { text: "Do nothing".into(), is_correct: false, feedback: None },
                ],
            }],
        }));

        assert!(content.is_scenario_game());
        assert!(content.validate().is_ok());
    }

    #[test]
    fn game_without_config_is_rejected() {
        let content = Content::new(DocumentId::random(), "Matching", ContentType::Game);
        assert!(matches!(content.validate(), Err(LearningError::Validation(_))));
    }

    #[test]
    fn quiz_question_without_correct_option_is_rejected() {
        let config = GameConfig::Quiz(QuizGame {
            time_limit: None,
            passing_score: Some(70),
            questions: vec![QuizQuestion {
                question: "Who is the head of state?".into(),
                options: vec![
                    QuizOption { text: "Prime Minister".into(), is_correct: false },
                    QuizOption { text: "Chief Justice".into(), is_correct: false },
                ],
                explanation: None,
            }],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_game_type_from_path_segment() {
        assert_eq!("spiral".parse::<GameType>().unwrap(), GameType::Spiral);
        assert!("chess".parse::<GameType>().is_err());
    }
}
