use std::collections::{HashMap, HashSet};

use civitas_common::DocumentId;

use crate::content::Content;
use crate::progress::Progress;
use crate::topic::{Topic, TopicCategory};

/// Quiz score that counts as a high score.
pub const HIGH_SCORE: u32 = 80;
pub const PERFECT_SCORE: u32 = 95;
/// Completion at which a topic counts as completed (as opposed to mastered at 100).
pub const NEAR_COMPLETE: u32 = 90;

/// Title words that unlock the themed scholar badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleKeyword {
    Preamble,
    Rights,
    Amendment,
}

impl TitleKeyword {
    pub const ALL: [TitleKeyword; 3] = [TitleKeyword::Preamble, TitleKeyword::Rights, TitleKeyword::Amendment];

    /// Lowercase substring matched against content titles.
    pub fn needle(&self) -> &'static str {
        match self {
            TitleKeyword::Preamble => "preamble",
            TitleKeyword::Rights => "right",
            TitleKeyword::Amendment => "amendment",
        }
    }
}

/// Aggregate view of everything a user has done, the input of every badge rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementStats {
    /// Topics with a progress row.
    pub tracked_topics: usize,
    pub total_quizzes: usize,
    pub high_score_quizzes: usize,
    pub perfect_score_quizzes: usize,
    /// Completed scenario-game activities.
    pub total_scenarios: usize,
    /// Topics at or above `NEAR_COMPLETE`.
    pub completed_topics: usize,
    /// Topics at 100%.
    pub mastered_topics: usize,
    pub mastered_by_category: HashMap<TopicCategory, usize>,
    /// Rounded mean completion over tracked topics.
    pub overall_progress: u32,
    pub average_quiz_score: f64,
    pub total_activities: usize,
    pub keyword_hits: HashSet<TitleKeyword>,
}

impl AchievementStats {
    /// `contents` and `topics` must hold whatever the progress rows reference;
    /// missing entries are treated as unknown content and skipped.
    pub fn collect(
        progress: &[Progress],
        contents: &HashMap<DocumentId, Content>,
        topics: &HashMap<DocumentId, Topic>,
    ) -> Self {
        let mut stats = AchievementStats {
            tracked_topics: progress.len(),
            ..Default::default()
        };

        let mut score_sum = 0u64;
        let mut completion_sum = 0u64;
        for row in progress {
            completion_sum += row.completion_percentage as u64;
            if row.completion_percentage >= NEAR_COMPLETE {
                stats.completed_topics += 1;
            }
            if row.is_complete() {
                stats.mastered_topics += 1;
                if let Some(topic) = topics.get(&row.topic) {
                    *stats.mastered_by_category.entry(topic.category).or_default() += 1;
                }
            }

            for quiz in &row.quiz_scores {
                stats.total_quizzes += 1;
                score_sum += quiz.score as u64;
                if quiz.score >= HIGH_SCORE {
                    stats.high_score_quizzes += 1;
                }
                if quiz.score >= PERFECT_SCORE {
                    stats.perfect_score_quizzes += 1;
                }
                stats.note_keywords(contents.get(&quiz.quiz_id), quiz.score);
            }

            for activity in &row.activities {
                stats.total_activities += 1;
                let content = contents.get(&activity.activity_id);
                if activity.completed && content.is_some_and(Content::is_scenario_game) {
                    stats.total_scenarios += 1;
                }
                stats.note_keywords(content, activity.score);
            }
        }

        if stats.tracked_topics > 0 {
            stats.overall_progress = (completion_sum as f64 / stats.tracked_topics as f64).round() as u32;
        }
        if stats.total_quizzes > 0 {
            stats.average_quiz_score = score_sum as f64 / stats.total_quizzes as f64;
        }
        stats
    }

    fn note_keywords(&mut self, content: Option<&Content>, score: u32) {
        let Some(content) = content else { return };
        if score < HIGH_SCORE {
            return;
        }
        for keyword in TitleKeyword::ALL {
            if content.title_contains(keyword.needle()) {
                self.keyword_hits.insert(keyword);
            }
        }
    }

    pub fn has_keyword(&self, keyword: TitleKeyword) -> bool {
        self.keyword_hits.contains(&keyword)
    }

    pub fn mastered_in(&self, category: TopicCategory) -> usize {
        self.mastered_by_category.get(&category).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentType, GameConfig, ScenarioGame};

    fn keyed<T: Clone>(items: &[T], id: impl Fn(&T) -> DocumentId) -> HashMap<DocumentId, T> {
        items.iter().map(|i| (id(i), i.clone())).collect()
    }

    #[test]
    fn counts_quizzes_by_threshold() {
        let topic = Topic::new("Rights", "India", TopicCategory::FundamentalRights);
        let quizzes: Vec<Content> = (0..3)
            .map(|i| Content::new(topic.id, &format!("Quiz {}", i), ContentType::Quiz))
            .collect();

        let mut row = Progress::new(DocumentId::random(), topic.id, "India");
        row.record_quiz(quizzes[0].id, 79, 1);
        row.record_quiz(quizzes[1].id, 80, 1);
        row.record_quiz(quizzes[2].id, 96, 1);

        let stats = AchievementStats::collect(
            &[row],
            &keyed(&quizzes, |c| c.id),
            &keyed(&[topic], |t| t.id),
        );
        assert_eq!(stats.total_quizzes, 3);
        assert_eq!(stats.high_score_quizzes, 2);
        assert_eq!(stats.perfect_score_quizzes, 1);
        assert!((stats.average_quiz_score - 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn only_completed_scenarios_count() {
        let topic = Topic::new("Judiciary", "India", TopicCategory::Judiciary);
        let mut scenario = Content::new(topic.id, "Court case", ContentType::Game);
        scenario.game_config = Some(GameConfig::Scenario(ScenarioGame { scenarios: vec![] }));
        let mut other = scenario.clone();
        other.id = DocumentId::random();

        let mut row = Progress::new(DocumentId::random(), topic.id, "India");
        row.record_activity(scenario.id, true, 0, 1);
        row.record_activity(other.id, false, 0, 1);

        let stats = AchievementStats::collect(&[row], &keyed(&[scenario, other], |c| c.id), &HashMap::new());
        assert_eq!(stats.total_scenarios, 1);
        assert_eq!(stats.total_activities, 2);
    }

    #[test]
    fn keyword_needs_a_high_score() {
        let topic = Topic::new("Preamble", "India", TopicCategory::Other);
        let low = Content::new(topic.id, "Amendment basics", ContentType::Quiz);
        let high = Content::new(topic.id, "The Preamble", ContentType::Quiz);

        let mut row = Progress::new(DocumentId::random(), topic.id, "India");
        row.record_quiz(low.id, 60, 1);
        row.record_quiz(high.id, 85, 1);

        let stats = AchievementStats::collect(&[row], &keyed(&[low, high], |c| c.id), &HashMap::new());
        assert!(stats.has_keyword(TitleKeyword::Preamble));
        assert!(!stats.has_keyword(TitleKeyword::Amendment));
    }

    #[test]
    fn mastered_topics_are_grouped_by_category() {
        let judiciary = Topic::new("Courts", "India", TopicCategory::Judiciary);
        let executive = Topic::new("President", "India", TopicCategory::Executive);
        let user = DocumentId::random();

        let mut done = Progress::new(user, judiciary.id, "India");
        done.completion_percentage = 100;
        let mut nearly = Progress::new(user, executive.id, "India");
        nearly.completion_percentage = 92;

        let stats = AchievementStats::collect(
            &[done, nearly],
            &HashMap::new(),
            &keyed(&[judiciary, executive], |t| t.id),
        );
        assert_eq!(stats.completed_topics, 2);
        assert_eq!(stats.mastered_topics, 1);
        assert_eq!(stats.mastered_in(TopicCategory::Judiciary), 1);
        assert_eq!(stats.mastered_in(TopicCategory::Executive), 0);
        assert_eq!(stats.overall_progress, 96);
    }
}
