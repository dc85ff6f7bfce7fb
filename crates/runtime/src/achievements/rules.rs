use std::collections::HashMap;
use std::fmt;

use crate::achievements::stats::{AchievementStats, TitleKeyword};
use crate::badge::{Badge, BadgeRequirement};

pub const QUIZ_MASTER: &str = "Quiz Master";
pub const CONSTITUTION_DEFENDER: &str = "Constitution Defender";
pub const PREAMBLE_SCHOLAR: &str = "Preamble Scholar";
pub const RIGHTS_EXPERT: &str = "Rights Expert";
pub const AMENDMENT_TRACKER: &str = "Amendment Tracker";

pub type BadgeRule = fn(&AchievementStats) -> bool;

fn quiz_master(stats: &AchievementStats) -> bool {
    stats.high_score_quizzes >= 5
}

fn constitution_defender(stats: &AchievementStats) -> bool {
    stats.total_scenarios >= 3
}

fn preamble_scholar(stats: &AchievementStats) -> bool {
    stats.has_keyword(TitleKeyword::Preamble)
}

fn rights_expert(stats: &AchievementStats) -> bool {
    stats.has_keyword(TitleKeyword::Rights)
}

fn amendment_tracker(stats: &AchievementStats) -> bool {
    stats.has_keyword(TitleKeyword::Amendment)
}

/// Predicates keyed by badge name. Badges with no entry are judged by their
/// stored requirement.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: HashMap<String, BadgeRule>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.rules.keys()).finish()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(QUIZ_MASTER, quiz_master)
            .register(CONSTITUTION_DEFENDER, constitution_defender)
            .register(PREAMBLE_SCHOLAR, preamble_scholar)
            .register(RIGHTS_EXPERT, rights_expert)
            .register(AMENDMENT_TRACKER, amendment_tracker);
        registry
    }
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self { rules: HashMap::new() }
    }

    pub fn register(&mut self, badge_name: &str, rule: BadgeRule) -> &mut Self {
        self.rules.insert(badge_name.to_string(), rule);
        self
    }

    pub fn rule_for(&self, badge_name: &str) -> Option<BadgeRule> {
        self.rules.get(badge_name).copied()
    }

    pub fn qualifies(&self, badge: &Badge, stats: &AchievementStats) -> bool {
        match self.rule_for(&badge.name) {
            Some(rule) => rule(stats),
            None => badge.requirements.is_met(stats),
        }
    }
}

/// Zero thresholds never award.
fn at_least(value: usize, threshold: u32) -> bool {
    threshold > 0 && value >= threshold as usize
}

impl BadgeRequirement {
    pub fn is_met(&self, stats: &AchievementStats) -> bool {
        match self {
            BadgeRequirement::ProgressThreshold { total_progress } => {
                stats.tracked_topics > 0 && at_least(stats.overall_progress as usize, *total_progress)
            }
            BadgeRequirement::TopicsCompleted { count } => at_least(stats.mastered_topics, *count),
            BadgeRequirement::QuizAverage { average_score, min_quizzes } => {
                stats.total_quizzes >= (*min_quizzes).max(1) as usize
                    && stats.average_quiz_score >= *average_score
            }
            BadgeRequirement::CategoryCount { category, count } => at_least(stats.mastered_in(*category), *count),
            BadgeRequirement::ActivityCount { total_activities } => at_least(stats.total_activities, *total_activities),
            BadgeRequirement::QuizCount { min_quizzes } => at_least(stats.total_quizzes, *min_quizzes),
            BadgeRequirement::ScenarioCount { min_scenarios } => at_least(stats.total_scenarios, *min_scenarios),
            BadgeRequirement::CompletedTopics { min_completed_topics } => {
                at_least(stats.completed_topics, *min_completed_topics)
            }
            BadgeRequirement::Manual => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::TopicCategory;

    fn stats() -> AchievementStats {
        AchievementStats::default()
    }

    #[test]
    fn quiz_master_needs_five_high_scores() {
        let mut s = stats();
        s.high_score_quizzes = 4;
        assert!(!quiz_master(&s));
        s.high_score_quizzes = 5;
        assert!(quiz_master(&s));
    }

    #[test]
    fn constitution_defender_needs_three_scenarios() {
        let mut s = stats();
        s.total_scenarios = 2;
        assert!(!constitution_defender(&s));
        s.total_scenarios = 3;
        assert!(constitution_defender(&s));
    }

    #[test]
    fn keyword_rules_follow_their_keyword() {
        let mut s = stats();
        s.keyword_hits.insert(TitleKeyword::Rights);
        assert!(rights_expert(&s));
        assert!(!preamble_scholar(&s));
        assert!(!amendment_tracker(&s));

        s.keyword_hits.insert(TitleKeyword::Preamble);
        s.keyword_hits.insert(TitleKeyword::Amendment);
        assert!(preamble_scholar(&s));
        assert!(amendment_tracker(&s));
    }

    #[test]
    fn default_registry_knows_the_named_badges() {
        let registry = RuleRegistry::default();
        for name in [QUIZ_MASTER, CONSTITUTION_DEFENDER, PREAMBLE_SCHOLAR, RIGHTS_EXPERT, AMENDMENT_TRACKER] {
            assert!(registry.rule_for(name).is_some(), "{} has no rule", name);
        }
        assert!(registry.rule_for("Early Bird").is_none());
    }

    #[test]
    fn unnamed_badge_falls_back_to_requirement() {
        let registry = RuleRegistry::default();
        let badge = Badge::new("Judiciary Buff", "Master two judiciary topics", BadgeRequirement::CategoryCount {
            category: TopicCategory::Judiciary,
            count: 2,
        });

        let mut s = stats();
        s.mastered_by_category.insert(TopicCategory::Judiciary, 1);
        assert!(!registry.qualifies(&badge, &s));
        s.mastered_by_category.insert(TopicCategory::Judiciary, 2);
        assert!(registry.qualifies(&badge, &s));
    }

    #[test]
    fn named_rule_wins_over_stored_requirement() {
        let registry = RuleRegistry::default();
        let badge = Badge::new(QUIZ_MASTER, "", BadgeRequirement::QuizCount { min_quizzes: 1 });
        let mut s = stats();
        s.total_quizzes = 3;
        assert!(!registry.qualifies(&badge, &s));
    }

    #[test]
    fn quiz_average_requires_at_least_one_quiz() {
        let req = BadgeRequirement::QuizAverage { average_score: 0.0, min_quizzes: 0 };
        let mut s = stats();
        assert!(!req.is_met(&s));
        s.total_quizzes = 1;
        s.average_quiz_score = 50.0;
        assert!(req.is_met(&s));

        let strict = BadgeRequirement::QuizAverage { average_score: 90.0, min_quizzes: 3 };
        s.total_quizzes = 2;
        s.average_quiz_score = 99.0;
        assert!(!strict.is_met(&s));
    }

    #[test]
    fn progress_threshold_needs_tracked_topics() {
        let req = BadgeRequirement::ProgressThreshold { total_progress: 50 };
        let mut s = stats();
        assert!(!req.is_met(&s));
        s.tracked_topics = 2;
        s.overall_progress = 50;
        assert!(req.is_met(&s));
    }

    #[test]
    fn zero_thresholds_and_manual_never_award() {
        let s = stats();
        assert!(!BadgeRequirement::TopicsCompleted { count: 0 }.is_met(&s));
        assert!(!BadgeRequirement::ActivityCount { total_activities: 0 }.is_met(&s));
        assert!(!BadgeRequirement::Manual.is_met(&s));
    }
}
