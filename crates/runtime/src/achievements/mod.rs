mod evaluator;
mod rules;
mod stats;

pub use evaluator::{achievement_overview, collect_stats, evaluate_achievements, AchievementOutcome, BadgeStatus};
pub use rules::{
    BadgeRule, RuleRegistry, AMENDMENT_TRACKER, CONSTITUTION_DEFENDER, PREAMBLE_SCHOLAR, QUIZ_MASTER, RIGHTS_EXPERT,
};
pub use stats::{AchievementStats, TitleKeyword, HIGH_SCORE, NEAR_COMPLETE, PERFECT_SCORE};
