use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use civitas_common::DocumentId;

use crate::achievements::rules::RuleRegistry;
use crate::achievements::stats::AchievementStats;
use crate::badge::{Badge, BadgeCategory, BadgeRarity};
use crate::store::LearningStore;
use crate::user::current_user;
use crate::LearningResult;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AchievementOutcome {
    /// Badges granted by this evaluation.
    pub awarded: Vec<Badge>,
    pub total_badges: usize,
}

/// An active badge as seen by one user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatus {
    pub id: DocumentId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub points: u32,
    pub earned: bool,
}

/// Loads the user's progress together with the content and topics it
/// references and folds it into `AchievementStats`.
pub async fn collect_stats<S: LearningStore + ?Sized>(
    store: &S, user_id: &DocumentId,
) -> LearningResult<AchievementStats> {
    let progress = store.user_progress(user_id, None).await?;

    let content_ids: Vec<DocumentId> = progress
        .iter()
        .flat_map(|p| {
            p.quiz_scores.iter().map(|q| q.quiz_id)
                .chain(p.activities.iter().map(|a| a.activity_id))
        })
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let topic_ids: Vec<DocumentId> = progress.iter().map(|p| p.topic).collect();

    let contents: HashMap<_, _> = store.find_contents(&content_ids).await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let topics: HashMap<_, _> = store.find_topics(&topic_ids).await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    Ok(AchievementStats::collect(&progress, &contents, &topics))
}

/// Awards every active badge the user qualifies for and does not hold yet.
/// Badges are never revoked.
pub async fn evaluate_achievements<S: LearningStore + ?Sized>(
    store: &S, rules: &RuleRegistry, user_id: &DocumentId,
) -> LearningResult<AchievementOutcome> {
    let user = current_user(store, user_id).await?;
    let stats = collect_stats(store, user_id).await?;

    let awarded: Vec<Badge> = store.active_badges().await?
        .into_iter()
        .filter(|badge| !user.has_badge(&badge.id))
        .filter(|badge| rules.qualifies(badge, &stats))
        .collect();

    if awarded.is_empty() {
        return Ok(AchievementOutcome { awarded, total_badges: user.badges.len() });
    }

    let ids: Vec<DocumentId> = awarded.iter().map(|b| b.id).collect();
    store.add_badges(user_id, &ids).await?;
    let total_badges = match store.find_user(user_id).await? {
        Some(user) => user.badges.len(),
        None => user.badges.len() + ids.len(),
    };

    tracing::info!(
        "[evaluate_achievements] user {} earned {:?}",
        user_id, awarded.iter().map(|b| b.name.as_str()).collect::<Vec<_>>()
    );
    Ok(AchievementOutcome { awarded, total_badges })
}

/// Every active badge flagged with whether the user holds it.
pub async fn achievement_overview<S: LearningStore + ?Sized>(
    store: &S, user_id: &DocumentId,
) -> LearningResult<Vec<BadgeStatus>> {
    let user = current_user(store, user_id).await?;
    let badges = store.active_badges().await?;

    Ok(badges
        .into_iter()
        .map(|badge| BadgeStatus {
            earned: user.has_badge(&badge.id),
            id: badge.id,
            name: badge.name,
            description: badge.description,
            icon: badge.icon,
            category: badge.category,
            rarity: badge.rarity,
            points: badge.points,
        })
        .collect())
}
