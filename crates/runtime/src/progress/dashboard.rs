use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use civitas_common::DocumentId;

use crate::badge::Badge;
use crate::user::{current_user, PublicUser};
use crate::store::LearningStore;
use crate::LearningResult;

const RECENT_ACTIVITIES: usize = 5;
const RECENT_QUIZ_SCORES: usize = 5;
const RECENT_PROGRESS: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Topics with a progress row.
    pub total_topics: usize,
    /// Topics at 100%.
    pub completed_topics: usize,
    pub overall_progress: u32,
    pub average_quiz_score: u32,
    pub total_badges: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub topic_id: DocumentId,
    pub topic_title: String,
    pub activity_id: DocumentId,
    pub completed: bool,
    pub score: u32,
    pub date: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentQuizScore {
    pub topic_id: DocumentId,
    pub topic_title: String,
    pub quiz_id: DocumentId,
    pub score: u32,
    pub date: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub topic_id: DocumentId,
    pub topic_title: String,
    pub completion_percentage: u32,
    pub country: String,
    pub last_updated: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: PublicUser,
    pub badges: Vec<Badge>,
    pub stats: DashboardStats,
    pub recent_activities: Vec<RecentActivity>,
    pub quiz_scores: Vec<RecentQuizScore>,
    pub progress: Vec<ProgressSummary>,
}

fn rounded_mean(values: impl Iterator<Item = u32>) -> u32 {
    let (sum, count) = values.fold((0u64, 0u64), |(s, c), v| (s + v as u64, c + 1));
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u32
}

pub async fn build_dashboard<S: LearningStore + ?Sized>(
    store: &S, user_id: &DocumentId,
) -> LearningResult<Dashboard> {
    let user = current_user(store, user_id).await?;
    let badges = store.find_badges(&user.badges).await?;
    let rows = store.user_progress(user_id, None).await?;

    let topic_ids: Vec<DocumentId> = rows.iter().map(|p| p.topic).collect();
    let titles: HashMap<DocumentId, String> = store.find_topics(&topic_ids).await?
        .into_iter()
        .map(|t| (t.id, t.title))
        .collect();
    let title_of = |id: &DocumentId| titles.get(id).cloned().unwrap_or_default();

    let mut recent_activities: Vec<RecentActivity> = rows
        .iter()
        .flat_map(|p| p.activities.iter().map(move |a| (p.topic, a)))
        .map(|(topic, a)| RecentActivity {
            topic_id: topic,
            topic_title: title_of(&topic),
            activity_id: a.activity_id,
            completed: a.completed,
            score: a.score,
            date: a.date,
        })
        .collect();
    recent_activities.sort_by(|a, b| b.date.cmp(&a.date));
    recent_activities.truncate(RECENT_ACTIVITIES);

    let mut quiz_scores: Vec<RecentQuizScore> = rows
        .iter()
        .flat_map(|p| p.quiz_scores.iter().map(move |q| (p.topic, q)))
        .map(|(topic, q)| RecentQuizScore {
            topic_id: topic,
            topic_title: title_of(&topic),
            quiz_id: q.quiz_id,
            score: q.score,
            date: q.date,
        })
        .collect();
    quiz_scores.sort_by(|a, b| b.date.cmp(&a.date));

    let stats = DashboardStats {
        total_topics: rows.len(),
        completed_topics: rows.iter().filter(|p| p.is_complete()).count(),
        overall_progress: rounded_mean(rows.iter().map(|p| p.completion_percentage)),
        average_quiz_score: rounded_mean(quiz_scores.iter().map(|q| q.score)),
        total_badges: user.badges.len(),
    };
    quiz_scores.truncate(RECENT_QUIZ_SCORES);

    let progress = rows
        .iter()
        .take(RECENT_PROGRESS)
        .map(|p| ProgressSummary {
            topic_id: p.topic,
            topic_title: title_of(&p.topic),
            completion_percentage: p.completion_percentage,
            country: p.country.clone(),
            last_updated: p.last_updated,
        })
        .collect();

    Ok(Dashboard {
        user: user.to_public(),
        badges,
        stats,
        recent_activities,
        quiz_scores,
        progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(rounded_mean(std::iter::empty()), 0);
        assert_eq!(rounded_mean([50, 75, 100].into_iter()), 75);
        assert_eq!(rounded_mean([1, 2].into_iter()), 2);
    }
}
