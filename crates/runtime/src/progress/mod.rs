mod dashboard;
mod tracker;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, DocumentId};
use civitas_database::{doc, IndexModel, IndexOptions, MongoDbObject};

use crate::catalog::resolve_topic;
use crate::store::LearningStore;
use crate::LearningResult;

pub use dashboard::{build_dashboard, Dashboard, DashboardStats, ProgressSummary, RecentActivity, RecentQuizScore};
pub use tracker::{track_progress, TrackEvent, MAX_WRITE_ATTEMPTS};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub quiz_id: DocumentId,
    pub score: u32,
    pub date: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub activity_id: DocumentId,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub score: u32,
    pub date: i64,
}

/// One user's standing in one topic. `completion_percentage` is derived
/// from the recorded entries and only changes through `recompute_completion`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(rename = "_id", default)]
    pub id: DocumentId,
    pub user: DocumentId,
    pub topic: DocumentId,
    pub country: String,

    #[serde(default)]
    pub completion_percentage: u32,
    #[serde(default)]
    pub quiz_scores: Vec<QuizScore>,
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,

    #[serde(default)]
    pub last_updated: i64,
    /// Bumped on every write; guards the read-modify-write in the tracker.
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub created_at: i64,
}

impl Progress {
    pub fn new(user: DocumentId, topic: DocumentId, country: &str) -> Self {
        let now = get_current_timestamp();
        Self {
            id: DocumentId::random(),
            user,
            topic,
            country: country.to_string(),
            completion_percentage: 0,
            quiz_scores: Vec::new(),
            activities: Vec::new(),
            last_updated: now,
            revision: 0,
            created_at: now,
        }
    }

    /// Zeroed view for a topic the user never touched. Not persisted.
    pub fn untouched(user: DocumentId, topic: DocumentId, country: &str) -> Self {
        let mut progress = Self::new(user, topic, country);
        progress.id = DocumentId::default();
        progress
    }

    /// Inserts or overwrites the score for `quiz_id`.
    pub fn record_quiz(&mut self, quiz_id: DocumentId, score: u32, now: i64) {
        match self.quiz_scores.iter_mut().find(|q| q.quiz_id == quiz_id) {
            Some(entry) => {
                entry.score = score;
                entry.date = now;
            }
            None => self.quiz_scores.push(QuizScore { quiz_id, score, date: now }),
        }
    }

    pub fn record_activity(&mut self, activity_id: DocumentId, completed: bool, score: u32, now: i64) {
        match self.activities.iter_mut().find(|a| a.activity_id == activity_id) {
            Some(entry) => {
                entry.completed = completed;
                entry.score = score;
                entry.date = now;
            }
            None => self.activities.push(ActivityRecord { activity_id, completed, score, date: now }),
        }
    }

    /// Content ids that count towards completion: every scored quiz and
    /// every activity marked completed.
    pub fn completed_content_ids(&self) -> HashSet<DocumentId> {
        self.quiz_scores
            .iter()
            .map(|q| q.quiz_id)
            .chain(self.activities.iter().filter(|a| a.completed).map(|a| a.activity_id))
            .collect()
    }

    /// Recomputes the percentage against the topic's active content ids.
    /// Entries for content that is no longer active are ignored.
    pub fn recompute_completion(&mut self, active_content: &[DocumentId]) {
        let active: HashSet<&DocumentId> = active_content.iter().collect();
        let completed = self.completed_content_ids()
            .iter()
            .filter(|id| active.contains(id))
            .count();
        self.completion_percentage = completion_percentage(completed, active.len());
    }

    pub fn is_complete(&self) -> bool {
        self.completion_percentage == 100
    }
}

/// `round(100 * completed / total)`, clamped to 100; 0 when there is nothing to complete.
pub fn completion_percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let pct = (100.0 * completed as f64 / total as f64).round() as u32;
    pct.min(100)
}

impl MongoDbObject for Progress {
    const COLLECTION_NAME: &'static str = "progresses";

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
                .keys(doc! { "user": 1, "topic": 1, "country": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "user": 1, "lastUpdated": -1 })
                .build(),
        ]
    }
}

/// A user's progress in one topic, or a zeroed default when none exists yet.
pub async fn topic_progress<S: LearningStore + ?Sized>(
    store: &S, user_id: &DocumentId, topic_ref: &str,
) -> LearningResult<Progress> {
    let (topic_id, country) = if DocumentId::looks_like_id(topic_ref) {
        let id: DocumentId = topic_ref.parse()?;
        let country = store.find_topic(&id).await?
            .map(|t| t.country)
            .unwrap_or_default();
        (id, country)
    } else {
        let topic = resolve_topic(store, topic_ref).await?;
        (topic.id, topic.country)
    };

    let found = store.find_user_topic_progress(user_id, &topic_id).await?;
    Ok(found.unwrap_or_else(|| Progress::untouched(*user_id, topic_id, &country)))
}

/// Every progress row of a user, most recently updated first.
pub async fn list_progress<S: LearningStore + ?Sized>(
    store: &S, user_id: &DocumentId, country: Option<&str>,
) -> LearningResult<Vec<Progress>> {
    Ok(store.user_progress(user_id, country).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<DocumentId> {
        (0..n).map(|_| DocumentId::random()).collect()
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(completion_percentage(3, 4), 75);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(5, 4), 100);
    }

    #[test]
    fn recording_a_quiz_twice_overwrites() {
        let content = ids(2);
        let mut progress = Progress::new(DocumentId::random(), DocumentId::random(), "India");
        progress.record_quiz(content[0], 40, 1);
        progress.record_quiz(content[0], 90, 2);

        assert_eq!(progress.quiz_scores.len(), 1);
        assert_eq!(progress.quiz_scores[0].score, 90);
        assert_eq!(progress.quiz_scores[0].date, 2);
    }

    #[test]
    fn incomplete_activities_do_not_count() {
        let content = ids(4);
        let mut progress = Progress::new(DocumentId::random(), DocumentId::random(), "India");
        progress.record_activity(content[0], true, 0, 1);
        progress.record_activity(content[1], false, 70, 1);
        progress.record_quiz(content[2], 10, 1);
        progress.recompute_completion(&content);

        assert_eq!(progress.completion_percentage, 50);
    }

    #[test]
    fn inactive_or_foreign_content_is_ignored() {
        let content = ids(2);
        let mut progress = Progress::new(DocumentId::random(), DocumentId::random(), "India");
        progress.record_quiz(DocumentId::random(), 100, 1);
        progress.record_activity(content[0], true, 0, 1);
        progress.recompute_completion(&content);

        assert_eq!(progress.completion_percentage, 50);
    }

    #[test]
    fn same_id_in_both_lists_counts_once() {
        let content = ids(2);
        let mut progress = Progress::new(DocumentId::random(), DocumentId::random(), "India");
        progress.record_quiz(content[0], 80, 1);
        progress.record_activity(content[0], true, 80, 1);
        progress.recompute_completion(&content);

        assert_eq!(progress.completion_percentage, 50);
    }

    #[test]
    fn topic_without_content_stays_at_zero() {
        let mut progress = Progress::new(DocumentId::random(), DocumentId::random(), "India");
        progress.record_quiz(DocumentId::random(), 100, 1);
        progress.recompute_completion(&[]);
        assert_eq!(progress.completion_percentage, 0);
    }
}
