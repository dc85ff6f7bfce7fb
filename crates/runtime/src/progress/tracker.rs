use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, DocumentId};

use crate::progress::Progress;
use crate::store::{LearningStore, WriteOutcome};
use crate::{LearningError, LearningResult};

/// Attempts of the whole read-modify-write before giving up with a conflict.
pub const MAX_WRITE_ATTEMPTS: usize = 5;

/// A client reporting that it finished (or scored) one piece of content.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    pub topic_id: String,
    pub content_id: String,
    /// `"quiz"` records a quiz score; anything else records an activity.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Games report fractional percentages or move counts, so any number is accepted.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TrackEvent {
    pub fn is_quiz(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("quiz")
    }

    /// Rounds the score. Quiz scores must be percentages; activity scores
    /// saturate into `u32`.
    fn checked_score(&self) -> LearningResult<Option<u32>> {
        let score = match self.score {
            Some(score) if !score.is_finite() => {
                return Err(LearningError::validation("score must be a finite number"));
            }
            Some(score) => score.round(),
            None if self.is_quiz() => return Err(LearningError::validation("a quiz event requires a score")),
            None => return Ok(None),
        };
        if self.is_quiz() && !(0.0..=100.0).contains(&score) {
            return Err(LearningError::validation(format!("quiz score {} is outside 0..=100", score)));
        }
        Ok(Some(score as u32))
    }
}

fn parse_ref(raw: &str, what: &str) -> LearningResult<DocumentId> {
    raw.parse().map_err(|_| LearningError::not_found(what))
}

/// Records `event` in the user's progress for the event's topic and
/// recomputes the completion percentage.
pub async fn track_progress<S: LearningStore + ?Sized>(
    store: &S, user_id: &DocumentId, event: &TrackEvent,
) -> LearningResult<Progress> {
    let topic_id = parse_ref(&event.topic_id, "Topic")?;
    let topic = store.find_topic(&topic_id).await?
        .ok_or_else(|| LearningError::not_found("Topic"))?;

    let content_id = parse_ref(&event.content_id, "Content")?;
    let content = store.find_content(&content_id).await?
        .ok_or_else(|| LearningError::not_found("Content"))?;
    if content.topic != topic.id {
        return Err(LearningError::validation("content does not belong to this topic"));
    }

    let score = event.checked_score()?;
    let active: Vec<DocumentId> = store.topic_contents(&topic.id).await?
        .iter()
        .map(|c| c.id)
        .collect();

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let now = get_current_timestamp();
        let existing = store.find_progress(user_id, &topic.id, &topic.country).await?;
        let expected_revision = existing.as_ref().map(|p| p.revision);
        let mut progress = existing
            .unwrap_or_else(|| Progress::new(*user_id, topic.id, &topic.country));

        if event.is_quiz() {
            progress.record_quiz(content.id, score.unwrap_or_default(), now);
        } else {
            progress.record_activity(content.id, event.completed.unwrap_or(false), score.unwrap_or(0), now);
        }
        progress.recompute_completion(&active);
        progress.last_updated = now;

        let outcome = match expected_revision {
            Some(revision) => {
                progress.revision = revision + 1;
                store.replace_progress(&progress, revision).await?
            }
            None => store.insert_progress(&progress).await?,
        };

        if outcome == WriteOutcome::Written {
            tracing::info!(
                "[track_progress] user {} topic {} now at {}%",
                user_id, topic.id, progress.completion_percentage
            );
            return Ok(progress);
        }
        tracing::warn!("[track_progress] concurrent write on attempt {} for user {} topic {}", attempt, user_id, topic.id);
    }

    Err(LearningError::Conflict("progress is being updated concurrently, try again".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Content, ContentType};
    use crate::store::MemoryStore;
    use crate::topic::{Topic, TopicCategory};

    async fn seed(store: &MemoryStore, items: usize) -> (Topic, Vec<Content>) {
        let topic = Topic::new("Preamble", "India", TopicCategory::Other);
        store.insert_topic(&topic).await.unwrap();
        let mut contents = Vec::new();
        for i in 0..items {
            let mut content = Content::new(topic.id, &format!("Lesson {}", i), ContentType::Lesson);
            content.order = i as i32;
            store.insert_content(&content).await.unwrap();
            contents.push(content);
        }
        (topic, contents)
    }

    fn activity(topic: &Topic, content: &Content) -> TrackEvent {
        TrackEvent {
            topic_id: topic.id.to_hex_string(),
            content_id: content.id.to_hex_string(),
            content_type: "lesson".into(),
            score: None,
            completed: Some(true),
        }
    }

    #[tokio::test]
    async fn quiz_without_score_is_rejected() {
        let store = MemoryStore::new();
        let (topic, contents) = seed(&store, 1).await;
        let mut event = activity(&topic, &contents[0]);
        event.content_type = "quiz".into();

        let result = track_progress(&store, &DocumentId::random(), &event).await;
        assert!(matches!(result, Err(LearningError::Validation(_))));
    }

    #[tokio::test]
    async fn out_of_range_quiz_score_is_rejected() {
        let store = MemoryStore::new();
        let (topic, contents) = seed(&store, 1).await;
        let mut event = activity(&topic, &contents[0]);
        event.content_type = "quiz".into();
        event.score = Some(101.0);

        let result = track_progress(&store, &DocumentId::random(), &event).await;
        assert!(matches!(result, Err(LearningError::Validation(_))));
    }

    #[tokio::test]
    async fn game_scores_are_rounded_and_never_rejected() {
        let store = MemoryStore::new();
        let (topic, contents) = seed(&store, 2).await;
        let user = DocumentId::random();

        let mut timeline = activity(&topic, &contents[0]);
        timeline.content_type = "game".into();
        timeline.score = Some(66.66666666666667);
        let progress = track_progress(&store, &user, &timeline).await.unwrap();
        assert_eq!(progress.activities[0].score, 67);
        assert_eq!(progress.completion_percentage, 50);

        let mut matching = activity(&topic, &contents[1]);
        matching.content_type = "game".into();
        matching.score = Some(124.0);
        let progress = track_progress(&store, &user, &matching).await.unwrap();
        assert_eq!(progress.activities[1].score, 124);
        assert_eq!(progress.completion_percentage, 100);
    }

    #[test]
    fn fractional_scores_deserialize() {
        let event: TrackEvent = serde_json::from_value(serde_json::json!({
            "topicId": "t",
            "contentId": "c",
            "type": "game",
            "score": 66.67,
            "completed": true,
        })).unwrap();
        assert_eq!(event.score, Some(66.67));
        assert_eq!(event.checked_score().unwrap(), Some(67));
    }

    #[tokio::test]
    async fn unknown_topic_and_content_are_not_found() {
        let store = MemoryStore::new();
        let (topic, contents) = seed(&store, 1).await;
        let user = DocumentId::random();

        let mut event = activity(&topic, &contents[0]);
        event.topic_id = DocumentId::random().to_hex_string();
        assert!(matches!(track_progress(&store, &user, &event).await, Err(LearningError::NotFound(_))));

        let mut event = activity(&topic, &contents[0]);
        event.content_id = "not-an-id".into();
        assert!(matches!(track_progress(&store, &user, &event).await, Err(LearningError::NotFound(_))));
    }

    #[tokio::test]
    async fn content_from_another_topic_is_rejected() {
        let store = MemoryStore::new();
        let (topic, _) = seed(&store, 1).await;
        let (_, foreign) = seed(&store, 1).await;

        let result = track_progress(&store, &DocumentId::random(), &activity(&topic, &foreign[0])).await;
        assert!(matches!(result, Err(LearningError::Validation(_))));
    }

    #[tokio::test]
    async fn each_write_bumps_the_revision() {
        let store = MemoryStore::new();
        let (topic, contents) = seed(&store, 2).await;
        let user = DocumentId::random();

        let first = track_progress(&store, &user, &activity(&topic, &contents[0])).await.unwrap();
        assert_eq!(first.revision, 0);
        assert_eq!(first.completion_percentage, 50);

        let second = track_progress(&store, &user, &activity(&topic, &contents[1])).await.unwrap();
        assert_eq!(second.revision, 1);
        assert_eq!(second.completion_percentage, 100);
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn concurrent_tracks_lose_no_update() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let (topic, contents) = seed(&store, 4).await;
        let user = DocumentId::random();

        let handles: Vec<_> = contents
            .iter()
            .map(|content| {
                let store = store.clone();
                let event = activity(&topic, content);
                tokio::spawn(async move { track_progress(store.as_ref(), &user, &event).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.find_progress(&user, &topic.id, "India").await.unwrap().unwrap();
        assert_eq!(stored.activities.len(), 4);
        assert_eq!(stored.completion_percentage, 100);
    }
}
