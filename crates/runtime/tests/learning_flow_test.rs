use anyhow::Result;
use civitas_common::DocumentId;
use civitas_runtime::achievements::{evaluate_achievements, achievement_overview, PREAMBLE_SCHOLAR, QUIZ_MASTER};
use civitas_runtime::catalog::{create_badge, create_content, create_topic};
use civitas_runtime::progress::{topic_progress, track_progress, TrackEvent};
use civitas_runtime::{
    Badge, BadgeRequirement, Content, ContentType, LearningStore, MemoryStore, RuleRegistry,
    Topic, TopicCategory, User,
};

struct Fixture {
    store: MemoryStore,
    user: User,
    topic: Topic,
    items: Vec<Content>,
}

impl Fixture {
    async fn new(titles: &[(&str, ContentType)]) -> Result<Self> {
        let store = MemoryStore::new();
        let user = User::new("learner", "learner@example.com", "hash".into());
        store.insert_user(&user).await?;

        let topic = create_topic(&store, Topic::new("Preamble of India", "India", TopicCategory::Other)).await?;
        let mut items = Vec::new();
        for (order, (title, kind)) in titles.iter().enumerate() {
            let mut content = Content::new(topic.id, title, *kind);
            content.order = order as i32;
            items.push(create_content(&store, content).await?);
        }
        Ok(Self { store, user, topic, items })
    }

    fn event(&self, item: usize, score: Option<f64>, completed: bool) -> TrackEvent {
        let content = &self.items[item];
        TrackEvent {
            topic_id: self.topic.id.to_hex_string(),
            content_id: content.id.to_hex_string(),
            content_type: match content.content_type {
                ContentType::Quiz => "quiz".into(),
                _ => "lesson".into(),
            },
            score,
            completed: Some(completed),
        }
    }

    async fn badge(&self, name: &str) -> Result<Badge> {
        Ok(create_badge(&self.store, Badge::new(name, name, BadgeRequirement::Manual)).await?)
    }
}

fn lessons(n: usize) -> Vec<(&'static str, ContentType)> {
    (0..n).map(|_| ("Lesson", ContentType::Lesson)).collect()
}

#[tokio::test]
async fn completing_every_item_reaches_one_hundred() -> Result<()> {
    let fx = Fixture::new(&lessons(3)).await?;
    let mut last = None;
    for i in 0..3 {
        last = Some(track_progress(&fx.store, &fx.user.id, &fx.event(i, None, true)).await?);
    }
    assert_eq!(last.map(|p| p.completion_percentage), Some(100));
    Ok(())
}

#[tokio::test]
async fn three_of_four_is_seventy_five() -> Result<()> {
    let fx = Fixture::new(&lessons(4)).await?;
    for i in 0..3 {
        track_progress(&fx.store, &fx.user.id, &fx.event(i, None, true)).await?;
    }
    let progress = topic_progress(&fx.store, &fx.user.id, &fx.topic.id.to_hex_string()).await?;
    assert_eq!(progress.completion_percentage, 75);
    Ok(())
}

#[tokio::test]
async fn requiz_overwrites_the_score() -> Result<()> {
    let fx = Fixture::new(&[("Preamble quiz", ContentType::Quiz), ("Lesson", ContentType::Lesson)]).await?;
    track_progress(&fx.store, &fx.user.id, &fx.event(0, Some(40.0), false)).await?;
    let progress = track_progress(&fx.store, &fx.user.id, &fx.event(0, Some(90.0), false)).await?;

    assert_eq!(progress.quiz_scores.len(), 1);
    assert_eq!(progress.quiz_scores[0].score, 90);
    assert_eq!(progress.completion_percentage, 50);
    Ok(())
}

#[tokio::test]
async fn untouched_topic_reads_as_zero() -> Result<()> {
    let fx = Fixture::new(&lessons(2)).await?;
    let progress = topic_progress(&fx.store, &fx.user.id, &fx.topic.id.to_hex_string()).await?;

    assert_eq!(progress.completion_percentage, 0);
    assert!(progress.quiz_scores.is_empty());
    assert!(progress.activities.is_empty());
    assert!(fx.store.user_progress(&fx.user.id, None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn preamble_quiz_earns_preamble_scholar_once() -> Result<()> {
    let fx = Fixture::new(&[("The Preamble", ContentType::Quiz)]).await?;
    let scholar = fx.badge(PREAMBLE_SCHOLAR).await?;
    fx.badge(QUIZ_MASTER).await?;
    let rules = RuleRegistry::default();

    track_progress(&fx.store, &fx.user.id, &fx.event(0, Some(85.0), false)).await?;

    let first = evaluate_achievements(&fx.store, &rules, &fx.user.id).await?;
    assert_eq!(first.awarded.len(), 1);
    assert_eq!(first.awarded[0].id, scholar.id);
    assert_eq!(first.total_badges, 1);

    let second = evaluate_achievements(&fx.store, &rules, &fx.user.id).await?;
    assert!(second.awarded.is_empty());

    let user = fx.store.find_user(&fx.user.id).await?.unwrap();
    assert_eq!(user.badges, vec![scholar.id]);

    let overview = achievement_overview(&fx.store, &fx.user.id).await?;
    let earned: Vec<&str> = overview.iter().filter(|b| b.earned).map(|b| b.name.as_str()).collect();
    assert_eq!(earned, vec![PREAMBLE_SCHOLAR]);
    assert_eq!(overview.len(), 2);
    Ok(())
}

#[tokio::test]
async fn low_score_earns_nothing() -> Result<()> {
    let fx = Fixture::new(&[("The Preamble", ContentType::Quiz)]).await?;
    fx.badge(PREAMBLE_SCHOLAR).await?;

    track_progress(&fx.store, &fx.user.id, &fx.event(0, Some(79.0), false)).await?;
    let outcome = evaluate_achievements(&fx.store, &RuleRegistry::default(), &fx.user.id).await?;
    assert!(outcome.awarded.is_empty());
    assert_eq!(outcome.total_badges, 0);
    Ok(())
}

#[tokio::test]
async fn requirement_badges_award_without_named_rule() -> Result<()> {
    let fx = Fixture::new(&lessons(1)).await?;
    let finisher = create_badge(
        &fx.store,
        Badge::new("First Topic", "Finish a topic", BadgeRequirement::TopicsCompleted { count: 1 }),
    ).await?;

    let outcome = evaluate_achievements(&fx.store, &RuleRegistry::default(), &fx.user.id).await?;
    assert!(outcome.awarded.is_empty());

    track_progress(&fx.store, &fx.user.id, &fx.event(0, None, true)).await?;
    let outcome = evaluate_achievements(&fx.store, &RuleRegistry::default(), &fx.user.id).await?;
    assert_eq!(outcome.awarded.iter().map(|b| b.id).collect::<Vec<DocumentId>>(), vec![finisher.id]);
    Ok(())
}
