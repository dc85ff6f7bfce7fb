use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use civitas_common::{get_current_timestamp, DocumentId};

use crate::badge::Badge;
use crate::content::{Content, ContentType, GameType};
use crate::store::{LearningStore, WriteOutcome};
use crate::topic::Topic;
use crate::{LearningError, LearningResult};

pub const SEARCH_LIMIT: usize = 10;

/// Looks a topic up by hex id, falling back to its custom slug.
pub async fn resolve_topic<S: LearningStore + ?Sized>(store: &S, topic_ref: &str) -> LearningResult<Topic> {
    let found = if DocumentId::looks_like_id(topic_ref) {
        store.find_topic(&topic_ref.parse::<DocumentId>()?).await?
    } else {
        store.find_topic_by_custom_id(topic_ref).await?
    };
    found.ok_or_else(|| LearningError::not_found("Topic"))
}

async fn resolve_topic_id<S: LearningStore + ?Sized>(store: &S, topic_ref: &str) -> LearningResult<Option<DocumentId>> {
    match resolve_topic(store, topic_ref).await {
        Ok(topic) => Ok(Some(topic.id)),
        Err(LearningError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn countries<S: LearningStore + ?Sized>(store: &S) -> LearningResult<Vec<String>> {
    let mut countries = store.countries().await?;
    countries.sort();
    Ok(countries)
}

/// Active top-level topics of a country, by order.
pub async fn topics_for_country<S: LearningStore + ?Sized>(store: &S, country: &str) -> LearningResult<Vec<Topic>> {
    Ok(store.top_level_topics(country).await?)
}

/// Active content of a topic by order; an unknown topic has none.
pub async fn topic_content<S: LearningStore + ?Sized>(store: &S, topic_ref: &str) -> LearningResult<Vec<Content>> {
    match resolve_topic_id(store, topic_ref).await? {
        Some(id) => Ok(store.topic_contents(&id).await?),
        None => Ok(Vec::new()),
    }
}

pub async fn subtopics<S: LearningStore + ?Sized>(store: &S, topic_ref: &str) -> LearningResult<Vec<Topic>> {
    match resolve_topic_id(store, topic_ref).await? {
        Some(id) => Ok(store.subtopics(&id).await?),
        None => Ok(Vec::new()),
    }
}

pub async fn content_by_id<S: LearningStore + ?Sized>(store: &S, content_ref: &str) -> LearningResult<Content> {
    let id: DocumentId = content_ref.parse().map_err(|_| LearningError::not_found("Content"))?;
    store.find_content(&id).await?
        .ok_or_else(|| LearningError::not_found("Content"))
}

pub async fn games_by_type<S: LearningStore + ?Sized>(store: &S, game_type: &str) -> LearningResult<Vec<Content>> {
    let game_type: GameType = game_type.parse()?;
    Ok(store.games_by_type(game_type).await?)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TopicRef {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub title: String,
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ContentHit {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub title: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub topic: Option<TopicRef>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SearchResults {
    pub topics: Vec<Topic>,
    pub content: Vec<ContentHit>,
}

/// Case-insensitive substring search over topic title/description and
/// content title/body, at most `SEARCH_LIMIT` of each.
pub async fn search<S: LearningStore + ?Sized>(
    store: &S, query: &str, country: Option<&str>,
) -> LearningResult<SearchResults> {
    let query = query.trim();
    if query.is_empty() {
        return Err(LearningError::validation("Search query is required"));
    }
    let country = country.filter(|c| !c.is_empty());

    let topics = store.search_topics(query, country, SEARCH_LIMIT).await?;
    let contents = store.search_contents(query, SEARCH_LIMIT).await?;

    let topic_ids: Vec<DocumentId> = contents.iter().map(|c| c.topic).collect();
    let owners: HashMap<DocumentId, Topic> = store.find_topics(&topic_ids).await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let content = contents
        .into_iter()
        .filter_map(|c| {
            let owner = owners.get(&c.topic);
            if let Some(country) = country {
                if owner.map(|t| t.country.as_str()) != Some(country) {
                    return None;
                }
            }
            Some(ContentHit {
                id: c.id,
                title: c.title,
                content_type: c.content_type,
                topic: owner.map(|t| TopicRef { id: t.id, title: t.title.clone(), country: t.country.clone() }),
            })
        })
        .collect();

    Ok(SearchResults { topics, content })
}

pub async fn create_topic<S: LearningStore + ?Sized>(store: &S, mut topic: Topic) -> LearningResult<Topic> {
    if topic.title.trim().is_empty() || topic.country.trim().is_empty() {
        return Err(LearningError::validation("topic title and country are required"));
    }
    if let Some(parent) = &topic.parent_topic {
        if store.find_topic(parent).await?.is_none() {
            return Err(LearningError::not_found("Parent topic"));
        }
    }
    if topic.id.is_nil() {
        topic.id = DocumentId::random();
    }
    let now = get_current_timestamp();
    topic.created_at = now;
    topic.updated_at = now;

    if store.insert_topic(&topic).await? == WriteOutcome::Conflict {
        return Err(LearningError::Conflict("A topic with this id or custom id already exists".into()));
    }
    tracing::info!("[create_topic] {} ({})", topic.title, topic.id);
    Ok(topic)
}

pub async fn create_content<S: LearningStore + ?Sized>(store: &S, mut content: Content) -> LearningResult<Content> {
    content.validate()?;
    if store.find_topic(&content.topic).await?.is_none() {
        return Err(LearningError::not_found("Topic"));
    }
    if content.id.is_nil() {
        content.id = DocumentId::random();
    }
    let now = get_current_timestamp();
    content.created_at = now;
    content.updated_at = now;

    if store.insert_content(&content).await? == WriteOutcome::Conflict {
        return Err(LearningError::Conflict("Content with this id already exists".into()));
    }
    tracing::info!("[create_content] {} in topic {}", content.title, content.topic);
    Ok(content)
}

pub async fn create_badge<S: LearningStore + ?Sized>(store: &S, mut badge: Badge) -> LearningResult<Badge> {
    if badge.name.trim().is_empty() {
        return Err(LearningError::validation("badge name is required"));
    }
    if badge.id.is_nil() {
        badge.id = DocumentId::random();
    }
    badge.created_at = get_current_timestamp();

    if store.insert_badge(&badge).await? == WriteOutcome::Conflict {
        return Err(LearningError::Conflict(format!("Badge `{}` already exists", badge.name)));
    }
    tracing::info!("[create_badge] {}", badge.name);
    Ok(badge)
}
