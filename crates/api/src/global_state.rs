use std::sync::Arc;

use anyhow::{ensure, Result};

use civitas_common::{EnvVars, TokenKeys};
use civitas_database::MongoDbEnv;
use civitas_runtime::{LearningStore, MemoryStore, MongoStore, RuleRegistry};

use crate::env::ApiServerEnv;

#[derive(Clone)]
pub struct GlobalState {
    pub store: Arc<dyn LearningStore>,
    pub token_keys: Arc<TokenKeys>,
    pub rules: Arc<RuleRegistry>,
}

impl GlobalState {
    pub fn new(store: Arc<dyn LearningStore>, token_keys: TokenKeys) -> Self {
        Self {
            store,
            token_keys: Arc::new(token_keys),
            rules: Arc::new(RuleRegistry::default()),
        }
    }

    pub async fn from_env(env: &ApiServerEnv) -> Result<Self> {
        ensure!(!env.jwt_secret.is_empty(), "[GlobalState::from_env] JWT_SECRET must be set");
        let token_keys = TokenKeys::new(&env.jwt_secret, env.jwt_ttl_days);

        let store: Arc<dyn LearningStore> = if env.uses_memory_store() {
            tracing::warn!("[GlobalState::from_env] using the in-memory store, nothing will be persisted");
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(MongoStore::connect(&MongoDbEnv::load()).await?)
        };

        Ok(Self::new(store, token_keys))
    }
}
