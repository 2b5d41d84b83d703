use crate::config::DialogConfig;
use crate::engine::{DialogEngine, EngineOptions};
use colloquy_agent::LlmClient;
use colloquy_core::{ColloquyError, ColloquyResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// In-memory map from session id to its dialog engine.
///
/// Sessions live until deleted or until the process exits.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<DialogEngine>>>,
    llm: Arc<LlmClient>,
    options: EngineOptions,
}

impl SessionRegistry {
    pub fn new(llm: Arc<LlmClient>, options: EngineOptions) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            llm,
            options,
        })
    }

    /// Validate the config, build an engine for it and return the new id.
    pub async fn create(&self, config: DialogConfig) -> ColloquyResult<String> {
        config.validate()?;
        let id = new_session_id();
        let engine = Arc::new(DialogEngine::new(
            id.clone(),
            config,
            self.llm.clone(),
            self.options.clone(),
        ));
        self.sessions.write().await.insert(id.clone(), engine);
        info!(session_id = %id, "Session created");
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> ColloquyResult<Arc<DialogEngine>> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ColloquyError::SessionNotFound(id.to_string()))
    }

    /// Remove a session and stop its turn loop.
    pub async fn remove(&self, id: &str) -> ColloquyResult<()> {
        let engine = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ColloquyError::SessionNotFound(id.to_string()))?;
        engine.shutdown();
        info!(session_id = %id, "Session removed");
        Ok(())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Twelve lowercase hex characters.
fn new_session_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}
