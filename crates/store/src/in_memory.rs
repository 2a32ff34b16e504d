//! In-memory store, useful for testing and ephemeral sessions.

use async_trait::async_trait;
use rapport_core::error::StorageError;
use rapport_core::store::{ChatStore, ProfileStore};
use rapport_core::turn::{Profile, Turn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps turns in insertion order in a Vec and profiles in a map keyed by
/// user id. Nothing survives the process.
pub struct InMemoryStore {
    turns: Arc<RwLock<Vec<Turn>>>,
    profiles: Arc<RwLock<HashMap<String, Profile>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(RwLock::new(Vec::new())),
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_new(turns: &[Turn], turn: &Turn) -> Result<(), StorageError> {
    if turns.iter().any(|t| t.id == turn.id) {
        return Err(StorageError::DuplicateTurn(turn.id.clone()));
    }
    Ok(())
}

#[async_trait]
impl ChatStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, turn: Turn) -> Result<(), StorageError> {
        let mut turns = self.turns.write().await;
        ensure_new(&turns, &turn)?;
        turns.push(turn);
        Ok(())
    }

    async fn append_exchange(&self, user_turn: Turn, bot_turn: Turn) -> Result<(), StorageError> {
        // Validate both under one write lock so a failure leaves nothing behind
        let mut turns = self.turns.write().await;
        ensure_new(&turns, &user_turn)?;
        ensure_new(&turns, &bot_turn)?;
        if user_turn.id == bot_turn.id {
            return Err(StorageError::DuplicateTurn(bot_turn.id));
        }
        turns.push(user_turn);
        turns.push(bot_turn);
        Ok(())
    }

    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>, StorageError> {
        let turns = self.turns.read().await;
        Ok(turns
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, user_id: &str) -> Result<usize, StorageError> {
        let turns = self.turns.read().await;
        Ok(turns.iter().filter(|t| t.user_id == user_id).count())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn upsert(&self, profile: Profile) -> Result<(), StorageError> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<Profile>, StorageError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}
