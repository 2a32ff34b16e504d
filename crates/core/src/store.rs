//! Persistence contracts for turns and profiles.
//!
//! - [`ChatStore`]: append-only log of turns keyed by user, queried by
//!   "most recent N"
//! - [`ProfileStore`]: one live profile per user, replaced on every update
//!
//! Both must tolerate concurrent readers and writers for the same user: a
//! background profile refresh can overlap the next exchange append.
//!
//! Implementations: SQLite and in-memory, in `rapport-store`.

use async_trait::async_trait;
use crate::error::StorageError;
use crate::turn::{Profile, Turn};

/// Append-only storage of conversation turns.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Insert one immutable turn. Never drops silently.
    async fn append(&self, turn: Turn) -> std::result::Result<(), StorageError>;

    /// Insert a user turn and its reply as one unit: both land, in order, or
    /// neither does.
    async fn append_exchange(
        &self,
        user_turn: Turn,
        bot_turn: Turn,
    ) -> std::result::Result<(), StorageError>;

    /// Up to `limit` turns for `user_id`, most recent first.
    ///
    /// Unknown users yield an empty vector.
    async fn recent_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> std::result::Result<Vec<Turn>, StorageError>;

    /// Number of turns stored for `user_id`.
    async fn count(&self, user_id: &str) -> std::result::Result<usize, StorageError>;
}

/// Keyed storage of the derived user profile.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Replace any existing profile for `profile.user_id`.
    async fn upsert(&self, profile: Profile) -> std::result::Result<(), StorageError>;

    /// The current profile for `user_id`, if one was ever written.
    async fn get(&self, user_id: &str) -> std::result::Result<Option<Profile>, StorageError>;
}
