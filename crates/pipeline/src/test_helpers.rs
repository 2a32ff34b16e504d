//! Shared test doubles for pipeline tests.

use async_trait::async_trait;
use rapport_core::completion::CompletionClient;
use rapport_core::error::{CompletionError, StorageError};
use rapport_core::store::{ChatStore, ProfileStore};
use rapport_core::turn::{Profile, Turn};
use rapport_core::view::ChatView;
use std::sync::Mutex;

use crate::prompt::{PERSONALITY_INSTRUCTION, SUMMARY_INSTRUCTION, WORLDVIEW_INSTRUCTION};

type Responder = Box<dyn Fn(&str) -> Result<Option<String>, CompletionError> + Send + Sync>;

/// A completion client that answers through a closure and records every
/// prompt it was given.
pub struct MockClient {
    respond: Responder,
    prompts: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new(
        respond: impl Fn(&str) -> Result<Option<String>, CompletionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer every prompt with the same text.
    pub fn answering(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(Some(text.clone())))
    }

    /// Fail every call with a network error.
    pub fn failing() -> Self {
        Self::new(|_| Err(CompletionError::Network("connection refused".into())))
    }

    /// Reply with `reply`; answer the three profile prompts with fixed,
    /// recognisable text.
    pub fn with_profile_answers(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |prompt| {
            let text = if prompt.ends_with(SUMMARY_INSTRUCTION) {
                "They chatted briefly."
            } else if prompt.ends_with(PERSONALITY_INSTRUCTION) {
                "Warm and curious. Gentle explorer."
            } else if prompt.ends_with(WORLDVIEW_INSTRUCTION) {
                "Sees the world as open. Hopeful, pragmatic, kind."
            } else {
                reply.as_str()
            };
            Ok(Some(text.to_string()))
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _model: &str, prompt: &str) -> Result<Option<String>, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }
}

/// A store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl ChatStore for BrokenStore {
    fn name(&self) -> &str {
        "broken"
    }

    async fn append(&self, _turn: Turn) -> Result<(), StorageError> {
        Err(StorageError::Write("disk full".into()))
    }

    async fn append_exchange(&self, _user_turn: Turn, _bot_turn: Turn) -> Result<(), StorageError> {
        Err(StorageError::Write("disk full".into()))
    }

    async fn recent_turns(&self, _user_id: &str, _limit: usize) -> Result<Vec<Turn>, StorageError> {
        Ok(Vec::new())
    }

    async fn count(&self, _user_id: &str) -> Result<usize, StorageError> {
        Ok(0)
    }
}

#[async_trait]
impl ProfileStore for BrokenStore {
    async fn upsert(&self, _profile: Profile) -> Result<(), StorageError> {
        Err(StorageError::Write("disk full".into()))
    }

    async fn get(&self, _user_id: &str) -> Result<Option<Profile>, StorageError> {
        Err(StorageError::Query("disk gone".into()))
    }
}

/// A view that logs every call as a short string.
#[derive(Default)]
pub struct RecordingView {
    log: Mutex<Vec<String>>,
}

impl RecordingView {
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl ChatView for RecordingView {
    fn append_turn(&self, turn: &Turn) {
        self.log
            .lock()
            .unwrap()
            .push(format!("append {}: {}", turn.speaker, turn.text));
    }

    fn replace_turns(&self, turns: &[Turn]) {
        self.log.lock().unwrap().push(format!("replace {}", turns.len()));
    }

    fn scroll_to_bottom(&self) {
        self.log.lock().unwrap().push("scroll".into());
    }
}
