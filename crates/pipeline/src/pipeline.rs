//! The conversation/profile synchronization pipeline.
//!
//! One call to [`ConversationPipeline::submit_user_message`]:
//!
//! 1. reads the most recent turns for the user,
//! 2. asks the completion service for a reply (failures become placeholder text),
//! 3. stores the user turn and the reply as one unit,
//! 4. shows both turns in the view,
//! 5. spawns a detached task that derives and stores the user's profile.
//!
//! Steps 1-4 are strictly sequential. Step 5 runs on its own and may still be
//! in flight when the next message arrives; overlapping refreshes for the same
//! user race and the last upsert wins.

use chrono::Utc;
use rapport_core::completion::CompletionClient;
use rapport_core::error::{Result, StorageError};
use rapport_core::event::{DomainEvent, EventBus};
use rapport_core::store::{ChatStore, ProfileStore};
use rapport_core::turn::{Profile, Turn, Window};
use rapport_core::view::{ChatView, NullView};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::prompt::{self, Purpose};

/// Turns fed into each prompt unless configured otherwise.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// The outcome of one accepted submission.
#[derive(Debug)]
pub struct Exchange {
    /// The stored user turn (trimmed text)
    pub user_turn: Turn,

    /// The stored reply, possibly placeholder text
    pub bot_turn: Turn,

    /// The background profile refresh started by this exchange
    pub refresh: ProfileRefresh,
}

impl Exchange {
    /// The text shown to the user as the model's answer.
    pub fn reply(&self) -> &str {
        &self.bot_turn.text
    }
}

/// Handle to a detached profile refresh.
///
/// Dropping it leaves the task running. Awaiting [`ProfileRefresh::wait`]
/// yields the stored profile, or `None` if the refresh failed.
#[derive(Debug)]
pub struct ProfileRefresh {
    handle: JoinHandle<Option<Profile>>,
}

impl ProfileRefresh {
    pub async fn wait(self) -> Option<Profile> {
        match self.handle.await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Profile refresh task ended abnormally: {e}");
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Everything the background refresh needs, cheap to clone into a task.
#[derive(Clone)]
struct ProfileRefresher {
    client: Arc<dyn CompletionClient>,
    profiles: Arc<dyn ProfileStore>,
    model: String,
    event_bus: Arc<EventBus>,
}

impl ProfileRefresher {
    async fn run(&self, user_id: &str, window: &Window) -> std::result::Result<Profile, StorageError> {
        let (chat_history_summary, personality_summary, worldview_summary) = tokio::join!(
            self.derive(Purpose::Summary, prompt::build_summary_prompt(window)),
            self.derive(Purpose::Personality, prompt::build_personality_prompt(window)),
            self.derive(Purpose::Worldview, prompt::build_worldview_prompt(window)),
        );

        let profile = Profile {
            user_id: user_id.to_string(),
            personality_summary,
            worldview_summary,
            chat_history_summary,
            updated_at: Utc::now(),
        };

        self.profiles.upsert(profile.clone()).await?;

        info!(user_id = %user_id, window = window.len(), "Profile refreshed");
        self.event_bus.publish(DomainEvent::ProfileUpdated {
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
        });
        Ok(profile)
    }

    async fn derive(&self, purpose: Purpose, prompt: String) -> String {
        complete_or_fallback(self.client.as_ref(), &self.model, &prompt, purpose, &self.event_bus).await
    }
}

/// Run one completion and fold every failure into display text.
async fn complete_or_fallback(
    client: &dyn CompletionClient,
    model: &str,
    prompt: &str,
    purpose: Purpose,
    event_bus: &EventBus,
) -> String {
    match client.complete(model, prompt).await {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => {
            debug!(purpose = purpose.as_str(), "Completion returned no text");
            purpose.placeholder().to_string()
        }
        Err(e) => {
            warn!(purpose = purpose.as_str(), client = client.name(), "Completion failed: {e}");
            event_bus.publish(DomainEvent::CompletionFailed {
                purpose: purpose.as_str().to_string(),
                error_message: e.to_string(),
                timestamp: Utc::now(),
            });
            format!("{}: {e}", purpose.failure_prefix())
        }
    }
}

/// Orchestrates completion, persistence, view updates, and profile refresh.
pub struct ConversationPipeline {
    chat: Arc<dyn ChatStore>,
    view: Arc<dyn ChatView>,
    history_window: usize,
    refresher: ProfileRefresher,
}

impl ConversationPipeline {
    /// Create a pipeline with no view and a private event bus.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        chat: Arc<dyn ChatStore>,
        profiles: Arc<dyn ProfileStore>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            view: Arc::new(NullView),
            history_window: DEFAULT_HISTORY_WINDOW,
            refresher: ProfileRefresher {
                client,
                profiles,
                model: model.into(),
                event_bus: Arc::new(EventBus::default()),
            },
        }
    }

    /// Set how many recent turns feed each prompt.
    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    /// Attach the view that renders the thread.
    pub fn with_view(mut self, view: Arc<dyn ChatView>) -> Self {
        self.view = view;
        self
    }

    /// Publish domain events to a shared bus.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.refresher.event_bus = event_bus;
        self
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.refresher.event_bus
    }

    /// Handle one user message.
    ///
    /// Blank input is ignored and yields `Ok(None)`. Completion failures never
    /// surface here; they become the reply text. Storage failures do.
    pub async fn submit_user_message(&self, user_id: &str, text: &str) -> Result<Option<Exchange>> {
        let text = text.trim();
        if text.is_empty() {
            debug!(user_id = %user_id, "Ignoring blank message");
            return Ok(None);
        }

        let window = Window::from_recent(self.chat.recent_turns(user_id, self.history_window).await?);
        let reply_prompt = prompt::build_reply_prompt(&window, text);
        let reply = complete_or_fallback(
            self.refresher.client.as_ref(),
            &self.refresher.model,
            &reply_prompt,
            Purpose::Reply,
            &self.refresher.event_bus,
        )
        .await;

        let user_turn = Turn::user(user_id, text);
        let bot_turn = Turn::bot(user_id, reply);
        self.chat
            .append_exchange(user_turn.clone(), bot_turn.clone())
            .await?;

        self.view.append_turn(&user_turn);
        self.view.append_turn(&bot_turn);
        self.view.scroll_to_bottom();

        self.refresher.event_bus.publish(DomainEvent::ExchangeStored {
            user_id: user_id.to_string(),
            user_turn_id: user_turn.id.clone(),
            bot_turn_id: bot_turn.id.clone(),
            timestamp: Utc::now(),
        });

        let refresh = self.spawn_refresh(user_id, window);

        Ok(Some(Exchange {
            user_turn,
            bot_turn,
            refresh,
        }))
    }

    /// Derive and store the profile for `user_id` from `window`, in place.
    pub async fn refresh_profile(&self, user_id: &str, window: &Window) -> Result<Profile> {
        Ok(self.refresher.run(user_id, window).await?)
    }

    /// Up to `limit` recent turns, oldest first, also pushed to the view.
    pub async fn load_recent(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>> {
        let window = Window::from_recent(self.chat.recent_turns(user_id, limit).await?);
        self.view.replace_turns(window.turns());
        self.view.scroll_to_bottom();
        Ok(window.into_turns())
    }

    /// The stored profile for `user_id`, if any refresh has completed.
    pub async fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self.refresher.profiles.get(user_id).await?)
    }

    fn spawn_refresh(&self, user_id: &str, window: Window) -> ProfileRefresh {
        let refresher = self.refresher.clone();
        let user_id = user_id.to_string();

        let handle = tokio::spawn(async move {
            match refresher.run(&user_id, &window).await {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(user_id = %user_id, "Profile refresh failed: {e}");
                    refresher.event_bus.publish(DomainEvent::ProfileRefreshFailed {
                        user_id,
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                    None
                }
            }
        });

        ProfileRefresh { handle }
    }
}
