//! # Rapport Core
//!
//! Domain types, traits, and error definitions for the Rapport chat pipeline.
//! This crate has **no I/O of its own**: it defines the turn/profile model and
//! the seams (completion, storage, view) that every other crate implements
//! against.
//!
//! ## Layout
//!
//! - [`turn`]: immutable conversation turns, the per-user profile, prompt windows
//! - [`completion`]: the language-model boundary
//! - [`store`]: persistence contracts for turns and profiles
//! - [`view`]: the presentation boundary
//! - [`event`]: broadcast bus for domain events and background failures

pub mod completion;
pub mod error;
pub mod event;
pub mod store;
pub mod turn;
pub mod view;

// Re-export key types at crate root for ergonomics
pub use completion::CompletionClient;
pub use error::{CompletionError, Error, Result, StorageError};
pub use event::{DomainEvent, EventBus};
pub use store::{ChatStore, ProfileStore};
pub use turn::{Profile, Turn, Window};
pub use view::{ChatView, NullView};
