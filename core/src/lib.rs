//! Session persistence and conversation state for a browser chat client.
//!
//! [`store`] persists the collection, [`repository::SessionRepository`] owns its
//! invariants, and [`controller::ChatController`] drives user actions and the
//! [`completion::CompletionClient`] round trip.

pub mod buffer;
pub mod completion;
pub mod config;
pub mod controller;
pub mod errors;
pub mod models;
pub mod repository;
pub mod schema;
pub mod store;

pub use buffer::ConversationBuffer;
pub use completion::{interpret_response, CompletionClient, CompletionRequest, CompletionResponse};
pub use config::{ChatConfig, TitlePolicy};
pub use controller::{ChatController, ChatView, PendingSend, SessionListItem};
pub use errors::{CompletionError, SessionError, StoreError};
pub use models::{Message, Role, Session, SessionId, SessionSummary};
pub use repository::{DeleteOutcome, SessionRepository};
pub use store::{KeyValueStore, MemoryStore, SessionStore};
