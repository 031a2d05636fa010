use chat_sessions_core::{ChatConfig, ChatController, CompletionClient, Message, SessionId, SessionListItem};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::{EndpointClient, MODELS};
use crate::storage::BrowserStore;

/// Shared application state, provided via Leptos context.
///
/// The controller is the single owner of session state; the signals are a
/// projection of its view, refreshed after every action.
#[derive(Clone, Copy)]
pub struct AppState {
    controller: StoredValue<ChatController<BrowserStore>, LocalStorage>,

    // --- Read signals (for components to subscribe to) ---
    pub sessions: ReadSignal<Vec<SessionListItem>>,
    pub messages: ReadSignal<Vec<Message>>,
    pub model: ReadSignal<String>,
    pub is_sending: ReadSignal<bool>,
    pub storage_warning: ReadSignal<Option<String>>,

    // --- Write signals ---
    set_sessions: WriteSignal<Vec<SessionListItem>>,
    set_messages: WriteSignal<Vec<Message>>,
    set_model: WriteSignal<String>,
    set_is_sending: WriteSignal<bool>,
    set_storage_warning: WriteSignal<Option<String>>,
}

impl AppState {
    /// Restore (or start) the active chat and provide the state in the current Leptos context.
    pub fn provide() -> Self {
        let config = ChatConfig::default().with_default_model(MODELS[0]);
        let controller = ChatController::init(BrowserStore::open(), config);
        let view = controller.view();

        let (sessions, set_sessions) = signal(view.sessions);
        let (messages, set_messages) = signal(view.messages);
        let (model, set_model) = signal(view.model);
        let (is_sending, set_is_sending) = signal(view.sending);
        let (storage_warning, set_storage_warning) = signal(view.storage_warning);

        let state = Self {
            controller: StoredValue::new_local(controller),
            sessions,
            messages,
            model,
            is_sending,
            storage_warning,
            set_sessions,
            set_messages,
            set_model,
            set_is_sending,
            set_storage_warning,
        };

        provide_context(state);
        state
    }

    fn refresh(&self) {
        let Some(view) = self.controller.try_with_value(|c| c.view()) else {
            return;
        };
        self.set_sessions.set(view.sessions);
        self.set_messages.set(view.messages);
        self.set_model.set(view.model);
        self.set_is_sending.set(view.sending);
        self.set_storage_warning.set(view.storage_warning);
    }

    fn apply(&self, action: impl FnOnce(&mut ChatController<BrowserStore>)) {
        self.controller.update_value(action);
        self.refresh();
    }

    pub fn new_session(&self) {
        self.apply(|c| {
            c.start_new_session();
        });
    }

    pub fn select_session(&self, id: SessionId) {
        self.apply(|c| c.switch_to_session(&id));
    }

    pub fn delete_session(&self, id: SessionId) {
        self.apply(|c| c.delete_session(&id));
    }

    pub fn clear_conversation(&self) {
        self.apply(|c| c.clear_active_conversation());
    }

    pub fn select_model(&self, model: String) {
        self.apply(|c| c.select_model(&model));
    }

    /// Record the user message, then post it to the completion endpoint.
    pub fn send_message(&self, text: String) {
        let Some(pending) = self.controller.try_update_value(|c| c.begin_send(&text)).flatten() else {
            return;
        };
        self.refresh();

        let state = *self;
        spawn_local(async move {
            let outcome = EndpointClient::default().complete(&pending.request).await;
            match &outcome {
                Err(e) if e.is_transport() => log::error!("Completion endpoint unreachable: {e}"),
                Err(e) => log::warn!("Unusable completion response: {e}"),
                Ok(_) => {}
            }
            state.apply(|c| c.finish_send(pending, outcome));
        });
    }
}
