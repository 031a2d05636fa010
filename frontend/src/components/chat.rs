use chat_sessions_core::Role;
use leptos::ev;
use leptos::prelude::*;

use crate::api::MODELS;
use crate::state::AppState;

/// Main chat area with model selector, message history, and input.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();

    let on_clear = move |_| {
        let confirmed = window()
            .confirm_with_message("Delete every message in this chat?")
            .unwrap_or(false);
        if confirmed {
            state.clear_conversation();
        }
    };

    view! {
        <main class="chat-area">
            // Storage warning banner
            {move || {
                state.storage_warning.get().map(|warning| {
                    view! {
                        <div class="error-banner">"Chats could not be saved: " {warning}</div>
                    }
                })
            }}

            // Chat header
            <div class="chat-header">
                <select
                    class="model-select"
                    prop:value=move || state.model.get()
                    on:change=move |ev| state.select_model(event_target_value(&ev))
                >
                    {MODELS
                        .iter()
                        .map(|m| view! { <option value=*m>{*m}</option> })
                        .collect_view()}
                </select>
                <button
                    class="clear-btn"
                    on:click=on_clear
                    disabled=move || state.messages.get().is_empty() || state.is_sending.get()
                >
                    "Clear"
                </button>
            </div>

            // Messages
            <div class="messages-container">
                {move || {
                    let msgs = state.messages.get();
                    if msgs.is_empty() {
                        view! {
                            <div class="empty-state">"Send a message to start chatting"</div>
                        }
                            .into_any()
                    } else {
                        msgs.into_iter()
                            .map(|m| {
                                view! { <MessageBubble role=m.role text=m.text is_error=m.is_error /> }
                            })
                            .collect_view()
                            .into_any()
                    }
                }}
                {move || {
                    state.is_sending.get().then(|| {
                        view! { <div class="message model typing">"…"</div> }
                    })
                }}
            </div>

            <ChatInput />
        </main>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(role: Role, text: String, is_error: bool) -> impl IntoView {
    let css_class = match (role, is_error) {
        (Role::User, _) => "message user",
        (Role::Model, false) => "message model",
        (Role::Model, true) => "message model error",
    };
    let avatar = match role {
        Role::User => "You",
        Role::Model => "AI",
    };

    view! {
        <div class=css_class>
            <div class="avatar">{avatar}</div>
            <div class="bubble">{text}</div>
        </div>
    }
}

/// Chat input form with textarea and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    let is_sending = move || state.is_sending.get();

    let send = move || {
        let text = input.get().trim().to_string();
        if text.is_empty() || is_sending() {
            return;
        }
        set_input.set(String::new());
        state.send_message(text);
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="1"
                    placeholder="Type a message… (Enter to send, Shift+Enter for newline)"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=is_sending
                />
                <button
                    class="send-btn"
                    on:click=move |_| send()
                    disabled=move || is_sending() || input.get().trim().is_empty()
                >
                    {move || if is_sending() { "Sending…" } else { "Send" }}
                </button>
            </div>
        </div>
    }
}
