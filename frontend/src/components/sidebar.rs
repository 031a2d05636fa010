use chrono::Local;
use leptos::ev;
use leptos::prelude::*;

use crate::state::AppState;

/// Sidebar showing the saved chats and the "New chat" button.
#[component]
pub fn Sidebar() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <aside class="sidebar">
            <div class="sidebar-header">
                <h2>"Chats"</h2>
                <button class="new-chat-btn" on:click=move |_| state.new_session()>
                    "+ New chat"
                </button>
            </div>
            <div class="session-list">
                {move || {
                    state
                        .sessions
                        .get()
                        .into_iter()
                        .map(|session| {
                            let id_click = session.id.clone();
                            let id_delete = session.id.clone();
                            let when = session
                                .updated_at
                                .with_timezone(&Local)
                                .format("%Y-%m-%d %H:%M")
                                .to_string();
                            view! {
                                <div
                                    class="session-item"
                                    class:active=session.is_active
                                    on:click=move |_| state.select_session(id_click.clone())
                                >
                                    <span class="session-title">{session.title}</span>
                                    <span
                                        class="delete-btn"
                                        title="Delete chat"
                                        on:click=move |ev: ev::MouseEvent| {
                                            ev.stop_propagation();
                                            state.delete_session(id_delete.clone());
                                        }
                                    >
                                        "✕"
                                    </span>
                                    <small>{when}</small>
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </div>
        </aside>
    }
}
