//! End-to-end behaviour of the chat controller over an in-memory store.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use chat_sessions_core::store::{ACTIVE_SESSION_KEY, LEGACY_SESSIONS_KEY, SESSIONS_KEY};
use chat_sessions_core::{
    ChatConfig, ChatController, CompletionClient, CompletionError, CompletionRequest, KeyValueStore,
    MemoryStore, Message, SessionStore, TitlePolicy,
};

/// Replays canned outcomes and records every request it receives.
#[derive(Default)]
struct ScriptedClient {
    replies: RefCell<VecDeque<Result<String, CompletionError>>>,
    requests: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    fn replying(replies: Vec<Result<String, CompletionError>>) -> Self {
        Self { replies: RefCell::new(replies.into()), requests: RefCell::default() }
    }
}

#[async_trait(?Send)]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(CompletionError::Network("no scripted reply".into())))
    }
}

fn assert_pointer_resolves(c: &ChatController<MemoryStore>) {
    let id = c.active_id().expect("an active session");
    let session = c.repository().session(id).expect("pointer resolves");
    assert_eq!(session.conversation.as_slice(), c.messages());
}

fn assert_ids_unique(c: &ChatController<MemoryStore>) {
    let mut ids: Vec<_> = c.repository().list_sessions().into_iter().map(|s| s.id).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

mod scenarios {
    use super::*;

    #[test]
    fn first_run_creates_one_active_placeholder_session() {
        let kv = MemoryStore::new();
        let c = ChatController::init(kv.clone(), ChatConfig::default());

        let view = c.view();
        assert_eq!(view.sessions.len(), 1);
        assert_eq!(view.sessions[0].title, "New chat");
        assert!(view.sessions[0].is_active);
        assert_eq!(kv.get(ACTIVE_SESSION_KEY).unwrap().as_deref(), Some(view.sessions[0].id.as_str()));
    }

    #[tokio::test]
    async fn successful_send_appends_user_and_model_messages() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let client = ScriptedClient::replying(vec![Ok("hi".into())]);

        assert!(c.send_message(&client, "hello").await);

        assert_eq!(c.messages(), &[Message::user("hello"), Message::model("hi")]);
        assert_eq!(c.repository().active_session().unwrap().title, "hello");

        let requests = client.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "hello");
        assert_eq!(requests[0].session_id, c.active_id().unwrap().as_str());
    }

    #[tokio::test]
    async fn title_comes_only_from_the_first_message() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let client = ScriptedClient::replying(vec![Ok("one".into()), Ok("two".into())]);

        c.send_message(&client, "first question").await;
        c.send_message(&client, "hello").await;

        assert_eq!(c.repository().active_session().unwrap().title, "first question");
        assert_eq!(c.messages().len(), 4);
    }

    #[tokio::test]
    async fn failed_send_keeps_user_message_and_adds_error_reply() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let client = ScriptedClient::replying(vec![Err(CompletionError::Network("timed out".into()))]);

        c.send_message(&client, "hello").await;

        assert_eq!(c.messages(), &[Message::user("hello"), Message::model_error("Connection error.")]);
        assert_eq!(c.messages().iter().filter(|m| m.is_error).count(), 1);
        assert!(!c.is_sending());

        // still usable afterwards
        let client = ScriptedClient::replying(vec![Ok("back".into())]);
        c.send_message(&client, "again").await;
        assert_eq!(c.messages().len(), 4);
    }

    #[test]
    fn deleting_active_session_moves_to_the_remaining_one() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let older = c.active_id().cloned().unwrap();
        let newer = c.start_new_session();

        c.delete_session(&newer);
        assert_eq!(c.active_id(), Some(&older));
        assert_eq!(c.repository().list_sessions().len(), 1);
        assert_pointer_resolves(&c);
    }

    #[test]
    fn deleting_the_only_session_starts_a_new_one() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let only = c.active_id().cloned().unwrap();

        c.delete_session(&only);

        let view = c.view();
        assert_eq!(view.sessions.len(), 1);
        assert_ne!(view.sessions[0].id, only);
        assert!(view.sessions[0].is_active);
        assert!(view.messages.is_empty());
    }

    #[tokio::test]
    async fn clearing_empties_conversation_but_keeps_session() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let client = ScriptedClient::replying(vec![Ok("a".into()), Ok("b".into())]);
        c.send_message(&client, "one").await;
        c.send_message(&client, "two").await;
        let id = c.active_id().cloned().unwrap();

        c.clear_active_conversation();

        assert!(c.messages().is_empty());
        assert_eq!(c.active_id(), Some(&id));
        assert!(c.repository().active_session().unwrap().conversation.is_empty());
    }
}

mod invariants {
    use super::*;

    #[tokio::test]
    async fn conversation_only_shrinks_on_clear() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let client = ScriptedClient::replying(vec![
            Ok("a".into()),
            Err(CompletionError::MissingOutput),
            Ok("c".into()),
        ]);

        let mut previous = 0;
        for text in ["one", "", "two", "   ", "three", "four"] {
            c.send_message(&client, text).await;
            let len = c.repository().active_session().unwrap().conversation.len();
            assert!(len >= previous);
            previous = len;
        }
        assert_eq!(previous, 8);

        c.clear_active_conversation();
        assert_eq!(c.repository().active_session().unwrap().conversation.len(), 0);
    }

    #[test]
    fn pointer_and_ids_hold_across_action_sequences() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let a = c.active_id().cloned().unwrap();
        let b = c.start_new_session();
        let d = c.start_new_session();
        assert_pointer_resolves(&c);
        assert_ids_unique(&c);

        c.switch_to_session(&a);
        assert_pointer_resolves(&c);
        c.delete_session(&b);
        assert_eq!(c.active_id(), Some(&a));
        c.delete_session(&a);
        assert_eq!(c.active_id(), Some(&d));
        c.delete_session(&d);
        assert_pointer_resolves(&c);
        assert_ids_unique(&c);
        assert_eq!(c.repository().list_sessions().len(), 1);
    }

    #[tokio::test]
    async fn switching_twice_is_the_same_as_once() {
        let mut c = ChatController::init(MemoryStore::new(), ChatConfig::default());
        let client = ScriptedClient::replying(vec![Ok("x".into())]);
        let first = c.active_id().cloned().unwrap();
        c.send_message(&client, "on first").await;
        c.start_new_session();

        c.switch_to_session(&first);
        let once = c.view();
        c.switch_to_session(&first);
        assert_eq!(c.view(), once);
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn reload_restores_active_session_and_conversation() {
        let kv = MemoryStore::new();
        let mut c = ChatController::init(kv.clone(), ChatConfig::default());
        let client = ScriptedClient::replying(vec![Ok("hi".into())]);
        c.send_message(&client, "hello").await;
        c.select_model("gemini-2.5-pro");
        let id = c.active_id().cloned().unwrap();
        let before = c.view();
        c.start_new_session();
        c.switch_to_session(&id);

        let reloaded = ChatController::init(kv, ChatConfig::default());
        assert_eq!(reloaded.active_id(), Some(&id));
        assert_eq!(reloaded.messages(), before.messages.as_slice());
        assert_eq!(reloaded.model(), "gemini-2.5-pro");
        assert_eq!(reloaded.view().sessions.len(), 2);
    }

    #[test]
    fn store_round_trip_preserves_collection_and_pointer() {
        let kv = MemoryStore::new();
        let mut c = ChatController::init(kv.clone(), ChatConfig::default());
        c.start_new_session();

        let (sessions, active) = SessionStore::new(kv).read();
        let listed: Vec<_> = c.repository().list_sessions();
        assert_eq!(sessions.iter().map(|s| s.summary()).collect::<Vec<_>>(), listed);
        assert_eq!(active.as_ref(), c.active_id());
    }

    #[test]
    fn dangling_pointer_starts_a_new_session() {
        let stored = r#"{"version":1,"sessions":[
            {"id":"kept","title":"Old chat","updatedAt":"2025-03-01T10:00:00Z","model":"gemini-2.5-flash",
             "conversation":[{"role":"user","text":"hi"}]}
        ]}"#;
        let kv = MemoryStore::new()
            .with_entry(SESSIONS_KEY, stored)
            .with_entry(ACTIVE_SESSION_KEY, "deleted-elsewhere");

        let c = ChatController::init(kv, ChatConfig::default());
        let view = c.view();
        assert_eq!(view.sessions.len(), 2);
        assert!(view.sessions[0].is_active);
        assert_eq!(view.sessions[1].title, "Old chat");
        assert!(c.messages().is_empty());
    }

    #[test]
    fn unversioned_store_is_migrated_on_load() {
        let stored = r#"[{"id":"legacy","title":"Hola","date":"2025-01-01T00:00:00.000Z","model":"gemini-2.5-flash",
                          "conversation":[{"role":"user","parts":[{"text":"hola"}]}]}]"#;
        let kv = MemoryStore::new()
            .with_entry(SESSIONS_KEY, stored)
            .with_entry(ACTIVE_SESSION_KEY, "legacy");

        let c = ChatController::init(kv.clone(), ChatConfig::default());
        assert_eq!(c.active_id().unwrap().as_str(), "legacy");
        assert_eq!(c.messages(), &[Message::user("hola")]);

        let rewritten = kv.get(SESSIONS_KEY).unwrap().unwrap();
        assert!(rewritten.starts_with(r#"{"version":1"#));
    }

    #[test]
    fn first_release_sessions_are_migrated_from_the_legacy_key() {
        let stored = r#"[
            {"id":"1718000000000","title":"Explain lifetimes","date":"2024-06-10T08:00:00.000Z","model":"gemini-2.5-pro",
             "conversation":[{"role":"user","parts":[{"text":"Explain lifetimes"}]},
                             {"role":"model","parts":[{"text":"They bound borrows."}]}]},
            {"id":"1717000000000","title":"New chat","date":"2024-05-29T12:00:00.000Z","model":"gemini-2.5-flash",
             "conversation":[]}
        ]"#;
        let kv = MemoryStore::new()
            .with_entry(LEGACY_SESSIONS_KEY, stored)
            .with_entry(ACTIVE_SESSION_KEY, "1718000000000");

        let c = ChatController::init(kv.clone(), ChatConfig::default());
        assert_eq!(c.active_id().unwrap().as_str(), "1718000000000");
        assert_eq!(c.model(), "gemini-2.5-pro");
        assert_eq!(c.messages(), &[Message::user("Explain lifetimes"), Message::model("They bound borrows.")]);
        assert_eq!(c.view().sessions.len(), 2);

        let rewritten = kv.get(SESSIONS_KEY).unwrap().unwrap();
        assert!(rewritten.starts_with(r#"{"version":1"#));
        assert_eq!(kv.get(LEGACY_SESSIONS_KEY).unwrap(), None);

        let reloaded = ChatController::init(kv, ChatConfig::default());
        assert_eq!(reloaded.view().sessions.len(), 2);
        assert_eq!(reloaded.messages().len(), 2);
    }

    #[test]
    fn numbered_titles_are_kept() {
        let config = ChatConfig::default().with_title_policy(TitlePolicy::Numbered);
        let mut c = ChatController::init(MemoryStore::new(), config);
        let pending = c.begin_send("hello there").unwrap();
        c.finish_send(pending, Ok("hi".into()));
        c.start_new_session();

        let titles: Vec<_> = c.view().sessions.into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Chat 2", "Chat 1"]);
    }
}
