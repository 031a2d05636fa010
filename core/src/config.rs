/// Model used for sessions created before the user picks one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TITLE: &str = "New chat";
pub const DEFAULT_ERROR_REPLY: &str = "Connection error.";
/// Number of characters of the first message that become the session title.
pub const TITLE_MAX_CHARS: usize = 30;

/// How a session gets its display title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitlePolicy {
    /// Placeholder until the first message, then the start of that message.
    #[default]
    FirstMessage,
    /// "Chat N" at creation, never re-derived.
    Numbered,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub default_model: String,
    pub default_title: String,
    pub title_policy: TitlePolicy,
    pub title_max_chars: usize,
    /// Text of the model message appended when a completion fails.
    pub error_reply: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            default_title: DEFAULT_TITLE.to_string(),
            title_policy: TitlePolicy::default(),
            title_max_chars: TITLE_MAX_CHARS,
            error_reply: DEFAULT_ERROR_REPLY.to_string(),
        }
    }
}

impl ChatConfig {
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_title_policy(mut self, policy: TitlePolicy) -> Self {
        self.title_policy = policy;
        self
    }

    pub fn with_error_reply(mut self, reply: impl Into<String>) -> Self {
        self.error_reply = reply.into();
        self
    }

    /// Title for a session created when `existing` sessions are already stored.
    pub fn initial_title(&self, existing: usize) -> String {
        match self.title_policy {
            TitlePolicy::FirstMessage => self.default_title.clone(),
            TitlePolicy::Numbered => format!("Chat {}", existing + 1),
        }
    }

    /// Title derived from the first message, or `None` when the policy keeps titles fixed.
    pub fn derived_title(&self, first_message: &str) -> Option<String> {
        match self.title_policy {
            TitlePolicy::FirstMessage => {
                let title: String = first_message.trim().chars().take(self.title_max_chars).collect();
                if title.is_empty() { None } else { Some(title) }
            }
            TitlePolicy::Numbered => None,
        }
    }
}
