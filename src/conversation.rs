use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::assistant::Assistant;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    /// Label used in the CHAT HISTORY block. The assistant speaks under its
    /// persona name.
    pub fn label<'a>(&self, assistant_name: &'a str) -> &'a str {
        match self {
            Speaker::User => "User",
            Speaker::Assistant => assistant_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Ordered turns of one conversation, oldest first.
///
/// Turns are only ever added in User/Assistant pairs by
/// [`Assistant::respond`], so a failed question leaves no trace.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// The last `max_turns` of `turns`; zero keeps them all.
pub fn recent_turns(turns: &[Turn], max_turns: usize) -> &[Turn] {
    if max_turns == 0 || turns.len() <= max_turns {
        turns
    } else {
        &turns[turns.len() - max_turns..]
    }
}

/// One user's conversation. Questions submitted concurrently to the same
/// session are answered one at a time.
#[derive(Debug, Default)]
pub struct Session {
    history: Mutex<ConversationHistory>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ask(&self, assistant: &Assistant, question: &str) -> Result<String> {
        let mut history = self.history.lock().await;
        assistant.respond(question, &mut history).await
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.history.lock().await.all().to_vec()
    }

    pub async fn reset(&self) {
        self.history.lock().await.clear();
    }
}
