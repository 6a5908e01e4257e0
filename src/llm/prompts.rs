//! Prompt template for the legal assistant. All answer policy lives in the
//! instructions rendered here; answers are returned as the model wrote them.

use crate::conversation::Turn;

pub const DEFAULT_ASSISTANT_NAME: &str = "NyaySetu";

pub const DEFAULT_REDIRECT_MESSAGE: &str = "I'm specialized in Indian law and legal matters. For that topic, I'd recommend consulting a relevant expert. Is there anything about law or legal procedures I can help you with?";

pub const DEFAULT_FALLBACK_MESSAGE: &str = "I don't have specific information about that in my knowledge base. For accurate legal advice, please consult a qualified lawyer.";

pub const DEFAULT_DISCLAIMER: &str =
    "Note: This is general information, not legal advice. Consult a lawyer for your specific case.";

/// Placeholder rendered for an empty CONTEXT or CHAT HISTORY block.
pub const EMPTY_BLOCK: &str = "None";

/// Optional replacements for the template texts, read from the config file.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PromptOverrides {
    pub assistant_name: Option<String>,
    pub redirect_message: Option<String>,
    pub fallback_message: Option<String>,
    pub disclaimer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    pub assistant_name: String,
    pub redirect_message: String,
    pub fallback_message: String,
    pub disclaimer: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            redirect_message: DEFAULT_REDIRECT_MESSAGE.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn with_overrides(overrides: &PromptOverrides) -> Self {
        let defaults = Self::default();
        let pick = |o: &Option<String>, d: String| {
            o.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(d)
        };
        Self {
            assistant_name: pick(&overrides.assistant_name, defaults.assistant_name),
            redirect_message: pick(&overrides.redirect_message, defaults.redirect_message),
            fallback_message: pick(&overrides.fallback_message, defaults.fallback_message),
            disclaimer: pick(&overrides.disclaimer, defaults.disclaimer),
        }
    }

    /// The off-topic instruction line exactly as it appears in the prompt.
    pub fn redirect_instruction(&self) -> String {
        format!(
            "- If asked about non-legal topics, politely redirect: \"{}\"",
            self.redirect_message
        )
    }

    pub fn fallback_instruction(&self) -> String {
        format!(
            "- If the CONTEXT doesn't have the information, say: \"{}\"",
            self.fallback_message
        )
    }

    pub fn disclaimer_instruction(&self) -> String {
        format!("- Always end your answer with: \"{}\"", self.disclaimer)
    }

    /// Assemble the full answer prompt. `context` is the retrieved passages
    /// in retrieval order, `history` the prior turns oldest first.
    pub fn render(&self, context: &[&str], history: &[Turn], question: &str) -> String {
        let context_block = if context.is_empty() {
            EMPTY_BLOCK.to_string()
        } else {
            context
                .iter()
                .map(|c| c.trim())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        format!(
            r#"You are {name}, a helpful AI legal assistant. Provide clear answers about Indian law, legal procedures, and rights.

Instructions:
- Answer based on the CONTEXT provided and legal knowledge
- Keep responses concise (2-3 sentences max) and easy to understand for common people
- Use simple language, avoid complex legal jargon unless necessary
{redirect}
{fallback}
{disclaimer}

CONTEXT:
{context}

CHAT HISTORY:
{history}

USER QUESTION: {question}

YOUR ANSWER:"#,
            name = self.assistant_name,
            redirect = self.redirect_instruction(),
            fallback = self.fallback_instruction(),
            disclaimer = self.disclaimer_instruction(),
            context = context_block,
            history = render_history(history, &self.assistant_name),
            question = question,
        )
    }

    /// Prompt asking the model to rewrite a follow-up into a standalone
    /// question, used to sharpen retrieval in multi-turn conversations.
    pub fn condense(&self, history: &[Turn], question: &str) -> String {
        format!(
            r#"Given the following conversation and a follow-up question, rephrase the follow-up question to be a standalone question about Indian law. Reply with the standalone question only.

CHAT HISTORY:
{history}

FOLLOW-UP QUESTION: {question}

STANDALONE QUESTION:"#,
            history = render_history(history, &self.assistant_name),
            question = question,
        )
    }
}

/// Serialise turns oldest first, one `Speaker: text` entry per turn.
pub fn render_history(history: &[Turn], assistant_name: &str) -> String {
    if history.is_empty() {
        return EMPTY_BLOCK.to_string();
    }
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker.label(assistant_name), turn.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
