//! The boundary with the conversational wellness assistant.
//!
//! The assistant itself is an external service. This module only builds the
//! read-only context it is given and keeps the conversation history, turning
//! any failure into a generic apology so that nothing upstream is affected.

use std::fmt;

use serde::Serialize;

use crate::{
    domain::{DrinkKind, PromotionOffer},
    stats::StatsReport,
};

/// Greeting that opens every conversation.
pub const GREETING: &str = "Hi! I'm your Modera wellness assistant. Ask me anything about \
                            responsible drinking, tips for cutting down, or just tell me how \
                            you're feeling. How can I help today?";

/// Reply used when the assistant fails or answers with nothing.
pub const APOLOGY: &str =
    "Sorry, something went wrong while processing your message. Please try again later.";

/// Snapshot of the user's statistics shared with the assistant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantContext {
    /// Alcohol units this week.
    pub weekly_units: f64,
    /// The weekly goal.
    pub weekly_goal: f64,
    /// Estimated savings from non-alcoholic choices.
    pub savings_estimate: f64,
    /// The most consumed kind this month, if any.
    pub most_consumed_kind: Option<DrinkKind>,
    /// Active promotions as `(title, code)` pairs.
    pub promotions: Vec<(String, String)>,
}

impl AssistantContext {
    /// Capture the context from a report and the promotion catalogue.
    ///
    /// Inactive promotions are left out.
    #[must_use]
    pub fn from_report(report: &StatsReport, promotions: &[PromotionOffer]) -> Self {
        Self {
            weekly_units: report.weekly_units,
            weekly_goal: report.weekly_goal,
            savings_estimate: report.savings_estimate,
            most_consumed_kind: report.most_consumed_kind,
            promotions: promotions
                .iter()
                .filter(|offer| offer.active)
                .map(|offer| (offer.title.clone(), offer.code.clone()))
                .collect(),
        }
    }
}

impl fmt::Display for AssistantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current user context:")?;
        writeln!(f, "- Units consumed this week: {}", self.weekly_units)?;
        writeln!(f, "- Weekly limit: {}", self.weekly_goal)?;
        writeln!(
            f,
            "- Estimated savings from non-alcoholic choices: ${:.2}",
            self.savings_estimate
        )?;
        match self.most_consumed_kind {
            Some(kind) => writeln!(f, "- Most frequent drink: {}", kind.label())?,
            None => writeln!(f, "- Most frequent drink: none")?,
        }
        let promotions = self
            .promotions
            .iter()
            .map(|(title, code)| format!("{title} ({code})"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "- Active promotions: {promotions}")
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The person using the app.
    User,
    /// The assistant.
    Assistant,
}

/// A single turn in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// The author.
    pub role: Role,
    /// Plain or markdown text.
    pub content: String,
}

/// Failure reported by an assistant implementation.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// The service could not be reached or refused the request.
    #[error("assistant unavailable: {0}")]
    Unavailable(String),
    /// The service answered with something unusable.
    #[error("invalid assistant response: {0}")]
    InvalidResponse(String),
}

/// A conversational service.
pub trait Assistant {
    /// Produce a reply to `message`.
    ///
    /// `history` holds every earlier turn, oldest first, excluding `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if no reply could be produced.
    fn reply(
        &self,
        context: &AssistantContext,
        history: &[Message],
        message: &str,
    ) -> Result<String, AssistantError>;
}

/// A conversation with an assistant.
#[derive(Debug)]
pub struct Conversation<A> {
    assistant: A,
    context: AssistantContext,
    messages: Vec<Message>,
}

impl<A: Assistant> Conversation<A> {
    /// Start a conversation, opening with the greeting.
    pub fn new(assistant: A, context: AssistantContext) -> Self {
        Self {
            assistant,
            context,
            messages: vec![Message {
                role: Role::Assistant,
                content: GREETING.to_string(),
            }],
        }
    }

    /// Send a message and return the reply.
    ///
    /// Blank messages are ignored and return `None`. Failures are logged and
    /// answered with [`APOLOGY`].
    pub fn send(&mut self, message: &str) -> Option<&Message> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        let reply = match self
            .assistant
            .reply(&self.context, &self.messages, message)
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("Assistant returned an empty reply");
                APOLOGY.to_string()
            }
            Err(e) => {
                tracing::warn!("Assistant failed: {e}");
                APOLOGY.to_string()
            }
        };

        self.messages.push(Message {
            role: Role::User,
            content: message.to_string(),
        });
        self.messages.push(Message {
            role: Role::Assistant,
            content: reply,
        });
        self.messages.last()
    }

    /// Replace the context, e.g. after the log changed.
    pub fn refresh_context(&mut self, context: AssistantContext) {
        self.context = context;
    }

    /// The context currently shared with the assistant.
    pub const fn context(&self) -> &AssistantContext {
        &self.context
    }

    /// Every message so far, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
