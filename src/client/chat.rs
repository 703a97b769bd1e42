//! Chat view.

use super::AssistantApi;
use crate::models::Role;

/// Shown in place of a reply when the service could not be reached.
pub const FALLBACK: &str = "Entschuldigung, es gab einen Fehler. Bitte versuche es später erneut.";

const GREETING: &str =
    "Hallo! Ich bin dein Pfadi AI Assistent. Wie kann ich dir bei der Planung helfen? 🏕️";

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatPhase {
    #[default]
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatView {
    pub input: String,
    transcript: Vec<Turn>,
    phase: ChatPhase,
}

impl ChatView {
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    /// Send the current input. Blank input is ignored and left in place.
    pub async fn submit(&mut self, api: &impl AssistantApi) {
        if self.input.trim().is_empty() {
            return;
        }
        let message = std::mem::take(&mut self.input);

        self.transcript.push(Turn {
            role: Role::User,
            text: message.clone(),
        });
        self.phase = ChatPhase::AwaitingResponse;

        let reply = match api.send_chat(&message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "Chat request failed");
                FALLBACK.to_string()
            }
        };

        self.transcript.push(Turn {
            role: Role::Assistant,
            text: reply,
        });
        self.phase = ChatPhase::Idle;
    }

    pub fn render(&self) -> String {
        let mut out = String::from("💬 Pfadi AI Assistent\n\n");
        if self.transcript().is_empty() {
            out.push_str(GREETING);
            out.push('\n');
        }
        for turn in self.transcript() {
            let speaker = match turn.role {
                Role::User => "🧑‍💼 Du:",
                Role::Assistant => "🤖 Assistent:",
            };
            out.push_str(&format!("{} {}\n", speaker, turn.text));
        }
        if self.phase() == ChatPhase::AwaitingResponse {
            out.push_str("...\n");
        }
        out
    }
}
