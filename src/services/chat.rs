//! Conversation handling for the assistant.
//!
//! Builds the prompt from the system prompt, remembered turns and the new
//! message, lets the model call into game search, planning and the knowledge
//! base, and remembers the exchange.

use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::games::{GameSearchService, SearchParams};
use super::{knowledge, planning};
use crate::db::Repository;
use crate::errors::AppError;
use crate::llm::{
    AzureOpenAiClient, CompletionOptions, FunctionCall, FunctionDef, LlmError, PromptMessage,
};
use crate::models::{
    ChatMessage, ChatRequest, ChatResponse, ConversationExport, GameFilters, Location,
    PedagogicalGoal, PlanLocation, PlanningRequest, Role, SuggestedAction, Usage, UserContext,
};

/// Remembered turns sent along with each prompt.
const PROMPT_HISTORY: usize = 20;
/// Turns kept per conversation.
const MEMORY_LIMIT: usize = 50;
/// Conversations kept in memory; the least recently updated one is dropped first.
const MAX_CONVERSATIONS: usize = 1000;
const MAX_SUGGESTED_ACTIONS: usize = 4;
const FUNCTION_SEARCH_LIMIT: usize = 5;

pub const TECHNICAL_ERROR_REPLY: &str =
    "Entschuldigung, es gab einen technischen Fehler. Bitte versuche es erneut.";
const EMPTY_REPLY: &str = "Keine Antwort erhalten.";

const SYSTEM_PROMPT: &str = "Du bist der Pfadi AI Assistent, ein hilfsreicher KI-Assistent für Pfadfinderleiter:innen in Österreich.

DEINE ROLLE:
- Unterstütze bei der Planung von Heimstunden und Lagern für Guides und Späher (10-13 Jahre)
- Helfe beim Finden passender Spiele und Aktivitäten
- Beantworte Fragen zum Pfadfinderwissen, Gesetzen und Traditionen
- Gib pädagogische Ratschläge für die Altersgruppe 10-13 Jahre
- Sei authentisch pfadfinderisch und verwende entsprechende Begriffe

VERFÜGBARE FUNKTIONEN:
- search_games: Suche nach Spielen und Aktivitäten
- create_heimstunde_plan: Erstelle strukturierte Heimstundenpläne
- get_pfadfinder_knowledge: Beantworte Pfadfinderfragen

VERHALTEN:
- Sei freundlich, ermutigend und hilfsbereit
- Verwende die pfadfinderische Sprache (\"Gut Pfad!\", \"Leiter:in\", etc.)
- Biete konkrete, umsetzbare Vorschläge
- Frage nach, wenn wichtige Informationen fehlen
- Nutze die verfügbaren Funktionen, wenn passend
- Erkläre komplexe Konzepte altersgerecht

KONTEXT: Du hilfst bei der Arbeit mit Guides und Spähern (10-13 Jahre) in Niederösterreich und Wien.";

/// Outcome of answering one message, before it is remembered.
struct Reply {
    message: String,
    data: Option<Value>,
    usage: Option<Usage>,
    mock: bool,
}

pub struct ChatService {
    llm: Option<Arc<AzureOpenAiClient>>,
    games: Arc<GameSearchService>,
    repo: Arc<Repository>,
    conversations: RwLock<HashMap<String, Vec<ChatMessage>>>,
    max_conversations: usize,
}

impl ChatService {
    pub fn new(
        llm: Option<Arc<AzureOpenAiClient>>,
        games: Arc<GameSearchService>,
        repo: Arc<Repository>,
    ) -> Self {
        Self {
            llm,
            games,
            repo,
            conversations: RwLock::new(HashMap::new()),
            max_conversations: MAX_CONVERSATIONS,
        }
    }

    /// Answer a chat message and remember the exchange.
    pub async fn process(&self, request: ChatRequest) -> Result<ChatResponse, AppError> {
        let message = request.message.trim().to_string();
        if message.is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }

        let conversation_id = request
            .conversation_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        tracing::info!(
            %conversation_id,
            message_length = message.len(),
            "Processing chat message"
        );

        let reply = match &self.llm {
            Some(llm) => {
                let prompt = self
                    .build_prompt(&message, &conversation_id, request.user_context.as_ref())
                    .await;
                match self.ai_reply(llm, prompt).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::error!(%conversation_id, error = %e, "Error processing message");
                        Reply {
                            message: TECHNICAL_ERROR_REPLY.to_string(),
                            data: None,
                            usage: None,
                            mock: false,
                        }
                    }
                }
            }
            None => Reply {
                message: canned_reply(&message),
                data: None,
                usage: Some(Usage::default()),
                mock: true,
            },
        };

        self.remember(&conversation_id, &message, &reply.message)
            .await;
        let suggested_actions = suggested_actions(reply.data.as_ref(), &message);

        Ok(ChatResponse {
            message: reply.message,
            conversation_id,
            data: reply.data,
            suggested_actions,
            timestamp: Utc::now(),
            usage: reply.usage,
            mock_response: Some(reply.mock),
        })
    }

    pub async fn history(&self, conversation_id: &str) -> Vec<ChatMessage> {
        self.conversations
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget a conversation. Returns false if it was unknown.
    pub async fn clear(&self, conversation_id: &str) -> bool {
        self.conversations
            .write()
            .await
            .remove(conversation_id)
            .is_some()
    }

    /// Export a conversation; `None` when it is unknown or empty.
    pub async fn export(&self, conversation_id: &str) -> Option<ConversationExport> {
        let messages = self.history(conversation_id).await;
        if messages.is_empty() {
            return None;
        }
        Some(ConversationExport {
            conversation_id: conversation_id.to_string(),
            exported_at: Utc::now(),
            message_count: messages.len(),
            messages,
        })
    }

    async fn build_prompt(
        &self,
        message: &str,
        conversation_id: &str,
        user_context: Option<&UserContext>,
    ) -> Vec<PromptMessage> {
        let mut prompt = vec![PromptMessage::system(system_prompt(user_context))];

        if let Some(history) = self.conversations.read().await.get(conversation_id) {
            let skip = history.len().saturating_sub(PROMPT_HISTORY);
            prompt.extend(history.iter().skip(skip).map(|m| match m.role {
                Role::User => PromptMessage::user(m.content.clone()),
                Role::Assistant => PromptMessage::assistant(m.content.clone()),
            }));
        }

        prompt.push(PromptMessage::user(message));
        prompt
    }

    async fn ai_reply(
        &self,
        llm: &AzureOpenAiClient,
        mut prompt: Vec<PromptMessage>,
    ) -> Result<Reply, LlmError> {
        let options = CompletionOptions::default();
        let functions = function_defs();

        let first = llm
            .chat_completion(&prompt, Some(functions.as_slice()), &options)
            .await?;

        let Some(call) = first.function_call else {
            return Ok(Reply {
                message: first.message.unwrap_or_else(|| EMPTY_REPLY.to_string()),
                data: None,
                usage: Some(first.usage),
                mock: false,
            });
        };

        let data = self.execute_function(&call).await;
        prompt.push(PromptMessage::function_request(call.clone()));
        prompt.push(PromptMessage::function_result(
            call.name.clone(),
            data.to_string(),
        ));

        let last = llm.chat_completion(&prompt, None, &options).await?;
        Ok(Reply {
            message: last.message.unwrap_or_else(|| EMPTY_REPLY.to_string()),
            data: Some(data),
            usage: Some(last.usage),
            mock: false,
        })
    }

    /// Run a function the model asked for. Failures become an `error` object
    /// so the model can still phrase an answer.
    async fn execute_function(&self, call: &FunctionCall) -> Value {
        tracing::info!(function = %call.name, arguments = %call.arguments, "Executing function call");

        let result = match call.name.as_str() {
            "search_games" => match serde_json::from_str(&call.arguments) {
                Ok(args) => self.search_games(args).await,
                Err(_) => return invalid_arguments(),
            },
            "create_heimstunde_plan" => match serde_json::from_str(&call.arguments) {
                Ok(args) => self.create_plan(args).await,
                Err(_) => return invalid_arguments(),
            },
            "get_pfadfinder_knowledge" => {
                match serde_json::from_str::<KnowledgeArgs>(&call.arguments) {
                    Ok(args) => Ok(json!(knowledge::answer(
                        &args.question,
                        args.age_appropriate
                    ))),
                    Err(_) => return invalid_arguments(),
                }
            }
            other => return json!({ "error": format!("Unknown function: {}", other) }),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(function = %call.name, error = %e, "Function call failed");
            json!({ "error": e.message() })
        })
    }

    async fn search_games(&self, args: SearchGamesArgs) -> Result<Value, AppError> {
        let params = SearchParams {
            query: Some(args.query.clone()),
            filters: GameFilters {
                duration_max: args.duration_max,
                participant_count: args.participant_count,
                location: args.location.as_deref().and_then(Location::parse),
                age_group: Some(args.age_group.unwrap_or_else(|| "10-13".to_string())),
                tags: None,
            },
            limit: FUNCTION_SEARCH_LIMIT,
            semantic: true,
        };
        let response = self.games.search(&params).await?;

        Ok(json!({
            "games": response.games,
            "query": args.query,
            "total_found": response.total_found,
        }))
    }

    async fn create_plan(&self, args: PlanArgs) -> Result<Value, AppError> {
        if args.duration == 0 || args.participant_count == 0 {
            return Err(AppError::Validation(
                "duration and participant_count must be positive".to_string(),
            ));
        }
        let request = PlanningRequest {
            title: None,
            date: Local::now().date_naive(),
            duration: args.duration,
            participant_count: args.participant_count,
            age_group: "10-13".to_string(),
            theme: args.theme,
            location: args
                .location
                .as_deref()
                .and_then(PlanLocation::parse)
                .unwrap_or_default(),
            pedagogical_goals: args
                .pedagogical_goals
                .into_iter()
                .map(|goal| PedagogicalGoal {
                    goal_type: goal.to_lowercase(),
                    description: goal,
                })
                .collect(),
            special_requirements: None,
        };

        let plan = planning::build_heimstunde_plan(&request, Utc::now());
        self.repo.create_plan(&plan).await?;
        Ok(serde_json::to_value(&plan)?)
    }

    async fn remember(&self, conversation_id: &str, user_message: &str, reply: &str) {
        let now = Utc::now();
        let mut conversations = self.conversations.write().await;
        let history = conversations.entry(conversation_id.to_string()).or_default();

        history.push(ChatMessage {
            role: Role::User,
            content: user_message.to_string(),
            timestamp: now,
        });
        history.push(ChatMessage {
            role: Role::Assistant,
            content: reply.to_string(),
            timestamp: now,
        });

        if history.len() > MEMORY_LIMIT {
            let excess = history.len() - MEMORY_LIMIT;
            history.drain(..excess);
        }

        while conversations.len() > self.max_conversations {
            let stalest = conversations
                .iter()
                .filter(|(id, _)| id.as_str() != conversation_id)
                .min_by_key(|(_, history)| history.last().map(|m| m.timestamp))
                .map(|(id, _)| id.clone());
            let Some(stalest) = stalest else { break };
            conversations.remove(&stalest);
            tracing::debug!(conversation_id = %stalest, "Evicted least recently used conversation");
        }
    }
}

#[derive(Deserialize)]
struct SearchGamesArgs {
    query: String,
    #[serde(default)]
    duration_max: Option<u32>,
    #[serde(default)]
    participant_count: Option<u32>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    age_group: Option<String>,
}

#[derive(Deserialize)]
struct PlanArgs {
    #[serde(default)]
    theme: Option<String>,
    duration: u32,
    participant_count: u32,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    pedagogical_goals: Vec<String>,
}

#[derive(Deserialize)]
struct KnowledgeArgs {
    question: String,
    #[serde(default)]
    age_appropriate: bool,
}

fn invalid_arguments() -> Value {
    json!({ "error": "Invalid function arguments" })
}

fn system_prompt(user_context: Option<&UserContext>) -> String {
    let mut prompt = SYSTEM_PROMPT.to_string();
    let Some(context) = user_context else {
        return prompt;
    };

    let lines: Vec<String> = [
        ("Name", &context.name),
        ("Gruppe", &context.group),
        ("Erfahrung", &context.experience_level),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}: {}", label, v))
    })
    .collect();

    if !lines.is_empty() {
        prompt.push_str("\n\nBENUTZER-KONTEXT:\n");
        prompt.push_str(&lines.join("\n"));
    }
    prompt
}

/// Keyword-based answer used when no model is configured.
pub fn canned_reply(user_message: &str) -> String {
    let lower = user_message.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if mentions(&["spiel", "game", "aktivität"]) {
        "Ich kann dir beim Finden von Spielen helfen! Da ich momentan nicht mit Azure OpenAI verbunden bin, kann ich dir empfehlen, die Spielesuche zu verwenden, um passende Aktivitäten zu finden.".to_string()
    } else if mentions(&["plan", "heimstunde", "meeting"]) {
        "Gerne helfe ich dir bei der Planung einer Heimstunde! Nutze die Planungsfunktion, um strukturierte Vorschläge zu erhalten.".to_string()
    } else if mentions(&["pfadfinder", "scout", "gesetz"]) {
        "Als Pfadfinder-Assistent kann ich dir Informationen zur Pfadfinderbewegung geben. Für detaillierte Antworten benötige ich eine Verbindung zu Azure OpenAI.".to_string()
    } else {
        format!(
            "Du hast gesagt: '{}'. Ich bin hier, um dir bei der Pfadfinderarbeit zu helfen! Konfiguriere Azure OpenAI für erweiterte KI-Funktionen.",
            user_message
        )
    }
}

fn action(text: &str, action: &str, data: Value) -> SuggestedAction {
    SuggestedAction {
        text: text.to_string(),
        action: action.to_string(),
        data: Some(data),
    }
}

fn suggested_actions(data: Option<&Value>, user_message: &str) -> Vec<SuggestedAction> {
    let mut actions = Vec::new();

    if let Some(data) = data {
        if let Some(games) = data.get("games").and_then(Value::as_array) {
            let reference: Vec<Value> = games.iter().take(2).cloned().collect();
            actions.push(action(
                "📋 Heimstunde mit diesen Spielen planen",
                "create_plan",
                json!({ "suggested_games": games }),
            ));
            actions.push(action(
                "🔍 Ähnliche Spiele suchen",
                "search_similar",
                json!({ "reference_games": reference }),
            ));
        }
        if let Some(plan_id) = data.get("plan_id") {
            actions.push(action(
                "📄 Plan als PDF exportieren",
                "export_plan",
                json!({ "plan_id": plan_id }),
            ));
            actions.push(action(
                "✏️ Plan anpassen",
                "modify_plan",
                json!({ "plan_id": plan_id }),
            ));
        }
    }

    if actions.is_empty() {
        let lower = user_message.to_lowercase();
        if lower.contains("spiel") || lower.contains("aktivität") {
            actions.push(action("🎯 Spiele suchen", "search_games", json!({})));
        }
        actions.push(action("📅 Heimstunde planen", "plan_heimstunde", json!({})));
        actions.push(action(
            "❓ Pfadfinderfrage stellen",
            "ask_knowledge",
            json!({}),
        ));
    }

    actions.truncate(MAX_SUGGESTED_ACTIONS);
    actions
}

fn function_defs() -> Vec<FunctionDef> {
    vec![
        FunctionDef {
            name: "search_games",
            description: "Sucht nach Spielen und Aktivitäten basierend auf Kriterien wie Teilnehmeranzahl, Dauer oder Thema",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Suchbegriff für Spiele (z.B. 'Teambuilding', 'Vertrauen', 'Outdoor')" },
                    "duration_max": { "type": "integer", "description": "Maximale Dauer in Minuten" },
                    "participant_count": { "type": "integer", "description": "Anzahl der Teilnehmer" },
                    "location": { "type": "string", "enum": ["indoor", "outdoor", "both"], "description": "Wo das Spiel stattfinden soll" },
                    "age_group": { "type": "string", "description": "Altersgruppe (z.B. '10-13')" }
                },
                "required": ["query"]
            }),
        },
        FunctionDef {
            name: "create_heimstunde_plan",
            description: "Erstellt einen strukturierten Plan für eine Heimstunde",
            parameters: json!({
                "type": "object",
                "properties": {
                    "theme": { "type": "string", "description": "Thema der Heimstunde (z.B. 'Freundschaft', 'Mut', 'Teamwork')" },
                    "duration": { "type": "integer", "description": "Gesamtdauer in Minuten" },
                    "participant_count": { "type": "integer", "description": "Anzahl der Teilnehmer" },
                    "location": { "type": "string", "enum": ["indoor", "outdoor", "flexible"], "description": "Wo die Heimstunde stattfindet" },
                    "pedagogical_goals": { "type": "array", "items": { "type": "string" }, "description": "Pädagogische Ziele (z.B. 'Teambuilding', 'Kreativität', 'Kommunikation')" }
                },
                "required": ["duration", "participant_count"]
            }),
        },
        FunctionDef {
            name: "get_pfadfinder_knowledge",
            description: "Beantwortet Fragen zum Pfadfinderwissen, Gesetzen, Traditionen und pädagogischen Konzepten",
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": { "type": "string", "description": "Die Frage zum Pfadfinderwissen" },
                    "age_appropriate": { "type": "boolean", "description": "Ob die Antwort für Kinder (10-13 Jahre) aufbereitet werden soll" }
                },
                "required": ["question"]
            }),
        },
    ]
}
