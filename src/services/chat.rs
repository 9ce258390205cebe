use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Number of earlier turns forwarded with each message.
pub const MAX_HISTORY_TURNS: usize = 5;
/// Longest single turn, in characters, that is copied into the prompt.
pub const MAX_TURN_CHARS: usize = 2000;

const PREAMBLE: &str = "You are a helpful assistant inside a personal project and task \
tracker. Answer concisely and help the user plan, prioritise and complete their work.";

/// Something that turns a prompt into a reply. The production implementation calls
/// an external service; tests plug in a canned one.
#[async_trait]
pub trait ChatGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Builds the prompt from the most recent `MAX_HISTORY_TURNS` turns plus the new
/// message, each clipped to `MAX_TURN_CHARS`.
pub fn build_prompt(message: &str, history: &[ChatTurn]) -> String {
    let recent = &history[history.len().saturating_sub(MAX_HISTORY_TURNS)..];

    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\n");
    for turn in recent {
        let speaker = match turn.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(truncate(turn.content.trim(), MAX_TURN_CHARS));
        prompt.push('\n');
    }
    prompt.push_str("User: ");
    prompt.push_str(truncate(message.trim(), MAX_TURN_CHARS));
    prompt.push_str("\nAssistant:");
    prompt
}

/// Sends `message` with its recent history to `generator`.
///
/// `None` means no credential was configured, which is reported as
/// `ServiceUnavailable` without contacting anything.
pub async fn send(
    generator: Option<&dyn ChatGenerator>,
    message: &str,
    history: &[ChatTurn],
) -> Result<String, AppError> {
    let generator = generator.ok_or_else(|| {
        AppError::ServiceUnavailable("AI service is not configured".into())
    })?;

    let prompt = build_prompt(message, history);
    generator.generate(&prompt).await.map_err(|e| {
        log::warn!("AI chat request failed: {}", e);
        match e {
            AppError::UpstreamError(_) | AppError::ServiceUnavailable(_) => e,
            other => AppError::UpstreamError(other.detail()),
        }
    })
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionReply,
}

#[derive(Deserialize)]
struct CompletionReply {
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ChatGenerator for OpenAiChat {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![CompletionMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamError(format!(
                "AI service responded with {}",
                status
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::UpstreamError("AI service returned an empty reply".into()))
    }
}
