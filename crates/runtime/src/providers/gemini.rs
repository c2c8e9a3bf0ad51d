//! Google Gemini API backend.

use crate::model::{
    FinishReason, Message, ModelClient, ModelError, ModelRequest, ModelResponse, Part, Role,
    ToolCall, ToolOutcome, ToolSpec, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-pro";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiToolGroup>,
}

#[derive(Debug, Serialize)]
struct ApiInstruction {
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize)]
struct ApiContent {
    role: &'static str,
    parts: Vec<ApiPart>,
}

/// One content part. Gemini parts are objects carrying exactly one of
/// these fields.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<ApiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct ApiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiToolGroup {
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    usage_metadata: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    content: Option<ApiCandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidateContent {
    #[serde(default)]
    parts: Vec<ApiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponsePart {
    text: Option<String>,
    function_call: Option<ApiFunctionCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiClientBuilder {
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClientBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    /// Override the API base URL (used by tests).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> Result<GeminiClient, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::MissingCredentials(
                "Gemini API key is empty".into(),
            ));
        }
        Ok(GeminiClient {
            http: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            base_url: self.base_url,
        })
    }
}

/// Google Gemini `generateContent` client.
#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> GeminiClientBuilder {
        GeminiClientBuilder::new(api_key, model)
    }

    /// Create a client from `GOOGLE_API_KEY` or `GEMINI_API_KEY`.
    ///
    /// A missing key is detected here, at startup, so no generation
    /// request ever attempts a call without credentials.
    pub fn from_env() -> Result<Self, ModelError> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| {
                ModelError::MissingCredentials(
                    "GOOGLE_API_KEY or GEMINI_API_KEY must be set".into(),
                )
            })?;
        Self::builder(api_key, DEFAULT_MODEL).build()
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::Assistant => "model",
            // System text travels via systemInstruction; tool results
            // are carried as user-role functionResponse parts.
            Role::User | Role::System | Role::Tool => "user",
        }
    }

    fn part_to_api(part: &Part) -> ApiPart {
        match part {
            Part::Text { text } => ApiPart {
                text: Some(text.clone()),
                ..ApiPart::default()
            },
            Part::ToolCall(call) => ApiPart {
                function_call: Some(ApiFunctionCall {
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                }),
                ..ApiPart::default()
            },
            Part::ToolResult(result) => {
                let response = match &result.outcome {
                    ToolOutcome::Success { output } => output.clone(),
                    ToolOutcome::Failure { error } => json!({ "error": error.to_string() }),
                };
                ApiPart {
                    function_response: Some(ApiFunctionResponse {
                        name: result.tool_name.clone(),
                        response,
                    }),
                    ..ApiPart::default()
                }
            }
        }
    }

    fn message_to_api(msg: &Message) -> ApiContent {
        ApiContent {
            role: Self::role_to_api(msg.role),
            parts: msg.parts.iter().map(Self::part_to_api).collect(),
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiFunctionDeclaration {
        ApiFunctionDeclaration {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.input_schema.clone(),
        }
    }

    /// Collect the system instruction from the request-level prompt
    /// plus any system-role messages, in order.
    fn build_instruction(request: &ModelRequest<'_>) -> Option<ApiInstruction> {
        let mut parts: Vec<ApiPart> = Vec::new();
        if let Some(system) = request.system {
            parts.push(ApiPart {
                text: Some(system.to_string()),
                ..ApiPart::default()
            });
        }
        for msg in request.messages.iter().filter(|m| m.role == Role::System) {
            parts.push(ApiPart {
                text: Some(msg.text()),
                ..ApiPart::default()
            });
        }
        if parts.is_empty() { None } else { Some(ApiInstruction { parts }) }
    }

    /// Decode a candidate into an assistant message. The wire protocol
    /// carries no call ids, so one is minted per function call; it is
    /// unique within the round and propagates unchanged to the
    /// corresponding result.
    fn candidate_to_message(parts: Vec<ApiResponsePart>) -> Message {
        let parts: Vec<Part> = parts
            .into_iter()
            .filter_map(|part| {
                if let Some(call) = part.function_call {
                    Some(Part::ToolCall(ToolCall {
                        id: Uuid::new_v4().to_string(),
                        name: call.name,
                        arguments: call.args,
                    }))
                } else {
                    part.text.map(Part::text)
                }
            })
            .collect();

        Message {
            role: Role::Assistant,
            parts,
        }
    }

    fn map_finish_reason(reason: Option<&str>, has_tool_calls: bool) -> FinishReason {
        if has_tool_calls {
            return FinishReason::ToolCalls;
        }
        match reason {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some(_) => FinishReason::Error,
        }
    }
}

impl ModelClient for GeminiClient {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let contents: Vec<ApiContent> = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(Self::message_to_api)
            .collect();

        let function_declarations: Vec<ApiFunctionDeclaration> =
            request.tools.iter().map(Self::tool_to_api).collect();
        let tools = if function_declarations.is_empty() {
            Vec::new()
        } else {
            vec![ApiToolGroup {
                function_declarations,
            }]
        };

        let api_request = ApiRequest {
            contents,
            system_instruction: Self::build_instruction(&request),
            tools,
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("no candidates in response".into()))?;

        let message = Self::candidate_to_message(
            candidate.content.map(|c| c.parts).unwrap_or_default(),
        );
        let finish_reason = Self::map_finish_reason(
            candidate.finish_reason.as_deref(),
            !message.tool_calls().is_empty(),
        );
        let usage = api_response
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            message,
            finish_reason,
            usage,
        })
    }
}

impl std::fmt::Display for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.model)
    }
}
