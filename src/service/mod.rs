//! The external AI-service boundary.
//!
//! Everything the pipeline knows about the service is in this module: four
//! operation kinds, a request/response shape, an error taxonomy and an
//! object-safe transport trait. The concrete Gemini client lives in
//! [`gemini`]; retry/backoff policy lives in [`invoker`].

pub mod gemini;
pub mod invoker;

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// The four operations the pipeline performs against the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    TextExtraction,
    Classification,
    Structuring,
    Enrichment,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextExtraction => "text_extraction",
            Self::Classification => "classification",
            Self::Structuring => "structuring",
            Self::Enrichment => "enrichment",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A base64-encoded image attachment.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub mime_type: String,
    pub data_b64: String,
}

/// Request payload: a prompt, optionally with attached images.
#[derive(Debug, Clone)]
pub enum Payload {
    Text { prompt: String },
    Vision { prompt: String, images: Vec<ImagePart> },
}

impl Payload {
    pub fn prompt(&self) -> &str {
        match self {
            Self::Text { prompt } | Self::Vision { prompt, .. } => prompt,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub operation: OperationKind,
    pub model: String,
    pub payload: Payload,
}

/// Raw service response: HTTP-like status plus the body text. On success the
/// body is the model's text output.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum CallError {
    #[error("failed to read item: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("service rate limited (429)")]
    RateLimited,

    #[error("service returned status {0}")]
    Status(u16),

    #[error("response was not valid JSON: {0}")]
    Parse(String),

    #[error("response missing expected shape: {0}")]
    Schema(String),

    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// One round trip to the AI service. Implementations map their own failure
/// modes into `CallError::Transport`; non-2xx statuses are returned in the
/// response so the invoker can decide what is retryable.
#[async_trait]
pub trait ServiceTransport: Send + Sync {
    async fn send(&self, request: &ServiceRequest) -> Result<ServiceResponse, CallError>;
}

/// Scripted transport for tests: per-operation reply queues plus a call log.
/// When a queue runs dry the call fails with a transport error so tests catch
/// unexpected extra calls.
pub struct ScriptedTransport {
    replies: Mutex<HashMap<OperationKind, VecDeque<Result<ServiceResponse, CallError>>>>,
    calls: Mutex<Vec<(OperationKind, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a 200 reply with the given body for an operation.
    pub fn reply(self, operation: OperationKind, body: &str) -> Self {
        self.push(operation, Ok(ServiceResponse { status: 200, body: body.to_string() }));
        self
    }

    /// Queue a reply with an explicit status code.
    pub fn reply_status(self, operation: OperationKind, status: u16, body: &str) -> Self {
        self.push(operation, Ok(ServiceResponse { status, body: body.to_string() }));
        self
    }

    /// Queue a transport-level failure.
    pub fn fail(self, operation: OperationKind, message: &str) -> Self {
        self.push(operation, Err(CallError::Transport(message.to_string())));
        self
    }

    fn push(&self, operation: OperationKind, reply: Result<ServiceResponse, CallError>) {
        self.replies
            .lock()
            .expect("scripted transport mutex poisoned")
            .entry(operation)
            .or_default()
            .push_back(reply);
    }

    /// Operations invoked so far, in call order.
    pub fn calls(&self) -> Vec<OperationKind> {
        self.calls
            .lock()
            .expect("scripted transport mutex poisoned")
            .iter()
            .map(|(op, _)| *op)
            .collect()
    }

    /// Prompts sent for one operation, in call order.
    pub fn prompts_for(&self, operation: OperationKind) -> Vec<String> {
        self.calls
            .lock()
            .expect("scripted transport mutex poisoned")
            .iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceTransport for ScriptedTransport {
    async fn send(&self, request: &ServiceRequest) -> Result<ServiceResponse, CallError> {
        self.calls
            .lock()
            .expect("scripted transport mutex poisoned")
            .push((request.operation, request.payload.prompt().to_string()));

        let next = self
            .replies
            .lock()
            .expect("scripted transport mutex poisoned")
            .get_mut(&request.operation)
            .and_then(|queue| queue.pop_front());

        next.unwrap_or_else(|| {
            Err(CallError::Transport(format!(
                "no scripted reply for {}",
                request.operation
            )))
        })
    }
}
