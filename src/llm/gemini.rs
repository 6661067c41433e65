//! Google Gemini streaming provider

use super::types::{HistoryTurn, MessageRole, TextStream};
use super::{ChatProvider, LlmError, ProviderSession};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Gemini provider; sessions share one HTTP client
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn create_session(
        &self,
        model: &str,
        history: Vec<HistoryTurn>,
        system_instruction: &str,
    ) -> Result<Box<dyn ProviderSession>, LlmError> {
        if model.trim().is_empty() {
            return Err(LlmError::invalid_request("No model configured"));
        }

        let system_instruction = (!system_instruction.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![GeminiPart::text(system_instruction)],
        });

        Ok(Box::new(GeminiSession {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            url: self.stream_url(model),
            system_instruction,
            history: Arc::new(Mutex::new(translate_history(history))),
        }))
    }
}

fn translate_history(history: Vec<HistoryTurn>) -> Vec<GeminiContent> {
    history
        .into_iter()
        .map(|turn| GeminiContent::turn(turn.role, turn.text))
        .collect()
}

/// A Gemini chat; accumulates history across completed exchanges
struct GeminiSession {
    client: Client,
    api_key: String,
    url: String,
    system_instruction: Option<GeminiContent>,
    history: Arc<Mutex<Vec<GeminiContent>>>,
}

impl GeminiSession {
    fn build_request(&self, text: &str) -> GeminiRequest {
        let mut contents = self
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        contents.push(GeminiContent::turn(MessageRole::User, text.to_string()));

        GeminiRequest {
            contents,
            system_instruction: self.system_instruction.clone(),
        }
    }
}

#[async_trait]
impl ProviderSession for GeminiSession {
    async fn send_stream(&mut self, text: &str) -> Result<TextStream, LlmError> {
        let request = self.build_request(text);

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map_or(body, |resp| resp.error.message);
            return Err(LlmError::from_status(status.as_u16(), &message));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| LlmError::network(format!("Stream interrupted: {e}")))
            })
            .boxed();

        Ok(delta_stream(
            body,
            PendingExchange {
                history: Arc::clone(&self.history),
                user_text: text.to_string(),
            },
        ))
    }
}

/// Recorded into the session history only once the reply streamed in full
struct PendingExchange {
    history: Arc<Mutex<Vec<GeminiContent>>>,
    user_text: String,
}

impl PendingExchange {
    fn commit(self, reply: String) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(GeminiContent::turn(MessageRole::User, self.user_text));
        history.push(GeminiContent::turn(MessageRole::Model, reply));
    }
}

struct DeltaState {
    body: BoxStream<'static, Result<Vec<u8>, LlmError>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    reply: String,
    exchange: Option<PendingExchange>,
    body_done: bool,
    failed: bool,
}

/// Turn a raw SSE byte stream into text deltas, preserving arrival order
fn delta_stream(
    body: BoxStream<'static, Result<Vec<u8>, LlmError>>,
    exchange: PendingExchange,
) -> TextStream {
    let state = DeltaState {
        body,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        reply: String::new(),
        exchange: Some(exchange),
        body_done: false,
        failed: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if st.failed {
                return None;
            }
            if let Some(delta) = st.pending.pop_front() {
                st.reply.push_str(&delta);
                return Some((Ok(delta), st));
            }
            if st.body_done {
                if let Some(exchange) = st.exchange.take() {
                    exchange.commit(std::mem::take(&mut st.reply));
                }
                return None;
            }

            let payloads = match st.body.next().await {
                Some(Ok(bytes)) => st.decoder.push(&bytes),
                Some(Err(e)) => {
                    st.failed = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.body_done = true;
                    st.decoder.finish().into_iter().collect()
                }
            };

            for payload in payloads {
                match parse_chunk(&payload) {
                    Ok(text) if !text.is_empty() => st.pending.push_back(text),
                    Ok(_) => {}
                    Err(e) => {
                        st.failed = true;
                        st.pending.clear();
                        return Some((Err(e), st));
                    }
                }
            }
        }
    })
    .boxed()
}

/// Line-oriented decoder for `text/event-stream` bodies.
///
/// Byte chunks may split lines anywhere; only complete lines are decoded.
/// Splitting on `\n` before UTF-8 decoding keeps multi-byte characters whole.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed bytes, returning the `data:` payloads of every completed line
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Decode a trailing line that was not newline-terminated
    fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    (!payload.is_empty()).then(|| payload.to_string())
}

/// Extract the text delta from one streamed `GenerateContentResponse`
fn parse_chunk(payload: &str) -> Result<String, LlmError> {
    let chunk: GeminiStreamChunk = serde_json::from_str(payload)
        .map_err(|e| LlmError::unknown(format!("Failed to parse stream chunk: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(LlmError::from_status(
            error.code.and_then(|c| u16::try_from(c).ok()).unwrap_or(0),
            &error.message,
        ));
    }

    Ok(chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn turn(role: MessageRole, text: String) -> Self {
        Self {
            role: Some(role.as_str().to_string()),
            parts: vec![GeminiPart { text: Some(text) }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}
