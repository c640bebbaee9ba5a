//! Chat completions, buffered and streamed.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::OpenAiClient;
use crate::error::OpenAiError;
use crate::models::{ChatMessage, Role};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// One parsed line of a server-sent event stream.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A piece of assistant text.
    Delta(String),
    /// The stream is over.
    Done,
    /// Blank lines, comments, and non-data fields.
    Skip,
}

/// Parse one SSE line from a streamed chat completion.
///
/// A chunk without content (the final chunk carrying only a finish reason)
/// ends the stream, as does the `[DONE]` sentinel.
pub fn parse_stream_line(line: &str) -> Result<StreamEvent, OpenAiError> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(StreamEvent::Skip);
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let chunk: StreamChunk =
        serde_json::from_str(data).map_err(|e| OpenAiError::InvalidResponse(e.to_string()))?;

    match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(content) => Ok(StreamEvent::Delta(content)),
        None => Ok(StreamEvent::Done),
    }
}

/// A running conversation with a chat model.
pub struct ChatSession {
    client: Arc<OpenAiClient>,
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>, temperature: f32) -> Self {
        let model = model.into();
        tracing::info!(model = %model, "chat session initialized");
        Self {
            client,
            model,
            temperature,
            messages: Vec::new(),
        }
    }

    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send the conversation and return the first choice's content.
    ///
    /// The reply is not appended to the conversation.
    pub async fn execute(&self) -> Result<String, OpenAiError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: &self.messages,
            temperature: self.temperature,
            stream: false,
        };

        let response = self
            .client
            .send(self.client.post("chat/completions").json(&request))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "chat completion failed"))?;

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::InvalidResponse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OpenAiError::InvalidResponse("no choices in response".to_string()))?;

        tracing::info!("chat response received");
        Ok(content)
    }

    /// Stream the reply, calling `on_delta` with each piece as it arrives.
    ///
    /// The full reply is appended to the conversation as an assistant
    /// message and returned.
    pub async fn execute_stream<F>(&mut self, mut on_delta: F) -> Result<String, OpenAiError>
    where
        F: FnMut(&str),
    {
        let request = CompletionRequest {
            model: &self.model,
            messages: &self.messages,
            temperature: self.temperature,
            stream: true,
        };

        let response = self
            .client
            .send(self.client.post("chat/completions").json(&request))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "chat stream failed"))?;

        let mut full_text = String::new();
        // Raw bytes: a network chunk may end inside a multi-byte character.
        let mut pending: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();

        'outer: while let Some(chunk) = stream.next().await {
            pending.extend_from_slice(&chunk?);

            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                let line = std::str::from_utf8(&line)
                    .map_err(|e| OpenAiError::InvalidResponse(format!("stream line: {e}")))?;
                match parse_stream_line(line)? {
                    StreamEvent::Delta(content) => {
                        on_delta(&content);
                        full_text.push_str(&content);
                    }
                    StreamEvent::Done => break 'outer,
                    StreamEvent::Skip => {}
                }
            }
        }

        tracing::info!("chat stream completed");
        self.add_message(Role::Assistant, full_text.clone());
        Ok(full_text)
    }

    /// Frame a response between rules for the terminal.
    pub fn display(response: &str) -> String {
        let rule = "-".repeat(67);
        format!("{rule}\n{response}\n{rule}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::openai::test_client;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_parse_stream_line() {
        assert_eq!(parse_stream_line("").unwrap(), StreamEvent::Skip);
        assert_eq!(parse_stream_line(": keep-alive").unwrap(), StreamEvent::Skip);
        assert_eq!(parse_stream_line("data: [DONE]").unwrap(), StreamEvent::Done);
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#).unwrap(),
            StreamEvent::Delta("Hel".to_string())
        );
        assert_eq!(
            parse_stream_line(r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#)
                .unwrap(),
            StreamEvent::Done
        );
        assert!(parse_stream_line("data: {not json").is_err());
    }

    #[tokio::test]
    async fn test_execute_returns_first_choice() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.0
            })))
            .with_status(200)
            .with_body(
                json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let mut session = ChatSession::new(test_client(&server.url()), "gpt-4o-mini", 0.0);
        session.add_message(Role::System, "be brief");
        session.add_message(Role::User, "hi");

        assert_eq!(session.execute().await.unwrap(), "hello");
        assert_eq!(session.messages().len(), 2);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_execute_stream_collects_deltas() {
        let mut server = Server::new_async().await;
        let body = [
            r#"data: {"choices":[{"delta":{"role":"assistant","content":""}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
            r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
            "data: [DONE]",
            "",
        ]
        .join("\n\n");
        let _m = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let mut session = ChatSession::new(test_client(&server.url()), "gpt-4o-mini", 0.0);
        session.add_message(Role::User, "hi");

        let mut pieces = Vec::new();
        let text = session
            .execute_stream(|d| pieces.push(d.to_string()))
            .await
            .unwrap();

        assert_eq!(text, "Hello");
        assert_eq!(pieces, vec!["", "Hel", "lo"]);
        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "Hello");
    }

    #[tokio::test]
    async fn test_execute_stream_keeps_split_multibyte_text() {
        let mut server = Server::new_async().await;
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"h\u{e9}llo\"}}]}\n\ndata: [DONE]\n\n";
        let bytes = body.as_bytes().to_vec();
        // Cut right after the first byte of the two-byte 'é'.
        let split = body.find('\u{e9}').unwrap() + 1;

        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_chunked_body(move |w| {
                w.write_all(&bytes[..split])?;
                w.flush()?;
                std::thread::sleep(Duration::from_millis(200));
                w.write_all(&bytes[split..])
            })
            .create_async()
            .await;

        let mut session = ChatSession::new(test_client(&server.url()), "gpt-4o-mini", 0.0);
        session.add_message(Role::User, "hi");

        let mut pieces = Vec::new();
        let text = session
            .execute_stream(|d| pieces.push(d.to_string()))
            .await
            .unwrap();

        assert_eq!(text, "h\u{e9}llo");
        assert_eq!(pieces.concat(), "h\u{e9}llo");
    }

    #[test]
    fn test_display_frames_response() {
        let framed = ChatSession::display("hi");
        assert!(framed.starts_with(&"-".repeat(67)));
        assert!(framed.contains("\nhi\n"));
    }
}
