use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::OpenAiClient;
use crate::error::OpenAiError;

const TRANSCRIPTION_PROMPT: &str = "Transcribe the following audio file:";

/// Output settings for text-to-speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechOptions {
    pub format: String,
    pub voice: String,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            format: "aac".to_string(),
            voice: "alloy".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Speech-to-text and text-to-speech.
#[derive(Debug, Clone)]
pub struct AudioClient {
    client: Arc<OpenAiClient>,
    transcription_model: String,
    speech_model: String,
    temperature: f32,
}

impl AudioClient {
    pub fn new(
        client: Arc<OpenAiClient>,
        transcription_model: impl Into<String>,
        speech_model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        let transcription_model = transcription_model.into();
        tracing::info!(model = %transcription_model, "audio client initialized");
        Self {
            client,
            transcription_model,
            speech_model: speech_model.into(),
            temperature,
        }
    }

    /// Transcribe an English audio file to plain text.
    pub async fn speech_to_text(&self, path: &Path) -> Result<String, OpenAiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .text("temperature", self.temperature.to_string())
            .text("prompt", TRANSCRIPTION_PROMPT)
            .text("response_format", "text")
            .text("language", "en")
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .send(self.client.post("audio/transcriptions").multipart(form))
            .await
            .inspect_err(|e| tracing::error!(path = %path.display(), error = %e, "transcription failed"))?;

        let transcript = response.text().await?;
        tracing::info!(path = %path.display(), chars = transcript.len(), "transcription complete");
        Ok(transcript)
    }

    /// Synthesize `text` and write the audio to `path`.
    pub async fn text_to_speech(
        &self,
        text: &str,
        path: &Path,
        options: &SpeechOptions,
    ) -> Result<(), OpenAiError> {
        let request = SpeechRequest {
            model: &self.speech_model,
            input: text,
            voice: &options.voice,
            response_format: &options.format,
        };

        let response = self
            .client
            .send(self.client.post("audio/speech").json(&request))
            .await
            .inspect_err(|e| tracing::error!(error = %e, "speech synthesis failed"))?;

        let audio = response.bytes().await?;
        tokio::fs::write(path, &audio).await?;

        tracing::info!(path = %path.display(), bytes = audio.len(), "speech written");
        Ok(())
    }
}
