use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::chat::print_response;
use super::openai_client;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, Role};
use crate::services::openai::youtube_summary_prompt;
use crate::services::{AudioClient, ChatSession, SpeechOptions};

#[derive(Debug, Args)]
pub struct TranscribeArgs {
    #[arg(required = true, help = "Audio file to transcribe")]
    pub file: PathBuf,

    #[arg(long, help = "Summarize the transcript as a video description")]
    pub summarize: bool,
}

#[derive(Debug, Args)]
pub struct SpeakArgs {
    #[arg(required = true, help = "Text to synthesize")]
    pub text: String,

    #[arg(long, short = 'o', help = "Output audio file")]
    pub output: PathBuf,

    #[arg(long, default_value = "alloy", help = "Voice to use")]
    pub voice: String,

    #[arg(long, default_value = "aac", help = "Audio format (aac, mp3, opus, flac, wav)")]
    pub audio_format: String,
}

fn audio_client(config: &Config) -> Result<AudioClient> {
    Ok(AudioClient::new(
        openai_client(config)?,
        &config.openai.transcription_model,
        &config.openai.speech_model,
        config.openai.temperature,
    ))
}

pub async fn handle_transcribe(
    args: TranscribeArgs,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = Config::load()?;
    let client = audio_client(&config)?;

    let transcript = client
        .speech_to_text(&args.file)
        .await
        .with_context(|| format!("failed to transcribe {}", args.file.display()))?;

    if !args.summarize {
        return print_response(&transcript, &config.openai.transcription_model, format);
    }

    if verbose {
        eprintln!("Transcript: {} chars, summarizing...", transcript.len());
    }

    let mut session = ChatSession::new(
        openai_client(&config)?,
        &config.openai.chat_model,
        config.openai.temperature,
    );
    session.add_message(Role::User, youtube_summary_prompt(&transcript));
    let summary = session.execute().await.context("summary failed")?;

    print_response(&summary, &config.openai.chat_model, format)
}

pub async fn handle_speak(args: SpeakArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let client = audio_client(&config)?;

    let options = SpeechOptions {
        format: args.audio_format,
        voice: args.voice,
    };

    client
        .text_to_speech(&args.text, &args.output, &options)
        .await
        .with_context(|| format!("failed to write speech to {}", args.output.display()))?;

    println!(
        "{}",
        formatter.format_message(&format!("Wrote audio to {}", args.output.display()))
    );
    Ok(())
}
