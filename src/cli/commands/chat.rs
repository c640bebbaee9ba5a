use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;

use super::openai_client;
use crate::models::{Config, OutputFormat, Role};
use crate::services::ChatSession;

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[arg(required = true, help = "User prompt")]
    pub prompt: String,

    #[arg(long, short = 's', help = "System prompt to send first")]
    pub system: Option<String>,

    #[arg(long, help = "Print the reply as it is generated")]
    pub stream: bool,
}

pub async fn handle_chat(args: ChatArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let mut session = ChatSession::new(
        openai_client(&config)?,
        &config.openai.chat_model,
        config.openai.temperature,
    );

    if let Some(system) = args.system {
        session.add_message(Role::System, system);
    }
    session.add_message(Role::User, args.prompt);

    if verbose {
        eprintln!("Model: {}", config.openai.chat_model);
    }

    // JSON and Markdown output need the whole reply.
    if args.stream && format == OutputFormat::Text {
        let mut stdout = std::io::stdout();
        session
            .execute_stream(|delta| {
                let _ = write!(stdout, "{delta}");
                let _ = stdout.flush();
            })
            .await
            .context("chat stream failed")?;
        println!();
        return Ok(());
    }

    let response = session.execute().await.context("chat completion failed")?;
    print_response(&response, &config.openai.chat_model, format)
}

pub(crate) fn print_response(response: &str, model: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "model": model,
                "response": response,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Markdown => println!("{response}"),
        OutputFormat::Text => print!("{}", ChatSession::display(response)),
    }
    Ok(())
}
