use std::fmt::Write as FmtWrite;

use crate::models::{MetadataValue, OutputFormat, QueryMatch, SearchResults};

const PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_upsert_stats(&self, stats: &UpsertStats) -> String;
    fn format_index_list(&self, indexes: &[String], configured: &str) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub vector_index_driver: String,
    pub vector_index_url: String,
    pub vector_index_connected: bool,
    pub index_name: String,
    pub index_exists: bool,
    pub openai_configured: bool,
    pub chat_model: String,
    pub embedding_model: String,
    pub mongo_configured: bool,
    pub mongo_connected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpsertStats {
    pub index: String,
    pub records: u64,
    pub batches: u64,
    pub index_created: bool,
    pub duration_ms: u64,
}

/// Text of a match for previews: the `text` metadata field when present.
fn match_text(m: &QueryMatch) -> Option<&str> {
    m.metadata.get("text").and_then(MetadataValue::as_str)
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", head)
    } else {
        head
    }
}

fn connected_label(connected: bool) -> &'static str {
    if connected { "[CONNECTED]" } else { "[DISCONNECTED]" }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in {} ({}ms)\n",
            results.len(),
            results.index,
            results.duration_ms
        )
        .unwrap();

        for (i, result) in results.results.iter().enumerate() {
            writeln!(output, "{}. [Score: {:.3}] {}", i + 1, result.score, result.id).unwrap();
            for (key, value) in result.metadata.iter().filter(|(k, _)| *k != "text") {
                writeln!(output, "   {}: {}", key, value).unwrap();
            }
            if let Some(text) = match_text(result) {
                writeln!(output, "   ---").unwrap();
                for line in preview(text).lines() {
                    writeln!(output, "   {}", line).unwrap();
                }
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        writeln!(
            output,
            "Vector Index:  {} {}",
            status.vector_index_driver,
            connected_label(status.vector_index_connected)
        )
        .unwrap();
        writeln!(output, "  URL:         {}", status.vector_index_url).unwrap();
        let exists = if status.index_exists { "ready" } else { "missing" };
        writeln!(output, "  Index:       {} ({})", status.index_name, exists).unwrap();
        writeln!(output).unwrap();

        let openai = if status.openai_configured {
            "[CONFIGURED]"
        } else {
            "[NO API KEY]"
        };
        writeln!(output, "OpenAI:        {}", openai).unwrap();
        writeln!(output, "  Chat:        {}", status.chat_model).unwrap();
        writeln!(output, "  Embedding:   {}", status.embedding_model).unwrap();
        writeln!(output).unwrap();

        if status.mongo_configured {
            writeln!(
                output,
                "MongoDB:       {}",
                connected_label(status.mongo_connected)
            )
            .unwrap();
        } else {
            writeln!(output, "MongoDB:       [NOT CONFIGURED]").unwrap();
        }

        output
    }

    fn format_upsert_stats(&self, stats: &UpsertStats) -> String {
        let mut output = String::new();
        writeln!(output, "Upsert Complete").unwrap();
        writeln!(output, "---------------").unwrap();
        writeln!(output, "Index: {}", stats.index).unwrap();
        if stats.index_created {
            writeln!(output, "Index created: yes").unwrap();
        }
        writeln!(output, "Records: {}", stats.records).unwrap();
        writeln!(output, "Batches: {}", stats.batches).unwrap();
        writeln!(output, "Duration: {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_index_list(&self, indexes: &[String], configured: &str) -> String {
        if indexes.is_empty() {
            return "No indexes found.\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "Indexes").unwrap();
        writeln!(output, "-------").unwrap();
        for name in indexes {
            let marker = if name == configured { "*" } else { " " };
            writeln!(output, "{} {}", marker, name).unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        } else {
            value.to_string()
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        match serde_json::to_value(results) {
            Ok(value) => self.render(&value),
            Err(e) => format!("{{\"error\": \"{}\"}}", e),
        }
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "vector_index": {
                "driver": status.vector_index_driver,
                "url": status.vector_index_url,
                "connected": status.vector_index_connected,
                "index": status.index_name,
                "index_exists": status.index_exists,
            },
            "openai": {
                "configured": status.openai_configured,
                "chat_model": status.chat_model,
                "embedding_model": status.embedding_model,
            },
            "mongo": {
                "configured": status.mongo_configured,
                "connected": status.mongo_connected,
            }
        });
        self.render(&json)
    }

    fn format_upsert_stats(&self, stats: &UpsertStats) -> String {
        let json = serde_json::json!({
            "index": stats.index,
            "records": stats.records,
            "batches": stats.batches,
            "index_created": stats.index_created,
            "duration_ms": stats.duration_ms,
        });
        self.render(&json)
    }

    fn format_index_list(&self, indexes: &[String], configured: &str) -> String {
        let json = serde_json::json!({
            "indexes": indexes,
            "configured": configured,
        });
        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Query:** `{}`\n", results.query).unwrap();
        writeln!(
            output,
            "Found {} results in `{}` ({}ms)\n",
            results.len(),
            results.index,
            results.duration_ms
        )
        .unwrap();

        for (i, result) in results.results.iter().enumerate() {
            writeln!(output, "### {}. Score: {:.3}\n", i + 1, result.score).unwrap();
            writeln!(output, "**Id:** `{}`\n", result.id).unwrap();
            for (key, value) in result.metadata.iter().filter(|(k, _)| *k != "text") {
                writeln!(output, "- **{}:** {}", key, value).unwrap();
            }
            if let Some(text) = match_text(result) {
                writeln!(output, "\n```").unwrap();
                writeln!(output, "{}", text).unwrap();
                writeln!(output, "```").unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let check = |ok: bool| if ok { "✅" } else { "❌" };
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        writeln!(
            output,
            "### Vector Index ({}) {}\n",
            status.vector_index_driver,
            check(status.vector_index_connected)
        )
        .unwrap();
        writeln!(output, "- **URL:** `{}`", status.vector_index_url).unwrap();
        writeln!(
            output,
            "- **Index:** {} {}",
            status.index_name,
            check(status.index_exists)
        )
        .unwrap();
        writeln!(output).unwrap();

        writeln!(output, "### OpenAI {}\n", check(status.openai_configured)).unwrap();
        writeln!(output, "- **Chat:** {}", status.chat_model).unwrap();
        writeln!(output, "- **Embedding:** {}", status.embedding_model).unwrap();
        writeln!(output).unwrap();

        writeln!(
            output,
            "### MongoDB {}",
            check(status.mongo_configured && status.mongo_connected)
        )
        .unwrap();

        output
    }

    fn format_upsert_stats(&self, stats: &UpsertStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Upsert Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Index | `{}` |", stats.index).unwrap();
        writeln!(output, "| Index created | {} |", stats.index_created).unwrap();
        writeln!(output, "| Records | {} |", stats.records).unwrap();
        writeln!(output, "| Batches | {} |", stats.batches).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();
        output
    }

    fn format_index_list(&self, indexes: &[String], configured: &str) -> String {
        if indexes.is_empty() {
            return "## Indexes\n\n*No indexes found.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Indexes\n").unwrap();
        for name in indexes {
            if name == configured {
                writeln!(output, "- `{}` (configured)", name).unwrap();
            } else {
                writeln!(output, "- `{}`", name).unwrap();
            }
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
