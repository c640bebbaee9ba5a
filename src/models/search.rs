//! Search-related models for queries and results.

use serde::{Deserialize, Serialize};

use super::record::Metadata;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A single similarity match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Record id
    pub id: String,

    /// Similarity score, higher is closer
    pub score: f32,

    /// Record metadata (empty when not requested)
    #[serde(default)]
    pub metadata: Metadata,
}

/// Ranked matches for one query.
///
/// Always ordered by descending score and never longer than the `top_k`
/// it was built with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub matches: Vec<QueryMatch>,
}

impl QueryResult {
    /// Sort matches by descending score and keep at most `top_k`.
    pub fn ranked(mut matches: Vec<QueryMatch>, top_k: usize) -> Self {
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Self { matches }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryMatch> {
        self.matches.iter()
    }
}

/// Search output: the query text together with its results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that was executed
    pub query: String,

    /// Index that was searched
    pub index: String,

    /// Matching results
    pub results: Vec<QueryMatch>,

    /// Query execution time in milliseconds
    pub duration_ms: u64,
}

impl SearchResults {
    pub fn new(query: String, index: String, result: QueryResult, duration_ms: u64) -> Self {
        Self {
            query,
            index,
            results: result.matches,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: &str, score: f32) -> QueryMatch {
        QueryMatch {
            id: id.to_string(),
            score,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
    }

    #[test]
    fn test_ranked_sorts_and_truncates() {
        let result = QueryResult::ranked(
            vec![m("a", 0.2), m("b", 0.9), m("c", 0.5), m("d", 0.7)],
            3,
        );
        let ids: Vec<&str> = result.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "c"]);
    }

    #[test]
    fn test_ranked_keeps_short_lists() {
        let result = QueryResult::ranked(vec![m("a", 0.1)], 10);
        assert_eq!(result.len(), 1);
        assert!(QueryResult::ranked(Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_search_results() {
        let results = SearchResults::new(
            "test".to_string(),
            "docs".to_string(),
            QueryResult::default(),
            50,
        );
        assert!(results.is_empty());
        assert_eq!(results.duration_ms, 50);
    }
}
