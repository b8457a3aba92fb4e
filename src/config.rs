//! Pipeline configuration.
//!
//! All settings travel in an explicit [`PipelineConfig`] threaded through
//! [`crate::pipeline::run`] rather than being read from ambient state, so the
//! pipeline stays testable in isolation. [`PipelineConfig::from_env`] is the
//! one place that touches the environment; the binary calls
//! `dotenvy::dotenv()` before it so a `.env` file works too.

use std::env;
use std::path::PathBuf;

use crate::semantic_chunking::config::ChunkingConfig;
use crate::types::IngestError;

/// Default cap on simultaneously running extraction tasks.
pub const DEFAULT_MAX_CONCURRENCY: usize = 50;

/// Default file pattern: every PDF below the source root.
pub const DEFAULT_GLOB: &str = "**/*.pdf";

const DEFAULT_SOURCE_DIR: &str = "./source_docs";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Settings consumed by one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory walked for source documents.
    pub source_dir: PathBuf,
    /// File pattern matched during the walk (`**/*.pdf` style).
    pub glob: String,
    /// Upper bound on concurrently running extraction tasks.
    pub max_concurrency: usize,
    /// Emit per-file progress events while extracting.
    pub show_progress: bool,
    /// Remote embedding model identifier.
    pub embedding_model: String,
    /// Destination collection name, fully replaced on each run.
    pub collection: String,
    /// Postgres connection string.
    pub database_url: String,
    /// Bearer token for the embedding service.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible embedding endpoint.
    pub api_base_url: String,
    /// Semantic chunking knobs.
    pub chunking: ChunkingConfig,
}

impl PipelineConfig {
    /// Builds a configuration from environment variables.
    ///
    /// Required: `EMBEDDING_MODEL`, `PG_COLLECTION_NAME`, `DATABASE_URL`,
    /// `OPENAI_API_KEY`. Optional with defaults: `SOURCE_DIR`, `SOURCE_GLOB`,
    /// `MAX_CONCURRENCY`, `SHOW_PROGRESS`, `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, IngestError> {
        let max_concurrency = match env::var("MAX_CONCURRENCY") {
            Ok(raw) => raw.parse::<usize>().map_err(|err| {
                IngestError::Config(format!("MAX_CONCURRENCY '{raw}' is not a number: {err}"))
            })?,
            Err(_) => DEFAULT_MAX_CONCURRENCY,
        };
        let show_progress = match env::var("SHOW_PROGRESS") {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| {
                IngestError::Config(format!("SHOW_PROGRESS '{raw}' is not a boolean"))
            })?,
            Err(_) => true,
        };

        Ok(Self {
            source_dir: PathBuf::from(var_or("SOURCE_DIR", DEFAULT_SOURCE_DIR)),
            glob: var_or("SOURCE_GLOB", DEFAULT_GLOB),
            max_concurrency,
            show_progress,
            embedding_model: required_var("EMBEDDING_MODEL")?,
            collection: required_var("PG_COLLECTION_NAME")?,
            database_url: required_var("DATABASE_URL")?,
            api_key: required_var("OPENAI_API_KEY")?,
            api_base_url: var_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            chunking: ChunkingConfig::default(),
        })
    }
}

fn required_var(key: &str) -> Result<String, IngestError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(IngestError::Config(format!(
            "missing required environment variable {key}"
        ))),
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_var_is_reported_by_name() {
        let err = required_var("CHUNKSMITH_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("CHUNKSMITH_TEST_UNSET_VARIABLE"));
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn var_or_falls_back_to_default() {
        assert_eq!(
            var_or("CHUNKSMITH_TEST_UNSET_VARIABLE", "fallback"),
            "fallback"
        );
    }
}
