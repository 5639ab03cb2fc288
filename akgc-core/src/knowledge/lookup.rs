//! Remote knowledge lookup: the collaborator consulted on curated-table misses.
//!
//! The bundled backend resolves an entity to a Wikipedia page through the
//! search API and reads the page summary. Every attempt runs under a
//! timeout and transient failures are retried a bounded number of times.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::config::{KnowledgeConfig, RetryConfig};
use crate::error::LookupError;
use crate::text::truncate_chars;

const USER_AGENT: &str = concat!(
    "akgc/",
    env!("CARGO_PKG_VERSION"),
    " (knowledge-guided correction; fact lookup)"
);

/// Resolves an entity to fact strings from an external source.
#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    async fn lookup(&self, entity: &str) -> Result<Vec<String>, LookupError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Run `operation` up to `config.max_attempts` times.
///
/// Each attempt is bounded by `timeout`; an elapsed attempt counts as a
/// `LookupError::Timeout`. Non-retryable errors return immediately.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    timeout: Duration,
    operation: F,
) -> Result<T, LookupError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LookupError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = match tokio::time::timeout(timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        };
        match result {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() || attempt >= max_attempts => return Err(e),
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max = max_attempts,
                    backoff_ms = config.backoff_ms,
                    error = %e,
                    "Retrying knowledge lookup after transient error"
                );
                tokio::time::sleep(Duration::from_millis(config.backoff_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// Wikipedia-backed lookup: search for the best title, then read its summary.
pub struct WikipediaLookup {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_summary_chars: usize,
    retry: RetryConfig,
}

impl WikipediaLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::from_config(&KnowledgeConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    pub fn from_config(config: &KnowledgeConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_summary_chars: config.max_summary_chars,
            retry: config.retry.clone(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_once(&self, entity: &str) -> Result<Vec<String>, LookupError> {
        let search_url = format!(
            "{}/w/api.php?action=query&list=search&format=json&srlimit=1&srsearch={}",
            self.base_url,
            urlencoding::encode(entity)
        );
        tracing::debug!(url = %search_url, "Searching knowledge source");
        let search = self.get_json(&search_url).await?;
        let title = parse_search_title(&search).ok_or_else(|| LookupError::NotFound {
            entity: entity.to_string(),
        })?;

        let summary_url = format!("{}{}", self.base_url, summary_path(&title));
        tracing::debug!(url = %summary_url, title = %title, "Fetching page summary");
        let summary = self.get_json(&summary_url).await?;
        let facts = summary_facts(&summary, self.max_summary_chars);
        if facts.is_empty() {
            return Err(LookupError::NotFound {
                entity: entity.to_string(),
            });
        }
        Ok(facts)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, LookupError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| LookupError::InvalidResponse {
                message: format!("Failed to parse response: {e}"),
            })
    }
}

#[async_trait]
impl KnowledgeLookup for WikipediaLookup {
    async fn lookup(&self, entity: &str) -> Result<Vec<String>, LookupError> {
        with_retry(&self.retry, self.timeout, || self.fetch_once(entity)).await
    }

    fn name(&self) -> &str {
        "wikipedia"
    }
}

fn classify_request_error(e: reqwest::Error, timeout: Duration) -> LookupError {
    if e.is_timeout() {
        LookupError::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else {
        LookupError::Connection {
            message: e.to_string(),
        }
    }
}

/// Title of the top search hit, if any.
pub fn parse_search_title(json: &serde_json::Value) -> Option<String> {
    json["query"]["search"][0]["title"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Summary endpoint path for a page title: spaces become underscores.
pub fn summary_path(title: &str) -> String {
    format!(
        "/api/rest_v1/page/summary/{}",
        urlencoding::encode(&title.replace(' ', "_"))
    )
}

/// Facts carried by a summary document: the truncated extract and the
/// one-line description.
pub fn summary_facts(json: &serde_json::Value, max_chars: usize) -> Vec<String> {
    let mut facts = Vec::new();
    if let Some(extract) = json["extract"].as_str().map(str::trim)
        && !extract.is_empty()
    {
        facts.push(truncate_chars(extract, max_chars));
    }
    if let Some(description) = json["description"].as_str().map(str::trim)
        && !description.is_empty()
    {
        facts.push(format!("Description: {description}"));
    }
    facts
}
