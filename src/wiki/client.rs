/// MediaWiki HTTP client implementation.
///
/// This module provides `WikiClient` for resolving topics to articles with
/// synchronous HTTP requests, along with the `ArticleFetcher` trait used by the
/// orchestrator and a builder for configuration.
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::disambiguation::extract_candidates;
use super::types::{Article, LookupError};

/// Default MediaWiki Action API endpoint.
pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";

const USER_AGENT: &str = concat!("medha/", env!("CARGO_PKG_VERSION"));

/// Trait for resolving a free-text query to an article.
///
/// This trait enables mocking in unit tests and lets the orchestrator stay
/// independent of the lookup transport.
pub trait ArticleFetcher: Send + Sync {
    /// Resolves `query` to an article.
    ///
    /// The returned `Article::title` is the resolved title, which may differ
    /// from the query when a spelling suggestion or redirect was applied.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Ambiguous` for disambiguation pages,
    /// `LookupError::NotFound` when nothing matches, and
    /// `LookupError::Failure` for transport or service errors.
    fn fetch(&self, query: &str) -> Result<Article, LookupError>;
}

/// Builder for constructing `WikiClient` instances.
///
/// # Examples
///
/// ```
/// use medha::wiki::WikiClientBuilder;
///
/// let client = WikiClientBuilder::new()
///     .api_url("https://de.wikipedia.org/w/api.php")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.api_url(), "https://de.wikipedia.org/w/api.php");
/// ```
#[derive(Debug, Default)]
pub struct WikiClientBuilder {
    api_url: Option<String>,
    timeout: Option<Duration>,
}

impl WikiClientBuilder {
    /// Creates a new `WikiClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Action API endpoint (e.g., "https://en.wikipedia.org/w/api.php").
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `WikiClient`.
    ///
    /// If `api_url()` was not called, the `MEDHA_WIKI_API` environment variable
    /// is checked before falling back to `DEFAULT_API_URL`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Failure` if the URL is invalid or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<WikiClient, LookupError> {
        let api_url = if let Some(url) = self.api_url {
            url
        } else {
            std::env::var("MEDHA_WIKI_API").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
        };

        reqwest::Url::parse(&api_url).map_err(|e| LookupError::Failure {
            message: format!("Invalid URL {api_url}: {e}"),
        })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(20)))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(transport_failure)?;

        Ok(WikiClient { client, api_url })
    }
}

/// Synchronous client for the MediaWiki Action API.
pub struct WikiClient {
    client: reqwest::blocking::Client,
    api_url: String,
}

impl WikiClient {
    /// Returns the Action API endpoint.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Resolves a query to a page title using search with suggestions.
    ///
    /// A spelling suggestion wins over the top search hit. Returns `None` when
    /// there is neither.
    fn resolve_title(&self, query: &str) -> Result<Option<String>, LookupError> {
        let response: SearchResponse = self.get_json(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", "1"),
            ("srinfo", "suggestion"),
            ("srprop", ""),
        ])?;

        let Some(result) = response.query else {
            return Ok(None);
        };

        let suggestion = result
            .searchinfo
            .and_then(|info| info.suggestion)
            .filter(|s| !s.is_empty());

        Ok(suggestion.or_else(|| result.search.into_iter().next().map(|hit| hit.title)))
    }

    /// Loads page properties and plain-text extract, following redirects.
    fn load_page(&self, title: &str) -> Result<Option<PageInfo>, LookupError> {
        let response: PageResponse = self.get_json(&[
            ("action", "query"),
            ("prop", "pageprops|extracts"),
            ("ppprop", "disambiguation"),
            ("explaintext", "1"),
            ("redirects", "1"),
            ("titles", title),
        ])?;

        Ok(response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|page| !page.missing && !page.invalid))
    }

    /// Fetches the candidate list of a disambiguation page.
    fn disambiguation_candidates(&self, title: &str) -> Result<Vec<String>, LookupError> {
        let response: ParseResponse = self.get_json(&[
            ("action", "parse"),
            ("page", title),
            ("prop", "text"),
        ])?;

        Ok(response
            .parse
            .map(|parsed| extract_candidates(&parsed.text))
            .unwrap_or_default())
    }

    /// Issues a GET against the Action API and decodes the JSON body.
    fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, LookupError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Failure {
                message: format!("HTTP error: status {}", status.as_u16()),
            });
        }

        let json: serde_json::Value = response.json().map_err(transport_failure)?;

        if let Some(error) = json.get("error") {
            let info = error
                .get("info")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(LookupError::Failure {
                message: format!("MediaWiki API error: {info}"),
            });
        }

        serde_json::from_value(json).map_err(|e| LookupError::Failure {
            message: format!("Unexpected API response: {e}"),
        })
    }
}

impl ArticleFetcher for WikiClient {
    fn fetch(&self, query: &str) -> Result<Article, LookupError> {
        let query = query.trim();
        let not_found = || LookupError::NotFound {
            query: query.to_string(),
        };

        if query.is_empty() {
            return Err(not_found());
        }

        let title = self.resolve_title(query)?.ok_or_else(not_found)?;
        debug!(query, resolved = %title, "resolved lookup title");

        let page = self.load_page(&title)?.ok_or_else(not_found)?;

        if page.is_disambiguation() {
            let mut candidates = self.disambiguation_candidates(&page.title)?;
            if candidates.is_empty() {
                candidates.push(page.title.clone());
            }
            debug!(title = %page.title, count = candidates.len(), "disambiguation page");
            return Err(LookupError::Ambiguous {
                title: page.title,
                candidates,
            });
        }

        Ok(Article::new(page.title, page.extract.unwrap_or_default()))
    }
}

/// Wraps a reqwest error as a lookup failure.
fn transport_failure(error: reqwest::Error) -> LookupError {
    let message = if error.is_timeout() {
        "Request timed out".to_string()
    } else {
        format!("Network error: {error}")
    };
    LookupError::Failure { message }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    searchinfo: Option<SearchInfo>,
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchInfo {
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    pageprops: Option<serde_json::Map<String, serde_json::Value>>,
    extract: Option<String>,
}

impl PageInfo {
    fn is_disambiguation(&self) -> bool {
        self.pageprops
            .as_ref()
            .is_some_and(|props| props.contains_key("disambiguation"))
    }
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    text: String,
}
