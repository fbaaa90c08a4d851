//! GitHub REST API client
//!
//! Read-only access to the repository-hosting API: repository metadata,
//! readme, file contents, tree and language listings. Used by the
//! remote-fetch strategy as the slow tier behind page-snapshot extraction.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout for single-object fetches
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for recursive tree listings (can return large result sets)
const TREE_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub API client
pub struct GitHubClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

/// Repository metadata (REST API format)
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// One node of a repository tree listing
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct RepoTree {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("GitHub API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("GitHub authentication failed")]
    Auth,
    #[error("GitHub rate limit exceeded")]
    RateLimited,
    #[error("Payload decode error: {0}")]
    Decode(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<GitHubError> for crate::GitGlossError {
    fn from(e: GitHubError) -> Self {
        match e {
            GitHubError::Api { status, body } => crate::GitGlossError::Upstream { status, body },
            GitHubError::Network(e) => crate::GitGlossError::Http(e),
            other => crate::GitGlossError::Other(other.to_string()),
        }
    }
}

impl GitHubClient {
    /// Create a new client against the public API
    pub fn new() -> Result<Self, GitHubError> {
        Self::with_base_url("https://api.github.com")
    }

    /// Create a new client against a specific API host (e.g. an enterprise
    /// instance's `/api/v3` root)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, GitHubError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("gitgloss/0.3"),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github.v3+json"),
                );
                headers
            })
            .build()?;

        let auth_token = std::env::var("GITHUB_TOKEN").ok();

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Perform a GET request, decoding the body as JSON.
    ///
    /// A 404 is a legitimate non-match and maps to `Ok(None)`; every other
    /// non-success status is an error carrying the upstream body.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<T>, GitHubError> {
        debug!(url = %url, "GitHub API request");

        let mut request = self.client.get(url).timeout(timeout);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED => Err(GitHubError::Auth),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Err(GitHubError::RateLimited),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GitHubError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Fetch repository metadata
    pub async fn get_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<RepoInfo>, GitHubError> {
        let url = format!("{}/repos/{}/{}", self.base_url, owner, repo);
        self.get_json(&url, GET_TIMEOUT).await
    }

    /// Fetch the repository readme, decoded to text
    pub async fn get_readme(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<String>, GitHubError> {
        let url = format!("{}/repos/{}/{}/readme", self.base_url, owner, repo);
        match self.get_json::<ContentsResponse>(&url, GET_TIMEOUT).await? {
            Some(contents) => decode_contents(&contents).map(Some),
            None => Ok(None),
        }
    }

    /// Fetch a file's content at a given ref, decoded to text.
    ///
    /// Returns `Ok(None)` when the path does not exist on that ref, or when
    /// it names a directory rather than a file.
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.base_url,
            owner,
            repo,
            path,
            urlencoding::encode(branch)
        );

        // Directory paths answer with a JSON array; go through Value so
        // that case stays a non-match instead of a decode failure
        let value = match self.get_json::<serde_json::Value>(&url, GET_TIMEOUT).await? {
            Some(v) => v,
            None => return Ok(None),
        };
        if value.is_array() {
            return Ok(None);
        }

        let contents: ContentsResponse =
            serde_json::from_value(value).map_err(|e| GitHubError::Decode(e.to_string()))?;
        if contents.content.is_none() {
            return Ok(None);
        }
        decode_contents(&contents).map(Some)
    }

    /// Fetch the recursive tree listing for a branch
    pub async fn get_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Option<RepoTree>, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.base_url,
            owner,
            repo,
            urlencoding::encode(branch)
        );
        self.get_json(&url, TREE_TIMEOUT).await
    }

    /// Fetch the repository's language names, most-used first
    pub async fn get_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<Vec<String>>, GitHubError> {
        let url = format!("{}/repos/{}/{}/languages", self.base_url, owner, repo);
        let bytes_by_language = self
            .get_json::<serde_json::Map<String, serde_json::Value>>(&url, GET_TIMEOUT)
            .await?;

        Ok(bytes_by_language.map(|map| {
            let mut pairs: Vec<(String, u64)> = map
                .into_iter()
                .map(|(lang, bytes)| (lang, bytes.as_u64().unwrap_or(0)))
                .collect();
            pairs.sort_by(|a, b| b.1.cmp(&a.1));
            pairs.into_iter().map(|(lang, _)| lang).collect()
        }))
    }
}

/// Decode a contents-API payload (base64 with embedded newlines) to text
fn decode_contents(contents: &ContentsResponse) -> Result<String, GitHubError> {
    let raw = contents.content.as_deref().unwrap_or_default();

    match contents.encoding.as_deref() {
        Some("base64") | None => {
            let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = BASE64
                .decode(cleaned.as_bytes())
                .map_err(|e| GitHubError::Decode(e.to_string()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Some(other) => Err(GitHubError::Decode(format!(
            "unsupported content encoding: {}",
            other
        ))),
    }
}
