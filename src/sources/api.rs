//! GitHub API fetch strategy
//!
//! Maps each acquisition purpose onto the matching [`GitHubClient`] call.
//! Structured payloads (tree, languages, repository info) are serialized to
//! JSON strings so a single string-valued cache covers every tier;
//! consumers deserialize on the way out.

use crate::github::{GitHubClient, GitHubError};
use crate::resolver::{Purpose, Resource, Strategy, StrategyError};
use async_trait::async_trait;
use std::sync::Arc;

impl From<GitHubError> for StrategyError {
    fn from(e: GitHubError) -> Self {
        match e {
            GitHubError::Api { status, body } => StrategyError::Upstream { status, body },
            GitHubError::Network(e) => StrategyError::Network(e),
            other => StrategyError::Other(other.to_string()),
        }
    }
}

/// Remote-fetch strategy over the repository-hosting API
pub struct ApiFetch {
    client: Arc<GitHubClient>,
}

impl ApiFetch {
    pub fn new(client: Arc<GitHubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Strategy for ApiFetch {
    fn name(&self) -> &'static str {
        "github-api"
    }

    async fn fetch(&self, resource: &Resource) -> Result<Option<String>, StrategyError> {
        let Resource {
            owner,
            repo,
            branch,
            path,
            purpose,
        } = resource;

        match purpose {
            Purpose::FileContent => {
                let Some(path) = path.as_deref() else {
                    return Ok(None);
                };
                Ok(self
                    .client
                    .get_file_content(owner, repo, path, branch)
                    .await?)
            }
            Purpose::Readme => Ok(self.client.get_readme(owner, repo).await?),
            Purpose::Tree => {
                let tree = self.client.get_tree(owner, repo, branch).await?;
                to_json(tree)
            }
            Purpose::Languages => {
                let languages = self.client.get_languages(owner, repo).await?;
                to_json(languages)
            }
            Purpose::RepoInfo => {
                let info = self.client.get_repository(owner, repo).await?;
                to_json(info)
            }
            // Generated artifacts are written to the cache by the session,
            // never produced by an acquisition source
            _ => Ok(None),
        }
    }
}

fn to_json<T: serde::Serialize>(value: Option<T>) -> Result<Option<String>, StrategyError> {
    value
        .map(|v| serde_json::to_string(&v).map_err(|e| StrategyError::Other(e.to_string())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> ApiFetch {
        ApiFetch::new(Arc::new(GitHubClient::new().expect("client")))
    }

    #[tokio::test]
    async fn test_analysis_purpose_is_a_non_match() {
        let overview = Resource::new(Purpose::Overview, "octo", "hello", "main");
        assert_eq!(strategy().fetch(&overview).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_content_without_path_is_a_non_match() {
        let pathless = Resource::new(Purpose::FileContent, "octo", "hello", "main");
        assert_eq!(strategy().fetch(&pathless).await.unwrap(), None);
    }

    #[test]
    fn test_github_error_mapping() {
        let err: StrategyError = GitHubError::Api {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        match err {
            StrategyError::Upstream { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
