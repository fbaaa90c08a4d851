//! GitHub page context detection
//!
//! Classifies a GitHub URL into a page type and extracts the repository
//! coordinates (owner, repo, branch, file path) that feed deterministic
//! resource keys. Pure string parsing; no network access.

use crate::Result;

/// What kind of GitHub page a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Repository root (`/{owner}/{repo}`)
    Repository,
    /// A file view (`/{owner}/{repo}/blob/{branch}/{path}`)
    File,
    /// A directory view (`/{owner}/{repo}/tree/{branch}/{path}`)
    Directory,
    /// A commit page
    Commit,
    /// A pull request page
    PullRequest,
    /// Anything else under github.com
    Other,
}

/// Parsed page coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub page_type: PageType,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub file_path: Option<String>,
}

impl PageContext {
    /// Parse a GitHub URL (or a bare path like `/owner/repo/blob/main/x.rs`).
    ///
    /// URLs without a branch segment default to `main`; the remote strategy
    /// falls back to the repository's real default branch when that guess
    /// misses.
    pub fn parse(url: &str) -> Result<Self> {
        let path = strip_origin(url);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if segments.len() < 2 {
            return Err(crate::GitGlossError::InvalidResource(format!(
                "Not a repository URL: {}",
                url
            )));
        }

        let owner = segments[0].to_string();
        let repo = segments[1].to_string();

        let page_type = match segments.get(2).copied() {
            None => PageType::Repository,
            Some("blob") => PageType::File,
            Some("tree") => PageType::Directory,
            Some("commit") | Some("commits") => PageType::Commit,
            Some("pull") | Some("pulls") => PageType::PullRequest,
            Some(_) => PageType::Other,
        };

        let branch = match page_type {
            PageType::File | PageType::Directory => segments
                .get(3)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "main".to_string()),
            _ => "main".to_string(),
        };

        let file_path = match page_type {
            PageType::File | PageType::Directory if segments.len() > 4 => {
                Some(segments[4..].join("/"))
            }
            _ => None,
        };

        Ok(Self {
            page_type,
            owner,
            repo,
            branch,
            file_path,
        })
    }
}

/// Drop a `https://github.com` (or enterprise host) prefix, keeping the path
fn strip_origin(url: &str) -> &str {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    match without_scheme.find('/') {
        // A host is present only when the URL carried a scheme or a dot
        // before the first slash
        Some(idx) if url.contains("://") || without_scheme[..idx].contains('.') => {
            &without_scheme[idx..]
        }
        _ => without_scheme,
    }
}
