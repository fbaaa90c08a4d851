//! Project metadata collection
//!
//! Aggregates everything the prompts need to know about a repository —
//! metadata, readme, file tree, languages, manifest — by issuing resolver
//! queries under purpose-tagged keys. Collection is partial-failure
//! tolerant: any single field that cannot be acquired is logged and left
//! empty, and the collector itself never fails.

use crate::github::{RepoInfo, RepoTree};
use crate::page::PageContext;
use crate::resolver::{Purpose, Resolver, Resource};
use serde::Serialize;
use tracing::warn;

/// Manifest files probed, in order, to characterize the project's stack
const MANIFEST_CANDIDATES: &[&str] = &["package.json", "Cargo.toml", "pyproject.toml", "go.mod"];

/// Tree entries rendered into prompt context before truncation
const TREE_RENDER_LIMIT: usize = 100;

/// Aggregated project context
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectData {
    pub name: String,
    pub owner: String,
    pub branch: String,
    pub description: Option<String>,
    pub readme: Option<String>,
    pub languages: Vec<String>,
    pub topics: Vec<String>,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub pushed_at: Option<String>,
    pub manifest: Option<String>,
    pub tree: Option<RepoTree>,
}

/// Collect project data for a page, tolerating per-field failures
pub async fn collect(resolver: &Resolver, ctx: &PageContext) -> ProjectData {
    let mut data = ProjectData {
        name: ctx.repo.clone(),
        owner: ctx.owner.clone(),
        branch: ctx.branch.clone(),
        ..Default::default()
    };

    if let Some(info) = resolve_json::<RepoInfo>(resolver, ctx, Purpose::RepoInfo).await {
        data.description = info.description;
        data.stars = Some(info.stargazers_count);
        data.forks = Some(info.forks_count);
        data.pushed_at = info.pushed_at;
        data.topics = info.topics;
    }

    data.readme = resolve_text(resolver, ctx, Purpose::Readme).await;
    data.tree = resolve_json::<RepoTree>(resolver, ctx, Purpose::Tree).await;
    data.languages = resolve_json::<Vec<String>>(resolver, ctx, Purpose::Languages)
        .await
        .unwrap_or_default();

    for candidate in MANIFEST_CANDIDATES {
        let resource = Resource::new(Purpose::FileContent, &ctx.owner, &ctx.repo, &ctx.branch)
            .with_path(*candidate);
        match resolver.resolve(&resource).await {
            Ok(Some(content)) => {
                data.manifest = Some(content);
                break;
            }
            Ok(None) => {}
            Err(e) => warn!(path = candidate, error = %e, "Manifest probe failed"),
        }
    }

    data
}

async fn resolve_text(resolver: &Resolver, ctx: &PageContext, purpose: Purpose) -> Option<String> {
    let resource = Resource::new(purpose, &ctx.owner, &ctx.repo, &ctx.branch);
    match resolver.resolve(&resource).await {
        Ok(value) => value,
        Err(e) => {
            warn!(purpose = %purpose, error = %e, "Project field unavailable");
            None
        }
    }
}

async fn resolve_json<T: serde::de::DeserializeOwned>(
    resolver: &Resolver,
    ctx: &PageContext,
    purpose: Purpose,
) -> Option<T> {
    let raw = resolve_text(resolver, ctx, purpose).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(purpose = %purpose, error = %e, "Cached payload did not parse");
            None
        }
    }
}

impl ProjectData {
    /// Compact context block for prompt assembly
    pub fn context_block(&self) -> String {
        let mut block = format!(
            "Project: {}/{}\nBranch: {}\n",
            self.owner, self.name, self.branch
        );

        if let Some(ref description) = self.description {
            block.push_str(&format!("Description: {}\n", description));
        }
        if !self.languages.is_empty() {
            block.push_str(&format!("Languages: {}\n", self.languages.join(", ")));
        }
        if !self.topics.is_empty() {
            block.push_str(&format!("Topics: {}\n", self.topics.join(", ")));
        }
        if let (Some(stars), Some(forks)) = (self.stars, self.forks) {
            block.push_str(&format!("Stars: {} | Forks: {}\n", stars, forks));
        }
        if let Some(ref pushed_at) = self.pushed_at {
            block.push_str(&format!("Last push: {}\n", pushed_at));
        }
        if let Some(ref manifest) = self.manifest {
            block.push_str(&format!(
                "Manifest excerpt:\n{}\n",
                truncate(manifest, 1000)
            ));
        }

        block
    }

    /// Indented tree rendering, capped at [`TREE_RENDER_LIMIT`] entries
    pub fn render_tree(&self) -> String {
        let Some(ref tree) = self.tree else {
            return "(file structure unavailable)".to_string();
        };

        let mut lines: Vec<String> = tree
            .tree
            .iter()
            .take(TREE_RENDER_LIMIT)
            .map(|entry| {
                let depth = entry.path.matches('/').count();
                let marker = if entry.kind == "tree" { "/" } else { "" };
                format!("{}{}{}", "  ".repeat(depth), entry.path, marker)
            })
            .collect();

        if tree.tree.len() > TREE_RENDER_LIMIT {
            lines.push(format!(
                "... ({} more entries)",
                tree.tree.len() - TREE_RENDER_LIMIT
            ));
        }

        lines.join("\n")
    }
}

/// Truncate on a char boundary, marking the cut
pub(crate) fn truncate(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... (truncated)", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::TreeEntry;

    fn sample_data() -> ProjectData {
        ProjectData {
            name: "hello".to_string(),
            owner: "octo".to_string(),
            branch: "main".to_string(),
            description: Some("A greeting library".to_string()),
            languages: vec!["Rust".to_string(), "Shell".to_string()],
            stars: Some(42),
            forks: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_context_block_fields() {
        let block = sample_data().context_block();
        assert!(block.contains("octo/hello"));
        assert!(block.contains("A greeting library"));
        assert!(block.contains("Rust, Shell"));
        assert!(block.contains("Stars: 42 | Forks: 7"));
    }

    #[test]
    fn test_context_block_omits_missing_fields() {
        let data = ProjectData {
            name: "hello".to_string(),
            owner: "octo".to_string(),
            branch: "main".to_string(),
            ..Default::default()
        };
        let block = data.context_block();
        assert!(!block.contains("Description:"));
        assert!(!block.contains("Stars:"));
    }

    #[test]
    fn test_render_tree_caps_entries() {
        let entries: Vec<TreeEntry> = (0..150)
            .map(|i| TreeEntry {
                path: format!("src/file{}.rs", i),
                kind: "blob".to_string(),
                size: Some(10),
            })
            .collect();

        let data = ProjectData {
            tree: Some(RepoTree {
                tree: entries,
                truncated: false,
            }),
            ..Default::default()
        };

        let rendered = data.render_tree();
        assert!(rendered.contains("50 more entries"));
        assert_eq!(rendered.lines().count(), TREE_RENDER_LIMIT + 1);
    }

    #[test]
    fn test_render_tree_without_tree() {
        let data = ProjectData::default();
        assert!(data.render_tree().contains("unavailable"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld, this is a long line";
        let cut = truncate(text, 6);
        assert!(cut.contains("truncated"));

        assert_eq!(truncate("short", 100), "short");
    }

    #[tokio::test]
    async fn test_collect_tolerates_empty_resolver() {
        // A resolver with no strategies resolves nothing; collection must
        // still produce a usable (if sparse) ProjectData
        let resolver = Resolver::builder().build();
        let ctx = PageContext::parse("https://github.com/octo/hello").unwrap();

        let data = collect(&resolver, &ctx).await;
        assert_eq!(data.name, "hello");
        assert_eq!(data.owner, "octo");
        assert!(data.readme.is_none());
        assert!(data.languages.is_empty());
    }
}
