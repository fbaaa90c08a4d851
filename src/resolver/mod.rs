//! Tiered resource resolution
//!
//! Turns a logical "what is the content of resource R" query into a value by
//! trying an ordered chain of acquisition strategies (fast/local first,
//! slow/remote last), short-circuiting on the first non-empty result and
//! memoizing it in the bounded TTL cache so repeated lookups within the TTL
//! window never re-execute any strategy.
//!
//! Absence is not an error: a resolution in which every strategy comes back
//! empty yields `Ok(None)`, and the caller decides whether that is fatal. A
//! strategy that fails (network error, malformed response) is logged and
//! skipped so a working fallback still gets its turn.

use crate::cache::{Cache, CacheConfig};
use crate::page::PageContext;
use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// The logical purpose of a resource query. Part of the cache key, so raw
/// file content and AI-generated artifacts for the same file never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Raw file content at a path
    FileContent,
    /// Repository readme text
    Readme,
    /// Recursive file tree listing
    Tree,
    /// Language breakdown
    Languages,
    /// Repository metadata
    RepoInfo,
    /// Generated project overview
    Overview,
    /// Generated structure analysis
    Structure,
    /// Generated per-file explanation
    Detail,
    /// Generated learning guide
    Learning,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::FileContent => "file",
            Purpose::Readme => "readme",
            Purpose::Tree => "tree",
            Purpose::Languages => "languages",
            Purpose::RepoInfo => "repo",
            Purpose::Overview => "overview",
            Purpose::Structure => "structure",
            Purpose::Detail => "detail",
            Purpose::Learning => "learning",
        }
    }

    /// True for purposes that tag generated output rather than acquired
    /// content. These keys are written by the session after a generation
    /// call, never produced by the strategy chain.
    pub fn is_analysis(&self) -> bool {
        matches!(
            self,
            Purpose::Overview | Purpose::Structure | Purpose::Detail | Purpose::Learning
        )
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource descriptor: repository coordinates plus a purpose tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: Option<String>,
    pub purpose: Purpose,
}

impl Resource {
    pub fn new(
        purpose: Purpose,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            path: None,
            purpose,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Build a descriptor from a parsed page context
    pub fn from_page(ctx: &PageContext, purpose: Purpose) -> Self {
        Self {
            owner: ctx.owner.clone(),
            repo: ctx.repo.clone(),
            branch: ctx.branch.clone(),
            path: ctx.file_path.clone(),
            purpose,
        }
    }

    /// Reject malformed descriptors. This is the only way `resolve` fails:
    /// a well-formed query that finds nothing is `Ok(None)`.
    pub fn validate(&self) -> Result<()> {
        if self.owner.is_empty() || self.repo.is_empty() || self.branch.is_empty() {
            return Err(crate::GitGlossError::InvalidResource(format!(
                "owner, repo and branch are required (got {:?})",
                self
            )));
        }
        if self.purpose == Purpose::FileContent && self.path.as_deref().unwrap_or("").is_empty() {
            return Err(crate::GitGlossError::InvalidResource(
                "file content queries require a path".to_string(),
            ));
        }
        Ok(())
    }

    /// The deterministic cache key. A pure function of the descriptor:
    /// one logical query always reduces to the same key, and two distinct
    /// queries (differing in any coordinate or in purpose) never collide.
    pub fn cache_key(&self) -> String {
        match &self.path {
            Some(path) => format!(
                "{}:{}/{}@{}:{}",
                self.purpose, self.owner, self.repo, self.branch, path
            ),
            None => format!("{}:{}/{}@{}", self.purpose, self.owner, self.repo, self.branch),
        }
    }
}

/// Transport-level failure inside a single strategy. Caught by the resolver,
/// logged, and never propagated past it.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("{0}")]
    Other(String),
}

/// One acquisition method in the fallback chain.
///
/// `Ok(None)` is a legitimate non-match (an empty page region, a missing
/// path); `Err` is reserved for transport-level failure. Strategies know
/// nothing about the cache.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, resource: &Resource) -> std::result::Result<Option<String>, StrategyError>;
}

struct Registered {
    strategy: Box<dyn Strategy>,
    ttl: Duration,
}

/// Per-call resolution options
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Cache an exhausted (not-found) resolution for this long. Off by
    /// default: a later call may succeed once the page finishes rendering
    /// or the API becomes reachable. Opt in to stop hammering a source that
    /// is known to be broken.
    pub negative_ttl: Option<Duration>,
}

/// Tiered resource resolver
///
/// The strategy chain is fixed at construction time. The resolver owns the
/// cache policy (per-strategy TTLs, negative caching); strategies stay pure.
///
/// Known limitation: two concurrent `resolve` calls for the same key may
/// both run the full chain; whichever finishes last refreshes the cache
/// entry. In-flight de-duplication is deliberately not provided.
pub struct Resolver {
    cache: Arc<Cache<Option<String>>>,
    strategies: Vec<Registered>,
}

impl Resolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder {
            cache: None,
            strategies: Vec::new(),
        }
    }

    /// The cache backing this resolver (shared with the session, which uses
    /// it for generated-output keys and for credential-change invalidation)
    pub fn cache(&self) -> &Arc<Cache<Option<String>>> {
        &self.cache
    }

    /// Resolve with default options (no negative caching)
    pub async fn resolve(&self, resource: &Resource) -> Result<Option<String>> {
        self.resolve_with(resource, ResolveOptions::default()).await
    }

    /// Resolve a resource through the cache and the strategy chain
    pub async fn resolve_with(
        &self,
        resource: &Resource,
        options: ResolveOptions,
    ) -> Result<Option<String>> {
        resource.validate()?;
        let key = resource.cache_key();

        if let Some(cached) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(cached);
        }

        for registered in &self.strategies {
            let name = registered.strategy.name();
            match registered.strategy.fetch(resource).await {
                Ok(Some(value)) if !value.trim().is_empty() => {
                    debug!(strategy = name, key = %key, bytes = value.len(), "Resolved");
                    self.cache.set(key, Some(value.clone()), registered.ttl);
                    return Ok(Some(value));
                }
                Ok(_) => {
                    trace!(strategy = name, key = %key, "No match, trying next source");
                }
                Err(e) => {
                    // Swallowed for control flow, never for visibility
                    warn!(strategy = name, key = %key, error = %e, "Strategy failed, trying next source");
                }
            }
        }

        if let Some(ttl) = options.negative_ttl {
            debug!(key = %key, ?ttl, "Caching negative resolution");
            self.cache.set(key, None, ttl);
        }

        Ok(None)
    }
}

/// Builder for [`Resolver`]
pub struct ResolverBuilder {
    cache: Option<Arc<Cache<Option<String>>>>,
    strategies: Vec<Registered>,
}

impl ResolverBuilder {
    /// Share an existing cache instead of creating a default one
    pub fn cache(mut self, cache: Arc<Cache<Option<String>>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Append a strategy to the chain. Earlier registrations have higher
    /// priority; each carries its own TTL for the values it produces.
    pub fn strategy(mut self, strategy: impl Strategy + 'static, ttl: Duration) -> Self {
        self.strategies.push(Registered {
            strategy: Box::new(strategy),
            ttl,
        });
        self
    }

    pub fn build(self) -> Resolver {
        Resolver {
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(Cache::new(CacheConfig::default()))),
            strategies: self.strategies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy returning a fixed outcome, counting invocations
    struct Fixed {
        name: &'static str,
        outcome: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(name: &'static str, outcome: Option<&'static str>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    outcome,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl Strategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(
            &self,
            _resource: &Resource,
        ) -> std::result::Result<Option<String>, StrategyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome.map(|s| s.to_string()))
        }
    }

    struct Failing {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Strategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(
            &self,
            _resource: &Resource,
        ) -> std::result::Result<Option<String>, StrategyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StrategyError::Other("connection reset".to_string()))
        }
    }

    fn file_resource() -> Resource {
        Resource::new(Purpose::FileContent, "octo", "hello", "main").with_path("src/lib.rs")
    }

    #[test]
    fn test_cache_key_is_deterministic_and_distinct() {
        let a = file_resource();
        let b = file_resource();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "file:octo/hello@main:src/lib.rs");

        let readme = Resource::new(Purpose::Readme, "octo", "hello", "main");
        let overview = Resource::new(Purpose::Overview, "octo", "hello", "main");
        assert_ne!(readme.cache_key(), overview.cache_key());
        assert_ne!(a.cache_key(), readme.cache_key());
    }

    #[test]
    fn test_validate_rejects_malformed_descriptors() {
        let missing_path = Resource::new(Purpose::FileContent, "octo", "hello", "main");
        assert!(missing_path.validate().is_err());

        let empty_owner = Resource::new(Purpose::Readme, "", "hello", "main");
        assert!(empty_owner.validate().is_err());

        assert!(file_resource().validate().is_ok());
    }

    #[tokio::test]
    async fn test_first_nonempty_strategy_wins() {
        let (a, a_calls) = Fixed::new("a", Some("from-a"));
        let (b, b_calls) = Fixed::new("b", Some("from-b"));

        let resolver = Resolver::builder()
            .strategy(a, Duration::from_secs(60))
            .strategy(b, Duration::from_secs(60))
            .build();

        let value = resolver.resolve(&file_resource()).await.unwrap();
        assert_eq!(value.as_deref(), Some("from-a"));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0, "chain short-circuits");
    }

    #[tokio::test]
    async fn test_fallback_tolerates_midchain_failure() {
        let (a, _) = Fixed::new("a", None);
        let failing_calls = Arc::new(AtomicUsize::new(0));
        let (c, _) = Fixed::new("c", Some("x"));

        let resolver = Resolver::builder()
            .strategy(a, Duration::from_secs(60))
            .strategy(
                Failing {
                    calls: failing_calls.clone(),
                },
                Duration::from_secs(60),
            )
            .strategy(c, Duration::from_secs(60))
            .build();

        let value = resolver.resolve(&file_resource()).await.unwrap();
        assert_eq!(value.as_deref(), Some("x"));
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_strategies() {
        let (a, calls) = Fixed::new("a", Some("v"));
        let resolver = Resolver::builder()
            .strategy(a, Duration::from_secs(60))
            .build();

        let r = file_resource();
        assert_eq!(resolver.resolve(&r).await.unwrap().as_deref(), Some("v"));
        assert_eq!(resolver.resolve(&r).await.unwrap().as_deref(), Some("v"));
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "second call within the TTL must not re-trigger any work"
        );
    }

    #[tokio::test]
    async fn test_strategy_ttl_governs_refetch() {
        let (a, calls) = Fixed::new("a", Some("v"));
        let resolver = Resolver::builder()
            .strategy(a, Duration::from_millis(30))
            .build();

        let r = file_resource();
        resolver.resolve(&r).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        resolver.resolve(&r).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2, "expired value is re-fetched");
    }

    #[tokio::test]
    async fn test_exhaustion_is_not_cached_by_default() {
        let (a, calls) = Fixed::new("a", None);
        let resolver = Resolver::builder()
            .strategy(a, Duration::from_secs(60))
            .build();

        let r = file_resource();
        assert_eq!(resolver.resolve(&r).await.unwrap(), None);
        assert_eq!(resolver.resolve(&r).await.unwrap(), None);
        assert_eq!(
            calls.load(Ordering::SeqCst),
            2,
            "a future call may succeed, so misses must re-run the chain"
        );
    }

    #[tokio::test]
    async fn test_opt_in_negative_caching() {
        let (a, calls) = Fixed::new("a", None);
        let resolver = Resolver::builder()
            .strategy(a, Duration::from_secs(60))
            .build();

        let r = file_resource();
        let options = ResolveOptions {
            negative_ttl: Some(Duration::from_secs(60)),
        };
        assert_eq!(resolver.resolve_with(&r, options).await.unwrap(), None);
        assert_eq!(resolver.resolve(&r).await.unwrap(), None);
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "cached negative result suppresses the chain"
        );
    }

    #[tokio::test]
    async fn test_whitespace_only_value_is_a_non_match() {
        let (a, _) = Fixed::new("a", Some("   \n  "));
        let (b, _) = Fixed::new("b", Some("real"));
        let resolver = Resolver::builder()
            .strategy(a, Duration::from_secs(60))
            .strategy(b, Duration::from_secs(60))
            .build();

        let value = resolver.resolve(&file_resource()).await.unwrap();
        assert_eq!(value.as_deref(), Some("real"));
    }

    #[tokio::test]
    async fn test_malformed_descriptor_is_an_error() {
        let resolver = Resolver::builder().build();
        let bad = Resource::new(Purpose::FileContent, "octo", "hello", "main");
        assert!(resolver.resolve(&bad).await.is_err());
    }
}
