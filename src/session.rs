//! Session wiring
//!
//! A [`Session`] is the explicitly owned object graph for one process
//! lifetime: configuration, cache, strategy chain, resolver and the
//! generation client, with the sweep task spawned on creation and stopped
//! on drop. There is no ambient singleton; everything the resolver needs is
//! injected here.

use crate::cache::{Cache, CacheConfig, CacheStats};
use crate::config::GitGlossConfig;
use crate::generation::GenerationClient;
use crate::github::GitHubClient;
use crate::page::PageContext;
use crate::project::{self, ProjectData};
use crate::resolver::{ResolveOptions, Resolver, Resource};
use crate::sources::{ApiFetch, SnapshotExtraction};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// One process-lifetime session
pub struct Session {
    config: GitGlossConfig,
    cache: Arc<Cache<Option<String>>>,
    resolver: Resolver,
    generation: GenerationClient,
    sweeper: tokio::task::JoinHandle<()>,
}

impl Session {
    /// Build a session without a page snapshot (API-only acquisition)
    pub fn new(config: GitGlossConfig) -> Result<Self> {
        Self::with_snapshot(config, None)
    }

    /// Build a session, optionally seeding the snapshot-extraction strategy
    /// with a captured page. Must be called within a tokio runtime (the
    /// sweep task is spawned here).
    pub fn with_snapshot(config: GitGlossConfig, snapshot: Option<String>) -> Result<Self> {
        let cache = Arc::new(Cache::new(CacheConfig {
            capacity: config.cache.capacity,
            sweep_interval: config.cache.sweep_interval(),
        }));
        let sweeper = cache.spawn_sweeper();

        let mut github = GitHubClient::new()?;
        if let Some(ref token) = config.credential.github_token {
            github = github.with_token(token.clone());
        }
        let github = Arc::new(github);

        // Fast tier first: snapshot extraction, then the remote API. The
        // remote tier's values (project metadata among them) live longer
        // than re-extractable page content.
        let resolver = Resolver::builder()
            .cache(cache.clone())
            .strategy(SnapshotExtraction::new(snapshot), config.cache.content_ttl())
            .strategy(ApiFetch::new(github.clone()), config.cache.project_ttl())
            .build();

        let generation = GenerationClient::new(
            config.generation.clone(),
            config.credential.api_key.clone(),
        )?;

        Ok(Self {
            config,
            cache,
            resolver,
            generation,
            sweeper,
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn is_generation_configured(&self) -> bool {
        self.generation.is_configured()
    }

    /// Resolve a resource through the tiered chain
    pub async fn resolve(&self, resource: &Resource) -> Result<Option<String>> {
        self.resolver.resolve(resource).await
    }

    /// Resolve with explicit options (e.g. opt-in negative caching)
    pub async fn resolve_with(
        &self,
        resource: &Resource,
        options: ResolveOptions,
    ) -> Result<Option<String>> {
        self.resolver.resolve_with(resource, options).await
    }

    /// Collect aggregated project metadata for a page
    pub async fn collect_project_data(&self, ctx: &PageContext) -> ProjectData {
        project::collect(&self.resolver, ctx).await
    }

    /// Run a generation call guarded by the cache: the resource's
    /// analysis-purpose key is checked first, and a fresh result is stored
    /// under it with the analysis TTL.
    pub async fn analyze(&self, resource: &Resource, prompt: &str) -> Result<String> {
        if !resource.purpose.is_analysis() {
            return Err(crate::GitGlossError::InvalidResource(format!(
                "{} is not an analysis purpose",
                resource.purpose
            )));
        }
        resource.validate()?;

        let key = resource.cache_key();
        if let Some(Some(cached)) = self.cache.get(&key) {
            info!(key = %key, "Returning cached analysis");
            return Ok(cached);
        }

        let text = self.generation.generate(prompt).await?;
        self.cache
            .set(key, Some(text.clone()), self.config.cache.analysis_ttl());
        Ok(text)
    }

    /// Handle a credential change: swap the key on the generation client
    /// and drop every cached value, since previously generated content was
    /// produced under a possibly different identity and quota. Persistence
    /// of the new key is the caller's concern.
    pub fn update_credential(&mut self, api_key: impl Into<String>) {
        let api_key = api_key.into();
        self.config.set_api_key(api_key.clone());
        self.generation.set_api_key(Some(api_key));
        self.cache.clear();
        info!("Credential updated; cache invalidated");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Purpose;
    use std::time::Duration;

    #[tokio::test]
    async fn test_session_construction_and_teardown() {
        let session = Session::new(GitGlossConfig::default()).unwrap();
        assert_eq!(session.cache_stats().entries, 0);
        assert!(!session.is_generation_configured());
        drop(session);
    }

    #[tokio::test]
    async fn test_analyze_rejects_acquisition_purposes() {
        let session = Session::new(GitGlossConfig::default()).unwrap();
        let resource = Resource::new(Purpose::Readme, "octo", "hello", "main");
        assert!(session.analyze(&resource, "prompt").await.is_err());
    }

    #[tokio::test]
    async fn test_analyze_without_credential_fails_fast() {
        let session = Session::new(GitGlossConfig::default()).unwrap();
        let resource = Resource::new(Purpose::Overview, "octo", "hello", "main");
        let err = session.analyze(&resource, "prompt").await.unwrap_err();
        assert!(matches!(err, crate::GitGlossError::MissingCredential));
    }

    #[tokio::test]
    async fn test_update_credential_clears_cache() {
        let mut session = Session::new(GitGlossConfig::default()).unwrap();

        // Seed the cache through the session's shared handle
        session.resolver.cache().set(
            "overview:octo/hello@main".to_string(),
            Some("stale analysis".to_string()),
            Duration::from_secs(3600),
        );
        assert_eq!(session.cache_stats().entries, 1);

        session.update_credential("AIza-new");

        assert_eq!(
            session.cache_stats().entries,
            0,
            "credential change must invalidate all cached output"
        );
        assert!(session.is_generation_configured());
    }
}
