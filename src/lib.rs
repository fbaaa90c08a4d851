//! gitgloss - Tiered, cached acquisition of GitHub page content with
//! AI-generated explanations
//!
//! gitgloss turns a GitHub page URL into explanations of the code behind
//! it. Content is acquired through an ordered chain of strategies (captured
//! page snapshot first, repository-hosting API second) behind a bounded TTL
//! cache, so repeated queries within the freshness window never repeat
//! extraction or network work.
//!
//! # Architecture
//!
//! - **cache**: bounded TTL cache with LRU eviction and a periodic sweep
//! - **resolver**: tiered resolution over purpose-tagged resource keys
//! - **sources**: the acquisition strategies (snapshot extraction, API fetch)
//! - **github**: REST client for the repository-hosting API
//! - **page**: GitHub URL classification
//! - **project**: aggregated project metadata for prompt context
//! - **generation**: the text-generation backend call
//! - **session**: explicit wiring of the above for one process lifetime

// Core modules
pub mod cache;
pub mod config;
pub mod error;
pub mod resolver;

// Components
pub mod generation;
pub mod github;
pub mod logging;
pub mod page;
pub mod project;
pub mod prompt;
pub mod session;
pub mod sources;

// Re-exports
pub use error::{GitGlossError, Result};
