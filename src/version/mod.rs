//! Version resolution engine
//!
//! Turns "latest version of package X, optionally matching hint H" into a
//! single answer for every supported ecosystem.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Cache    │────▶│  Connector  │────▶│  Registry   │
//! │ (memoize,   │     │ (normalize, │     │  (fetch)    │
//! │  dedup)     │     │  select)    │     └─────────────┘
//! └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Matcher   │────▶│    Model    │
//!                     │   (hints)   │     │ (parse/cmp) │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`model`]: Version parsing and total ordering per ecosystem rule set
//! - [`matcher`]: Hint and container-tag candidate filtering
//! - [`connector`]: Connector trait and the shared resolution pipeline
//! - [`connectors`]: One connector per ecosystem
//! - [`registry`]: Registry trait for fetching versions from remote sources
//! - [`registries`]: Concrete registry implementations
//! - [`cache`]: In-memory TTL cache with in-flight deduplication
//! - [`error`]: Registry and lookup error types
//! - [`types`]: Requests, results and fetched candidates

pub mod cache;
pub mod connector;
pub mod connectors;
pub mod error;
pub mod matcher;
pub mod model;
pub mod registries;
pub mod registry;
pub mod types;
