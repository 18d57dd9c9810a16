//! Batch resolution service
//!
//! - [`resolver`]: Per-ecosystem connector and registry table
//! - [`batch`]: Concurrent batch orchestration through the shared cache

pub mod batch;
pub mod resolver;

pub use batch::BatchResolver;
pub use resolver::{EcosystemResolver, create_default_resolvers};
