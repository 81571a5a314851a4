//! Resource abstraction layer
//!
//! # Architecture
//!
//! - [`client`] - Generic paged and single-item fetching with `nextPageUri` pagination
//! - [`query`] - Query string encoding for repeated, optionally list-valued parameters
//! - [`index`] - The index resources API built on the two above
//!
//! # Example
//!
//! ```ignore
//! use oneview_index::resource::{IndexResources, IndexResourcesQuery, ResourceClient, INDEX_RESOURCES_URI};
//!
//! async fn list_servers(client: OneViewClient) -> anyhow::Result<Vec<serde_json::Value>> {
//!     let index = IndexResources::new(ResourceClient::new(client, INDEX_RESOURCES_URI));
//!     let query = IndexResourcesQuery {
//!         category: Some("server-hardware".into()),
//!         ..Default::default()
//!     };
//!     index.get_all(&query).await
//! }
//! ```

pub mod client;
pub mod index;
pub mod query;

pub use client::{ResourceClient, ResourceFetch};
pub use index::{
    AggregatedQuery, IndexResources, IndexResourcesQuery, AGGREGATED_URI, DEFAULT_CHILD_LIMIT,
    INDEX_RESOURCES_URI,
};
pub use query::{normalize_separator, QueryBuilder, QueryValue, Scalar};
