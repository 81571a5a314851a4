//! Client for the OneView index resources API
//!
//! - [`oneview`] - Appliance connection: HTTP, login sessions, combined client
//! - [`resource`] - Resource client, query encoding and the index resources API
//! - [`config`] - Persistent settings for the `ovindex` command

pub mod config;
pub mod oneview;
pub mod resource;

pub use oneview::auth::Credentials;
pub use oneview::client::{format_api_error, OneViewClient};
pub use resource::{
    AggregatedQuery, IndexResources, IndexResourcesQuery, QueryValue, ResourceClient, ResourceFetch,
};
