//! Index Resources
//!
//! Search, fetch and aggregate the appliance's index resources. Each call
//! builds a query string in a fixed parameter order and hands it to the
//! resource client unchanged.

use super::client::ResourceFetch;
use super::query::{QueryBuilder, QueryValue};
use anyhow::Result;
use serde_json::Value;

pub const INDEX_RESOURCES_URI: &str = "/rest/index/resources";
pub const AGGREGATED_URI: &str = "/rest/index/resources/aggregated";

/// Default number of children per aggregated attribute value
pub const DEFAULT_CHILD_LIMIT: i64 = 6;

/// Parameters for listing index resources
#[derive(Debug, Clone, PartialEq)]
pub struct IndexResourcesQuery {
    pub category: Option<QueryValue>,
    pub fields: Option<QueryValue>,
    pub filter: Option<QueryValue>,
    pub padding: i64,
    pub query: Option<QueryValue>,
    pub reference_uri: Option<QueryValue>,
    pub sort: Option<QueryValue>,
    pub user_query: Option<QueryValue>,
    pub view: Option<QueryValue>,
    pub start: i64,
    /// `-1` fetches every page
    pub count: i64,
}

impl Default for IndexResourcesQuery {
    fn default() -> Self {
        Self {
            category: None,
            fields: None,
            filter: None,
            padding: 0,
            query: None,
            reference_uri: None,
            sort: None,
            user_query: None,
            view: None,
            start: 0,
            count: -1,
        }
    }
}

impl IndexResourcesQuery {
    /// Request URI; `start` and `count` are not part of it
    pub fn to_uri(&self) -> String {
        QueryBuilder::new(INDEX_RESOURCES_URI)
            .push("category", self.category.as_ref())
            .push("fields", self.fields.as_ref())
            .push("filter", self.filter.as_ref())
            .push_int("padding", self.padding)
            .push("query", self.query.as_ref())
            .push("referenceUri", self.reference_uri.as_ref())
            .push("sort", self.sort.as_ref())
            .push("userQuery", self.user_query.as_ref())
            .push("view", self.view.as_ref())
            .build()
    }
}

/// Parameters for an aggregated index query
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedQuery {
    pub attribute: QueryValue,
    pub category: QueryValue,
    pub child_limit: i64,
    pub filter: Option<QueryValue>,
    pub query: Option<QueryValue>,
    pub user_query: Option<QueryValue>,
}

impl AggregatedQuery {
    pub fn new(attribute: impl Into<QueryValue>, category: impl Into<QueryValue>) -> Self {
        Self {
            attribute: attribute.into(),
            category: category.into(),
            child_limit: DEFAULT_CHILD_LIMIT,
            filter: None,
            query: None,
            user_query: None,
        }
    }

    pub fn to_uri(&self) -> String {
        QueryBuilder::new(AGGREGATED_URI)
            .push("attribute", Some(&self.attribute))
            .push("category", Some(&self.category))
            .push_int("childLimit", self.child_limit)
            .push("filter", self.filter.as_ref())
            .push("query", self.query.as_ref())
            .push("userQuery", self.user_query.as_ref())
            .build()
    }
}

/// Index resources API
#[derive(Clone)]
pub struct IndexResources<C> {
    client: C,
}

impl<C: ResourceFetch> IndexResources<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// List index resources matching the query
    pub async fn get_all(&self, query: &IndexResourcesQuery) -> Result<Vec<Value>> {
        let uri = query.to_uri();
        tracing::debug!("get_all: uri={}, start={}, count={}", uri, query.start, query.count);
        self.client.fetch_page(&uri, query.start, query.count).await
    }

    /// Fetch one index resource by its URI suffix, e.g. `/<resource-id>`
    pub async fn get(&self, uri: &str) -> Result<Value> {
        let uri = format!("{}{}", INDEX_RESOURCES_URI, uri);
        self.client.fetch_one(&uri).await
    }

    /// Fetch a single aggregated document
    pub async fn get_aggregated(&self, query: &AggregatedQuery) -> Result<Value> {
        let uri = query.to_uri();
        tracing::debug!("get_aggregated: uri={}", uri);
        self.client.fetch_one(&uri).await
    }
}
