//! Resource Client
//!
//! Generic paged and single-item fetching for one OneView resource
//! category. Pagination follows `nextPageUri` links until the requested
//! count is reached or the appliance stops returning new pages.

use crate::oneview::client::OneViewClient;
use anyhow::Result;
use serde_json::Value;
use std::future::Future;

/// Fetch boundary used by resource modules
pub trait ResourceFetch: Send + Sync {
    /// Fetch members of a collection, starting at `start`; `count == -1` fetches all
    fn fetch_page(
        &self,
        uri: &str,
        start: i64,
        count: i64,
    ) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Fetch a single document
    fn fetch_one(&self, uri: &str) -> impl Future<Output = Result<Value>> + Send;
}

/// Resource client scoped to one base URI
#[derive(Clone)]
pub struct ResourceClient {
    client: OneViewClient,
    base_uri: String,
}

impl ResourceClient {
    pub fn new(client: OneViewClient, base_uri: &str) -> Self {
        Self {
            client,
            base_uri: base_uri.to_string(),
        }
    }

    fn validate_uri(&self, uri: &str) -> Result<()> {
        if !uri.contains(&self.base_uri) {
            tracing::warn!("Unrecognized URI for {}: {}", self.base_uri, uri);
            return Err(anyhow::anyhow!("Unrecognized URI for this resource: {}", uri));
        }
        Ok(())
    }

    /// Expand a bare ID into `<base>/<id>`; full URIs must belong to this resource
    pub fn build_uri(&self, id_or_uri: &str) -> Result<String> {
        if id_or_uri.is_empty() {
            return Err(anyhow::anyhow!("Resource ID or URI must not be empty"));
        }

        if id_or_uri.contains('/') {
            self.validate_uri(id_or_uri)?;
            Ok(id_or_uri.to_string())
        } else {
            Ok(format!("{}/{}", self.base_uri, id_or_uri))
        }
    }
}

/// Append `start`/`count` to a URI that may already carry a query
pub fn paged_uri(uri: &str, start: i64, count: i64) -> String {
    let separator = if uri.ends_with('?') || uri.ends_with('&') {
        ""
    } else if uri.contains('?') {
        "&"
    } else {
        "?"
    };
    format!("{}{}start={}&count={}", uri, separator, start, count)
}

fn page_members(response: &Value) -> Vec<Value> {
    response
        .get("members")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Next page link, unless it points back at the current page or enough items are in
fn next_page(response: &Value, collected: usize, requested: i64) -> Option<String> {
    let next = response.get("nextPageUri").and_then(|v| v.as_str())?;

    if response.get("uri").and_then(|v| v.as_str()) == Some(next) {
        return None;
    }

    if requested != -1 && i64::try_from(collected).unwrap_or(i64::MAX) >= requested {
        return None;
    }

    Some(next.to_string())
}

impl ResourceFetch for ResourceClient {
    async fn fetch_page(&self, uri: &str, start: i64, count: i64) -> Result<Vec<Value>> {
        self.validate_uri(uri)?;

        let mut all_items = Vec::new();
        let mut page_uri = Some(paged_uri(uri, start, count));

        while let Some(current) = page_uri {
            tracing::debug!("Fetching page: {}", current);
            let response = self.client.get(&current).await?;

            let members = page_members(&response);
            tracing::debug!("Page returned {} members", members.len());
            all_items.extend(members);

            page_uri = next_page(&response, all_items.len(), count);
        }

        tracing::debug!("Total members fetched: {}", all_items.len());
        Ok(all_items)
    }

    async fn fetch_one(&self, uri: &str) -> Result<Value> {
        let uri = self.build_uri(uri)?;
        tracing::debug!("Fetching resource: {}", uri);
        self.client.get(&uri).await
    }
}
