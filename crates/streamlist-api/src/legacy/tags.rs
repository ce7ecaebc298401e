// Legacy tag catalog lookups.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use super::client::LegacyClient;
use super::models::LegacyTag;
use crate::Error;
use crate::graph::TagKind;

impl LegacyClient {
    /// Search a tag catalog. `query = None` returns the catalog's top entries.
    ///
    /// The response is a bare array, not a connection, so there is never a
    /// next page.
    pub async fn search_tags(
        &self,
        kind: TagKind,
        query: Option<&str>,
        limit: u32,
    ) -> Result<Vec<LegacyTag>, Error> {
        let (operation, field) = match kind {
            TagKind::Category => ("SearchCategoryTags", "searchCategoryTags"),
            TagKind::Stream => ("SearchFreeformTags", "searchFreeformTags"),
        };
        let vars = json!({ "userQuery": query.unwrap_or_default(), "limit": limit });
        let data = self.operation(operation, vars).await?;

        let Some(entries) = data.get(field).and_then(Value::as_array) else {
            return Ok(Vec::new());
        };
        Ok(entries
            .iter()
            .filter(|v| !v.is_null())
            .filter_map(|v| match LegacyTag::deserialize(v) {
                Ok(tag) => Some(tag),
                Err(e) => {
                    warn!(error = %e, "skipping undecodable legacy tag");
                    None
                }
            })
            .collect())
    }
}
