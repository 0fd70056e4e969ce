//! Concurrent fetch across all sources with a settle-all join.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Source, SourceItem, SourceKind};

/// Per-source outcome of one collection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: String,
    pub kind: SourceKind,
    pub available: bool,
    pub item_count: usize,
}

/// A source that failed, forwarded to the reasoning step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub kind: SourceKind,
    pub message: String,
}

/// Everything a collection pass produced.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub items: Vec<SourceItem>,
    pub statuses: Vec<SourceStatus>,
    pub failures: Vec<SourceFailure>,
}

impl Collected {
    pub fn available_sources(&self) -> Vec<String> {
        self.statuses
            .iter()
            .filter(|s| s.available)
            .map(|s| s.source.clone())
            .collect()
    }

    pub fn failed_sources(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.source.clone()).collect()
    }
}

/// Fetch every source concurrently and wait for all of them.
///
/// A failing source never cancels or hides the others.
pub async fn collect_all(sources: &[Arc<dyn Source>]) -> Collected {
    let fetches = sources.iter().map(|source| {
        let source = Arc::clone(source);
        async move {
            let result = source.fetch().await;
            (source, result)
        }
    });

    let mut collected = Collected::default();
    for (source, result) in join_all(fetches).await {
        let name = source.name().to_string();
        match result {
            Ok(items) => {
                debug!(source = %name, count = items.len(), "source fetched");
                collected.statuses.push(SourceStatus {
                    source: name,
                    kind: source.kind(),
                    available: true,
                    item_count: items.len(),
                });
                collected.items.extend(items);
            }
            Err(err) => {
                warn!(source = %name, error = %err, "source fetch failed");
                collected.statuses.push(SourceStatus {
                    source: name.clone(),
                    kind: source.kind(),
                    available: false,
                    item_count: 0,
                });
                collected.failures.push(SourceFailure {
                    source: name,
                    kind: source.kind(),
                    message: err.to_string(),
                });
            }
        }
    }
    collected
}
