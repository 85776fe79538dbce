//! The caller-facing cluster facade.
//!
//! A [`Cluster`] owns the engine handle and the effective timeout
//! configuration. Its request methods enrich a copy of the caller's options
//! with per-family default timeouts — the caller's own options value is
//! never mutated — and hand off to the matching adapter.

use std::sync::Arc;

use crate::config::{ClusterOptions, TimeoutConfig};
use crate::engine::Engine;
use crate::executor::analytics::PendingAnalyticsResult;
use crate::executor::query::PendingQueryResult;
use crate::executor::search::PendingSearchResult;
use crate::executor::{AnalyticsExecutor, QueryExecutor, SearchExecutor};
use crate::management::QueryIndexManager;
use crate::types::analytics::AnalyticsOptions;
use crate::types::query::QueryOptions;
use crate::types::search::SearchOptions;
use serde::de::DeserializeOwned;

/// A connected cluster.
pub struct Cluster {
    engine: Arc<dyn Engine>,
    timeouts: TimeoutConfig,
}

impl Cluster {
    /// Wraps an engine handle with the given options.
    pub fn new(engine: Arc<dyn Engine>, options: ClusterOptions) -> Self {
        Self {
            engine,
            timeouts: options.timeouts,
        }
    }

    /// The effective timeout configuration.
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Executes a read query. The handle can be awaited for the aggregated
    /// result or subscribed to for row events.
    pub fn query<R>(&self, statement: &str, options: &QueryOptions) -> PendingQueryResult<R>
    where
        R: DeserializeOwned + Clone + Send + 'static,
    {
        let mut options = options.clone();
        if options.timeout.is_none() {
            options.timeout = Some(self.timeouts.query_timeout);
        }
        QueryExecutor::new(self.engine.clone()).query(statement, &options)
    }

    /// Executes an analytics query.
    pub fn analytics_query<R>(
        &self,
        statement: &str,
        options: &AnalyticsOptions,
    ) -> PendingAnalyticsResult<R>
    where
        R: DeserializeOwned + Clone + Send + 'static,
    {
        let mut options = options.clone();
        if options.timeout.is_none() {
            options.timeout = Some(self.timeouts.analytics_timeout);
        }
        AnalyticsExecutor::new(self.engine.clone()).query(statement, &options)
    }

    /// Executes a full-text search query against the named index.
    pub fn search_query(
        &self,
        index_name: &str,
        query: &serde_json::Value,
        options: &SearchOptions,
    ) -> PendingSearchResult {
        let mut options = options.clone();
        if options.timeout.is_none() {
            options.timeout = Some(self.timeouts.search_timeout);
        }
        SearchExecutor::new(self.engine.clone()).query(index_name, query, &options)
    }

    /// Access to query index management.
    pub fn query_indexes(&self) -> QueryIndexManager<'_> {
        QueryIndexManager::new(self)
    }
}
