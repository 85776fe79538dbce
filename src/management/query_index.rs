//! Query index management.
//!
//! All operations here are statements against the index catalog, routed
//! through the regular query adapter. [`QueryIndexManager::watch_indexes`] is
//! the budgeted polling loop: one caller-supplied timeout is shared across
//! every catalog fetch and every wait via a
//! [`DeadlineBudget`](crate::deadline::DeadlineBudget).

use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::cluster::Cluster;
use crate::deadline::DeadlineBudget;
use crate::error::{Error, ErrorKind};
use crate::types::query::QueryOptions;
use crate::Result;

/// One index registered in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryIndex {
    pub name: String,
    #[serde(default)]
    pub is_primary: bool,
    /// The index backend, e.g. `"gsi"`.
    #[serde(default, rename = "using")]
    pub index_type: String,
    /// Lifecycle state as reported by the catalog, e.g. `"deferred"`,
    /// `"building"`, `"online"`.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub keyspace_id: String,
    #[serde(default)]
    pub index_key: Vec<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GetAllQueryIndexesOptions {
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateQueryIndexOptions {
    /// Succeed silently when the index already exists.
    pub ignore_if_exists: bool,
    pub num_replicas: Option<u32>,
    /// Register the index without building it; see
    /// [`QueryIndexManager::build_deferred_indexes`].
    pub deferred: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct DropQueryIndexOptions {
    /// Succeed silently when the index does not exist.
    pub ignore_if_not_exists: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildQueryIndexOptions {
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct WatchQueryIndexOptions {
    /// Also wait for the primary index.
    pub watch_primary: bool,
}

/// Manages query indexes of a cluster.
pub struct QueryIndexManager<'a> {
    cluster: &'a Cluster,
}

impl<'a> QueryIndexManager<'a> {
    pub(crate) fn new(cluster: &'a Cluster) -> Self {
        Self { cluster }
    }

    /// Fetches all indexes registered for a bucket.
    pub async fn get_all_indexes(
        &self,
        bucket_name: &str,
        options: &GetAllQueryIndexesOptions,
    ) -> Result<Vec<QueryIndex>> {
        let statement = "SELECT idx.* FROM system:indexes AS idx \
             WHERE ((bucket_id IS MISSING AND keyspace_id = $bucketName) \
             OR bucket_id = $bucketName) AND `using` = \"gsi\" \
             ORDER BY is_primary DESC, name ASC";

        let mut named = std::collections::HashMap::new();
        named.insert("bucketName".to_string(), Some(bucket_name.into()));
        let mut query_options = QueryOptions::default()
            .read_only(true)
            .parameters(crate::types::query::QueryParameters::Named(named));
        query_options.timeout = options.timeout;

        let result = self
            .cluster
            .query::<QueryIndex>(statement, &query_options)
            .await?;
        Ok(result.rows)
    }

    /// Creates a secondary index.
    pub async fn create_index(
        &self,
        bucket_name: &str,
        index_name: &str,
        keys: &[String],
        options: &CreateQueryIndexOptions,
    ) -> Result<()> {
        let mut statement = format!(
            "CREATE INDEX {} ON {} ({})",
            escape_identifier(index_name),
            escape_identifier(bucket_name),
            keys.iter()
                .map(|k| escape_identifier(k))
                .collect::<Vec<_>>()
                .join(", ")
        );
        append_with_clause(&mut statement, options);

        let run = self.run(&statement, options.timeout).await;
        match run {
            Err(e) if options.ignore_if_exists && e.kind() == ErrorKind::IndexExists => Ok(()),
            other => other.map(|_| ()),
        }
    }

    /// Creates the primary index for a bucket.
    pub async fn create_primary_index(
        &self,
        bucket_name: &str,
        options: &CreateQueryIndexOptions,
    ) -> Result<()> {
        let mut statement = format!(
            "CREATE PRIMARY INDEX ON {}",
            escape_identifier(bucket_name)
        );
        append_with_clause(&mut statement, options);

        let run = self.run(&statement, options.timeout).await;
        match run {
            Err(e) if options.ignore_if_exists && e.kind() == ErrorKind::IndexExists => Ok(()),
            other => other.map(|_| ()),
        }
    }

    /// Drops a secondary index.
    pub async fn drop_index(
        &self,
        bucket_name: &str,
        index_name: &str,
        options: &DropQueryIndexOptions,
    ) -> Result<()> {
        let statement = format!(
            "DROP INDEX {}.{}",
            escape_identifier(bucket_name),
            escape_identifier(index_name)
        );

        let run = self.run(&statement, options.timeout).await;
        match run {
            Err(e) if options.ignore_if_not_exists && e.kind() == ErrorKind::IndexNotFound => {
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    /// Drops the primary index of a bucket.
    pub async fn drop_primary_index(
        &self,
        bucket_name: &str,
        options: &DropQueryIndexOptions,
    ) -> Result<()> {
        let statement = format!("DROP PRIMARY INDEX ON {}", escape_identifier(bucket_name));

        let run = self.run(&statement, options.timeout).await;
        match run {
            Err(e) if options.ignore_if_not_exists && e.kind() == ErrorKind::IndexNotFound => {
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    /// Kicks off the build of all deferred indexes on a bucket and returns
    /// their names. Building is asynchronous on the server; pair with
    /// [`watch_indexes`](Self::watch_indexes) to wait for completion.
    pub async fn build_deferred_indexes(
        &self,
        bucket_name: &str,
        options: &BuildQueryIndexOptions,
    ) -> Result<Vec<String>> {
        let budget = DeadlineBudget::new(options.timeout);

        let all = self
            .get_all_indexes(
                bucket_name,
                &GetAllQueryIndexesOptions {
                    timeout: budget.remaining(),
                },
            )
            .await?;
        let deferred: Vec<String> = all
            .iter()
            .filter(|idx| idx.state == "deferred" || idx.state == "pending")
            .map(|idx| idx.name.clone())
            .collect();

        if deferred.is_empty() {
            return Ok(deferred);
        }

        let statement = format!(
            "BUILD INDEX ON {} ({})",
            escape_identifier(bucket_name),
            deferred
                .iter()
                .map(|name| escape_identifier(name))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.run(&statement, budget.remaining()).await?;
        Ok(deferred)
    }

    /// Waits until every named index (plus the primary index when
    /// requested) reports online, polling the catalog under one shared
    /// deadline budget.
    ///
    /// The poll interval starts at 50ms and grows by 500ms per unsuccessful
    /// round up to 1s; both the interval and every catalog fetch are clamped
    /// to the remaining budget. Exhausting the budget fails with
    /// [`ErrorKind::IndexNotReady`], distinct from the timeout kinds a
    /// single fetch can produce.
    pub async fn watch_indexes(
        &self,
        bucket_name: &str,
        index_names: &[String],
        timeout: Duration,
        options: &WatchQueryIndexOptions,
    ) -> Result<()> {
        let mut watched: Vec<String> = index_names.to_vec();
        if options.watch_primary {
            watched.push("#primary".to_string());
        }

        let budget = DeadlineBudget::new(Some(timeout));
        let mut interval = Duration::from_millis(50);

        loop {
            let indexes = self
                .get_all_indexes(
                    bucket_name,
                    &GetAllQueryIndexesOptions {
                        timeout: budget.remaining(),
                    },
                )
                .await?;

            let online: HashSet<&str> = indexes
                .iter()
                .filter(|idx| idx.state == "online")
                .map(|idx| idx.name.as_str())
                .collect();
            if watched.iter().all(|name| online.contains(name.as_str())) {
                return Ok(());
            }

            let mut wait = interval;
            if let Some(left) = budget.remaining() {
                wait = wait.min(left);
            }
            if wait.is_zero() {
                return Err(Error::with_message(
                    ErrorKind::IndexNotReady,
                    "indexes were not ready within the allotted time",
                ));
            }

            tracing::debug!(
                bucket_name,
                waiting = ?wait,
                online = online.len(),
                expected = watched.len(),
                "indexes not yet online"
            );
            tokio::time::sleep(wait).await;

            // Additive backoff: polls are cheap and latency-insensitive.
            interval = (interval + Duration::from_millis(500)).min(Duration::from_millis(1000));
        }
    }

    async fn run(&self, statement: &str, timeout: Option<Duration>) -> Result<()> {
        let mut options = QueryOptions::default();
        options.timeout = timeout;
        self.cluster
            .query::<serde_json::Value>(statement, &options)
            .await?;
        Ok(())
    }
}

fn escape_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn append_with_clause(statement: &mut String, options: &CreateQueryIndexOptions) {
    let mut with = serde_json::Map::new();
    if options.deferred {
        with.insert("defer_build".to_string(), true.into());
    }
    if let Some(replicas) = options.num_replicas {
        with.insert("num_replica".to_string(), replicas.into());
    }
    if !with.is_empty() {
        statement.push_str(" WITH ");
        statement.push_str(&serde_json::Value::Object(with).to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_backtick_escaped() {
        assert_eq!(escape_identifier("travel"), "`travel`");
        assert_eq!(escape_identifier("odd`name"), "`odd``name`");
    }

    #[test]
    fn with_clause_collects_build_options() {
        let mut statement = String::from("CREATE INDEX `i` ON `b` (`k`)");
        append_with_clause(
            &mut statement,
            &CreateQueryIndexOptions {
                deferred: true,
                num_replicas: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(
            statement,
            "CREATE INDEX `i` ON `b` (`k`) WITH {\"defer_build\":true,\"num_replica\":2}"
        );
    }
}
