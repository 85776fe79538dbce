//! # quarry-client
//!
//! Quarry 数据平台的异步 Rust 客户端运行时：类型化请求进，流式行与类型化错误出。
//!
//! An asynchronous client runtime for the Quarry data platform. This crate
//! is the boundary layer between application code and the native execution
//! engine: it accepts typed requests, forwards them to the engine, and turns
//! the engine's single completion callback into an awaitable typed result,
//! an ordered stream of rows, and a closed taxonomy of typed errors — all
//! under caller-controlled time budgets.
//!
//! ## Overview
//!
//! - **Dual-mode results**: every request returns a
//!   [`StreamingResult`](streaming::StreamingResult) that can be awaited for
//!   the aggregated result or subscribed to for row/meta events in emission
//!   order.
//! - **Typed errors**: every engine failure classifies into exactly one
//!   [`ErrorKind`] with a structured, loggable [`ErrorContext`].
//! - **Deadline budgets**: multi-step operations share one shrink-only
//!   [`DeadlineBudget`] so retries can never exceed the caller's timeout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry_client::{Cluster, ClusterOptions, QueryOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> quarry_client::Result<()> {
//!     let engine: Arc<dyn quarry_client::Engine> = todo!(); // the native engine
//!     let cluster = Cluster::new(engine, ClusterOptions::default());
//!
//!     let result = cluster
//!         .query::<serde_json::Value>("SELECT 1", &QueryOptions::default())
//!         .await?;
//!     println!("{} rows, status {:?}", result.rows.len(), result.meta.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cluster`] | Caller-facing facade owning the engine handle |
//! | [`executor`] | Result producer adapters, one per request family |
//! | [`streaming`] | The dual-mode streaming result handle |
//! | [`classify`] | The error classification engine |
//! | [`error`] / [`error_context`] | The typed error taxonomy and contexts |
//! | [`deadline`] | Shared time budgets for multi-step operations |
//! | [`management`] | Query index management, including budgeted watches |
//! | [`engine`] | The narrow interface to the native execution engine |
//! | [`config`] | Timeout configuration and profiles |
//! | [`types`] | Options, results, and metadata vocabularies |

pub mod classify;
pub mod cluster;
pub mod config;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod error_context;
pub mod executor;
pub mod logging;
pub mod management;
pub mod streaming;
pub mod types;
pub mod utils;

// Re-export the main types for convenience.
pub use classify::classify;
pub use cluster::Cluster;
pub use config::{ClusterOptions, ConfigProfile, TimeoutConfig};
pub use deadline::DeadlineBudget;
pub use engine::{Completion, Engine, EnvelopeTag, ErrorEnvelope, RawResponse};
pub use error::{EngineFailure, Error, ErrorCause, ErrorDomain, ErrorKind};
pub use error_context::ErrorContext;
pub use streaming::{ResultEvent, ResultEvents, StreamingResult};
pub use types::analytics::{AnalyticsOptions, AnalyticsResult, AnalyticsStatus};
pub use types::query::{
    QueryOptions, QueryParameters, QueryResult, QueryScanConsistency, QueryStatus,
};
pub use types::search::{SearchOptions, SearchResult, SearchRow};

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, Error>;
