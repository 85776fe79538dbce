//! Management planes built on top of the request adapters.

pub mod query_index;

pub use query_index::{
    BuildQueryIndexOptions, CreateQueryIndexOptions, DropQueryIndexOptions,
    GetAllQueryIndexesOptions, QueryIndex, QueryIndexManager, WatchQueryIndexOptions,
};
