//! Shared test support: a scripted in-memory engine.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use quarry_client::engine::{
    AnalyticsEngineRequest, Completion, CompletionHandler, Engine, ErrorEnvelope,
    QueryEngineRequest, RawResponse, SearchEngineRequest,
};

/// An engine that replays a scripted sequence of completions and records
/// every request it receives. Completions are delivered asynchronously, the
/// way the real engine does.
pub struct ScriptedEngine {
    completions: Mutex<VecDeque<Completion>>,
    repeat_last: bool,
    pub query_requests: Mutex<Vec<QueryEngineRequest>>,
    pub analytics_requests: Mutex<Vec<AnalyticsEngineRequest>>,
    pub search_requests: Mutex<Vec<SearchEngineRequest>>,
}

impl ScriptedEngine {
    pub fn new(completions: Vec<Completion>) -> Arc<Self> {
        Arc::new(Self {
            completions: Mutex::new(completions.into()),
            repeat_last: false,
            query_requests: Mutex::new(Vec::new()),
            analytics_requests: Mutex::new(Vec::new()),
            search_requests: Mutex::new(Vec::new()),
        })
    }

    /// Like [`new`](Self::new), but keeps replaying the final completion
    /// once the script runs out.
    pub fn repeating(completions: Vec<Completion>) -> Arc<Self> {
        Arc::new(Self {
            completions: Mutex::new(completions.into()),
            repeat_last: true,
            query_requests: Mutex::new(Vec::new()),
            analytics_requests: Mutex::new(Vec::new()),
            search_requests: Mutex::new(Vec::new()),
        })
    }

    fn next_completion(&self) -> Completion {
        let mut queue = self.completions.lock().unwrap();
        let next = queue.pop_front().expect("script exhausted");
        if self.repeat_last && queue.is_empty() {
            queue.push_back(next.clone());
        }
        next
    }

    fn dispatch(&self, completion_handler: CompletionHandler) {
        let next = self.next_completion();
        tokio::spawn(async move { completion_handler(next) });
    }
}

impl Engine for ScriptedEngine {
    fn query(&self, request: QueryEngineRequest, completion: CompletionHandler) {
        self.query_requests.lock().unwrap().push(request);
        self.dispatch(completion);
    }

    fn analytics_query(&self, request: AnalyticsEngineRequest, completion: CompletionHandler) {
        self.analytics_requests.lock().unwrap().push(request);
        self.dispatch(completion);
    }

    fn search_query(&self, request: SearchEngineRequest, completion: CompletionHandler) {
        self.search_requests.lock().unwrap().push(request);
        self.dispatch(completion);
    }
}

/// A successful completion with the given encoded rows and metadata.
pub fn success(rows: &[serde_json::Value], meta: serde_json::Value) -> Completion {
    Completion::Success(RawResponse {
        rows: rows.iter().map(|r| r.to_string()).collect(),
        meta: meta.to_string(),
    })
}

/// A successful completion from pre-encoded row and metadata strings.
pub fn success_raw(rows: Vec<String>, meta: String) -> Completion {
    Completion::Success(RawResponse { rows, meta })
}

/// A failed completion carrying the given envelope.
pub fn failure(envelope: ErrorEnvelope) -> Completion {
    Completion::Failure(Box::new(envelope))
}

/// A catalog response listing indexes with the given names and states.
pub fn index_catalog(entries: &[(&str, &str)]) -> Completion {
    let rows: Vec<serde_json::Value> = entries
        .iter()
        .map(|(name, state)| {
            serde_json::json!({
                "name": name,
                "is_primary": *name == "#primary",
                "using": "gsi",
                "state": state,
                "keyspace_id": "main"
            })
        })
        .collect();
    success(
        &rows,
        serde_json::json!({"request_id": "r", "status": "success"}),
    )
}
