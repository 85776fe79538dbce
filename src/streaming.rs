//! 双模式结果句柄：单次引擎回调到「可等待聚合结果 + 有序事件流」的桥接。
//!
//! The streaming result handle.
//!
//! A [`StreamingResult`] mediates between exactly one engine completion and
//! its consumers. It can be consumed two ways:
//!
//! - **As a future.** The handle implements [`IntoFuture`]; awaiting it
//!   yields the aggregated typed result built from the buffered rows and
//!   metadata, or the classified error.
//! - **As an event sequence.** [`events`](StreamingResult::events) returns an
//!   ordered stream of [`ResultEvent`]s. Subscribing switches the handle into
//!   streaming mode: rows are no longer buffered for aggregation and the
//!   future, if awaited afterwards, resolves to an invalid-argument error.
//!
//! Within one handle events always fire in the order `row* meta? end` (or
//! `error end` on the failure path), and exactly one `end` fires. The state
//! machine is `Pending → Streaming → Completed | Failed`; terminal states are
//! idempotent to observe and emission into a terminal handle is ignored with
//! a warning — the engine guarantees a single completion, but the handle does
//! not rely on it.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, watch};

use crate::error::{Error, ErrorKind};

/// One entry in the ordered event sequence produced by a result handle.
#[derive(Debug, Clone)]
pub enum ResultEvent<R, M> {
    /// One decoded row, in response order.
    Row(R),
    /// The translated metadata record; always the immediate predecessor of
    /// [`ResultEvent::End`] on the success path.
    Meta(M),
    /// The classified error; only on the failure path, before `End`.
    Error(Error),
    /// The terminal event. Fires exactly once per handle.
    End,
}

/// Observable lifecycle of a [`StreamingResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Streaming,
    Completed,
    Failed,
}

impl Phase {
    fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }
}

type Aggregate<R, M, T> = Box<dyn FnOnce(Vec<R>, M) -> T + Send>;

struct Inner<R, M, T> {
    phase: Phase,
    rows: Vec<R>,
    meta: Option<M>,
    error: Option<Error>,
    subscribers: Vec<mpsc::UnboundedSender<ResultEvent<R, M>>>,
    aggregate: Option<Aggregate<R, M, T>>,
    outcome: Option<Result<T, Error>>,
    /// Set once a subscriber exists; the aggregate path is then off.
    abandoned: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A poisoned lock only means a panic elsewhere; the state itself is
    // still consistent enough to report.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Creates a connected handle/emitter pair. The aggregation function builds
/// the awaited result once all rows and the metadata have been observed.
pub(crate) fn channel<R, M, T>(
    aggregate: impl FnOnce(Vec<R>, M) -> T + Send + 'static,
) -> (StreamingResult<R, M, T>, ResultEmitter<R, M, T>)
where
    R: Clone + Send + 'static,
    M: Clone + Send + 'static,
    T: Send + 'static,
{
    let inner = Arc::new(Mutex::new(Inner {
        phase: Phase::Pending,
        rows: Vec::new(),
        meta: None,
        error: None,
        subscribers: Vec::new(),
        aggregate: Some(Box::new(aggregate)),
        outcome: None,
        abandoned: false,
    }));
    let (done_tx, done_rx) = watch::channel(false);

    (
        StreamingResult {
            inner: inner.clone(),
            done: done_rx,
        },
        ResultEmitter {
            inner,
            done: done_tx,
        },
    )
}

/// The dual-mode result handle returned to callers. See the module docs.
pub struct StreamingResult<R, M, T> {
    inner: Arc<Mutex<Inner<R, M, T>>>,
    done: watch::Receiver<bool>,
}

impl<R, M, T> StreamingResult<R, M, T>
where
    R: Clone + Send + 'static,
    M: Clone + Send + 'static,
    T: Send + 'static,
{
    /// Subscribes to the ordered event sequence.
    ///
    /// Subscribers registered before or during emission receive every event
    /// in emission order. A subscriber registered after the handle is
    /// terminal receives nothing — past events are not replayed; only the
    /// awaited aggregate outlives emission.
    pub fn events(&self) -> ResultEvents<R, M> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = lock(&self.inner);
        if !inner.phase.is_terminal() {
            inner.abandoned = true;
            inner.aggregate = None;
            inner.rows.clear();
            inner.subscribers.push(tx);
        }
        ResultEvents { rx }
    }
}

impl<R, M, T> IntoFuture for StreamingResult<R, M, T>
where
    R: Clone + Send + 'static,
    M: Clone + Send + 'static,
    T: Send + 'static,
{
    type Output = Result<T, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        let inner = self.inner;
        let mut done = self.done;
        Box::pin(async move {
            loop {
                {
                    let mut guard = lock(&inner);
                    if guard.abandoned {
                        return Err(Error::with_message(
                            ErrorKind::InvalidArgument,
                            "result was already consumed as an event stream",
                        ));
                    }
                    if let Some(outcome) = guard.outcome.take() {
                        return outcome;
                    }
                }
                if done.changed().await.is_err() {
                    // The emitter is gone; its drop guard has sealed the
                    // state, so whatever is there now is final.
                    let mut guard = lock(&inner);
                    return match guard.outcome.take() {
                        Some(outcome) => outcome,
                        None => Err(Error::with_message(
                            ErrorKind::RequestCanceled,
                            "the engine abandoned the request without completing it",
                        )),
                    };
                }
            }
        })
    }
}

/// The ordered event sequence of one [`StreamingResult`].
pub struct ResultEvents<R, M> {
    rx: mpsc::UnboundedReceiver<ResultEvent<R, M>>,
}

impl<R, M> Stream for ResultEvents<R, M> {
    type Item = ResultEvent<R, M>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// The write half of a result handle, owned by the single completion
/// callback registered with the engine.
pub(crate) struct ResultEmitter<R, M, T> {
    inner: Arc<Mutex<Inner<R, M, T>>>,
    done: watch::Sender<bool>,
}

impl<R, M, T> ResultEmitter<R, M, T>
where
    R: Clone + Send + 'static,
    M: Clone + Send + 'static,
    T: Send + 'static,
{
    /// Emits one row event.
    pub fn row(&self, row: R) {
        let mut inner = lock(&self.inner);
        if inner.phase.is_terminal() || inner.error.is_some() || inner.meta.is_some() {
            tracing::warn!("row emitted out of order; ignored");
            debug_assert!(!inner.phase.is_terminal(), "row after terminal event");
            return;
        }
        inner.phase = Phase::Streaming;
        inner
            .subscribers
            .retain(|tx| tx.send(ResultEvent::Row(row.clone())).is_ok());
        if !inner.abandoned {
            inner.rows.push(row);
        }
    }

    /// Emits the metadata event. At most one per handle, after all rows.
    pub fn meta(&self, meta: M) {
        let mut inner = lock(&self.inner);
        if inner.phase.is_terminal() || inner.error.is_some() || inner.meta.is_some() {
            tracing::warn!("metadata emitted out of order; ignored");
            debug_assert!(!inner.phase.is_terminal(), "meta after terminal event");
            return;
        }
        inner
            .subscribers
            .retain(|tx| tx.send(ResultEvent::Meta(meta.clone())).is_ok());
        inner.meta = Some(meta);
    }

    /// Emits the error event, putting the handle on the failure path.
    pub fn fail(&self, error: Error) {
        let mut inner = lock(&self.inner);
        if inner.phase.is_terminal() || inner.error.is_some() {
            tracing::warn!("error emitted out of order; ignored");
            debug_assert!(!inner.phase.is_terminal(), "error after terminal event");
            return;
        }
        inner
            .subscribers
            .retain(|tx| tx.send(ResultEvent::Error(error.clone())).is_ok());
        inner.error = Some(error);
    }

    /// Emits the terminal event and seals the handle.
    pub fn end(&self) {
        let mut inner = lock(&self.inner);
        if inner.phase.is_terminal() {
            tracing::warn!("duplicate end emission ignored");
            debug_assert!(false, "end emitted twice");
            return;
        }

        if let Some(error) = inner.error.take() {
            inner.phase = Phase::Failed;
            inner.outcome = Some(Err(error));
        } else {
            inner.phase = Phase::Completed;
            let rows = std::mem::take(&mut inner.rows);
            match (inner.aggregate.take(), inner.meta.take()) {
                (Some(aggregate), Some(meta)) => {
                    inner.outcome = Some(Ok(aggregate(rows, meta)));
                }
                (Some(_), None) => {
                    // The engine completed without metadata or an error;
                    // nothing coherent can be aggregated.
                    inner.outcome = Some(Err(Error::with_message(
                        ErrorKind::InvalidArgument,
                        "result completed without metadata",
                    )));
                }
                // Streaming mode: nothing to aggregate.
                (None, _) => {}
            }
        }

        for tx in inner.subscribers.drain(..) {
            let _ = tx.send(ResultEvent::End);
        }
        drop(inner);
        let _ = self.done.send(true);
    }
}

impl<R, M, T> Drop for ResultEmitter<R, M, T> {
    fn drop(&mut self) {
        let needs_seal = !lock(&self.inner).phase.is_terminal();
        if needs_seal {
            // The engine broke its one-callback guarantee; fail the handle
            // rather than leaving consumers waiting forever.
            let mut inner = lock(&self.inner);
            if !inner.phase.is_terminal() {
                inner.phase = Phase::Failed;
                inner.outcome = Some(Err(Error::with_message(
                    ErrorKind::RequestCanceled,
                    "the engine abandoned the request without completing it",
                )));
                for tx in inner.subscribers.drain(..) {
                    let _ = tx.send(ResultEvent::End);
                }
            }
            drop(inner);
            let _ = self.done.send(true);
        }
    }
}
