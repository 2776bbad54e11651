//! Cancellable cursor-to-channel streaming.
//!
//! This module turns a server-side cursor into a concurrent, pull-based
//! stream of decoded models. One background task per stream drains the
//! cursor; the caller receives three handles: a value stream, an error
//! stream, and a cancel handle.
//!
//! # Backpressure
//!
//! Both channels are rendezvous channels: the drain task blocks in `send`
//! until the consumer is ready, so an unconsumed stream cannot run
//! unboundedly ahead of its reader. Throughput settles on the slower of
//! the producer's decode rate and the consumer's drain rate.
//!
//! # Failure semantics
//!
//! A document that fails to decode is reported on the error stream and the
//! drain continues; a cursor-level failure is reported once and terminates
//! the drain. Both channels close exactly once, only after the drain task
//! has fully stopped, so consumers iterating either stream always
//! terminate.
//!
//! # Cancellation
//!
//! [`StreamCancel::cancel`] stops the drain before natural exhaustion;
//! dropping the handle has the same effect. Cancellation is observed
//! before each cursor advance and while blocked on a send, so at most one
//! already-decoded value can still arrive after the signal. Cancelling a
//! stream that already ran to exhaustion is a harmless no-op.

use futures::{
    Stream,
    channel::{mpsc, oneshot},
    SinkExt,
};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tracing::{debug, warn};

use crate::{
    backend::ModelCursor,
    error::RepositoryError,
    model::{Model, ModelExt, Namespace},
};

/// Stream of successfully decoded models produced by a streaming find.
///
/// Ends when the underlying cursor is exhausted, fails, or the stream is
/// cancelled.
#[derive(Debug)]
pub struct ModelStream<M> {
    receiver: mpsc::Receiver<M>,
}

impl<M> Stream for ModelStream<M> {
    type Item = M;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

/// Stream of errors produced by a streaming find.
///
/// Carries per-document decode failures (after which the value stream
/// continues) and at most one terminal cursor failure (after which both
/// streams end). Every error arrives under the
/// [`FindStream`](RepositoryError::FindStream) marker.
#[derive(Debug)]
pub struct StreamErrors {
    receiver: mpsc::Receiver<RepositoryError>,
}

impl Stream for StreamErrors {
    type Item = RepositoryError;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

/// Handle for stopping a streaming find before exhaustion.
///
/// Consuming the handle with [`cancel`](StreamCancel::cancel) or simply
/// dropping it signals the drain task to stop. Either is safe at any time,
/// including after the stream already ended.
#[derive(Debug)]
pub struct StreamCancel {
    signal: Option<oneshot::Sender<()>>,
}

impl StreamCancel {
    /// Signals the drain task to stop.
    pub fn cancel(mut self) {
        if let Some(signal) = self.signal.take() {
            let _ = signal.send(());
        }
    }
}

/// Spawns the drain task for a live cursor and returns the handle triple.
///
/// Requires a running tokio runtime.
pub(crate) fn spawn<M, C>(
    namespace: Namespace,
    cursor: C,
) -> (ModelStream<M>, StreamErrors, StreamCancel)
where
    M: Model,
    C: ModelCursor,
{
    let (value_tx, value_rx) = mpsc::channel(0);
    let (error_tx, error_rx) = mpsc::channel(0);
    let (cancel_tx, cancel_rx) = oneshot::channel();

    tokio::spawn(drain(namespace, cursor, value_tx, error_tx, cancel_rx));

    (
        ModelStream { receiver: value_rx },
        StreamErrors { receiver: error_rx },
        StreamCancel {
            signal: Some(cancel_tx),
        },
    )
}

fn cancelled(cancel: &mut oneshot::Receiver<()>) -> bool {
    // A dropped sender reads the same as a fired one: stop draining.
    !matches!(cancel.try_recv(), Ok(None))
}

async fn drain<M, C>(
    namespace: Namespace,
    mut cursor: C,
    mut values: mpsc::Sender<M>,
    mut errors: mpsc::Sender<RepositoryError>,
    mut cancel: oneshot::Receiver<()>,
) where
    M: Model,
    C: ModelCursor,
{
    debug!(namespace = %namespace, "draining cursor");

    loop {
        if cancelled(&mut cancel) {
            debug!(namespace = %namespace, "stream cancelled");
            break;
        }

        match cursor.advance().await {
            Ok(true) => {}
            Ok(false) => {
                debug!(namespace = %namespace, "cursor exhausted");
                break;
            }
            Err(err) => {
                // Terminal cursor failure: report once, then stop. A
                // receiver that already hung up makes the send fail, which
                // changes nothing about stopping.
                let _ = errors
                    .send(RepositoryError::FindStream(err))
                    .await;
                break;
            }
        }

        match cursor.current().and_then(M::from_document) {
            Ok(model) => {
                tokio::select! {
                    biased;
                    _ = &mut cancel => {
                        debug!(namespace = %namespace, "stream cancelled");
                        break;
                    }
                    sent = values.send(model) => {
                        if sent.is_err() {
                            // Value receiver dropped; nobody is listening.
                            break;
                        }
                    }
                }
            }
            Err(err) => {
                warn!(namespace = %namespace, error = %err, "skipping undecodable document");

                tokio::select! {
                    biased;
                    _ = &mut cancel => {
                        debug!(namespace = %namespace, "stream cancelled");
                        break;
                    }
                    // A decode failure is not fatal to the stream; if the
                    // error receiver is gone the report is simply dropped.
                    _ = errors.send(RepositoryError::FindStream(err)) => {}
                }
            }
        }
    }

    // Both senders drop here; the channels close exactly once, after the
    // drain has fully stopped.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::ModelCursor,
        error::{StoreError, StoreResult},
    };
    use async_trait::async_trait;
    use bson::{Document, doc};
    use futures::StreamExt;
    use serde::{Deserialize, Serialize};
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
    }

    impl Model for Item {
        fn database_name() -> &'static str {
            "stream_db"
        }

        fn collection_name() -> &'static str {
            "items"
        }
    }

    enum Step {
        Document(Document),
        Fail(&'static str),
    }

    struct ScriptedCursor {
        steps: VecDeque<Step>,
        current: Option<Document>,
    }

    impl ScriptedCursor {
        fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: steps.into_iter().collect(),
                current: None,
            }
        }

        fn documents(count: usize) -> Self {
            Self::new((0..count).map(|i| Step::Document(doc! { "name": format!("item-{i}") })))
        }
    }

    #[async_trait]
    impl ModelCursor for ScriptedCursor {
        async fn advance(&mut self) -> StoreResult<bool> {
            match self.steps.pop_front() {
                None => Ok(false),
                Some(Step::Fail(message)) => Err(StoreError::Cursor(message.into())),
                Some(Step::Document(doc)) => {
                    self.current = Some(doc);
                    Ok(true)
                }
            }
        }

        fn current(&self) -> StoreResult<Document> {
            self.current
                .clone()
                .ok_or_else(|| StoreError::Cursor("cursor is not positioned on a document".into()))
        }
    }

    fn start(cursor: ScriptedCursor) -> (ModelStream<Item>, StreamErrors, StreamCancel) {
        spawn(Namespace::new("stream_db", "items"), cursor)
    }

    #[tokio::test]
    async fn yields_every_document_then_closes() {
        let (values, mut errors, cancel) = start(ScriptedCursor::documents(3));

        let collected: Vec<Item> = values.collect().await;
        assert_eq!(collected.len(), 3);
        assert_eq!(collected[0].name, "item-0");
        assert_eq!(collected[2].name, "item-2");

        assert!(errors.next().await.is_none());
        cancel.cancel();
    }

    #[tokio::test]
    async fn decode_failure_is_reported_and_skipped() {
        let (values, errors, _cancel) = start(ScriptedCursor::new([
            Step::Document(doc! { "name": "ok-1" }),
            Step::Document(doc! { "name": 42 }),
            Step::Document(doc! { "name": "ok-2" }),
        ]));

        let (collected, reported) = futures::join!(
            values.collect::<Vec<Item>>(),
            errors.collect::<Vec<RepositoryError>>(),
        );

        assert_eq!(
            collected
                .iter()
                .map(|item| item.name.as_str())
                .collect::<Vec<_>>(),
            ["ok-1", "ok-2"],
        );
        assert_eq!(reported.len(), 1);
        assert!(matches!(
            reported[0].cause(),
            StoreError::Serialization(_)
        ));
    }

    #[tokio::test]
    async fn cursor_failure_terminates_with_one_error() {
        let (values, errors, _cancel) = start(ScriptedCursor::new([
            Step::Document(doc! { "name": "only" }),
            Step::Fail("connection reset"),
        ]));

        let (collected, reported) = futures::join!(
            values.collect::<Vec<Item>>(),
            errors.collect::<Vec<RepositoryError>>(),
        );

        assert_eq!(collected.len(), 1);
        assert_eq!(reported.len(), 1);
        assert!(matches!(reported[0].cause(), StoreError::Cursor(_)));
    }

    #[tokio::test]
    async fn cancellation_stops_production_promptly() {
        let (mut values, _errors, cancel) = start(ScriptedCursor::documents(100));

        for _ in 0..5 {
            values.next().await.expect("value before cancellation");
        }

        cancel.cancel();

        // The producer may already be parked in a send with one decoded
        // value; nothing beyond that single value may arrive.
        let mut trailing = 0;
        while values.next().await.is_some() {
            trailing += 1;
        }
        assert!(trailing <= 1, "got {trailing} values after cancellation");
    }

    #[tokio::test]
    async fn dropping_the_cancel_handle_cancels() {
        let (values, _errors, cancel) = start(ScriptedCursor::documents(100));
        drop(cancel);

        let collected: Vec<Item> = values.collect().await;
        assert!(
            collected.len() <= 1,
            "got {} values after handle drop",
            collected.len()
        );
    }

    #[tokio::test]
    async fn dropping_the_value_stream_stops_the_drain() {
        let (values, mut errors, _cancel) = start(ScriptedCursor::documents(100));
        drop(values);

        // The drain notices the hangup and stops; the error channel closes
        // with it.
        assert!(errors.next().await.is_none());
    }

    #[tokio::test]
    async fn cancelling_after_exhaustion_is_a_no_op() {
        let (values, mut errors, cancel) = start(ScriptedCursor::documents(2));

        let collected: Vec<Item> = values.collect().await;
        assert_eq!(collected.len(), 2);
        assert!(errors.next().await.is_none());

        cancel.cancel();
    }
}
