//! Async repository contract and the entity row stream.

use crate::entity::EntityRecord;
use crate::error::AppError;
use crate::page::Pageable;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Rows buffered in flight per stream; the producer suspends once the
/// consumer stops pulling.
pub(crate) const STREAM_BUFFER: usize = 16;

/// Generic async repository for one entity kind.
///
/// Uses RPITIT (return-position `impl Trait` in traits) — no `async-trait`
/// needed. Every operation issues exactly one statement against the store;
/// absence is an empty result, not an error. No cross-call state, no retry,
/// no transaction wrapping.
pub trait EntityRepository: Send + Sync {
    /// Lazy, restartable-per-call stream of all rows, optionally paged.
    /// Unordered unless the pageable names a sort field.
    fn find_all(&self, pageable: Option<&Pageable>) -> EntityStream;

    fn find_by_id(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<EntityRecord>, AppError>> + Send;

    /// Insert when the record has no identity; update in place keyed on the
    /// identity otherwise. An update that matches no row yields `None`.
    fn save(
        &self,
        record: &EntityRecord,
    ) -> impl Future<Output = Result<Option<EntityRecord>, AppError>> + Send;

    fn exists_by_id(&self, id: i64) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Removes the row if present; absence is not an error.
    fn delete_by_id(&self, id: i64) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Pull-paced stream of mapped entities backed by a bounded channel.
///
/// Dropping the stream hangs up the channel, which stops the producer and
/// abandons the in-flight query — there is no transaction to roll back.
pub struct EntityStream {
    rx: mpsc::Receiver<Result<EntityRecord, AppError>>,
}

impl EntityStream {
    pub(crate) fn channel(
        capacity: usize,
    ) -> (mpsc::Sender<Result<EntityRecord, AppError>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// A pre-filled stream over already-materialized records.
    pub fn from_records(records: Vec<EntityRecord>) -> Self {
        let (tx, stream) = Self::channel(records.len().max(1));
        for record in records {
            if tx.try_send(Ok(record)).is_err() {
                break;
            }
        }
        stream
    }
}

impl Stream for EntityStream {
    type Item = Result<EntityRecord, AppError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn from_records_yields_all_then_ends() {
        let records = vec![EntityRecord::with_id(1), EntityRecord::with_id(2)];
        let stream = EntityStream::from_records(records.clone());
        let collected: Vec<_> = stream.try_collect().await.unwrap();
        assert_eq!(collected, records);
    }

    #[tokio::test]
    async fn empty_stream_ends_immediately() {
        let stream = EntityStream::from_records(Vec::new());
        let collected: Vec<EntityRecord> = stream.try_collect().await.unwrap();
        assert!(collected.is_empty());
    }
}
