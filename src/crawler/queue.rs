//! Bounded work queues shared by a pool of workers
//!
//! A [`WorkQueue`] is a bounded tokio mpsc channel whose receiver is shared
//! behind an async mutex, so any number of workers can pull from it. Besides
//! the ordinary blocking [`push`](WorkQueue::push) it offers
//! [`push_detached`](WorkQueue::push_detached) for workers that re-enqueue
//! into a queue they also drain: waiting for space there could deadlock the
//! pool, so a full queue hands the item to a short-lived task instead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};

/// A bounded multi-consumer FIFO queue
pub struct WorkQueue<T> {
    name: &'static str,
    tx: mpsc::Sender<T>,
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
    /// Items handed to a detached sender that have not reached the channel yet
    in_transit: Arc<AtomicUsize>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
            in_transit: Arc::clone(&self.in_transit),
        }
    }
}

impl<T: Send + 'static> WorkQueue<T> {
    /// Creates a queue holding at most `capacity` items
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            name,
            tx,
            rx: Arc::new(Mutex::new(rx)),
            in_transit: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Name used in log output
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Pushes an item, waiting while the queue is full
    pub async fn push(&self, item: T) {
        if self.tx.send(item).await.is_err() {
            tracing::debug!("{} queue closed, dropping item", self.name);
        }
    }

    /// Pushes an item without ever blocking the caller
    ///
    /// If the queue has room the item goes in immediately; otherwise a
    /// separate task waits for room. Must be called from within a tokio
    /// runtime.
    pub fn push_detached(&self, item: T) {
        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(item)) => {
                let tx = self.tx.clone();
                let in_transit = Arc::clone(&self.in_transit);
                let name = self.name;
                in_transit.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    if tx.send(item).await.is_err() {
                        tracing::debug!("{} queue closed, dropping item", name);
                    }
                    in_transit.fetch_sub(1, Ordering::SeqCst);
                });
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("{} queue closed, dropping item", self.name);
            }
        }
    }

    /// Waits for the next item
    ///
    /// Returns `None` only once every sender is gone, which cannot happen
    /// while the queue itself is alive.
    pub async fn pop(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    /// Items waiting in the queue, including detached pushes still in transit
    pub fn len(&self) -> usize {
        let queued = self.tx.max_capacity() - self.tx.capacity();
        queued + self.in_transit.load(Ordering::SeqCst)
    }

    /// Returns true if nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of items the channel holds
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}
