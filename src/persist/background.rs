//! Off-thread snapshot writer.
//!
//! `BackgroundStorage` wraps another backend and moves I/O onto a single
//! worker thread fed by a bounded channel. Jobs run in submission order, so
//! a later save always lands after an earlier one.
//!
//! `store` returns only once the worker has the backend's answer: a save is
//! never reported before it is durable. Removes are queued without waiting;
//! `load` flushes first and therefore observes every job submitted before it.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};

use crate::config::WizardConfig;
use crate::error::PersistError;

use super::storage::SnapshotStorage;

enum Job {
    Store {
        key: String,
        blob: Vec<u8>,
        reply: Sender<Result<(), PersistError>>,
    },
    Remove { key: String },
    Flush { reply: Sender<()> },
}

pub struct BackgroundStorage<S: SnapshotStorage + 'static> {
    inner: Arc<S>,
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: SnapshotStorage + 'static> BackgroundStorage<S> {
    /// Starts the writer thread.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Storage` if the thread cannot be spawned.
    pub fn start(inner: Arc<S>, queue_capacity: usize) -> Result<Self, PersistError> {
        let (tx, rx) = bounded::<Job>(queue_capacity.max(1));
        let backend = Arc::clone(&inner);
        let worker = thread::Builder::new()
            .name("formwizard-snapshot-writer".to_string())
            .spawn(move || {
                for job in rx {
                    match job {
                        Job::Store { key, blob, reply } => {
                            let result = backend.store(&key, &blob);
                            if let Err(err) = &result {
                                tracing::warn!(%key, error = %err, "background snapshot write failed");
                            }
                            let _ = reply.send(result);
                        }
                        Job::Remove { key } => {
                            if let Err(err) = backend.remove(&key) {
                                tracing::warn!(%key, error = %err, "background snapshot remove failed");
                            }
                        }
                        Job::Flush { reply } => {
                            let _ = reply.send(());
                        }
                    }
                }
            })
            .map_err(|e| PersistError::storage(format!("spawn snapshot writer: {e}")))?;

        Ok(Self {
            inner,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Starts the writer thread with the queue capacity from `config`.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Storage` if the thread cannot be spawned.
    pub fn with_config(inner: Arc<S>, config: &WizardConfig) -> Result<Self, PersistError> {
        Self::start(inner, config.background_queue_capacity)
    }

    /// The wrapped backend.
    #[must_use]
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Blocks until every job submitted so far has run.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Storage` if the writer thread has stopped.
    pub fn flush(&self) -> Result<(), PersistError> {
        let (reply, done) = bounded(1);
        self.submit(Job::Flush { reply })?;
        done.recv().map_err(|_| stopped())
    }

    fn submit(&self, job: Job) -> Result<(), PersistError> {
        let tx = self.tx.as_ref().ok_or_else(stopped)?;
        tx.send(job).map_err(|_| stopped())
    }
}

fn stopped() -> PersistError {
    PersistError::storage("snapshot writer stopped")
}

impl<S: SnapshotStorage + 'static> SnapshotStorage for BackgroundStorage<S> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        self.flush()?;
        self.inner.load(key)
    }

    fn store(&self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        let (reply, done) = bounded(1);
        self.submit(Job::Store {
            key: key.to_string(),
            blob: blob.to_vec(),
            reply,
        })?;
        done.recv().map_err(|_| stopped())?
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.submit(Job::Remove { key: key.to_string() })
    }
}

impl<S: SnapshotStorage + 'static> Drop for BackgroundStorage<S> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued jobs and exit.
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStorage;

    #[test]
    fn writes_land_in_order() {
        let memory = Arc::new(MemoryStorage::new());
        let background = BackgroundStorage::start(Arc::clone(&memory), 4).unwrap();
        for i in 0..20u8 {
            background.store("draft", &[i]).unwrap();
        }
        assert_eq!(background.load("draft").unwrap(), Some(vec![19]));
        assert_eq!(memory.writes(), 20);
    }

    struct RejectingStorage;

    impl SnapshotStorage for RejectingStorage {
        fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, PersistError> {
            Ok(None)
        }

        fn store(&self, _key: &str, _blob: &[u8]) -> Result<(), PersistError> {
            Err(PersistError::storage("quota exceeded"))
        }

        fn remove(&self, _key: &str) -> Result<(), PersistError> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_reach_the_caller() {
        let background = BackgroundStorage::start(Arc::new(RejectingStorage), 4).unwrap();
        let err = background.store("draft", b"x").unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        background.flush().unwrap();
    }

    #[test]
    fn drop_drains_queue() {
        let memory = Arc::new(MemoryStorage::new());
        {
            let background = BackgroundStorage::start(Arc::clone(&memory), 2).unwrap();
            background.store("a", b"1").unwrap();
            background.store("b", b"2").unwrap();
            background.remove("a").unwrap();
        }
        assert_eq!(memory.load("a").unwrap(), None);
        assert_eq!(memory.load("b").unwrap().as_deref(), Some(&b"2"[..]));
    }
}
