use crate::error::StoreError;
use crate::store::{OrderedStore, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

/// Retry policy for [`Database::transact`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct TransactSettings {
    /// Attempts after the first one before giving up.
    #[builder(default = 100)]
    pub max_retries: u32,
    /// Backoff before the first retry; doubles on every further retry.
    #[builder(default = Duration::from_millis(1))]
    pub initial_backoff: Duration,
    #[builder(default = Duration::from_millis(64))]
    pub max_backoff: Duration,
}

impl Default for TransactSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Runs units of work against an [`OrderedStore`], retrying on conflicts.
#[derive(Debug)]
pub struct Database<S> {
    store: Arc<S>,
    settings: TransactSettings,
}

impl<S> Clone for Database<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings,
        }
    }
}

impl<S: OrderedStore> Database<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, TransactSettings::default())
    }

    pub fn with_settings(store: S, settings: TransactSettings) -> Self {
        Self {
            store: Arc::new(store),
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `work` in a transaction and commits it.
    ///
    /// If the commit fails with a retryable error the whole unit is run
    /// again from scratch on a fresh transaction, so `work` must not have
    /// effects outside the transaction. An error returned by `work` aborts
    /// the transaction without writing anything and is returned as is.
    /// When retries run out, the caller gets
    /// [`StoreError::RetryLimitExceeded`].
    pub async fn transact<T, E, F>(&self, mut work: F) -> Result<T, E>
    where
        F: FnMut(&mut S::Transaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut backoff = self.settings.initial_backoff;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let mut tr = self.store.begin();
            let output = work(&mut tr)?;

            match tr.commit() {
                Ok(()) => {
                    if attempt > 1 {
                        debug!(attempts = attempt, "transaction committed after retry");
                    }
                    return Ok(output);
                }
                Err(err) if err.is_retryable() && attempt <= self.settings.max_retries => {
                    debug!(attempt, error = %err, ?backoff, "retrying transaction");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.settings.max_backoff);
                }
                Err(err) if err.is_retryable() => {
                    warn!(attempts = attempt, error = %err, "transaction retry limit exceeded");
                    return Err(StoreError::RetryLimitExceeded { attempts: attempt }.into());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::RangeOptions;
    use crate::subspace::KeyRange;

    fn decode(bytes: Option<Vec<u8>>) -> u64 {
        bytes
            .map(|b| u64::from_be_bytes(b.try_into().unwrap()))
            .unwrap_or(0)
    }

    async fn increment(db: &Database<MemoryStore>) -> Result<u64, StoreError> {
        db.transact(|tr| {
            let next = decode(tr.get(b"n")?) + 1;
            tr.set(b"n", &next.to_be_bytes());
            Ok(next)
        })
        .await
    }

    #[tokio::test]
    async fn commits_the_unit_of_work() {
        let db = Database::new(MemoryStore::new());
        assert_eq!(increment(&db).await.unwrap(), 1);
        assert_eq!(increment(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn domain_errors_abort_without_writes() {
        #[derive(Debug, PartialEq)]
        enum AppError {
            Rejected,
            Store(StoreError),
        }
        impl From<StoreError> for AppError {
            fn from(err: StoreError) -> Self {
                AppError::Store(err)
            }
        }

        let db = Database::new(MemoryStore::new());
        let result: Result<(), AppError> = db
            .transact(|tr| {
                tr.set(b"k", b"v");
                Err(AppError::Rejected)
            })
            .await;

        assert_eq!(result, Err(AppError::Rejected));
        assert!(db.store().is_empty());
    }

    #[tokio::test]
    async fn conflicting_unit_is_rerun_from_scratch() {
        let db = Database::new(MemoryStore::new());
        let interferer = db.clone();
        let mut runs = 0;

        let value = db
            .transact(|tr| {
                runs += 1;
                let current = decode(tr.get(b"n")?);
                if runs == 1 {
                    // a competing commit lands between our read and our commit
                    let mut other = interferer.store().begin();
                    other.set(b"n", &100u64.to_be_bytes());
                    other.commit()?;
                }
                tr.set(b"n", &(current + 1).to_be_bytes());
                Ok::<_, StoreError>(current + 1)
            })
            .await
            .unwrap();

        assert_eq!(runs, 2);
        assert_eq!(value, 101);
    }

    #[tokio::test]
    async fn gives_up_after_the_retry_budget() {
        let settings = TransactSettings::builder()
            .max_retries(2)
            .initial_backoff(Duration::ZERO)
            .build();
        let db = Database::with_settings(MemoryStore::new(), settings);
        let interferer = db.clone();
        let mut runs = 0;

        let err = db
            .transact(|tr| {
                runs += 1;
                tr.get_range(
                    &KeyRange::new(b"a".to_vec(), b"z".to_vec()),
                    RangeOptions::default(),
                )?;
                let mut other = interferer.store().begin();
                other.set(b"m", b"");
                other.commit()?;
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap_err();

        assert_eq!(runs, 3);
        assert_eq!(err, StoreError::RetryLimitExceeded { attempts: 3 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let db = Database::new(MemoryStore::new());
        let mut handles = Vec::new();

        for _ in 0..32 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    increment(&db).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let total = db
            .transact(|tr| Ok::<_, StoreError>(decode(tr.get(b"n")?)))
            .await
            .unwrap();
        assert_eq!(total, 320);
    }
}
