use super::{AcquisitionChain, AcquisitionError, LoadedTable};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Shared handle to the current rate table. Readers take an `Arc` snapshot;
/// refreshes replace the whole table and never mutate it in place.
#[derive(Debug)]
pub struct RateTableStore {
    current: RwLock<Arc<LoadedTable>>,
}

impl RateTableStore {
    pub fn new(initial: LoadedTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<LoadedTable> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, next: LoadedTable) -> Arc<LoadedTable> {
        let next = Arc::new(next);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
        next
    }

    /// Load through `chain` and swap the result in. On failure the current
    /// table is left as it was.
    pub fn refresh(&self, chain: &AcquisitionChain) -> Result<Arc<LoadedTable>, AcquisitionError> {
        let loaded = chain.load()?;
        Ok(self.replace(loaded))
    }
}

/// Run [`RateTableStore::refresh`] on the blocking pool, since sources may
/// perform blocking I/O.
pub async fn refresh_in_background(
    store: Arc<RateTableStore>,
    chain: Arc<AcquisitionChain>,
) -> Result<Arc<LoadedTable>, AcquisitionError> {
    tokio::task::spawn_blocking(move || store.refresh(&chain))
        .await
        .map_err(|err| AcquisitionError::Interrupted(err.to_string()))?
}

/// Periodically refresh `store`. The first refresh happens one `period` after
/// spawning; abort the handle to stop.
pub fn spawn_auto_refresh(
    store: Arc<RateTableStore>,
    chain: Arc<AcquisitionChain>,
    period: Duration,
) -> JoinHandle<()> {
    info!(seconds = period.as_secs(), "rate table auto-refresh enabled");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            debug!("auto-refreshing rate table");
            match refresh_in_background(store.clone(), chain.clone()).await {
                Ok(loaded) => debug!(
                    source = %loaded.source,
                    roles = loaded.table.len(),
                    "rate table refreshed"
                ),
                Err(error) => warn!(%error, "rate table refresh failed; keeping previous table"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::tests::{FailingSource, StaticSource};
    use crate::acquisition::BuiltinSource;
    use crate::pricing::{RateTable, RoleRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store_with(role: &str) -> RateTableStore {
        RateTableStore::new(LoadedTable::new(
            RateTable::new(vec![RoleRecord::new(role, 10.0, 5.0, 7.0)]),
            "seed",
        ))
    }

    #[test]
    fn snapshots_survive_replacement() {
        let store = store_with("Release Manager");
        let before = store.snapshot();

        store.replace(LoadedTable::new(
            RateTable::new(vec![RoleRecord::new("Junior Developer", 69.0, 11.0, 25.0)]),
            "next",
        ));

        assert!(before.table.find("Release Manager").is_some());
        assert!(store.snapshot().table.find("Junior Developer").is_some());
        assert_eq!(store.snapshot().source, "next");
    }

    #[test]
    fn failed_refresh_keeps_prior_table() {
        let store = store_with("Release Manager");
        let chain = AcquisitionChain::new().with_source(FailingSource);

        assert!(store.refresh(&chain).is_err());
        assert_eq!(store.snapshot().source, "seed");
    }

    #[tokio::test]
    async fn background_refresh_swaps_table() {
        let store = Arc::new(store_with("Release Manager"));
        let chain = Arc::new(
            AcquisitionChain::new()
                .with_source(StaticSource::default())
                .with_source(BuiltinSource),
        );

        let loaded = refresh_in_background(store.clone(), chain)
            .await
            .expect("refresh succeeds");

        assert_eq!(loaded.source, "builtin");
        assert_eq!(store.snapshot().table.len(), 7);
    }

    /// Waits for the blocking refresh to land without advancing the paused clock.
    async fn settle(store: &RateTableStore, source: &str) {
        for _ in 0..200 {
            if store.snapshot().source == source {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_swaps_after_each_period_until_aborted() {
        let store = Arc::new(store_with("Release Manager"));
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = Arc::new(
            AcquisitionChain::new()
                .with_source(StaticSource {
                    records: Vec::new(),
                    calls: calls.clone(),
                })
                .with_source(BuiltinSource),
        );
        let period = Duration::from_secs(60);

        let handle = spawn_auto_refresh(store.clone(), chain, period);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.snapshot().source, "seed");

        tokio::time::sleep(Duration::from_secs(31)).await;
        settle(&store, "builtin").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().source, "builtin");

        handle.abort();
        let joined = handle.await;
        assert!(joined.is_err_and(|error| error.is_cancelled()));

        store.replace(LoadedTable::new(RateTable::default(), "manual"));
        tokio::time::sleep(period * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().source, "manual");
    }
}
