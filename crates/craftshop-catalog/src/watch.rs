//! Keeps a published product list, or a single product, current: reloads
//! after writes made through the cache, after another tab touches the local
//! collection, and on a fixed resync interval.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use craftshop_core::Product;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval};

use crate::cache::CatalogCache;

const DEFAULT_RESYNC: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncInterval {
    Every(Duration),
    Disabled,
}

impl ResyncInterval {
    /// `None` or zero seconds disables polling.
    #[must_use]
    pub fn from_secs(secs: Option<u64>) -> Self {
        match secs {
            Some(secs) if secs > 0 => ResyncInterval::Every(Duration::from_secs(secs)),
            _ => ResyncInterval::Disabled,
        }
    }
}

impl Default for ResyncInterval {
    fn default() -> Self {
        ResyncInterval::Every(DEFAULT_RESYNC)
    }
}

/// Handle to a running watch. Dropping it stops the task.
///
/// A listing watch publishes `Vec<Product>`; a detail watch publishes the
/// [`ProductWatch`] value `Option<Product>`.
#[derive(Debug)]
pub struct CatalogWatch<T = Vec<Product>> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

/// Watch over a single product, as a detail view holds it.
pub type ProductWatch = CatalogWatch<Option<Product>>;

impl<T: Clone> CatalogWatch<T> {
    /// The most recently published value. Empty (or `None`) until the first
    /// load finishes.
    #[must_use]
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next published value. `None` if the task has stopped.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// An extra receiver for callers that want to hold their own.
    #[must_use]
    pub fn receiver(&self) -> watch::Receiver<T> {
        self.rx.clone()
    }
}

impl<T> Drop for CatalogWatch<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Load the catalog once, then keep re-listing it until the returned handle
/// is dropped. Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_watch(cache: CatalogCache, interval: ResyncInterval) -> CatalogWatch {
    spawn_with(cache, interval, Vec::new(), |cache| async move {
        cache.list_products().await
    })
}

/// Load product `id` once, then re-fetch it on the same triggers as
/// [`spawn_watch`] until the returned handle is dropped.
#[must_use]
pub fn spawn_product_watch(cache: CatalogCache, id: i64, interval: ResyncInterval) -> ProductWatch {
    spawn_with(cache, interval, None, move |cache| async move {
        cache.get_product(id).await
    })
}

fn spawn_with<T, F, Fut>(
    cache: CatalogCache,
    interval: ResyncInterval,
    initial: T,
    load: F,
) -> CatalogWatch<T>
where
    T: Send + Sync + 'static,
    F: Fn(CatalogCache) -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let (tx, rx) = watch::channel(initial);
    let task = tokio::spawn(run(cache, interval, tx, load));
    CatalogWatch { rx, task }
}

async fn run<T, F, Fut>(cache: CatalogCache, interval: ResyncInterval, tx: watch::Sender<T>, load: F)
where
    F: Fn(CatalogCache) -> Fut,
    Fut: Future<Output = T>,
{
    let wake = Arc::new(Notify::new());
    let _subscription = {
        let wake = Arc::clone(&wake);
        cache.subscribe(move || wake.notify_one())
    };
    let mut foreign = cache.watch_foreign();
    let mut foreign_open = true;
    let mut ticker = match interval {
        ResyncInterval::Every(period) => Some(time::interval_at(Instant::now() + period, period)),
        ResyncInterval::Disabled => None,
    };

    tx.send_replace(load(cache.clone()).await);
    tracing::debug!(?interval, "catalog watch started");

    loop {
        let reason = tokio::select! {
            () = wake.notified() => "local write",
            event = foreign.changed(), if foreign_open => {
                if event.is_none() {
                    foreign_open = false;
                    continue;
                }
                "storage event"
            }
            () = tick(ticker.as_mut()) => "resync",
            () = tx.closed() => break,
        };
        tx.send_replace(load(cache.clone()).await);
        tracing::debug!(reason, "catalog refreshed");
    }
    tracing::debug!("catalog watch stopped");
}

async fn tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_missing_seconds_disable_resync() {
        assert_eq!(ResyncInterval::from_secs(None), ResyncInterval::Disabled);
        assert_eq!(ResyncInterval::from_secs(Some(0)), ResyncInterval::Disabled);
        assert_eq!(
            ResyncInterval::from_secs(Some(15)),
            ResyncInterval::Every(Duration::from_secs(15))
        );
    }

    #[test]
    fn default_resync_is_a_minute() {
        assert_eq!(ResyncInterval::default(), ResyncInterval::Every(Duration::from_secs(60)));
    }
}
