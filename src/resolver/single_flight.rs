use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Key of one in-flight load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlightKey {
    /// `None` when loads of the requisite are serialized across all apps
    pub app: Option<String>,
    pub requisite: String,
}

impl FlightKey {
    pub fn requisite(requisite: impl Into<String>) -> Self {
        Self { app: None, requisite: requisite.into() }
    }

    pub fn app_requisite(app: impl Into<String>, requisite: impl Into<String>) -> Self {
        Self { app: Some(app.into()), requisite: requisite.into() }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.app {
            Some(app) => write!(f, "{}@{}", self.requisite, app),
            None => write!(f, "{}", self.requisite),
        }
    }
}

type Table = Arc<Mutex<HashMap<FlightKey, Arc<AsyncMutex<()>>>>>;

/// Table of per-key async locks.
///
/// An entry exists only while somebody holds or waits for its lock, so the
/// table stays as small as the set of loads currently in flight.
#[derive(Clone, Default)]
pub struct SingleFlight {
    table: Table,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `key`. Dropping the returned guard releases it.
    pub async fn acquire(&self, key: FlightKey) -> FlightGuard {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.entry(key.clone()).or_default().clone()
        };
        // cleans up the entry if this future is dropped while waiting
        let ticket = Ticket { table: self.table.clone(), key, lock: Some(lock.clone()) };
        let guard = lock.lock_owned().await;
        FlightGuard { guard: Some(guard), _ticket: ticket }
    }

    /// Number of keys currently held or awaited.
    pub fn in_flight(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

struct Ticket {
    table: Table,
    key: FlightKey,
    lock: Option<Arc<AsyncMutex<()>>>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        self.lock.take();
        // table's own reference is the last one: nobody holds or waits
        let idle = table.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            table.remove(&self.key);
        }
    }
}

pub struct FlightGuard {
    guard: Option<OwnedMutexGuard<()>>,
    _ticket: Ticket,
}

impl FlightGuard {
    pub fn key(&self) -> &FlightKey {
        &self._ticket.key
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        // release before the ticket checks whether the entry is idle
        self.guard.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_removed_after_release() {
        let flights = SingleFlight::new();
        let guard = flights.acquire(FlightKey::requisite("archive-entries")).await;
        assert_eq!(flights.in_flight(), 1);
        assert_eq!(guard.key().to_string(), "archive-entries");
        drop(guard);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let flights = SingleFlight::new();
        let first = flights.acquire(FlightKey::requisite("r")).await;

        let waiter = {
            let flights = flights.clone();
            tokio::spawn(async move {
                let _guard = flights.acquire(FlightKey::requisite("r")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);
        // the waiter now owns the lock, entry must survive
        waiter.await.unwrap();
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_cleans_up() {
        let flights = SingleFlight::new();
        let first = flights.acquire(FlightKey::requisite("r")).await;

        let waiter = {
            let flights = flights.clone();
            tokio::spawn(async move {
                let _guard = flights.acquire(FlightKey::requisite("r")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiter.abort();
        let _ = waiter.await;
        drop(first);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let flights = SingleFlight::new();
        let _a = flights.acquire(FlightKey::app_requisite("package:a", "r")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            flights.acquire(FlightKey::app_requisite("package:b", "r")),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(flights.in_flight(), 2);
    }
}
