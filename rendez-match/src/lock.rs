use rendez_core::models::normalize_pair;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Keyed mutual-exclusion map over unordered user pairs.
///
/// The pair (equivalently, the match — there is one match per pair) is the
/// unit of serialization: all read-then-write operations on a pair's
/// match/availability/booking state run under its guard, while distinct
/// pairs proceed in parallel. Single-user operations lock the degenerate
/// (user, user) key.
#[derive(Default)]
pub struct PairLocks {
    locks: Mutex<HashMap<(Uuid, Uuid), Arc<Mutex<()>>>>,
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, u1: Uuid, u2: Uuid) -> OwnedMutexGuard<()> {
        let key = normalize_pair(u1, u2);
        let entry = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }

    pub async fn acquire_user(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        self.acquire(user_id, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_pair_serializes_in_either_order() {
        let locks = Arc::new(PairLocks::new());
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let in_section = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let locks = locks.clone();
            let in_section = in_section.clone();
            // Alternate argument order; both must map to the same key.
            let (a, b) = if i % 2 == 0 { (u1, u2) } else { (u2, u1) };
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(a, b).await;
                let now = in_section.fetch_add(1, Ordering::SeqCst);
                assert_eq!(now, 0, "two tasks inside the same pair section");
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_distinct_pairs_do_not_block_each_other() {
        let locks = PairLocks::new();
        let g1 = locks.acquire(Uuid::new_v4(), Uuid::new_v4()).await;
        // Would deadlock if the map used one global lock.
        let g2 = locks.acquire(Uuid::new_v4(), Uuid::new_v4()).await;
        drop(g1);
        drop(g2);
    }
}
