//! Keyed mutual exclusion.
//!
//! Stock changes on one item must not interleave, while different items may
//! proceed in parallel. [`KeyedLocks`] hands out one mutex per key; callers
//! that need several keys go through [`KeyedLocks::lock_all`], which always
//! acquires them in ascending key order so two multi-key callers cannot
//! deadlock.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

/// How finely stock access is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStrategy {
    /// One critical section per key.
    #[default]
    PerKey,
    /// One critical section for everything.
    Global,
}

impl FromStr for LockStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-item" | "per_item" | "per-key" | "per_key" => Ok(LockStrategy::PerKey),
            "global" => Ok(LockStrategy::Global),
            other => Err(format!(
                "unknown lock strategy '{other}' (expected per-item or global)"
            )),
        }
    }
}

type Slot = Arc<Mutex<()>>;

/// Held locks. Dropping the set releases them.
#[must_use = "locks are released as soon as the LockSet is dropped"]
pub struct LockSet {
    guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl LockSet {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl core::fmt::Debug for LockSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockSet").field("held", &self.len()).finish()
    }
}

const MIN_PRUNE_AT: usize = 64;

#[derive(Debug)]
struct Slots<K> {
    map: HashMap<K, Slot>,
    prune_at: usize,
}

impl<K: Copy + Eq + Hash> Slots<K> {
    /// Slot for `key`. Once the table outgrows `prune_at`, slots nobody holds
    /// or waits on are dropped first, so the table tracks live contention
    /// rather than every key ever seen.
    fn get(&mut self, key: K) -> Slot {
        if !self.map.contains_key(&key) && self.map.len() >= self.prune_at {
            // Every holder and waiter owns a clone, so a count of 1 is idle.
            self.map.retain(|_, slot| Arc::strong_count(slot) > 1);
            self.prune_at = (self.map.len() * 2).max(MIN_PRUNE_AT);
        }
        Arc::clone(self.map.entry(key).or_default())
    }
}

/// Lazily-populated table of per-key mutexes.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    strategy: LockStrategy,
    global: Slot,
    slots: Mutex<Slots<K>>,
}

impl<K> KeyedLocks<K>
where
    K: Copy + Ord + Hash,
{
    pub fn new(strategy: LockStrategy) -> Self {
        Self {
            strategy,
            global: Arc::new(Mutex::new(())),
            slots: Mutex::new(Slots {
                map: HashMap::new(),
                prune_at: MIN_PRUNE_AT,
            }),
        }
    }

    fn slot(&self, key: K) -> Slot {
        match self.strategy {
            LockStrategy::Global => Arc::clone(&self.global),
            LockStrategy::PerKey => self.slots.lock().get(key),
        }
    }

    /// Block until `key` is exclusively held.
    pub fn lock(&self, key: K) -> LockSet {
        LockSet {
            guards: vec![self.slot(key).lock_arc()],
        }
    }

    /// Block until every key is exclusively held. Duplicates are collapsed
    /// and keys are taken in ascending order.
    pub fn lock_all(&self, keys: impl IntoIterator<Item = K>) -> LockSet {
        let keys: BTreeSet<K> = keys.into_iter().collect();
        if keys.is_empty() {
            return LockSet { guards: vec![] };
        }
        if self.strategy == LockStrategy::Global {
            return LockSet {
                guards: vec![self.global.lock_arc()],
            };
        }
        let guards = keys.into_iter().map(|k| self.slot(k).lock_arc()).collect();
        LockSet { guards }
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.lock().map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn parses_strategies() {
        assert_eq!("per-item".parse::<LockStrategy>(), Ok(LockStrategy::PerKey));
        assert_eq!(" GLOBAL ".parse::<LockStrategy>(), Ok(LockStrategy::Global));
        assert!("optimistic".parse::<LockStrategy>().is_err());
    }

    #[test]
    fn lock_all_collapses_duplicates() {
        let locks = KeyedLocks::new(LockStrategy::PerKey);
        let held = locks.lock_all([3u32, 1, 3, 2, 1]);
        assert_eq!(held.len(), 3);
    }

    #[test]
    fn global_strategy_takes_a_single_lock() {
        let locks = KeyedLocks::new(LockStrategy::Global);
        let held = locks.lock_all([1u32, 2, 3]);
        assert_eq!(held.len(), 1);
        drop(held);
        assert!(locks.lock_all(Vec::<u32>::new()).is_empty());
    }

    #[test]
    fn different_keys_do_not_block_each_other() {
        let locks = KeyedLocks::new(LockStrategy::PerKey);
        let _a = locks.lock(1u32);
        // Would deadlock if key 2 shared key 1's mutex.
        let _b = locks.lock(2u32);
    }

    #[test]
    fn same_key_is_mutually_exclusive() {
        let locks = KeyedLocks::new(LockStrategy::PerKey);
        let inside = AtomicUsize::new(0);
        let max_seen = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let _held = locks.lock(7u32);
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn idle_slots_are_pruned() {
        let locks = KeyedLocks::new(LockStrategy::PerKey);
        let held = locks.lock(0u32);
        for key in 1..10_000u32 {
            let _held = locks.lock(key);
        }
        assert!(locks.slot_count() <= MIN_PRUNE_AT, "{}", locks.slot_count());

        // A held key survives pruning and still excludes other callers.
        let contended = locks.slots.lock().get(0);
        assert!(contended.try_lock().is_none());
        drop(held);
        assert!(contended.try_lock().is_some());
    }

    #[test]
    fn overlapping_multi_key_callers_do_not_deadlock() {
        let locks = KeyedLocks::new(LockStrategy::PerKey);
        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..500 {
                    let _held = locks.lock_all([1u32, 2]);
                }
            });
            s.spawn(|| {
                for _ in 0..500 {
                    let _held = locks.lock_all([2u32, 1]);
                }
            });
        });
    }
}
