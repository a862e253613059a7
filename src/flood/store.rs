//! In-memory burst counters keyed by (chat, user).

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use teloxide::types::{ChatId, UserId};
use tracing::{debug, warn};

/// Progress of one user's current burst in one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstState {
    /// Messages seen in the current burst
    pub count: u32,
    /// When the current burst began
    pub started_at: Instant,
}

impl BurstState {
    /// A burst that has just begun with its first message.
    pub fn first(now: Instant) -> Self {
        Self {
            count: 1,
            started_at: now,
        }
    }

    /// Whether a message at `now` starts a new burst under `window_secs`.
    ///
    /// Elapsed time is counted in whole seconds. A zero window never expires.
    pub fn is_stale(&self, window_secs: u32, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs();
        window_secs > 0 && elapsed > u64::from(window_secs)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    burst: BurstState,
    /// Window in effect when the burst was last updated
    window_secs: u32,
    last_seen: Instant,
}

impl Slot {
    fn is_stale(&self, now: Instant) -> bool {
        self.burst.is_stale(self.window_secs, now)
    }
}

type Key = (i64, u64);

/// Per-(chat, user) burst table.
///
/// Read-modify-write of a key happens under that key's shard lock, so
/// concurrent updates to one key never interleave while unrelated keys
/// proceed in parallel.
///
/// [`FloodCounterStore::sweep`] drops bursts whose window has run out, which
/// the next message would reset anyway. Bursts without a window are only
/// dropped once the table outgrows its ceiling, least recently seen first.
#[derive(Clone, Default)]
pub struct FloodCounterStore {
    slots: Arc<DashMap<Key, Slot>>,
}

impl FloodCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn get(&self, chat_id: ChatId, user_id: UserId) -> Option<BurstState> {
        self.slots.get(&(chat_id.0, user_id.0)).map(|slot| slot.burst)
    }

    /// Store `burst` without a window; only the size ceiling evicts it.
    #[allow(dead_code)]
    pub fn set(&self, chat_id: ChatId, user_id: UserId, burst: BurstState) {
        self.slots.insert(
            (chat_id.0, user_id.0),
            Slot {
                burst,
                window_secs: 0,
                last_seen: Instant::now(),
            },
        );
    }

    /// Atomically replace the burst of one key with `f(current)`.
    ///
    /// Returns the stored value. `window_secs` is the chat's window for this
    /// message and `now` its arrival; both drive later eviction.
    pub fn update<F>(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        window_secs: u32,
        now: Instant,
        f: F,
    ) -> BurstState
    where
        F: FnOnce(Option<BurstState>) -> BurstState,
    {
        let key = (chat_id.0, user_id.0);
        match self.slots.entry(key) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                slot.burst = f(Some(slot.burst));
                slot.window_secs = window_secs;
                slot.last_seen = now;
                slot.burst
            }
            Entry::Vacant(entry) => {
                let burst = f(None);
                entry.insert(Slot {
                    burst,
                    window_secs,
                    last_seen: now,
                });
                burst
            }
        }
    }

    /// Drop bursts whose window has expired, then trim the table to
    /// `max_entries` by evicting the least recently seen bursts.
    ///
    /// Returns how many entries were removed.
    pub fn sweep(&self, now: Instant, max_entries: usize) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| !slot.is_stale(now));
        let expired = before.saturating_sub(self.slots.len());

        let excess = self.slots.len().saturating_sub(max_entries);
        if excess == 0 {
            return expired;
        }

        let mut by_age: Vec<(Key, Instant)> = self
            .slots
            .iter()
            .map(|entry| (*entry.key(), entry.value().last_seen))
            .collect();
        by_age.sort_unstable_by_key(|(_, last_seen)| *last_seen);

        let mut trimmed = 0;
        for (key, seen) in by_age.into_iter().take(excess) {
            // Skip keys that received a message since the snapshot
            if self
                .slots
                .remove_if(&key, |_, slot| slot.last_seen <= seen)
                .is_some()
            {
                trimmed += 1;
            }
        }

        if trimmed > 0 {
            warn!(
                "Flood counter table over {} entries, evicted {} least recently seen",
                max_entries, trimmed
            );
        }
        expired + trimmed
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Run [`Self::sweep`] every `interval` until the runtime shuts down.
    pub async fn run_sweeper(self, interval: Duration, max_entries: usize) {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = self.sweep(tokio::time::Instant::now().into_std(), max_entries);
            if removed > 0 {
                debug!(
                    "Evicted {} flood counters ({} remaining)",
                    removed,
                    self.len()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ChatId = ChatId(-1001);
    const OTHER_CHAT: ChatId = ChatId(-1002);
    const USER: UserId = UserId(10);
    const OTHER_USER: UserId = UserId(11);

    #[test]
    fn test_get_absent() {
        let store = FloodCounterStore::new();
        assert_eq!(store.get(CHAT, USER), None);
    }

    #[test]
    fn test_set_then_get() {
        let store = FloodCounterStore::new();
        let now = Instant::now();
        let burst = BurstState {
            count: 3,
            started_at: now,
        };

        store.set(CHAT, USER, burst);
        assert_eq!(store.get(CHAT, USER), Some(burst));
        assert_eq!(store.get(OTHER_CHAT, USER), None);
    }

    #[test]
    fn test_update_sees_previous_value() {
        let store = FloodCounterStore::new();
        let now = Instant::now();

        let first = store.update(CHAT, USER, 0, now, |current| {
            assert!(current.is_none());
            BurstState::first(now)
        });
        assert_eq!(first.count, 1);

        let second = store.update(CHAT, USER, 0, now, |current| {
            let mut burst = current.unwrap();
            burst.count += 1;
            burst
        });
        assert_eq!(second.count, 2);
        assert_eq!(store.get(CHAT, USER).unwrap().count, 2);
    }

    #[test]
    fn test_stale_uses_whole_seconds_and_ignores_zero_window() {
        let start = Instant::now();
        let burst = BurstState::first(start);

        assert!(!burst.is_stale(5, start + Duration::from_millis(5_900)));
        assert!(burst.is_stale(5, start + Duration::from_secs(6)));
        assert!(!burst.is_stale(0, start + Duration::from_secs(365 * 86_400)));
    }

    #[test]
    fn test_sweep_drops_only_expired_windows() {
        let store = FloodCounterStore::new();
        let start = Instant::now();
        let first = |_: Option<BurstState>| BurstState::first(start);

        store.update(CHAT, USER, 30, start, first);
        store.update(OTHER_CHAT, USER, 86_400, start, first);
        store.update(CHAT, OTHER_USER, 0, start, first);

        // 30s burst is exactly at its window: kept
        assert_eq!(store.sweep(start + Duration::from_secs(30), 100), 0);

        let removed = store.sweep(start + Duration::from_secs(31), 100);
        assert_eq!(removed, 1);
        assert_eq!(store.get(CHAT, USER), None);
        assert!(store.get(OTHER_CHAT, USER).is_some());

        // A day-long window and a burst without a window survive a month
        // as long as the table has room
        let removed = store.sweep(start + Duration::from_secs(30 * 86_400), 100);
        assert_eq!(removed, 1);
        assert_eq!(store.get(OTHER_CHAT, USER), None);
        assert!(store.get(CHAT, OTHER_USER).is_some());
    }

    #[test]
    fn test_sweep_trims_least_recently_seen_over_ceiling() {
        let store = FloodCounterStore::new();
        let start = Instant::now();

        for user in 0..5u64 {
            let seen = start + Duration::from_secs(user);
            store.update(CHAT, UserId(user), 0, seen, |_| BurstState::first(seen));
        }

        let removed = store.sweep(start + Duration::from_secs(10), 3);
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(CHAT, UserId(0)), None);
        assert_eq!(store.get(CHAT, UserId(1)), None);
        assert!(store.get(CHAT, UserId(2)).is_some());
        assert!(store.get(CHAT, UserId(4)).is_some());
    }

    #[test]
    fn test_concurrent_updates_do_not_lose_counts() {
        let store = FloodCounterStore::new();
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        store.update(CHAT, USER, 0, now, |current| match current {
                            Some(mut burst) => {
                                burst.count += 1;
                                burst
                            }
                            None => BurstState::first(now),
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get(CHAT, USER).unwrap().count, 4_000);
    }
}
