//! RAII guards for tick overlap and in-flight publishes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use postdeck_domain::{DateKey, DedupKey, Platform};

/// Held for the duration of one tick; a second tick cannot start until it is
/// dropped.
#[derive(Debug)]
pub struct TickGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TickGuard<'a> {
    /// `None` when a tick guarded by `flag` is already running.
    pub fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Address of one scheduled item.
pub type ItemAddress = (Platform, DateKey, DedupKey);

/// Items with a publish or mutation in progress.
///
/// Any operation that changes or publishes an item claims it first. A claim
/// that fails means another operation owns the item right now.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    claimed: Arc<Mutex<HashSet<ItemAddress>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_claim(&self, platform: Platform, date: DateKey, key: &DedupKey) -> Option<InFlightClaim> {
        let address = (platform, date, key.clone());
        let inserted = self.claimed.lock().insert(address.clone());
        inserted.then(|| InFlightClaim { claimed: Arc::clone(&self.claimed), address })
    }

    pub fn is_claimed(&self, platform: Platform, date: DateKey, key: &DedupKey) -> bool {
        self.claimed.lock().contains(&(platform, date, key.clone()))
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.lock().is_empty()
    }
}

/// Released on drop.
#[derive(Debug)]
pub struct InFlightClaim {
    claimed: Arc<Mutex<HashSet<ItemAddress>>>,
    address: ItemAddress,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.claimed.lock().remove(&self.address);
    }
}

#[cfg(test)]
mod tests {
    use postdeck_domain::ScheduledItem;

    use super::*;

    #[test]
    fn tick_guard_blocks_overlap_until_dropped() {
        let flag = AtomicBool::new(false);
        let first = TickGuard::try_acquire(&flag);
        assert!(first.is_some());
        assert!(TickGuard::try_acquire(&flag).is_none());
        drop(first);
        assert!(TickGuard::try_acquire(&flag).is_some());
    }

    #[test]
    fn claims_are_exclusive_and_released_on_drop() {
        let registry = InFlightRegistry::new();
        let date: DateKey = "2025-06-15".parse().unwrap();
        let key = ScheduledItem::new("10:00".parse().unwrap()).with_title("x").dedup_key();

        let claim = registry.try_claim(Platform::YouTube, date, &key);
        assert!(claim.is_some());
        assert!(registry.is_claimed(Platform::YouTube, date, &key));
        assert!(registry.try_claim(Platform::YouTube, date, &key).is_none());
        assert!(registry.try_claim(Platform::Facebook, date, &key).is_some());

        drop(claim);
        assert!(registry.is_empty());
    }
}
