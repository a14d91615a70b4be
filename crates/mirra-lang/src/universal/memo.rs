use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// A cache that tolerates racing writers.
///
/// Concurrent misses may each compute a value; the last store wins and every
/// later read observes it. No lock is taken, so computing under another lock
/// cannot deadlock against the cache.
pub(crate) struct Memo<T> {
    slot: ArcSwapOption<T>,
}

impl<T> Memo<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    pub(crate) fn get(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    pub(crate) fn get_or_compute(&self, compute: impl FnOnce() -> T) -> Arc<T> {
        if let Some(value) = self.slot.load_full() {
            return value;
        }
        let value = Arc::new(compute());
        self.slot.store(Some(value.clone()));
        value
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::Memo;

    #[test]
    fn computes_once_when_uncontended() {
        let memo = Memo::new();
        let calls = AtomicUsize::new(0);

        let first = memo.get_or_compute(|| calls.fetch_add(1, Ordering::SeqCst) + 10);
        let second = memo.get_or_compute(|| calls.fetch_add(1, Ordering::SeqCst) + 10);

        assert_eq!(*first, 10);
        assert_eq!(*second, 10);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memo.get().is_some());
    }
}
