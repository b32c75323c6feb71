/// Single-slot cache keyed on a parameter tuple.
///
/// Holds the most recent `(key, value)` pair. A lookup with an equal key
/// returns the cached value; any other key replaces it. There is no
/// incremental update path: a miss always recomputes from scratch.
#[derive(Clone, Debug)]
pub struct Memo<K, V> {
    entry: Option<(K, V)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it with `compute` on a miss.
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce(&K) -> V) -> &V {
        let stale = self.entry.as_ref().is_some_and(|(k, _)| *k != key);
        if stale {
            self.entry = None;
        }
        let (_, value) = self.entry.get_or_insert_with(|| {
            let value = compute(&key);
            (key, value)
        });
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_hit_does_not_recompute() {
        let calls = Cell::new(0);
        let mut memo: Memo<(u32, u32), u32> = Memo::new();
        let f = |k: &(u32, u32)| {
            calls.set(calls.get() + 1);
            k.0 + k.1
        };
        assert_eq!(*memo.get_or_compute((1, 2), f), 3);
        assert_eq!(*memo.get_or_compute((1, 2), f), 3);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_miss_replaces_entry() {
        let calls = Cell::new(0);
        let mut memo: Memo<u32, u32> = Memo::new();
        let f = |k: &u32| {
            calls.set(calls.get() + 1);
            k * 10
        };
        memo.get_or_compute(1, f);
        assert_eq!(*memo.get_or_compute(2, f), 20);
        assert_eq!(*memo.get_or_compute(1, f), 10);
        assert_eq!(calls.get(), 3);
    }
}
