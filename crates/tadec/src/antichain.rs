//! C1: the antichain container (spec §4.1).
//!
//! Stores pairs `(p, P)` keyed by `p`, pairwise incomparable under a
//! caller-supplied partial order. Grounded on `Antichain2Cv2` in
//! `util/antichain2c_v2.hh`: a `HashMap<Key, VecDeque<T>>` stands in for the
//! original's `unordered_map<Key, list<T>>`, preserving the documented
//! "insertion order within a key" iteration guarantee `get()` relies on.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// A 2-component antichain over `(Key, T)`, representing its own up-closure
/// under a partial order supplied per-call rather than baked into the type
/// (trait-based genericity in place of the source's template comparator).
#[derive(Debug, Clone)]
pub struct Antichain<K, T> {
    data: HashMap<K, VecDeque<T>>,
}

impl<K, T> Default for Antichain<K, T> {
    fn default() -> Self {
        Self { data: HashMap::new() }
    }
}

impl<K, T> Antichain<K, T>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.values().map(VecDeque::len).sum()
    }

    /// Returns `true` iff some stored `(p, P)` with `p` in `candidates`
    /// satisfies `covers(&P, Q)`.
    pub fn contains<'a, I>(&self, candidates: I, q: &T, covers: impl Fn(&T, &T) -> bool) -> bool
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        for p in candidates {
            let Some(list) = self.data.get(p) else {
                continue;
            };
            if list.iter().any(|stored| covers(stored, q)) {
                return true;
            }
        }
        false
    }

    /// Removes every stored `(p, P)` with `p` in `candidates` such that `Q`
    /// covers `P` (i.e. the stored element is now subsumed by `Q`), invoking
    /// `on_erase` for each removed `P`. Safe to call with `erase_cb` that
    /// inspects other state, since removal happens after the full scan of
    /// each key's list completes (no iterator is held across the callback).
    pub fn refine(&mut self, candidates: &[K], q: &T, covers: impl Fn(&T, &T) -> bool, mut on_erase: impl FnMut(&T)) {
        for p in candidates {
            let Some(list) = self.data.get_mut(p) else {
                continue;
            };
            let mut i = 0;
            while i < list.len() {
                if covers(q, &list[i]) {
                    let removed = list.remove(i).expect("index in bounds");
                    on_erase(&removed);
                } else {
                    i += 1;
                }
            }
            if list.is_empty() {
                self.data.remove(p);
            }
        }
    }

    /// Appends `(key, value)`. Callers are expected to have already checked
    /// `contains` and called `refine` per spec §4.1's insertion protocol;
    /// this method itself is unconditional.
    pub fn insert(&mut self, key: K, value: T) {
        self.data.entry(key).or_default().push_back(value);
    }

    /// All elements currently stored under `key`, in insertion order. Used
    /// by inclusion checkers that need to combine a sibling state's already
    /// proven macro-states when assembling a tuple successor.
    pub fn get(&self, key: &K) -> impl Iterator<Item = &T> {
        self.data.get(key).into_iter().flatten()
    }

    /// Pops one element in insertion order (front of whichever key's queue
    /// is visited); returns `None` iff the antichain is empty. Any pop order
    /// is a valid worklist order for the callers that drain this container;
    /// this implementation visits keys in `HashMap` iteration order, which is
    /// not stable across runs but is stable within a single run's sequence
    /// of mutations, which is all a deterministic-given-input inclusion
    /// result actually needs.
    pub fn pop(&mut self) -> Option<(K, T)> {
        let key = self.data.keys().next().cloned()?;
        let list = self.data.get_mut(&key)?;
        let value = list.pop_front()?;
        if list.is_empty() {
            self.data.remove(&key);
        }
        Some((key, value))
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subset_covers(stored: &Vec<u32>, q: &Vec<u32>) -> bool {
        // stored "covers" q iff every element of q has a >=-partner in stored
        // (identity preorder here, so this is just subset-or-equal of sets
        // when both are sorted+deduped, which the tests keep true).
        q.iter().all(|x| stored.contains(x))
    }

    #[test]
    fn insert_then_contains() {
        let mut ac: Antichain<u32, Vec<u32>> = Antichain::new();
        ac.insert(0, vec![1, 2, 3]);
        assert!(ac.contains([&0], &vec![1, 2], subset_covers));
        assert!(!ac.contains([&0], &vec![4], subset_covers));
    }

    #[test]
    fn refine_evicts_subsumed_elements() {
        let mut ac: Antichain<u32, Vec<u32>> = Antichain::new();
        ac.insert(0, vec![1]);
        ac.insert(0, vec![1, 2]);
        let mut erased = Vec::new();
        // Q = [1,2,3] covers both stored elements (superset).
        ac.refine(&[0], &vec![1, 2, 3], subset_covers, |p| erased.push(p.clone()));
        assert_eq!(erased.len(), 2);
        assert!(ac.is_empty());
    }

    #[test]
    fn insertion_idempotence_when_already_covered() {
        let mut ac: Antichain<u32, Vec<u32>> = Antichain::new();
        ac.insert(0, vec![1, 2, 3]);
        let candidate = vec![1, 2];
        // Already covered: a real caller would skip the insert entirely.
        if !ac.contains([&0], &candidate, subset_covers) {
            ac.insert(0, candidate);
        }
        assert_eq!(ac.len(), 1);
    }

    #[test]
    fn pop_drains_all_elements_exactly_once() {
        let mut ac: Antichain<u32, Vec<u32>> = Antichain::new();
        ac.insert(0, vec![1]);
        ac.insert(1, vec![2]);
        ac.insert(1, vec![3]);
        let mut seen = Vec::new();
        while let Some((_, v)) = ac.pop() {
            seen.push(v);
        }
        seen.sort();
        assert_eq!(seen, vec![vec![1], vec![2], vec![3]]);
        assert!(ac.is_empty());
    }
}
