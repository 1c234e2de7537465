//! C2: a square, dense Boolean matrix with amortised-doubling capacity,
//! grounded on `util/binary_relation.hh`. Used both as the final simulation
//! preorder and as the `≤` half of the partition–relation pair C4 refines.

/// A dense `size x size` Boolean relation over `0..size`.
#[derive(Debug, Clone)]
pub struct BinaryRelation {
    data: Vec<bool>,
    cap: usize,
    size: usize,
}

impl BinaryRelation {
    pub fn new(size: usize) -> Self {
        Self::with_default(size, false)
    }

    pub fn with_default(size: usize, default: bool) -> Self {
        let cap = size.max(16);
        Self {
            data: vec![default; cap * cap],
            cap,
            size,
        }
    }

    /// The identity relation over `0..size` (used as the default preorder
    /// when callers don't supply a simulation, per spec §4.6).
    pub fn identity(size: usize) -> Self {
        let mut rel = Self::new(size);
        for i in 0..size {
            rel.set(i, i, true);
        }
        rel
    }

    /// The full (all-pairs) relation, the starting point of partition
    /// refinement in spec §4.4 step 1.
    pub fn full(size: usize) -> Self {
        Self::with_default(size, true)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn grow(&mut self, new_cap: usize, default: bool) {
        let mut tmp = vec![default; new_cap * new_cap];
        for row in 0..self.size {
            let src = row * self.cap;
            let dst = row * new_cap;
            tmp[dst..dst + self.size].copy_from_slice(&self.data[src..src + self.size]);
        }
        self.data = tmp;
        self.cap = new_cap;
    }

    pub fn resize(&mut self, size: usize, default: bool) {
        let mut new_cap = self.cap.max(16);
        while new_cap < size {
            new_cap *= 2;
        }
        if new_cap != self.cap {
            self.grow(new_cap, default);
        } else if size > self.size {
            // Capacity already sufficient; fill the newly visible rows/cols.
            for row in 0..size {
                for col in self.size..size {
                    self.data[row * self.cap + col] = default;
                }
            }
            for row in self.size..size {
                for col in 0..size {
                    self.data[row * self.cap + col] = default;
                }
            }
        }
        self.size = size;
    }

    /// Allocates a fresh row/column at the end, returning its index.
    pub fn new_entry(&mut self, default: bool) -> usize {
        let idx = self.size;
        self.resize(self.size + 1, default);
        idx
    }

    pub fn get(&self, r: usize, c: usize) -> bool {
        debug_assert!(r < self.size && c < self.size);
        self.data[r * self.cap + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: bool) {
        debug_assert!(r < self.size && c < self.size);
        self.data[r * self.cap + c] = v;
    }

    /// `sym(i, j) = get(i, j) ∧ get(j, i)`: the symmetric kernel of the
    /// relation, the `⟷`-equivalence used by `build_classes`/`collapse`.
    pub fn sym(&self, i: usize, j: usize) -> bool {
        self.get(i, j) && self.get(j, i)
    }

    pub fn reset(&mut self, default: bool) {
        self.data.iter_mut().for_each(|b| *b = default);
    }

    /// For each state, the smallest-indexed representative of its
    /// `⟷`-equivalence class (the two-argument `buildClasses` overload of
    /// `binary_relation.hh`).
    pub fn build_classes(&self) -> Vec<usize> {
        let mut repr = vec![usize::MAX; self.size];
        for i in 0..self.size {
            if repr[i] != usize::MAX {
                continue;
            }
            repr[i] = i;
            for j in (i + 1)..self.size {
                if repr[j] == usize::MAX && self.sym(i, j) {
                    repr[j] = i;
                }
            }
        }
        repr
    }

    /// Forward adjacency: `adj[i]` lists every `j` with `get(i, j)`.
    pub fn forward_index(&self) -> Vec<Vec<usize>> {
        (0..self.size)
            .map(|i| (0..self.size).filter(|&j| self.get(i, j)).collect())
            .collect()
    }

    /// Inverse adjacency: `adj[j]` lists every `i` with `get(i, j)`.
    pub fn inverse_index(&self) -> Vec<Vec<usize>> {
        (0..self.size)
            .map(|j| (0..self.size).filter(|&i| self.get(i, j)).collect())
            .collect()
    }

    pub fn is_reflexive(&self) -> bool {
        (0..self.size).all(|i| self.get(i, i))
    }

    pub fn is_transitive(&self) -> bool {
        for i in 0..self.size {
            for j in 0..self.size {
                if !self.get(i, j) {
                    continue;
                }
                for k in 0..self.size {
                    if self.get(j, k) && !self.get(i, k) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// A partition of `0..states` into disjoint, non-empty blocks, together with
/// the map from state to its block index. Produced by [`quotient`] from a
/// converged preorder: spec §3's "Partition–relation pair (Π, ≤)" data
/// model, here derived rather than maintained incrementally (see
/// `simulation.rs`).
#[derive(Debug, Clone)]
pub struct Partition {
    pub blocks: Vec<Vec<usize>>,
    pub block_of: Vec<usize>,
}

impl Partition {
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}

/// Factors a preorder into its block partition (by `⟷`-equivalence classes)
/// and the induced `≤` relation between blocks, such that
/// `sim.get(q, r) == result.1.get(block_of[q], block_of[r])` for every
/// `q, r`. Valid for any preorder: if `q ⟷ q'` then `q ⊑ x ⇔ q' ⊑ x` for all
/// `x` by transitivity, so the per-block relation is well-defined regardless
/// of which representative of a block is consulted.
pub fn quotient(sim: &BinaryRelation) -> (Partition, BinaryRelation) {
    let classes = sim.build_classes();
    let mut block_index = std::collections::HashMap::new();
    let mut blocks: Vec<Vec<usize>> = Vec::new();
    let mut block_of = vec![0usize; classes.len()];
    for (state, &repr) in classes.iter().enumerate() {
        let bi = *block_index.entry(repr).or_insert_with(|| {
            blocks.push(Vec::new());
            blocks.len() - 1
        });
        blocks[bi].push(state);
        block_of[state] = bi;
    }
    let mut rel = BinaryRelation::new(blocks.len());
    for (b1, members1) in blocks.iter().enumerate() {
        for (b2, members2) in blocks.iter().enumerate() {
            rel.set(b1, b2, sim.get(members1[0], members2[0]));
        }
    }
    (Partition { blocks, block_of }, rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_reflexive_and_only_diagonal() {
        let rel = BinaryRelation::identity(4);
        assert!(rel.is_reflexive());
        assert!(rel.is_transitive());
        assert!(!rel.get(0, 1));
    }

    #[test]
    fn resize_preserves_existing_entries() {
        let mut rel = BinaryRelation::new(2);
        rel.set(0, 1, true);
        rel.resize(20, false);
        assert!(rel.get(0, 1));
        assert!(!rel.get(0, 19));
    }

    #[test]
    fn build_classes_groups_symmetric_pairs() {
        let mut rel = BinaryRelation::new(3);
        rel.set(0, 1, true);
        rel.set(1, 0, true);
        rel.set(2, 2, true);
        let classes = rel.build_classes();
        assert_eq!(classes[0], 0);
        assert_eq!(classes[1], 0);
        assert_eq!(classes[2], 2);
    }

    #[test]
    fn new_entry_grows_capacity_amortised() {
        let mut rel = BinaryRelation::new(0);
        for i in 0..40 {
            let idx = rel.new_entry(false);
            assert_eq!(idx, i);
        }
        assert_eq!(rel.size(), 40);
    }

    #[test]
    fn quotient_collapses_mutually_related_states() {
        let mut sim = BinaryRelation::identity(3);
        sim.set(0, 1, true);
        sim.set(1, 0, true);
        let (partition, rel) = quotient(&sim);
        assert_eq!(partition.num_blocks(), 2);
        assert_eq!(partition.block_of[0], partition.block_of[1]);
        assert_ne!(partition.block_of[0], partition.block_of[2]);
        assert!(rel.get(partition.block_of[0], partition.block_of[0]));
    }
}
