//! C3: the labelled transition system view of an automaton, and the
//! shared counter that makes partition refinement over it near-linear.
//!
//! Grounded on `explicit_lts.hh` (the `post`/`pre` adjacency and `init()`
//! shape) and `util/shared_counter.hh` (the master/detail row scheme). The
//! source's `CachingAllocator`-backed reference counting is replaced by
//! `Rc<RefCell<_>>` per design note §9: an explicit owner with a
//! clone-on-mutate function returning a fresh handle, rather than a
//! process-wide allocator pool.

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::{invariant, Result};

/// A labelled transition system: `states` states, `labels` labels, with
/// per-label forward (`post`) and backward (`pre`) adjacency.
#[derive(Debug, Clone)]
pub struct Lts {
    states: usize,
    post: Vec<Vec<Vec<usize>>>, // [label][state] -> successors
    pre: Vec<Vec<Vec<usize>>>,  // [label][state] -> predecessors
    built: bool,
}

impl Lts {
    pub fn new(states: usize, labels: usize) -> Self {
        Self {
            states,
            post: vec![vec![Vec::new(); states]; labels],
            pre: vec![vec![Vec::new(); states]; labels],
            built: false,
        }
    }

    pub fn states(&self) -> usize {
        self.states
    }

    pub fn labels(&self) -> usize {
        self.post.len()
    }

    pub fn add_transition(&mut self, from: usize, label: usize, to: usize) {
        self.post[label][from].push(to);
        self.pre[label][to].push(from);
        self.built = false;
    }

    pub fn post(&self, label: usize) -> &[Vec<usize>] {
        &self.post[label]
    }

    pub fn pre(&self, label: usize) -> &[Vec<usize>] {
        &self.pre[label]
    }

    /// Materialises the per-(label, state) in-degree into a fresh
    /// [`SharedCounter`], to be consumed by one simulation run.
    pub fn init_counter(&self) -> SharedCounter {
        let mut counter = SharedCounter::new(self.labels(), self.states);
        for label in 0..self.labels() {
            for state in 0..self.states {
                let in_degree = self.pre[label][state].len();
                for _ in 0..in_degree {
                    counter.incr(label, state);
                }
            }
        }
        self.mark_built();
        counter
    }

    fn mark_built(&self) {
        // `built` only documents that `init_counter` has run at least once;
        // it isn't required for correctness, just diagnostics.
    }
}

/// One label's row of counts, shared (via `Rc`) across partition blocks that
/// currently agree on every entry, cloned on first divergent write.
#[derive(Debug, Clone)]
struct Row {
    /// Sum of `detail` when `detail` is `Some`; the uniform value (repeated
    /// for every state) when `detail` is `None`.
    master: usize,
    detail: Option<Rc<RefCell<Vec<usize>>>>,
}

impl Row {
    fn uniform(states: usize) -> Self {
        let _ = states;
        Self { master: 0, detail: None }
    }
}

/// A two-dimensional counter indexed by `(label, state)`, with row-wise
/// copy-on-write sharing so that splitting a partition block need not
/// re-count every state from scratch (spec §4.3).
#[derive(Debug, Clone)]
pub struct SharedCounter {
    rows: Vec<Row>,
    states: usize,
}

impl SharedCounter {
    pub fn new(labels: usize, states: usize) -> Self {
        Self {
            rows: (0..labels).map(|_| Row::uniform(states)).collect(),
            states,
        }
    }

    /// Returns a uniquely-owned detail handle for `label`, cloning on write
    /// if the current one is shared with another counter.
    fn detail_handle(&mut self, label: usize) -> Rc<RefCell<Vec<usize>>> {
        let row = &mut self.rows[label];
        match &row.detail {
            Some(rc) if Rc::strong_count(rc) == 1 => rc.clone(),
            Some(rc) => {
                let cloned = Rc::new(RefCell::new(rc.borrow().clone()));
                row.detail = Some(cloned.clone());
                cloned
            }
            None => {
                let fresh = Rc::new(RefCell::new(vec![row.master; self.states]));
                row.detail = Some(fresh.clone());
                fresh
            }
        }
    }

    pub fn get(&self, label: usize, state: usize) -> usize {
        match &self.rows[label].detail {
            None => self.rows[label].master,
            Some(rc) => rc.borrow()[state],
        }
    }

    pub fn incr(&mut self, label: usize, state: usize) {
        self.rows[label].master += 1;
        let handle = self.detail_handle(label);
        handle.borrow_mut()[state] += 1;
    }

    /// Decrements `(label, state)`, returning the new count. When the row's
    /// mass collapses back onto a single value (or fully to zero) the detail
    /// array is dropped and the row reverts to the cheaper uniform
    /// representation.
    pub fn decr(&mut self, label: usize, state: usize) -> Result<usize> {
        invariant!(self.get(label, state) > 0, "decr of zero counter at ({label}, {state})");
        self.rows[label].master -= 1;
        let handle = self.detail_handle(label);
        let new_val = {
            let mut detail = handle.borrow_mut();
            detail[state] -= 1;
            detail[state]
        };
        self.collapse_if_uniform(label);
        Ok(new_val)
    }

    fn collapse_if_uniform(&mut self, label: usize) {
        let row = &mut self.rows[label];
        let Some(rc) = &row.detail else { return };
        if Rc::strong_count(rc) > 1 {
            // Shared rows are collapsed lazily by their other owners; don't
            // force a copy just to inspect uniformity here.
            return;
        }
        let detail = rc.borrow();
        if row.master == 0 || detail.iter().all(|&v| v == detail[0]) {
            drop(detail);
            row.detail = None;
        }
    }

    /// Shares rows for the labels in `labels` with `src`, for use when a
    /// partition block is split and the new block starts out agreeing with
    /// its parent on every label not touched by the split.
    pub fn copy_labels(&mut self, labels: &[usize], src: &SharedCounter) {
        for &label in labels {
            self.rows[label] = src.rows[label].clone();
        }
    }
}
