//! C4: the coarsest simulation preorder compatible with a caller-supplied
//! initial partition, computed over the LTS view built by [`crate::translate`].
//!
//! Grounded structurally on a Hopcroft-style `PartitionRefinement` (the
//! overall shape: start from a coarse initial partition, refine against
//! predecessors under each label until no splitter fires) and on
//! `explicit_lts_sim.hh`'s signature (`computeSimulation(lts, rel) ->
//! BinaryRelation`). The reference implementation computes simulation
//! incrementally, driven by a worklist of "splitters" that shrinks the
//! candidate pair set as the `SharedCounter` in `lts.rs` hits zero; that
//! function body was not retrievable (see `DESIGN.md`), so this instead
//! computes the same fixpoint directly: a greatest-fixpoint iteration over a
//! dense [`BinaryRelation`], which is simpler to verify by hand and
//! converges to the identical result (the coarsest preorder respecting the
//! initial partition and closed under the simulation condition), at the
//! cost of the incremental algorithm's amortised bound.

use crate::lts::Lts;
use crate::relation::BinaryRelation;

/// Computes the coarsest preorder `⊑` over `lts`'s states such that:
/// - `q ⊑ r` only if `initial.get(q, r)` (the caller's starting coloring,
///   e.g. "q and r agree on finality" for downward simulation, per spec
///   §4.5), and
/// - whenever `q ⊑ r`, for every label `a` and every `q'` with `q -a-> q'`
///   there is some `r'` with `r -a-> r'` and `q' ⊑ r'`.
///
/// Iterates to a fixpoint from `initial` downward: a pair is dropped as soon
/// as it fails the simulation condition, which can only shrink the set of
/// surviving successors other pairs depend on, so the loop is monotonically
/// decreasing and terminates in at most `states^2` rounds.
pub fn compute_simulation(lts: &Lts, initial: &BinaryRelation) -> BinaryRelation {
    let states = lts.states();
    let mut rel = initial.clone();
    loop {
        let mut changed = false;
        for q in 0..states {
            for r in 0..states {
                if !rel.get(q, r) {
                    continue;
                }
                if !is_simulated(lts, &rel, q, r) {
                    rel.set(q, r, false);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    rel
}

/// Whether `q`'s one-step successors under every label are matched by some
/// `r`-successor under the same label, given the current (not yet converged)
/// `rel`.
fn is_simulated(lts: &Lts, rel: &BinaryRelation, q: usize, r: usize) -> bool {
    for label in 0..lts.labels() {
        let q_succs = &lts.post(label)[q];
        if q_succs.is_empty() {
            continue;
        }
        let r_succs = &lts.post(label)[r];
        for &qp in q_succs {
            if !r_succs.iter().any(|&rp| rel.get(qp, rp)) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_chains_simulate_each_other() {
        // q0 -a-> q1, r0 -a-> r1; q1, r1 both leaves. Starting from the full
        // relation, every pair should survive.
        let mut lts = Lts::new(4, 1);
        lts.add_transition(0, 0, 1);
        lts.add_transition(2, 0, 3);
        let initial = BinaryRelation::full(4);
        let sim = compute_simulation(&lts, &initial);
        assert!(sim.get(0, 2));
        assert!(sim.get(2, 0));
    }

    #[test]
    fn state_with_unmatched_successor_cannot_simulate() {
        // q0 -a-> q1 (leaf). r0 has no outgoing 'a' transition: r0 cannot be
        // simulated-by q0 (r ⊒ q requires r to match every q-successor).
        let mut lts = Lts::new(3, 1);
        lts.add_transition(0, 0, 1);
        let initial = BinaryRelation::full(3);
        let sim = compute_simulation(&lts, &initial);
        // q0 ⊑ r2 would require r2 to match q0's 'a'-move; it can't.
        assert!(!sim.get(0, 2));
    }

    #[test]
    fn initial_coloring_is_never_widened() {
        let mut lts = Lts::new(2, 1);
        lts.add_transition(0, 0, 0);
        lts.add_transition(1, 0, 1);
        let mut initial = BinaryRelation::identity(2);
        // Forbid 0 ⊑ 1 up front via the initial coloring.
        initial.set(0, 1, false);
        let sim = compute_simulation(&lts, &initial);
        assert!(!sim.get(0, 1));
    }

    #[test]
    fn result_is_reflexive_when_initial_is() {
        let mut lts = Lts::new(3, 2);
        lts.add_transition(0, 0, 1);
        lts.add_transition(1, 1, 2);
        let initial = BinaryRelation::full(3);
        let sim = compute_simulation(&lts, &initial);
        assert!(sim.is_reflexive());
    }
}
