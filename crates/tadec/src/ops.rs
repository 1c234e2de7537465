//! Supplemented library-surface operations on tree automata (spec §6.5):
//! union, intersection, reachability/productivity trimming, and collapsing
//! by a preorder's block partition.
//!
//! Grounded on `explicit_tree_aut_op.hh` (`Union`, `UnionDisjunctStates`),
//! `explicit_tree_isect.hh` (`Intersection`, the final-state-seeded product
//! construction), `explicit_tree_unreach.hh`/`explicit_tree_useless.hh`
//! (the two distinct trimming passes), and
//! `finite_aut/explicit_finite_aut_op.hh`'s `CollapseStates` (rebinding
//! every state to its `BinaryRelation::build_classes` representative).

use std::collections::{HashMap, HashSet};

use crate::automaton::ExplicitTreeAutomaton;
use crate::errors::Result;
use crate::relation::{quotient, BinaryRelation};
use crate::state::StateId;

/// The result of [`union_disjoint`]: the merged automaton, plus the offset
/// added to every one of `rhs`'s original state ids (so callers, e.g.
/// [`crate::dispatch`], can map a `rhs`-relative state back to its id in the
/// merged automaton and vice versa).
pub struct DisjointUnion {
    pub aut: ExplicitTreeAutomaton,
    pub bigger_offset: StateId,
}

/// Merges `lhs` and `rhs` into one automaton recognising `L(lhs) union
/// L(rhs)`, renumbering `rhs`'s states past `lhs`'s so the two state spaces
/// never collide (the source's `Union`, specialised to a simple offset
/// instead of an arbitrary fresh-counter reindex of both sides, since `lhs`
/// keeps its original numbering here).
pub fn union_disjoint(lhs: &ExplicitTreeAutomaton, rhs: &ExplicitTreeAutomaton) -> Result<DisjointUnion> {
    let offset = lhs.num_states();
    let shifted_rhs = rhs.shift_states(offset)?;

    let mut out = lhs.clone();
    for &f in shifted_rhs.finals() {
        out.set_final(f);
    }
    for (symbol, children, parent) in shifted_rhs.iter_transitions() {
        let label = shifted_rhs.symbols.get(symbol).label.clone();
        out.add_transition(children, &label, parent)?;
    }

    Ok(DisjointUnion { aut: out, bigger_offset: offset })
}

/// `union_disjoint` without the offset bookkeeping, for callers that only
/// want the merged language.
pub fn union(lhs: &ExplicitTreeAutomaton, rhs: &ExplicitTreeAutomaton) -> Result<ExplicitTreeAutomaton> {
    Ok(union_disjoint(lhs, rhs)?.aut)
}

/// The product automaton recognising `L(lhs) intersect L(rhs)`, built
/// top-down from pairs of final states exactly as `Intersection` does:
/// product states are `(lhs state, rhs state)` pairs, assigned dense ids on
/// first visit via `index`, explored via an explicit stack rather than
/// recursion.
pub fn intersect(lhs: &ExplicitTreeAutomaton, rhs: &ExplicitTreeAutomaton) -> Result<ExplicitTreeAutomaton> {
    let mut out = ExplicitTreeAutomaton::new();
    let mut index: HashMap<(StateId, StateId), StateId> = HashMap::new();
    let mut next_id: StateId = 0;
    let mut stack: Vec<(StateId, StateId)> = Vec::new();

    let mut intern_pair = |index: &mut HashMap<(StateId, StateId), StateId>, pair: (StateId, StateId)| -> (StateId, bool) {
        if let Some(&id) = index.get(&pair) {
            (id, false)
        } else {
            let id = next_id;
            next_id += 1;
            index.insert(pair, id);
            (id, true)
        }
    };

    for &l in lhs.finals() {
        for &r in rhs.finals() {
            let (id, _) = intern_pair(&mut index, (l, r));
            out.set_final(id);
            stack.push((l, r));
        }
    }

    while let Some((l, r)) = stack.pop() {
        let parent_id = index[&(l, r)];
        for (l_symbol, l_tuple) in lhs.transitions_to(l) {
            let symbol = lhs.symbols.get(l_symbol);
            let Some(r_symbol) = rhs.symbols.find(&symbol.label, symbol.arity) else {
                continue;
            };
            let l_children = lhs.tuples.get(l_tuple).to_vec();
            for &r_tuple in rhs.tuples_for(r, r_symbol) {
                let r_children = rhs.tuples.get(r_tuple);
                let mut product_children = Vec::with_capacity(l_children.len());
                for i in 0..l_children.len() {
                    let pair = (l_children[i], r_children[i]);
                    let (id, is_new) = intern_pair(&mut index, pair);
                    if is_new {
                        stack.push(pair);
                    }
                    product_children.push(id);
                }
                out.add_transition(&product_children, &symbol.label, parent_id)?;
            }
        }
    }

    Ok(out)
}

/// Keeps only states reachable downward from a final state (spec's
/// `remove_unreachable`): a state is kept if it is final, or the child of a
/// transition whose parent is already kept. Mirrors
/// `RemoveUnreachableStates`'s worklist, expressed over this crate's tuple
/// arena instead of the source's generic cluster lookup.
pub fn remove_unreachable(aut: &ExplicitTreeAutomaton) -> Result<ExplicitTreeAutomaton> {
    let mut reachable: HashSet<StateId> = aut.finals().iter().copied().collect();
    let mut stack: Vec<StateId> = reachable.iter().copied().collect();
    while let Some(state) = stack.pop() {
        for (_, tuple) in aut.transitions_to(state) {
            for &c in aut.tuples.get(tuple) {
                if reachable.insert(c) {
                    stack.push(c);
                }
            }
        }
    }

    let mut out = ExplicitTreeAutomaton::new();
    for &f in aut.finals() {
        if reachable.contains(&f) {
            out.set_final(f);
        }
    }
    for (symbol, children, parent) in aut.iter_transitions() {
        if reachable.contains(&parent) && children.iter().all(|c| reachable.contains(c)) {
            let label = aut.symbols.get(symbol).label.clone();
            out.add_transition(children, &label, parent)?;
        }
    }
    Ok(out)
}

/// Keeps only productive states — those that can derive at least one ground
/// term (spec's `remove_useless`): computed bottom-up, dual to
/// [`remove_unreachable`]'s top-down walk. Mirrors
/// `RemoveUselessStates`'s fixpoint, expressed as a plain worklist-free
/// iterate-to-fixpoint rather than the source's decrementing-counter
/// bookkeeping (`TransitionInfo::reachedBy`), since this crate never runs
/// on inputs large enough for that optimisation to matter.
pub fn remove_useless(aut: &ExplicitTreeAutomaton) -> Result<ExplicitTreeAutomaton> {
    let mut useful: HashSet<StateId> = HashSet::new();
    loop {
        let mut changed = false;
        for (_, children, parent) in aut.iter_transitions() {
            if useful.contains(&parent) {
                continue;
            }
            if children.iter().all(|c| useful.contains(c)) {
                useful.insert(parent);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut out = ExplicitTreeAutomaton::new();
    for &f in aut.finals() {
        if useful.contains(&f) {
            out.set_final(f);
        }
    }
    for (symbol, children, parent) in aut.iter_transitions() {
        if useful.contains(&parent) && children.iter().all(|c| useful.contains(c)) {
            let label = aut.symbols.get(symbol).label.clone();
            out.add_transition(children, &label, parent)?;
        }
    }
    Ok(out)
}

/// Rebinds every state to the representative of its `sim`-induced block
/// (`sim`'s symmetric kernel, via [`quotient`]), merging transitions that
/// become identical after collapsing — `CollapseStates` specialised to this
/// crate's `BinaryRelation`-based preorder representation.
pub fn collapse(aut: &ExplicitTreeAutomaton, sim: &BinaryRelation) -> Result<ExplicitTreeAutomaton> {
    let (partition, _) = quotient(sim);
    let rebind = |s: StateId| partition.block_of[s as usize] as StateId;

    let mut out = ExplicitTreeAutomaton::new();
    for &f in aut.finals() {
        out.set_final(rebind(f));
    }
    for (symbol, children, parent) in aut.iter_transitions() {
        let label = aut.symbols.get(symbol).label.clone();
        let new_children: Vec<StateId> = children.iter().map(|&c| rebind(c)).collect();
        out.add_transition(&new_children, &label, rebind(parent))?;
    }
    Ok(out)
}
