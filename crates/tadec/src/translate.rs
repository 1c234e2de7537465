//! C5: automaton-to-LTS translators, one per simulation flavour (spec §4.5).
//!
//! Each translator builds an [`Lts`] plus an initial, coarse per-state
//! [`BinaryRelation`] suitable as the starting point for
//! [`crate::simulation::compute_simulation`]. Arity-`>1` (and arity-`0`)
//! tree transitions need a synthetic LTS state standing in for the whole
//! child tuple; arity-`1` transitions are inlined directly, matching the
//! source's "inline lhs of size 1" shortcut.
//!
//! Grounded on `ta_expl/explicit_tree_transl.hh` (`TranslateDownward`,
//! `TranslateUpward`) and `finite_aut/explicit_finite_transl.hh` (`Translate`,
//! used in place of the not-retrieved `TranslateToLTS` the NFA simulation
//! entry point calls — see `DESIGN.md`).

use std::collections::HashMap;

use crate::automaton::{ExplicitTreeAutomaton, ExplicitWordAutomaton};
use crate::relation::BinaryRelation;
use crate::state::{StateId, SymbolId, TupleId};
use crate::lts::Lts;

/// The result of a translation: the LTS itself, and a coarse initial
/// relation over `lts.states()` (not just the original automaton's states —
/// synthetic states are included and related reflexively) to seed
/// [`crate::simulation::compute_simulation`].
pub struct Translation {
    pub lts: Lts,
    pub initial: BinaryRelation,
}

/// Builds the block-indexed initial relation `0 = final, 1 = non-final`
/// (collapsed to a single block when one side is empty), shared by the
/// downward-style and NFA-forward translators: a non-final/non-accepting
/// state may be simulated by a final/accepting one, never the reverse.
fn final_nonfinal_relation(all_final: bool, all_nonfinal: bool) -> (usize, BinaryRelation) {
    if all_final || all_nonfinal {
        let mut rel = BinaryRelation::new(1);
        rel.set(0, 0, true);
        (1, rel)
    } else {
        let mut rel = BinaryRelation::new(2);
        rel.set(0, 0, true);
        rel.set(1, 0, true);
        rel.set(1, 1, true);
        (2, rel)
    }
}

/// Downward translation (spec §4.5 "downward translator"): tree states plus
/// one synthetic state per distinct arity-`!=1` child tuple actually used in
/// a transition, slot labels `numSymbols..numSymbols+maxArity` disjoint from
/// symbol labels. The initial relation is trivial (a single block), matching
/// `ComputeDownwardSimulation`'s no-partition `computeSimulation` overload.
pub fn translate_downward(aut: &ExplicitTreeAutomaton) -> Translation {
    let num_orig = aut.num_states() as usize;
    let num_symbols = aut.symbols.len();
    let max_arity = aut.symbols.max_arity() as usize;

    let mut lhs_of: HashMap<TupleId, usize> = HashMap::new();
    let mut next_state = num_orig;
    for parent in aut.states() {
        for (_, tuple_id) in aut.transitions_to(parent) {
            if aut.tuples.arity(tuple_id) != 1 {
                lhs_of.entry(tuple_id).or_insert_with(|| {
                    let s = next_state;
                    next_state += 1;
                    s
                });
            }
        }
    }

    let total_states = next_state;
    let labels = num_symbols + max_arity.max(1);
    let mut lts = Lts::new(total_states, labels);

    for parent in aut.states() {
        for (symbol, tuple_id) in aut.transitions_to(parent) {
            let parent = parent as usize;
            let symbol = symbol as usize;
            let children = aut.tuples.get(tuple_id);
            if children.len() == 1 {
                lts.add_transition(parent, symbol, children[0] as usize);
                continue;
            }
            let lhs = lhs_of[&tuple_id];
            lts.add_transition(parent, symbol, lhs);
            for (i, &child) in children.iter().enumerate() {
                lts.add_transition(lhs, num_symbols + i, child as usize);
            }
        }
    }

    Translation {
        lts,
        initial: BinaryRelation::full(total_states),
    }
}

/// One "environment": a tree transition with one child slot abstracted away,
/// grounded on `explicit_tree_transl.hh`'s `Env`. Two environments with
/// identical `(siblings, slot, symbol)` are the same LTS state; the source
/// additionally merges environments that are merely equivalent under the
/// caller's preorder `param` (a head-list lookup), an optimisation that only
/// narrows the antichain-search's starting partition and does not change the
/// converged simulation, so it is omitted here (see `DESIGN.md`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Env {
    siblings: Vec<StateId>,
    slot: usize,
    symbol: SymbolId,
}

/// Upward translation (spec §4.5 "upward translator"): a leaf state plus one
/// environment state per `(tuple, slot, symbol)` triple, related to the
/// parent state reached by that transition. `param` is the already-computed
/// downward simulation, used only to relate sibling environments to each
/// other (an environment can be simulated by another of the same slot/symbol
/// iff every sibling position agrees under `param`).
pub fn translate_upward(aut: &ExplicitTreeAutomaton, param: &BinaryRelation) -> Translation {
    let num_orig = aut.num_states() as usize;
    let num_symbols = aut.symbols.len();
    let env_label = num_symbols;
    let leaf_state = num_orig;

    let mut env_index: HashMap<Env, usize> = HashMap::new();
    let mut envs: Vec<Env> = Vec::new();
    let mut next_state = num_orig + 1;

    let mut edges: Vec<(usize, usize, usize)> = Vec::new(); // (from, label, to)

    for (symbol, children, parent) in aut.iter_transitions() {
        let parent = parent as usize;
        let symbol_usize = symbol as usize;
        match children.len() {
            0 => edges.push((leaf_state, symbol_usize, parent)),
            1 => edges.push((children[0] as usize, symbol_usize, parent)),
            _ => {
                for (i, &child) in children.iter().enumerate() {
                    let siblings: Vec<StateId> = children
                        .iter()
                        .enumerate()
                        .filter(|&(j, _)| j != i)
                        .map(|(_, &c)| c)
                        .collect();
                    let env = Env { siblings, slot: i, symbol };
                    let env_state = *env_index.entry(env.clone()).or_insert_with(|| {
                        let s = next_state;
                        next_state += 1;
                        envs.push(env);
                        s
                    });
                    edges.push((child as usize, env_label, env_state));
                    edges.push((env_state, symbol_usize, parent));
                }
            }
        }
    }

    let total_states = next_state;
    let mut lts = Lts::new(total_states, num_symbols + 1);
    for (from, label, to) in edges {
        lts.add_transition(from, label, to);
    }

    let finals = aut.finals();
    let all_final = (0..aut.num_states()).all(|s| finals.contains(&s));
    let all_nonfinal = finals.is_empty();
    let (base, block_rel) = final_nonfinal_relation(all_final, all_nonfinal);

    // state -> block: finals/non-finals for original states, a dedicated
    // block for the leaf state, one block per environment.
    let mut block_of = vec![0usize; total_states];
    for s in 0..num_orig {
        block_of[s] = if all_final || all_nonfinal {
            0
        } else if finals.contains(&(s as StateId)) {
            0
        } else {
            1
        };
    }
    let leaf_block = base;
    block_of[leaf_state] = leaf_block;
    let mut num_blocks = base + 1;
    let mut env_block_of = HashMap::new();
    for (idx, env) in envs.iter().enumerate() {
        let b = num_blocks;
        num_blocks += 1;
        env_block_of.insert(idx, b);
        block_of[num_orig + 1 + idx] = b;
    }

    let mut blocks = BinaryRelation::new(num_blocks);
    for b1 in 0..base {
        for b2 in 0..base {
            blocks.set(b1, b2, block_rel.get(b1, b2));
        }
    }
    blocks.set(leaf_block, leaf_block, true);
    for (i, env_i) in envs.iter().enumerate() {
        for (j, env_j) in envs.iter().enumerate() {
            if env_i.slot != env_j.slot || env_i.symbol != env_j.symbol {
                continue;
            }
            if env_i.siblings.len() != env_j.siblings.len() {
                continue;
            }
            let related = env_i
                .siblings
                .iter()
                .zip(env_j.siblings.iter())
                .all(|(&a, &b)| param.get(a as usize, b as usize));
            if related {
                blocks.set(env_block_of[&i], env_block_of[&j], true);
            }
        }
    }

    let mut initial = BinaryRelation::new(total_states);
    for p in 0..total_states {
        for q in 0..total_states {
            initial.set(p, q, blocks.get(block_of[p], block_of[q]));
        }
    }

    Translation { lts, initial }
}

/// Forward (word-automaton) translation, grounded on `Translate` in
/// `finite_aut/explicit_finite_transl.hh`: a dedicated start state connected
/// to every initial state via an extra label, final/non-final states split
/// into two blocks exactly as in the downward tree case.
pub fn translate_nfa_forward(aut: &ExplicitWordAutomaton) -> Translation {
    let num_orig = aut.num_states() as usize;
    let start_label = aut
        .iter_transitions()
        .map(|(_, sym, _)| sym)
        .max()
        .map(|m| m + 1)
        .unwrap_or(0) as usize;
    let start_state = num_orig;
    let total_states = num_orig + 1;

    let mut lts = Lts::new(total_states, start_label + 1);
    for (from, symbol, to) in aut.iter_transitions() {
        lts.add_transition(from as usize, symbol as usize, to as usize);
    }
    for &init in aut.initial() {
        lts.add_transition(start_state, start_label, init as usize);
    }

    let finals = aut.finals();
    let all_final = (0..aut.num_states()).all(|s| finals.contains(&s));
    let all_nonfinal = finals.is_empty();
    let (base, block_rel) = final_nonfinal_relation(all_final, all_nonfinal);

    let mut block_of = vec![0usize; total_states];
    for s in 0..num_orig {
        block_of[s] = if all_final || all_nonfinal {
            0
        } else if finals.contains(&(s as StateId)) {
            0
        } else {
            1
        };
    }
    let start_block = base;
    block_of[start_state] = start_block;

    let mut blocks = BinaryRelation::new(base + 1);
    for b1 in 0..base {
        for b2 in 0..base {
            blocks.set(b1, b2, block_rel.get(b1, b2));
        }
    }
    blocks.set(start_block, start_block, true);

    let mut initial = BinaryRelation::new(total_states);
    for p in 0..total_states {
        for q in 0..total_states {
            initial.set(p, q, blocks.get(block_of[p], block_of[q]));
        }
    }

    Translation { lts, initial }
}
