//! C10: downward complementation for tree automata (spec §4.10).
//!
//! Grounded on `explicit_tree_comp_down.hh`'s `ExplicitDownwardComplementation`:
//! the macro-state cache (`stateCache`/`todo`), the dead/empty macro-state
//! being implicitly present and correctly marked accepting in the result,
//! and complementing by swapping acceptance on the determinized macro-states
//! are all taken from that construction.
//!
//! Simplification from the source (recorded in `DESIGN.md`): the source
//! enumerates every "choice function" assigning, for a symbol of arity `k`,
//! one transition tuple per sibling position out of the `k` top-down indexed
//! tuple lists reachable from the current macro-state, then takes the
//! per-position union of the states chosen at that position across every
//! assignment. That union-per-position result is exactly what the standard
//! subset-construction successor function computes directly:
//! `succ(S, symbol)[i] = { states at position i of a transition whose every
//! position intersects the macro-states already known at that position }`.
//! This module computes that successor directly via a worklist over known
//! macro-states, rather than materializing the source's explicit choice
//! function generator — the two are equivalent for the set of states
//! reachable under symbol `f`, which is all `succ` is ever used for. The
//! source's use of a supplied downward simulation preorder to keep
//! macro-states antichain-reduced is left out; callers that want a reduced
//! complement can run [`crate::ops::collapse`] with a simulation preorder
//! before complementing.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::automaton::ExplicitTreeAutomaton;
use crate::errors::Result;
use crate::state::StateId;

type Macro = BTreeSet<StateId>;

/// Cross product of `options[0] x options[1] x ...` excluding `pivot_pos`,
/// which is held fixed to `pivot`.
fn cartesian_except<'a>(
    options: &[&'a [Macro]],
    pivot_pos: usize,
    pivot: &'a Macro,
) -> Vec<Vec<&'a Macro>> {
    let mut result = vec![Vec::new()];
    for (pos, opts) in options.iter().enumerate() {
        let choices: &[Macro] = if pos == pivot_pos {
            std::slice::from_ref(pivot)
        } else {
            opts
        };
        let mut next = Vec::with_capacity(result.len() * choices.len().max(1));
        for prefix in &result {
            for candidate in choices {
                let mut extended = prefix.clone();
                extended.push(candidate);
                next.push(extended);
            }
        }
        result = next;
    }
    result
}

/// `{ p : exists transition symbol(s_0..s_{k-1}) -> p in aut, s_i in
/// macro_sets[i] for every position i }`.
fn successor(aut: &ExplicitTreeAutomaton, symbol_label: &str, arity: u32, macro_sets: &[&Macro]) -> Macro {
    let mut out = Macro::new();
    for (sym, children, parent) in aut.iter_transitions() {
        let info = aut.symbols.get(sym);
        if info.label != symbol_label || info.arity != arity || children.len() != macro_sets.len() {
            continue;
        }
        if children.iter().zip(macro_sets).all(|(c, set)| set.contains(c)) {
            out.insert(parent);
        }
    }
    out
}

/// Complements `aut` over its own symbol alphabet: determinizes it via
/// bottom-up subset construction (completing every transition, including
/// the dead/empty macro-state) and accepts exactly the macro-states that
/// contain none of `aut`'s original final states.
///
/// Trees built over symbols absent from `aut`'s alphabet are outside the
/// scope of this construction, per spec §4.10's note that complementation
/// is only meaningful relative to a fixed alphabet.
pub fn complement(aut: &ExplicitTreeAutomaton) -> Result<ExplicitTreeAutomaton> {
    let alphabet: Vec<(String, u32)> = aut
        .symbols
        .iter()
        .map(|(_, sym)| (sym.label.clone(), sym.arity))
        .collect();

    let mut index: HashMap<Macro, StateId> = HashMap::new();
    let mut worklist: VecDeque<Macro> = VecDeque::new();
    let mut dst = ExplicitTreeAutomaton::new();

    let mut intern = |index: &mut HashMap<Macro, StateId>, worklist: &mut VecDeque<Macro>, m: Macro| -> StateId {
        if let Some(&id) = index.get(&m) {
            id
        } else {
            let id = index.len() as StateId;
            index.insert(m.clone(), id);
            worklist.push_back(m);
            id
        }
    };

    for (label, arity) in &alphabet {
        if *arity != 0 {
            continue;
        }
        let macro_set: Macro = aut
            .leaf_transitions()
            .filter(|(sym, _)| aut.symbols.get(*sym).label == *label)
            .map(|(_, parent)| parent)
            .collect();
        let id = intern(&mut index, &mut worklist, macro_set);
        dst.add_transition(&[], label, id)?;
    }

    while let Some(pivot) = worklist.pop_front() {
        let known: Vec<Macro> = index.keys().cloned().collect();

        for (label, arity) in &alphabet {
            if *arity == 0 {
                continue;
            }
            let arity = *arity as usize;
            let per_position: Vec<&[Macro]> = (0..arity).map(|_| known.as_slice()).collect();

            for pivot_pos in 0..arity {
                for combo in cartesian_except(&per_position, pivot_pos, &pivot) {
                    let succ = successor(aut, label, arity as u32, &combo);
                    let succ_id = intern(&mut index, &mut worklist, succ);
                    let children: Vec<StateId> = combo
                        .iter()
                        .map(|m| *index.get(*m).expect("combo members are already interned"))
                        .collect();
                    dst.add_transition(&children, label, succ_id)?;
                }
            }
        }
    }

    let all_finals: BTreeSet<StateId> = aut.finals().iter().copied().collect();
    for (macro_set, &id) in &index {
        if macro_set.is_disjoint(&all_finals) {
            dst.set_final(id);
        }
    }

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_leaf_plus_unary(finalize: bool) -> ExplicitTreeAutomaton {
        let mut a = ExplicitTreeAutomaton::new();
        a.add_transition(&[], "a", 0).unwrap();
        a.add_transition(&[0], "f", 1).unwrap();
        if finalize {
            a.set_final(1);
        }
        a
    }

    #[test]
    fn complement_accepts_fewer_macro_states_when_original_has_finals() {
        let with_final = single_leaf_plus_unary(true);
        let without_final = single_leaf_plus_unary(false);
        let comp_with_final = complement(&with_final).unwrap();
        let comp_without_final = complement(&without_final).unwrap();
        // the same reachable macro-states are built in both cases, but one
        // fewer is accepting once the source automaton has a final state.
        assert!(comp_with_final.finals().len() < comp_without_final.finals().len());
    }

    #[test]
    fn complement_of_empty_language_accepts_the_leaf_macro_state() {
        let a = single_leaf_plus_unary(false);
        let comp = complement(&a).unwrap();
        assert!(!comp.finals().is_empty());
    }

    #[test]
    fn complement_gives_every_leaf_symbol_a_transition() {
        let a = single_leaf_plus_unary(true);
        let comp = complement(&a).unwrap();
        let a_symbol = comp.symbols.find("a", 0).unwrap();
        assert!(comp.states().any(|s| !comp.tuples_for(s, a_symbol).is_empty()));
    }

    #[test]
    fn complement_gives_every_known_macro_state_an_f_transition() {
        let a = single_leaf_plus_unary(true);
        let comp = complement(&a).unwrap();
        let f = comp.symbols.find("f", 1).unwrap();
        assert!(comp.states().any(|s| !comp.tuples_for(s, f).is_empty()));
    }
}
