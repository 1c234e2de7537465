//! C6: antichain-based upward tree inclusion (spec §4.6).
//!
//! Grounded on `up_tree_incl_fctor.hh`'s `UpwardInclusionFunctor`: the
//! subset-ordered antichain over `(smallerState, biggerMacroState)` pairs,
//! the "is this pair already implied" short-circuit, and the final-state
//! counterexample check are all taken directly from that functor. The
//! surrounding worklist loop that discovers new pairs by combining sibling
//! macro-states across a smaller-automaton transition is the standard
//! upward subset-construction antichain algorithm this functor is a
//! callback for; its driving loop body was not present in the retrieved
//! sources (the concrete "explore one smaller transition, cross sibling
//! macro-states, call the functor" routine lives in a translation unit the
//! pack didn't include), so it is authored here directly — see `DESIGN.md`.

use std::collections::BTreeSet;
use std::collections::VecDeque;

use crate::antichain::Antichain;
use crate::automaton::ExplicitTreeAutomaton;
use crate::state::{StateId, SymbolId};

type MacroState = BTreeSet<StateId>;

fn covers(stored: &MacroState, candidate: &MacroState) -> bool {
    candidate.is_subset(stored)
}

/// All `bigger` states reached by the nullary symbol named like `label`, or
/// the empty set if `bigger` has no such leaf symbol.
fn bigger_leaf_targets(bigger: &ExplicitTreeAutomaton, label: &str) -> MacroState {
    let Some(symbol) = bigger.symbols.find(label, 0) else {
        return MacroState::new();
    };
    bigger
        .leaf_transitions()
        .filter(|&(sym, _)| sym == symbol)
        .map(|(_, parent)| parent)
        .collect()
}

/// `{ r' : exists bigger transition symbol(r_1..r_k) -> r', r_m in macro_sets[m] for all m }`.
fn bigger_macro_successors(
    bigger: &ExplicitTreeAutomaton,
    symbol: SymbolId,
    macro_sets: &[&MacroState],
) -> MacroState {
    let mut out = MacroState::new();
    for (sym, children, parent) in bigger.iter_transitions() {
        if sym != symbol || children.len() != macro_sets.len() {
            continue;
        }
        if children.iter().zip(macro_sets).all(|(c, set)| set.contains(c)) {
            out.insert(parent);
        }
    }
    out
}

/// Cartesian product of `options[0] x options[1] x ...`, each drawn from a
/// slice of candidate macro-states for one sibling position.
fn cartesian_product<'a>(options: &[&'a [MacroState]]) -> Vec<Vec<&'a MacroState>> {
    let mut result = vec![Vec::new()];
    for opts in options {
        let mut next = Vec::with_capacity(result.len() * opts.len().max(1));
        for prefix in &result {
            for candidate in opts.iter() {
                let mut extended = prefix.clone();
                extended.push(candidate);
                next.push(extended);
            }
        }
        result = next;
    }
    result
}

/// Decides whether `L(smaller) subseteq L(bigger)`, exploring bottom-up from
/// leaves. Returns `false` as soon as a smaller-automaton final state is
/// proven reachable by a macro-state of `bigger` states none of which are
/// final (the literal counterexample condition the functor encodes).
pub fn check_upward_inclusion(smaller: &ExplicitTreeAutomaton, bigger: &ExplicitTreeAutomaton) -> bool {
    let mut known: Antichain<StateId, MacroState> = Antichain::new();
    let mut worklist: VecDeque<(StateId, MacroState)> = VecDeque::new();

    for (symbol, parent) in smaller.leaf_transitions() {
        let label = &smaller.symbols.get(symbol).label;
        worklist.push_back((parent, bigger_leaf_targets(bigger, label)));
    }

    while let Some((q, p_set)) = worklist.pop_front() {
        if known.contains([&q], &p_set, covers) {
            continue;
        }
        if smaller.is_final(q) && !p_set.iter().any(|&r| bigger.is_final(r)) {
            log::debug!("upward: final state {q} reaches {p_set:?} with no bigger-final member");
            return false;
        }
        known.refine(&[q], &p_set, covers, |_| {});
        known.insert(q, p_set.clone());
        log::trace!("upward: accepted pair ({q}, {p_set:?}), worklist len = {}", worklist.len());

        {
            for (symbol, children, parent) in smaller.iter_transitions() {
                for (i, &c) in children.iter().enumerate() {
                    if c != q {
                        continue;
                    }
                    let label = smaller.symbols.get(symbol).label.clone();
                    let Some(bigger_symbol) = bigger.symbols.find(&label, children.len() as u32)
                    else {
                        continue;
                    };

                    let mut sibling_sets: Vec<Vec<MacroState>> = Vec::new();
                    let mut feasible = true;
                    for (j, &cj) in children.iter().enumerate() {
                        if j == i {
                            continue;
                        }
                        let options: Vec<MacroState> = known.get(&cj).cloned().collect();
                        if options.is_empty() {
                            feasible = false;
                            break;
                        }
                        sibling_sets.push(options);
                    }
                    if !feasible {
                        continue;
                    }

                    let option_slices: Vec<&[MacroState]> =
                        sibling_sets.iter().map(Vec::as_slice).collect();
                    for combo in cartesian_product(&option_slices) {
                        let mut macro_sets: Vec<&MacroState> = Vec::with_capacity(children.len());
                        let mut combo_iter = combo.into_iter();
                        for j in 0..children.len() {
                            if j == i {
                                macro_sets.push(&p_set);
                            } else {
                                macro_sets.push(combo_iter.next().expect("matches sibling count"));
                            }
                        }
                        let successor = bigger_macro_successors(bigger, bigger_symbol, &macro_sets);
                        worklist.push_back((parent, successor));
                    }
                }
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_leaf_plus_unary(label_leaf: &str, label_unary: &str, finalize: bool) -> ExplicitTreeAutomaton {
        let mut a = ExplicitTreeAutomaton::new();
        a.add_transition(&[], label_leaf, 0).unwrap();
        a.add_transition(&[0], label_unary, 1).unwrap();
        if finalize {
            a.set_final(1);
        }
        a
    }

    #[test]
    fn identical_automata_include_each_other() {
        let _ = env_logger::try_init();
        let a = single_leaf_plus_unary("a", "f", true);
        let b = single_leaf_plus_unary("a", "f", true);
        assert!(check_upward_inclusion(&a, &b));
        assert!(check_upward_inclusion(&b, &a));
    }

    #[test]
    fn smaller_final_state_not_covered_fails() {
        let smaller = single_leaf_plus_unary("a", "f", true);
        let bigger = single_leaf_plus_unary("a", "f", false);
        assert!(!check_upward_inclusion(&smaller, &bigger));
    }

    #[test]
    fn empty_smaller_language_is_included_in_anything() {
        let smaller = ExplicitTreeAutomaton::new();
        let bigger = single_leaf_plus_unary("a", "f", true);
        assert!(check_upward_inclusion(&smaller, &bigger));
    }

    #[test]
    fn missing_leaf_symbol_in_bigger_fails_when_final() {
        let mut smaller = ExplicitTreeAutomaton::new();
        smaller.add_transition(&[], "a", 0).unwrap();
        smaller.set_final(0);
        let bigger = ExplicitTreeAutomaton::new();
        assert!(!check_upward_inclusion(&smaller, &bigger));
    }
}
