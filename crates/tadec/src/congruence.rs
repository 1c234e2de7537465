//! C8: bisimulation-up-to-congruence NFA inclusion (spec §4.8).
//!
//! Grounded on `finite_aut/explicit_finite_congr_fctor.hh`'s
//! `ExplicitFACongrFunctor`: a LIFO worklist (`next_`) of macrostate pairs,
//! a processed-pairs list (`relation_`) doubling as the rewriting-rule set
//! for `GetCongrClosure`, and the "both sides must agree on whether the post
//! macrostate contains a final state" failure condition.

use std::collections::{BTreeSet, HashSet};

use crate::automaton::ExplicitWordAutomaton;
use crate::state::{StateId, SymbolId};

type Macro = BTreeSet<StateId>;

/// Grows `set` by repeatedly unioning in either side of any rule (from
/// `next` or `relation`) whose macrostate is already a subset of `set` —
/// the congruence-closure rewriting step `GetCongrClosure` performs.
fn congruence_closure(set: &mut Macro, next: &[(Macro, Macro)], relation: &[(Macro, Macro)]) {
    loop {
        let mut changed = false;
        for (a, b) in next.iter().chain(relation.iter()) {
            let rule_fires = (!a.is_empty() && a.is_subset(set)) || (!b.is_empty() && b.is_subset(set));
            if !rule_fires {
                continue;
            }
            let before = set.len();
            set.extend(a.iter().copied());
            set.extend(b.iter().copied());
            if set.len() != before {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn to_hash(set: &Macro) -> HashSet<StateId> {
    set.iter().copied().collect()
}

fn any_final(aut: &ExplicitWordAutomaton, set: &Macro) -> bool {
    set.iter().any(|&s| aut.is_final(s))
}

/// Decides `L(smaller) subseteq L(bigger)` via bisimulation up to
/// congruence: explores macrostate pairs reachable from the respective
/// initial macrostates, accepting a pair outright once its two sides'
/// congruence closures coincide (they can never again diverge), and failing
/// as soon as a symbol's post macrostates disagree on reaching a final
/// state.
pub fn check_congruence_inclusion(smaller: &ExplicitWordAutomaton, bigger: &ExplicitWordAutomaton) -> bool {
    let smaller_init: Macro = smaller.initial().iter().copied().collect();
    let bigger_init: Macro = bigger.initial().iter().copied().collect();
    if any_final(smaller, &smaller_init) != any_final(bigger, &bigger_init) {
        return false;
    }

    let mut next: Vec<(Macro, Macro)> = vec![(smaller_init, bigger_init)];
    let mut relation: Vec<(Macro, Macro)> = Vec::new();

    while let Some((s, b)) = next.pop() {
        let mut congr_s = s.clone();
        congruence_closure(&mut congr_s, &next, &relation);
        let mut congr_b = b.clone();
        congruence_closure(&mut congr_b, &next, &relation);
        if !congr_s.is_empty() && congr_s == congr_b {
            log::trace!("congruence: pair ({s:?}, {b:?}) skipped, closures coincide");
            continue;
        }

        let mut symbols: BTreeSet<SymbolId> = BTreeSet::new();
        symbols.extend(smaller.enabled_symbols(&to_hash(&s)));
        symbols.extend(bigger.enabled_symbols(&to_hash(&b)));

        let mut new_pairs = Vec::new();
        for symbol in symbols {
            let new_s: Macro = smaller.post(&to_hash(&s), symbol).into_iter().collect();
            let new_b: Macro = bigger.post(&to_hash(&b), symbol).into_iter().collect();
            if any_final(smaller, &new_s) != any_final(bigger, &new_b) {
                log::debug!("congruence: symbol {symbol:?} splits acceptance between {new_s:?} and {new_b:?}");
                return false;
            }
            if !new_s.is_empty() || !new_b.is_empty() {
                new_pairs.push((new_s, new_b));
            }
        }
        next.extend(new_pairs);
        relation.push((s, b));
    }

    true
}
