//! Antichain-based language inclusion and simulation preorders for finite
//! tree and word automata.
//!
//! The decision-engine core lives across `antichain`/`relation`/`lts` (the
//! shared work structures), `simulation`/`translate` (preorder computation),
//! and `incl_upward`/`incl_downward`/`congruence`/`dispatch` (the inclusion
//! algorithms and their parameter dispatcher). `ops`/`complement`/`timbuk`
//! round out the library surface callers need to actually exercise that
//! core end to end: loading text, building and trimming automata, and
//! complementing one.

pub mod antichain;
pub mod automaton;
pub mod complement;
pub mod congruence;
pub mod dispatch;
pub mod errors;
pub mod incl_downward;
pub mod incl_upward;
pub mod lts;
pub mod ops;
pub mod relation;
pub mod simulation;
pub mod state;
pub mod timbuk;
pub mod translate;

pub use automaton::{ExplicitTreeAutomaton, ExplicitWordAutomaton};
pub use dispatch::{check_word_inclusion, TreeInclParams};
pub use errors::{LibError, Result};
pub use ops::{collapse, intersect, remove_unreachable, remove_useless, union, union_disjoint, DisjointUnion};
pub use relation::BinaryRelation;
pub use state::{StateDict, StateId};
pub use timbuk::AutomatonDescription;

use complement::complement as complement_tree;

/// Which of spec §6.4's four simulation flavours to compute.
///
/// `FaBackward` has no grounded translator anywhere in this crate (see
/// `DESIGN.md`) and always yields [`LibError::NotImplemented`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationKind {
    TaDownward,
    TaUpward,
    FaForward,
    FaBackward,
}

/// Loads Timbuk text into an automaton, per spec §6.5's `load`.
pub fn load(text: &str) -> Result<(ExplicitTreeAutomaton, StateDict)> {
    let desc = timbuk::parse(text)?;
    timbuk::to_automaton(&desc)
}

/// Complements a tree automaton over its own alphabet, per spec §6.5's
/// `complement(A, alphabet)` (the alphabet argument is `aut`'s own, since
/// this crate only ever complements relative to the symbols an automaton
/// already uses — see `complement::complement`'s doc comment).
pub fn complement(aut: &ExplicitTreeAutomaton) -> Result<ExplicitTreeAutomaton> {
    complement_tree(aut)
}

/// Computes a simulation preorder over a tree automaton, per spec §6.4/§6.5's
/// `compute_simulation`.
///
/// `TaUpward` first computes the downward preorder, since [`translate::translate_upward`]
/// needs it as its sibling-relatedness parameter — this crate's upward
/// simulation is always defined relative to an already-known downward one,
/// matching the source's own dependency between the two functors.
pub fn compute_tree_simulation(aut: &ExplicitTreeAutomaton, kind: SimulationKind) -> Result<BinaryRelation> {
    match kind {
        SimulationKind::TaDownward => {
            let translation = translate::translate_downward(aut);
            Ok(simulation::compute_simulation(&translation.lts, &translation.initial))
        }
        SimulationKind::TaUpward => {
            let downward = translate::translate_downward(aut);
            let downward_sim = simulation::compute_simulation(&downward.lts, &downward.initial);
            let upward = translate::translate_upward(aut, &downward_sim);
            Ok(simulation::compute_simulation(&upward.lts, &upward.initial))
        }
        SimulationKind::FaForward | SimulationKind::FaBackward => Err(LibError::InputError(
            "compute_tree_simulation only accepts TaDownward/TaUpward; \
             use compute_word_simulation for word automata"
                .into(),
        )),
    }
}

/// As [`compute_tree_simulation`], for word automata.
pub fn compute_word_simulation(aut: &ExplicitWordAutomaton, kind: SimulationKind) -> Result<BinaryRelation> {
    match kind {
        SimulationKind::FaForward => {
            let translation = translate::translate_nfa_forward(aut);
            Ok(simulation::compute_simulation(&translation.lts, &translation.initial))
        }
        SimulationKind::FaBackward => Err(LibError::NotImplemented(
            "backward word-automaton simulation has no translator in this crate".into(),
        )),
        SimulationKind::TaDownward | SimulationKind::TaUpward => Err(LibError::InputError(
            "compute_word_simulation only accepts FaForward/FaBackward; \
             use compute_tree_simulation for tree automata"
                .into(),
        )),
    }
}

/// Checks `L(smaller) subseteq L(bigger)` for tree automata, per spec §6.5's
/// `check_inclusion(S, B, incl_param) -> (bool, witness)`.
///
/// The witness, when inclusion fails, is `smaller` trimmed down to its
/// reachable-and-productive core via [`remove_unreachable`]/[`remove_useless`]
/// — a genuine subautomaton of `smaller`, but not a minimal one, matching
/// spec §7's "optional and lossy... callers must not rely on its minimality".
/// This crate makes no attempt at the source's heuristic witness-automaton
/// construction, which spec §9 itself documents as non-canonical.
pub fn check_tree_inclusion_witnessed(
    smaller: &ExplicitTreeAutomaton,
    bigger: &ExplicitTreeAutomaton,
    params: &TreeInclParams,
) -> Result<(bool, Option<ExplicitTreeAutomaton>)> {
    let holds = dispatch::check_tree_inclusion(smaller, bigger, params)?;
    if holds {
        return Ok((true, None));
    }
    let witness = remove_useless(&remove_unreachable(smaller)?)?;
    Ok((false, Some(witness)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_then_unary(leaf: &str, finalize: bool) -> ExplicitTreeAutomaton {
        let mut a = ExplicitTreeAutomaton::new();
        a.add_transition(&[], leaf, 0).unwrap();
        a.add_transition(&[0], "f", 1).unwrap();
        if finalize {
            a.set_final(1);
        }
        a
    }

    #[test]
    fn load_round_trips_a_leaf_automaton() {
        let text = "
            Ops a:0
            Automaton x
            States q0
            Final States q0
            Transitions
            a -> q0
        ";
        let (aut, _) = load(text).unwrap();
        assert_eq!(aut.num_states(), 1);
        assert_eq!(aut.finals().len(), 1);
    }

    #[test]
    fn ta_downward_and_upward_simulation_both_relate_every_state_to_itself() {
        let a = leaf_then_unary("a", true);
        let down = compute_tree_simulation(&a, SimulationKind::TaDownward).unwrap();
        let up = compute_tree_simulation(&a, SimulationKind::TaUpward).unwrap();
        for s in 0..a.num_states() as usize {
            assert!(down.get(s, s));
            assert!(up.get(s, s));
        }
    }

    #[test]
    fn fa_backward_simulation_is_not_implemented() {
        let a = ExplicitWordAutomaton::new();
        assert!(matches!(
            compute_word_simulation(&a, SimulationKind::FaBackward),
            Err(LibError::NotImplemented(_))
        ));
    }

    #[test]
    fn mismatched_simulation_kind_is_an_input_error() {
        let a = leaf_then_unary("a", true);
        assert!(matches!(
            compute_tree_simulation(&a, SimulationKind::FaForward),
            Err(LibError::InputError(_))
        ));
    }

    #[test]
    fn witnessed_inclusion_returns_none_on_success_and_a_subautomaton_on_failure() {
        let a = leaf_then_unary("a", true);
        let b = leaf_then_unary("a", true);
        let params = TreeInclParams::default();
        let (holds, witness) = check_tree_inclusion_witnessed(&a, &b, &params).unwrap();
        assert!(holds);
        assert!(witness.is_none());

        let c = leaf_then_unary("a", false);
        let (holds, witness) = check_tree_inclusion_witnessed(&a, &c, &params).unwrap();
        assert!(!holds);
        assert!(witness.is_some());
    }

    #[test]
    fn crate_level_complement_matches_the_complement_module_directly() {
        let a = leaf_then_unary("a", true);
        let via_lib = complement(&a).unwrap();
        let via_module = complement::complement(&a).unwrap();
        assert_eq!(via_lib.num_states(), via_module.num_states());
        assert_eq!(via_lib.finals().len(), via_module.finals().len());
    }
}
