//! C7: antichain-based downward tree inclusion (spec §4.7).
//!
//! Grounded on `down_tree_incl_nouseless_fctor.hh`'s
//! `DownwardInclusionNoUselessFunctor`: the three-antichain shape (an
//! in-progress `active` list used to break cycles optimistically, a success
//! cache `incl_cache`, and a failure cache `noncl_cache`, each with its own
//! subset-direction comparator) is taken directly from that functor, as is
//! trying a single matching bigger tuple before falling back to a
//! choice-function decomposition, and `InclACComparer`/`InclACComparerStrict`
//! for the strict/non-strict cache comparator dial.
//!
//! When no single bigger tuple matches a smaller tuple position-for-position,
//! the functor enumerates every function assigning each candidate bigger
//! tuple to one position of the smaller tuple
//! (`SequentialChoiceFunctionGenerator`) and requires that, for every such
//! assignment, at least one position's *combined* assignees cover that
//! position's child. A per-position union of *all* candidate tuples'
//! components, independent of any single consistent assignment, is strictly
//! weaker than that and unsound: it can accept transitions no choice
//! function actually covers (see
//! `reviewer_counterexample_from_union_fallback_is_rejected` below). This
//! module enumerates choice functions directly instead of that union.
//!
//! `down_tree_opt_incl_fctor.hh` additionally gates the nouseless shortcut
//! behind both inputs being free of useless states; when either automaton
//! has useless states, this module trims both with
//! [`crate::ops::remove_useless`] first (language- and id-preserving, per
//! `ops.rs`'s construction) rather than maintaining a second,
//! separately-verified algorithm for that case.

use std::collections::{BTreeSet, HashMap};

use crate::antichain::Antichain;
use crate::automaton::ExplicitTreeAutomaton;
use crate::errors::Result;
use crate::ops::remove_useless;
use crate::state::StateId;

pub type BiggerSet = BTreeSet<StateId>;

/// The three dials spec §4.7 names, plus the no-useless-states fast path,
/// bundled for [`check_downward_inclusion_with`] /
/// [`check_downward_inclusion_from_with`].
#[derive(Debug, Clone, Copy)]
pub struct DownwardConfig {
    /// `true` (default): the recursive formulation, breaking cycles via an
    /// in-progress `active` list (co-inductive assume-then-check). `false`:
    /// a non-recursive worklist variant that iterates a growing set of
    /// `(state, bigger-set)` candidates to a monotonically-shrinking
    /// fixpoint, the same greatest-fixpoint technique
    /// [`crate::simulation::compute_simulation`] uses for its dual
    /// (upward-growing) relation.
    pub use_recursion: bool,
    /// Whether `expand` memoises success/failure in the two antichains at
    /// all. Off by default, matching spec §4.7's stated default — caching
    /// only affects how much work is repeated, never correctness, since the
    /// recursion's own `active` list already breaks genuine cycles.
    pub cache_implications: bool,
    /// When caching is on, whether a cached pair must be a *strict* subset
    /// of the query to short-circuit it (`InclACComparerStrict`) or a
    /// non-strict one is enough (`InclACComparer`, the default).
    pub strict_subsumption: bool,
}

impl Default for DownwardConfig {
    fn default() -> Self {
        Self { use_recursion: true, cache_implications: false, strict_subsumption: false }
    }
}

fn subsumes(strict: bool, stored: &BiggerSet, query: &BiggerSet) -> bool {
    if strict {
        stored.is_subset(query) && stored.len() < query.len()
    } else {
        stored.is_subset(query)
    }
}

fn fail_subsumes(strict: bool, stored: &BiggerSet, query: &BiggerSet) -> bool {
    if strict {
        query.is_subset(stored) && query.len() < stored.len()
    } else {
        query.is_subset(stored)
    }
}

/// All functions assigning each of `len` candidate tuples to one of `range`
/// smaller-tuple positions — `SequentialChoiceFunctionGenerator` minus its
/// duplicate-final-combination quirk (an artifact of how it detects
/// termination, not part of the semantics): this enumerates the `range^len`
/// combinations exactly once each via a plain base-`range` counter.
fn choice_functions(len: usize, range: usize) -> impl Iterator<Item = Vec<usize>> {
    let total = range.pow(len as u32);
    (0..total).map(move |mut n| {
        let mut cf = vec![0usize; len];
        for slot in cf.iter_mut() {
            *slot = n % range;
            n /= range;
        }
        cf
    })
}

/// Shared transition-matching logic for both the recursive and worklist
/// checkers: decides whether every smaller-automaton transition reaching `q`
/// is covered by `r_set`, deferring each child position's coverage to
/// `sub_holds`. Kept as a free function so neither checker duplicates the
/// choice-function enumeration.
fn transitions_hold(
    smaller: &ExplicitTreeAutomaton,
    bigger: &ExplicitTreeAutomaton,
    q: StateId,
    r_set: &BiggerSet,
    mut sub_holds: impl FnMut(StateId, &BiggerSet) -> bool,
) -> bool {
    let transitions: Vec<_> = smaller.transitions_to(q).collect();
    for (symbol, tuple) in transitions {
        let label = smaller.symbols.get(symbol).label.clone();
        let arity = smaller.symbols.get(symbol).arity;
        let lhs_children: Vec<StateId> = smaller.tuples.get(tuple).to_vec();

        let Some(bigger_symbol) = bigger.symbols.find(&label, arity) else {
            return false;
        };

        let rhs_tuples: Vec<Vec<StateId>> = r_set
            .iter()
            .flat_map(|&r| bigger.tuples_for(r, bigger_symbol))
            .map(|&t| bigger.tuples.get(t).to_vec())
            .collect();

        if rhs_tuples.is_empty() {
            return false;
        }

        if arity == 0 {
            continue; // a matching nullary rhs transition exists; nothing more to check
        }

        let matched = rhs_tuples.iter().any(|rhs| {
            lhs_children
                .iter()
                .zip(rhs.iter())
                .all(|(&c, &d)| sub_holds(c, &BiggerSet::from([d])))
        });
        if matched {
            continue;
        }

        let arity = arity as usize;
        let mut any_cf_unsatisfied = false;
        for cf in choice_functions(rhs_tuples.len(), arity) {
            let mut found = false;
            for tuple_pos in 0..arity {
                let rhs_set_for_pos: BiggerSet = cf
                    .iter()
                    .enumerate()
                    .filter(|&(_, &assigned)| assigned == tuple_pos)
                    .map(|(cf_index, _)| rhs_tuples[cf_index][tuple_pos])
                    .collect();
                if rhs_set_for_pos.is_empty() {
                    continue;
                }
                if sub_holds(lhs_children[tuple_pos], &rhs_set_for_pos) {
                    found = true;
                    break;
                }
            }
            if !found {
                any_cf_unsatisfied = true;
                break;
            }
        }
        if any_cf_unsatisfied {
            return false;
        }
    }
    true
}

struct DownwardChecker<'a> {
    smaller: &'a ExplicitTreeAutomaton,
    bigger: &'a ExplicitTreeAutomaton,
    config: DownwardConfig,
    active: Vec<(StateId, BiggerSet)>,
    incl_cache: Antichain<StateId, BiggerSet>,
    noncl_cache: Antichain<StateId, BiggerSet>,
}

impl<'a> DownwardChecker<'a> {
    fn new(smaller: &'a ExplicitTreeAutomaton, bigger: &'a ExplicitTreeAutomaton, config: DownwardConfig) -> Self {
        Self {
            smaller,
            bigger,
            config,
            active: Vec::new(),
            incl_cache: Antichain::new(),
            noncl_cache: Antichain::new(),
        }
    }

    /// `expand` in the source: decides `q`'s language is covered by the
    /// union of languages of the states in `r_set`.
    fn expand(&mut self, q: StateId, r_set: &BiggerSet) -> bool {
        if self
            .active
            .iter()
            .any(|(aq, ar)| *aq == q && ar.is_subset(r_set))
        {
            return true;
        }

        let strict = self.config.strict_subsumption;
        let cache_on = self.config.cache_implications;

        if cache_on && self.incl_cache.contains([&q], r_set, |stored, query| subsumes(strict, stored, query)) {
            return true;
        }
        if cache_on && self.noncl_cache.contains([&q], r_set, |stored, query| fail_subsumes(strict, stored, query)) {
            return false;
        }
        if self.smaller.is_final(q) && !r_set.iter().any(|&r| self.bigger.is_final(r)) {
            if cache_on {
                self.noncl_cache.insert(q, r_set.clone());
            }
            return false;
        }

        self.active.push((q, r_set.clone()));
        let smaller = self.smaller;
        let bigger = self.bigger;
        let holds = transitions_hold(smaller, bigger, q, r_set, &mut |c, s: &BiggerSet| self.expand(c, s));
        self.active.pop();

        if cache_on {
            if holds {
                self.incl_cache
                    .refine(&[q], r_set, |stored, query| subsumes(strict, stored, query), |_| {});
                self.incl_cache.insert(q, r_set.clone());
            } else {
                self.noncl_cache
                    .refine(&[q], r_set, |stored, query| fail_subsumes(strict, stored, query), |_| {});
                self.noncl_cache.insert(q, r_set.clone());
            }
        }
        log::trace!("downward: expand({q}, {r_set:?}) = {holds}");
        holds
    }
}

/// Non-recursive counterpart to [`DownwardChecker`]: decides the same
/// coinductive fixpoint by iterating a growing set of candidate `(state,
/// bigger-set)` pairs, starting each newly discovered pair optimistically at
/// `true` and falsifying any pair whose transitions fail given the current
/// approximation of its children, until nothing changes. Values only ever
/// move `true -> false`, so this terminates: each pass either flips at least
/// one pair or the fixpoint is reached, and the number of distinct pairs
/// ever discovered is bounded by the transitions actually traversed.
struct WorklistChecker<'a> {
    smaller: &'a ExplicitTreeAutomaton,
    bigger: &'a ExplicitTreeAutomaton,
    truth: HashMap<(StateId, BiggerSet), bool>,
}

impl<'a> WorklistChecker<'a> {
    fn new(smaller: &'a ExplicitTreeAutomaton, bigger: &'a ExplicitTreeAutomaton) -> Self {
        Self { smaller, bigger, truth: HashMap::new() }
    }

    fn base_case(&self, q: StateId, r_set: &BiggerSet) -> Option<bool> {
        if self.smaller.is_final(q) && !r_set.iter().any(|&r| self.bigger.is_final(r)) {
            Some(false)
        } else {
            None
        }
    }

    /// Looks up the current approximation for `(q, r_set)`, optimistically
    /// registering it as a pending `true` candidate the first time it is
    /// referenced.
    fn decide(&mut self, q: StateId, r_set: &BiggerSet) -> bool {
        if let Some(&v) = self.truth.get(&(q, r_set.clone())) {
            return v;
        }
        let initial = self.base_case(q, r_set).unwrap_or(true);
        self.truth.insert((q, r_set.clone()), initial);
        initial
    }

    fn evaluate(&mut self, q: StateId, r_set: &BiggerSet) -> bool {
        if let Some(false) = self.base_case(q, r_set) {
            return false;
        }
        let smaller = self.smaller;
        let bigger = self.bigger;
        transitions_hold(smaller, bigger, q, r_set, &mut |c, s: &BiggerSet| self.decide(c, s))
    }

    fn run(&mut self, starting: &[(StateId, BiggerSet)]) -> bool {
        for (q, r_set) in starting {
            self.decide(*q, r_set);
        }
        let mut passes = 0u32;
        loop {
            passes += 1;
            let keys: Vec<(StateId, BiggerSet)> = self.truth.keys().cloned().collect();
            let mut changed = false;
            for (q, r_set) in keys {
                let key = (q, r_set.clone());
                if !self.truth[&key] {
                    continue;
                }
                if !self.evaluate(q, &r_set) {
                    self.truth.insert(key, false);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        log::debug!("downward (worklist): converged after {passes} passes, {} pairs", self.truth.len());
        starting.iter().all(|(q, r_set)| self.truth[&(*q, r_set.clone())])
    }
}

fn is_useless_free(aut: &ExplicitTreeAutomaton) -> Result<bool> {
    let trimmed = remove_useless(aut)?;
    Ok(trimmed.num_states() == aut.num_states()
        && trimmed.iter_transitions().count() == aut.iter_transitions().count())
}

/// Decides whether `L(smaller) subseteq L(bigger)` starting from `smaller`'s
/// final states, proving inclusion downward against the full state set of
/// `bigger` (the plain, no-simulation-preorder, default-dial variant;
/// callers with a precomputed preorder should widen `r_set` accordingly
/// before calling, per spec §4.7's "parametric in a preorder").
pub fn check_downward_inclusion(smaller: &ExplicitTreeAutomaton, bigger: &ExplicitTreeAutomaton) -> bool {
    let bigger_finals: BiggerSet = bigger.finals().iter().copied().collect();
    check_downward_inclusion_from(smaller, bigger, bigger_finals)
}

/// As [`check_downward_inclusion`], but starting the check against a
/// caller-supplied acceptance set rather than `bigger`'s raw final states.
/// [`crate::dispatch`] uses this to widen that starting set with a
/// precomputed simulation preorder.
pub fn check_downward_inclusion_from(
    smaller: &ExplicitTreeAutomaton,
    bigger: &ExplicitTreeAutomaton,
    bigger_acceptance: BiggerSet,
) -> bool {
    check_downward_inclusion_from_with(smaller, bigger, bigger_acceptance, &DownwardConfig::default())
        .unwrap_or(false)
}

/// As [`check_downward_inclusion`], with the three spec §4.7 dials exposed.
pub fn check_downward_inclusion_with(
    smaller: &ExplicitTreeAutomaton,
    bigger: &ExplicitTreeAutomaton,
    config: &DownwardConfig,
) -> Result<bool> {
    let bigger_finals: BiggerSet = bigger.finals().iter().copied().collect();
    check_downward_inclusion_from_with(smaller, bigger, bigger_finals, config)
}

/// As [`check_downward_inclusion_from`], with the three spec §4.7 dials
/// exposed: when either automaton has useless states, both are trimmed with
/// [`remove_useless`] first (language- and id-preserving) so the
/// no-useless-grounded checker above stays valid; when both are already
/// clean, that trimming pass is skipped.
pub fn check_downward_inclusion_from_with(
    smaller: &ExplicitTreeAutomaton,
    bigger: &ExplicitTreeAutomaton,
    bigger_acceptance: BiggerSet,
    config: &DownwardConfig,
) -> Result<bool> {
    let smaller_clean = is_useless_free(smaller)?;
    let bigger_clean = is_useless_free(bigger)?;

    let smaller_trimmed;
    let smaller = if smaller_clean {
        smaller
    } else {
        smaller_trimmed = remove_useless(smaller)?;
        &smaller_trimmed
    };
    let bigger_trimmed;
    let bigger = if bigger_clean {
        bigger
    } else {
        bigger_trimmed = remove_useless(bigger)?;
        &bigger_trimmed
    };
    log::debug!(
        "downward inclusion: smaller_clean={smaller_clean} bigger_clean={bigger_clean} use_recursion={}",
        config.use_recursion
    );

    if config.use_recursion {
        let mut checker = DownwardChecker::new(smaller, bigger, *config);
        for q in smaller.finals() {
            if !checker.expand(*q, &bigger_acceptance) {
                return Ok(false);
            }
        }
        Ok(true)
    } else {
        let mut checker = WorklistChecker::new(smaller, bigger);
        let starting: Vec<(StateId, BiggerSet)> =
            smaller.finals().iter().map(|&q| (q, bigger_acceptance.clone())).collect();
        Ok(checker.run(&starting))
    }
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
        let a = single_leaf_plus_unary("a", "f", true);
        let b = single_leaf_plus_unary("a", "f", true);
        assert!(check_downward_inclusion(&a, &b));
        assert!(check_downward_inclusion(&b, &a));
    }

    #[test]
    fn missing_bigger_leaf_symbol_fails() {
        let smaller = single_leaf_plus_unary("a", "f", true);
        let bigger = single_leaf_plus_unary("b", "f", true);
        assert!(!check_downward_inclusion(&smaller, &bigger));
    }

    #[test]
    fn empty_smaller_finals_trivially_included() {
        let smaller = ExplicitTreeAutomaton::new();
        let bigger = single_leaf_plus_unary("a", "f", true);
        assert!(check_downward_inclusion(&smaller, &bigger));
    }

    /// The maintainer's counterexample for the retracted per-position-union
    /// fallback: smaller has one state reachable by two distinct leaves
    /// (`a` and `b`), combined under `f`; bigger keeps the two leaves'
    /// targets apart so only `f(a,a)` and `f(b,b)` are ever accepted.
    /// `L(smaller) = {f(a,a), f(a,b), f(b,a), f(b,b)}` is not a subset of
    /// `L(bigger) = {f(a,a), f(b,b)}`, so inclusion must fail under every
    /// dial combination.
    fn union_fallback_counterexample() -> (ExplicitTreeAutomaton, ExplicitTreeAutomaton) {
        let mut smaller = ExplicitTreeAutomaton::new();
        let p1 = 0;
        smaller.add_transition(&[], "a", p1).unwrap();
        smaller.add_transition(&[], "b", p1).unwrap();
        let q = 1;
        smaller.add_transition(&[p1, p1], "f", q).unwrap();
        smaller.set_final(q);

        let mut bigger = ExplicitTreeAutomaton::new();
        let (r1a, r1b, r2a, r2b, r) = (0, 1, 2, 3, 4);
        bigger.add_transition(&[], "a", r1a).unwrap();
        bigger.add_transition(&[], "a", r1b).unwrap();
        bigger.add_transition(&[], "b", r2a).unwrap();
        bigger.add_transition(&[], "b", r2b).unwrap();
        bigger.add_transition(&[r1a, r1b], "f", r).unwrap();
        bigger.add_transition(&[r2a, r2b], "f", r).unwrap();
        bigger.set_final(r);

        (smaller, bigger)
    }

    #[test]
    fn reviewer_counterexample_from_union_fallback_is_rejected() {
        let _ = env_logger::try_init();
        let (smaller, bigger) = union_fallback_counterexample();
        assert!(!check_downward_inclusion(&smaller, &bigger));
    }

    #[test]
    fn reviewer_counterexample_rejected_with_caching_and_strict_subsumption() {
        let (smaller, bigger) = union_fallback_counterexample();
        let config = DownwardConfig { use_recursion: true, cache_implications: true, strict_subsumption: true };
        assert!(!check_downward_inclusion_with(&smaller, &bigger, &config).unwrap());
    }

    #[test]
    fn reviewer_counterexample_rejected_by_worklist_variant() {
        let (smaller, bigger) = union_fallback_counterexample();
        let config = DownwardConfig { use_recursion: false, ..DownwardConfig::default() };
        assert!(!check_downward_inclusion_with(&smaller, &bigger, &config).unwrap());
    }

    #[test]
    fn positive_case_still_holds_under_choice_functions() {
        // L(smaller) = {f(a,a), f(b,b)} really is included this time, since
        // the matched-tuple shortcut finds a direct witness for each.
        let mut smaller = ExplicitTreeAutomaton::new();
        let p1 = 0;
        smaller.add_transition(&[], "a", p1).unwrap();
        smaller.add_transition(&[], "b", p1).unwrap();
        let q = 1;
        smaller.add_transition(&[p1, p1], "f", q).unwrap();
        smaller.set_final(q);

        let (_, bigger) = union_fallback_counterexample();
        assert!(check_downward_inclusion(&smaller, &bigger));
    }

    #[test]
    fn worklist_variant_agrees_with_recursive_variant_on_identical_automata() {
        let a = single_leaf_plus_unary("a", "f", true);
        let b = single_leaf_plus_unary("a", "f", true);
        let worklist = DownwardConfig { use_recursion: false, ..DownwardConfig::default() };
        assert!(check_downward_inclusion_with(&a, &b, &worklist).unwrap());
        assert!(check_downward_inclusion_with(&b, &a, &worklist).unwrap());
    }

    #[test]
    fn useless_states_in_bigger_do_not_change_the_verdict() {
        let smaller = single_leaf_plus_unary("a", "f", true);
        let mut bigger = single_leaf_plus_unary("a", "f", true);
        // A useless sink: nothing from smaller ever reaches it, but it must
        // not change whether inclusion holds.
        bigger.add_transition(&[99], "g", 100).unwrap();
        assert!(check_downward_inclusion(&smaller, &bigger));
    }
}
