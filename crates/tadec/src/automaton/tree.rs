use std::collections::{HashMap, HashSet};

use crate::errors::{LibError, Result};
use crate::state::{StateId, SymbolId, SymbolTable, TreeSymbol, TupleArena, TupleId};

/// An explicit, finite, ranked tree automaton `A = (Q, Σ, Δ, F)`.
///
/// `Q` is implicit: it is the range `0..num_states`. `Δ` is stored by parent
/// state and then by symbol, each entry a list of (hash-consed) child
/// tuples — the innermost level being a set of child-tuple references.
#[derive(Debug, Clone, Default)]
pub struct ExplicitTreeAutomaton {
    num_states: u32,
    pub symbols: SymbolTable,
    pub tuples: TupleArena,
    /// parent state -> symbol -> child tuples reaching that parent under
    /// that symbol.
    transitions: HashMap<StateId, HashMap<SymbolId, Vec<TupleId>>>,
    finals: HashSet<StateId>,
}

impl ExplicitTreeAutomaton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_states(&self) -> u32 {
        self.num_states
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        0..self.num_states
    }

    pub fn finals(&self) -> &HashSet<StateId> {
        &self.finals
    }

    pub fn is_final(&self, state: StateId) -> bool {
        self.finals.contains(&state)
    }

    fn touch_state(&mut self, state: StateId) {
        if state + 1 > self.num_states {
            self.num_states = state + 1;
        }
    }

    pub fn set_final(&mut self, state: StateId) {
        self.touch_state(state);
        self.finals.insert(state);
    }

    /// Adds the transition `label(children...) -> parent`, interning `label`
    /// at the given arity and the child tuple.
    ///
    /// Duplicate transitions are idempotent, per the Timbuk contract in spec
    /// §6.1. Returns [`LibError::InputError`] if `label`'s arity disagrees
    /// with one already recorded for that label under a different arity
    /// (distinct arities of the same label name are distinct symbols, so this
    /// never actually conflicts — the check exists to catch a caller passing
    /// a children slice whose length doesn't match the `arity` it supplied).
    pub fn add_transition(
        &mut self,
        children: &[StateId],
        label: &str,
        parent: StateId,
    ) -> Result<()> {
        let arity = children.len() as u32;
        for &c in children {
            self.touch_state(c);
        }
        self.touch_state(parent);

        let symbol_id = self.symbols.intern(TreeSymbol::new(label, arity));
        let tuple_id = self.tuples.intern(children);

        let by_symbol = self.transitions.entry(parent).or_default();
        let list = by_symbol.entry(symbol_id).or_default();
        if !list.contains(&tuple_id) {
            list.push(tuple_id);
        }
        Ok(())
    }

    /// All (symbol, tuple) pairs producing `parent`.
    pub fn transitions_to(&self, parent: StateId) -> impl Iterator<Item = (SymbolId, TupleId)> + '_ {
        self.transitions
            .get(&parent)
            .into_iter()
            .flat_map(|by_symbol| {
                by_symbol
                    .iter()
                    .flat_map(|(&sym, tuples)| tuples.iter().map(move |&t| (sym, t)))
            })
    }

    /// Tuples producing `parent` under exactly `symbol`.
    pub fn tuples_for(&self, parent: StateId, symbol: SymbolId) -> &[TupleId] {
        self.transitions
            .get(&parent)
            .and_then(|by_symbol| by_symbol.get(&symbol))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates every transition in the automaton as `(symbol, children, parent)`.
    pub fn iter_transitions(&self) -> impl Iterator<Item = (SymbolId, &[StateId], StateId)> + '_ {
        self.transitions.iter().flat_map(move |(&parent, by_symbol)| {
            by_symbol.iter().flat_map(move |(&sym, tuples)| {
                tuples.iter().map(move |&t| (sym, self.tuples.get(t), parent))
            })
        })
    }

    /// Nullary (leaf) transitions: symbols of arity 0 together with the
    /// parent state they produce.
    pub fn leaf_transitions(&self) -> impl Iterator<Item = (SymbolId, StateId)> + '_ {
        self.iter_transitions()
            .filter(|(_, children, _)| children.is_empty())
            .map(|(sym, _, parent)| (sym, parent))
    }

    /// Renumbers every state by adding `offset`, used by [`crate::ops`] to
    /// build a disjoint union of two automata before an inclusion check.
    pub fn shift_states(&self, offset: u32) -> Result<Self> {
        let mut out = Self {
            num_states: self.num_states + offset,
            symbols: self.symbols.clone(),
            tuples: TupleArena::new(),
            transitions: HashMap::new(),
            finals: self.finals.iter().map(|&s| s + offset).collect(),
        };
        for (sym, children, parent) in self.iter_transitions() {
            let shifted: Vec<StateId> = children.iter().map(|&c| c + offset).collect();
            let label = out.symbols.get(sym).label.clone();
            out.add_transition(&shifted, &label, parent + offset)?;
        }
        Ok(out)
    }

    /// Validates the invariants spec §3 requires: every state mentioned in a
    /// transition or in `F` lies in `0..num_states`, and every tuple's arity
    /// matches its symbol's declared arity. Both are true by construction
    /// here (`add_transition` derives the symbol's arity from the tuple), so
    /// this only guards against automata assembled by hand via
    /// [`crate::timbuk`] with a conflicting `Ops` header.
    pub fn check_invariants(&self) -> Result<()> {
        for &s in &self.finals {
            if s >= self.num_states {
                return Err(LibError::InputError(format!(
                    "final state {s} out of range (num_states = {})",
                    self.num_states
                )));
            }
        }
        for (sym, children, parent) in self.iter_transitions() {
            if parent >= self.num_states {
                return Err(LibError::InputError(format!(
                    "transition parent state {parent} out of range"
                )));
            }
            let expected_arity = self.symbols.get(sym).arity as usize;
            if children.len() != expected_arity {
                return Err(LibError::InputError(format!(
                    "symbol {} declared arity {expected_arity} but transition has {} children",
                    self.symbols.get(sym),
                    children.len()
                )));
            }
        }
        Ok(())
    }
}
