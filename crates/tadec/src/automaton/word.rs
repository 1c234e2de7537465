use std::collections::{HashMap, HashSet};

use crate::errors::Result;
use crate::state::{StateId, SymbolId};

/// An explicit NFA `A = (Q, Σ, Δ, I, F)` with `Δ ⊆ Q × Σ × Q`.
///
/// Symbols are opaque `u32`s (spec §3: "For NFAs: an opaque integer"), unlike
/// tree-automaton symbols which carry an arity.
#[derive(Debug, Clone, Default)]
pub struct ExplicitWordAutomaton {
    num_states: u32,
    /// source -> symbol -> destinations.
    transitions: HashMap<StateId, HashMap<SymbolId, Vec<StateId>>>,
    initial: HashSet<StateId>,
    finals: HashSet<StateId>,
}

impl ExplicitWordAutomaton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_states(&self) -> u32 {
        self.num_states
    }

    pub fn initial(&self) -> &HashSet<StateId> {
        &self.initial
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

    pub fn set_initial(&mut self, state: StateId) {
        self.touch_state(state);
        self.initial.insert(state);
    }

    pub fn set_final(&mut self, state: StateId) {
        self.touch_state(state);
        self.finals.insert(state);
    }

    pub fn add_transition(&mut self, from: StateId, symbol: SymbolId, to: StateId) -> Result<()> {
        self.touch_state(from);
        self.touch_state(to);
        let dests = self.transitions.entry(from).or_default().entry(symbol).or_default();
        if !dests.contains(&to) {
            dests.push(to);
        }
        Ok(())
    }

    pub fn successors(&self, from: StateId, symbol: SymbolId) -> &[StateId] {
        self.transitions
            .get(&from)
            .and_then(|by_symbol| by_symbol.get(&symbol))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Symbols enabled from at least one state in `states`.
    pub fn enabled_symbols(&self, states: &HashSet<StateId>) -> HashSet<SymbolId> {
        let mut out = HashSet::new();
        for s in states {
            if let Some(by_symbol) = self.transitions.get(s) {
                out.extend(by_symbol.keys().copied());
            }
        }
        out
    }

    /// `post_symbol(states)`: the union of successors of every state in
    /// `states` under `symbol`.
    pub fn post(&self, states: &HashSet<StateId>, symbol: SymbolId) -> HashSet<StateId> {
        let mut out = HashSet::new();
        for &s in states {
            out.extend(self.successors(s, symbol).iter().copied());
        }
        out
    }

    pub fn iter_transitions(&self) -> impl Iterator<Item = (StateId, SymbolId, StateId)> + '_ {
        self.transitions.iter().flat_map(|(&from, by_symbol)| {
            by_symbol
                .iter()
                .flat_map(move |(&sym, dests)| dests.iter().map(move |&to| (from, sym, to)))
        })
    }

    pub fn shift_states(&self, offset: u32) -> Result<Self> {
        let mut out = Self {
            num_states: self.num_states + offset,
            transitions: HashMap::new(),
            initial: self.initial.iter().map(|&s| s + offset).collect(),
            finals: self.finals.iter().map(|&s| s + offset).collect(),
        };
        for (from, sym, to) in self.iter_transitions() {
            out.add_transition(from + offset, sym, to + offset)?;
        }
        Ok(out)
    }
}
