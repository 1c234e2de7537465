use std::fmt;

/// Identifier for an automaton state.
///
/// Opaque and unique only within the automaton that produced it; no ordering
/// between identifiers of different automata is implied. States are produced
/// by [`crate::automaton::StateDict`], never picked by hand.
pub type StateId = u32;

/// Identifier for an interned symbol (tree-automaton label or NFA letter).
pub type SymbolId = u32;

/// Identifier for an interned, hash-consed child-state tuple.
///
/// Two transitions with the same child tuple share the same [`TupleId`]:
/// equality of the handle is equality of the payload by construction, which
/// is what lets the upward/downward translators (`translate.rs`) and the
/// inclusion checkers compare tuples in O(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TupleId(pub u32);

impl fmt::Display for TupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Owns the interning table for child-state tuples of one automaton (or one
/// decision run's disjoint union of two automata).
///
/// Replaces the process-wide hash-consing pool of the original tuple cache
/// with an instance-scoped arena: constructed alongside the automaton that
/// uses it, dropped when that automaton is dropped. No static state.
#[derive(Debug, Clone, Default)]
pub struct TupleArena {
    tuples: Vec<Box<[StateId]>>,
    index: indexmap::IndexMap<Box<[StateId]>, TupleId>,
}

impl TupleArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `children`, returning the (possibly pre-existing) handle for
    /// that exact sequence of states.
    pub fn intern(&mut self, children: &[StateId]) -> TupleId {
        if let Some(id) = self.index.get(children) {
            return *id;
        }
        let boxed: Box<[StateId]> = children.into();
        let id = TupleId(self.tuples.len() as u32);
        self.tuples.push(boxed.clone());
        self.index.insert(boxed, id);
        id
    }

    pub fn get(&self, id: TupleId) -> &[StateId] {
        &self.tuples[id.0 as usize]
    }

    pub fn arity(&self, id: TupleId) -> usize {
        self.get(id).len()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

/// A ranked tree-automaton symbol: a label paired with its arity.
///
/// Two `TreeSymbol`s with the same label but different arity are distinct
/// symbols, matching the Timbuk convention of writing `f:2` in the `Ops`
/// section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeSymbol {
    pub label: String,
    pub arity: u32,
}

impl TreeSymbol {
    pub fn new(label: impl Into<String>, arity: u32) -> Self {
        Self {
            label: label.into(),
            arity,
        }
    }
}

impl fmt::Display for TreeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.label, self.arity)
    }
}

/// Instance-scoped interning table for [`TreeSymbol`]s, handing out dense
/// [`SymbolId`]s usable as indices into the LTS label dimension.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<TreeSymbol>,
    index: indexmap::IndexMap<TreeSymbol, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, symbol: TreeSymbol) -> SymbolId {
        if let Some(id) = self.index.get(&symbol) {
            return *id;
        }
        let id = self.symbols.len() as SymbolId;
        self.symbols.push(symbol.clone());
        self.index.insert(symbol, id);
        id
    }

    pub fn get(&self, id: SymbolId) -> &TreeSymbol {
        &self.symbols[id as usize]
    }

    pub fn find(&self, label: &str, arity: u32) -> Option<SymbolId> {
        self.index
            .get(&TreeSymbol::new(label, arity))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &TreeSymbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (i as SymbolId, s))
    }

    pub fn max_arity(&self) -> u32 {
        self.symbols.iter().map(|s| s.arity).max().unwrap_or(0)
    }
}

/// Hands out fresh, dense [`StateId`]s for one automaton under construction.
///
/// The `spec` leaves the state dictionary as an external collaborator; this
/// is the minimal instance-scoped stand-in this crate needs when building
/// automata programmatically or from Timbuk text.
#[derive(Debug, Clone, Default)]
pub struct StateDict {
    names: Vec<String>,
    index: indexmap::IndexMap<String, StateId>,
}

impl StateDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: impl Into<String>) -> StateId {
        let name = name.into();
        if let Some(id) = self.index.get(&name) {
            return *id;
        }
        let id = self.names.len() as StateId;
        self.names.push(name.clone());
        self.index.insert(name, id);
        id
    }

    pub fn name(&self, id: StateId) -> &str {
        &self.names[id as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
