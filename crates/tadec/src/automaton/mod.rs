//! The explicit tree-automaton and word-automaton (NFA) data model of spec
//! §3: states, ranked symbols, hash-consed child tuples, and the transition
//! indices the decision engine (C6–C9) walks.

pub mod tree;
pub mod word;

pub use tree::ExplicitTreeAutomaton;
pub use word::ExplicitWordAutomaton;
