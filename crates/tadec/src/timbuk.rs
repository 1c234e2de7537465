//! Timbuk text format: parser (spec §6.1) and serialiser (spec §6.2).
//!
//! A thin, line-oriented recursive-descent reader plus a writer — this
//! module is an external collaborator, not core decision-engine content, so
//! it gets none of the antichain/simulation machinery's care. A plain
//! line-oriented grammar: one header keyword per line, whitespace-separated
//! identifiers, `#` line comments.
//!
//! Omission of the `Ops` header is tolerated; arities are then inferred
//! purely from how each symbol is used in `Transitions` (decided in
//! `DESIGN.md`). A fixed-alphabet operation that needs a symbol never
//! declared or used at a particular arity surfaces that as
//! `LibError::NotImplemented`.

use std::collections::HashMap;

use crate::automaton::ExplicitTreeAutomaton;
use crate::errors::{LibError, Result};
use crate::state::{StateDict, StateId};

/// The in-memory record spec §6.2 calls for: symbol-arity set, state set,
/// final-state set, and a transition set of `(children, symbol, parent)`
/// triples, all referring to states by their textual Timbuk name rather
/// than a dense [`StateId`] — conversion to/from [`ExplicitTreeAutomaton`]
/// happens in [`to_automaton`]/[`from_automaton`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomatonDescription {
    pub name: String,
    pub symbols: Vec<(String, u32)>,
    pub states: Vec<String>,
    pub finals: Vec<String>,
    pub transitions: Vec<(Vec<String>, String, String)>,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => line[..i].trim(),
        None => line,
    }
}

fn parse_term(term: &str) -> Result<(String, Vec<String>)> {
    match term.find('(') {
        Some(open) => {
            let label = term[..open].trim().to_string();
            let close = term
                .rfind(')')
                .ok_or_else(|| LibError::InputError(format!("unbalanced parentheses in `{term}`")))?;
            let args = &term[open + 1..close];
            let children = if args.trim().is_empty() {
                Vec::new()
            } else {
                args.split(',').map(|s| s.trim().to_string()).collect()
            };
            Ok((label, children))
        }
        None => Ok((term.trim().to_string(), Vec::new())),
    }
}

/// Parses Timbuk text into an [`AutomatonDescription`].
pub fn parse(text: &str) -> Result<AutomatonDescription> {
    let mut desc = AutomatonDescription::default();
    let mut in_transitions = false;

    for raw_line in text.lines() {
        let line = strip_comment(raw_line.trim());
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("Ops") {
            for tok in rest.split_whitespace() {
                let (label, arity) = tok
                    .split_once(':')
                    .ok_or_else(|| LibError::InputError(format!("malformed Ops entry `{tok}`")))?;
                let arity: u32 = arity
                    .parse()
                    .map_err(|_| LibError::InputError(format!("malformed arity in `{tok}`")))?;
                desc.symbols.push((label.to_string(), arity));
            }
            in_transitions = false;
            continue;
        }
        if let Some(rest) = line.strip_prefix("Automaton") {
            desc.name = rest.trim().to_string();
            in_transitions = false;
            continue;
        }
        if let Some(rest) = line.strip_prefix("Final States") {
            desc.finals.extend(rest.split_whitespace().map(str::to_string));
            in_transitions = false;
            continue;
        }
        if let Some(rest) = line.strip_prefix("States") {
            desc.states.extend(rest.split_whitespace().map(str::to_string));
            in_transitions = false;
            continue;
        }
        if line == "Transitions" {
            in_transitions = true;
            continue;
        }
        if in_transitions {
            let (lhs, rhs) = line
                .split_once("->")
                .ok_or_else(|| LibError::InputError(format!("transition missing `->`: `{line}`")))?;
            let (label, children) = parse_term(lhs.trim())?;
            desc.transitions.push((children, label, rhs.trim().to_string()));
            continue;
        }

        return Err(LibError::InputError(format!("unexpected line: `{line}`")));
    }

    Ok(desc)
}

/// Loads an [`AutomatonDescription`] into an [`ExplicitTreeAutomaton`],
/// interning every state name it mentions into a fresh [`StateDict`] (in
/// first-seen order, so `dict.name(0)` is the first state Timbuk named).
///
/// Cross-checks transitions against a declared `Ops` header when present;
/// with no `Ops` header, every symbol's arity is simply whatever its
/// transitions use (spec §6.1's tolerated omission).
pub fn to_automaton(desc: &AutomatonDescription) -> Result<(ExplicitTreeAutomaton, StateDict)> {
    let mut declared: HashMap<&str, u32> = HashMap::new();
    for (label, arity) in &desc.symbols {
        declared.insert(label.as_str(), *arity);
    }

    let mut dict = StateDict::new();
    for s in &desc.states {
        dict.intern(s.clone());
    }

    let mut aut = ExplicitTreeAutomaton::new();
    for (children, label, parent) in &desc.transitions {
        if let Some(&expected) = declared.get(label.as_str()) {
            if expected != children.len() as u32 {
                return Err(LibError::InputError(format!(
                    "symbol `{label}` declared arity {expected} but used with {} children",
                    children.len()
                )));
            }
        }
        let child_ids: Vec<StateId> = children.iter().map(|c| dict.intern(c.clone())).collect();
        let parent_id = dict.intern(parent.clone());
        aut.add_transition(&child_ids, label, parent_id)?;
    }

    for f in &desc.finals {
        let id = dict.intern(f.clone());
        aut.set_final(id);
    }

    aut.check_invariants()?;
    Ok((aut, dict))
}

/// The inverse of [`to_automaton`]: rebuilds a textual description from an
/// automaton and the [`StateDict`] that produced its state ids.
pub fn from_automaton(aut: &ExplicitTreeAutomaton, dict: &StateDict, name: &str) -> AutomatonDescription {
    let symbols: Vec<(String, u32)> = aut
        .symbols
        .iter()
        .map(|(_, sym)| (sym.label.clone(), sym.arity))
        .collect();

    let states: Vec<String> = (0..dict.len() as StateId).map(|s| dict.name(s).to_string()).collect();

    let mut final_ids: Vec<StateId> = aut.finals().iter().copied().collect();
    final_ids.sort_unstable();
    let finals: Vec<String> = final_ids.iter().map(|&s| dict.name(s).to_string()).collect();

    let mut transitions: Vec<(Vec<String>, String, String)> = aut
        .iter_transitions()
        .map(|(sym, children, parent)| {
            let label = aut.symbols.get(sym).label.clone();
            let child_names: Vec<String> = children.iter().map(|&c| dict.name(c).to_string()).collect();
            (child_names, label, dict.name(parent).to_string())
        })
        .collect();
    transitions.sort();

    AutomatonDescription { name: name.to_string(), symbols, states, finals, transitions }
}

/// Serialises an [`AutomatonDescription`] back to Timbuk text.
pub fn serialize(desc: &AutomatonDescription) -> String {
    let mut out = String::new();

    if !desc.symbols.is_empty() {
        out.push_str("Ops ");
        let rendered: Vec<String> = desc.symbols.iter().map(|(l, a)| format!("{l}:{a}")).collect();
        out.push_str(&rendered.join(" "));
        out.push('\n');
    }

    out.push_str(&format!("Automaton {}\n", desc.name));
    out.push_str("States ");
    out.push_str(&desc.states.join(" "));
    out.push('\n');
    out.push_str("Final States ");
    out.push_str(&desc.finals.join(" "));
    out.push('\n');
    out.push_str("Transitions\n");

    for (children, label, parent) in &desc.transitions {
        if children.is_empty() {
            out.push_str(&format!("{label} -> {parent}\n"));
        } else {
            out.push_str(&format!("{label}({}) -> {parent}\n", children.join(", ")));
        }
    }

    out
}
