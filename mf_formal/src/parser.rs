//! Reads the first interpretation out of Mace4's standard output.

use super::*;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// One relation table. Tuples are element indices.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Relation {
    pub arity: usize,
    #[serde(serialize_with = "tuples_as_list")]
    pub tuples: BTreeMap<Vec<usize>, bool>,
}

fn tuples_as_list<S: Serializer>(
    tuples: &BTreeMap<Vec<usize>, bool>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(tuples.iter())
}

impl Relation {
    /// Tuples missing from the table are false.
    pub fn value(&self, tuple: &[usize]) -> bool {
        self.tuples.get(tuple).copied().unwrap_or(false)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize)]
pub struct StructuredModel {
    pub domain_size: usize,
    pub elements: Vec<String>,
    pub constants: BTreeMap<String, usize>,
    pub relations: BTreeMap<String, Relation>,
    /// Lines or tables that were skipped while reading the model.
    pub diagnostics: Vec<String>,
}

impl StructuredModel {
    pub fn new(domain_size: usize) -> Self {
        StructuredModel {
            domain_size,
            elements: (0..domain_size).map(|e| e.to_string()).collect(),
            ..StructuredModel::default()
        }
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn element_of(&self, constant: &str) -> Option<usize> {
        self.constants.get(constant).copied()
    }

    /// Constants interpreted as `element`, in name order.
    pub fn constants_of(&self, element: usize) -> Vec<&str> {
        self.constants
            .iter()
            .filter(|(_, e)| **e == element)
            .map(|(c, _)| c.as_str())
            .collect()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum FallbackReason {
    NoModelFound,
    UnrecognizedFormat,
}

/// The solver text as it was, for when no model could be read from it.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct RawFallback {
    pub text: String,
    pub reason: FallbackReason,
    pub detail: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub enum ParseResult {
    Model(StructuredModel),
    RawFallback(RawFallback),
}

impl ParseResult {
    pub fn model(&self) -> Option<&StructuredModel> {
        match self {
            ParseResult::Model(m) => Some(m),
            ParseResult::RawFallback(_) => None,
        }
    }

    fn fallback(text: &str, reason: FallbackReason, detail: &str) -> Self {
        tracing::info!("no model read from solver output: {detail}");
        ParseResult::RawFallback(RawFallback {
            text: text.to_owned(),
            reason,
            detail: detail.to_owned(),
        })
    }
}

const NO_MODEL_MARKERS: &[&str] = &["SEARCH FAILED", "Exiting with failure", "exit (exhausted)"];
const END_OF_MODEL: &str = "end of model";

/// Largest domain read from an `interpretation(` header. Mace4 never gets
/// near it with the domain sizes this crate asks for.
pub const MAX_DOMAIN_SIZE: usize = 10_000;

struct Table {
    name: String,
    arity: usize,
    values: Vec<bool>,
}

enum State {
    Seeking,
    InDomainHeader,
    InRelationTable(Table),
    Done,
}

struct Reader {
    state: State,
    model: Option<StructuredModel>,
    closed: bool,
    no_model: bool,
    rejected: Option<String>,
}

impl Reader {
    /// Returns false once nothing more should be read.
    fn line(&mut self, line: &str) -> bool {
        let state = std::mem::replace(&mut self.state, State::Seeking);
        self.state = match state {
            State::Seeking => {
                if let Ok(size) = grammar::mace4_line::interpretation(line) {
                    if size > MAX_DOMAIN_SIZE {
                        self.rejected = Some(format!(
                            "domain size {size} is above {MAX_DOMAIN_SIZE}"
                        ));
                        return false;
                    }
                    self.model = Some(StructuredModel::new(size));
                    State::InDomainHeader
                } else {
                    if NO_MODEL_MARKERS.iter().any(|m| line.contains(m)) {
                        self.no_model = true;
                    }
                    State::Seeking
                }
            }
            State::InDomainHeader => self.header_line(line),
            State::InRelationTable(mut table) => {
                if line.trim().is_empty() {
                    self.finish(table)
                } else if let Ok((values, end)) = grammar::mace4_line::row(line) {
                    table.values.extend(values);
                    if end {
                        self.finish(table)
                    } else {
                        State::InRelationTable(table)
                    }
                } else if grammar::mace4_line::interpretation_end(line).is_ok()
                    || line.contains(END_OF_MODEL)
                {
                    self.finish(table);
                    self.closed = true;
                    State::Done
                } else {
                    self.diagnostic(format!(
                        "skipped unrecognized row in {}: '{}'",
                        table.name,
                        line.trim()
                    ));
                    State::InRelationTable(table)
                }
            }
            State::Done => {
                if grammar::mace4_line::interpretation(line).is_ok() {
                    // a second model
                    return false;
                }
                self.header_line(line)
            }
        };
        true
    }

    fn header_line(&mut self, line: &str) -> State {
        let after = if self.closed {
            State::Done
        } else {
            State::InDomainHeader
        };
        if let Ok((name, arity, values, end)) = grammar::mace4_line::relation(line) {
            let table = Table {
                name: name.to_owned(),
                arity,
                values,
            };
            return if end {
                self.finish(table)
            } else {
                State::InRelationTable(table)
            };
        }
        if self.closed {
            return State::Done;
        }
        if grammar::mace4_line::interpretation_end(line).is_ok() || line.contains(END_OF_MODEL) {
            self.closed = true;
            return State::Done;
        }
        if let Ok((name, arity, values)) = grammar::mace4_line::function(line) {
            match (arity, values.as_slice()) {
                (0, [element]) => {
                    if let Some(model) = self.model.as_mut() {
                        model.constants.insert(name.to_owned(), *element);
                    }
                }
                _ => self.diagnostic(format!("skipped function {name} of arity {arity}")),
            }
        }
        after
    }

    /// Stores a complete table, or drops it when the value count is off.
    fn finish(&mut self, table: Table) -> State {
        let after = if self.closed {
            State::Done
        } else {
            State::InDomainHeader
        };
        let Some(model) = self.model.as_mut() else {
            return after;
        };
        let size = model.domain_size;
        let expected = u32::try_from(table.arity)
            .ok()
            .and_then(|a| size.checked_pow(a));
        if expected != Some(table.values.len()) {
            let msg = format!(
                "dropped relation {}: {} values for arity {} over {} elements",
                table.name,
                table.values.len(),
                table.arity,
                size
            );
            self.diagnostic(msg);
            return after;
        }
        if model.relations.contains_key(&table.name) {
            let msg = format!("dropped second table for relation {}", table.name);
            self.diagnostic(msg);
            return after;
        }
        let tuples = table
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (tuple_at(i, table.arity, size), *v))
            .collect();
        model.relations.insert(
            table.name,
            Relation {
                arity: table.arity,
                tuples,
            },
        );
        after
    }

    fn diagnostic(&mut self, msg: String) {
        tracing::debug!("{msg}");
        if let Some(model) = self.model.as_mut() {
            model.diagnostics.push(msg);
        }
    }
}

/// The `index`:th tuple in row major order, first argument most significant.
fn tuple_at(mut index: usize, arity: usize, size: usize) -> Vec<usize> {
    let mut tuple = vec![0; arity];
    for slot in tuple.iter_mut().rev() {
        *slot = index % size;
        index /= size;
    }
    tuple
}

/// Parses raw Mace4 output. Never fails: text without a readable model
/// comes back as a `RawFallback`.
pub fn parse(text: &str) -> ParseResult {
    let mut reader = Reader {
        state: State::Seeking,
        model: None,
        closed: false,
        no_model: false,
        rejected: None,
    };
    for line in text.lines() {
        if !reader.line(line) {
            break;
        }
    }
    if let State::InRelationTable(table) = std::mem::replace(&mut reader.state, State::Done) {
        reader.finish(table);
    }

    if let Some(detail) = &reader.rejected {
        return ParseResult::fallback(text, FallbackReason::UnrecognizedFormat, detail);
    }
    match reader.model {
        Some(model) if reader.closed => ParseResult::Model(model),
        Some(_) => ParseResult::fallback(
            text,
            FallbackReason::UnrecognizedFormat,
            "the interpretation is never closed",
        ),
        None if reader.no_model => {
            ParseResult::fallback(text, FallbackReason::NoModelFound, "the search found no model")
        }
        None => ParseResult::fallback(
            text,
            FallbackReason::UnrecognizedFormat,
            "no interpretation in the text",
        ),
    }
}

/// Like `parse`, but trusts the solver's exit status when it says there
/// is no model.
pub fn parse_output(output: &SolverOutput) -> ParseResult {
    match output.exit {
        SolverExit::NoModel => ParseResult::fallback(
            &output.stdout,
            FallbackReason::NoModelFound,
            "the solver exhausted its search",
        ),
        _ => parse(&output.stdout),
    }
}
