//! The auxiliary stacks and the label table (spec.md §3, §4.3).

use std::collections::HashMap;

use crate::error::Fault;
use crate::program::ProgramCounter;
use crate::value::Value;

/// The LIFO data stack used by `PUSHS`/`POPS`.
#[derive(Debug, Default)]
pub struct DataStack {
    values: Vec<Value>,
}

impl DataStack {
    /// An empty data stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `PUSHS`: push a value.
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// `POPS`: pop a value.
    ///
    /// # Errors
    /// [`Fault::MissingValue`] (exit 56) if the stack is empty.
    pub fn pop(&mut self, pc: ProgramCounter) -> Result<Value, Fault> {
        self.values.pop().ok_or_else(|| Fault::MissingValue {
            pc,
            detail: "POPS on an empty data stack".to_owned(),
        })
    }

    /// The current stack contents, bottom to top, for `BREAK`'s
    /// diagnostic dump.
    #[must_use]
    pub fn snapshot(&self) -> &[Value] {
        &self.values
    }
}

/// The LIFO call stack used by `CALL`/`RETURN`: holds the program counter
/// at the time of each pending `CALL`.
#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<ProgramCounter>,
}

impl CallStack {
    /// An empty call stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `CALL`: push the program counter of the `CALL` instruction itself.
    pub fn push(&mut self, pc: ProgramCounter) {
        self.frames.push(pc);
    }

    /// `RETURN`: pop the program counter to resume after.
    ///
    /// # Errors
    /// [`Fault::MissingValue`] (exit 56) if the call stack is empty.
    pub fn pop(&mut self, pc: ProgramCounter) -> Result<ProgramCounter, Fault> {
        self.frames.pop().ok_or_else(|| Fault::MissingValue {
            pc,
            detail: "RETURN with an empty call stack".to_owned(),
        })
    }

    /// The current call depth, for `BREAK`'s diagnostic dump.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The pending return addresses, oldest first, for `BREAK`'s
    /// diagnostic dump.
    #[must_use]
    pub fn snapshot(&self) -> &[ProgramCounter] {
        &self.frames
    }
}

/// Maps label names to instruction indices. Populated once, during the
/// pre-pass (spec.md §4.5), and never modified afterward.
#[derive(Debug, Default)]
pub struct LabelTable {
    labels: HashMap<String, ProgramCounter>,
}

impl LabelTable {
    /// An empty label table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a label at the given instruction index.
    ///
    /// # Errors
    /// [`Fault::Semantic`] (exit 52) if `name` is already registered.
    pub fn register(&mut self, name: &str, at: ProgramCounter) -> Result<(), Fault> {
        if self.labels.contains_key(name) {
            return Err(Fault::Semantic(format!("duplicate label {name}")));
        }
        self.labels.insert(name.to_owned(), at);
        Ok(())
    }

    /// Resolves a label name to its instruction index.
    ///
    /// # Errors
    /// [`Fault::Semantic`] (exit 52) if `name` was never registered.
    pub fn resolve(&self, name: &str) -> Result<ProgramCounter, Fault> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| Fault::Semantic(format!("jump to unknown label {name}")))
    }

    /// All registered labels, for `BREAK`'s diagnostic dump. Order is
    /// unspecified.
    pub fn snapshot(&self) -> impl Iterator<Item = (&str, ProgramCounter)> {
        self.labels.iter().map(|(name, pc)| (name.as_str(), *pc))
    }
}
