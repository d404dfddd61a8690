//! Variables, frames, and the frame manager (spec.md §3, §4.2).
//!
//! A [`Frame`] is a named collection of [`Variable`]s. The
//! [`FrameManager`] owns the one permanent Global Frame, a stack of Local
//! Frames (the top is active), and at most one Temporary Frame, and is the
//! sole place that enforces the frame-existence and name-uniqueness
//! invariants from spec.md §3.

use std::collections::HashMap;

use crate::error::{Fault, FrameKind};
use crate::program::{FrameId, ProgramCounter};
use crate::value::Value;

/// A named slot bound to a frame; either holds a [`Value`] or is
/// uninitialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variable {
    content: Option<Value>,
}

impl Variable {
    /// A freshly `DEFVAR`-ed variable: no value yet.
    #[must_use]
    pub const fn uninitialized() -> Self {
        Self { content: None }
    }

    /// The variable's value, if it has been written to.
    #[must_use]
    pub const fn get(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    /// Overwrites the variable's value.
    pub fn set(&mut self, value: Value) {
        self.content = Some(value);
    }
}

/// An ordered collection of uniquely-named [`Variable`]s.
///
/// Declaration order is preserved (via `insertion_order`) only so that
/// `BREAK`'s diagnostic dump reads deterministically; the language itself
/// never observes variable order.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    variables: HashMap<String, Variable>,
    insertion_order: Vec<String>,
}

impl Frame {
    fn new() -> Self {
        Self::default()
    }

    fn define(&mut self, name: &str) -> Result<(), ()> {
        if self.variables.contains_key(name) {
            return Err(());
        }
        self.variables.insert(name.to_owned(), Variable::uninitialized());
        self.insertion_order.push(name.to_owned());
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    /// Variables in declaration order, for diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.insertion_order
            .iter()
            .map(|name| (name.as_str(), &self.variables[name]))
    }
}

/// Owns the Global Frame, the Local Frame stack, and the optional
/// Temporary Frame, and is the only component that creates, moves, or
/// destroys frames.
#[derive(Debug, Default)]
pub struct FrameManager {
    global: Frame,
    locals: Vec<Frame>,
    temporary: Option<Frame>,
}

impl FrameManager {
    /// A manager with an empty Global Frame, no Local Frames, and no
    /// Temporary Frame — the initial state of every program.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: Frame::new(),
            locals: Vec::new(),
            temporary: None,
        }
    }

    /// `CREATEFRAME`: set TF to an empty frame, discarding any previous
    /// content. Always succeeds.
    pub fn create_temp(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// `PUSHFRAME`: move TF onto the Local Frame stack and set TF to
    /// undefined.
    ///
    /// # Errors
    /// [`Fault::UndefinedFrame`] (exit 55) if TF is undefined.
    pub fn push_temp_to_local(&mut self, pc: ProgramCounter) -> Result<(), Fault> {
        let frame = self.temporary.take().ok_or(Fault::UndefinedFrame {
            pc,
            frame: FrameKind::Temporary,
        })?;
        self.locals.push(frame);
        Ok(())
    }

    /// `POPFRAME`: pop the top Local Frame into TF, discarding whatever TF
    /// previously held.
    ///
    /// # Errors
    /// [`Fault::UndefinedFrame`] (exit 55) if the Local Frame stack is
    /// empty.
    pub fn pop_local_to_temp(&mut self, pc: ProgramCounter) -> Result<(), Fault> {
        let frame = self.locals.pop().ok_or(Fault::UndefinedFrame {
            pc,
            frame: FrameKind::Local,
        })?;
        self.temporary = Some(frame);
        Ok(())
    }

    /// `DEFVAR`: define a new, uninitialized variable in the given frame.
    ///
    /// # Errors
    /// - [`Fault::UndefinedFrame`] (exit 55) if `frame` does not exist.
    /// - [`Fault::Semantic`] (exit 52) if `name` is already defined in
    ///   that frame.
    pub fn define(&mut self, pc: ProgramCounter, frame: FrameId, name: &str) -> Result<(), Fault> {
        self.frame_mut(pc, frame)?
            .define(name)
            .map_err(|()| Fault::Semantic(format!("variable {frame}@{name} already defined")))
    }

    /// Resolves a variable reference for reading or writing.
    ///
    /// # Errors
    /// - [`Fault::UndefinedFrame`] (exit 55) if `frame` does not exist.
    /// - [`Fault::UndefinedVariable`] (exit 54) if `name` is not defined in
    ///   that frame.
    pub fn lookup(
        &self,
        pc: ProgramCounter,
        frame: FrameId,
        name: &str,
    ) -> Result<&Variable, Fault> {
        self.frame(pc, frame)?
            .get(name)
            .ok_or_else(|| undefined_variable(pc, frame, name))
    }

    /// Like [`FrameManager::lookup`] but returns a mutable reference.
    ///
    /// # Errors
    /// Same as [`FrameManager::lookup`].
    pub fn lookup_mut(
        &mut self,
        pc: ProgramCounter,
        frame: FrameId,
        name: &str,
    ) -> Result<&mut Variable, Fault> {
        self.frame_mut(pc, frame)?
            .get_mut(name)
            .ok_or_else(|| undefined_variable(pc, frame, name))
    }

    fn frame(&self, pc: ProgramCounter, frame: FrameId) -> Result<&Frame, Fault> {
        match frame {
            FrameId::Global => Ok(&self.global),
            FrameId::Local => self.locals.last().ok_or(Fault::UndefinedFrame {
                pc,
                frame: FrameKind::Local,
            }),
            FrameId::Temporary => self.temporary.as_ref().ok_or(Fault::UndefinedFrame {
                pc,
                frame: FrameKind::Temporary,
            }),
        }
    }

    fn frame_mut(&mut self, pc: ProgramCounter, frame: FrameId) -> Result<&mut Frame, Fault> {
        match frame {
            FrameId::Global => Ok(&mut self.global),
            FrameId::Local => self.locals.last_mut().ok_or(Fault::UndefinedFrame {
                pc,
                frame: FrameKind::Local,
            }),
            FrameId::Temporary => self.temporary.as_mut().ok_or(Fault::UndefinedFrame {
                pc,
                frame: FrameKind::Temporary,
            }),
        }
    }

    /// Every (frame, name, variable) triple currently visible, for
    /// `BREAK`'s diagnostic dump.
    pub fn snapshot(&self) -> Vec<(FrameId, &str, &Variable)> {
        let mut out: Vec<_> = self
            .global
            .iter()
            .map(|(n, v)| (FrameId::Global, n, v))
            .collect();
        if let Some(lf) = self.locals.last() {
            out.extend(lf.iter().map(|(n, v)| (FrameId::Local, n, v)));
        }
        if let Some(tf) = &self.temporary {
            out.extend(tf.iter().map(|(n, v)| (FrameId::Temporary, n, v)));
        }
        out
    }
}

fn undefined_variable(pc: ProgramCounter, frame: FrameId, name: &str) -> Fault {
    let frame = match frame {
        FrameId::Global => FrameKind::Global,
        FrameId::Local => FrameKind::Local,
        FrameId::Temporary => FrameKind::Temporary,
    };
    Fault::UndefinedVariable {
        pc,
        frame,
        name: name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PC: ProgramCounter = ProgramCounter::ZERO;

    #[test]
    fn global_frame_always_exists() {
        let manager = FrameManager::new();
        assert!(manager.lookup(PC, FrameId::Global, "x").is_err());
        // The lookup failed on the *name*, not the frame — i.e. GF exists.
        let err = manager.lookup(PC, FrameId::Global, "x").unwrap_err();
        assert_eq!(err.exit_code(), 54);
    }

    #[test]
    fn local_frame_is_undefined_without_a_push() {
        let manager = FrameManager::new();
        let err = manager.lookup(PC, FrameId::Local, "x").unwrap_err();
        assert_eq!(err.exit_code(), 55);
    }

    #[test]
    fn temporary_frame_is_undefined_until_created() {
        let manager = FrameManager::new();
        let err = manager.lookup(PC, FrameId::Temporary, "x").unwrap_err();
        assert_eq!(err.exit_code(), 55);
    }

    #[test]
    fn create_frame_always_succeeds_and_discards_old_content() {
        let mut manager = FrameManager::new();
        manager.create_temp();
        manager.define(PC, FrameId::Temporary, "x").unwrap();
        manager.create_temp();
        let err = manager.lookup(PC, FrameId::Temporary, "x").unwrap_err();
        assert_eq!(err.exit_code(), 54);
    }

    #[test]
    fn push_frame_requires_a_defined_temporary_frame() {
        let mut manager = FrameManager::new();
        let err = manager.push_temp_to_local(PC).unwrap_err();
        assert_eq!(err.exit_code(), 55);
    }

    #[test]
    fn push_then_pop_round_trips_a_variable() {
        let mut manager = FrameManager::new();
        manager.create_temp();
        manager.define(PC, FrameId::Temporary, "x").unwrap();
        manager
            .lookup_mut(PC, FrameId::Temporary, "x")
            .unwrap()
            .set(Value::Int(1));
        manager.push_temp_to_local(PC).unwrap();
        assert!(manager.lookup(PC, FrameId::Temporary, "x").is_err());
        assert_eq!(
            manager.lookup(PC, FrameId::Local, "x").unwrap().get(),
            Some(&Value::Int(1))
        );
        manager.pop_local_to_temp(PC).unwrap();
        assert!(manager.lookup(PC, FrameId::Local, "x").is_err());
        assert_eq!(
            manager.lookup(PC, FrameId::Temporary, "x").unwrap().get(),
            Some(&Value::Int(1))
        );
    }

    #[test]
    fn pop_frame_requires_a_nonempty_local_stack() {
        let mut manager = FrameManager::new();
        let err = manager.pop_local_to_temp(PC).unwrap_err();
        assert_eq!(err.exit_code(), 55);
    }

    #[test]
    fn defvar_rejects_redefinition() {
        let mut manager = FrameManager::new();
        manager.define(PC, FrameId::Global, "x").unwrap();
        let err = manager.define(PC, FrameId::Global, "x").unwrap_err();
        assert_eq!(err.exit_code(), 52);
    }

    #[test]
    fn nested_local_frames_are_independent_scopes() {
        // Mirrors spec.md §8 scenario 5: an inner LF@x does not collide
        // with an outer TF@x that was already pushed onto the LF stack.
        let mut manager = FrameManager::new();
        manager.create_temp();
        manager.define(PC, FrameId::Temporary, "x").unwrap();
        manager.push_temp_to_local(PC).unwrap();
        manager.create_temp();
        manager.define(PC, FrameId::Temporary, "x").unwrap();
        manager.push_temp_to_local(PC).unwrap();
        assert_eq!(manager.locals.len(), 2);
    }
}
