//! The program counter: an index into the instruction list.

use std::fmt::{self, Display};

/// An index into the instruction list.
///
/// The initial value is always [`ProgramCounter::ZERO`]. Instructions that
/// do not perform a control transfer advance it by one; jumps, calls, and
/// returns set it directly.
#[derive(Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[repr(transparent)]
pub struct ProgramCounter(usize);

impl ProgramCounter {
    /// The entry point of a program.
    pub const ZERO: Self = Self(0);

    /// The instruction index this program counter refers to.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// The next program counter in sequence.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for ProgramCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:05}", self.0)
    }
}

impl From<usize> for ProgramCounter {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<ProgramCounter> for usize {
    fn from(value: ProgramCounter) -> Self {
        value.0
    }
}
