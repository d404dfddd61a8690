//! Parse-time operand representation.
//!
//! An [`Operand`] is what the parser produces; a [`crate::value::Value`] is
//! what the engine computes at run time. Keeping the two separate is the
//! one change this crate makes relative to sources that conflate "a
//! variable holding an int" with "an operand whose declared type is int".

use std::fmt;

use crate::value::TypeName;

/// Which of the three frames a [`VarRef`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameId {
    /// The Global Frame.
    Global,
    /// The active Local Frame.
    Local,
    /// The Temporary Frame.
    Temporary,
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Global => "GF",
            Self::Local => "LF",
            Self::Temporary => "TF",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for FrameId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GF" => Ok(Self::Global),
            "LF" => Ok(Self::Local),
            "TF" => Ok(Self::Temporary),
            _ => Err(()),
        }
    }
}

/// A reference to a variable in a specific frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    /// The frame the variable lives in.
    pub frame: FrameId,
    /// The variable's name within that frame.
    pub name: String,
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame, self.name)
    }
}

/// A parsed instruction operand.
///
/// `VarRef` and the four literal kinds together form what spec.md calls a
/// *symbol*. `TypeTag` and `LabelName` only ever appear as operands; no
/// instruction ever produces a runtime value of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A variable reference.
    VarRef(VarRef),
    /// An integer literal.
    IntLit(i64),
    /// A string literal, already `\ddd`-escape-decoded.
    StrLit(String),
    /// A boolean literal.
    BoolLit(bool),
    /// The `nil` literal.
    NilLit,
    /// A type-name operand, as used by `READ` and `TYPE`'s result convention.
    TypeTag(TypeName),
    /// A label name operand.
    LabelName(String),
}

impl Operand {
    /// `true` for the four literal-value kinds and for `VarRef`, i.e. for
    /// anything that spec.md would call a *symbol*.
    #[must_use]
    pub const fn is_symbol(&self) -> bool {
        matches!(
            self,
            Self::VarRef(_) | Self::IntLit(_) | Self::StrLit(_) | Self::BoolLit(_) | Self::NilLit
        )
    }

    /// A short, stable name for this operand's kind, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::VarRef(_) => "variable",
            Self::IntLit(_) => "int",
            Self::StrLit(_) => "string",
            Self::BoolLit(_) => "bool",
            Self::NilLit => "nil",
            Self::TypeTag(_) => "type",
            Self::LabelName(_) => "label",
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VarRef(v) => write!(f, "{v}"),
            Self::IntLit(i) => write!(f, "int@{i}"),
            Self::StrLit(s) => write!(f, "string@{s}"),
            Self::BoolLit(b) => write!(f, "bool@{b}"),
            Self::NilLit => write!(f, "nil@nil"),
            Self::TypeTag(t) => write!(f, "type@{t}"),
            Self::LabelName(l) => write!(f, "label@{l}"),
        }
    }
}
