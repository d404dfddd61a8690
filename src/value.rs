//! The runtime value model.
//!
//! A [`Value`] is the only kind of thing that can be stored in a
//! [`Variable`](crate::frame::Variable) or pushed onto the data stack. The
//! parse-only operand kinds `TypeTag` and `LabelName`
//! ([`crate::program::operand::Operand`]) never appear here: they are
//! erased by the time an operand is resolved into a value.

use std::fmt;

/// The runtime type tag of a [`Value`], also used as the payload of the
/// `TYPE` instruction and the `type` operand kind accepted by `READ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    /// `int`.
    Int,
    /// `string`.
    Str,
    /// `bool`.
    Bool,
    /// `nil`.
    Nil,
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Str => "string",
            Self::Bool => "bool",
            Self::Nil => "nil",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for TypeName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "string" => Ok(Self::Str),
            "bool" => Ok(Self::Bool),
            "nil" => Ok(Self::Nil),
            _ => Err(()),
        }
    }
}

/// A runtime value: one of the four variants a [`Variable`](crate::frame::Variable)
/// or the data stack may ever hold.
#[derive(Debug, Clone, PartialEq, derive_more::From)]
pub enum Value {
    /// A 64-bit signed integer.
    Int(i64),
    /// A UTF-8 string, already escape-decoded.
    Str(String),
    /// A boolean.
    Bool(bool),
    /// The absence of a value.
    Nil,
}

impl Value {
    /// The runtime type tag of this value.
    #[must_use]
    pub const fn type_name(&self) -> TypeName {
        match self {
            Self::Int(_) => TypeName::Int,
            Self::Str(_) => TypeName::Str,
            Self::Bool(_) => TypeName::Bool,
            Self::Nil => TypeName::Nil,
        }
    }

    /// Renders this value the way `WRITE`/`DPRINT` do: `Nil` as the empty
    /// string, booleans as lowercase `true`/`false`, integers in decimal,
    /// strings verbatim.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Nil => String::new(),
        }
    }

    /// Returns the contained `i64`, or `None` if this is not `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the contained string slice, or `None` if this is not `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the contained `bool`, or `None` if this is not `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
