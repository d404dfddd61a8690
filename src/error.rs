//! The single error type returned by every fallible operation in this crate.
//!
//! IPPcode23 defines no in-language exception handling: every abnormal
//! condition terminates the whole process with one of a small set of
//! documented numeric codes. `Fault` is the in-memory counterpart of that
//! table; the CLI boundary is the only place that turns a `Fault` into a
//! call to [`std::process::exit`].

use std::fmt;

use crate::program::pc::ProgramCounter;

/// A frame kind, used only for error messages ([`Fault::UndefinedFrame`] and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// The Global Frame.
    Global,
    /// The (possibly empty) stack of Local Frames.
    Local,
    /// The Temporary Frame.
    Temporary,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Global => "GF",
            Self::Local => "LF",
            Self::Temporary => "TF",
        };
        f.write_str(name)
    }
}

/// Every abnormal termination condition defined by the IPPcode23 specification.
///
/// Each variant maps to exactly one exit code via [`Fault::exit_code`]. The
/// mapping is the contractual part of this type: the message text is
/// free-form and may change between versions.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// CLI argument parsing failed: `--help` combined with other flags,
    /// or neither `--source` nor `--input` given.
    #[error("invalid command line usage: {0}")]
    InvalidUsage(String),

    /// A file named by `--source` or `--input` could not be opened.
    #[error("cannot open input file {path}: {source}")]
    CannotOpenInput {
        /// The path that could not be opened.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The program's XML document is not well-formed.
    #[error("XML is not well-formed: {0}")]
    MalformedXml(String),

    /// The XML document does not describe a valid IPPcode23 program
    /// (missing/wrong root element or `language` attribute, bad or
    /// duplicate `order`, missing `opcode`, malformed literal, wrong
    /// argument shape, and so on).
    #[error("unexpected program structure: {0}")]
    UnexpectedStructure(String),

    /// A semantic error found only by running the program: an unknown
    /// opcode, a duplicate label, or redefinition of an existing variable.
    #[error("semantic error: {0}")]
    Semantic(String),

    /// An operand resolved to a value of the wrong runtime type for its
    /// opcode.
    #[error("operand type mismatch at {pc}: {detail}")]
    TypeMismatch {
        /// The instruction at which the mismatch was detected.
        pc: ProgramCounter,
        /// A human-readable description of what was expected and found.
        detail: String,
    },

    /// An instruction was constructed with an operand whose *kind* (not
    /// runtime type — this happens before any program counter exists)
    /// cannot possibly satisfy its opcode's required shape.
    #[error("operand shape mismatch: {0}")]
    OperandShape(String),

    /// A variable reference named a frame (LF/TF) that is not currently
    /// defined.
    #[error("access to nonexistent frame {frame} at {pc}")]
    UndefinedFrame {
        /// The instruction at which the access occurred.
        pc: ProgramCounter,
        /// Which frame was missing.
        frame: FrameKind,
    },

    /// A variable reference named a variable that does not exist within
    /// an existing frame.
    #[error("access to undefined variable {frame}@{name} at {pc}")]
    UndefinedVariable {
        /// The instruction at which the access occurred.
        pc: ProgramCounter,
        /// The frame that was searched.
        frame: FrameKind,
        /// The variable name that was not found.
        name: String,
    },

    /// A value was required but missing: an uninitialized variable was
    /// read, or a pop was attempted on an empty stack.
    #[error("missing value at {pc}: {detail}")]
    MissingValue {
        /// The instruction at which the fault occurred.
        pc: ProgramCounter,
        /// A human-readable description.
        detail: String,
    },

    /// An operand had the right type but an invalid value: division by
    /// zero, an `EXIT` code outside `[0, 49]`, or an illegal frame
    /// relabeling.
    #[error("invalid operand value at {pc}: {detail}")]
    InvalidValue {
        /// The instruction at which the fault occurred.
        pc: ProgramCounter,
        /// A human-readable description.
        detail: String,
    },

    /// A string operation failed: an out-of-range index, an invalid
    /// Unicode scalar value, or an empty replacement string for `SETCHAR`.
    #[error("string operation error at {pc}: {detail}")]
    StringOperation {
        /// The instruction at which the fault occurred.
        pc: ProgramCounter,
        /// A human-readable description.
        detail: String,
    },

    /// A condition that the engine's own invariants should have made
    /// unreachable.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Fault {
    /// The documented exit code for this fault.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidUsage(_) => 10,
            Self::CannotOpenInput { .. } => 11,
            Self::MalformedXml(_) => 31,
            Self::UnexpectedStructure(_) => 32,
            Self::Semantic(_) => 52,
            Self::TypeMismatch { .. } | Self::OperandShape(_) => 53,
            Self::UndefinedVariable { .. } => 54,
            Self::UndefinedFrame { .. } => 55,
            Self::MissingValue { .. } => 56,
            Self::InvalidValue { .. } => 57,
            Self::StringOperation { .. } => 58,
            Self::Internal(_) => 99,
        }
    }
}
