//! The parsed program: instructions, their operands, and the program
//! counter that indexes them. Nothing in this module knows anything about
//! XML; it is the common representation produced by
//! [`crate::loader`](crate::loader) and consumed by [`crate::engine`](crate::engine).

pub mod instruction;
pub mod opcode;
pub mod operand;
pub mod pc;

pub use instruction::Instruction;
pub use opcode::{Opcode, OperandSpec};
pub use operand::{FrameId, Operand, VarRef};
pub use pc::ProgramCounter;

/// An ordered, already-validated list of instructions, ready for the
/// label pre-pass and execution loop (spec.md §4.5).
pub type Program = Vec<Instruction>;
