//! Parse-time instruction construction and validation.

use super::opcode::{Opcode, OperandSpec};
use super::operand::Operand;
use crate::error::Fault;

/// A single parsed instruction: an opcode plus its (already shape-checked)
/// operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    opcode: Opcode,
    operands: Vec<Operand>,
}

impl Instruction {
    /// Constructs an instruction, checking arity and per-position operand
    /// shape against [`Opcode::operand_specs`].
    ///
    /// # Errors
    /// - [`Fault::UnexpectedStructure`] (exit 32) if the number of operands
    ///   does not match the opcode's arity.
    /// - [`Fault::TypeMismatch`] (exit 53) if an operand's kind cannot
    ///   possibly satisfy its required shape (e.g. a string literal where
    ///   an int symbol is required).
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Result<Self, Fault> {
        let specs = opcode.operand_specs();
        if operands.len() != specs.len() {
            return Err(Fault::UnexpectedStructure(format!(
                "{} expects {} operand(s), got {}",
                opcode,
                specs.len(),
                operands.len()
            )));
        }
        for (operand, spec) in operands.iter().zip(specs) {
            if !shape_matches(operand, *spec) {
                return Err(Fault::OperandShape(format!(
                    "{opcode} operand {operand} does not have the required {spec:?} shape"
                )));
            }
        }
        Ok(Self { opcode, operands })
    }

    /// This instruction's opcode.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// This instruction's operands, in declaration order.
    #[must_use]
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }
}

fn shape_matches(operand: &Operand, spec: OperandSpec) -> bool {
    match spec {
        OperandSpec::Var => matches!(operand, Operand::VarRef(_)),
        OperandSpec::Symbol => operand.is_symbol(),
        OperandSpec::IntSymbol => {
            matches!(operand, Operand::VarRef(_) | Operand::IntLit(_))
        }
        OperandSpec::BoolSymbol => {
            matches!(operand, Operand::VarRef(_) | Operand::BoolLit(_))
        }
        OperandSpec::TypeTag => matches!(operand, Operand::TypeTag(_)),
        OperandSpec::Label => matches!(operand, Operand::LabelName(_)),
    }
}
