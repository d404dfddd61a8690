//! The execution engine: the two-pass control-flow algorithm and the
//! per-opcode dispatcher (spec.md §4.5, §4.6).

use std::io::Write;

use tracing::{debug, error, trace};

use crate::error::Fault;
use crate::frame::FrameManager;
use crate::input::ReadSource;
use crate::program::{Opcode, Operand, Program, ProgramCounter, VarRef};
use crate::stacks::{CallStack, DataStack, LabelTable};
use crate::value::{TypeName, Value};

/// What an executed instruction tells the run loop to do next.
enum Control {
    /// Advance the program counter by one, as usual.
    Advance,
    /// Set the program counter to exactly this value; do not also advance.
    Jump(ProgramCounter),
    /// Terminate the process with this exit code (`EXIT`).
    Terminate(i32),
}

/// Owns every piece of mutable state an IPPcode23 program can observe:
/// the frames, the auxiliary stacks, the label table, and the program
/// counter. Nothing here is a global or thread-local — an `Engine` is
/// passed around explicitly, per spec.md §9's redesign note.
#[derive(Debug)]
pub struct Engine {
    program: Program,
    frames: FrameManager,
    data: DataStack,
    calls: CallStack,
    labels: LabelTable,
    pc: ProgramCounter,
}

impl Engine {
    /// Builds an engine for `program`. Does not run the pre-pass; call
    /// [`Engine::run`] to execute.
    #[must_use]
    pub fn new(program: Program) -> Self {
        Self {
            program,
            frames: FrameManager::new(),
            data: DataStack::new(),
            calls: CallStack::new(),
            labels: LabelTable::new(),
            pc: ProgramCounter::ZERO,
        }
    }

    /// Runs the two-pass algorithm to completion: registers every label,
    /// then executes instructions until `EXIT` or the program counter
    /// runs off the end of the instruction list.
    ///
    /// # Errors
    /// Any [`Fault`] raised by label registration or instruction
    /// execution, per spec.md §7.
    pub fn run(
        &mut self,
        input: &mut dyn ReadSource,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<i32, Fault> {
        self.register_labels()?;
        self.pc = ProgramCounter::ZERO;
        loop {
            if self.pc.index() >= self.program.len() {
                return Ok(0);
            }
            let insn = self.program[self.pc.index()].clone();
            if insn.opcode() == Opcode::Label {
                trace!(pc = %self.pc, "skip label");
                self.pc = self.pc.next();
                continue;
            }
            trace!(pc = %self.pc, opcode = %insn.opcode(), "dispatch");
            let control = self.execute(&insn, input, stdout, stderr).inspect_err(|fault| {
                error!(pc = %self.pc, %fault, "fault, terminating");
            })?;
            match control {
                Control::Advance => self.pc = self.pc.next(),
                Control::Jump(target) => self.pc = target,
                Control::Terminate(code) => return Ok(code),
            }
        }
    }

    fn register_labels(&mut self) -> Result<(), Fault> {
        for (index, insn) in self.program.iter().enumerate() {
            if insn.opcode() == Opcode::Label {
                let Operand::LabelName(name) = &insn.operands()[0] else {
                    return Err(Fault::Internal("LABEL without a label operand".into()));
                };
                self.labels.register(name, ProgramCounter::from(index))?;
                debug!(label = %name, at = index, "registered label");
            }
        }
        Ok(())
    }

    fn execute(
        &mut self,
        insn: &crate::program::Instruction,
        input: &mut dyn ReadSource,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<Control, Fault> {
        let pc = self.pc;
        let ops = insn.operands();
        match insn.opcode() {
            Opcode::Move => {
                let value = self.resolve(pc, &ops[1])?;
                self.write_var(pc, &ops[0], value)?;
                Ok(Control::Advance)
            }
            Opcode::CreateFrame => {
                self.frames.create_temp();
                Ok(Control::Advance)
            }
            Opcode::PushFrame => {
                self.frames.push_temp_to_local(pc)?;
                Ok(Control::Advance)
            }
            Opcode::PopFrame => {
                self.frames.pop_local_to_temp(pc)?;
                Ok(Control::Advance)
            }
            Opcode::DefVar => {
                let var = expect_var(&ops[0])?;
                self.frames.define(pc, var.frame, &var.name)?;
                Ok(Control::Advance)
            }
            Opcode::Call => {
                let target = self.resolve_label(&ops[0])?;
                self.calls.push(pc);
                Ok(Control::Jump(target))
            }
            Opcode::Return => {
                let call_site = self.calls.pop(pc)?;
                Ok(Control::Jump(call_site.next()))
            }
            Opcode::PushS => {
                let value = self.resolve(pc, &ops[0])?;
                self.data.push(value);
                Ok(Control::Advance)
            }
            Opcode::PopS => {
                let value = self.data.pop(pc)?;
                self.write_var(pc, &ops[0], value)?;
                Ok(Control::Advance)
            }
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::IDiv => {
                self.arithmetic(pc, insn.opcode(), ops)?;
                Ok(Control::Advance)
            }
            Opcode::Lt | Opcode::Gt => {
                self.order_comparison(pc, insn.opcode(), ops)?;
                Ok(Control::Advance)
            }
            Opcode::Eq => {
                let result = self.equality(pc, &ops[1], &ops[2])?;
                self.write_var(pc, &ops[0], Value::Bool(result))?;
                Ok(Control::Advance)
            }
            Opcode::And | Opcode::Or => {
                self.logical_binary(pc, insn.opcode(), ops)?;
                Ok(Control::Advance)
            }
            Opcode::Not => {
                let a = self.expect_bool(pc, &ops[1])?;
                self.write_var(pc, &ops[0], Value::Bool(!a))?;
                Ok(Control::Advance)
            }
            Opcode::Int2Char => {
                let code_point = self.expect_int(pc, &ops[1])?;
                let ch = u32::try_from(code_point)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Fault::StringOperation {
                        pc,
                        detail: format!("{code_point} is not a valid Unicode scalar value"),
                    })?;
                self.write_var(pc, &ops[0], Value::Str(ch.to_string()))?;
                Ok(Control::Advance)
            }
            Opcode::Stri2Int => {
                let s = self.expect_str(pc, &ops[1])?;
                let index = self.expect_int(pc, &ops[2])?;
                let ch = char_at(&s, index).ok_or_else(|| Fault::StringOperation {
                    pc,
                    detail: format!("index {index} is out of range for a {}-character string", s.chars().count()),
                })?;
                self.write_var(pc, &ops[0], Value::Int(i64::from(u32::from(ch))))?;
                Ok(Control::Advance)
            }
            Opcode::Read => {
                let type_tag = expect_type_tag(&ops[1])?;
                let value = self.read_value(input, type_tag);
                self.write_var(pc, &ops[0], value)?;
                Ok(Control::Advance)
            }
            Opcode::Write => {
                let value = self.resolve(pc, &ops[0])?;
                write!(stdout, "{}", value.display())
                    .map_err(|e| Fault::Internal(format!("stdout write failed: {e}")))?;
                Ok(Control::Advance)
            }
            Opcode::Concat => {
                let a = self.expect_str(pc, &ops[1])?;
                let b = self.expect_str(pc, &ops[2])?;
                self.write_var(pc, &ops[0], Value::Str(a + &b))?;
                Ok(Control::Advance)
            }
            Opcode::StrLen => {
                let s = self.expect_str(pc, &ops[1])?;
                self.write_var(pc, &ops[0], Value::Int(i64::try_from(s.chars().count()).unwrap_or(i64::MAX)))?;
                Ok(Control::Advance)
            }
            Opcode::GetChar => {
                let s = self.expect_str(pc, &ops[1])?;
                let index = self.expect_int(pc, &ops[2])?;
                let ch = char_at(&s, index).ok_or_else(|| Fault::StringOperation {
                    pc,
                    detail: format!("index {index} is out of range for a {}-character string", s.chars().count()),
                })?;
                self.write_var(pc, &ops[0], Value::Str(ch.to_string()))?;
                Ok(Control::Advance)
            }
            Opcode::SetChar => {
                self.set_char(pc, ops)?;
                Ok(Control::Advance)
            }
            Opcode::Type => {
                let name = self.type_of(pc, &ops[1])?;
                self.write_var(pc, &ops[0], Value::Str(name))?;
                Ok(Control::Advance)
            }
            Opcode::Label => unreachable!("LABEL is intercepted before execute() is called"),
            Opcode::Jump => {
                let target = self.resolve_label(&ops[0])?;
                Ok(Control::Jump(target))
            }
            Opcode::JumpIfEq | Opcode::JumpIfNeq => {
                let equal = self.equality(pc, &ops[1], &ops[2])?;
                let take = equal == (insn.opcode() == Opcode::JumpIfEq);
                if take {
                    Ok(Control::Jump(self.resolve_label(&ops[0])?))
                } else {
                    Ok(Control::Advance)
                }
            }
            Opcode::Exit => {
                let code = self.expect_int(pc, &ops[0])?;
                if (0..=49).contains(&code) {
                    Ok(Control::Terminate(i32::try_from(code).expect("checked range")))
                } else {
                    Err(Fault::InvalidValue {
                        pc,
                        detail: format!("EXIT code {code} is outside [0, 49]"),
                    })
                }
            }
            Opcode::DPrint => {
                let value = self.resolve(pc, &ops[0])?;
                write!(stderr, "{}", value.display())
                    .map_err(|e| Fault::Internal(format!("stderr write failed: {e}")))?;
                Ok(Control::Advance)
            }
            Opcode::Break => {
                self.dump_break(stderr);
                Ok(Control::Advance)
            }
        }
    }

    fn dump_break(&self, stderr: &mut dyn Write) {
        let _ = writeln!(stderr, "--- BREAK at {} ---", self.pc);
        let _ = writeln!(stderr, "labels:");
        for (name, at) in self.labels.snapshot() {
            let _ = writeln!(stderr, "  {name} -> {at}");
        }
        let _ = writeln!(stderr, "data stack (top last):");
        for value in self.data.snapshot() {
            let _ = writeln!(stderr, "  {value:?}");
        }
        let _ = writeln!(stderr, "call stack (depth {}):", self.calls.depth());
        for ret in self.calls.snapshot() {
            let _ = writeln!(stderr, "  -> {ret}");
        }
    }

    fn read_value(&self, input: &mut dyn ReadSource, type_tag: TypeName) -> Value {
        let Some(line) = input.read_line() else {
            return Value::Nil;
        };
        match type_tag {
            TypeName::Int => line.trim().parse::<i64>().map_or(Value::Nil, Value::Int),
            TypeName::Str => crate::escape::decode(&line).map_or(Value::Nil, Value::Str),
            TypeName::Bool => Value::Bool(line.eq_ignore_ascii_case("true")),
            TypeName::Nil => Value::Nil,
        }
    }

    fn resolve_label(&self, operand: &Operand) -> Result<ProgramCounter, Fault> {
        let Operand::LabelName(name) = operand else {
            return Err(Fault::Internal("expected a label operand".into()));
        };
        self.labels.resolve(name)
    }

    /// Resolves any symbol operand (variable reference or literal) to its
    /// runtime value.
    ///
    /// # Errors
    /// - [`Fault::UndefinedFrame`]/[`Fault::UndefinedVariable`] for a bad
    ///   variable reference.
    /// - [`Fault::MissingValue`] (exit 56) if the variable is
    ///   uninitialized.
    fn resolve(&self, pc: ProgramCounter, operand: &Operand) -> Result<Value, Fault> {
        match operand {
            Operand::VarRef(v) => {
                let var = self.frames.lookup(pc, v.frame, &v.name)?;
                var.get().cloned().ok_or_else(|| Fault::MissingValue {
                    pc,
                    detail: format!("read of uninitialized variable {v}"),
                })
            }
            Operand::IntLit(i) => Ok(Value::Int(*i)),
            Operand::StrLit(s) => Ok(Value::Str(s.clone())),
            Operand::BoolLit(b) => Ok(Value::Bool(*b)),
            Operand::NilLit => Ok(Value::Nil),
            Operand::TypeTag(_) | Operand::LabelName(_) => Err(Fault::Internal(
                "type tag/label operand used where a symbol was required".into(),
            )),
        }
    }

    fn write_var(&mut self, pc: ProgramCounter, operand: &Operand, value: Value) -> Result<(), Fault> {
        let v = expect_var(operand)?;
        self.frames.lookup_mut(pc, v.frame, &v.name)?.set(value);
        Ok(())
    }

    fn expect_int(&self, pc: ProgramCounter, operand: &Operand) -> Result<i64, Fault> {
        let value = self.resolve(pc, operand)?;
        value.as_int().ok_or_else(|| Fault::TypeMismatch {
            pc,
            detail: format!("expected int, found {}", value.type_name()),
        })
    }

    fn expect_bool(&self, pc: ProgramCounter, operand: &Operand) -> Result<bool, Fault> {
        let value = self.resolve(pc, operand)?;
        value.as_bool().ok_or_else(|| Fault::TypeMismatch {
            pc,
            detail: format!("expected bool, found {}", value.type_name()),
        })
    }

    fn expect_str(&self, pc: ProgramCounter, operand: &Operand) -> Result<String, Fault> {
        let value = self.resolve(pc, operand)?;
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| Fault::TypeMismatch {
                pc,
                detail: format!("expected string, found {}", value.type_name()),
            })
    }

    fn arithmetic(&mut self, pc: ProgramCounter, op: Opcode, ops: &[Operand]) -> Result<(), Fault> {
        let a = self.expect_int(pc, &ops[1])?;
        let b = self.expect_int(pc, &ops[2])?;
        let result = match op {
            Opcode::Add => a.checked_add(b),
            Opcode::Sub => a.checked_sub(b),
            Opcode::Mul => a.checked_mul(b),
            Opcode::IDiv => {
                if b == 0 {
                    return Err(Fault::InvalidValue {
                        pc,
                        detail: "IDIV by zero".to_owned(),
                    });
                }
                a.checked_div(b)
            }
            _ => unreachable!("arithmetic() is only called for ADD/SUB/MUL/IDIV"),
        };
        let result = result.ok_or_else(|| Fault::InvalidValue {
            pc,
            detail: format!("{op} overflowed a 64-bit integer"),
        })?;
        self.write_var(pc, &ops[0], Value::Int(result))
    }

    fn order_comparison(&mut self, pc: ProgramCounter, op: Opcode, ops: &[Operand]) -> Result<(), Fault> {
        let a = self.resolve(pc, &ops[1])?;
        let b = self.resolve(pc, &ops[2])?;
        let result = match (&a, &b) {
            (Value::Int(x), Value::Int(y)) => compare(op, x, y),
            (Value::Str(x), Value::Str(y)) => compare(op, x, y),
            (Value::Bool(x), Value::Bool(y)) => compare(op, x, y),
            _ => {
                return Err(Fault::TypeMismatch {
                    pc,
                    detail: format!(
                        "{op} requires two operands of the same non-nil type, found {} and {}",
                        a.type_name(),
                        b.type_name()
                    ),
                })
            }
        };
        self.write_var(pc, &ops[0], Value::Bool(result))
    }

    fn equality(&self, pc: ProgramCounter, lhs: &Operand, rhs: &Operand) -> Result<bool, Fault> {
        let a = self.resolve(pc, lhs)?;
        let b = self.resolve(pc, rhs)?;
        match (&a, &b) {
            (Value::Nil, Value::Nil) => Ok(true),
            (Value::Nil, _) | (_, Value::Nil) => Ok(false),
            (Value::Int(x), Value::Int(y)) => Ok(x == y),
            (Value::Str(x), Value::Str(y)) => Ok(x == y),
            (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
            _ => Err(Fault::TypeMismatch {
                pc,
                detail: format!(
                    "EQ requires equal types or nil, found {} and {}",
                    a.type_name(),
                    b.type_name()
                ),
            }),
        }
    }

    fn logical_binary(&mut self, pc: ProgramCounter, op: Opcode, ops: &[Operand]) -> Result<(), Fault> {
        let a = self.expect_bool(pc, &ops[1])?;
        let b = self.expect_bool(pc, &ops[2])?;
        let result = match op {
            Opcode::And => a && b,
            Opcode::Or => a || b,
            _ => unreachable!("logical_binary() is only called for AND/OR"),
        };
        self.write_var(pc, &ops[0], Value::Bool(result))
    }

    fn set_char(&mut self, pc: ProgramCounter, ops: &[Operand]) -> Result<(), Fault> {
        let var = expect_var(&ops[0])?;
        let current = self
            .frames
            .lookup(pc, var.frame, &var.name)?
            .get()
            .cloned()
            .ok_or_else(|| Fault::MissingValue {
                pc,
                detail: format!("SETCHAR target {var} is uninitialized"),
            })?;
        let mut chars: Vec<char> = current
            .as_str()
            .ok_or_else(|| Fault::TypeMismatch {
                pc,
                detail: format!("SETCHAR target {var} does not hold a string"),
            })?
            .chars()
            .collect();
        let index = self.expect_int(pc, &ops[1])?;
        let replacement = self.expect_str(pc, &ops[2])?;
        let first = replacement.chars().next().ok_or_else(|| Fault::StringOperation {
            pc,
            detail: "SETCHAR replacement string is empty".to_owned(),
        })?;
        let i = usize::try_from(index)
            .ok()
            .filter(|&i| i < chars.len())
            .ok_or_else(|| Fault::StringOperation {
                pc,
                detail: format!("index {index} is out of range for a {}-character string", chars.len()),
            })?;
        chars[i] = first;
        self.frames
            .lookup_mut(pc, var.frame, &var.name)?
            .set(Value::Str(chars.into_iter().collect()));
        Ok(())
    }

    fn type_of(&self, pc: ProgramCounter, operand: &Operand) -> Result<String, Fault> {
        // Unlike every other opcode, TYPE does not fail on an
        // uninitialized variable: it reports the empty string instead.
        match operand {
            Operand::VarRef(v) => {
                let var = self.frames.lookup(pc, v.frame, &v.name)?;
                Ok(var.get().map_or_else(String::new, |value| value.type_name().to_string()))
            }
            Operand::IntLit(_) => Ok(TypeName::Int.to_string()),
            Operand::StrLit(_) => Ok(TypeName::Str.to_string()),
            Operand::BoolLit(_) => Ok(TypeName::Bool.to_string()),
            Operand::NilLit => Ok(TypeName::Nil.to_string()),
            Operand::TypeTag(_) | Operand::LabelName(_) => {
                Err(Fault::Internal("TYPE operand must be a symbol".into()))
            }
        }
    }
}

fn compare<T: PartialOrd>(op: Opcode, a: T, b: T) -> bool {
    match op {
        Opcode::Lt => a < b,
        Opcode::Gt => a > b,
        _ => unreachable!("compare() is only called for LT/GT"),
    }
}

fn char_at(s: &str, index: i64) -> Option<char> {
    usize::try_from(index).ok().and_then(|i| s.chars().nth(i))
}

fn expect_var(operand: &Operand) -> Result<&VarRef, Fault> {
    match operand {
        Operand::VarRef(v) => Ok(v),
        other => Err(Fault::Internal(format!(
            "expected a variable operand, found {}",
            other.kind_name()
        ))),
    }
}

fn expect_type_tag(operand: &Operand) -> Result<TypeName, Fault> {
    match operand {
        Operand::TypeTag(t) => Ok(*t),
        other => Err(Fault::Internal(format!(
            "expected a type tag operand, found {}",
            other.kind_name()
        ))),
    }
}
