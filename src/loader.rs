//! The XML program loader: turns an IPPcode23 XML document into a
//! [`Program`](crate::program::Program) (spec.md §6, §4.9).
//!
//! Nothing downstream of [`load`] knows anything about XML; a `Program` is
//! just a sorted, already-validated `Vec<Instruction>`.

use std::io::BufRead;
use std::str;

use itertools::Itertools;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use crate::error::Fault;
use crate::program::{FrameId, Instruction, Opcode, Operand, Program, VarRef};
use crate::value::TypeName;

const LANGUAGE: &str = "IPPcode23";

/// Parses a complete IPPcode23 XML document into a [`Program`], sorted by
/// the `order` attribute.
///
/// # Errors
/// - [`Fault::MalformedXml`] (31) if the document is not well-formed XML.
/// - [`Fault::UnexpectedStructure`] (32) for any structural violation:
///   wrong root element/`language`, a bad or duplicate `order`, a missing
///   `opcode`, a misnamed/out-of-sequence `arg*` child, or a malformed
///   literal.
/// - [`Fault::Semantic`] (52) for an unrecognized opcode mnemonic.
pub fn load<R: BufRead>(source: R) -> Result<Program, Fault> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();

    expect_program_root(&mut reader, &mut buf)?;

    let mut raw: Vec<(u64, Instruction)> = Vec::new();
    loop {
        match next_event(&mut reader, &mut buf)? {
            Event::Start(start) if local_name(&start) == b"instruction" => {
                let (order, insn) = read_instruction(&mut reader, &mut buf, &start, false)?;
                raw.push((order, insn));
            }
            Event::Empty(start) if local_name(&start) == b"instruction" => {
                let (order, insn) = read_instruction(&mut reader, &mut buf, &start, true)?;
                raw.push((order, insn));
            }
            Event::End(end) if local_name_qname(end.name()) == b"program" => break,
            Event::Eof => {
                return Err(Fault::UnexpectedStructure(
                    "XML document ended before </program>".to_owned(),
                ))
            }
            Event::Text(_) | Event::Comment(_) | Event::PI(_) => {}
            other => {
                return Err(Fault::UnexpectedStructure(format!(
                    "unexpected content at program level: {other:?}"
                )))
            }
        }
    }

    reject_duplicate_orders(&raw)?;
    Ok(raw
        .into_iter()
        .sorted_by_key(|(order, _)| *order)
        .map(|(_, insn)| insn)
        .collect())
}

fn expect_program_root<R: BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<(), Fault> {
    loop {
        match next_event(reader, buf)? {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) => {}
            Event::Start(start) | Event::Empty(start) if local_name(&start) == b"program" => {
                let language = find_attr(&start, "language")?;
                if language.as_deref() != Some(LANGUAGE) {
                    return Err(Fault::UnexpectedStructure(format!(
                        "expected program language=\"{LANGUAGE}\", found {language:?}"
                    )));
                }
                return Ok(());
            }
            other => {
                return Err(Fault::UnexpectedStructure(format!(
                    "expected the document root to be a program element, found {other:?}"
                )))
            }
        }
    }
}

fn reject_duplicate_orders(raw: &[(u64, Instruction)]) -> Result<(), Fault> {
    let mut seen = std::collections::HashSet::new();
    for (order, _) in raw {
        if !seen.insert(*order) {
            return Err(Fault::UnexpectedStructure(format!(
                "duplicate instruction order {order}"
            )));
        }
    }
    Ok(())
}

/// Reads one `instruction` element (its `order`/`opcode` attributes and,
/// unless `self_closing`, its `arg1..3` children) and constructs the
/// resulting [`Instruction`].
fn read_instruction<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: &BytesStart,
    self_closing: bool,
) -> Result<(u64, Instruction), Fault> {
    let order = find_attr(start, "order")?
        .ok_or_else(|| Fault::UnexpectedStructure("instruction missing order attribute".to_owned()))?;
    let order: u64 = order.parse().ok().filter(|n| *n >= 1).ok_or_else(|| {
        Fault::UnexpectedStructure(format!("order {order:?} is not a positive integer"))
    })?;
    let mnemonic = find_attr(start, "opcode")?
        .ok_or_else(|| Fault::UnexpectedStructure("instruction missing opcode attribute".to_owned()))?;
    let opcode = Opcode::from_mnemonic(&mnemonic)
        .ok_or_else(|| Fault::Semantic(format!("unknown opcode {mnemonic}")))?;

    let operands = if self_closing {
        Vec::new()
    } else {
        read_args(reader, buf)?
    };

    let insn = Instruction::new(opcode, operands)?;
    Ok((order, insn))
}

/// Reads `arg1`, `arg2`, `arg3` children (contiguous from 1) up to the
/// matching `</instruction>`.
fn read_args<R: BufRead>(reader: &mut Reader<R>, buf: &mut Vec<u8>) -> Result<Vec<Operand>, Fault> {
    let mut operands = Vec::new();
    loop {
        match next_event(reader, buf)? {
            Event::Start(start) if is_expected_arg(&start, operands.len()) => {
                let type_name = find_attr(&start, "type")?.ok_or_else(|| {
                    Fault::UnexpectedStructure("arg element missing type attribute".to_owned())
                })?;
                let text = read_text_until_end(reader, buf, start.name())?;
                operands.push(parse_operand(&type_name, &text)?);
            }
            Event::Empty(start) if is_expected_arg(&start, operands.len()) => {
                let type_name = find_attr(&start, "type")?.ok_or_else(|| {
                    Fault::UnexpectedStructure("arg element missing type attribute".to_owned())
                })?;
                operands.push(parse_operand(&type_name, "")?);
            }
            Event::End(end) if local_name_qname(end.name()) == b"instruction" => {
                return Ok(operands);
            }
            Event::Text(text) if is_whitespace_only(&text) => {}
            Event::Comment(_) | Event::PI(_) => {}
            other => {
                return Err(Fault::UnexpectedStructure(format!(
                    "expected arg{} next, found {other:?}",
                    operands.len() + 1
                )))
            }
        }
    }
}

fn is_whitespace_only(text: &quick_xml::events::BytesText) -> bool {
    text.as_ref().iter().all(u8::is_ascii_whitespace)
}

fn is_expected_arg(start: &BytesStart, already_read: usize) -> bool {
    let expected = format!("arg{}", already_read + 1);
    local_name(start) == expected.as_bytes()
}

fn read_text_until_end<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    name: QName,
) -> Result<String, Fault> {
    let mut text = String::new();
    loop {
        match next_event(reader, buf)? {
            Event::Text(bytes) => {
                let unescaped = bytes
                    .unescape()
                    .map_err(|e| Fault::MalformedXml(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(end) if end.name().as_ref() == name.as_ref() => return Ok(text),
            Event::CData(cdata) => {
                text.push_str(&String::from_utf8_lossy(cdata.as_ref()));
            }
            other => {
                return Err(Fault::UnexpectedStructure(format!(
                    "unexpected content inside an arg element: {other:?}"
                )))
            }
        }
    }
}

fn parse_operand(type_name: &str, text: &str) -> Result<Operand, Fault> {
    let trimmed = text.trim();
    match type_name {
        "var" => {
            let (frame, name) = trimmed.split_once('@').ok_or_else(|| {
                Fault::UnexpectedStructure(format!("bad variable literal {text:?}"))
            })?;
            let frame: FrameId = frame
                .parse()
                .map_err(|()| Fault::UnexpectedStructure(format!("unknown frame {frame:?}")))?;
            Ok(Operand::VarRef(VarRef {
                frame,
                name: name.to_owned(),
            }))
        }
        "int" => trimmed
            .parse()
            .map(Operand::IntLit)
            .map_err(|_| Fault::UnexpectedStructure(format!("bad int literal {text:?}"))),
        "bool" => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Ok(Operand::BoolLit(true)),
            "false" => Ok(Operand::BoolLit(false)),
            _ => Err(Fault::UnexpectedStructure(format!(
                "bad bool literal {text:?}"
            ))),
        },
        "nil" => Ok(Operand::NilLit),
        "string" => crate::escape::decode(text)
            .map(Operand::StrLit)
            .ok_or_else(|| Fault::UnexpectedStructure(format!("bad string literal {text:?}"))),
        "type" => trimmed
            .parse::<TypeName>()
            .map(Operand::TypeTag)
            .map_err(|()| Fault::UnexpectedStructure(format!("bad type literal {text:?}"))),
        "label" => {
            if trimmed.is_empty() {
                Err(Fault::UnexpectedStructure("empty label literal".to_owned()))
            } else {
                Ok(Operand::LabelName(trimmed.to_owned()))
            }
        }
        other => Err(Fault::UnexpectedStructure(format!(
            "unknown arg type {other:?}"
        ))),
    }
}

fn next_event<'a, R: BufRead>(
    reader: &mut Reader<R>,
    buf: &'a mut Vec<u8>,
) -> Result<Event<'a>, Fault> {
    buf.clear();
    reader
        .read_event_into(buf)
        .map_err(|e| Fault::MalformedXml(e.to_string()))
}

fn local_name(start: &BytesStart) -> &[u8] {
    local_name_qname(start.name())
}

fn local_name_qname(name: QName) -> &[u8] {
    name.into_inner()
}

fn find_attr(start: &BytesStart, key: &str) -> Result<Option<String>, Fault> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Fault::MalformedXml(e.to_string()))?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| Fault::MalformedXml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(xml: &str) -> Result<Program, Fault> {
        load(xml.as_bytes())
    }

    #[test]
    fn rejects_wrong_root_element() {
        let err = load_str(r#"<notprogram language="IPPcode23"></notprogram>"#).unwrap_err();
        assert_eq!(err.exit_code(), 32);
    }

    #[test]
    fn rejects_wrong_language_attribute() {
        let err = load_str(r#"<program language="PPcode99"></program>"#).unwrap_err();
        assert_eq!(err.exit_code(), 32);
    }

    #[test]
    fn rejects_malformed_xml() {
        let err = load_str(r#"<program language="IPPcode23">"#).unwrap_err();
        assert_eq!(err.exit_code(), 31);
    }

    #[test]
    fn rejects_duplicate_order() {
        let xml = r#"<program language="IPPcode23">
            <instruction order="1" opcode="CREATEFRAME"></instruction>
            <instruction order="1" opcode="PUSHFRAME"></instruction>
        </program>"#;
        let err = load_str(xml).unwrap_err();
        assert_eq!(err.exit_code(), 32);
    }

    #[test]
    fn rejects_unknown_opcode() {
        let xml = r#"<program language="IPPcode23">
            <instruction order="1" opcode="FROBNICATE"></instruction>
        </program>"#;
        let err = load_str(xml).unwrap_err();
        assert_eq!(err.exit_code(), 52);
    }

    #[test]
    fn sorts_instructions_by_order() {
        let xml = r#"<program language="IPPcode23">
            <instruction order="2" opcode="PUSHFRAME"></instruction>
            <instruction order="1" opcode="CREATEFRAME"></instruction>
        </program>"#;
        let program = load_str(xml).unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program[0].opcode(), Opcode::CreateFrame);
        assert_eq!(program[1].opcode(), Opcode::PushFrame);
    }

    #[test]
    fn parses_a_full_instruction_with_var_and_literal_args() {
        let xml = r#"<program language="IPPcode23">
            <instruction order="1" opcode="MOVE">
                <arg1 type="var">GF@x</arg1>
                <arg2 type="string">a\032b</arg2>
            </instruction>
        </program>"#;
        let program = load_str(xml).unwrap();
        assert_eq!(program.len(), 1);
        let insn = &program[0];
        assert_eq!(insn.opcode(), Opcode::Move);
        assert_eq!(
            insn.operands()[0],
            Operand::VarRef(VarRef {
                frame: FrameId::Global,
                name: "x".to_owned(),
            })
        );
        assert_eq!(insn.operands()[1], Operand::StrLit("a b".to_owned()));
    }

    #[test]
    fn rejects_out_of_sequence_arg_tags() {
        let xml = r#"<program language="IPPcode23">
            <instruction order="1" opcode="MOVE">
                <arg2 type="var">GF@x</arg2>
                <arg1 type="int">1</arg1>
            </instruction>
        </program>"#;
        let err = load_str(xml).unwrap_err();
        assert_eq!(err.exit_code(), 32);
    }

    #[test]
    fn self_closing_zero_arity_instruction_parses() {
        let xml = r#"<program language="IPPcode23">
            <instruction order="1" opcode="CREATEFRAME"/>
        </program>"#;
        let program = load_str(xml).unwrap();
        assert_eq!(program.len(), 1);
        assert_eq!(program[0].opcode(), Opcode::CreateFrame);
    }
}
