//! End-to-end scenarios: XML in, stdout/exit code out, exercising the
//! loader and the engine together exactly as the `ippvm` binary does.

use ippvm::input::StaticSource;
use ippvm::{loader, Engine};

fn run(xml: &str, input_lines: &[&str]) -> (i32, String, String) {
    let program = loader::load(xml.as_bytes()).expect("program should load");
    let mut engine = Engine::new(program);
    let mut input = StaticSource::new(input_lines.iter().copied());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = engine
        .run(&mut input, &mut stdout, &mut stderr)
        .expect("program should run to completion");
    (
        code,
        String::from_utf8(stdout).unwrap(),
        String::from_utf8(stderr).unwrap(),
    )
}

fn run_expect_fault(xml: &str, input_lines: &[&str]) -> i32 {
    let program = loader::load(xml.as_bytes()).expect("program should load");
    let mut engine = Engine::new(program);
    let mut input = StaticSource::new(input_lines.iter().copied());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    engine
        .run(&mut input, &mut stdout, &mut stderr)
        .expect_err("program should fault")
        .exit_code()
}

#[test]
fn hello_world() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
        <instruction order="2" opcode="MOVE">
            <arg1 type="var">GF@x</arg1>
            <arg2 type="string">Hello</arg2>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@x</arg1></instruction>
        <instruction order="4" opcode="WRITE"><arg1 type="string"> world</arg1></instruction>
        <instruction order="5" opcode="EXIT"><arg1 type="int">0</arg1></instruction>
    </program>"#;
    let (code, stdout, _) = run(xml, &[]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "Hello world");
}

#[test]
fn arithmetic_and_conversion() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@a</arg1></instruction>
        <instruction order="2" opcode="MOVE">
            <arg1 type="var">GF@a</arg1>
            <arg2 type="int">65</arg2>
        </instruction>
        <instruction order="3" opcode="DEFVAR"><arg1 type="var">GF@c</arg1></instruction>
        <instruction order="4" opcode="INT2CHAR">
            <arg1 type="var">GF@c</arg1>
            <arg2 type="var">GF@a</arg2>
        </instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="var">GF@c</arg1></instruction>
    </program>"#;
    let (code, stdout, _) = run(xml, &[]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "A");
}

#[test]
fn forward_label_reference_resolves_via_the_pre_pass() {
    // LABEL end comes after JUMP end in program order, but precedes it in
    // XML source order, mirroring spec.md's reverse-order scenario.
    let xml = r#"<program language="IPPcode23">
        <instruction order="2" opcode="JUMP"><arg1 type="label">end</arg1></instruction>
        <instruction order="1" opcode="LABEL"><arg1 type="label">end</arg1></instruction>
    </program>"#;
    let (code, _, _) = run(xml, &[]);
    assert_eq!(code, 0);
}

#[test]
fn call_and_return() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="CALL"><arg1 type="label">f</arg1></instruction>
        <instruction order="2" opcode="WRITE"><arg1 type="string">B</arg1></instruction>
        <instruction order="3" opcode="EXIT"><arg1 type="int">0</arg1></instruction>
        <instruction order="4" opcode="LABEL"><arg1 type="label">f</arg1></instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="string">A</arg1></instruction>
        <instruction order="6" opcode="RETURN"></instruction>
    </program>"#;
    let (code, stdout, _) = run(xml, &[]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "AB");
}

#[test]
fn nested_frames_do_not_collide_on_name() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="CREATEFRAME"></instruction>
        <instruction order="2" opcode="DEFVAR"><arg1 type="var">TF@x</arg1></instruction>
        <instruction order="3" opcode="MOVE">
            <arg1 type="var">TF@x</arg1>
            <arg2 type="int">1</arg2>
        </instruction>
        <instruction order="4" opcode="PUSHFRAME"></instruction>
        <instruction order="5" opcode="DEFVAR"><arg1 type="var">LF@x</arg1></instruction>
    </program>"#;
    let (code, _, _) = run(xml, &[]);
    assert_eq!(code, 0);
}

#[test]
fn division_by_zero_is_exit_57() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@q</arg1></instruction>
        <instruction order="2" opcode="IDIV">
            <arg1 type="var">GF@q</arg1>
            <arg2 type="int">10</arg2>
            <arg3 type="int">0</arg3>
        </instruction>
    </program>"#;
    assert_eq!(run_expect_fault(xml, &[]), 57);
}

#[test]
fn escape_decoding_in_a_literal_and_in_read() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@lit</arg1></instruction>
        <instruction order="2" opcode="MOVE">
            <arg1 type="var">GF@lit</arg1>
            <arg2 type="string">a\032b</arg2>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@lit</arg1></instruction>
        <instruction order="4" opcode="DEFVAR"><arg1 type="var">GF@got</arg1></instruction>
        <instruction order="5" opcode="READ">
            <arg1 type="var">GF@got</arg1>
            <arg2 type="type">string</arg2>
        </instruction>
        <instruction order="6" opcode="WRITE"><arg1 type="var">GF@got</arg1></instruction>
    </program>"#;
    let (code, stdout, _) = run(xml, &[r"a\032b"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "a ba b");
}

#[test]
fn read_on_exhausted_input_stores_nil() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@got</arg1></instruction>
        <instruction order="2" opcode="READ">
            <arg1 type="var">GF@got</arg1>
            <arg2 type="type">int</arg2>
        </instruction>
        <instruction order="3" opcode="TYPE">
            <arg1 type="var">GF@got</arg1>
            <arg2 type="var">GF@got</arg2>
        </instruction>
        <instruction order="4" opcode="WRITE"><arg1 type="var">GF@got</arg1></instruction>
    </program>"#;
    let (code, stdout, _) = run(xml, &[]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "nil");
}

#[test]
fn eq_with_nil_is_false_but_lt_with_nil_is_a_type_mismatch() {
    let eq_xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@r</arg1></instruction>
        <instruction order="2" opcode="EQ">
            <arg1 type="var">GF@r</arg1>
            <arg2 type="nil">nil</arg2>
            <arg3 type="int">1</arg3>
        </instruction>
        <instruction order="3" opcode="WRITE"><arg1 type="var">GF@r</arg1></instruction>
    </program>"#;
    let (code, stdout, _) = run(eq_xml, &[]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "false");

    let lt_xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@r</arg1></instruction>
        <instruction order="2" opcode="LT">
            <arg1 type="var">GF@r</arg1>
            <arg2 type="nil">nil</arg2>
            <arg3 type="int">1</arg3>
        </instruction>
    </program>"#;
    assert_eq!(run_expect_fault(lt_xml, &[]), 53);
}

#[test]
fn type_of_a_fresh_defvar_is_the_empty_string() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
        <instruction order="2" opcode="DEFVAR"><arg1 type="var">GF@t</arg1></instruction>
        <instruction order="3" opcode="TYPE">
            <arg1 type="var">GF@t</arg1>
            <arg2 type="var">GF@x</arg2>
        </instruction>
        <instruction order="4" opcode="WRITE"><arg1 type="var">GF@t</arg1></instruction>
        <instruction order="5" opcode="WRITE"><arg1 type="string">|</arg1></instruction>
    </program>"#;
    let (code, stdout, _) = run(xml, &[]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "|");
}

#[test]
fn getchar_at_string_length_is_exit_58() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@s</arg1></instruction>
        <instruction order="2" opcode="MOVE">
            <arg1 type="var">GF@s</arg1>
            <arg2 type="string">ab</arg2>
        </instruction>
        <instruction order="3" opcode="DEFVAR"><arg1 type="var">GF@c</arg1></instruction>
        <instruction order="4" opcode="GETCHAR">
            <arg1 type="var">GF@c</arg1>
            <arg2 type="var">GF@s</arg2>
            <arg3 type="int">2</arg3>
        </instruction>
    </program>"#;
    assert_eq!(run_expect_fault(xml, &[]), 58);
}

#[test]
fn exit_code_out_of_range_is_57() {
    let xml = r#"<program language="IPPcode23">
        <instruction order="1" opcode="EXIT"><arg1 type="int">50</arg1></instruction>
    </program>"#;
    assert_eq!(run_expect_fault(xml, &[]), 57);
}
