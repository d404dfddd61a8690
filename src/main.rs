//! The `ippvm` executable: wires the CLI, the XML loader, and the engine
//! together, and is the one place that turns a [`Fault`] into a process
//! exit code (spec.md §4.10).

use std::fs::File;
use std::io::{self, BufReader, Write};

use ippvm::cli::Args;
use ippvm::error::Fault;
use ippvm::input::{LineSource, ReadSource};
use ippvm::{loader, Engine};

const HELP_TEXT: &str = "\
ippvm: an interpreter for IPPcode23

USAGE:
    ippvm --source FILE [--input FILE]
    ippvm --input FILE [--source FILE]
    ippvm --help

OPTIONS:
    --source FILE   XML file containing the program to execute.
    --input FILE    File providing the lines consumed by READ.
    --help          Print this help and exit.

At least one of --source/--input is required. Whichever is omitted is
read from standard input instead.";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let exit_code = run(std::env::args_os());
    std::process::exit(exit_code);
}

fn run(argv: impl IntoIterator<Item = std::ffi::OsString>) -> i32 {
    match try_run(argv) {
        Ok(code) => code,
        Err(fault) => {
            eprintln!("{fault}");
            fault.exit_code()
        }
    }
}

fn try_run(argv: impl IntoIterator<Item = std::ffi::OsString>) -> Result<i32, Fault> {
    let args = Args::parse_and_validate(argv)?;

    if args.help {
        println!("{HELP_TEXT}");
        return Ok(0);
    }

    let program = match &args.source {
        Some(path) => loader::load(open(path)?)?,
        None => loader::load(BufReader::new(io::stdin().lock()))?,
    };

    let mut input: Box<dyn ReadSource> = match &args.input {
        Some(path) => Box::new(LineSource::new(open(path)?)),
        None => Box::new(LineSource::new(BufReader::new(io::stdin().lock()))),
    };

    let mut engine = Engine::new(program);
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let code = engine.run(&mut *input, &mut stdout, &mut stderr)?;
    stdout.flush().ok();
    Ok(code)
}

fn open(path: &std::path::Path) -> Result<BufReader<File>, Fault> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Fault::CannotOpenInput {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_and_input_is_exit_10() {
        let code = run(["ippvm".into()]);
        assert_eq!(code, 10);
    }

    #[test]
    fn help_exits_zero() {
        let code = run(["ippvm".into(), "--help".into()]);
        assert_eq!(code, 0);
    }

    #[test]
    fn nonexistent_source_file_is_exit_11() {
        let code = run([
            "ippvm".into(),
            "--source".into(),
            "/nonexistent/path/does-not-exist.xml".into(),
        ]);
        assert_eq!(code, 11);
    }

    #[test]
    fn runs_a_hello_world_program_end_to_end() {
        let xml = r#"<program language="IPPcode23">
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
            <instruction order="2" opcode="MOVE">
                <arg1 type="var">GF@x</arg1>
                <arg2 type="string">Hello</arg2>
            </instruction>
            <instruction order="3" opcode="WRITE"><arg1 type="var">GF@x</arg1></instruction>
            <instruction order="4" opcode="EXIT"><arg1 type="int">0</arg1></instruction>
        </program>"#;
        let program = loader::load(xml.as_bytes()).unwrap();
        let mut engine = Engine::new(program);
        let mut input = ippvm::input::StaticSource::new(Vec::<String>::new());
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = engine.run(&mut input, &mut stdout, &mut stderr).unwrap();
        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(stdout).unwrap(), "Hello");
    }
}
