//! Command-line argument handling (spec.md §6, §4.10).
//!
//! Kept deliberately thin: [`Args`] only knows about files and flags, never
//! about `Fault` or the engine. `main.rs` is the only place that turns a
//! parsed [`Args`] into running program.

use std::path::PathBuf;

use clap::Parser;

use crate::error::Fault;

/// Runs an IPPcode23 program.
#[derive(Parser, Debug)]
#[command(name = "ippvm", about = "Interpreter for IPPcode23", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Args {
    /// XML file containing the program to execute. Read from standard
    /// input if omitted and `--input` is given.
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// File providing the lines consumed by `READ`. Read from standard
    /// input if omitted and `--source` is given.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Print this help and exit.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl Args {
    /// Parses `argv`, enforcing the IPPcode23-specific usage rules that
    /// `clap`'s derive API cannot express on its own: `--help` must be the
    /// only argument, and at least one of `--source`/`--input` is required.
    ///
    /// # Errors
    /// [`Fault::InvalidUsage`] (exit 10) on any violation.
    pub fn parse_and_validate<I, T>(argv: I) -> Result<Self, Fault>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let argv: Vec<std::ffi::OsString> = argv.into_iter().map(Into::into).collect();
        let arg_count = argv.len();
        let args = Self::try_parse_from(argv).map_err(|e| Fault::InvalidUsage(e.to_string()))?;

        if args.help {
            if arg_count != 2 {
                return Err(Fault::InvalidUsage(
                    "--help must be the only argument".to_owned(),
                ));
            }
            return Ok(args);
        }

        if args.source.is_none() && args.input.is_none() {
            return Err(Fault::InvalidUsage(
                "at least one of --source and --input is required".to_owned(),
            ));
        }

        Ok(args)
    }
}
