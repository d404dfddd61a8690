#![warn(
    clippy::pedantic,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    rust_2021_compatibility
)]
#![allow(clippy::module_name_repetitions)]

//! `ippvm`: an interpreter for IPPcode23, a small stack-and-frame
//! intermediate language encoded as XML.
//!
//! The crate is split into a layer that knows nothing about XML or the
//! command line ([`value`], [`program`], [`frame`], [`stacks`], [`engine`])
//! and two thin collaborators built on top of it: [`loader`] (XML parsing)
//! and [`cli`] (argument handling). The [`engine::Engine`] is the only type
//! that executes a program; everything else exists to construct or feed it.

pub mod cli;
pub mod engine;
pub mod error;
pub mod escape;
pub mod frame;
pub mod input;
pub mod loader;
pub mod program;
pub mod stacks;
pub mod value;

pub use engine::Engine;
pub use error::Fault;
pub use program::Program;
