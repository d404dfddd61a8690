//! The `READ` input source: one line at a time, from `--input` or stdin
//! (spec.md §6).

use std::io::BufRead;

/// A source of lines for `READ`. Exhaustion, not an error, is what `READ`
/// sees once every line has been consumed.
pub trait ReadSource {
    /// Reads the next line, with its trailing newline stripped. Returns
    /// `None` once the source is exhausted.
    fn read_line(&mut self) -> Option<String>;
}

/// Adapts any [`BufRead`] (a file or stdin) into a [`ReadSource`].
pub struct LineSource<R> {
    reader: R,
}

impl<R: BufRead> LineSource<R> {
    /// Wraps a buffered reader.
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> ReadSource for LineSource<R> {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(line)
            }
            Err(_) => None,
        }
    }
}

/// A fixed, in-memory line source, used in tests.
pub struct StaticSource {
    lines: std::collections::VecDeque<String>,
}

impl StaticSource {
    /// Builds a source that yields `lines` in order, then exhausts.
    #[must_use]
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl ReadSource for StaticSource {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}
