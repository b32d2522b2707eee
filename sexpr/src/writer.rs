//! Serialise expressions into s-expression bytes.
//!
//! A [`Writer`] accepts either whole expressions or a manual sequence of
//! `begin_list`, `write_atom` and `end_list` calls. Like the parsers, a writer
//! produces exactly one top-level value and refuses anything after it.
use crate::atom::{Atom, MAX_ATOM_LEN};
use crate::value::{Expression, ExpressionList};
use std::io;

pub mod advanced;
pub mod canonical;
mod pretty;

pub use advanced::{AdvancedWriter, AdvancedWriterBuilder};
pub use canonical::CanonicalWriter;
pub use pretty::to_string_pretty;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("a root atom has already been written")]
    RootAtomWritten,
    #[error("the root list has already been closed")]
    RootComplete,
    #[error("no open list to end")]
    NoOpenList,
    #[error("atom of {len} bytes exceeds the maximum length of 2^31 - 1")]
    AtomTooLong { len: usize },
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

fn check_len(len: usize) -> Result<()> {
    if len > MAX_ATOM_LEN as usize {
        return Err(WriteError::AtomTooLong { len });
    }
    Ok(())
}

/// Rejects atoms, or their hints, that no encoding can frame.
pub(crate) fn check_atom(atom: &Atom) -> Result<()> {
    if let Some(hint) = atom.display_hint() {
        check_len(hint.atom().len())?;
    }
    check_len(atom.len())
}

/// Shorthand for a result specialised to write errors.
pub type Result<T, E = WriteError> = std::result::Result<T, E>;

/// Trait for writers of s-expressions.
///
/// Every method returns the number of bytes it wrote to the sink.
pub trait Writer {
    /// Write a single atom, including its display hint.
    fn write_atom(&mut self, atom: &Atom) -> Result<usize>;

    /// Open a list. Must be balanced by a later call to [`Writer::end_list`].
    fn begin_list(&mut self) -> Result<usize>;

    /// Close the innermost open list.
    fn end_list(&mut self) -> Result<usize>;

    /// Flush the underlying sink.
    fn flush(&mut self) -> Result<()>;

    /// Write a list together with all of its children.
    fn write_list(&mut self, list: &ExpressionList) -> Result<usize> {
        let mut written = self.begin_list()?;
        for item in list {
            written += self.write_expression(item)?;
        }
        written += self.end_list()?;
        Ok(written)
    }

    /// Write an expression of either kind.
    fn write_expression(&mut self, expression: &Expression) -> Result<usize> {
        match expression {
            Expression::Atom(atom) => self.write_atom(atom),
            Expression::List(list) => self.write_list(list),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RootState {
    #[default]
    Empty,
    Atom,
    Open(usize),
    Complete,
}

/// Tracks the top-level value of a writer so that only one is ever written.
#[derive(Debug, Default)]
pub(crate) struct RootGuard {
    state: RootState,
}

impl RootGuard {
    fn check_open(&self) -> Result<()> {
        match self.state {
            RootState::Atom => Err(WriteError::RootAtomWritten),
            RootState::Complete => Err(WriteError::RootComplete),
            RootState::Empty | RootState::Open(_) => Ok(()),
        }
    }

    pub fn atom(&mut self) -> Result<()> {
        self.check_open()?;
        if self.state == RootState::Empty {
            self.state = RootState::Atom;
        }
        Ok(())
    }

    pub fn begin_list(&mut self) -> Result<()> {
        self.check_open()?;
        self.state = RootState::Open(self.depth() + 1);
        Ok(())
    }

    pub fn end_list(&mut self) -> Result<()> {
        self.state = match self.state {
            RootState::Open(1) => RootState::Complete,
            RootState::Open(depth) => RootState::Open(depth - 1),
            RootState::Empty | RootState::Atom | RootState::Complete => {
                return Err(WriteError::NoOpenList)
            }
        };
        Ok(())
    }

    /// Number of lists currently open.
    pub fn depth(&self) -> usize {
        match self.state {
            RootState::Open(depth) => depth,
            _ => 0,
        }
    }
}
