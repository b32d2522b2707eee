//! Parser for the canonical encoding.
//!
//! Atoms are written as `<len>:<bytes>`, optionally preceded by a display hint
//! `[<len>:<bytes>]`. Lists are delimited by `(` and `)`. Whitespace between
//! tokens is skipped; any other byte is an error.
use super::{
    is_whitespace, push_length_digit, ByteSource, Callbacks, ParseErrorKind, Result,
    StreamingParser,
};
use crate::builder::parse_tree;
use crate::value::Expression;
use std::io::Read;

/// Streaming parser for canonical s-expressions.
#[derive(Debug)]
pub struct CanonicalStreamingParser<R> {
    source: ByteSource<R>,
    callbacks: Callbacks,
    depth: usize,
}

impl<R: Read> CanonicalStreamingParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            source: ByteSource::new(reader),
            callbacks: Callbacks::default(),
            depth: 0,
        }
    }

    /// Reads the digits of a length tag up to and including the `:`.
    fn read_length(&mut self, first: u8) -> Result<u32> {
        let mut length = push_length_digit(0, first).map_err(|kind| self.source.error(kind))?;
        loop {
            match self.source.expect()? {
                b':' => return Ok(length),
                b @ b'0'..=b'9' => {
                    length = push_length_digit(length, b).map_err(|kind| self.source.error(kind))?;
                }
                b => return Err(self.source.error(ParseErrorKind::UnexpectedByte(b))),
            }
        }
    }

    /// Reads the remainder of a display hint after its opening `[`.
    fn read_hint(&mut self) -> Result<Vec<u8>> {
        let len = match self.source.expect()? {
            b'[' => return Err(self.source.error(ParseErrorKind::NestedDisplayHint)),
            b @ b'0'..=b'9' => self.read_length(b)?,
            b => return Err(self.source.error(ParseErrorKind::UnexpectedByte(b))),
        };
        let hint = self.source.read_exact(len)?;

        match self.source.next()? {
            Some(b']') => Ok(hint),
            _ => Err(self.source.error(ParseErrorKind::UnterminatedDisplayHint)),
        }
    }

    fn read_atom(&mut self, first: u8, hint: Option<&[u8]>) -> Result<()> {
        let len = self.read_length(first)?;
        let atom = self.source.read_exact(len)?;
        self.callbacks
            .on_atom(&atom, hint)
            .map_err(|err| err.or_offset(self.source.position()))
    }
}

impl<R: Read> StreamingParser for CanonicalStreamingParser<R> {
    fn parse(&mut self) -> Result<()> {
        while let Some(b) = self.source.next()? {
            match b {
                b'(' => {
                    self.depth += 1;
                    self.callbacks
                        .begin_list()
                        .map_err(|err| err.or_offset(self.source.position()))?;
                }
                b')' => {
                    if self.depth == 0 {
                        return Err(self.source.error(ParseErrorKind::UnbalancedClose));
                    }
                    self.depth -= 1;
                    self.callbacks
                        .end_list()
                        .map_err(|err| err.or_offset(self.source.position()))?;
                }
                b'[' => {
                    let hint = self.read_hint()?;
                    match self.source.next()? {
                        Some(b @ b'0'..=b'9') => self.read_atom(b, Some(hint.as_slice()))?,
                        Some(b'[') => {
                            return Err(self.source.error(ParseErrorKind::NestedDisplayHint))
                        }
                        _ => return Err(self.source.error(ParseErrorKind::DanglingDisplayHint)),
                    }
                }
                b'0'..=b'9' => self.read_atom(b, None)?,
                b if is_whitespace(b) => {}
                b => return Err(self.source.error(ParseErrorKind::UnexpectedByte(b))),
            }
        }

        if self.depth > 0 {
            return Err(self.source.error(ParseErrorKind::UnclosedList));
        }

        tracing::debug!(bytes = self.source.position(), "canonical parse finished");
        Ok(())
    }

    fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }
}

/// Parse a single expression in the canonical encoding from a reader.
///
/// Returns `None` when the input holds no expression at all.
pub fn from_reader<R: Read>(reader: R) -> Result<Option<Expression>> {
    parse_tree(CanonicalStreamingParser::new(reader))
}

/// Parse a single expression in the canonical encoding from a byte slice.
pub fn from_slice(bytes: &[u8]) -> Result<Option<Expression>> {
    from_reader(bytes)
}
