//! Streaming parsers that turn a byte stream into list and atom events.
//!
//! A [`StreamingParser`] pulls bytes from a reader and reports what it finds to
//! every registered [`ParserCallback`], in document order. The parsers never
//! backtrack and stop at the first error. Building a tree out of the events is
//! the job of [`TreeBuilder`](crate::builder::TreeBuilder).
use crate::atom::MAX_ATOM_LEN;
use std::cell::RefCell;
use std::fmt::Display;
use std::io::{self, BufRead, BufReader, Read};
use std::rc::Rc;

pub mod advanced;
pub mod canonical;

pub use advanced::AdvancedStreamingParser;
pub use canonical::CanonicalStreamingParser;

/// The reason a parse failed.
#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected byte '{}'", .0.escape_ascii())]
    UnexpectedByte(u8),
    #[error("unexpected ')' with no open list")]
    UnbalancedClose,
    #[error("end of input inside an open list")]
    UnclosedList,
    #[error("atom length is greater than 2^31-1")]
    LengthOverflow,
    #[error("quoted string has {actual} bytes but its explicit length is {expected}")]
    LengthMismatch { expected: u32, actual: usize },
    #[error("invalid escape sequence in quoted string")]
    InvalidEscape,
    #[error("invalid hex atom")]
    InvalidHex,
    #[error("invalid base64 atom")]
    InvalidBase64,
    #[error("display hints can not be nested")]
    NestedDisplayHint,
    #[error("display hint is not terminated by ']'")]
    UnterminatedDisplayHint,
    #[error("display hint is not followed by an atom")]
    DanglingDisplayHint,
    #[error("found multiple root values")]
    MultipleRoots,
    #[error("extraneous end list")]
    ExtraneousEndList,
    #[error("{0}")]
    Rejected(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// A parse error, with the byte offset at which it was detected when known.
#[derive(Debug, thiserror::Error)]
#[error("{kind}{}", .offset.map(|offset| format!(" at byte {offset}")).unwrap_or_default())]
pub struct ParseError {
    kind: ParseErrorKind,
    offset: Option<u64>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind) -> Self {
        ParseError { kind, offset: None }
    }

    /// An error raised by a callback to stop the parse.
    pub fn rejected(message: impl Display) -> Self {
        Self::new(ParseErrorKind::Rejected(message.to_string()))
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Records `offset` unless the error already carries one.
    pub(crate) fn or_offset(mut self, offset: u64) -> Self {
        self.offset.get_or_insert(offset);
        self
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Shorthand for a result specialised to parse errors.
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Listener for the events produced by a [`StreamingParser`].
///
/// Any method may return an error to stop the parse; the parser hands it back
/// to its caller unchanged, apart from filling in the offset.
pub trait ParserCallback {
    fn begin_list(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_list(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_atom(&mut self, _atom: &[u8], _display_hint: Option<&[u8]>) -> Result<()> {
        Ok(())
    }
}

/// A callback shared between the parser and its owner.
pub type SharedCallback = Rc<RefCell<dyn ParserCallback>>;

/// Ordered set of callbacks, invoked in registration order.
#[derive(Default)]
pub struct Callbacks {
    callbacks: Vec<SharedCallback>,
}

impl Callbacks {
    /// Registers `callback` unless it is already registered.
    pub fn add(&mut self, callback: SharedCallback) {
        if !self.callbacks.iter().any(|c| Rc::ptr_eq(c, &callback)) {
            self.callbacks.push(callback);
        }
    }

    pub fn remove(&mut self, callback: &SharedCallback) {
        self.callbacks.retain(|c| !Rc::ptr_eq(c, callback));
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn begin_list(&self) -> Result<()> {
        tracing::trace!("begin list");
        for callback in &self.callbacks {
            callback.borrow_mut().begin_list()?;
        }
        Ok(())
    }

    fn end_list(&self) -> Result<()> {
        tracing::trace!("end list");
        for callback in &self.callbacks {
            callback.borrow_mut().end_list()?;
        }
        Ok(())
    }

    fn on_atom(&self, atom: &[u8], display_hint: Option<&[u8]>) -> Result<()> {
        tracing::trace!(len = atom.len(), hinted = display_hint.is_some(), "atom");
        for callback in &self.callbacks {
            callback.borrow_mut().on_atom(atom, display_hint)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("len", &self.callbacks.len())
            .finish()
    }
}

/// A pull-based parser over a byte stream.
pub trait StreamingParser {
    /// Consumes the whole input, reporting events to the registered callbacks.
    fn parse(&mut self) -> Result<()>;

    fn callbacks_mut(&mut self) -> &mut Callbacks;

    /// Registers a callback. Registering the same callback twice has no effect.
    fn add_callback(&mut self, callback: SharedCallback) {
        self.callbacks_mut().add(callback);
    }

    fn remove_callback(&mut self, callback: &SharedCallback) {
        self.callbacks_mut().remove(callback);
    }
}

/// Buffered byte reader that tracks its offset into the input.
#[derive(Debug)]
pub(crate) struct ByteSource<R> {
    reader: BufReader<R>,
    position: u64,
}

impl<R: Read> ByteSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            position: 0,
        }
    }

    /// Offset of the next byte to be read.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next byte, returning `None` at the end of the input.
    pub fn next(&mut self) -> Result<Option<u8>> {
        let position = self.position;
        let byte = loop {
            match self.reader.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(ParseError::new(err.into()).or_offset(position)),
            }
        };

        if byte.is_some() {
            self.reader.consume(1);
            self.position += 1;
        }
        Ok(byte)
    }

    /// Reads the next byte, treating the end of the input as an error.
    pub fn expect(&mut self) -> Result<u8> {
        self.next()?
            .ok_or_else(|| self.error(ParseErrorKind::UnexpectedEof))
    }

    /// Reads exactly `len` raw bytes.
    pub fn read_exact(&mut self, len: u32) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let read = (&mut self.reader)
            .take(u64::from(len))
            .read_to_end(&mut bytes);
        self.position += bytes.len() as u64;
        read.map_err(|err| self.error(err.into()))?;

        if bytes.len() < len as usize {
            return Err(self.error(ParseErrorKind::UnexpectedEof));
        }
        Ok(bytes)
    }

    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind).or_offset(self.position)
    }
}

/// Appends a decimal digit to an atom length, failing once the length would
/// pass 2^31-1.
pub(crate) fn push_length_digit(length: u32, digit: u8) -> Result<u32, ParseErrorKind> {
    debug_assert!(digit.is_ascii_digit());
    length
        .checked_mul(10)
        .and_then(|length| length.checked_add(u32::from(digit - b'0')))
        .filter(|length| *length <= MAX_ATOM_LEN)
        .ok_or(ParseErrorKind::LengthOverflow)
}

/// Whitespace permitted between tokens.
#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}
