//! Parser for the advanced encoding.
//!
//! Besides verbatim `<len>:<bytes>` atoms, the advanced encoding accepts bare
//! alphanumeric symbols, quoted strings with C-style escapes (optionally
//! prefixed with their decoded length), `#hex#` and `|base64|` atoms. Any of
//! these may serve as a display hint when enclosed in `[` and `]`.
//!
//! The parser is a state machine that is driven one byte at a time. Leading
//! digits are ambiguous between a symbol and a length prefix, so they are
//! buffered until the byte that follows them decides the matter.
use super::{
    is_whitespace, push_length_digit, ByteSource, Callbacks, ParseErrorKind, Result,
    StreamingParser,
};
use crate::buffer::GrowableBuffer;
use crate::builder::parse_tree;
use crate::escape::{is_quoted_char, unescape};
use crate::value::Expression;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use std::io::Read;

/// Standard alphabet, accepting base64 atoms with or without padding.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ConsumeWhitespace,
    StartingSymbolOrVerbatim,
    ConsumeSymbol,
    ConsumeQuotedString,
    ConsumeHex,
    ConsumeBase64,
}

/// Streaming parser for advanced s-expressions.
#[derive(Debug)]
pub struct AdvancedStreamingParser<R> {
    source: ByteSource<R>,
    callbacks: Callbacks,
    state: State,
    depth: usize,
    /// Digits or symbol characters read so far.
    token: Vec<u8>,
    /// Explicit length given in front of a quoted string.
    quoted_length: Option<u32>,
    /// Whether the parser is inside `[...]`.
    capturing_hint: bool,
    /// A complete hint waiting for its atom.
    hint: Option<Vec<u8>>,
}

impl<R: Read> AdvancedStreamingParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            source: ByteSource::new(reader),
            callbacks: Callbacks::default(),
            state: State::ConsumeWhitespace,
            depth: 0,
            token: Vec::new(),
            quoted_length: None,
            capturing_hint: false,
            hint: None,
        }
    }

    fn consume_whitespace(&mut self) -> Result<bool> {
        let Some(b) = self.source.next()? else {
            return self.finish_input();
        };

        match b {
            b'(' => self.begin_list()?,
            b')' => self.end_list()?,
            b'[' => {
                if self.capturing_hint || self.hint.is_some() {
                    return Err(self.source.error(ParseErrorKind::NestedDisplayHint));
                }
                self.capturing_hint = true;
            }
            b']' => {
                if !self.capturing_hint {
                    return Err(self.source.error(ParseErrorKind::UnexpectedByte(b)));
                }
                self.capturing_hint = false;
                self.hint = Some(Vec::new());
            }
            b'#' => self.state = State::ConsumeHex,
            b'|' => self.state = State::ConsumeBase64,
            b'"' => self.state = State::ConsumeQuotedString,
            b'0'..=b'9' => {
                self.token.push(b);
                self.state = State::StartingSymbolOrVerbatim;
            }
            b if b.is_ascii_alphabetic() => {
                self.token.push(b);
                self.state = State::ConsumeSymbol;
            }
            b if is_whitespace(b) => {}
            b => return Err(self.source.error(ParseErrorKind::UnexpectedByte(b))),
        }
        Ok(true)
    }

    fn consume_starting_symbol_or_verbatim(&mut self) -> Result<bool> {
        loop {
            match self.source.next()? {
                Some(b @ b'0'..=b'9') => self.token.push(b),
                Some(b) if b.is_ascii_alphabetic() => {
                    self.token.push(b);
                    self.state = State::ConsumeSymbol;
                    return Ok(true);
                }
                Some(b':') => {
                    let len = self.take_length()?;
                    let bytes = self.source.read_exact(len)?;
                    self.finish_value(bytes, false)?;
                    self.state = State::ConsumeWhitespace;
                    return Ok(true);
                }
                Some(b'"') => {
                    self.quoted_length = Some(self.take_length()?);
                    self.state = State::ConsumeQuotedString;
                    return Ok(true);
                }
                terminator => return self.finish_symbol(terminator),
            }
        }
    }

    fn consume_symbol(&mut self) -> Result<bool> {
        loop {
            match self.source.next()? {
                Some(b) if b.is_ascii_alphanumeric() => self.token.push(b),
                terminator => return self.finish_symbol(terminator),
            }
        }
    }

    fn consume_hex(&mut self) -> Result<bool> {
        let mut digits = GrowableBuffer::new();
        // Odd-length runs are padded with a leading zero.
        digits.push(b'0');
        loop {
            match self.source.expect()? {
                b if b.is_ascii_hexdigit() => digits.push(b),
                b if is_whitespace(b) => {}
                b'#' => break,
                b => return Err(self.source.error(ParseErrorKind::UnexpectedByte(b))),
            }
        }

        let digits = digits.as_slice();
        let digits = if digits.len() % 2 == 0 {
            digits
        } else {
            &digits[1..]
        };
        let bytes = hex::decode(digits).map_err(|_| self.source.error(ParseErrorKind::InvalidHex))?;
        self.finish_value(bytes, false)?;
        self.state = State::ConsumeWhitespace;
        Ok(true)
    }

    fn consume_base64(&mut self) -> Result<bool> {
        let mut encoded = GrowableBuffer::new();
        loop {
            match self.source.expect()? {
                b if b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=') => {
                    encoded.push(b)
                }
                b if is_whitespace(b) => {}
                b'|' => break,
                b => return Err(self.source.error(ParseErrorKind::UnexpectedByte(b))),
            }
        }

        let bytes = BASE64
            .decode(encoded.as_slice())
            .map_err(|_| self.source.error(ParseErrorKind::InvalidBase64))?;
        self.finish_value(bytes, false)?;
        self.state = State::ConsumeWhitespace;
        Ok(true)
    }

    fn consume_quoted_string(&mut self) -> Result<bool> {
        let expected = self.quoted_length.take();
        let capacity = expected.map_or(16, |len| (len as usize).clamp(1, 4096));
        let mut body = GrowableBuffer::with_capacity(capacity);

        // Collect the raw body up to the closing quote; an escaped byte never
        // closes the string.
        loop {
            match self.source.expect()? {
                b'"' => break,
                b'\\' => {
                    body.push(b'\\');
                    let escaped = self.source.expect()?;
                    body.push(escaped);
                }
                b if is_quoted_char(b) => body.push(b),
                b => return Err(self.source.error(ParseErrorKind::UnexpectedByte(b))),
            }
        }

        let bytes = std::str::from_utf8(body.as_slice())
            .ok()
            .and_then(unescape)
            .ok_or_else(|| self.source.error(ParseErrorKind::InvalidEscape))?;

        if let Some(expected) = expected {
            if bytes.len() != expected as usize {
                return Err(self.source.error(ParseErrorKind::LengthMismatch {
                    expected,
                    actual: bytes.len(),
                }));
            }
        }

        self.finish_value(bytes, false)?;
        self.state = State::ConsumeWhitespace;
        Ok(true)
    }

    /// Interprets the buffered digits as a decimal atom length.
    fn take_length(&mut self) -> Result<u32> {
        let digits = std::mem::take(&mut self.token);
        digits
            .into_iter()
            .try_fold(0, push_length_digit)
            .map_err(|kind| self.source.error(kind))
    }

    /// Completes the buffered symbol on the byte that ended it.
    fn finish_symbol(&mut self, terminator: Option<u8>) -> Result<bool> {
        let symbol = std::mem::take(&mut self.token);
        self.state = State::ConsumeWhitespace;

        match terminator {
            None => {
                if self.capturing_hint {
                    return Err(self.source.error(ParseErrorKind::UnterminatedDisplayHint));
                }
                if self.depth > 0 {
                    return Err(self.source.error(ParseErrorKind::UnclosedList));
                }
                self.finish_value(symbol, true)?;
                return Ok(false);
            }
            Some(b) if is_whitespace(b) => self.finish_value(symbol, false)?,
            Some(b']') if self.capturing_hint => self.finish_value(symbol, true)?,
            Some(b @ (b'(' | b')')) => {
                if self.capturing_hint {
                    return Err(self.source.error(ParseErrorKind::UnterminatedDisplayHint));
                }
                if b == b')' && self.depth == 0 {
                    return Err(self.source.error(ParseErrorKind::UnbalancedClose));
                }
                self.finish_value(symbol, true)?;
                if b == b'(' {
                    self.begin_list()?;
                } else {
                    self.end_list()?;
                }
            }
            Some(b) => return Err(self.source.error(ParseErrorKind::UnexpectedByte(b))),
        }
        Ok(true)
    }

    /// Hands a decoded value to the callbacks, or stores it as the pending
    /// display hint. `closed` tells whether the hint's `]` was already read.
    fn finish_value(&mut self, bytes: Vec<u8>, closed: bool) -> Result<()> {
        if self.capturing_hint {
            self.capturing_hint = false;
            self.hint = Some(bytes);
            if !closed {
                self.consume_until_hint_end()?;
            }
            return Ok(());
        }

        let hint = self.hint.take();
        self.callbacks
            .on_atom(&bytes, hint.as_deref())
            .map_err(|err| err.or_offset(self.source.position()))
    }

    fn consume_until_hint_end(&mut self) -> Result<()> {
        loop {
            match self.source.next()? {
                Some(b']') => return Ok(()),
                Some(b) if is_whitespace(b) => {}
                _ => return Err(self.source.error(ParseErrorKind::UnterminatedDisplayHint)),
            }
        }
    }

    fn begin_list(&mut self) -> Result<()> {
        self.check_no_hint()?;
        self.depth += 1;
        self.callbacks
            .begin_list()
            .map_err(|err| err.or_offset(self.source.position()))
    }

    fn end_list(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(self.source.error(ParseErrorKind::UnbalancedClose));
        }
        self.check_no_hint()?;
        self.depth -= 1;
        self.callbacks
            .end_list()
            .map_err(|err| err.or_offset(self.source.position()))
    }

    fn check_no_hint(&self) -> Result<()> {
        if self.capturing_hint {
            return Err(self.source.error(ParseErrorKind::UnterminatedDisplayHint));
        }
        if self.hint.is_some() {
            return Err(self.source.error(ParseErrorKind::DanglingDisplayHint));
        }
        Ok(())
    }

    fn finish_input(&mut self) -> Result<bool> {
        if self.depth > 0 {
            return Err(self.source.error(ParseErrorKind::UnclosedList));
        }
        self.check_no_hint()?;
        Ok(false)
    }
}

impl<R: Read> StreamingParser for AdvancedStreamingParser<R> {
    fn parse(&mut self) -> Result<()> {
        loop {
            let keep_going = match self.state {
                State::ConsumeWhitespace => self.consume_whitespace()?,
                State::StartingSymbolOrVerbatim => self.consume_starting_symbol_or_verbatim()?,
                State::ConsumeSymbol => self.consume_symbol()?,
                State::ConsumeQuotedString => self.consume_quoted_string()?,
                State::ConsumeHex => self.consume_hex()?,
                State::ConsumeBase64 => self.consume_base64()?,
            };
            if !keep_going {
                break;
            }
        }

        tracing::debug!(bytes = self.source.position(), "advanced parse finished");
        Ok(())
    }

    fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }
}

/// Parse a single expression in the advanced encoding from a reader.
///
/// Returns `None` when the input holds no expression at all.
pub fn from_reader<R: Read>(reader: R) -> Result<Option<Expression>> {
    parse_tree(AdvancedStreamingParser::new(reader))
}

/// Parse a single expression in the advanced encoding from a string.
pub fn from_str(source: &str) -> Result<Option<Expression>> {
    from_reader(source.as_bytes())
}
