//! S-expressions as a binary-safe data format.
//!
//! # Encodings
//!
//! Expressions are either **atoms**, arbitrary byte strings that may carry a
//! display hint, or **lists** of expressions. Two encodings are supported:
//!
//! - The **canonical** encoding writes every atom as `<len>:<bytes>` and
//!   delimits lists with `(` and `)`. A display hint is written in front of
//!   its atom as `[<len>:<bytes>]`. There is exactly one canonical encoding of
//!   any expression, which makes it suitable for hashing and signing.
//!
//! - The **advanced** encoding is meant to be read by people. Atoms may be
//!   written as bare alphanumeric symbols, quoted strings with C-style escapes
//!   (`\n`, `\x41`, `\101`, ...), `#hex#` or `|base64|`, as well as in the
//!   verbatim canonical form. Tokens are separated by whitespace and display
//!   hints use any atom form inside `[` and `]`.
//!
//! ```text
//! (this 2:is #61# |c2FtcGxl| "s-expression")
//! ```
//!
//! # Parsing and writing
//!
//! The [`parser`] module provides streaming parsers that report list and atom
//! events to callbacks; [`builder::TreeBuilder`] turns those events into an
//! [`Expression`]. The [`writer`] module goes the other way. The [`canonical`]
//! and [`advanced`] modules bundle both directions for each encoding.

pub mod atom;
pub(crate) mod buffer;
pub mod builder;
pub(crate) mod escape;
pub mod parser;
pub mod primitives;
pub mod value;
pub mod writer;

pub use atom::{Atom, AtomError, DisplayHint};
pub use parser::{ParseError, ParseErrorKind, ParserCallback, StreamingParser};
pub use primitives::{ByteOrder, Primitive};
pub use value::{Expression, ExpressionList};
pub use writer::{to_string_pretty, WriteError, Writer};

/// Reading and writing the canonical encoding.
pub mod canonical {
    pub use crate::parser::canonical::{from_reader, from_slice, CanonicalStreamingParser};
    pub use crate::writer::canonical::{to_vec, CanonicalWriter};
}

/// Reading and writing the advanced encoding.
pub mod advanced {
    pub use crate::parser::advanced::{from_reader, from_str, AdvancedStreamingParser};
    pub use crate::writer::advanced::{to_string, AdvancedWriter, AdvancedWriterBuilder};
}

#[cfg(test)]
mod test {
    use crate::{advanced, canonical, to_string_pretty, Expression};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn canonical_write_then_parse(expr: Expression) {
            let bytes = canonical::to_vec(&expr);
            let parsed = canonical::from_slice(&bytes).unwrap();
            prop_assert_eq!(Some(expr), parsed);
        }

        #[test]
        fn advanced_write_then_parse(expr: Expression) {
            let text = advanced::to_string(&expr);
            let parsed = advanced::from_str(&text).unwrap();
            prop_assert_eq!(Some(expr), parsed);
        }

        #[test]
        fn wrapped_write_then_parse(expr: Expression, line_length in 1..40usize, indent in 0..4usize) {
            use crate::Writer as _;

            let mut writer = advanced::AdvancedWriterBuilder::new()
                .line_length(line_length)
                .indent(indent)
                .build(Vec::new());
            writer.write_expression(&expr).unwrap();
            let parsed = advanced::from_reader(writer.into_inner().as_slice()).unwrap();
            prop_assert_eq!(Some(expr), parsed);
        }

        #[test]
        fn pretty_print_then_parse(expr: Expression, width in 0..120usize) {
            let text = to_string_pretty(&expr, width);
            let parsed = advanced::from_str(&text).unwrap();
            prop_assert_eq!(Some(expr), parsed);
        }

        #[test]
        fn advanced_and_canonical_agree(expr: Expression) {
            let text = advanced::to_string(&expr);
            let reparsed = advanced::from_str(&text).unwrap().unwrap();
            let bytes = canonical::to_vec(&reparsed);
            prop_assert_eq!(bytes, canonical::to_vec(&expr));
        }
    }

    #[test]
    fn test_canonical_accepted_by_advanced_parser() {
        let bytes = b"((5:value3:foo)(4:hash3:abc)[4:hint]4:atom)";
        let from_canonical = canonical::from_slice(bytes).unwrap();
        let from_advanced = advanced::from_reader(&bytes[..]).unwrap();
        assert_eq!(from_canonical, from_advanced);
    }
}
