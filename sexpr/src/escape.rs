use logos::Logos;

use crate::atom::Atom;

/// Lexer token for an escape sequence inside a quoted string.
#[derive(Debug, Clone, Logos)]
enum EscapedToken {
    #[token(r#"\b"#, |_| 0x08u8)]
    #[token(r#"\t"#, |_| b'\t')]
    #[token(r#"\v"#, |_| 0x0bu8)]
    #[token(r#"\n"#, |_| b'\n')]
    #[token(r#"\r"#, |_| b'\r')]
    #[token(r#"\""#, |_| b'"')]
    #[token(r#"\'"#, |_| b'\'')]
    #[token(r#"\\"#, |_| b'\\')]
    Escaped(u8),

    #[regex(r#"\\[0-7][0-7][0-7]"#, |lex| parse_octal(lex.slice()))]
    Octal(u8),

    #[regex(r#"\\x[0-9a-fA-F][0-9a-fA-F]"#, |lex| parse_hex(lex.slice()))]
    Hex(u8),

    #[regex(r#"\\(\r\n?|\n\r?)"#)]
    Continuation,

    #[regex(r#"[^\\]"#)]
    Literal,
}

/// Parses an octal escape of the form `\NNN`, rejecting values above `\377`.
fn parse_octal(str: &str) -> Option<u8> {
    let digits = str.get(1..)?;
    u8::from_str_radix(digits, 8).ok()
}

/// Parses a hex escape of the form `\xHH`.
fn parse_hex(str: &str) -> Option<u8> {
    let digits = str.get(2..)?;
    u8::from_str_radix(digits, 16).ok()
}

/// Replaces escape sequences in the body of a quoted string with the bytes
/// they stand for. Line continuations produce no output.
pub fn unescape(str: &str) -> Option<Vec<u8>> {
    let mut lexer = EscapedToken::lexer(str);
    let mut output = Vec::with_capacity(str.len());

    while let Some(token) = lexer.next() {
        let token = token.ok()?;

        match token {
            EscapedToken::Escaped(b) | EscapedToken::Octal(b) | EscapedToken::Hex(b) => {
                output.push(b)
            }
            EscapedToken::Continuation => {}
            EscapedToken::Literal => output.extend_from_slice(lexer.slice().as_bytes()),
        }
    }

    Some(output)
}

/// Whether `b` may appear unescaped inside a quoted string.
#[inline]
pub fn is_quoted_char(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\r' | b' ' | b'!' | b'#'..=b'[' | b']'..=b'~')
}

/// Writes `bytes` as a quoted string. Only `\` needs escaping since quoted
/// atoms never contain `"` or control bytes.
pub fn escape_quoted(bytes: &[u8], output: &mut Vec<u8>) {
    output.reserve(bytes.len() + 2);
    output.push(b'"');

    for &b in bytes {
        if b == b'\\' {
            output.extend_from_slice(br#"\\"#);
        } else {
            output.push(b);
        }
    }

    output.push(b'"');
}

/// Appends the advanced encoding of `atom`, without its display hint.
///
/// Symbols are preferred, then quoted strings, then hex for atoms of at most
/// eight bytes and base64 for anything longer.
pub fn encode_atom(atom: &Atom, output: &mut Vec<u8>) {
    if atom.can_be_symbol() {
        output.extend_from_slice(atom.as_bytes());
    } else if atom.can_be_quoted_string() {
        escape_quoted(atom.as_bytes(), output);
    } else if atom.len() <= 8 {
        output.push(b'#');
        output.extend_from_slice(atom.to_hex().as_bytes());
        output.push(b'#');
    } else {
        output.push(b'|');
        output.extend_from_slice(atom.to_base64().as_bytes());
        output.push(b'|');
    }
}

#[cfg(test)]
mod test {
    use super::{encode_atom, unescape};
    use crate::atom::Atom;
    use rstest::rstest;

    #[rstest]
    #[case(Atom::from("string"), "string")]
    #[case(Atom::from("42"), "42")]
    #[case(Atom::from(""), r#""""#)]
    #[case(Atom::from("hello world"), r#""hello world""#)]
    #[case(Atom::from(r"a\b"), r#""a\\b""#)]
    #[case(Atom::new(vec![0x00, 0x01, 0x02]), "#000102#")]
    #[case(Atom::new(vec![0xff; 8]), "#ffffffffffffffff#")]
    #[case(Atom::new(vec![0xff; 9]), "|////////////|")]
    #[case(Atom::from("line\nbrk"), "#6c696e650a62726b#")]
    fn test_encode_atom(#[case] atom: Atom, #[case] expected: &str) {
        let mut output = Vec::new();
        encode_atom(&atom, &mut output);
        assert_eq!(expected.as_bytes(), output.as_slice());
    }

    #[rstest]
    #[case(r#"\""#, b"\"")]
    #[case(r"\061\062\063", b"123")]
    #[case(r"\x61dvanced", b"advanced")]
    #[case(r"\b\t\v\n\r\'\\", b"\x08\t\x0b\n\r'\\")]
    #[case("in \\\nadvanced", b"in advanced")]
    #[case("in \\\r\nadvanced", b"in advanced")]
    #[case("in \\\n\radvanced", b"in advanced")]
    #[case("in \\\rx", b"in x")]
    #[case(r"\377", &[0xff])]
    fn test_unescape(#[case] escaped: &str, #[case] expected: &[u8]) {
        assert_eq!(expected, unescape(escaped).unwrap().as_slice());
    }

    #[rstest]
    #[case(r"\q")]
    #[case(r"\08")]
    #[case(r"\400")]
    #[case(r"\x4")]
    #[case(r"\xzz")]
    #[case("trailing\\")]
    fn test_unescape_invalid(#[case] escaped: &str) {
        assert_eq!(None, unescape(escaped));
    }

    #[test]
    fn test_all_octal_escapes() {
        for value in 0..=255u8 {
            let escaped = format!("\\{:03o}", value);
            assert_eq!(Some(vec![value]), unescape(&escaped));
        }
    }
}
