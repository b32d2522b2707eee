use super::{check_atom, Result, RootGuard, Writer};
use crate::atom::Atom;
use crate::escape::encode_atom;
use crate::value::Expression;
use std::io::Write;

/// The kind of the last token written, which decides the separator in front
/// of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastWritten {
    Nothing,
    BeginList,
    EndList,
    Atom,
}

/// Configuration for an [`AdvancedWriter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvancedWriterBuilder {
    line_length: Option<usize>,
    indent: usize,
}

impl AdvancedWriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap lines that would otherwise grow past `line_length` columns.
    ///
    /// A value of zero leaves lines unconstrained.
    pub fn line_length(mut self, line_length: usize) -> Self {
        self.line_length = (line_length > 0).then_some(line_length);
        self
    }

    /// Number of spaces per nesting level on wrapped lines.
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn build<W: Write>(self, sink: W) -> AdvancedWriter<W> {
        AdvancedWriter {
            sink,
            root: RootGuard::default(),
            line_length: self.line_length,
            indent: self.indent,
            last: LastWritten::Nothing,
            column: 0,
        }
    }
}

/// Writer for the advanced encoding.
///
/// Each atom is written in the most readable form its bytes allow: a bare
/// symbol, a quoted string, `#hex#` for short binary data and `|base64|`
/// otherwise. Tokens are separated by single spaces, or by a line break when
/// a maximum line length is configured and the token would not fit.
#[derive(Debug)]
pub struct AdvancedWriter<W> {
    sink: W,
    root: RootGuard,
    line_length: Option<usize>,
    indent: usize,
    last: LastWritten,
    column: usize,
}

impl<W: Write> AdvancedWriter<W> {
    /// Creates a writer without line length limit or indentation.
    pub fn new(sink: W) -> Self {
        AdvancedWriterBuilder::new().build(sink)
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Writes `token` at nesting `depth`, preceded by the separator it needs.
    fn write_token(&mut self, token: &[u8], depth: usize) -> Result<usize> {
        let mut written = 0;

        if matches!(self.last, LastWritten::Atom | LastWritten::EndList) {
            let wrap = self
                .line_length
                .is_some_and(|max| self.column + 1 + token.len() > max);

            if wrap {
                let indent = self.indent * depth;
                tracing::trace!(column = self.column, indent, "wrapping line");
                self.sink.write_all(b"\n")?;
                self.sink.write_all(&b" ".repeat(indent))?;
                written += 1 + indent;
                self.column = indent;
            } else {
                self.sink.write_all(b" ")?;
                written += 1;
                self.column += 1;
            }
        }

        self.sink.write_all(token)?;
        self.column += token.len();
        Ok(written + token.len())
    }
}

impl<W: Write> Writer for AdvancedWriter<W> {
    fn write_atom(&mut self, atom: &Atom) -> Result<usize> {
        check_atom(atom)?;
        self.root.atom()?;

        let mut token = Vec::with_capacity(atom.len() + 2);
        if let Some(hint) = atom.display_hint() {
            token.push(b'[');
            encode_atom(hint.atom(), &mut token);
            token.push(b']');
        }
        encode_atom(atom, &mut token);

        let written = self.write_token(&token, self.root.depth())?;
        self.last = LastWritten::Atom;
        Ok(written)
    }

    fn begin_list(&mut self) -> Result<usize> {
        let depth = self.root.depth();
        self.root.begin_list()?;
        let written = self.write_token(b"(", depth)?;
        self.last = LastWritten::BeginList;
        Ok(written)
    }

    fn end_list(&mut self) -> Result<usize> {
        self.root.end_list()?;
        self.sink.write_all(b")")?;
        self.column += 1;
        self.last = LastWritten::EndList;
        Ok(1)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.sink.flush()?)
    }
}

/// Encode an expression in the advanced encoding on a single line.
pub fn to_string(expression: &Expression) -> String {
    let mut writer = AdvancedWriter::new(Vec::new());
    // A fresh writer over a vector accepts any single expression.
    let _ = writer.write_expression(expression);
    // The advanced encoding only ever produces ASCII.
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

#[cfg(test)]
mod test {
    use super::{to_string, AdvancedWriter, AdvancedWriterBuilder};
    use crate::atom::Atom;
    use crate::parser::advanced::from_str;
    use crate::value::{Expression, ExpressionList};
    use crate::writer::{WriteError, Writer};
    use rstest::rstest;

    fn write_with(expr: &Expression, line_length: usize, indent: usize) -> String {
        let mut writer = AdvancedWriterBuilder::new()
            .line_length(line_length)
            .indent(indent)
            .build(Vec::new());
        let written = writer.write_expression(expr).unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(output.len(), written);
        output
    }

    fn list(source: &str) -> Expression {
        from_str(source).unwrap().unwrap()
    }

    #[rstest]
    #[case(Atom::from("abc123"), "abc123")]
    #[case(Atom::from("42"), "42")]
    #[case(Atom::from("hello world"), "\"hello world\"")]
    #[case(Atom::from("a\\b"), r#""a\\b""#)]
    #[case(Atom::new(Vec::new()), "\"\"")]
    #[case(Atom::from("say \"hi\""), "#7361792022686922#")]
    #[case(Atom::from("\"quoted\" text"), "|InF1b3RlZCIgdGV4dA==|")]
    #[case(Atom::new(vec![0x00, 0xff]), "#00ff#")]
    #[case(Atom::new(vec![1; 8]), "#0101010101010101#")]
    #[case(Atom::new((0..10).collect::<Vec<u8>>()), "|AAECAwQFBgcICQ==|")]
    #[case(Atom::from("atom").with_hint("hint"), "[hint]atom")]
    #[case(Atom::from("hi there").with_hint("text/plain"), "[\"text/plain\"]\"hi there\"")]
    #[case(Atom::new(vec![0xca, 0xfe]).with_hint(vec![0x01]), "[#01#]#cafe#")]
    fn test_atom_encoding(#[case] atom: Atom, #[case] expected: &str) {
        assert_eq!(expected, to_string(&atom.into()));
    }

    #[test]
    fn test_single_line() {
        let expr = list("(this 2:is #61# |c2FtcGxl| (nested ()) \"two words\")");
        assert_eq!(
            "(this is a sample (nested ()) \"two words\")",
            to_string(&expr)
        );
        assert_eq!(expr.to_string(), to_string(&expr));
    }

    #[test]
    fn test_builder_defaults_match_new() {
        let expr = list("(aaaa bbbb cccc dddd eeee)");
        let mut built = AdvancedWriterBuilder::default().build(Vec::new());
        let mut plain = AdvancedWriter::new(Vec::new());
        built.write_expression(&expr).unwrap();
        plain.write_expression(&expr).unwrap();
        assert_eq!(plain.into_inner(), built.into_inner());
    }

    #[test]
    fn test_line_wrapping() {
        let expr = list("(aaaa bbbb cccc)");
        assert_eq!("(aaaa bbbb\n  cccc)", write_with(&expr, 10, 2));
        assert_eq!("(aaaa bbbb\ncccc)", write_with(&expr, 10, 0));
        assert_eq!("(aaaa bbbb cccc)", write_with(&expr, 0, 2));
    }

    #[test]
    fn test_wrapped_indent_follows_depth() {
        let expr = list("(a (bb cc))");
        assert_eq!("(a (bb\n    cc))", write_with(&expr, 8, 2));
    }

    #[test]
    fn test_wrapping_before_open_paren() {
        let expr = list("(abcdef (x))");
        assert_eq!("(abcdef\n (x))", write_with(&expr, 8, 1));
    }

    #[test]
    fn test_wrapped_output_parses_back() {
        let expr = list("(define (square x) (times x x) \"doc string here\" #00#)");
        let wrapped = write_with(&expr, 12, 3);
        assert!(wrapped.contains('\n'));
        assert_eq!(expr, list(&wrapped));
    }

    #[test]
    fn test_manual_writes() {
        let mut writer = AdvancedWriter::new(Vec::new());
        writer.begin_list().unwrap();
        writer.write_atom(&Atom::from("a")).unwrap();
        writer.write_list(&ExpressionList::from_iter(["b", "c"])).unwrap();
        writer.write_atom(&Atom::from("d")).unwrap();
        writer.end_list().unwrap();
        writer.flush().unwrap();
        assert_eq!(b"(a (b c) d)".as_slice(), writer.get_ref().as_slice());
    }

    #[test]
    fn test_single_root() {
        let mut writer = AdvancedWriter::new(Vec::new());
        writer.write_atom(&Atom::from("a")).unwrap();
        assert!(matches!(
            writer.begin_list(),
            Err(WriteError::RootAtomWritten)
        ));

        let mut writer = AdvancedWriter::new(Vec::new());
        writer.begin_list().unwrap();
        writer.end_list().unwrap();
        assert!(matches!(
            writer.write_atom(&Atom::from("a")),
            Err(WriteError::RootComplete)
        ));
        assert_eq!(b"()".as_slice(), writer.into_inner().as_slice());
    }
}
