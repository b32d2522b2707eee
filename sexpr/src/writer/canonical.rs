use super::{check_atom, Result, RootGuard, Writer};
use crate::atom::Atom;
use crate::value::Expression;
use std::io::Write;

/// Writer for the canonical encoding.
///
/// Output is unique for a given expression: no whitespace is emitted and
/// every atom is written as `<len>:<bytes>`.
#[derive(Debug)]
pub struct CanonicalWriter<W> {
    sink: W,
    root: RootGuard,
}

impl<W: Write> CanonicalWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            root: RootGuard::default(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

fn push_verbatim(bytes: &[u8], output: &mut Vec<u8>) {
    output.extend_from_slice(bytes.len().to_string().as_bytes());
    output.push(b':');
    output.extend_from_slice(bytes);
}

impl<W: Write> Writer for CanonicalWriter<W> {
    fn write_atom(&mut self, atom: &Atom) -> Result<usize> {
        check_atom(atom)?;
        self.root.atom()?;

        let hint = atom.display_hint().map(|hint| hint.atom().as_bytes());
        let mut output = Vec::with_capacity(atom.len() + hint.map_or(0, <[u8]>::len) + 24);
        if let Some(hint) = hint {
            output.push(b'[');
            push_verbatim(hint, &mut output);
            output.push(b']');
        }
        push_verbatim(atom.as_bytes(), &mut output);

        self.sink.write_all(&output)?;
        Ok(output.len())
    }

    fn begin_list(&mut self) -> Result<usize> {
        self.root.begin_list()?;
        self.sink.write_all(b"(")?;
        Ok(1)
    }

    fn end_list(&mut self) -> Result<usize> {
        self.root.end_list()?;
        self.sink.write_all(b")")?;
        Ok(1)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.sink.flush()?)
    }
}

/// Encode an expression in the canonical encoding.
pub fn to_vec(expression: &Expression) -> Vec<u8> {
    let mut writer = CanonicalWriter::new(Vec::new());
    // A fresh writer over a vector accepts any single expression.
    let _ = writer.write_expression(expression);
    writer.into_inner()
}

#[cfg(test)]
mod test {
    use super::{to_vec, CanonicalWriter};
    use crate::atom::Atom;
    use crate::parser::canonical::from_slice;
    use crate::value::{Expression, ExpressionList};
    use crate::writer::{WriteError, Writer};
    use rstest::rstest;

    #[rstest]
    #[case(Atom::from("abc"), b"3:abc")]
    #[case(Atom::new(Vec::new()), b"0:")]
    #[case(Atom::from("hello world"), b"11:hello world")]
    #[case(Atom::from("atom").with_hint("hint"), b"[4:hint]4:atom")]
    #[case(Atom::new(vec![0, 255]).with_hint(""), b"[0:]2:\x00\xff")]
    fn test_atom(#[case] atom: Atom, #[case] expected: &[u8]) {
        let mut writer = CanonicalWriter::new(Vec::new());
        assert_eq!(expected.len(), writer.write_atom(&atom).unwrap());
        assert_eq!(expected, writer.into_inner().as_slice());
    }

    #[test]
    fn test_nested_lists() {
        let expr: Expression = ExpressionList::from_iter([
            ExpressionList::from_iter(["value", "foo"]),
            ExpressionList::from_iter(["hash", "0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33"]),
        ])
        .into();
        assert_eq!(
            b"((5:value3:foo)(4:hash40:0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33))".as_slice(),
            to_vec(&expr).as_slice()
        );
    }

    #[test]
    fn test_hint_bytes_preserved() {
        let input = b"([4:hint]4:atom5:atom2)";
        let expr = from_slice(input).unwrap().unwrap();
        assert_eq!(input.as_slice(), to_vec(&expr).as_slice());
    }

    #[test]
    fn test_manual_writes() {
        let mut writer = CanonicalWriter::new(Vec::new());
        let mut written = writer.begin_list().unwrap();
        written += writer.write_atom(&Atom::from("a")).unwrap();
        written += writer.begin_list().unwrap();
        written += writer.end_list().unwrap();
        written += writer.end_list().unwrap();
        writer.flush().unwrap();

        assert_eq!(b"(1:a())".as_slice(), writer.get_ref().as_slice());
        assert_eq!(7, written);
    }

    #[test]
    fn test_single_root() {
        let mut writer = CanonicalWriter::new(Vec::new());
        writer.write_atom(&Atom::from("a")).unwrap();
        assert!(matches!(
            writer.write_atom(&Atom::from("b")),
            Err(WriteError::RootAtomWritten)
        ));

        let mut writer = CanonicalWriter::new(Vec::new());
        writer.write_list(&ExpressionList::new()).unwrap();
        assert!(matches!(
            writer.write_atom(&Atom::from("b")),
            Err(WriteError::RootComplete)
        ));
        assert!(matches!(writer.end_list(), Err(WriteError::NoOpenList)));
        assert_eq!(b"()".as_slice(), writer.into_inner().as_slice());
    }
}
