//! Assembles parser events into an [`Expression`] tree.
use crate::atom::Atom;
use crate::parser::{ParseError, ParseErrorKind, ParserCallback, Result, StreamingParser};
use crate::value::{Expression, ExpressionList};
use std::cell::RefCell;
use std::rc::Rc;

/// Builds a single expression out of a sequence of list and atom events.
///
/// Open lists are kept on a stack; closing a list attaches it to its parent,
/// or makes it the root when no parent remains. At most one root is accepted.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<ExpressionList>,
    root: Option<Expression>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_list(&mut self) -> Result<()> {
        self.check_single_root()?;
        self.stack.push(ExpressionList::new());
        Ok(())
    }

    pub fn end_list(&mut self) -> Result<()> {
        let list = self
            .stack
            .pop()
            .ok_or_else(|| ParseError::new(ParseErrorKind::ExtraneousEndList))?;
        self.attach(Expression::List(list));
        Ok(())
    }

    pub fn atom(&mut self, atom: Atom) -> Result<()> {
        self.check_single_root()?;
        self.attach(Expression::Atom(atom));
        Ok(())
    }

    /// Number of lists currently open.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The finished expression, or `None` if no event was ever received.
    ///
    /// Fails if a list is still open.
    pub fn build(self) -> Result<Option<Expression>> {
        if !self.stack.is_empty() {
            return Err(ParseErrorKind::UnclosedList.into());
        }
        Ok(self.root)
    }

    fn check_single_root(&self) -> Result<()> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ParseErrorKind::MultipleRoots.into());
        }
        Ok(())
    }

    fn attach(&mut self, expression: Expression) {
        match self.stack.last_mut() {
            Some(parent) => parent.push(expression),
            None => self.root = Some(expression),
        }
    }
}

impl ParserCallback for TreeBuilder {
    fn begin_list(&mut self) -> Result<()> {
        TreeBuilder::begin_list(self)
    }

    fn end_list(&mut self) -> Result<()> {
        TreeBuilder::end_list(self)
    }

    fn on_atom(&mut self, atom: &[u8], display_hint: Option<&[u8]>) -> Result<()> {
        self.atom(Atom::from_parts(atom.to_vec(), display_hint.map(<[u8]>::to_vec)))
    }
}

/// Runs `parser` to completion and returns the expression it describes.
pub fn parse_tree<P: StreamingParser>(mut parser: P) -> Result<Option<Expression>> {
    let builder = Rc::new(RefCell::new(TreeBuilder::new()));
    parser.add_callback(builder.clone());
    parser.parse()?;

    builder.replace(TreeBuilder::new()).build()
}

#[cfg(test)]
mod test {
    use super::TreeBuilder;
    use crate::atom::Atom;
    use crate::parser::ParseErrorKind;
    use crate::value::{Expression, ExpressionList};

    #[test]
    fn test_nested_lists() {
        let mut builder = TreeBuilder::new();
        builder.begin_list().unwrap();
        builder.atom(Atom::from("a")).unwrap();
        builder.begin_list().unwrap();
        assert_eq!(2, builder.depth());
        builder.atom(Atom::from("b")).unwrap();
        builder.end_list().unwrap();
        builder.begin_list().unwrap();
        builder.end_list().unwrap();
        builder.end_list().unwrap();

        let expected: ExpressionList = [
            Expression::from("a"),
            ExpressionList::from_iter(["b"]).into(),
            ExpressionList::new().into(),
        ]
        .into_iter()
        .collect();
        assert_eq!(Some(Expression::List(expected)), builder.build().unwrap());
    }

    #[test]
    fn test_single_atom() {
        let mut builder = TreeBuilder::new();
        builder.atom(Atom::from("lonely")).unwrap();
        assert_eq!(Some(Expression::from("lonely")), builder.build().unwrap());
    }

    #[test]
    fn test_empty() {
        assert_eq!(None, TreeBuilder::new().build().unwrap());
    }

    #[test]
    fn test_multiple_roots() {
        let mut builder = TreeBuilder::new();
        builder.atom(Atom::from("a")).unwrap();
        let err = builder.atom(Atom::from("b")).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MultipleRoots));

        let mut builder = TreeBuilder::new();
        builder.begin_list().unwrap();
        builder.end_list().unwrap();
        let err = builder.begin_list().unwrap_err();
        assert_eq!("found multiple root values", err.to_string());
    }

    #[test]
    fn test_extraneous_end_list() {
        let mut builder = TreeBuilder::new();
        let err = builder.end_list().unwrap_err();
        assert_eq!("extraneous end list", err.to_string());
    }

    #[test]
    fn test_unclosed() {
        let mut builder = TreeBuilder::new();
        builder.begin_list().unwrap();
        let err = builder.build().unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::UnclosedList));
    }
}
