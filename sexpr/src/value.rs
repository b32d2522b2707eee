//! The expression tree: atoms and lists of expressions.
use crate::atom::Atom;
use delegate::delegate;
use proptest::arbitrary::Arbitrary;
use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};

/// An s-expression represented as a recursive enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Atom(Atom),
    List(ExpressionList),
}

impl Expression {
    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Expression::Atom(atom) => Some(atom),
            Expression::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&ExpressionList> {
        match self {
            Expression::List(list) => Some(list),
            Expression::Atom(_) => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ExpressionList> {
        match self {
            Expression::List(list) => Some(list),
            Expression::Atom(_) => None,
        }
    }

    #[inline]
    pub fn is_atom(&self) -> bool {
        matches!(self, Expression::Atom(_))
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, Expression::List(_))
    }
}

impl From<Atom> for Expression {
    fn from(value: Atom) -> Self {
        Self::Atom(value)
    }
}

impl From<ExpressionList> for Expression {
    fn from(value: ExpressionList) -> Self {
        Self::List(value)
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::Atom(value.into())
    }
}

impl From<Vec<u8>> for Expression {
    fn from(value: Vec<u8>) -> Self {
        Self::Atom(value.into())
    }
}

/// Renders the expression on a single line in the advanced encoding.
impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Atom(atom) => atom.fmt(f),
            Expression::List(list) => list.fmt(f),
        }
    }
}

/// An ordered sequence of expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ExpressionList {
    items: Vec<Expression>,
}

impl ExpressionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Appends an expression to the end of the list.
    pub fn push(&mut self, expression: impl Into<Expression>) {
        self.items.push(expression.into());
    }

    /// Inserts an expression at `index`, shifting later items to the right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, expression: impl Into<Expression>) {
        self.items.insert(index, expression.into());
    }

    /// Replaces the expression at `index`, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, expression: impl Into<Expression>) -> Expression {
        std::mem::replace(&mut self.items[index], expression.into())
    }

    delegate! {
        to self.items {
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
            pub fn clear(&mut self);
            pub fn get(&self, index: usize) -> Option<&Expression>;
            pub fn get_mut(&mut self, index: usize) -> Option<&mut Expression>;
            pub fn first(&self) -> Option<&Expression>;
            pub fn last(&self) -> Option<&Expression>;
            /// Removes and returns the expression at `index`.
            pub fn remove(&mut self, index: usize) -> Expression;
            pub fn iter(&self) -> std::slice::Iter<'_, Expression>;
            pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Expression>;
        }
    }

    pub fn into_vec(self) -> Vec<Expression> {
        self.items
    }
}

impl Display for ExpressionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            item.fmt(f)?;
        }
        f.write_str(")")
    }
}

impl From<Vec<Expression>> for ExpressionList {
    fn from(items: Vec<Expression>) -> Self {
        Self { items }
    }
}

impl<E: Into<Expression>> FromIterator<E> for ExpressionList {
    fn from_iter<T: IntoIterator<Item = E>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<E: Into<Expression>> Extend<E> for ExpressionList {
    fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
        self.items.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for ExpressionList {
    type Item = Expression;
    type IntoIter = std::vec::IntoIter<Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExpressionList {
    type Item = &'a Expression;
    type IntoIter = std::slice::Iter<'a, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Index<usize> for ExpressionList {
    type Output = Expression;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl IndexMut<usize> for ExpressionList {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.items[index]
    }
}

impl Arbitrary for Atom {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use proptest::prelude::*;

        let bytes = proptest::prop_oneof![
            "[a-zA-Z0-9]{1,12}".prop_map(String::into_bytes),
            "[ -~]{0,24}".prop_map(String::into_bytes),
            proptest::collection::vec(any::<u8>(), 0..40),
        ];
        let hint = proptest::option::weighted(
            0.2,
            proptest::collection::vec(any::<u8>(), 0..12),
        );

        (bytes, hint)
            .prop_map(|(bytes, hint)| match hint {
                Some(hint) => Atom::new(bytes).with_hint(hint),
                None => Atom::new(bytes),
            })
            .boxed()
    }
}

impl Arbitrary for Expression {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        use proptest::prelude::*;

        let leaf = any::<Atom>().prop_map(Expression::Atom);
        leaf.prop_recursive(8, 256, 10, |inner| {
            proptest::collection::vec(inner, 0..10)
                .prop_map(|items| Expression::List(items.into()))
        })
        .boxed()
    }
}
