use crate::value::Expression;
use pretty::DocAllocator as _;

type Doc<'a> = pretty::DocBuilder<'a, pretty::Arena<'a>>;

fn to_doc<'a>(arena: &'a pretty::Arena<'a>, expression: &Expression) -> Doc<'a> {
    match expression {
        Expression::Atom(atom) => arena.text(atom.to_string()),
        Expression::List(list) => {
            let items = list.iter().map(|item| to_doc(arena, item));
            let docs = arena.intersperse(items, arena.line()).nest(2).group();
            arena.text("(").append(docs).append(arena.text(")"))
        }
    }
}

/// Pretty print an expression in the advanced encoding.
///
/// Lists that fit within `width` columns stay on one line; longer ones put
/// each item on its own line, indented by two spaces per level.
pub fn to_string_pretty(expression: &Expression, width: usize) -> String {
    let arena = pretty::Arena::new();
    let doc = to_doc(&arena, expression);

    let mut string = String::new();
    let _ = doc.render_fmt(width, &mut string);
    string
}
