// lang/src/transformer/mod.rs
// Parse tree -> Python source lines. One routine per rule; bodies are indented
// by the parent that assembles them, never by the child.

mod expressions;
mod statements;
mod types;

use tracing::trace;

use crate::error::{StructuralError, StructuralKind, TranslationError};
use crate::grammar::{Grammar, Rule};
use crate::token::{Token, TokenKind};
use crate::tree::{Node, SyntaxNode};

pub const INDENT: &str = "    ";

pub type TransformResult<T> = Result<T, TranslationError>;

/// Output of one statement: a single line, or a header with its indented body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment {
    Line(String),
    Block(Vec<String>),
}

impl Fragment {
    pub fn into_lines(self) -> Vec<String> {
        match self {
            Fragment::Line(line) => vec![line],
            Fragment::Block(lines) => lines,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Block,
    ClassBody,
}

impl ScopeKind {
    fn within(self) -> &'static str {
        match self {
            ScopeKind::Module => "a nivel superior",
            ScopeKind::Block => "dentro del bloque",
            ScopeKind::ClassBody => "dentro del cuerpo de la clase",
        }
    }

    fn end(self) -> &'static str {
        match self {
            ScopeKind::Module => "del archivo",
            ScopeKind::Block => "del bloque",
            ScopeKind::ClassBody => "del cuerpo de la clase",
        }
    }
}

/// Per-body translation state. Created by the caller for each body and
/// checked when the body closes: no decorator may still be waiting.
#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    depth: usize,
    pending: Vec<String>,
}

impl Scope {
    pub fn new(kind: ScopeKind, depth: usize) -> Self {
        Self {
            kind,
            depth,
            pending: Vec::new(),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn push_decorator(&mut self, line: String) {
        self.pending.push(line);
    }

    fn take_decorators(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    /// A non-definition item arrived while decorators were waiting.
    fn reject_pending(&self, found: &str) -> TransformResult<()> {
        match self.pending.first() {
            Some(first) => Err(StructuralError::new(
                StructuralKind::OrphanDecorator,
                format!(
                    "Decoradores ({first}) sólo pueden preceder definiciones de función o clase {}. Encontrado un elemento '{found}' sin una definición asociada.",
                    self.kind.within()
                ),
                first.clone(),
            )
            .into()),
            None => Ok(()),
        }
    }

    pub fn close(self) -> TransformResult<()> {
        trace!(kind = ?self.kind, depth = self.depth, "scope closed");
        match self.pending.first() {
            Some(first) => Err(StructuralError::new(
                StructuralKind::DecoratorAtScopeEnd,
                format!(
                    "Decoradores ({first}) sin definición de función o clase que los siga al final {}.",
                    self.kind.end()
                ),
                first.clone(),
            )
            .into()),
            None => Ok(()),
        }
    }
}

pub struct Transformer<'g> {
    grammar: &'g Grammar,
}

impl<'g> Transformer<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Unindented body lines of a whole module.
    pub fn transform_module(&self, tree: &SyntaxNode) -> TransformResult<Vec<String>> {
        let module = expect_rule(tree, Rule::Module)?;
        self.items(&module.children, Scope::new(ScopeKind::Module, 0))
    }

    fn items(&self, items: &[SyntaxNode], mut scope: Scope) -> TransformResult<Vec<String>> {
        let mut lines = Vec::new();
        for item in items {
            if item.is_rule(Rule::Decorator) {
                let line = self.decorator(item)?;
                scope.push_decorator(line);
                continue;
            }
            if item.rule().is_some_and(Rule::is_definition) {
                lines.extend(scope.take_decorators());
            } else {
                scope.reject_pending(item.label())?;
            }
            lines.extend(self.statement(item, &scope)?.into_lines());
        }
        scope.close()?;
        Ok(lines)
    }

    /// Body of a compound statement, one level deeper than `parent`.
    fn body(&self, node: &SyntaxNode, kind: ScopeKind, parent: &Scope) -> TransformResult<Vec<String>> {
        let rule = match kind {
            ScopeKind::ClassBody => Rule::ClassBody,
            ScopeKind::Module | ScopeKind::Block => Rule::Block,
        };
        let block = expect_rule(node, rule)?;
        let lines = self.items(&block.children, Scope::new(kind, parent.depth + 1))?;
        Ok(indent(&lines))
    }

    fn decorator(&self, item: &SyntaxNode) -> TransformResult<String> {
        let node = expect_rule(item, Rule::Decorator)?;
        match node.children.as_slice() {
            [target] => Ok(format!("@{}", self.expr(target)?)),
            _ => Err(TranslationError::shape(Rule::Decorator, "se esperaba una expresión")),
        }
    }
}

/// Indents every non-blank line by one level; an empty result becomes `pass`.
pub fn indent(lines: &[String]) -> Vec<String> {
    let mut out: Vec<String> = lines
        .iter()
        .flat_map(|line| line.lines())
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("{INDENT}{line}"))
        .collect();
    if out.is_empty() {
        out.push(format!("{INDENT}pass"));
    }
    out
}

fn expect_rule(node: &SyntaxNode, rule: Rule) -> TransformResult<&Node> {
    match node {
        SyntaxNode::Node(inner) if inner.rule == rule => Ok(inner),
        other => Err(TranslationError::shape(
            rule,
            format!("se encontró '{}'", other.label()),
        )),
    }
}

fn expect_token(node: &SyntaxNode, kind: TokenKind, owner: Rule) -> TransformResult<&Token> {
    match node {
        SyntaxNode::Token(token) if token.kind == kind => Ok(token),
        other => Err(TranslationError::shape(
            owner,
            format!("se esperaba {} y se encontró '{}'", kind.category(), other.label()),
        )),
    }
}

/// `###text###` -> `"""text"""`
fn docstring(text: &str) -> String {
    let inner = text
        .strip_prefix("###")
        .and_then(|rest| rest.strip_suffix("###"))
        .unwrap_or(text);
    format!("\"\"\"{inner}\"\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::build_grammar;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    pub(super) fn translate_lines(source: &str) -> TransformResult<Vec<String>> {
        let grammar = build_grammar();
        let tokens = Lexer::new(&grammar, source).tokenize()?;
        let tree = Parser::new(&grammar, source, tokens).parse_module()?;
        Transformer::new(&grammar).transform_module(&tree)
    }

    pub(super) fn body(source: &str) -> String {
        translate_lines(source).unwrap().join("\n")
    }

    pub(super) fn structural(source: &str) -> StructuralError {
        match translate_lines(source) {
            Err(TranslationError::Structural(err)) => err,
            other => panic!("expected a structural error, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_becomes_pass() {
        assert_eq!(body("mientras (x) { }"), "while x:\n    pass");
    }

    #[test]
    fn nested_bodies_indent_once_per_level() {
        let out = body("si (a) { si (b) { romper; } }");
        assert_eq!(out, "if a:\n    if b:\n        break");
    }

    #[test]
    fn decorators_attach_to_the_next_definition() {
        let out = body("@dec\n@otro(1)\nfuncion f() { pasar; }");
        assert_eq!(out, "@dec\n@otro(1)\ndef f():\n    pass");
    }

    #[test]
    fn decorator_before_statement_is_rejected() {
        let err = structural("@dec\nx = 1;");
        assert_eq!(err.kind, StructuralKind::OrphanDecorator);
        assert_eq!(err.construct, "@dec");
        assert!(err.message.contains("(@dec)"));
    }

    #[test]
    fn decorator_at_end_of_file_is_rejected() {
        let err = structural("funcion f() { pasar; }\n@dec");
        assert_eq!(err.kind, StructuralKind::DecoratorAtScopeEnd);
        assert!(err.message.contains("al final del archivo"));
    }

    #[test]
    fn decorator_at_end_of_class_body_is_rejected() {
        let err = structural("clase A { @propiedad }");
        assert_eq!(err.kind, StructuralKind::DecoratorAtScopeEnd);
        assert!(err.message.ends_with("al final del cuerpo de la clase."));
    }

    #[test]
    fn decorator_before_docstring_is_rejected() {
        let err = structural("@dec\n###doc###");
        assert_eq!(err.kind, StructuralKind::OrphanDecorator);
    }

    #[test]
    fn indent_splits_and_drops_blank_lines() {
        let lines = vec!["a\n\nb".to_string(), "   ".to_string()];
        assert_eq!(indent(&lines), vec!["    a", "    b"]);
        assert_eq!(indent(&[]), vec!["    pass"]);
    }

    #[test]
    fn docstring_strips_markers() {
        assert_eq!(docstring("### hola ###"), "\"\"\" hola \"\"\"");
    }
}
