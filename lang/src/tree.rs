// lang/src/tree.rs
use crate::grammar::Rule;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// A parse-tree node: a token leaf or a rule with ordered children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxNode {
    Token(Token),
    Node(Node),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub rule: Rule,
    pub children: Vec<SyntaxNode>,
    pub span: Span,
}

impl Node {
    pub fn new(rule: Rule, children: Vec<SyntaxNode>, span: Span) -> Self {
        Self {
            rule,
            children,
            span,
        }
    }
}

impl SyntaxNode {
    pub fn node(rule: Rule, children: Vec<SyntaxNode>, span: Span) -> Self {
        SyntaxNode::Node(Node::new(rule, children, span))
    }

    pub fn span(&self) -> Span {
        match self {
            SyntaxNode::Token(token) => token.span,
            SyntaxNode::Node(node) => node.span,
        }
    }

    pub fn rule(&self) -> Option<Rule> {
        match self {
            SyntaxNode::Token(_) => None,
            SyntaxNode::Node(node) => Some(node.rule),
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            SyntaxNode::Token(token) => Some(token),
            SyntaxNode::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            SyntaxNode::Token(_) => None,
            SyntaxNode::Node(node) => Some(node),
        }
    }

    pub fn is_token(&self, kind: TokenKind) -> bool {
        matches!(self, SyntaxNode::Token(token) if token.kind == kind)
    }

    pub fn is_rule(&self, rule: Rule) -> bool {
        matches!(self, SyntaxNode::Node(node) if node.rule == rule)
    }

    /// Name for diagnostics: the rule name or the token category.
    pub fn label(&self) -> &'static str {
        match self {
            SyntaxNode::Token(token) => token.kind.category(),
            SyntaxNode::Node(node) => node.rule.name(),
        }
    }

    /// Nesting depth of rule nodes below and including this one.
    pub fn depth(&self) -> usize {
        match self {
            SyntaxNode::Token(_) => 0,
            SyntaxNode::Node(node) => {
                1 + node.children.iter().map(SyntaxNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Indented outline of the tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, level: usize) {
        out.push_str(&"  ".repeat(level));
        match self {
            SyntaxNode::Token(token) => {
                out.push_str(token.kind.category());
                out.push(' ');
                out.push_str(&format!("{:?}", token.text));
                out.push('\n');
            }
            SyntaxNode::Node(node) => {
                out.push_str(node.rule.name());
                out.push('\n');
                for child in &node.children {
                    child.dump_into(out, level + 1);
                }
            }
        }
    }
}

impl From<Token> for SyntaxNode {
    fn from(token: Token) -> Self {
        SyntaxNode::Token(token)
    }
}

impl From<Node> for SyntaxNode {
    fn from(node: Node) -> Self {
        SyntaxNode::Node(node)
    }
}
