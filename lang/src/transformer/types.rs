// lang/src/transformer/types.rs
// Type annotations. Collection names map through the grammar; everything
// else is written as it appears.

use crate::error::TranslationError;
use crate::grammar::Rule;
use crate::token::TokenKind;
use crate::tree::SyntaxNode;

use super::{expect_rule, expect_token, TransformResult, Transformer};

impl Transformer<'_> {
    pub(super) fn type_expr(&self, node: &SyntaxNode) -> TransformResult<String> {
        let inner = match node {
            SyntaxNode::Node(inner) => inner,
            SyntaxNode::Token(token) if token.kind == TokenKind::Ellipsis => {
                return Ok("...".to_string())
            }
            SyntaxNode::Token(token) => {
                return Err(TranslationError::InternalType {
                    rule: "type",
                    detail: format!("token '{}' en posición de tipo", token.kind.category()),
                })
            }
        };
        match (inner.rule, inner.children.as_slice()) {
            (Rule::TypeHint | Rule::ReturnType, [ty]) => self.type_expr(ty),
            (Rule::BasicType, [name]) => self.basic_name(name),
            (Rule::BasicType, [name, args]) => {
                Ok(format!("{}{}", self.basic_name(name)?, self.type_arguments(args)?))
            }
            (Rule::CollectionType, [name, rest @ ..]) if rest.len() <= 1 => {
                let name = &expect_token(name, TokenKind::Ident, inner.rule)?.text;
                let mapped = self.grammar.type_name(name).unwrap_or(name.as_str());
                match rest {
                    [args] => Ok(format!("{mapped}{}", self.type_arguments(args)?)),
                    _ => Ok(mapped.to_string()),
                }
            }
            (Rule::UnionType, [args]) => Ok(format!("Union{}", self.type_arguments(args)?)),
            (Rule::ForwardRef, [name]) => Ok(format!(
                "'{}'",
                expect_token(name, TokenKind::Ident, inner.rule)?.text
            )),
            (Rule::TypeList, items) => Ok(format!("[{}]", self.join_types(items)?)),
            (rule, _) => Err(TranslationError::shape(rule, "forma de tipo inesperada")),
        }
    }

    /// `[T, U]` including the brackets.
    fn type_arguments(&self, node: &SyntaxNode) -> TransformResult<String> {
        let args = expect_rule(node, Rule::TypeArguments)?;
        Ok(format!("[{}]", self.join_types(&args.children)?))
    }

    fn join_types(&self, items: &[SyntaxNode]) -> TransformResult<String> {
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            parts.push(self.type_expr(item)?);
        }
        Ok(parts.join(", "))
    }

    fn basic_name(&self, node: &SyntaxNode) -> TransformResult<String> {
        if node.is_token(TokenKind::Ninguno) {
            return Ok("None".to_string());
        }
        self.dotted_name(node)
    }

    pub(super) fn dotted_name(&self, node: &SyntaxNode) -> TransformResult<String> {
        let dotted = expect_rule(node, Rule::DottedName)?;
        let mut parts = Vec::with_capacity(dotted.children.len());
        for part in &dotted.children {
            parts.push(expect_token(part, TokenKind::Ident, dotted.rule)?.text.as_str());
        }
        Ok(parts.join("."))
    }
}
