// lang/src/lib.rs
// Castella language core
//
// - Lexer: Spanish-keyword tokenization
// - Parser: recursive descent over the precedence tiers
// - Transformer: parse tree -> Python lines
// - Finalizer: preamble and trailing newline

pub mod error;
pub mod finalizer;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod transformer;
pub mod tree;

use tracing::debug;

pub use error::{
    Diagnostic, StructuralError, StructuralKind, SyntaxError, SyntaxReason, TranslationError,
};
pub use finalizer::{finalize, PreambleMode, EMPTY_SOURCE_PLACEHOLDER};
pub use grammar::{build_grammar, Grammar, Rule};
pub use lexer::Lexer;
pub use parser::{Parser, DEFAULT_MAX_NESTING};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use transformer::Transformer;
pub use tree::{Node, SyntaxNode};

/// Per-call translation settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslateOptions {
    pub preamble: PreambleMode,
    pub max_nesting: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            preamble: PreambleMode::Full,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

/// Source -> Python with default options.
pub fn translate(grammar: &Grammar, source: &str) -> Result<String, TranslationError> {
    translate_with(grammar, source, &TranslateOptions::default())
}

pub fn translate_with(
    grammar: &Grammar,
    source: &str,
    options: &TranslateOptions,
) -> Result<String, TranslationError> {
    if finalizer::is_blank(source) {
        debug!("blank source, emitting placeholder");
        return Ok(EMPTY_SOURCE_PLACEHOLDER.to_string());
    }
    let tree = parse_with(grammar, source, options.max_nesting)?;
    let body = Transformer::new(grammar).transform_module(&tree)?;
    debug!(lines = body.len(), "module transformed");
    Ok(finalize(&body, options.preamble))
}

/// Source -> parse tree, without generating code.
pub fn parse(grammar: &Grammar, source: &str) -> Result<SyntaxNode, SyntaxError> {
    parse_with(grammar, source, DEFAULT_MAX_NESTING)
}

fn parse_with(grammar: &Grammar, source: &str, max_nesting: usize) -> Result<SyntaxNode, SyntaxError> {
    let tokens = Lexer::new(grammar, source).tokenize()?;
    debug!(tokens = tokens.len(), "source tokenized");
    let tree = Parser::new(grammar, source, tokens)
        .with_max_nesting(max_nesting)
        .parse_module()?;
    debug!(depth = tree.depth(), "parse tree built");
    Ok(tree)
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn body_only() -> TranslateOptions {
        TranslateOptions {
            preamble: PreambleMode::Omit,
            ..TranslateOptions::default()
        }
    }

    #[test]
    fn whitespace_only_source_yields_placeholder() {
        let grammar = build_grammar();
        for source in ["", "   ", "\n\t\n"] {
            assert_eq!(translate(&grammar, source).unwrap(), EMPTY_SOURCE_PLACEHOLDER);
        }
    }

    #[test]
    fn default_translation_carries_preamble() {
        let grammar = build_grammar();
        let out = translate(&grammar, "imprimir(1);").unwrap();
        assert!(out.starts_with("# -*- coding: utf-8 -*-\n"));
        assert!(out.ends_with("\n\nprint(1)\n"));
    }

    #[test]
    fn options_control_preamble_and_nesting() {
        let grammar = build_grammar();
        let out = translate_with(&grammar, "x = 1;", &body_only()).unwrap();
        assert_eq!(out, "x = 1\n");

        let deep = format!("x = {}1{};", "(".repeat(20), ")".repeat(20));
        let tight = TranslateOptions {
            max_nesting: 8,
            ..body_only()
        };
        match translate_with(&grammar, &deep, &tight) {
            Err(TranslationError::Syntax(err)) => {
                assert_eq!(err.reason, SyntaxReason::NestingTooDeep { limit: 8 })
            }
            other => panic!("expected nesting error, got {other:?}"),
        }
        assert!(translate_with(&grammar, &deep, &body_only()).is_ok());
    }

    #[test]
    fn parse_exposes_the_tree() {
        let grammar = build_grammar();
        let tree = parse(&grammar, "x = 1;").unwrap();
        assert_eq!(tree.rule(), Some(Rule::Module));
    }
}
