// lang/src/error.rs
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::grammar::Rule;

/// Characters of source shown on each side of a syntax error.
pub const CONTEXT_SPAN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("Error interno del transformador: no hay rutina de generación para la regla '{}' en contexto de {context}", .rule.name())]
    MissingRule { rule: Rule, context: &'static str },

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("Error interno del transformador: forma inesperada del nodo '{rule}': {detail}")]
    InternalType { rule: &'static str, detail: String },
}

impl TranslationError {
    pub fn code(&self) -> &'static str {
        match self {
            TranslationError::Syntax(err) => err.code(),
            TranslationError::MissingRule { .. } => "E_INTERNAL_MISSING_RULE",
            TranslationError::Structural(err) => err.code(),
            TranslationError::InternalType { .. } => "E_INTERNAL_NODE_SHAPE",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TranslationError::Syntax(_) => "syntax",
            TranslationError::MissingRule { .. } => "missing_rule",
            TranslationError::Structural(_) => "structural",
            TranslationError::InternalType { .. } => "internal_type",
        }
    }

    pub(crate) fn shape(rule: Rule, detail: impl Into<String>) -> Self {
        TranslationError::InternalType {
            rule: rule.name(),
            detail: detail.into(),
        }
    }

    /// One-line report: `CODE file:line:col message`.
    pub fn format(&self, file: &str) -> String {
        match self {
            TranslationError::Syntax(err) => format!(
                "{} {}:{}:{} {}",
                err.code(),
                file,
                err.line,
                err.col,
                err.reason
            ),
            other => format!("{} {} {}", other.code(), file, other),
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic {
            code: self.code(),
            kind: self.kind(),
            message: self.to_string(),
            line: None,
            col: None,
            token: None,
            expected: Vec::new(),
            construct: None,
        };
        match self {
            TranslationError::Syntax(err) => {
                diag.line = Some(err.line);
                diag.col = Some(err.col);
                diag.token = Some(err.text.clone());
                diag.expected = err.expected.clone();
            }
            TranslationError::Structural(err) => {
                diag.construct = Some(err.construct.clone());
            }
            TranslationError::MissingRule { .. } | TranslationError::InternalType { .. } => {}
        }
        diag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxReason {
    UnexpectedToken,
    UnexpectedChar,
    UnterminatedString,
    UnterminatedDocstring,
    MalformedNumber,
    NestingTooDeep { limit: usize },
}

impl fmt::Display for SyntaxReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxReason::UnexpectedToken => write!(f, "token inesperado"),
            SyntaxReason::UnexpectedChar => write!(f, "carácter inesperado"),
            SyntaxReason::UnterminatedString => write!(f, "cadena sin cerrar"),
            SyntaxReason::UnterminatedDocstring => write!(f, "comentario de bloque ### sin cerrar"),
            SyntaxReason::MalformedNumber => write!(f, "literal numérico mal formado"),
            SyntaxReason::NestingTooDeep { limit } => {
                write!(f, "anidamiento demasiado profundo (límite {limit})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Error de sintaxis ({reason}) en la línea {line}, columna {col}: '{text}' (tipo: {found})\n{}Contexto del error:\n{context}",
    expected_line(.expected)
)]
pub struct SyntaxError {
    pub reason: SyntaxReason,
    pub line: usize,
    pub col: usize,
    /// Category of the offending token.
    pub found: String,
    pub text: String,
    /// Sorted categories acceptable at this point.
    pub expected: Vec<String>,
    pub context: String,
}

impl SyntaxError {
    pub fn new(
        reason: SyntaxReason,
        source: &str,
        line: usize,
        col: usize,
        found: &str,
        text: &str,
    ) -> Self {
        Self {
            reason,
            line,
            col,
            found: found.to_string(),
            text: text.to_string(),
            expected: Vec::new(),
            context: context_window(source, line, col),
        }
    }

    pub fn with_expected<I, S>(mut self, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = expected.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        self.expected = names;
        self
    }

    pub fn code(&self) -> &'static str {
        match self.reason {
            SyntaxReason::UnexpectedToken => "E_SYNTAX_UNEXPECTED_TOKEN",
            SyntaxReason::UnexpectedChar => "E_LEX_UNEXPECTED_CHAR",
            SyntaxReason::UnterminatedString => "E_LEX_UNTERM_STRING",
            SyntaxReason::UnterminatedDocstring => "E_LEX_UNTERM_DOCSTRING",
            SyntaxReason::MalformedNumber => "E_LEX_BAD_NUMBER",
            SyntaxReason::NestingTooDeep { .. } => "E_SYNTAX_NESTING_LIMIT",
        }
    }
}

fn expected_line(expected: &[String]) -> String {
    if expected.is_empty() {
        String::new()
    } else {
        format!("Se esperaba uno de: {}\n", expected.join(", "))
    }
}

/// Same-line text around `line:col` (1-based, in chars) with a caret under the
/// offending column.
pub fn context_window(source: &str, line: usize, col: usize) -> String {
    let Some(text) = source.lines().nth(line.saturating_sub(1)) else {
        return "^".to_string();
    };
    let chars: Vec<char> = text.chars().collect();
    let at = col.saturating_sub(1).min(chars.len());
    let from = at.saturating_sub(CONTEXT_SPAN);
    let to = (at + CONTEXT_SPAN).min(chars.len());
    let before: String = chars[from..at].iter().collect();
    let after: String = chars[at..to].iter().collect();
    let pad = before
        .chars()
        .map(|ch| if ch == '\t' { 8 } else { 1 })
        .sum::<usize>();
    format!("{before}{after}\n{}^", " ".repeat(pad))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKind {
    OrphanDecorator,
    DecoratorAtScopeEnd,
    ConstructorSignature,
    ArgumentOrder,
    DuplicateUnpackedArgument,
    ParameterOrder,
    InvalidTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error de gramática: {message}")]
pub struct StructuralError {
    pub kind: StructuralKind,
    pub message: String,
    /// Source-level rendering of the offending construct.
    pub construct: String,
}

impl StructuralError {
    pub fn new(kind: StructuralKind, message: impl Into<String>, construct: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            construct: construct.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            StructuralKind::OrphanDecorator => "E_STRUCT_ORPHAN_DECORATOR",
            StructuralKind::DecoratorAtScopeEnd => "E_STRUCT_DECORATOR_AT_SCOPE_END",
            StructuralKind::ConstructorSignature => "E_STRUCT_CONSTRUCTOR_SELF",
            StructuralKind::ArgumentOrder => "E_STRUCT_ARGUMENT_ORDER",
            StructuralKind::DuplicateUnpackedArgument => "E_STRUCT_DUPLICATE_UNPACK",
            StructuralKind::ParameterOrder => "E_STRUCT_PARAMETER_ORDER",
            StructuralKind::InvalidTarget => "E_STRUCT_INVALID_TARGET",
        }
    }
}

/// Flat, machine-readable form of a [`TranslationError`].
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expected: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construct: Option<String>,
}

impl Diagnostic {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_marks_column() {
        let src = "let x = 1;\nsi (x ? ) {}\n";
        let ctx = context_window(src, 2, 9);
        assert_eq!(ctx, "si (x ? ) {}\n        ^");
    }

    #[test]
    fn context_is_bounded() {
        let long = format!("{}@{}", "a".repeat(80), "b".repeat(80));
        let ctx = context_window(&long, 1, 81);
        let first = ctx.lines().next().unwrap();
        assert_eq!(first.chars().count(), CONTEXT_SPAN * 2);
        assert!(first.starts_with('a') && first.contains('@'));
    }

    #[test]
    fn expected_is_sorted_and_unique() {
        let err = SyntaxError::new(SyntaxReason::UnexpectedToken, "x", 1, 1, "IDENT", "x")
            .with_expected(["SEMICOLON", "IGUAL", "COMA", "IGUAL"]);
        assert_eq!(err.expected, vec!["COMA", "IGUAL", "SEMICOLON"]);
    }

    #[test]
    fn syntax_message_lists_expected_then_context() {
        let err = SyntaxError::new(SyntaxReason::UnexpectedToken, "x y", 1, 3, "IDENT", "y")
            .with_expected(["IGUAL", "COMA"]);
        let message = err.to_string();
        let lines: Vec<&str> = message.lines().collect();
        assert!(lines[0].ends_with("en la línea 1, columna 3: 'y' (tipo: IDENT)"));
        assert_eq!(lines[1], "Se esperaba uno de: COMA, IGUAL");
        assert_eq!(lines[2], "Contexto del error:");
        assert!(message.ends_with(&err.context));

        let bare = SyntaxError::new(SyntaxReason::UnexpectedToken, "x y", 1, 3, "IDENT", "y");
        assert_eq!(bare.to_string().lines().nth(1), Some("Contexto del error:"));
    }

    #[test]
    fn diagnostic_json_has_code_and_position() {
        let err: TranslationError =
            SyntaxError::new(SyntaxReason::UnexpectedChar, "a $ b", 1, 3, "UNKNOWN", "$").into();
        let json = err.diagnostic().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["code"], "E_LEX_UNEXPECTED_CHAR");
        assert_eq!(value["kind"], "syntax");
        assert_eq!(value["line"], 1);
        assert_eq!(value["col"], 3);
        assert!(value.get("construct").is_none());
    }

    #[test]
    fn structural_message_is_prefixed() {
        let err = StructuralError::new(
            StructuralKind::ArgumentOrder,
            "Argumento posicional aparece después de argumentos por nombre en la llamada.",
            "f(a=1, 2)",
        );
        assert_eq!(err.code(), "E_STRUCT_ARGUMENT_ORDER");
        assert!(err.to_string().starts_with("Error de gramática: "));
    }
}
