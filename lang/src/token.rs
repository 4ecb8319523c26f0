// lang/src/token.rs
use crate::span::Span;

/// Terminal categories. The raw spelling lives on [`Token::text`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Imaginary,
    Complex,
    Str,
    Docstring,

    Let,
    Si,
    Sino,
    SinoSi,
    Mientras,
    Para,
    En,
    Romper,
    Continuar,
    Pasar,
    Funcion,
    Clase,
    Desde,
    Importar,
    Retornar,
    Intentar,
    Capturar,
    Finalmente,
    Con,
    Como,
    Nueva,
    Imprimir,
    Graficar,
    Lambda,
    Verdadero,
    Falso,
    Ninguno,
    Es,
    EsNo,
    No,
    NoEn,
    Y,
    O,

    Igual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    DoubleStar,
    DoubleSlash,
    At,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    LShift,
    RShift,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    DoubleStarEqual,
    DoubleSlashEqual,
    AmpersandEqual,
    PipeEqual,
    CaretEqual,
    LShiftEqual,
    RShiftEqual,
    AtEqual,
    Le,
    Ge,
    EqEq,
    Ne,
    Lt,
    Gt,

    LPar,
    RPar,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Question,
    Arrow,
    Quote,
    Ellipsis,
    Eof,
}

pub const AUGMENTED_ASSIGN_OPS: &[TokenKind] = &[
    TokenKind::PlusEqual,
    TokenKind::MinusEqual,
    TokenKind::StarEqual,
    TokenKind::SlashEqual,
    TokenKind::PercentEqual,
    TokenKind::DoubleStarEqual,
    TokenKind::DoubleSlashEqual,
    TokenKind::AmpersandEqual,
    TokenKind::PipeEqual,
    TokenKind::CaretEqual,
    TokenKind::LShiftEqual,
    TokenKind::RShiftEqual,
    TokenKind::AtEqual,
];

impl TokenKind {
    /// Category name reported in syntax errors.
    pub fn category(self) -> &'static str {
        match self {
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::Imaginary => "IMAGINARY",
            TokenKind::Complex => "COMPLEX",
            TokenKind::Str => "STRING",
            TokenKind::Docstring => "MULTILINE_STRING",
            TokenKind::Let => "LET_KW",
            TokenKind::Si => "SI_KW",
            TokenKind::Sino => "SINO_KW",
            TokenKind::SinoSi => "ELIF_KW",
            TokenKind::Mientras => "MIENTRAS_KW",
            TokenKind::Para => "PARA_KW",
            TokenKind::En => "EN_KW",
            TokenKind::Romper => "ROMPER",
            TokenKind::Continuar => "CONTINUAR",
            TokenKind::Pasar => "PASAR",
            TokenKind::Funcion => "FUNCION_KW",
            TokenKind::Clase => "CLASE_KW",
            TokenKind::Desde => "DESDE",
            TokenKind::Importar => "IMPORT_KW",
            TokenKind::Retornar => "RETORNAR_KW",
            TokenKind::Intentar => "TRY_KW",
            TokenKind::Capturar => "CATCH_KW",
            TokenKind::Finalmente => "FINALLY_KW",
            TokenKind::Con => "WITH_KW",
            TokenKind::Como => "COMO",
            TokenKind::Nueva => "NUEVA_KW",
            TokenKind::Imprimir => "IMPRIMIR",
            TokenKind::Graficar => "GRAFICAR",
            TokenKind::Lambda => "LAMBDA_KW",
            TokenKind::Verdadero => "VERDADERO_KW",
            TokenKind::Falso => "FALSO_KW",
            TokenKind::Ninguno => "NINGUNO_KW",
            TokenKind::Es => "ES_KW",
            TokenKind::EsNo => "ES_NO",
            TokenKind::No => "NO_OP",
            TokenKind::NoEn => "NO_EN",
            TokenKind::Y => "Y_OP",
            TokenKind::O => "O_OP",
            TokenKind::Igual => "IGUAL",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::DoubleStar => "DOUBLE_STAR",
            TokenKind::DoubleSlash => "DOUBLE_SLASH",
            TokenKind::At => "AT_OP",
            TokenKind::Ampersand => "AMPERSAND_OP",
            TokenKind::Pipe => "PIPE_OP",
            TokenKind::Caret => "CARET_OP",
            TokenKind::Tilde => "TILDE_OP",
            TokenKind::LShift => "LSHIFT_OP",
            TokenKind::RShift => "RSHIFT_OP",
            TokenKind::PlusEqual => "PLUS_EQUAL",
            TokenKind::MinusEqual => "MINUS_EQUAL",
            TokenKind::StarEqual => "STAR_EQUAL",
            TokenKind::SlashEqual => "SLASH_EQUAL",
            TokenKind::PercentEqual => "PERCENT_EQUAL",
            TokenKind::DoubleStarEqual => "DOUBLE_STAR_EQUAL",
            TokenKind::DoubleSlashEqual => "DOUBLE_SLASH_EQUAL",
            TokenKind::AmpersandEqual => "AMPERSAND_EQUAL",
            TokenKind::PipeEqual => "PIPE_EQUAL",
            TokenKind::CaretEqual => "CARET_EQUAL",
            TokenKind::LShiftEqual => "LSHIFT_EQUAL",
            TokenKind::RShiftEqual => "RSHIFT_EQUAL",
            TokenKind::AtEqual => "AT_EQUAL",
            TokenKind::Le => "LE",
            TokenKind::Ge => "GE",
            TokenKind::EqEq => "EQ",
            TokenKind::Ne => "NE",
            TokenKind::Lt => "LT",
            TokenKind::Gt => "GT",
            TokenKind::LPar => "LPAR",
            TokenKind::RPar => "RPAR",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Comma => "COMA",
            TokenKind::Dot => "DOT",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Question => "QUESTION",
            TokenKind::Arrow => "ARROW",
            TokenKind::Quote => "QUOTE",
            TokenKind::Ellipsis => "ELLIPSIS",
            TokenKind::Eof => "$END",
        }
    }

    /// Tokens after which `//` on the same line reads as floor division.
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imaginary
                | TokenKind::Complex
                | TokenKind::Str
                | TokenKind::Verdadero
                | TokenKind::Falso
                | TokenKind::Ninguno
                | TokenKind::RPar
                | TokenKind::RBracket
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imaginary
                | TokenKind::Complex
                | TokenKind::Str
                | TokenKind::Docstring
        )
    }

    pub fn is_augmented_assign(self) -> bool {
        AUGMENTED_ASSIGN_OPS.contains(&self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augmented_ops_are_thirteen() {
        assert_eq!(AUGMENTED_ASSIGN_OPS.len(), 13);
        assert!(TokenKind::AtEqual.is_augmented_assign());
        assert!(!TokenKind::Igual.is_augmented_assign());
    }

    #[test]
    fn categories_are_distinct() {
        use std::collections::HashSet;
        let kinds = [
            TokenKind::Es,
            TokenKind::EsNo,
            TokenKind::No,
            TokenKind::NoEn,
            TokenKind::Sino,
            TokenKind::SinoSi,
            TokenKind::At,
            TokenKind::AtEqual,
        ];
        let names: HashSet<_> = kinds.iter().map(|k| k.category()).collect();
        assert_eq!(names.len(), kinds.len());
    }
}
