// lang/src/lexer.rs
use crate::error::{SyntaxError, SyntaxReason};
use crate::grammar::Grammar;
use crate::span::Span;
use crate::token::{Token, TokenKind};

const DOCSTRING_MARK: &str = "###";

/// Operator spellings, longest first so a prefix never shadows a longer match.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("**=", TokenKind::DoubleStarEqual),
    ("//=", TokenKind::DoubleSlashEqual),
    ("<<=", TokenKind::LShiftEqual),
    (">>=", TokenKind::RShiftEqual),
    ("...", TokenKind::Ellipsis),
    ("**", TokenKind::DoubleStar),
    ("//", TokenKind::DoubleSlash),
    ("<<", TokenKind::LShift),
    (">>", TokenKind::RShift),
    ("<=", TokenKind::Le),
    (">=", TokenKind::Ge),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::Ne),
    ("->", TokenKind::Arrow),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("*=", TokenKind::StarEqual),
    ("/=", TokenKind::SlashEqual),
    ("%=", TokenKind::PercentEqual),
    ("&=", TokenKind::AmpersandEqual),
    ("|=", TokenKind::PipeEqual),
    ("^=", TokenKind::CaretEqual),
    ("@=", TokenKind::AtEqual),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("@", TokenKind::At),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("=", TokenKind::Igual),
    ("(", TokenKind::LPar),
    (")", TokenKind::RPar),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (",", TokenKind::Comma),
    (".", TokenKind::Dot),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    ("?", TokenKind::Question),
    ("'", TokenKind::Quote),
];

pub struct Lexer<'a> {
    grammar: &'a Grammar,
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    /// Kind and end line of the last emitted token.
    last: Option<(TokenKind, usize)>,
}

impl<'a> Lexer<'a> {
    pub fn new(grammar: &'a Grammar, source: &'a str) -> Self {
        Self {
            grammar,
            source,
            pos: 0,
            line: 1,
            col: 1,
            last: None,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else {
                break;
            };
            if ch == '/' && self.peek_next() == Some('/') && !self.floor_division_ahead() {
                self.skip_line_comment();
                continue;
            }
            let token = self.next_token(ch)?;
            self.last = Some((token.kind, token.span.end_line));
            tokens.push(token);
        }
        tokens.push(Token::new(TokenKind::Eof, "", Span::point(self.line, self.col)));
        Ok(tokens)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn advance_by(&mut self, bytes: usize) {
        let end = self.pos + bytes;
        while self.pos < end {
            if self.advance().is_none() {
                break;
            }
        }
    }

    fn span_from(&self, start_line: usize, start_col: usize) -> Span {
        Span::new(start_line, start_col, self.line, self.col)
    }

    fn error(&self, reason: SyntaxReason, line: usize, col: usize, found: &str, text: &str) -> SyntaxError {
        SyntaxError::new(reason, self.source, line, col, found, text)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '\u{feff}' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// An operand just ended on this line.
    fn operand_on_line(&self) -> bool {
        matches!(self.last, Some((kind, line)) if kind.ends_operand() && line == self.line)
    }

    /// `//` at the cursor is floor division when it follows an operand and
    /// the rest of the line closes or terminates the right operand.
    fn floor_division_ahead(&self) -> bool {
        if !self.operand_on_line() {
            return false;
        }
        let tail = self.rest().get(2..).unwrap_or("");
        let mut chars = tail.chars().peekable();
        let mut in_string = false;
        let mut seen_operand = false;
        while let Some(c) = chars.next() {
            if in_string {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '"' => in_string = false,
                    '\n' => return false,
                    _ => {}
                }
                continue;
            }
            match c {
                '\n' => return false,
                '/' if chars.peek() == Some(&'/') => return false,
                ';' | ',' | ')' | ']' | '}' => return seen_operand,
                '"' => {
                    in_string = true;
                    seen_operand = true;
                }
                _ if c.is_whitespace() => {}
                _ => seen_operand = true,
            }
        }
        false
    }

    fn next_token(&mut self, ch: char) -> Result<Token, SyntaxError> {
        match ch {
            '"' => self.read_string(),
            '#' if self.rest().starts_with(DOCSTRING_MARK) => self.read_docstring(),
            '0'..='9' => self.read_number(),
            '.' if self.peek_next().is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            _ if is_ident_start(ch) => Ok(self.read_word()),
            _ => self.read_operator(ch),
        }
    }

    fn read_operator(&mut self, ch: char) -> Result<Token, SyntaxError> {
        let rest = self.rest();
        let Some((text, kind)) = OPERATORS.iter().find(|(op, _)| rest.starts_with(op)) else {
            return Err(self.error(
                SyntaxReason::UnexpectedChar,
                self.line,
                self.col,
                "UNKNOWN",
                &ch.to_string(),
            ));
        };
        let (start_line, start_col) = (self.line, self.col);
        self.advance_by(text.len());
        Ok(Token::new(*kind, *text, self.span_from(start_line, start_col)))
    }

    fn read_string(&mut self) -> Result<Token, SyntaxError> {
        let (start_line, start_col) = (self.line, self.col);
        let start = self.pos;
        self.advance();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('\n') | None => {
                            return Err(self.unterminated_string(start, start_line, start_col))
                        }
                        Some(_) => {
                            self.advance();
                        }
                    }
                }
                Some('\n') | None => {
                    return Err(self.unterminated_string(start, start_line, start_col));
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        let text = &self.source[start..self.pos];
        Ok(Token::new(TokenKind::Str, text, self.span_from(start_line, start_col)))
    }

    fn unterminated_string(&self, start: usize, line: usize, col: usize) -> SyntaxError {
        let text = &self.source[start..self.pos];
        self.error(SyntaxReason::UnterminatedString, line, col, "STRING", text)
    }

    fn read_docstring(&mut self) -> Result<Token, SyntaxError> {
        let (start_line, start_col) = (self.line, self.col);
        let start = self.pos;
        let body_start = start + DOCSTRING_MARK.len();
        let Some(close) = self.source[body_start..].find(DOCSTRING_MARK) else {
            return Err(self.error(
                SyntaxReason::UnterminatedDocstring,
                start_line,
                start_col,
                "MULTILINE_STRING",
                DOCSTRING_MARK,
            ));
        };
        let end = body_start + close + DOCSTRING_MARK.len();
        self.advance_by(end - start);
        Ok(Token::new(
            TokenKind::Docstring,
            &self.source[start..end],
            self.span_from(start_line, start_col),
        ))
    }

    fn read_number(&mut self) -> Result<Token, SyntaxError> {
        let (start_line, start_col) = (self.line, self.col);
        let start = self.pos;
        let Some((kind, len)) = self.grammar.numbers().match_at(self.rest()) else {
            return Err(self.error(
                SyntaxReason::MalformedNumber,
                start_line,
                start_col,
                "UNKNOWN",
                &self.rest().chars().take(1).collect::<String>(),
            ));
        };
        self.advance_by(len);
        if self.peek().is_some_and(is_ident_continue) {
            let mut end = self.pos;
            for ch in self.source[end..].chars().take_while(|c| is_ident_continue(*c)) {
                end += ch.len_utf8();
            }
            return Err(self.error(
                SyntaxReason::MalformedNumber,
                start_line,
                start_col,
                kind.category(),
                &self.source[start..end],
            ));
        }
        Ok(Token::new(
            kind,
            &self.source[start..self.pos],
            self.span_from(start_line, start_col),
        ))
    }

    fn read_word(&mut self) -> Token {
        let (start_line, start_col) = (self.line, self.col);
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
        let word = &self.source[start..self.pos];
        let Some(mut kind) = self.grammar.keyword(word) else {
            return Token::new(TokenKind::Ident, word, self.span_from(start_line, start_col));
        };
        if let Some((tail, compound)) = self.grammar.compound_keyword(word) {
            if let Some(len) = self.compound_tail_len(tail) {
                self.advance_by(len);
                kind = compound;
            }
        }
        Token::new(kind, &self.source[start..self.pos], self.span_from(start_line, start_col))
    }

    /// Byte length of `whitespace + tail` when `tail` follows as a whole word.
    fn compound_tail_len(&self, tail: &str) -> Option<usize> {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        let gap = rest.len() - trimmed.len();
        if gap == 0 || !trimmed.starts_with(tail) {
            return None;
        }
        let after = trimmed[tail.len()..].chars().next();
        if after.is_some_and(is_ident_continue) {
            return None;
        }
        Some(gap + tail.len())
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::build_grammar;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let grammar = build_grammar();
        Lexer::new(&grammar, source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        let grammar = build_grammar();
        Lexer::new(&grammar, source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            kinds("si sino mientras siempre"),
            vec![
                TokenKind::Si,
                TokenKind::Sino,
                TokenKind::Mientras,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn compound_keywords_merge_across_whitespace() {
        assert_eq!(
            kinds("sino si a no en b es no c"),
            vec![
                TokenKind::SinoSi,
                TokenKind::Ident,
                TokenKind::NoEn,
                TokenKind::Ident,
                TokenKind::EsNo,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("es no_valido"),
            vec![TokenKind::Es, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn longest_operator_match() {
        assert_eq!(
            kinds("a **= b << c <<= d"),
            vec![
                TokenKind::Ident,
                TokenKind::DoubleStarEqual,
                TokenKind::Ident,
                TokenKind::LShift,
                TokenKind::Ident,
                TokenKind::LShiftEqual,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn double_slash_after_operand_is_floor_division() {
        assert_eq!(
            kinds("a // b;"),
            vec![
                TokenKind::Ident,
                TokenKind::DoubleSlash,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("x = 1; // nota\ny"),
            vec![
                TokenKind::Ident,
                TokenKind::Igual,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("// solo comentario"), vec![TokenKind::Eof]);
    }

    #[test]
    fn trailing_double_slash_without_terminator_is_comment() {
        assert_eq!(
            texts("[\n    1, // uno\n    2  // dos\n]"),
            vec!["[", "1", ",", "2", "]", ""]
        );
        assert_eq!(
            texts("calcular(\n a,\n b // segundo operando\n);"),
            vec!["calcular", "(", "a", ",", "b", ")", ";", ""]
        );
        assert_eq!(
            texts("y = (a // (b)) // mitad"),
            vec!["y", "=", "(", "a", "//", "(", "b", ")", ")", ""]
        );
        assert_eq!(
            texts("s = a // \"x;\" + 1 // nota"),
            vec!["s", "=", "a", ""]
        );
    }

    #[test]
    fn numeric_literals_keep_source_text() {
        assert_eq!(
            texts("1000 3.14 .5 2e-3 5j 1.5J 3+4j"),
            vec!["1000", "3.14", ".5", "2e-3", "5j", "1.5J", "3+4j", ""]
        );
    }

    #[test]
    fn number_kinds() {
        assert_eq!(
            kinds("7 7.0 7j 1-2j"),
            vec![
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Imaginary,
                TokenKind::Complex,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn strings_keep_escapes_verbatim() {
        assert_eq!(texts(r#""a\"b\n""#), vec![r#""a\"b\n""#, ""]);
    }

    #[test]
    fn docstring_is_a_token() {
        let grammar = build_grammar();
        let tokens = Lexer::new(&grammar, "###\nhola\n### x").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Docstring);
        assert_eq!(tokens[0].text, "###\nhola\n###");
        assert_eq!(tokens[1].span.start_line, 3);
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let grammar = build_grammar();
        let tokens = Lexer::new(&grammar, "let x;\n  y = 2;").tokenize().unwrap();
        let y = &tokens[3];
        assert_eq!(y.text, "y");
        assert_eq!((y.span.start_line, y.span.start_col), (2, 3));
    }

    #[test]
    fn unterminated_string_is_reported() {
        let grammar = build_grammar();
        let err = Lexer::new(&grammar, "x = \"abc\n").tokenize().unwrap_err();
        assert_eq!(err.reason, SyntaxReason::UnterminatedString);
        assert_eq!((err.line, err.col), (1, 5));
    }

    #[test]
    fn unknown_character_is_reported() {
        let grammar = build_grammar();
        let err = Lexer::new(&grammar, "a $ b").tokenize().unwrap_err();
        assert_eq!(err.reason, SyntaxReason::UnexpectedChar);
        assert_eq!(err.text, "$");
        assert_eq!(err.col, 3);
    }

    #[test]
    fn number_glued_to_identifier_is_malformed() {
        let grammar = build_grammar();
        let err = Lexer::new(&grammar, "12abc").tokenize().unwrap_err();
        assert_eq!(err.reason, SyntaxReason::MalformedNumber);
        assert_eq!(err.text, "12abc");
    }
}
