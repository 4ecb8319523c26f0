// lang/src/parser.rs
// Recursive descent over the token stream with one token of lookahead. Every
// `check` records the category it tested so a failure can report the full set
// of tokens that would have been accepted at that point.

use std::collections::BTreeSet;

use crate::error::{SyntaxError, SyntaxReason};
use crate::grammar::{Grammar, Rule, Tier, TierShape};
use crate::span::Span;
use crate::token::{Token, TokenKind, AUGMENTED_ASSIGN_OPS};
use crate::tree::SyntaxNode;

pub const DEFAULT_MAX_NESTING: usize = 64;

const STATEMENT_STARTS: &[TokenKind] = &[
    TokenKind::Docstring,
    TokenKind::At,
    TokenKind::Funcion,
    TokenKind::Clase,
    TokenKind::Let,
    TokenKind::Si,
    TokenKind::Mientras,
    TokenKind::Para,
    TokenKind::Intentar,
    TokenKind::Con,
    TokenKind::Importar,
    TokenKind::Desde,
    TokenKind::Retornar,
    TokenKind::Romper,
    TokenKind::Continuar,
    TokenKind::Pasar,
    TokenKind::Imprimir,
    TokenKind::Graficar,
];

const PRIMARY_STARTS: &[TokenKind] = &[
    TokenKind::Ident,
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::Imaginary,
    TokenKind::Complex,
    TokenKind::Str,
    TokenKind::Docstring,
    TokenKind::Verdadero,
    TokenKind::Falso,
    TokenKind::Ninguno,
    TokenKind::LPar,
    TokenKind::LBracket,
    TokenKind::LBrace,
    TokenKind::Nueva,
];

const TYPE_STARTS: &[TokenKind] = &[
    TokenKind::Ident,
    TokenKind::Quote,
    TokenKind::Ninguno,
    TokenKind::LBracket,
];

type ParseResult<T> = Result<T, SyntaxError>;

pub struct Parser<'a> {
    grammar: &'a Grammar,
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    expected: BTreeSet<&'static str>,
    depth: usize,
    max_nesting: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an EOF token, as produced by the lexer.
    pub fn new(grammar: &'a Grammar, source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            grammar,
            source,
            tokens,
            pos: 0,
            expected: BTreeSet::new(),
            depth: 0,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    pub fn with_max_nesting(mut self, limit: usize) -> Self {
        self.max_nesting = limit;
        self
    }

    pub fn parse_module(mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let mut items = Vec::new();
        while !self.check(TokenKind::Eof) {
            items.push(self.parse_item()?);
        }
        Ok(self.finish(Rule::Module, items, start))
    }

    // ----- token plumbing -----

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.expected.insert(kind.category());
        self.peek_kind() == kind
    }

    fn check_any(&mut self, kinds: &[TokenKind]) -> bool {
        self.note_expected(kinds);
        kinds.contains(&self.peek_kind())
    }

    fn note_expected(&mut self, kinds: &[TokenKind]) {
        self.expected.extend(kinds.iter().map(|kind| kind.category()));
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        self.expected.clear();
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.eat(kind) {
            Some(token) => Ok(token),
            None => Err(self.unexpected()),
        }
    }

    fn unexpected(&self) -> SyntaxError {
        let token = self.peek();
        SyntaxError::new(
            SyntaxReason::UnexpectedToken,
            self.source,
            token.span.start_line,
            token.span.start_col,
            token.kind.category(),
            &token.text,
        )
        .with_expected(self.expected.iter().copied())
    }

    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(prev) => self.tokens[prev].span,
            None => self.peek().span,
        }
    }

    fn finish(&self, rule: Rule, children: Vec<SyntaxNode>, start: Span) -> SyntaxNode {
        SyntaxNode::node(rule, children, start.merge(self.prev_span()))
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_nesting {
            let token = self.peek();
            return Err(SyntaxError::new(
                SyntaxReason::NestingTooDeep {
                    limit: self.max_nesting,
                },
                self.source,
                token.span.start_line,
                token.span.start_col,
                token.kind.category(),
                &token.text,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ----- items and blocks -----

    fn parse_item(&mut self) -> ParseResult<SyntaxNode> {
        self.note_expected(STATEMENT_STARTS);
        match self.peek_kind() {
            TokenKind::Docstring => Ok(self.advance().into()),
            TokenKind::At => self.parse_decorator(),
            TokenKind::Funcion => self.parse_func_def(),
            TokenKind::Clase => self.parse_class_def(),
            TokenKind::Let => self.parse_let(),
            TokenKind::Si => self.parse_if(),
            TokenKind::Mientras => self.parse_while(),
            TokenKind::Para => self.parse_for(),
            TokenKind::Intentar => self.parse_try(),
            TokenKind::Con => self.parse_with(),
            TokenKind::Importar => self.parse_import(),
            TokenKind::Desde => self.parse_from_import(),
            TokenKind::Retornar => self.parse_return(),
            TokenKind::Romper => self.parse_keyword_stmt(Rule::BreakStmt),
            TokenKind::Continuar => self.parse_keyword_stmt(Rule::ContinueStmt),
            TokenKind::Pasar => self.parse_keyword_stmt(Rule::PassStmt),
            TokenKind::Imprimir => self.parse_builtin_call(Rule::PrintStmt),
            TokenKind::Graficar => self.parse_builtin_call(Rule::PlotStmt),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block(&mut self, rule: Rule) -> ParseResult<SyntaxNode> {
        self.enter()?;
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.peek_kind() == TokenKind::Eof {
                return Err(self.unexpected());
            }
            items.push(self.parse_item()?);
        }
        self.advance();
        self.leave();
        Ok(self.finish(rule, items, start))
    }

    fn parse_decorator(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let target = self.parse_access()?;
        Ok(self.finish(Rule::Decorator, vec![target], start))
    }

    fn parse_func_def(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let name = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::LPar)?;
        let params = self.parse_parameter_list(TokenKind::RPar, true)?;
        self.expect(TokenKind::RPar)?;
        let mut children = vec![name.into(), params];
        if let Some(arrow) = self.eat(TokenKind::Arrow) {
            let ty = self.parse_type()?;
            children.push(self.finish(Rule::ReturnType, vec![ty], arrow.span));
        }
        children.push(self.parse_block(Rule::Block)?);
        Ok(self.finish(Rule::FuncDef, children, start))
    }

    fn parse_parameter_list(&mut self, closer: TokenKind, allow_hints: bool) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let mut params = Vec::new();
        while !self.check(closer) {
            params.push(self.parse_parameter(allow_hints)?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(SyntaxNode::node(
            Rule::ParameterList,
            params,
            start.merge(self.prev_span()),
        ))
    }

    fn parse_parameter(&mut self, allow_hints: bool) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        if self.eat(TokenKind::Star).is_some() {
            let name = self.expect(TokenKind::Ident)?;
            return Ok(self.finish(Rule::StarParam, vec![name.into()], start));
        }
        if self.eat(TokenKind::DoubleStar).is_some() {
            let name = self.expect(TokenKind::Ident)?;
            return Ok(self.finish(Rule::DoubleStarParam, vec![name.into()], start));
        }
        let name = self.expect(TokenKind::Ident)?;
        let mut children = vec![name.into()];
        if allow_hints {
            if let Some(colon) = self.eat(TokenKind::Colon) {
                let ty = self.parse_type()?;
                children.push(self.finish(Rule::TypeHint, vec![ty], colon.span));
            }
        }
        if self.eat(TokenKind::Igual).is_some() {
            children.push(self.parse_expr()?);
            return Ok(self.finish(Rule::DefaultParam, children, start));
        }
        Ok(self.finish(Rule::PosParam, children, start))
    }

    fn parse_class_def(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let name = self.expect(TokenKind::Ident)?;
        let mut children = vec![name.into()];
        if let Some(desde) = self.eat(TokenKind::Desde) {
            let mut bases = vec![self.parse_access()?];
            while self.eat(TokenKind::Comma).is_some() {
                if self.check(TokenKind::LBrace) {
                    break;
                }
                bases.push(self.parse_access()?);
            }
            children.push(self.finish(Rule::BaseList, bases, desde.span));
        }
        children.push(self.parse_block(Rule::ClassBody)?);
        Ok(self.finish(Rule::ClassDef, children, start))
    }

    // ----- statements -----

    fn parse_let(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let name = self.expect(TokenKind::Ident)?;
        let mut children = vec![name.into()];
        if let Some(colon) = self.eat(TokenKind::Colon) {
            let ty = self.parse_type()?;
            children.push(self.finish(Rule::TypeHint, vec![ty], colon.span));
        }
        if self.eat(TokenKind::Igual).is_some() {
            children.push(self.parse_expr()?);
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(self.finish(Rule::LetDecl, children, start))
    }

    fn parse_condition(&mut self) -> ParseResult<SyntaxNode> {
        self.expect(TokenKind::LPar)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RPar)?;
        Ok(cond)
    }

    fn parse_if(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let cond = self.parse_condition()?;
        let body = self.parse_block(Rule::Block)?;
        let mut children = vec![cond, body];
        while let Some(elif) = self.eat(TokenKind::SinoSi) {
            let cond = self.parse_condition()?;
            let body = self.parse_block(Rule::Block)?;
            children.push(self.finish(Rule::ElifClause, vec![cond, body], elif.span));
        }
        if let Some(sino) = self.eat(TokenKind::Sino) {
            let body = self.parse_block(Rule::Block)?;
            children.push(self.finish(Rule::ElseClause, vec![body], sino.span));
        }
        Ok(self.finish(Rule::IfStmt, children, start))
    }

    fn parse_while(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let cond = self.parse_condition()?;
        let body = self.parse_block(Rule::Block)?;
        Ok(self.finish(Rule::WhileStmt, vec![cond, body], start))
    }

    fn parse_for_target(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let mut names = vec![self.expect(TokenKind::Ident)?.into()];
        while self.eat(TokenKind::Comma).is_some() {
            names.push(self.expect(TokenKind::Ident)?.into());
        }
        Ok(self.finish(Rule::ForTarget, names, start))
    }

    fn parse_for(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let target = self.parse_for_target()?;
        self.expect(TokenKind::En)?;
        let iterable = self.parse_expr()?;
        let body = self.parse_block(Rule::Block)?;
        Ok(self.finish(Rule::ForStmt, vec![target, iterable, body], start))
    }

    fn parse_try(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let mut children = vec![self.parse_block(Rule::Block)?];
        while let Some(capturar) = self.eat(TokenKind::Capturar) {
            let mut clause = Vec::new();
            if !self.check(TokenKind::LBrace) {
                clause.push(self.parse_access()?);
                if let Some(como) = self.eat(TokenKind::Como) {
                    clause.push(como.into());
                    clause.push(self.expect(TokenKind::Ident)?.into());
                }
            }
            clause.push(self.parse_block(Rule::Block)?);
            children.push(self.finish(Rule::ExceptClause, clause, capturar.span));
        }
        if let Some(finalmente) = self.eat(TokenKind::Finalmente) {
            let body = self.parse_block(Rule::Block)?;
            children.push(self.finish(Rule::FinallyClause, vec![body], finalmente.span));
        }
        if children.len() == 1 {
            return Err(self.unexpected());
        }
        Ok(self.finish(Rule::TryStmt, children, start))
    }

    fn parse_with(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let mut children = vec![self.parse_expr()?];
        if let Some(como) = self.eat(TokenKind::Como) {
            children.push(como.into());
            children.push(self.expect(TokenKind::Ident)?.into());
        }
        children.push(self.parse_block(Rule::Block)?);
        Ok(self.finish(Rule::WithStmt, children, start))
    }

    fn parse_dotted_name(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let mut parts = vec![self.expect(TokenKind::Ident)?.into()];
        while self.eat(TokenKind::Dot).is_some() {
            parts.push(self.expect(TokenKind::Ident)?.into());
        }
        Ok(self.finish(Rule::DottedName, parts, start))
    }

    fn parse_import(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let mut children = vec![self.parse_dotted_name()?];
        if let Some(como) = self.eat(TokenKind::Como) {
            children.push(como.into());
            children.push(self.expect(TokenKind::Ident)?.into());
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(self.finish(Rule::ImportStmt, children, start))
    }

    fn parse_from_import(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let module = self.parse_dotted_name()?;
        self.expect(TokenKind::Importar)?;
        let names = if let Some(star) = self.eat(TokenKind::Star) {
            star.into()
        } else {
            let list_start = self.peek().span;
            let mut names = vec![self.parse_imported_name()?];
            while self.eat(TokenKind::Comma).is_some() {
                if self.check(TokenKind::Semicolon) {
                    break;
                }
                names.push(self.parse_imported_name()?);
            }
            self.finish(Rule::ImportedNames, names, list_start)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(self.finish(Rule::FromImport, vec![module, names], start))
    }

    fn parse_imported_name(&mut self) -> ParseResult<SyntaxNode> {
        let name = self.expect(TokenKind::Ident)?;
        let start = name.span;
        let mut children = vec![name.into()];
        if let Some(como) = self.eat(TokenKind::Como) {
            children.push(como.into());
            children.push(self.expect(TokenKind::Ident)?.into());
        }
        Ok(self.finish(Rule::ImportedName, children, start))
    }

    fn parse_return(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let mut children = Vec::new();
        if !self.check(TokenKind::Semicolon) {
            children.push(self.parse_expr()?);
            while let Some(comma) = self.eat(TokenKind::Comma) {
                if self.check(TokenKind::Semicolon) {
                    children.push(comma.into());
                    break;
                }
                children.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(self.finish(Rule::ReturnStmt, children, start))
    }

    fn parse_keyword_stmt(&mut self, rule: Rule) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.finish(rule, Vec::new(), start))
    }

    fn parse_builtin_call(&mut self, rule: Rule) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        self.expect(TokenKind::LPar)?;
        let args = self.parse_arguments(TokenKind::RPar)?;
        self.expect(TokenKind::RPar)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.finish(rule, vec![args], start))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let first = self.parse_expr()?;

        if first.is_token(TokenKind::Ident) {
            if let Some(colon) = self.eat(TokenKind::Colon) {
                let ty = self.parse_type()?;
                let mut children = vec![first, self.finish(Rule::TypeHint, vec![ty], colon.span)];
                if self.eat(TokenKind::Igual).is_some() {
                    children.push(self.parse_expr()?);
                }
                self.expect(TokenKind::Semicolon)?;
                return Ok(self.finish(Rule::ClassAttribute, children, start));
            }
        }

        if self.check(TokenKind::Comma) {
            let mut targets = vec![first];
            while let Some(comma) = self.eat(TokenKind::Comma) {
                if self.check(TokenKind::Igual) {
                    targets.push(comma.into());
                    break;
                }
                targets.push(self.parse_expr()?);
            }
            let target = self.finish(Rule::UnpackTarget, targets, start);
            self.expect(TokenKind::Igual)?;
            let value = self.parse_value()?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(self.finish(Rule::UnpackAssignment, vec![target, value], start));
        }

        if self.eat(TokenKind::Igual).is_some() {
            let value = self.parse_value()?;
            self.expect(TokenKind::Semicolon)?;
            let rule = if first.is_rule(Rule::ParenOrTuple) || first.is_rule(Rule::ListLiteral) {
                Rule::UnpackAssignment
            } else {
                Rule::Assignment
            };
            return Ok(self.finish(rule, vec![first, value], start));
        }

        if self.check_any(AUGMENTED_ASSIGN_OPS) {
            let op = self.advance();
            let value = self.parse_value()?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(self.finish(
                Rule::AugmentedAssignment,
                vec![first, op.into(), value],
                start,
            ));
        }

        self.expect(TokenKind::Semicolon)?;
        Ok(self.finish(Rule::ExprStmt, vec![first], start))
    }

    /// Right-hand side: one expression, or a bare sequence `a, b[,]`.
    fn parse_value(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let first = self.parse_expr()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while let Some(comma) = self.eat(TokenKind::Comma) {
            if self.check(TokenKind::Semicolon) {
                items.push(comma.into());
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(self.finish(Rule::ExprList, items, start))
    }

    // ----- expressions -----

    fn parse_expr(&mut self) -> ParseResult<SyntaxNode> {
        self.enter()?;
        let expr = if self.check(TokenKind::Lambda) {
            self.parse_lambda()
        } else {
            self.parse_ternary()
        };
        self.leave();
        expr
    }

    fn parse_lambda(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let params = self.parse_parameter_list(TokenKind::Colon, false)?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_expr()?;
        Ok(self.finish(Rule::Lambda, vec![params, body], start))
    }

    fn parse_ternary(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let cond = self.parse_tier(0)?;
        if self.eat(TokenKind::Question).is_none() {
            return Ok(cond);
        }
        let then = self.parse_tier(0)?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_tier(0)?;
        Ok(self.finish(Rule::Ternary, vec![cond, then, otherwise], start))
    }

    fn parse_tier(&mut self, index: usize) -> ParseResult<SyntaxNode> {
        let grammar = self.grammar;
        let Some(tier) = grammar.tiers().get(index) else {
            return self.parse_access();
        };
        let start = self.peek().span;
        match tier.shape {
            TierShape::Prefix => {
                if !self.check_any(tier.operators) {
                    return self.parse_tier(index + 1);
                }
                let op = self.advance();
                let operand = self.parse_tier(index + 1)?;
                Ok(self.finish(tier.rule, vec![op.into(), operand], start))
            }
            TierShape::Chain => {
                let rhs = tier.rhs.and_then(|rule| grammar.tier_index(rule));
                let mut children = vec![self.parse_tier(index + 1)?];
                while self.check_any(tier.operators) {
                    children.push(self.advance().into());
                    let operand = match rhs {
                        Some(rhs) => self.parse_chain_rhs(&grammar.tiers()[rhs], index)?,
                        None => self.parse_tier(index + 1)?,
                    };
                    children.push(operand);
                }
                if children.len() == 1 {
                    return Ok(children.remove(0));
                }
                Ok(self.finish(tier.rule, children, start))
            }
        }
    }

    /// Right operand of a chain whose operands re-enter a looser prefix tier.
    /// The prefix operand resumes below the chain so the chain stays flat.
    fn parse_chain_rhs(&mut self, rhs: &Tier, chain_index: usize) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        if rhs.shape == TierShape::Prefix && self.check_any(rhs.operators) {
            let op = self.advance();
            let operand = self.parse_tier(chain_index + 1)?;
            return Ok(self.finish(rhs.rule, vec![op.into(), operand], start));
        }
        self.parse_tier(chain_index + 1)
    }

    fn parse_access(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let mut children = vec![self.parse_primary()?];
        loop {
            let suffix_start = self.peek().span;
            if self.eat(TokenKind::Dot).is_some() {
                let name = self.expect(TokenKind::Ident)?;
                children.push(self.finish(Rule::AttributeSuffix, vec![name.into()], suffix_start));
            } else if self.eat(TokenKind::LBracket).is_some() {
                let items = self.parse_subscripts()?;
                self.expect(TokenKind::RBracket)?;
                children.push(self.finish(Rule::IndexSuffix, items, suffix_start));
            } else if self.eat(TokenKind::LPar).is_some() {
                let args = self.parse_arguments(TokenKind::RPar)?;
                self.expect(TokenKind::RPar)?;
                children.push(self.finish(Rule::CallSuffix, vec![args], suffix_start));
            } else {
                break;
            }
        }
        if children.len() == 1 {
            return Ok(children.remove(0));
        }
        Ok(self.finish(Rule::Access, children, start))
    }

    fn parse_subscripts(&mut self) -> ParseResult<Vec<SyntaxNode>> {
        let mut items = vec![self.parse_subscript()?];
        while self.eat(TokenKind::Comma).is_some() {
            if self.check(TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_subscript()?);
        }
        Ok(items)
    }

    fn parse_subscript(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let mut parts = Vec::new();
        if !self.check(TokenKind::Colon) {
            let lower = self.parse_expr()?;
            if !self.check(TokenKind::Colon) {
                return Ok(lower);
            }
            parts.push(lower);
        }
        let mut colons = 0;
        while colons < 2 {
            let Some(colon) = self.eat(TokenKind::Colon) else {
                break;
            };
            parts.push(colon.into());
            colons += 1;
            if !self.check_any(&[TokenKind::Colon, TokenKind::Comma, TokenKind::RBracket]) {
                parts.push(self.parse_expr()?);
            }
        }
        Ok(self.finish(Rule::Slice, parts, start))
    }

    fn parse_arguments(&mut self, closer: TokenKind) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        let mut args = Vec::new();
        while !self.check(closer) {
            args.push(self.parse_argument()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(SyntaxNode::node(
            Rule::ArgumentList,
            args,
            start.merge(self.prev_span()),
        ))
    }

    fn parse_argument(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.peek().span;
        if self.eat(TokenKind::Star).is_some() {
            let value = self.parse_expr()?;
            return Ok(self.finish(Rule::StarArg, vec![value], start));
        }
        if self.eat(TokenKind::DoubleStar).is_some() {
            let value = self.parse_expr()?;
            return Ok(self.finish(Rule::DoubleStarArg, vec![value], start));
        }
        let value = self.parse_expr()?;
        if value.is_token(TokenKind::Ident) && self.eat(TokenKind::Igual).is_some() {
            let bound = self.parse_expr()?;
            return Ok(self.finish(Rule::KeywordArgument, vec![value, bound], start));
        }
        Ok(value)
    }

    fn parse_primary(&mut self) -> ParseResult<SyntaxNode> {
        self.note_expected(PRIMARY_STARTS);
        match self.peek_kind() {
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imaginary
            | TokenKind::Complex
            | TokenKind::Str
            | TokenKind::Docstring
            | TokenKind::Verdadero
            | TokenKind::Falso
            | TokenKind::Ninguno => Ok(self.advance().into()),
            TokenKind::LPar => self.parse_paren(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_brace(),
            TokenKind::Nueva => self.parse_new(),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_paren(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        if self.eat(TokenKind::RPar).is_some() {
            return Ok(self.finish(Rule::ParenOrTuple, Vec::new(), start));
        }
        let first = self.parse_expr()?;
        if self.check(TokenKind::Para) {
            let children = self.parse_comp_clauses(first)?;
            self.expect(TokenKind::RPar)?;
            return Ok(self.finish(Rule::GeneratorExpr, children, start));
        }
        let mut items = vec![first];
        while let Some(comma) = self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RPar) {
                items.push(comma.into());
                break;
            }
            items.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RPar)?;
        Ok(self.finish(Rule::ParenOrTuple, items, start))
    }

    fn parse_list(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        if self.eat(TokenKind::RBracket).is_some() {
            return Ok(self.finish(Rule::ListLiteral, Vec::new(), start));
        }
        let first = self.parse_expr()?;
        if self.check(TokenKind::Para) {
            let children = self.parse_comp_clauses(first)?;
            self.expect(TokenKind::RBracket)?;
            return Ok(self.finish(Rule::ListComp, children, start));
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma).is_some() {
            if self.check(TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RBracket)?;
        Ok(self.finish(Rule::ListLiteral, items, start))
    }

    fn parse_brace(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        if self.eat(TokenKind::RBrace).is_some() {
            return Ok(self.finish(Rule::DictLiteral, Vec::new(), start));
        }
        let first = self.parse_expr()?;
        if self.check(TokenKind::Colon) {
            let first = self.parse_key_value(first)?;
            if self.check(TokenKind::Para) {
                let children = self.parse_comp_clauses(first)?;
                self.expect(TokenKind::RBrace)?;
                return Ok(self.finish(Rule::DictComp, children, start));
            }
            let mut entries = vec![first];
            while self.eat(TokenKind::Comma).is_some() {
                if self.check(TokenKind::RBrace) {
                    break;
                }
                let key = self.parse_expr()?;
                entries.push(self.parse_key_value(key)?);
            }
            self.expect(TokenKind::RBrace)?;
            return Ok(self.finish(Rule::DictLiteral, entries, start));
        }
        if self.check(TokenKind::Para) {
            let children = self.parse_comp_clauses(first)?;
            self.expect(TokenKind::RBrace)?;
            return Ok(self.finish(Rule::SetComp, children, start));
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma).is_some() {
            if self.check(TokenKind::RBrace) {
                break;
            }
            items.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.finish(Rule::SetLiteral, items, start))
    }

    fn parse_key_value(&mut self, key: SyntaxNode) -> ParseResult<SyntaxNode> {
        let start = key.span();
        self.expect(TokenKind::Colon)?;
        let value = self.parse_expr()?;
        Ok(self.finish(Rule::KeyValue, vec![key, value], start))
    }

    /// `element` followed by one or more `para` clauses, kept side by side.
    fn parse_comp_clauses(&mut self, element: SyntaxNode) -> ParseResult<Vec<SyntaxNode>> {
        let mut children = vec![element];
        while self.check(TokenKind::Para) {
            children.push(self.parse_comp_for()?);
        }
        Ok(children)
    }

    fn parse_comp_for(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.expect(TokenKind::Para)?.span;
        let target = self.parse_for_target()?;
        self.expect(TokenKind::En)?;
        let iterable = self.parse_tier(0)?;
        let mut children = vec![target, iterable];
        if let Some(si) = self.eat(TokenKind::Si) {
            let cond = self.parse_tier(0)?;
            children.push(self.finish(Rule::CompIf, vec![cond], si.span));
        }
        Ok(self.finish(Rule::CompFor, children, start))
    }

    fn parse_new(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.advance().span;
        let target = self.parse_access()?;
        let ends_in_call = target
            .as_node()
            .filter(|node| node.rule == Rule::Access)
            .and_then(|node| node.children.last())
            .is_some_and(|last| last.is_rule(Rule::CallSuffix));
        if !ends_in_call {
            return Err(self.unexpected());
        }
        Ok(self.finish(Rule::NewInstance, vec![target], start))
    }

    // ----- types -----

    fn parse_type(&mut self) -> ParseResult<SyntaxNode> {
        self.enter()?;
        let ty = self.parse_type_inner();
        self.leave();
        ty
    }

    fn parse_type_inner(&mut self) -> ParseResult<SyntaxNode> {
        self.note_expected(TYPE_STARTS);
        let start = self.peek().span;
        match self.peek_kind() {
            TokenKind::Quote => {
                self.advance();
                let name = self.expect(TokenKind::Ident)?;
                self.expect(TokenKind::Quote)?;
                Ok(self.finish(Rule::ForwardRef, vec![name.into()], start))
            }
            TokenKind::Ninguno => {
                let none = self.advance();
                Ok(self.finish(Rule::BasicType, vec![none.into()], start))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut types = Vec::new();
                while !self.check(TokenKind::RBracket) {
                    types.push(self.parse_type()?);
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(self.finish(Rule::TypeList, types, start))
            }
            TokenKind::Ident => {
                let text = self.peek().text.clone();
                if self.grammar.type_name(&text).is_some() {
                    let mut children = vec![self.advance().into()];
                    if self.check(TokenKind::LBracket) {
                        children.push(self.parse_type_arguments()?);
                    }
                    return Ok(self.finish(Rule::CollectionType, children, start));
                }
                if text == "Union" {
                    self.advance();
                    let args = self.parse_type_arguments()?;
                    return Ok(self.finish(Rule::UnionType, vec![args], start));
                }
                let mut children = vec![self.parse_dotted_name()?];
                if self.check(TokenKind::LBracket) {
                    children.push(self.parse_type_arguments()?);
                }
                Ok(self.finish(Rule::BasicType, children, start))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_type_arguments(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.expect(TokenKind::LBracket)?.span;
        let mut args = Vec::new();
        loop {
            if let Some(ellipsis) = self.eat(TokenKind::Ellipsis) {
                args.push(ellipsis.into());
            } else {
                args.push(self.parse_type()?);
            }
            if self.eat(TokenKind::Comma).is_none() || self.check(TokenKind::RBracket) {
                break;
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(self.finish(Rule::TypeArguments, args, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::build_grammar;
    use crate::lexer::Lexer;

    fn parse_with(source: &str, limit: usize) -> ParseResult<SyntaxNode> {
        let grammar = build_grammar();
        let tokens = Lexer::new(&grammar, source).tokenize()?;
        Parser::new(&grammar, source, tokens)
            .with_max_nesting(limit)
            .parse_module()
    }

    fn parse(source: &str) -> SyntaxNode {
        parse_with(source, DEFAULT_MAX_NESTING).unwrap()
    }

    fn first_stmt(source: &str) -> SyntaxNode {
        let module = parse(source);
        module.as_node().unwrap().children[0].clone()
    }

    fn expr_of(source: &str) -> SyntaxNode {
        let stmt = first_stmt(source);
        assert!(stmt.is_rule(Rule::ExprStmt), "{}", stmt.dump());
        stmt.as_node().unwrap().children[0].clone()
    }

    #[test]
    fn subtraction_chain_is_flat_and_left_to_right() {
        let expr = expr_of("a - b - c;");
        assert_eq!(expr.dump(), "additive_expr\n  IDENT \"a\"\n  MINUS \"-\"\n  IDENT \"b\"\n  MINUS \"-\"\n  IDENT \"c\"\n");
    }

    #[test]
    fn tighter_tier_nests_inside_looser() {
        let expr = expr_of("a + b * c;");
        let node = expr.as_node().unwrap();
        assert_eq!(node.rule, Rule::Additive);
        assert!(node.children[2].is_rule(Rule::Multiplicative));
    }

    #[test]
    fn power_chain_stays_flat() {
        let expr = expr_of("a ** -b ** c;");
        let node = expr.as_node().unwrap();
        assert_eq!(node.rule, Rule::Power);
        assert_eq!(node.children.len(), 5);
        assert!(node.children[2].is_rule(Rule::Unary));
    }

    #[test]
    fn trailing_comma_is_kept_in_paren() {
        let single = expr_of("(x,);");
        assert_eq!(single.as_node().unwrap().children.len(), 2);
        let grouped = expr_of("(x);");
        assert_eq!(grouped.as_node().unwrap().children.len(), 1);
    }

    #[test]
    fn bare_sequence_assignment() {
        let stmt = first_stmt("a, b = b, a;");
        let node = stmt.as_node().unwrap();
        assert_eq!(node.rule, Rule::UnpackAssignment);
        assert!(node.children[0].is_rule(Rule::UnpackTarget));
        assert!(node.children[1].is_rule(Rule::ExprList));
    }

    #[test]
    fn annotated_attribute() {
        let stmt = first_stmt("edad: int = 3;");
        assert!(stmt.is_rule(Rule::ClassAttribute));
    }

    #[test]
    fn keyword_argument_needs_bare_name() {
        let expr = expr_of("f(a, b=1, *c, **d);");
        let call = &expr.as_node().unwrap().children[1];
        let args = &call.as_node().unwrap().children[0];
        let kinds: Vec<_> = args
            .as_node()
            .unwrap()
            .children
            .iter()
            .map(SyntaxNode::label)
            .collect();
        assert_eq!(kinds, vec!["IDENT", "keyword_argument", "star_arg", "double_star_arg"]);
    }

    #[test]
    fn slice_keeps_colons_in_place() {
        let expr = expr_of("a[::2];");
        let index = &expr.as_node().unwrap().children[1];
        let slice = &index.as_node().unwrap().children[0];
        let labels: Vec<_> = slice.as_node().unwrap().children.iter().map(SyntaxNode::label).collect();
        assert_eq!(labels, vec!["COLON", "COLON", "INT"]);
    }

    #[test]
    fn condition_requires_parentheses() {
        let err = parse_with("si verdadero { pasar; }", DEFAULT_MAX_NESTING).unwrap_err();
        assert_eq!(err.reason, SyntaxReason::UnexpectedToken);
        assert_eq!(err.found, "VERDADERO_KW");
        assert_eq!((err.line, err.col), (1, 4));
        assert_eq!(err.expected, vec!["LPAR"]);
    }

    #[test]
    fn missing_operand_lists_expression_starts() {
        let err = parse_with("let x = ;", DEFAULT_MAX_NESTING).unwrap_err();
        assert_eq!(err.found, "SEMICOLON");
        for name in ["IDENT", "INT", "LAMBDA_KW", "LPAR", "MINUS", "NO_OP", "NUEVA_KW"] {
            assert!(err.expected.iter().any(|e| e == name), "{name} in {:?}", err.expected);
        }
        let mut sorted = err.expected.clone();
        sorted.sort();
        assert_eq!(sorted, err.expected);
    }

    #[test]
    fn try_needs_a_handler() {
        let err = parse_with("intentar { pasar; } x = 1;", DEFAULT_MAX_NESTING).unwrap_err();
        assert!(err.expected.contains(&"CATCH_KW".to_string()));
        assert!(err.expected.contains(&"FINALLY_KW".to_string()));
    }

    #[test]
    fn nueva_requires_a_call() {
        let err = parse_with("x = nueva Punto;", DEFAULT_MAX_NESTING).unwrap_err();
        assert_eq!(err.found, "SEMICOLON");
        assert!(err.expected.contains(&"LPAR".to_string()));
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let source = format!("x = {}1{};", "(".repeat(10), ")".repeat(10));
        assert!(parse_with(&source, 16).is_ok());
        let err = parse_with(&source, 8).unwrap_err();
        assert_eq!(err.reason, SyntaxReason::NestingTooDeep { limit: 8 });
    }

    #[test]
    fn long_comprehension_chains_stay_flat() {
        let source = format!("x = [a {}];", "para a en b ".repeat(5000));
        let tree = parse_with(&source, DEFAULT_MAX_NESTING).unwrap();
        let single = parse_with("x = [a para a en b];", DEFAULT_MAX_NESTING).unwrap();
        assert_eq!(tree.depth(), single.depth());
        let dump = tree.dump();
        assert_eq!(dump.matches("comprehension_for").count(), 5000);
    }

    #[test]
    fn unclosed_block_reports_end_of_input() {
        let err = parse_with("si (x) { pasar;", DEFAULT_MAX_NESTING).unwrap_err();
        assert_eq!(err.found, "$END");
        assert!(err.expected.contains(&"RBRACE".to_string()));
    }
}
