// lang/src/transformer/expressions.rs
use crate::error::{StructuralError, StructuralKind, TranslationError};
use crate::grammar::Rule;
use crate::token::{Token, TokenKind};
use crate::tree::{Node, SyntaxNode};

use super::{docstring, expect_rule, expect_token, TransformResult, Transformer};

impl Transformer<'_> {
    pub(super) fn expr(&self, node: &SyntaxNode) -> TransformResult<String> {
        let node = match node {
            SyntaxNode::Token(token) => return atom(token),
            SyntaxNode::Node(node) => node,
        };
        match node.rule {
            Rule::BoolOr
            | Rule::BoolAnd
            | Rule::Comparison
            | Rule::BitOr
            | Rule::BitXor
            | Rule::BitAnd
            | Rule::Shift
            | Rule::Additive
            | Rule::Multiplicative
            | Rule::Power => self.chain(node),
            Rule::NotExpr | Rule::Unary => self.prefix(node),
            Rule::Ternary => match node.children.as_slice() {
                [cond, then, otherwise] => Ok(format!(
                    "{} if {} else {}",
                    self.expr(then)?,
                    self.expr(cond)?,
                    self.expr(otherwise)?
                )),
                _ => Err(TranslationError::shape(node.rule, "se esperaban tres partes")),
            },
            Rule::Lambda => self.lambda(node),
            Rule::Access => self.access(node),
            Rule::ParenOrTuple => self.paren_or_tuple(node),
            Rule::ListLiteral => Ok(format!("[{}]", self.join_exprs(&node.children)?)),
            Rule::SetLiteral => Ok(format!("{{{}}}", self.join_exprs(&node.children)?)),
            Rule::DictLiteral => Ok(format!("{{{}}}", self.join_exprs(&node.children)?)),
            Rule::KeyValue => match node.children.as_slice() {
                [key, value] => Ok(format!("{}: {}", self.expr(key)?, self.expr(value)?)),
                _ => Err(TranslationError::shape(node.rule, "se esperaba clave y valor")),
            },
            Rule::ListComp => self.comprehension(node, "[", "]"),
            Rule::SetComp | Rule::DictComp => self.comprehension(node, "{", "}"),
            Rule::GeneratorExpr => self.comprehension(node, "(", ")"),
            Rule::NewInstance => match node.children.as_slice() {
                [call] => self.expr(call),
                _ => Err(TranslationError::shape(node.rule, "se esperaba una llamada")),
            },
            Rule::ExprList => self.expr_sequence(&node.children),
            Rule::Module
            | Rule::Block
            | Rule::ClassBody
            | Rule::Decorator
            | Rule::FuncDef
            | Rule::ParameterList
            | Rule::PosParam
            | Rule::DefaultParam
            | Rule::StarParam
            | Rule::DoubleStarParam
            | Rule::ReturnType
            | Rule::TypeHint
            | Rule::ClassDef
            | Rule::BaseList
            | Rule::ClassAttribute
            | Rule::LetDecl
            | Rule::Assignment
            | Rule::UnpackAssignment
            | Rule::UnpackTarget
            | Rule::AugmentedAssignment
            | Rule::ExprStmt
            | Rule::PrintStmt
            | Rule::PlotStmt
            | Rule::ImportStmt
            | Rule::FromImport
            | Rule::DottedName
            | Rule::ImportedNames
            | Rule::ImportedName
            | Rule::IfStmt
            | Rule::ElifClause
            | Rule::ElseClause
            | Rule::ForStmt
            | Rule::ForTarget
            | Rule::WhileStmt
            | Rule::TryStmt
            | Rule::ExceptClause
            | Rule::FinallyClause
            | Rule::WithStmt
            | Rule::ReturnStmt
            | Rule::BreakStmt
            | Rule::ContinueStmt
            | Rule::PassStmt
            | Rule::AttributeSuffix
            | Rule::IndexSuffix
            | Rule::CallSuffix
            | Rule::Slice
            | Rule::ArgumentList
            | Rule::KeywordArgument
            | Rule::StarArg
            | Rule::DoubleStarArg
            | Rule::CompFor
            | Rule::CompIf
            | Rule::BasicType
            | Rule::CollectionType
            | Rule::UnionType
            | Rule::ForwardRef
            | Rule::TypeArguments
            | Rule::TypeList => Err(TranslationError::MissingRule {
                rule: node.rule,
                context: "expresión",
            }),
        }
    }

    pub(super) fn join_exprs(&self, items: &[SyntaxNode]) -> TransformResult<String> {
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            parts.push(self.expr(item)?);
        }
        Ok(parts.join(", "))
    }

    /// `a, b` with a trailing comma kept when the source had one.
    pub(super) fn expr_sequence(&self, items: &[SyntaxNode]) -> TransformResult<String> {
        let (items, trailing) = match items.split_last() {
            Some((last, rest)) if last.is_token(TokenKind::Comma) => (rest, true),
            _ => (items, false),
        };
        let mut out = self.join_exprs(items)?;
        if trailing {
            out.push(',');
        }
        Ok(out)
    }

    /// `operand (op operand)*`, rendered left to right with single spaces.
    fn chain(&self, node: &Node) -> TransformResult<String> {
        let Some((first, rest)) = node.children.split_first() else {
            return Err(TranslationError::shape(node.rule, "cadena vacía"));
        };
        if rest.len() % 2 != 0 {
            return Err(TranslationError::shape(node.rule, "operador sin operando"));
        }
        let mut out = self.expr(first)?;
        for pair in rest.chunks(2) {
            let op = match &pair[0] {
                SyntaxNode::Token(op) => operator(op),
                other => {
                    return Err(TranslationError::shape(
                        node.rule,
                        format!("se esperaba un operador y se encontró '{}'", other.label()),
                    ))
                }
            };
            out = format!("{out} {op} {}", self.expr(&pair[1])?);
        }
        Ok(out)
    }

    fn prefix(&self, node: &Node) -> TransformResult<String> {
        match node.children.as_slice() {
            [SyntaxNode::Token(op), operand] => {
                let operand = self.expr(operand)?;
                Ok(match op.kind {
                    TokenKind::No => format!("not {operand}"),
                    _ => format!("{}{operand}", op.text),
                })
            }
            _ => Err(TranslationError::shape(node.rule, "se esperaba operador y operando")),
        }
    }

    fn lambda(&self, node: &Node) -> TransformResult<String> {
        let [params, body] = node.children.as_slice() else {
            return Err(TranslationError::shape(node.rule, "se esperaban parámetros y cuerpo"));
        };
        let params = self.parameters(expect_rule(params, Rule::ParameterList)?)?;
        let body = self.expr(body)?;
        if params.is_empty() {
            return Ok(format!("lambda: {body}"));
        }
        let rendered: Vec<&str> = params.iter().map(|param| param.text.as_str()).collect();
        Ok(format!("lambda {}: {body}", rendered.join(", ")))
    }

    fn access(&self, node: &Node) -> TransformResult<String> {
        let Some((primary, suffixes)) = node.children.split_first() else {
            return Err(TranslationError::shape(node.rule, "acceso vacío"));
        };
        let mut out = self.expr(primary)?;
        for suffix in suffixes {
            let suffix = match suffix {
                SyntaxNode::Node(suffix) => suffix,
                SyntaxNode::Token(_) => {
                    return Err(TranslationError::shape(node.rule, "sufijo sin nodo"))
                }
            };
            match (suffix.rule, suffix.children.as_slice()) {
                (Rule::AttributeSuffix, [name]) => {
                    out.push('.');
                    out.push_str(&expect_token(name, TokenKind::Ident, suffix.rule)?.text);
                }
                (Rule::IndexSuffix, items) if !items.is_empty() => {
                    let mut parts = Vec::with_capacity(items.len());
                    for item in items {
                        parts.push(self.subscript(item)?);
                    }
                    out.push('[');
                    out.push_str(&parts.join(", "));
                    out.push(']');
                }
                (Rule::CallSuffix, [args]) => {
                    out.push('(');
                    out.push_str(&self.arguments(args)?);
                    out.push(')');
                }
                (rule, _) => return Err(TranslationError::shape(rule, "sufijo inesperado")),
            }
        }
        Ok(out)
    }

    /// One index item; slices keep their parts and colons in source order.
    fn subscript(&self, item: &SyntaxNode) -> TransformResult<String> {
        match item {
            SyntaxNode::Node(slice) if slice.rule == Rule::Slice => {
                let mut out = String::new();
                for part in &slice.children {
                    if part.is_token(TokenKind::Colon) {
                        out.push(':');
                    } else {
                        out.push_str(&self.expr(part)?);
                    }
                }
                Ok(out)
            }
            other => self.expr(other),
        }
    }

    /// Call arguments in the only accepted order: positional, `*args`,
    /// keyword arguments, `**kwargs`.
    pub(super) fn arguments(&self, args: &SyntaxNode) -> TransformResult<String> {
        let list = expect_rule(args, Rule::ArgumentList)?;
        let mut parts = Vec::with_capacity(list.children.len());
        let mut seen_star = false;
        let mut seen_keyword = false;
        let mut seen_double_star = false;

        for arg in &list.children {
            let rendered = match arg {
                SyntaxNode::Node(node) if node.rule == Rule::StarArg => {
                    let text = format!("*{}", self.single_child(node)?);
                    if seen_double_star {
                        return Err(argument_order("*args aparece después de **kwargs.", text));
                    }
                    if seen_keyword {
                        return Err(argument_order(
                            "*args aparece después de un argumento por nombre en la llamada.",
                            text,
                        ));
                    }
                    if seen_star {
                        return Err(duplicate_unpack("Múltiples *args en la llamada.", text));
                    }
                    seen_star = true;
                    text
                }
                SyntaxNode::Node(node) if node.rule == Rule::KeywordArgument => {
                    let text = match node.children.as_slice() {
                        [name, value] => format!(
                            "{}={}",
                            expect_token(name, TokenKind::Ident, node.rule)?.text,
                            self.expr(value)?
                        ),
                        _ => return Err(TranslationError::shape(node.rule, "se esperaba nombre y valor")),
                    };
                    if seen_double_star {
                        return Err(argument_order(
                            "Argumento por nombre aparece después de **kwargs en la llamada.",
                            text,
                        ));
                    }
                    seen_keyword = true;
                    text
                }
                SyntaxNode::Node(node) if node.rule == Rule::DoubleStarArg => {
                    let text = format!("**{}", self.single_child(node)?);
                    if seen_double_star {
                        return Err(duplicate_unpack("Múltiples **kwargs en la llamada.", text));
                    }
                    seen_double_star = true;
                    text
                }
                positional => {
                    let text = self.expr(positional)?;
                    if seen_star || seen_keyword || seen_double_star {
                        return Err(argument_order(
                            "Argumento posicional aparece después de *args, argumentos por nombre, o **kwargs en la llamada.",
                            text,
                        ));
                    }
                    text
                }
            };
            parts.push(rendered);
        }
        Ok(parts.join(", "))
    }

    fn single_child(&self, node: &Node) -> TransformResult<String> {
        match node.children.as_slice() {
            [value] => self.expr(value),
            _ => Err(TranslationError::shape(node.rule, "se esperaba una expresión")),
        }
    }

    fn paren_or_tuple(&self, node: &Node) -> TransformResult<String> {
        let (items, trailing) = match node.children.split_last() {
            Some((last, rest)) if last.is_token(TokenKind::Comma) => (rest, true),
            _ => (node.children.as_slice(), false),
        };
        let inner = self.join_exprs(items)?;
        Ok(if trailing {
            format!("({inner},)")
        } else {
            format!("({inner})")
        })
    }

    fn comprehension(&self, node: &Node, open: &str, close: &str) -> TransformResult<String> {
        match node.children.as_slice() {
            [element, clauses @ ..] if !clauses.is_empty() => {
                let mut out = format!("{open}{}", self.expr(element)?);
                for clause in clauses {
                    out.push(' ');
                    out.push_str(&self.comp_for(clause)?);
                }
                out.push_str(close);
                Ok(out)
            }
            _ => Err(TranslationError::shape(node.rule, "se esperaba elemento y cláusula para")),
        }
    }

    fn comp_for(&self, clause: &SyntaxNode) -> TransformResult<String> {
        let node = expect_rule(clause, Rule::CompFor)?;
        let mut out = match node.children.as_slice() {
            [target, iterable] | [target, iterable, _] => {
                format!("for {} in {}", self.for_target(target)?, self.expr(iterable)?)
            }
            _ => return Err(TranslationError::shape(node.rule, "se esperaba objetivo e iterable")),
        };
        if let [_, _, cond] = node.children.as_slice() {
            out.push_str(" if ");
            out.push_str(&self.single_child(expect_rule(cond, Rule::CompIf)?)?);
        }
        Ok(out)
    }

    pub(super) fn for_target(&self, target: &SyntaxNode) -> TransformResult<String> {
        let node = expect_rule(target, Rule::ForTarget)?;
        let mut names = Vec::with_capacity(node.children.len());
        for name in &node.children {
            names.push(expect_token(name, TokenKind::Ident, node.rule)?.text.as_str());
        }
        Ok(names.join(", "))
    }
}

/// Leaf tokens: literals verbatim, constants and keywords mapped.
fn atom(token: &Token) -> TransformResult<String> {
    match token.kind {
        TokenKind::Ident
        | TokenKind::Int
        | TokenKind::Float
        | TokenKind::Imaginary
        | TokenKind::Complex
        | TokenKind::Str => Ok(token.text.clone()),
        TokenKind::Docstring => Ok(docstring(&token.text)),
        TokenKind::Verdadero => Ok("True".to_string()),
        TokenKind::Falso => Ok("False".to_string()),
        TokenKind::Ninguno => Ok("None".to_string()),
        other => Err(TranslationError::InternalType {
            rule: "primary",
            detail: format!("token '{}' en posición de expresión", other.category()),
        }),
    }
}

fn operator(token: &Token) -> &str {
    match token.kind {
        TokenKind::Y => "and",
        TokenKind::O => "or",
        TokenKind::No => "not",
        TokenKind::En => "in",
        TokenKind::NoEn => "not in",
        TokenKind::Es => "is",
        TokenKind::EsNo => "is not",
        _ => &token.text,
    }
}

fn argument_order(message: &str, construct: String) -> TranslationError {
    StructuralError::new(StructuralKind::ArgumentOrder, message, construct).into()
}

fn duplicate_unpack(message: &str, construct: String) -> TranslationError {
    StructuralError::new(StructuralKind::DuplicateUnpackedArgument, message, construct).into()
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body, structural};
    use crate::error::StructuralKind;

    #[test]
    fn subtraction_renders_left_to_right() {
        assert_eq!(body("x = a - b - c;"), "x = a - b - c");
        assert_eq!(body("x = a - (b - c);"), "x = a - (b - c)");
    }

    #[test]
    fn word_operators() {
        assert_eq!(
            body("x = a y no b o c no en d;"),
            "x = a and not b or c not in d"
        );
        assert_eq!(body("x = a es no ninguno;"), "x = a is not None");
        assert_eq!(body("x = -a ** ~b;"), "x = -a ** ~b");
    }

    #[test]
    fn paren_versus_tuple() {
        assert_eq!(body("x = (y);"), "x = (y)");
        assert_eq!(body("x = (y,);"), "x = (y,)");
        assert_eq!(body("x = (y, z);"), "x = (y, z)");
        assert_eq!(body("x = ();"), "x = ()");
    }

    #[test]
    fn literals_are_verbatim() {
        assert_eq!(
            body("x = [1, 2.50, 1e10, 3j, 3+4j, \"a\\n\"];"),
            "x = [1, 2.50, 1e10, 3j, 3+4j, \"a\\n\"]"
        );
        assert_eq!(body("x = {verdadero, falso};"), "x = {True, False}");
    }

    #[test]
    fn slices_and_subscripts() {
        assert_eq!(body("y = a[1:2];"), "y = a[1:2]");
        assert_eq!(body("y = a[::2];"), "y = a[::2]");
        assert_eq!(body("y = a[:];"), "y = a[:]");
        assert_eq!(body("y = m[0, 1:];"), "y = m[0, 1:]");
    }

    #[test]
    fn ternary_lambda_and_new() {
        assert_eq!(body("x = c ? a : b;"), "x = a if c else b");
        assert_eq!(body("f = lambda: 0;"), "f = lambda: 0");
        assert_eq!(body("f = lambda x, y = 1: x + y;"), "f = lambda x, y = 1: x + y");
        assert_eq!(body("p = nueva Punto(1, y=2);"), "p = Punto(1, y=2)");
    }

    #[test]
    fn comprehensions() {
        assert_eq!(
            body("xs = [x * 2 para x en rango si x > 1];"),
            "xs = [x * 2 for x in rango if x > 1]"
        );
        assert_eq!(body("d = {k: v para k, v en items()};"), "d = {k: v for k, v in items()}");
        assert_eq!(body("s = {x para x en a para y en b};"), "s = {x for x in a for y in b}");
        assert_eq!(body("g = sum((x para x en a));"), "g = sum((x for x in a))");
        assert_eq!(body("d = {\"a\": 1, \"b\": 2};"), "d = {\"a\": 1, \"b\": 2}");
        assert_eq!(body("d = {};"), "d = {}");
    }

    #[test]
    fn chained_clauses_render_in_order() {
        assert_eq!(
            body("p = [(x, y) para x en a si x para y en b si y > x];"),
            "p = [(x, y) for x in a if x for y in b if y > x]"
        );
        let source = format!("x = [a {}];", "para a en b ".repeat(3000));
        let out = body(&source);
        assert_eq!(out.matches(" for a in b").count(), 3000);
    }

    #[test]
    fn argument_order_accepted() {
        assert_eq!(body("f(a, *b, c=1, **d);"), "f(a, *b, c=1, **d)");
    }

    #[test]
    fn argument_order_violations() {
        let err = structural("f(a=1, b);");
        assert_eq!(err.kind, StructuralKind::ArgumentOrder);
        assert_eq!(err.construct, "b");
        assert_eq!(structural("f(**k, *a);").kind, StructuralKind::ArgumentOrder);
        assert_eq!(structural("f(a=1, *b);").kind, StructuralKind::ArgumentOrder);
        assert_eq!(structural("f(**k, a=1);").kind, StructuralKind::ArgumentOrder);
        assert_eq!(structural("f(*a, *b);").kind, StructuralKind::DuplicateUnpackedArgument);
        assert_eq!(structural("f(**a, **b);").kind, StructuralKind::DuplicateUnpackedArgument);
        assert_eq!(structural("imprimir(*a, b);").kind, StructuralKind::ArgumentOrder);
    }
}
