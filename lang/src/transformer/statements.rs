// lang/src/transformer/statements.rs
use crate::error::{StructuralError, StructuralKind, TranslationError};
use crate::grammar::Rule;
use crate::token::TokenKind;
use crate::tree::{Node, SyntaxNode};

use super::{docstring, expect_rule, expect_token, Fragment, Scope, ScopeKind, TransformResult, Transformer};

const CONSTRUCTOR: &str = "iniciar";
const INITIALIZER: &str = "__init__";

impl Transformer<'_> {
    pub(super) fn statement(&self, item: &SyntaxNode, scope: &Scope) -> TransformResult<Fragment> {
        let node = match item {
            SyntaxNode::Token(token) if token.kind == TokenKind::Docstring => {
                return Ok(Fragment::Line(docstring(&token.text)));
            }
            SyntaxNode::Token(token) => {
                return Err(TranslationError::InternalType {
                    rule: "statement",
                    detail: format!("token suelto '{}'", token.kind.category()),
                });
            }
            SyntaxNode::Node(node) => node,
        };

        let line = match node.rule {
            Rule::FuncDef => return self.func_def(node, scope),
            Rule::ClassDef => return self.class_def(node, scope),
            Rule::IfStmt => return self.if_stmt(node, scope),
            Rule::WhileStmt => return self.while_stmt(node, scope),
            Rule::ForStmt => return self.for_stmt(node, scope),
            Rule::TryStmt => return self.try_stmt(node, scope),
            Rule::WithStmt => return self.with_stmt(node, scope),
            Rule::PlotStmt => return self.plot_stmt(node),
            Rule::ClassAttribute => self.class_attribute(node)?,
            Rule::LetDecl => self.let_decl(node)?,
            Rule::Assignment => self.assignment(node)?,
            Rule::UnpackAssignment => self.unpack_assignment(node)?,
            Rule::AugmentedAssignment => self.augmented_assignment(node)?,
            Rule::ExprStmt => match node.children.as_slice() {
                [expr] => self.expr(expr)?,
                _ => return Err(TranslationError::shape(node.rule, "se esperaba una expresión")),
            },
            Rule::PrintStmt => match node.children.as_slice() {
                [args] => format!("print({})", self.arguments(args)?),
                _ => return Err(TranslationError::shape(node.rule, "faltan argumentos")),
            },
            Rule::ImportStmt => self.import_stmt(node)?,
            Rule::FromImport => self.from_import(node)?,
            Rule::ReturnStmt => self.return_stmt(node)?,
            Rule::BreakStmt => "break".to_string(),
            Rule::ContinueStmt => "continue".to_string(),
            Rule::PassStmt => "pass".to_string(),
            Rule::Module
            | Rule::Block
            | Rule::ClassBody
            | Rule::Decorator
            | Rule::ParameterList
            | Rule::PosParam
            | Rule::DefaultParam
            | Rule::StarParam
            | Rule::DoubleStarParam
            | Rule::ReturnType
            | Rule::TypeHint
            | Rule::BaseList
            | Rule::UnpackTarget
            | Rule::DottedName
            | Rule::ImportedNames
            | Rule::ImportedName
            | Rule::ElifClause
            | Rule::ElseClause
            | Rule::ForTarget
            | Rule::ExceptClause
            | Rule::FinallyClause
            | Rule::Lambda
            | Rule::Ternary
            | Rule::BoolOr
            | Rule::BoolAnd
            | Rule::NotExpr
            | Rule::Comparison
            | Rule::BitOr
            | Rule::BitXor
            | Rule::BitAnd
            | Rule::Shift
            | Rule::Additive
            | Rule::Multiplicative
            | Rule::Unary
            | Rule::Power
            | Rule::Access
            | Rule::AttributeSuffix
            | Rule::IndexSuffix
            | Rule::CallSuffix
            | Rule::Slice
            | Rule::ArgumentList
            | Rule::KeywordArgument
            | Rule::StarArg
            | Rule::DoubleStarArg
            | Rule::ParenOrTuple
            | Rule::ListLiteral
            | Rule::DictLiteral
            | Rule::KeyValue
            | Rule::SetLiteral
            | Rule::ListComp
            | Rule::DictComp
            | Rule::SetComp
            | Rule::GeneratorExpr
            | Rule::CompFor
            | Rule::CompIf
            | Rule::NewInstance
            | Rule::ExprList
            | Rule::BasicType
            | Rule::CollectionType
            | Rule::UnionType
            | Rule::ForwardRef
            | Rule::TypeArguments
            | Rule::TypeList => {
                return Err(TranslationError::MissingRule {
                    rule: node.rule,
                    context: "sentencia",
                })
            }
        };
        Ok(Fragment::Line(line))
    }

    // ----- definitions -----

    fn func_def(&self, node: &Node, scope: &Scope) -> TransformResult<Fragment> {
        let (name, params, return_type, block) = match node.children.as_slice() {
            [name, params, block] => (name, params, None, block),
            [name, params, ret, block] => (name, params, Some(ret), block),
            _ => return Err(TranslationError::shape(node.rule, "forma de función inesperada")),
        };
        let name = &expect_token(name, TokenKind::Ident, node.rule)?.text;
        let mut params = self.parameters(expect_rule(params, Rule::ParameterList)?)?;

        let name = if name == CONSTRUCTOR && scope.kind() == ScopeKind::ClassBody {
            constructor_params(&mut params)?;
            INITIALIZER
        } else {
            name.as_str()
        };

        let ret = match return_type {
            Some(ret) => format!(" -> {}", self.type_expr(ret)?),
            None => String::new(),
        };
        let rendered: Vec<&str> = params.iter().map(|param| param.text.as_str()).collect();
        let mut lines = vec![format!("def {name}({}){ret}:", rendered.join(", "))];
        lines.extend(self.body(block, ScopeKind::Block, scope)?);
        Ok(Fragment::Block(lines))
    }

    /// Renders and validates a parameter list: no plain parameter after a
    /// defaulted one (until `*`), one `*name`, one `**name`, nothing after `**name`.
    pub(super) fn parameters(&self, list: &Node) -> TransformResult<Vec<Param>> {
        let mut params = Vec::with_capacity(list.children.len());
        let mut seen_default = false;
        let mut seen_star = false;
        let mut double_star: Option<String> = None;

        for child in &list.children {
            let param = self.parameter(child)?;
            if let Some(kwargs) = &double_star {
                return Err(parameter_order(
                    format!("El parámetro '{}' aparece después de **{kwargs}.", param.name),
                    &param.text,
                ));
            }
            match param.rule {
                Rule::PosParam if seen_default && !seen_star => {
                    return Err(parameter_order(
                        format!(
                            "Parámetro sin valor por defecto '{}' aparece después de un parámetro con valor por defecto.",
                            param.name
                        ),
                        &param.text,
                    ));
                }
                Rule::DefaultParam => seen_default = true,
                Rule::StarParam if seen_star => {
                    return Err(parameter_order(
                        "Múltiples parámetros *args en la definición.".to_string(),
                        &param.text,
                    ));
                }
                Rule::StarParam => seen_star = true,
                Rule::DoubleStarParam => double_star = Some(param.name.clone()),
                _ => {}
            }
            params.push(param);
        }
        Ok(params)
    }

    fn parameter(&self, child: &SyntaxNode) -> TransformResult<Param> {
        let node = match child {
            SyntaxNode::Node(node) => node,
            SyntaxNode::Token(_) => {
                return Err(TranslationError::shape(Rule::ParameterList, "parámetro sin nodo"))
            }
        };
        let name = match node.children.first() {
            Some(name) => expect_token(name, TokenKind::Ident, node.rule)?.text.clone(),
            None => return Err(TranslationError::shape(node.rule, "parámetro sin nombre")),
        };
        let text = match (node.rule, &node.children[1..]) {
            (Rule::PosParam, []) => name.clone(),
            (Rule::PosParam, [hint]) => format!("{name}: {}", self.type_expr(hint)?),
            (Rule::DefaultParam, [value]) => format!("{name} = {}", self.expr(value)?),
            (Rule::DefaultParam, [hint, value]) => {
                format!("{name}: {} = {}", self.type_expr(hint)?, self.expr(value)?)
            }
            (Rule::StarParam, []) => format!("*{name}"),
            (Rule::DoubleStarParam, []) => format!("**{name}"),
            (rule, _) => return Err(TranslationError::shape(rule, "forma de parámetro inesperada")),
        };
        Ok(Param {
            rule: node.rule,
            name,
            text,
        })
    }

    fn class_def(&self, node: &Node, scope: &Scope) -> TransformResult<Fragment> {
        let (name, bases, body) = match node.children.as_slice() {
            [name, body] => (name, None, body),
            [name, bases, body] => (name, Some(bases), body),
            _ => return Err(TranslationError::shape(node.rule, "forma de clase inesperada")),
        };
        let name = &expect_token(name, TokenKind::Ident, node.rule)?.text;
        let bases = match bases {
            Some(bases) => {
                let list = expect_rule(bases, Rule::BaseList)?;
                format!("({})", self.join_exprs(&list.children)?)
            }
            None => String::new(),
        };
        let mut lines = vec![format!("class {name}{bases}:")];
        lines.extend(self.body(body, ScopeKind::ClassBody, scope)?);
        Ok(Fragment::Block(lines))
    }

    fn class_attribute(&self, node: &Node) -> TransformResult<String> {
        match node.children.as_slice() {
            [name, hint] => Ok(format!(
                "{}: {}",
                expect_token(name, TokenKind::Ident, node.rule)?.text,
                self.type_expr(hint)?
            )),
            [name, hint, value] => Ok(format!(
                "{}: {} = {}",
                expect_token(name, TokenKind::Ident, node.rule)?.text,
                self.type_expr(hint)?,
                self.expr(value)?
            )),
            _ => Err(TranslationError::shape(node.rule, "forma de atributo inesperada")),
        }
    }

    // ----- simple statements -----

    fn let_decl(&self, node: &Node) -> TransformResult<String> {
        let Some((name, rest)) = node.children.split_first() else {
            return Err(TranslationError::shape(node.rule, "declaración vacía"));
        };
        let name = &expect_token(name, TokenKind::Ident, node.rule)?.text;
        match rest {
            [] => Ok(format!("{name} = None")),
            [hint] if hint.is_rule(Rule::TypeHint) => Ok(format!("{name}: {}", self.type_expr(hint)?)),
            [value] => Ok(format!("{name} = {}", self.expr(value)?)),
            [hint, value] => Ok(format!(
                "{name}: {} = {}",
                self.type_expr(hint)?,
                self.expr(value)?
            )),
            _ => Err(TranslationError::shape(node.rule, "forma de declaración inesperada")),
        }
    }

    fn assignment(&self, node: &Node) -> TransformResult<String> {
        match node.children.as_slice() {
            [target, value] => Ok(format!(
                "{} = {}",
                self.simple_target(target)?,
                self.expr(value)?
            )),
            _ => Err(TranslationError::shape(node.rule, "se esperaba destino y valor")),
        }
    }

    fn augmented_assignment(&self, node: &Node) -> TransformResult<String> {
        match node.children.as_slice() {
            [target, SyntaxNode::Token(op), value] if op.kind.is_augmented_assign() => Ok(format!(
                "{} {} {}",
                self.simple_target(target)?,
                op.text,
                self.expr(value)?
            )),
            _ => Err(TranslationError::shape(node.rule, "se esperaba destino, operador y valor")),
        }
    }

    fn unpack_assignment(&self, node: &Node) -> TransformResult<String> {
        let [target, value] = node.children.as_slice() else {
            return Err(TranslationError::shape(node.rule, "se esperaba destino y valor"));
        };
        let target = match target {
            SyntaxNode::Node(list) if list.rule == Rule::UnpackTarget => {
                self.unpack_sequence(&list.children)?
            }
            other => {
                self.check_unpack_target(other)?;
                self.expr(other)?
            }
        };
        Ok(format!("{target} = {}", self.expr(value)?))
    }

    /// `a, (b, c), d[0],` as written, after validating every element.
    fn unpack_sequence(&self, items: &[SyntaxNode]) -> TransformResult<String> {
        let mut parts = Vec::with_capacity(items.len());
        let mut trailing = false;
        for item in items {
            if item.is_token(TokenKind::Comma) {
                trailing = true;
                continue;
            }
            self.check_unpack_target(item)?;
            parts.push(self.expr(item)?);
        }
        let mut out = parts.join(", ");
        if trailing {
            out.push(',');
        }
        Ok(out)
    }

    fn check_unpack_target(&self, target: &SyntaxNode) -> TransformResult<()> {
        if is_store_target(target) {
            return Ok(());
        }
        if let SyntaxNode::Node(group) = target {
            if matches!(group.rule, Rule::ParenOrTuple | Rule::ListLiteral) && !group.children.is_empty() {
                for item in &group.children {
                    if !item.is_token(TokenKind::Comma) {
                        self.check_unpack_target(item)?;
                    }
                }
                return Ok(());
            }
        }
        let text = self.expr(target).unwrap_or_else(|_| target.label().to_string());
        Err(StructuralError::new(
            StructuralKind::InvalidTarget,
            format!(
                "Destino de desempaquetado mal formado: '{text}'. Sólo se permiten identificadores, atributos, índices o grupos entre paréntesis o corchetes."
            ),
            text,
        )
        .into())
    }

    fn simple_target(&self, target: &SyntaxNode) -> TransformResult<String> {
        let text = self.expr(target)?;
        if is_store_target(target) {
            return Ok(text);
        }
        Err(StructuralError::new(
            StructuralKind::InvalidTarget,
            format!(
                "Destino de asignación no válido: '{text}'. Sólo se permiten identificadores, atributos o índices."
            ),
            text,
        )
        .into())
    }

    fn plot_stmt(&self, node: &Node) -> TransformResult<Fragment> {
        match node.children.as_slice() {
            [args] => Ok(Fragment::Block(vec![
                format!("plt.plot({})", self.arguments(args)?),
                "plt.show()".to_string(),
            ])),
            _ => Err(TranslationError::shape(node.rule, "faltan argumentos")),
        }
    }

    fn import_stmt(&self, node: &Node) -> TransformResult<String> {
        match node.children.as_slice() {
            [module] => Ok(format!("import {}", self.dotted_name(module)?)),
            [module, como, alias] => {
                expect_token(como, TokenKind::Como, node.rule)?;
                Ok(format!(
                    "import {} as {}",
                    self.dotted_name(module)?,
                    expect_token(alias, TokenKind::Ident, node.rule)?.text
                ))
            }
            _ => Err(TranslationError::shape(node.rule, "forma de importación inesperada")),
        }
    }

    fn from_import(&self, node: &Node) -> TransformResult<String> {
        let [module, names] = node.children.as_slice() else {
            return Err(TranslationError::shape(node.rule, "forma de importación inesperada"));
        };
        let names = match names {
            SyntaxNode::Token(star) if star.kind == TokenKind::Star => "*".to_string(),
            other => {
                let list = expect_rule(other, Rule::ImportedNames)?;
                let mut parts = Vec::with_capacity(list.children.len());
                for name in &list.children {
                    parts.push(self.imported_name(name)?);
                }
                parts.join(", ")
            }
        };
        Ok(format!("from {} import {names}", self.dotted_name(module)?))
    }

    fn imported_name(&self, name: &SyntaxNode) -> TransformResult<String> {
        let node = expect_rule(name, Rule::ImportedName)?;
        match node.children.as_slice() {
            [name] => Ok(expect_token(name, TokenKind::Ident, node.rule)?.text.clone()),
            [name, _como, alias] => Ok(format!(
                "{} as {}",
                expect_token(name, TokenKind::Ident, node.rule)?.text,
                expect_token(alias, TokenKind::Ident, node.rule)?.text
            )),
            _ => Err(TranslationError::shape(node.rule, "forma de nombre importado inesperada")),
        }
    }

    fn return_stmt(&self, node: &Node) -> TransformResult<String> {
        if node.children.is_empty() {
            return Ok("return".to_string());
        }
        Ok(format!("return {}", self.expr_sequence(&node.children)?))
    }

    // ----- compound statements -----

    fn if_stmt(&self, node: &Node, scope: &Scope) -> TransformResult<Fragment> {
        let [cond, block, clauses @ ..] = node.children.as_slice() else {
            return Err(TranslationError::shape(node.rule, "falta condición o bloque"));
        };
        let mut lines = vec![format!("if {}:", self.expr(cond)?)];
        lines.extend(self.body(block, ScopeKind::Block, scope)?);
        for clause in clauses {
            let clause = match clause {
                SyntaxNode::Node(clause) => clause,
                SyntaxNode::Token(_) => {
                    return Err(TranslationError::shape(node.rule, "cláusula sin nodo"))
                }
            };
            match (clause.rule, clause.children.as_slice()) {
                (Rule::ElifClause, [cond, block]) => {
                    lines.push(format!("elif {}:", self.expr(cond)?));
                    lines.extend(self.body(block, ScopeKind::Block, scope)?);
                }
                (Rule::ElseClause, [block]) => {
                    lines.push("else:".to_string());
                    lines.extend(self.body(block, ScopeKind::Block, scope)?);
                }
                (rule, _) => return Err(TranslationError::shape(rule, "cláusula de si inesperada")),
            }
        }
        Ok(Fragment::Block(lines))
    }

    fn while_stmt(&self, node: &Node, scope: &Scope) -> TransformResult<Fragment> {
        let [cond, block] = node.children.as_slice() else {
            return Err(TranslationError::shape(node.rule, "falta condición o bloque"));
        };
        let mut lines = vec![format!("while {}:", self.expr(cond)?)];
        lines.extend(self.body(block, ScopeKind::Block, scope)?);
        Ok(Fragment::Block(lines))
    }

    fn for_stmt(&self, node: &Node, scope: &Scope) -> TransformResult<Fragment> {
        let [target, iterable, block] = node.children.as_slice() else {
            return Err(TranslationError::shape(node.rule, "forma de para inesperada"));
        };
        let mut lines = vec![format!(
            "for {} in {}:",
            self.for_target(target)?,
            self.expr(iterable)?
        )];
        lines.extend(self.body(block, ScopeKind::Block, scope)?);
        Ok(Fragment::Block(lines))
    }

    fn try_stmt(&self, node: &Node, scope: &Scope) -> TransformResult<Fragment> {
        let [block, clauses @ ..] = node.children.as_slice() else {
            return Err(TranslationError::shape(node.rule, "falta el bloque intentar"));
        };
        let mut lines = vec!["try:".to_string()];
        lines.extend(self.body(block, ScopeKind::Block, scope)?);
        for clause in clauses {
            let clause = match clause {
                SyntaxNode::Node(clause) => clause,
                SyntaxNode::Token(_) => {
                    return Err(TranslationError::shape(node.rule, "cláusula sin nodo"))
                }
            };
            match (clause.rule, clause.children.as_slice()) {
                (Rule::ExceptClause, [block]) => {
                    lines.push("except:".to_string());
                    lines.extend(self.body(block, ScopeKind::Block, scope)?);
                }
                (Rule::ExceptClause, [error, block]) => {
                    lines.push(format!("except {}:", self.expr(error)?));
                    lines.extend(self.body(block, ScopeKind::Block, scope)?);
                }
                (Rule::ExceptClause, [error, _como, alias, block]) => {
                    lines.push(format!(
                        "except {} as {}:",
                        self.expr(error)?,
                        expect_token(alias, TokenKind::Ident, clause.rule)?.text
                    ));
                    lines.extend(self.body(block, ScopeKind::Block, scope)?);
                }
                (Rule::FinallyClause, [block]) => {
                    lines.push("finally:".to_string());
                    lines.extend(self.body(block, ScopeKind::Block, scope)?);
                }
                (rule, _) => return Err(TranslationError::shape(rule, "cláusula de intentar inesperada")),
            }
        }
        Ok(Fragment::Block(lines))
    }

    fn with_stmt(&self, node: &Node, scope: &Scope) -> TransformResult<Fragment> {
        let (header, block) = match node.children.as_slice() {
            [context, block] => (format!("with {}:", self.expr(context)?), block),
            [context, _como, alias, block] => (
                format!(
                    "with {} as {}:",
                    self.expr(context)?,
                    expect_token(alias, TokenKind::Ident, node.rule)?.text
                ),
                block,
            ),
            _ => return Err(TranslationError::shape(node.rule, "forma de con inesperada")),
        };
        let mut lines = vec![header];
        lines.extend(self.body(block, ScopeKind::Block, scope)?);
        Ok(Fragment::Block(lines))
    }
}

/// One rendered parameter.
#[derive(Debug, Clone)]
pub(super) struct Param {
    pub rule: Rule,
    pub name: String,
    pub text: String,
}

fn parameter_order(message: String, construct: &str) -> TranslationError {
    StructuralError::new(StructuralKind::ParameterOrder, message, construct).into()
}

/// `iniciar` inside a class: `self` first, injected when nothing was declared.
fn constructor_params(params: &mut Vec<Param>) -> TransformResult<()> {
    match params.first() {
        None => {
            params.push(Param {
                rule: Rule::PosParam,
                name: "self".to_string(),
                text: "self".to_string(),
            });
            Ok(())
        }
        Some(first) if first.rule == Rule::PosParam && first.name == "self" => Ok(()),
        Some(first) => Err(StructuralError::new(
            StructuralKind::ConstructorSignature,
            format!(
                "La función '{CONSTRUCTOR}' ('{INITIALIZER}') debe tener 'self' como primer parámetro posicional. Encontrado '{}'.",
                first.text
            ),
            first.text.clone(),
        )
        .into()),
    }
}

/// Identifier, or an accessor chain that does not end in a call.
fn is_store_target(target: &SyntaxNode) -> bool {
    match target {
        SyntaxNode::Token(token) => token.kind == TokenKind::Ident,
        SyntaxNode::Node(node) => {
            node.rule == Rule::Access
                && node
                    .children
                    .last()
                    .is_some_and(|last| !last.is_rule(Rule::CallSuffix))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body, structural, translate_lines};
    use crate::error::StructuralKind;

    #[test]
    fn let_forms() {
        assert_eq!(body("let x = 1;"), "x = 1");
        assert_eq!(body("let x: int = 1;"), "x: int = 1");
        assert_eq!(body("let x: Lista[int];"), "x: List[int]");
        assert_eq!(body("let x;"), "x = None");
    }

    #[test]
    fn if_cascade() {
        let out = body("si (a) { imprimir(1); } sino si (b) { imprimir(2); } sino { pasar; }");
        assert_eq!(
            out,
            "if a:\n    print(1)\nelif b:\n    print(2)\nelse:\n    pass"
        );
    }

    #[test]
    fn for_and_while() {
        assert_eq!(body("para i, v en enumerate(xs) { continuar; }"), "for i, v in enumerate(xs):\n    continue");
        assert_eq!(body("mientras (i < 3) { i += 1; }"), "while i < 3:\n    i += 1");
    }

    #[test]
    fn try_with_every_clause() {
        let out = body(
            "intentar { f(); } capturar ValueError como e { imprimir(e); } capturar { pasar; } finalmente { g(); }",
        );
        assert_eq!(
            out,
            "try:\n    f()\nexcept ValueError as e:\n    print(e)\nexcept:\n    pass\nfinally:\n    g()"
        );
    }

    #[test]
    fn with_alias() {
        assert_eq!(
            body("con open(\"a.txt\") como f { imprimir(f.read()); }"),
            "with open(\"a.txt\") as f:\n    print(f.read())"
        );
    }

    #[test]
    fn imports() {
        assert_eq!(body("importar os.path como p;"), "import os.path as p");
        assert_eq!(body("desde math importar sqrt como raiz, pi;"), "from math import sqrt as raiz, pi");
        assert_eq!(body("desde math importar *;"), "from math import *");
    }

    #[test]
    fn function_with_hints_and_defaults() {
        let out = body("funcion f(a: int, b = 2, *resto, **opciones) -> Opcional[str] { retornar ninguno; }");
        assert_eq!(
            out,
            "def f(a: int, b = 2, *resto, **opciones) -> Optional[str]:\n    return None"
        );
    }

    #[test]
    fn constructor_gets_self_injected() {
        let out = body("clase Punto { funcion iniciar() { pasar; } }");
        assert_eq!(out, "class Punto:\n    def __init__(self):\n        pass");
    }

    #[test]
    fn constructor_requires_self_first() {
        let err = structural("clase Punto { funcion iniciar(x, self) { pasar; } }");
        assert_eq!(err.kind, StructuralKind::ConstructorSignature);
        assert!(err.message.contains("Encontrado 'x'"));
    }

    #[test]
    fn iniciar_outside_a_class_is_plain() {
        assert_eq!(body("funcion iniciar(x) { pasar; }"), "def iniciar(x):\n    pass");
    }

    #[test]
    fn class_with_bases_attributes_and_docstring() {
        let out = body("clase Perro desde Animal, Mixin { ###Un perro.### nombre: str = \"rex\"; edad: int; }");
        assert_eq!(
            out,
            "class Perro(Animal, Mixin):\n    \"\"\"Un perro.\"\"\"\n    nombre: str = \"rex\"\n    edad: int"
        );
    }

    #[test]
    fn parameter_order_is_checked() {
        let err = structural("funcion f(a = 1, b) { pasar; }");
        assert_eq!(err.kind, StructuralKind::ParameterOrder);
        assert_eq!(err.construct, "b");
        assert_eq!(structural("funcion f(*a, *b) { pasar; }").kind, StructuralKind::ParameterOrder);
        assert_eq!(structural("funcion f(**k, a) { pasar; }").kind, StructuralKind::ParameterOrder);
        assert!(translate_lines("funcion f(a = 1, *r, b) { pasar; }").is_ok());
    }

    #[test]
    fn unpacking_targets() {
        assert_eq!(body("a, b = b, a;"), "a, b = b, a");
        assert_eq!(body("(a, [b, c]) = x;"), "(a, [b, c]) = x");
        assert_eq!(body("a, = x;"), "a, = x");
        assert_eq!(body("p.x, d[k] = 1, 2;"), "p.x, d[k] = 1, 2");
    }

    #[test]
    fn bad_targets_are_rejected() {
        assert_eq!(structural("a, f() = x;").kind, StructuralKind::InvalidTarget);
        assert_eq!(structural("(a, 1) = x;").kind, StructuralKind::InvalidTarget);
        assert_eq!(structural("f() = 3;").kind, StructuralKind::InvalidTarget);
        assert_eq!(structural("1 += 3;").kind, StructuralKind::InvalidTarget);
    }

    #[test]
    fn plot_expands_to_two_lines() {
        assert_eq!(body("graficar(x, y);"), "plt.plot(x, y)\nplt.show()");
    }

    #[test]
    fn return_forms() {
        assert_eq!(body("retornar;"), "return");
        assert_eq!(body("retornar a, b;"), "return a, b");
        assert_eq!(body("retornar a,;"), "return a,");
    }
}
