// lang/src/grammar.rs
// Castella grammar: keyword spellings, literal shapes, precedence tiers and the
// closed set of parse-tree rules.

use std::collections::HashMap;

use regex::Regex;

use crate::token::TokenKind;

pub const GRAMMAR_VERSION: &str = "castella-grammar/1";

/// Every parse-tree rule. Child layouts are the ones the parser builds and the
/// transformer destructures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    /// top-level items
    Module,
    /// `{ item* }` of a statement or function
    Block,
    /// `{ item* }` of a class
    ClassBody,

    /// `[expr]`
    Decorator,
    /// `[IDENT, ParameterList, ReturnType?, Block]`
    FuncDef,
    /// `[PosParam | DefaultParam | StarParam | DoubleStarParam]*`
    ParameterList,
    /// `[IDENT, TypeHint?]`
    PosParam,
    /// `[IDENT, TypeHint?, expr]`
    DefaultParam,
    /// `[IDENT]`
    StarParam,
    /// `[IDENT]`
    DoubleStarParam,
    /// `[type]`
    ReturnType,
    /// `[type]`
    TypeHint,
    /// `[IDENT, BaseList?, ClassBody]`
    ClassDef,
    /// `[expr+]`
    BaseList,
    /// `[IDENT, TypeHint, expr?]`
    ClassAttribute,

    /// `[IDENT, TypeHint?, expr?]`
    LetDecl,
    /// `[target, value]`, value is an expression or an `ExprList`
    Assignment,
    /// `[UnpackTarget | ParenOrTuple | ListLiteral, value]`
    UnpackAssignment,
    /// `[expr+, COMA?]`
    UnpackTarget,
    /// `[target, AUG_OP, value]`
    AugmentedAssignment,
    /// `[expr]`
    ExprStmt,
    /// `[ArgumentList]`
    PrintStmt,
    /// `[ArgumentList]`
    PlotStmt,
    /// `[DottedName, (COMO, IDENT)?]`
    ImportStmt,
    /// `[DottedName, ImportedNames | STAR]`
    FromImport,
    /// `[IDENT+]`
    DottedName,
    /// `[ImportedName+]`
    ImportedNames,
    /// `[IDENT, (COMO, IDENT)?]`
    ImportedName,
    /// `[expr, Block, ElifClause*, ElseClause?]`
    IfStmt,
    /// `[expr, Block]`
    ElifClause,
    /// `[Block]`
    ElseClause,
    /// `[ForTarget, expr, Block]`
    ForStmt,
    /// `[IDENT+]`
    ForTarget,
    /// `[expr, Block]`
    WhileStmt,
    /// `[Block, ExceptClause*, FinallyClause?]`
    TryStmt,
    /// `[(expr, (COMO, IDENT)?)?, Block]`
    ExceptClause,
    /// `[Block]`
    FinallyClause,
    /// `[expr, (COMO, IDENT)?, Block]`
    WithStmt,
    /// `[expr*, COMA?]`
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    PassStmt,

    /// `[ParameterList, expr]`
    Lambda,
    /// `[cond, then, else]`
    Ternary,
    BoolOr,
    BoolAnd,
    /// `[NO, operand]`
    NotExpr,
    Comparison,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Additive,
    Multiplicative,
    /// `[MINUS | PLUS | TILDE, operand]`
    Unary,
    Power,
    /// `[primary, suffix+]`
    Access,
    /// `[IDENT]`
    AttributeSuffix,
    /// `[(expr | Slice)+]`
    IndexSuffix,
    /// `[ArgumentList]`
    CallSuffix,
    /// up to three optional parts and up to two COLON tokens, in source order
    Slice,
    /// `[expr | KeywordArgument | StarArg | DoubleStarArg]*`
    ArgumentList,
    /// `[IDENT, expr]`
    KeywordArgument,
    /// `[expr]`
    StarArg,
    /// `[expr]`
    DoubleStarArg,
    /// `[expr*, COMA?]`
    ParenOrTuple,
    /// `[expr*]`
    ListLiteral,
    /// `[KeyValue*]`
    DictLiteral,
    /// `[key, value]`
    KeyValue,
    /// `[expr+]`
    SetLiteral,
    /// `[expr, CompFor+]`
    ListComp,
    /// `[KeyValue, CompFor+]`
    DictComp,
    /// `[expr, CompFor+]`
    SetComp,
    /// `[expr, CompFor+]`
    GeneratorExpr,
    /// `[ForTarget, expr, CompIf?]`
    CompFor,
    /// `[expr]`
    CompIf,
    /// `[Access]` whose last suffix is a call
    NewInstance,
    /// `[expr+, COMA?]`
    ExprList,

    /// `[DottedName | NINGUNO, TypeArguments?]`
    BasicType,
    /// `[IDENT, TypeArguments?]`
    CollectionType,
    /// `[TypeArguments]`
    UnionType,
    /// `[IDENT]`
    ForwardRef,
    /// `[(type | ELLIPSIS)+]`
    TypeArguments,
    /// `[type*]`
    TypeList,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::Module => "module",
            Rule::Block => "block",
            Rule::ClassBody => "class_body",
            Rule::Decorator => "decorator",
            Rule::FuncDef => "func_def",
            Rule::ParameterList => "parameter_list",
            Rule::PosParam => "pos_param",
            Rule::DefaultParam => "default_param",
            Rule::StarParam => "star_param",
            Rule::DoubleStarParam => "double_star_param",
            Rule::ReturnType => "return_type",
            Rule::TypeHint => "type_hint",
            Rule::ClassDef => "class_def",
            Rule::BaseList => "inheritance_list",
            Rule::ClassAttribute => "class_attribute",
            Rule::LetDecl => "declaration",
            Rule::Assignment => "asignacion",
            Rule::UnpackAssignment => "unpack_assignment",
            Rule::UnpackTarget => "unpack_sequence",
            Rule::AugmentedAssignment => "augmented_assignment",
            Rule::ExprStmt => "expr_stmt",
            Rule::PrintStmt => "print_stmt",
            Rule::PlotStmt => "graficar",
            Rule::ImportStmt => "import_module",
            Rule::FromImport => "from_import",
            Rule::DottedName => "dotted_name",
            Rule::ImportedNames => "imported_names_list",
            Rule::ImportedName => "imported_name",
            Rule::IfStmt => "if_stmt",
            Rule::ElifClause => "elif_clause",
            Rule::ElseClause => "else_clause",
            Rule::ForStmt => "for_stmt",
            Rule::ForTarget => "for_target",
            Rule::WhileStmt => "while_stmt",
            Rule::TryStmt => "try_stmt",
            Rule::ExceptClause => "except_block",
            Rule::FinallyClause => "finally_block",
            Rule::WithStmt => "with_stmt",
            Rule::ReturnStmt => "return_stmt",
            Rule::BreakStmt => "break_stmt",
            Rule::ContinueStmt => "continue_stmt",
            Rule::PassStmt => "pass_stmt",
            Rule::Lambda => "lambda_expr",
            Rule::Ternary => "ternary",
            Rule::BoolOr => "bool_or",
            Rule::BoolAnd => "bool_and",
            Rule::NotExpr => "not_expr",
            Rule::Comparison => "comparison",
            Rule::BitOr => "bitwise_or_expr",
            Rule::BitXor => "bitwise_xor_expr",
            Rule::BitAnd => "bitwise_and_expr",
            Rule::Shift => "shift_expr",
            Rule::Additive => "additive_expr",
            Rule::Multiplicative => "multiplicative_expr",
            Rule::Unary => "unary_expr",
            Rule::Power => "power",
            Rule::Access => "access",
            Rule::AttributeSuffix => "dot_access",
            Rule::IndexSuffix => "index_access",
            Rule::CallSuffix => "call_suffix",
            Rule::Slice => "slice_expr",
            Rule::ArgumentList => "argument_list",
            Rule::KeywordArgument => "keyword_argument",
            Rule::StarArg => "star_arg",
            Rule::DoubleStarArg => "double_star_arg",
            Rule::ParenOrTuple => "tuple_literal",
            Rule::ListLiteral => "list_literal",
            Rule::DictLiteral => "dict_literal",
            Rule::KeyValue => "key_value",
            Rule::SetLiteral => "set_literal",
            Rule::ListComp => "list_comprehension",
            Rule::DictComp => "dict_comprehension",
            Rule::SetComp => "set_comprehension",
            Rule::GeneratorExpr => "generator_expression",
            Rule::CompFor => "comprehension_for",
            Rule::CompIf => "comprehension_if",
            Rule::NewInstance => "new_instance",
            Rule::ExprList => "expression_list",
            Rule::BasicType => "basic_type",
            Rule::CollectionType => "collection_type",
            Rule::UnionType => "union_type",
            Rule::ForwardRef => "forward_ref",
            Rule::TypeArguments => "type_arguments",
            Rule::TypeList => "type_list",
        }
    }

    pub fn is_definition(self) -> bool {
        matches!(self, Rule::FuncDef | Rule::ClassDef)
    }
}

/// How a precedence tier combines its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TierShape {
    /// `operand (op operand)*`, left-associative.
    Chain,
    /// `[op] operand`, a single optional prefix operator.
    Prefix,
}

#[derive(Clone, Debug)]
pub struct Tier {
    pub rule: Rule,
    pub shape: TierShape,
    pub operators: &'static [TokenKind],
    /// Rule whose tier parses the operands after the first one, when it differs
    /// from the next-tighter tier.
    pub rhs: Option<Rule>,
}

impl Tier {
    const fn chain(rule: Rule, operators: &'static [TokenKind]) -> Self {
        Self {
            rule,
            shape: TierShape::Chain,
            operators,
            rhs: None,
        }
    }

    const fn prefix(rule: Rule, operators: &'static [TokenKind]) -> Self {
        Self {
            rule,
            shape: TierShape::Prefix,
            operators,
            rhs: None,
        }
    }

    pub fn accepts(&self, kind: TokenKind) -> bool {
        self.operators.contains(&kind)
    }
}

/// Regexes for the numeric literal shapes, anchored at the current position.
#[derive(Clone, Debug)]
pub struct NumberPatterns {
    pub complex: Regex,
    pub imaginary: Regex,
    pub float: Regex,
    pub int: Regex,
}

#[derive(Clone, Debug)]
pub struct Grammar {
    version: &'static str,
    keywords: HashMap<&'static str, TokenKind>,
    compound_keywords: Vec<(&'static str, &'static str, TokenKind)>,
    tiers: Vec<Tier>,
    type_names: HashMap<&'static str, &'static str>,
    numbers: NumberPatterns,
}

const NUMBER_CORE: &str = r"(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?";

/// Builds the grammar once; callers pass it by reference into every translation.
pub fn build_grammar() -> Grammar {
    let keywords = HashMap::from([
        ("let", TokenKind::Let),
        ("si", TokenKind::Si),
        ("sino", TokenKind::Sino),
        ("mientras", TokenKind::Mientras),
        ("para", TokenKind::Para),
        ("en", TokenKind::En),
        ("romper", TokenKind::Romper),
        ("continuar", TokenKind::Continuar),
        ("pasar", TokenKind::Pasar),
        ("funcion", TokenKind::Funcion),
        ("clase", TokenKind::Clase),
        ("desde", TokenKind::Desde),
        ("importar", TokenKind::Importar),
        ("retornar", TokenKind::Retornar),
        ("intentar", TokenKind::Intentar),
        ("capturar", TokenKind::Capturar),
        ("finalmente", TokenKind::Finalmente),
        ("con", TokenKind::Con),
        ("como", TokenKind::Como),
        ("nueva", TokenKind::Nueva),
        ("imprimir", TokenKind::Imprimir),
        ("graficar", TokenKind::Graficar),
        ("lambda", TokenKind::Lambda),
        ("verdadero", TokenKind::Verdadero),
        ("falso", TokenKind::Falso),
        ("ninguno", TokenKind::Ninguno),
        ("es", TokenKind::Es),
        ("no", TokenKind::No),
        ("y", TokenKind::Y),
        ("o", TokenKind::O),
    ]);

    let compound_keywords = vec![
        ("sino", "si", TokenKind::SinoSi),
        ("es", "no", TokenKind::EsNo),
        ("no", "en", TokenKind::NoEn),
    ];

    let tiers = vec![
        Tier::chain(Rule::BoolOr, &[TokenKind::O]),
        Tier::chain(Rule::BoolAnd, &[TokenKind::Y]),
        Tier::prefix(Rule::NotExpr, &[TokenKind::No]),
        Tier::chain(
            Rule::Comparison,
            &[
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::En,
                TokenKind::NoEn,
                TokenKind::Es,
                TokenKind::EsNo,
            ],
        ),
        Tier::chain(Rule::BitOr, &[TokenKind::Pipe]),
        Tier::chain(Rule::BitXor, &[TokenKind::Caret]),
        Tier::chain(Rule::BitAnd, &[TokenKind::Ampersand]),
        Tier::chain(Rule::Shift, &[TokenKind::LShift, TokenKind::RShift]),
        Tier::chain(Rule::Additive, &[TokenKind::Plus, TokenKind::Minus]),
        Tier::chain(
            Rule::Multiplicative,
            &[
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::DoubleSlash,
                TokenKind::At,
            ],
        ),
        Tier::prefix(
            Rule::Unary,
            &[TokenKind::Minus, TokenKind::Plus, TokenKind::Tilde],
        ),
        // `access (** unary)*`: the right operand re-enters the unary tier, so
        // repeated powers chain to the left.
        Tier {
            rhs: Some(Rule::Unary),
            ..Tier::chain(Rule::Power, &[TokenKind::DoubleStar])
        },
    ];

    let type_names = HashMap::from([
        ("Lista", "List"),
        ("Diccionario", "Dict"),
        ("Tupla", "Tuple"),
        ("Conjunto", "Set"),
        ("Opcional", "Optional"),
        ("Resultado", "Any"),
        ("Matriz", "np.ndarray"),
        ("Tensor", "tf.Tensor"),
        ("Llamable", "Callable"),
    ]);

    Grammar {
        version: GRAMMAR_VERSION,
        keywords,
        compound_keywords,
        tiers,
        type_names,
        numbers: NumberPatterns::new(),
    }
}

impl NumberPatterns {
    fn new() -> Self {
        Self {
            complex: anchored(&format!(r"{NUMBER_CORE}[+-]{NUMBER_CORE}[jJ]")),
            imaginary: anchored(&format!(r"{NUMBER_CORE}[jJ]")),
            float: anchored(r"(?:\d+\.\d*|\.\d+)(?:[eE][+-]?\d+)?|\d+[eE][+-]?\d+"),
            int: anchored(r"\d+"),
        }
    }

    /// Longest numeric shape at the start of `rest`, most specific first.
    pub fn match_at(&self, rest: &str) -> Option<(TokenKind, usize)> {
        [
            (TokenKind::Complex, &self.complex),
            (TokenKind::Imaginary, &self.imaginary),
            (TokenKind::Float, &self.float),
            (TokenKind::Int, &self.int),
        ]
        .into_iter()
        .find_map(|(kind, re)| re.find(rest).map(|m| (kind, m.end())))
    }
}

fn anchored(pattern: &str) -> Regex {
    match Regex::new(&format!("^(?:{pattern})")) {
        Ok(re) => re,
        // The patterns are fixed literals above.
        Err(err) => unreachable!("invalid built-in number pattern: {err}"),
    }
}

impl Grammar {
    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn keyword(&self, word: &str) -> Option<TokenKind> {
        self.keywords.get(word).copied()
    }

    /// Two-word keyword starting with `first`, if any: `(second word, kind)`.
    pub fn compound_keyword(&self, first: &str) -> Option<(&'static str, TokenKind)> {
        self.compound_keywords
            .iter()
            .find(|(head, _, _)| *head == first)
            .map(|(_, tail, kind)| (*tail, *kind))
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier_index(&self, rule: Rule) -> Option<usize> {
        self.tiers.iter().position(|tier| tier.rule == rule)
    }

    /// Target name for a built-in collection type, e.g. `Lista` -> `List`.
    pub fn type_name(&self, name: &str) -> Option<&'static str> {
        self.type_names.get(name).copied()
    }

    pub fn numbers(&self) -> &NumberPatterns {
        &self.numbers
    }
}
