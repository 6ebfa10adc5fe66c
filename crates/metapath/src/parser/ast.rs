//! AST for Metapath expressions.
//!
//! Names are stored as parsed; [`compile`](crate::compile) fills in the
//! namespace URIs before an expression is evaluated.

use crate::item::compare::ComparisonOp;
pub use crate::model::QName;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Decimal(Decimal),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnarySign {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralComp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueComp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl GeneralComp {
    pub fn op(self) -> ComparisonOp {
        match self {
            GeneralComp::Eq => ComparisonOp::Eq,
            GeneralComp::Ne => ComparisonOp::Ne,
            GeneralComp::Lt => ComparisonOp::Lt,
            GeneralComp::Le => ComparisonOp::Le,
            GeneralComp::Gt => ComparisonOp::Gt,
            GeneralComp::Ge => ComparisonOp::Ge,
        }
    }
}

impl ValueComp {
    pub fn op(self) -> ComparisonOp {
        match self {
            ValueComp::Eq => ComparisonOp::Eq,
            ValueComp::Ne => ComparisonOp::Ne,
            ValueComp::Lt => ComparisonOp::Lt,
            ValueComp::Le => ComparisonOp::Le,
            ValueComp::Gt => ComparisonOp::Gt,
            ValueComp::Ge => ComparisonOp::Ge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Some,
    Every,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    VarRef(QName),
    ContextItem,
    FunctionCall {
        name: QName,
        args: Vec<Expr>,
    },
    /// Comma-separated sequence constructor; `()` is the empty sequence.
    Sequence(Vec<Expr>),
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
    },
    Path(PathExpr),
    Unary {
        sign: UnarySign,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    StringConcat(Vec<Expr>),
    GeneralComparison {
        left: Box<Expr>,
        op: GeneralComp,
        right: Box<Expr>,
    },
    ValueComparison {
        left: Box<Expr>,
        op: ValueComp,
        right: Box<Expr>,
    },
    SetOp {
        left: Box<Expr>,
        op: SetOp,
        right: Box<Expr>,
    },
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
    },
    /// One binding; `for $a in A, $b in B` nests.
    ForExpr {
        var: QName,
        sequence: Box<Expr>,
        body: Box<Expr>,
    },
    LetExpr {
        var: QName,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    Quantified {
        kind: Quantifier,
        var: QName,
        sequence: Box<Expr>,
        satisfies: Box<Expr>,
    },
    IfThenElse {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStart {
    /// Leading `/`: the root of the context node's tree.
    Root,
    Relative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub start: PathStart,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Axis(AxisStep),
    /// A non-axis step such as `$x` in `$x/title` or `f()` in `a/f()`.
    Filter(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisStep {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Flag,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
}

impl Axis {
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent | Axis::Ancestor | Axis::AncestorOrSelf | Axis::PrecedingSibling
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::SelfAxis => "self",
            Axis::Flag => "flag",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::AncestorOrSelf => "ancestor-or-self",
            Axis::FollowingSibling => "following-sibling",
            Axis::PrecedingSibling => "preceding-sibling",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    Name(NameTest),
    Kind(KindTest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameTest {
    QName(QName),
    Wildcard(WildcardName),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WildcardName {
    /// `*`
    Any,
    /// `prefix:*`
    NsWildcard { prefix: String, ns_uri: Option<String> },
    /// `*:local`
    LocalWildcard(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KindTest {
    /// `node()`
    AnyKind,
    /// `document-node()`
    Document,
    Assembly(Option<QName>),
    Field(Option<QName>),
    Flag(Option<QName>),
}
