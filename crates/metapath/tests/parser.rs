use metapath::parser::ast::{
    Axis, AxisStep, BinaryOp, Expr, KindTest, Literal, NameTest, NodeTest, PathExpr, PathStart,
    QName, Quantifier, SetOp, Step, UnarySign, ValueComp, WildcardName,
};
use metapath::{Error, ErrorCode, MetapathParser};
use rstest::rstest;
use rust_decimal::Decimal;

fn parse(expr: &str) -> Expr {
    MetapathParser::parse_to_ast(expr).unwrap_or_else(|e| panic!("{expr}: {e}"))
}

fn int(v: i64) -> Box<Expr> {
    Box::new(Expr::Literal(Literal::Integer(v)))
}

fn child(name: &str) -> Step {
    Step::Axis(AxisStep {
        axis: Axis::Child,
        test: NodeTest::Name(NameTest::QName(QName::local(name))),
        predicates: vec![],
    })
}

fn single_step(expr: &str) -> AxisStep {
    match parse(expr) {
        Expr::Path(PathExpr { steps, .. }) => match steps.as_slice() {
            [Step::Axis(step)] => step.clone(),
            other => panic!("{expr}: expected one axis step, got {other:?}"),
        },
        other => panic!("{expr}: expected a path, got {other:?}"),
    }
}

#[rstest]
#[case("1")]
#[case("'single' || \"double\"")]
#[case("()")]
#[case("(1, 2, 3)[. gt 1]")]
#[case("/catalog/metadata/title")]
#[case("//control[@id = 'ac-1']/title")]
#[case("child::group/descendant::control/flag::id")]
#[case("ancestor-or-self::*/preceding-sibling::node()")]
#[case("document-node()/assembly(catalog)/field(*)")]
#[case("for $a in 1 to 3, $b in 4 return $a * $b")]
#[case("let $x := 1, $y := $x + 1 return $y")]
#[case("some $x in (1, 2) satisfies $x = 2")]
#[case("every $x in () satisfies false()")]
#[case("if (exists(//x)) then 'yes' else 'no'")]
#[case("$items[last()] union $other except $third intersect $fourth")]
#[case("1 eq 1 and 2 ne 3 or 4 lt 5")]
#[case("1 <= 2 and 3 >= 2 and 1 != 2")]
#[case("meta:integer('3') idiv 2 mod 5")]
#[case("o:*/*:title")]
#[case("(: leading comment :) 1 (: (: nested :) :)")]
#[case("fn:string-length(.) > 0")]
#[case("/")]
fn parses(#[case] expr: &str) {
    assert!(MetapathParser::parse_to_ast(expr).is_ok(), "failed to parse {expr}");
}

#[rstest]
#[case("1 +")]
#[case("(1, 2")]
#[case("1 2")]
#[case("'unterminated")]
#[case("$")]
#[case("f(,)")]
#[case("//")]
#[case("for $x in (1, 2)")]
#[case("if (1) then 2")]
#[case("let $x = 1 return $x")]
#[case("foo::bar")]
#[case("")]
fn rejects(#[case] expr: &str) {
    let err = MetapathParser::parse_to_ast(expr).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{expr}: {err:?}");
    assert_eq!(err.code(), ErrorCode::XPST0003);
    assert!(err.is_static());
}

#[rstest]
#[case("1 +", 3, 1, 4)]
#[case("1 2", 2, 1, 3)]
#[case("(1,\n 2", 6, 2, 3)]
fn parse_errors_carry_their_location(
    #[case] expr: &str,
    #[case] position: usize,
    #[case] line: usize,
    #[case] column: usize,
) {
    match MetapathParser::parse_to_ast(expr).unwrap_err() {
        Error::Parse {
            position: p,
            line: l,
            column: c,
            ..
        } => assert_eq!((p, l, c), (position, line, column), "{expr}"),
        other => panic!("{expr}: unexpected {other:?}"),
    }
}

#[rstest]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
        parse("1 + 2 * 3"),
        Expr::Binary {
            left: int(1),
            op: BinaryOp::Add,
            right: Box::new(Expr::Binary {
                left: int(2),
                op: BinaryOp::Mul,
                right: int(3),
            }),
        }
    );
}

#[rstest]
fn additive_chains_fold_left() {
    assert_eq!(
        parse("10 - 4 - 3"),
        Expr::Binary {
            left: Box::new(Expr::Binary {
                left: int(10),
                op: BinaryOp::Sub,
                right: int(4),
            }),
            op: BinaryOp::Sub,
            right: int(3),
        }
    );
}

#[rstest]
fn unary_minus_sits_between_multiplication_and_union() {
    assert_eq!(
        parse("-1 * 2"),
        Expr::Binary {
            left: Box::new(Expr::Unary {
                sign: UnarySign::Minus,
                expr: int(1),
            }),
            op: BinaryOp::Mul,
            right: int(2),
        }
    );
    let Expr::Unary { sign, expr } = parse("-$a | $b") else {
        panic!("expected a unary expression");
    };
    assert_eq!(sign, UnarySign::Minus);
    assert!(matches!(*expr, Expr::SetOp { op: SetOp::Union, .. }));
}

#[rstest]
fn value_comparison_keeps_its_operator() {
    assert!(matches!(
        parse("1 eq 2"),
        Expr::ValueComparison { op: ValueComp::Eq, .. }
    ));
    assert!(matches!(parse("1 = 2"), Expr::GeneralComparison { .. }));
}

#[rstest]
#[case("42", Literal::Integer(42))]
#[case("1.5", Literal::Decimal(Decimal::new(15, 1)))]
#[case(".5", Literal::Decimal(Decimal::new(5, 1)))]
#[case("2.", Literal::Decimal(Decimal::from(2)))]
#[case("1e3", Literal::Double(1000.0))]
#[case("'it''s'", Literal::String("it's".to_string()))]
#[case("\"say \"\"hi\"\"\"", Literal::String("say \"hi\"".to_string()))]
#[case("''", Literal::String(String::new()))]
fn literals(#[case] expr: &str, #[case] expected: Literal) {
    assert_eq!(parse(expr), Expr::Literal(expected), "{expr}");
}

#[rstest]
fn integer_beyond_i64_parses_as_decimal() {
    assert!(matches!(
        parse("99999999999999999999"),
        Expr::Literal(Literal::Decimal(_))
    ));
}

#[rstest]
fn bare_name_is_a_relative_child_step() {
    assert_eq!(
        parse("title"),
        Expr::Path(PathExpr {
            start: PathStart::Relative,
            steps: vec![child("title")],
        })
    );
}

#[rstest]
fn double_slash_inserts_descendant_or_self() {
    let any = Step::Axis(AxisStep {
        axis: Axis::DescendantOrSelf,
        test: NodeTest::Kind(KindTest::AnyKind),
        predicates: vec![],
    });
    assert_eq!(
        parse("//x"),
        Expr::Path(PathExpr {
            start: PathStart::Root,
            steps: vec![any.clone(), child("x")],
        })
    );
    assert_eq!(
        parse("a//b"),
        Expr::Path(PathExpr {
            start: PathStart::Relative,
            steps: vec![child("a"), any, child("b")],
        })
    );
}

#[rstest]
fn lone_slash_is_the_root() {
    assert_eq!(
        parse("/"),
        Expr::Path(PathExpr {
            start: PathStart::Root,
            steps: vec![],
        })
    );
}

#[rstest]
#[case("..", Axis::Parent, NodeTest::Kind(KindTest::AnyKind))]
#[case("@id", Axis::Flag, NodeTest::Name(NameTest::QName(QName::local("id"))))]
#[case("flag::id", Axis::Flag, NodeTest::Name(NameTest::QName(QName::local("id"))))]
#[case("flag(id)", Axis::Flag, NodeTest::Kind(KindTest::Flag(Some(QName::local("id")))))]
#[case("self::node()", Axis::SelfAxis, NodeTest::Kind(KindTest::AnyKind))]
#[case("assembly(*)", Axis::Child, NodeTest::Kind(KindTest::Assembly(None)))]
#[case("field(title)", Axis::Child, NodeTest::Kind(KindTest::Field(Some(QName::local("title")))))]
#[case("descendant-or-self::*", Axis::DescendantOrSelf, NodeTest::Name(NameTest::Wildcard(WildcardName::Any)))]
#[case("ancestor::*:group", Axis::Ancestor, NodeTest::Name(NameTest::Wildcard(WildcardName::LocalWildcard("group".to_string()))))]
#[case("following-sibling::x", Axis::FollowingSibling, NodeTest::Name(NameTest::QName(QName::local("x"))))]
fn axis_steps(#[case] expr: &str, #[case] axis: Axis, #[case] test: NodeTest) {
    let step = single_step(expr);
    assert_eq!(step.axis, axis, "{expr}");
    assert_eq!(step.test, test, "{expr}");
}

#[rstest]
fn prefixed_names_keep_their_prefix() {
    let step = single_step("o:title");
    let NodeTest::Name(NameTest::QName(q)) = step.test else {
        panic!("expected a name test");
    };
    assert_eq!(q.prefix.as_deref(), Some("o"));
    assert_eq!(q.local, "title");
    assert_eq!(q.ns_uri, None);

    let step = single_step("o:*");
    assert_eq!(
        step.test,
        NodeTest::Name(NameTest::Wildcard(WildcardName::NsWildcard {
            prefix: "o".to_string(),
            ns_uri: None,
        }))
    );
}

#[rstest]
fn step_predicates_attach_to_the_step() {
    let step = single_step("control[2][@id]");
    assert_eq!(step.predicates.len(), 2);
    assert_eq!(step.predicates[0], Expr::Literal(Literal::Integer(2)));
}

#[rstest]
fn postfix_predicates_make_a_filter() {
    match parse("(1, 2)[1]") {
        Expr::Filter {
            primary,
            predicates,
        } => {
            assert_eq!(*primary, Expr::Sequence(vec![*int(1), *int(2)]));
            assert_eq!(predicates, [*int(1)]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[rstest]
fn variable_as_first_step() {
    assert_eq!(
        parse("$x/title"),
        Expr::Path(PathExpr {
            start: PathStart::Relative,
            steps: vec![Step::Filter(Expr::VarRef(QName::local("x"))), child("title")],
        })
    );
}

#[rstest]
fn multiple_bindings_nest() {
    let Expr::ForExpr { var, body, .. } = parse("for $a in 1, $b in 2 return $a") else {
        panic!("expected a for expression");
    };
    assert_eq!(var.local, "a");
    let Expr::ForExpr { var, body, .. } = *body else {
        panic!("expected a nested for expression");
    };
    assert_eq!(var.local, "b");
    assert_eq!(*body, Expr::VarRef(QName::local("a")));

    assert!(matches!(
        parse("every $x in 1 satisfies true()"),
        Expr::Quantified { kind: Quantifier::Every, .. }
    ));
}

#[rstest]
fn comments_are_whitespace() {
    assert_eq!(
        parse("1 (: one :) + (: outer (: inner :) :) 2"),
        Expr::Binary {
            left: int(1),
            op: BinaryOp::Add,
            right: int(2),
        }
    );
}

#[rstest]
fn function_calls_collect_their_arguments() {
    let Expr::FunctionCall { name, args } = parse("fn:concat('a', 'b', 'c')") else {
        panic!("expected a function call");
    };
    assert_eq!(name.prefix.as_deref(), Some("fn"));
    assert_eq!(name.local, "concat");
    assert_eq!(args.len(), 3);
    assert!(matches!(parse("true()"), Expr::FunctionCall { ref args, .. } if args.is_empty()));
}

#[rstest]
fn keywords_are_names_inside_paths() {
    assert_eq!(
        parse("/for/return"),
        Expr::Path(PathExpr {
            start: PathStart::Root,
            steps: vec![child("for"), child("return")],
        })
    );
}
