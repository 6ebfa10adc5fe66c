use crate::engine::error::Error;
use pest::Parser;
use pest::error::{ErrorVariant, InputLocation, LineColLocation};
use pest::iterators::Pair;
use rust_decimal::Decimal;
use std::str::FromStr;

pub mod ast;

#[derive(pest_derive::Parser)]
#[grammar = "metapath.pest"]
pub struct MetapathParser;

type BuildResult<T> = Result<T, Error>;

impl MetapathParser {
    /// Parse expression text into an AST with unresolved names.
    pub fn parse_to_ast(input: &str) -> BuildResult<ast::Expr> {
        let mut pairs = Self::parse(Rule::metapath, input).map_err(parse_error)?;
        let root = pairs.next().ok_or_else(|| unexpected_end(input))?;
        let expr = root
            .into_inner()
            .find(|p| p.as_rule() == Rule::expr)
            .ok_or_else(|| unexpected_end(input))?;
        Self::build_expr(expr)
    }

    /// Walk down a pair to the first terminal token rule (e.g. `OP_PLUS`, `K_AND`).
    fn first_token_rule(pair: &Pair<Rule>) -> Rule {
        let mut current = pair.clone();
        while let Some(next) = current.clone().into_inner().next() {
            current = next;
        }
        current.as_rule()
    }

    fn build_expr(pair: Pair<Rule>) -> BuildResult<ast::Expr> {
        match pair.as_rule() {
            Rule::expr => {
                let mut items = pair
                    .into_inner()
                    .map(Self::build_expr)
                    .collect::<BuildResult<Vec<_>>>()?;
                if items.len() == 1 {
                    Ok(items.remove(0))
                } else {
                    Ok(ast::Expr::Sequence(items))
                }
            }
            Rule::expr_single | Rule::primary_expr | Rule::literal => {
                Self::build_expr(Self::only_child(pair)?)
            }
            Rule::for_expr => Self::build_for(pair),
            Rule::let_expr => Self::build_let(pair),
            Rule::quantified_expr => Self::build_quantified(pair),
            Rule::if_expr => {
                let span = pair.as_span();
                let mut parts = pair
                    .into_inner()
                    .filter(|p| matches!(p.as_rule(), Rule::expr | Rule::expr_single));
                let (Some(c), Some(t), Some(e)) = (parts.next(), parts.next(), parts.next()) else {
                    return Err(span_error(span, "if (cond) then expr else expr"));
                };
                Ok(ast::Expr::IfThenElse {
                    cond: Box::new(Self::build_expr(c)?),
                    then_expr: Box::new(Self::build_expr(t)?),
                    else_expr: Box::new(Self::build_expr(e)?),
                })
            }
            Rule::or_expr => Self::fold_chain(pair, |op| match op {
                Rule::K_OR => Some(ast::BinaryOp::Or),
                _ => None,
            }),
            Rule::and_expr => Self::fold_chain(pair, |op| match op {
                Rule::K_AND => Some(ast::BinaryOp::And),
                _ => None,
            }),
            Rule::comparison_expr => Self::build_comparison(pair),
            Rule::string_concat_expr => {
                let mut operands = pair
                    .into_inner()
                    .filter(|p| p.as_rule() != Rule::OP_CONCAT)
                    .map(Self::build_expr)
                    .collect::<BuildResult<Vec<_>>>()?;
                if operands.len() == 1 {
                    Ok(operands.remove(0))
                } else {
                    Ok(ast::Expr::StringConcat(operands))
                }
            }
            Rule::range_expr => {
                let mut inners = pair.into_inner();
                let start = Self::build_expr(Self::next(&mut inners)?)?;
                match inners.next() {
                    Some(_to) => {
                        let end = Self::build_expr(Self::next(&mut inners)?)?;
                        Ok(ast::Expr::Range {
                            start: Box::new(start),
                            end: Box::new(end),
                        })
                    }
                    None => Ok(start),
                }
            }
            Rule::additive_expr => Self::fold_chain(pair, |op| match op {
                Rule::OP_PLUS => Some(ast::BinaryOp::Add),
                Rule::OP_MINUS => Some(ast::BinaryOp::Sub),
                _ => None,
            }),
            Rule::multiplicative_expr => Self::fold_chain(pair, |op| match op {
                Rule::OP_STAR => Some(ast::BinaryOp::Mul),
                Rule::K_DIV => Some(ast::BinaryOp::Div),
                Rule::K_IDIV => Some(ast::BinaryOp::IDiv),
                Rule::K_MOD => Some(ast::BinaryOp::Mod),
                _ => None,
            }),
            Rule::unary_expr => {
                let mut signs = Vec::new();
                let mut operand = None;
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::OP_MINUS => signs.push(ast::UnarySign::Minus),
                        Rule::OP_PLUS => signs.push(ast::UnarySign::Plus),
                        _ => operand = Some(p),
                    }
                }
                let operand = operand.ok_or_else(|| Error::Parse {
                    position: 0,
                    line: 1,
                    column: 1,
                    expected: "operand".to_string(),
                })?;
                let mut expr = Self::build_expr(operand)?;
                for sign in signs.into_iter().rev() {
                    expr = ast::Expr::Unary {
                        sign,
                        expr: Box::new(expr),
                    };
                }
                Ok(expr)
            }
            Rule::union_expr => Self::fold_set_ops(pair),
            Rule::intersect_except_expr => Self::fold_set_ops(pair),
            Rule::path_expr => Self::build_path_expr(pair),
            Rule::postfix_expr => {
                let mut inners = pair.into_inner();
                let primary = Self::build_expr(Self::next(&mut inners)?)?;
                let predicates = inners
                    .map(Self::build_predicate)
                    .collect::<BuildResult<Vec<_>>>()?;
                if predicates.is_empty() {
                    Ok(primary)
                } else {
                    Ok(ast::Expr::Filter {
                        primary: Box::new(primary),
                        predicates,
                    })
                }
            }
            Rule::parenthesized_expr => match pair.into_inner().next() {
                Some(inner) => Self::build_expr(inner),
                None => Ok(ast::Expr::Sequence(Vec::new())),
            },
            Rule::string_literal => {
                let s = match pair.into_inner().next() {
                    Some(content) => match content.as_rule() {
                        Rule::dbl_string_inner => content.as_str().replace("\"\"", "\""),
                        _ => content.as_str().replace("''", "'"),
                    },
                    None => String::new(),
                };
                Ok(ast::Expr::Literal(ast::Literal::String(s)))
            }
            Rule::integer_literal => {
                let span = pair.as_span();
                match pair.as_str().parse::<i64>() {
                    Ok(v) => Ok(ast::Expr::Literal(ast::Literal::Integer(v))),
                    // too large for an integer: keep it as a decimal
                    Err(_) => Decimal::from_str(pair.as_str())
                        .map(|d| ast::Expr::Literal(ast::Literal::Decimal(d)))
                        .map_err(|_| span_error(span, "integer literal in range")),
                }
            }
            Rule::decimal_literal => {
                let span = pair.as_span();
                let text = pair.as_str();
                let normalized = match (text.starts_with('.'), text.ends_with('.')) {
                    (true, _) => format!("0{text}"),
                    (_, true) => format!("{text}0"),
                    _ => text.to_string(),
                };
                Decimal::from_str(&normalized)
                    .map(|d| ast::Expr::Literal(ast::Literal::Decimal(d)))
                    .map_err(|_| span_error(span, "decimal literal in range"))
            }
            Rule::double_literal => {
                let span = pair.as_span();
                pair.as_str()
                    .parse::<f64>()
                    .map(|v| ast::Expr::Literal(ast::Literal::Double(v)))
                    .map_err(|_| span_error(span, "double literal"))
            }
            Rule::var_ref => {
                let name = Self::only_child(pair)?;
                Ok(ast::Expr::VarRef(qname_from_str(name.as_str())))
            }
            Rule::context_item_expr => Ok(ast::Expr::ContextItem),
            Rule::function_call => {
                let mut inners = pair.into_inner();
                let name = qname_from_str(Self::next(&mut inners)?.as_str());
                let args = inners
                    .map(Self::build_expr)
                    .collect::<BuildResult<Vec<_>>>()?;
                Ok(ast::Expr::FunctionCall { name, args })
            }
            other => Err(span_error(
                pair.as_span(),
                &format!("an expression (found {other:?})"),
            )),
        }
    }

    fn next<'a>(inners: &mut pest::iterators::Pairs<'a, Rule>) -> BuildResult<Pair<'a, Rule>> {
        inners.next().ok_or_else(|| Error::Parse {
            position: 0,
            line: 1,
            column: 1,
            expected: "more input".to_string(),
        })
    }

    fn only_child(pair: Pair<Rule>) -> BuildResult<Pair<Rule>> {
        let span = pair.as_span();
        pair.into_inner()
            .next()
            .ok_or_else(|| span_error(span, "an expression"))
    }

    fn fold_chain<F>(pair: Pair<Rule>, map_op: F) -> BuildResult<ast::Expr>
    where
        F: Fn(Rule) -> Option<ast::BinaryOp>,
    {
        let mut inners = pair.into_inner();
        let mut expr = Self::build_expr(Self::next(&mut inners)?)?;
        while let Some(op_pair) = inners.next() {
            let span = op_pair.as_span();
            let op = map_op(Self::first_token_rule(&op_pair))
                .ok_or_else(|| span_error(span, "an operator"))?;
            let right = Self::build_expr(Self::next(&mut inners)?)?;
            expr = ast::Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn fold_set_ops(pair: Pair<Rule>) -> BuildResult<ast::Expr> {
        let mut inners = pair.into_inner();
        let mut expr = Self::build_expr(Self::next(&mut inners)?)?;
        while let Some(op_pair) = inners.next() {
            let op = match op_pair.as_rule() {
                Rule::K_UNION | Rule::OP_PIPE => ast::SetOp::Union,
                Rule::K_INTERSECT => ast::SetOp::Intersect,
                _ => ast::SetOp::Except,
            };
            let right = Self::build_expr(Self::next(&mut inners)?)?;
            expr = ast::Expr::SetOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn build_comparison(pair: Pair<Rule>) -> BuildResult<ast::Expr> {
        use ast::{Expr, GeneralComp as GC, ValueComp as VC};
        let mut inners = pair.into_inner();
        let left = Self::build_expr(Self::next(&mut inners)?)?;
        let Some(op_pair) = inners.next() else {
            return Ok(left);
        };
        let right = Box::new(Self::build_expr(Self::next(&mut inners)?)?);
        let left = Box::new(left);
        let general = |op| Expr::GeneralComparison {
            left: left.clone(),
            op,
            right: right.clone(),
        };
        let value = |op| Expr::ValueComparison {
            left: left.clone(),
            op,
            right: right.clone(),
        };
        let span = op_pair.as_span();
        Ok(match Self::first_token_rule(&op_pair) {
            Rule::OP_EQ => general(GC::Eq),
            Rule::OP_NE => general(GC::Ne),
            Rule::OP_LT => general(GC::Lt),
            Rule::OP_LE => general(GC::Le),
            Rule::OP_GT => general(GC::Gt),
            Rule::OP_GE => general(GC::Ge),
            Rule::K_EQ => value(VC::Eq),
            Rule::K_NE => value(VC::Ne),
            Rule::K_LT => value(VC::Lt),
            Rule::K_LE => value(VC::Le),
            Rule::K_GT => value(VC::Gt),
            Rule::K_GE => value(VC::Ge),
            _ => return Err(span_error(span, "a comparison operator")),
        })
    }

    /// Pairs of `(variable, expression)` from `simple_binding`/`let_binding` children.
    fn bindings(pair: Pair<Rule>) -> BuildResult<(Vec<(ast::QName, ast::Expr)>, Option<Pair<Rule>>)> {
        let mut bindings = Vec::new();
        let mut tail = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::simple_binding | Rule::let_binding => {
                    let mut b = p.into_inner();
                    let var = Self::only_child(Self::next(&mut b)?)?;
                    let value = b
                        .find(|x| x.as_rule() == Rule::expr_single)
                        .map(Self::build_expr)
                        .transpose()?;
                    let value = value.ok_or_else(|| Error::Parse {
                        position: 0,
                        line: 1,
                        column: 1,
                        expected: "binding expression".to_string(),
                    })?;
                    bindings.push((qname_from_str(var.as_str()), value));
                }
                Rule::expr_single => tail = Some(p),
                _ => {}
            }
        }
        Ok((bindings, tail))
    }

    fn build_for(pair: Pair<Rule>) -> BuildResult<ast::Expr> {
        let span = pair.as_span();
        let (bindings, body) = Self::bindings(pair)?;
        let body = body.ok_or_else(|| span_error(span, "return clause"))?;
        let mut expr = Self::build_expr(body)?;
        for (var, sequence) in bindings.into_iter().rev() {
            expr = ast::Expr::ForExpr {
                var,
                sequence: Box::new(sequence),
                body: Box::new(expr),
            };
        }
        Ok(expr)
    }

    fn build_let(pair: Pair<Rule>) -> BuildResult<ast::Expr> {
        let span = pair.as_span();
        let (bindings, body) = Self::bindings(pair)?;
        let body = body.ok_or_else(|| span_error(span, "return clause"))?;
        let mut expr = Self::build_expr(body)?;
        for (var, value) in bindings.into_iter().rev() {
            expr = ast::Expr::LetExpr {
                var,
                value: Box::new(value),
                body: Box::new(expr),
            };
        }
        Ok(expr)
    }

    fn build_quantified(pair: Pair<Rule>) -> BuildResult<ast::Expr> {
        let span = pair.as_span();
        let kind = match pair.clone().into_inner().next().map(|q| Self::first_token_rule(&q)) {
            Some(Rule::K_EVERY) => ast::Quantifier::Every,
            _ => ast::Quantifier::Some,
        };
        let (bindings, test) = Self::bindings(pair)?;
        let test = test.ok_or_else(|| span_error(span, "satisfies clause"))?;
        let mut expr = Self::build_expr(test)?;
        for (var, sequence) in bindings.into_iter().rev() {
            expr = ast::Expr::Quantified {
                kind,
                var,
                sequence: Box::new(sequence),
                satisfies: Box::new(expr),
            };
        }
        Ok(expr)
    }

    fn build_predicate(pair: Pair<Rule>) -> BuildResult<ast::Expr> {
        debug_assert_eq!(pair.as_rule(), Rule::predicate);
        Self::build_expr(Self::only_child(pair)?)
    }

    fn descendant_or_self_step() -> ast::Step {
        ast::Step::Axis(ast::AxisStep {
            axis: ast::Axis::DescendantOrSelf,
            test: ast::NodeTest::Kind(ast::KindTest::AnyKind),
            predicates: vec![],
        })
    }

    fn build_path_expr(pair: Pair<Rule>) -> BuildResult<ast::Expr> {
        let mut inners = pair.into_inner();
        let first = Self::next(&mut inners)?;
        match first.as_rule() {
            Rule::OP_DSLASH => {
                let mut steps = vec![Self::descendant_or_self_step()];
                steps.extend(Self::collect_steps(Self::next(&mut inners)?)?);
                Ok(ast::Expr::Path(ast::PathExpr {
                    start: ast::PathStart::Root,
                    steps,
                }))
            }
            Rule::OP_SLASH => {
                let steps = match inners.next() {
                    Some(rel) => Self::collect_steps(rel)?,
                    None => Vec::new(),
                };
                Ok(ast::Expr::Path(ast::PathExpr {
                    start: ast::PathStart::Root,
                    steps,
                }))
            }
            _ => {
                let mut steps = Self::collect_steps(first)?;
                // a lone non-axis step is a plain expression
                if steps.len() == 1 && matches!(steps[0], ast::Step::Filter(_)) {
                    if let Some(ast::Step::Filter(e)) = steps.pop() {
                        return Ok(e);
                    }
                }
                Ok(ast::Expr::Path(ast::PathExpr {
                    start: ast::PathStart::Relative,
                    steps,
                }))
            }
        }
    }

    fn collect_steps(pair: Pair<Rule>) -> BuildResult<Vec<ast::Step>> {
        debug_assert_eq!(pair.as_rule(), Rule::relative_path_expr);
        let mut out = Vec::new();
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::OP_DSLASH => out.push(Self::descendant_or_self_step()),
                Rule::OP_SLASH => {}
                Rule::step_expr => out.push(Self::build_step(p)?),
                _ => return Err(span_error(p.as_span(), "a path step")),
            }
        }
        Ok(out)
    }

    fn build_step(pair: Pair<Rule>) -> BuildResult<ast::Step> {
        let inner = Self::only_child(pair)?;
        match inner.as_rule() {
            Rule::postfix_expr => Ok(ast::Step::Filter(Self::build_expr(inner)?)),
            Rule::axis_step => {
                let mut inners = inner.into_inner();
                let step = Self::next(&mut inners)?;
                let (axis, test) = match step.as_rule() {
                    Rule::forward_step => Self::build_forward_step(step)?,
                    _ => Self::build_reverse_step(step)?,
                };
                let predicates = inners
                    .map(Self::build_predicate)
                    .collect::<BuildResult<Vec<_>>>()?;
                Ok(ast::Step::Axis(ast::AxisStep {
                    axis,
                    test,
                    predicates,
                }))
            }
            _ => Err(span_error(inner.as_span(), "a path step")),
        }
    }

    fn build_forward_step(pair: Pair<Rule>) -> BuildResult<(ast::Axis, ast::NodeTest)> {
        let mut inners = pair.into_inner();
        let first = Self::next(&mut inners)?;
        match first.as_rule() {
            Rule::forward_axis => {
                let span = first.as_span();
                let axis = match Self::first_token_rule(&first) {
                    Rule::K_CHILD => ast::Axis::Child,
                    Rule::K_DESCENDANT => ast::Axis::Descendant,
                    Rule::K_DESCENDANT_OR_SELF => ast::Axis::DescendantOrSelf,
                    Rule::K_SELF => ast::Axis::SelfAxis,
                    Rule::K_FLAG => ast::Axis::Flag,
                    Rule::K_FOLLOWING_SIBLING => ast::Axis::FollowingSibling,
                    _ => return Err(span_error(span, "a forward axis")),
                };
                Ok((axis, Self::build_node_test(Self::next(&mut inners)?)?))
            }
            _ => {
                // abbrev_forward_step: `@name` or a bare node test
                let mut s_in = first.into_inner();
                let first_in = Self::next(&mut s_in)?;
                if first_in.as_rule() == Rule::OP_AT {
                    Ok((
                        ast::Axis::Flag,
                        Self::build_node_test(Self::next(&mut s_in)?)?,
                    ))
                } else {
                    let test = Self::build_node_test(first_in)?;
                    // `flag(...)` without an axis selects flags
                    let axis = match test {
                        ast::NodeTest::Kind(ast::KindTest::Flag(_)) => ast::Axis::Flag,
                        _ => ast::Axis::Child,
                    };
                    Ok((axis, test))
                }
            }
        }
    }

    fn build_reverse_step(pair: Pair<Rule>) -> BuildResult<(ast::Axis, ast::NodeTest)> {
        let mut inners = pair.into_inner();
        let first = Self::next(&mut inners)?;
        match first.as_rule() {
            Rule::reverse_axis => {
                let span = first.as_span();
                let axis = match Self::first_token_rule(&first) {
                    Rule::K_PARENT => ast::Axis::Parent,
                    Rule::K_ANCESTOR => ast::Axis::Ancestor,
                    Rule::K_ANCESTOR_OR_SELF => ast::Axis::AncestorOrSelf,
                    Rule::K_PRECEDING_SIBLING => ast::Axis::PrecedingSibling,
                    _ => return Err(span_error(span, "a reverse axis")),
                };
                Ok((axis, Self::build_node_test(Self::next(&mut inners)?)?))
            }
            _ => Ok((ast::Axis::Parent, ast::NodeTest::Kind(ast::KindTest::AnyKind))),
        }
    }

    fn build_node_test(pair: Pair<Rule>) -> BuildResult<ast::NodeTest> {
        let inner = Self::only_child(pair)?;
        match inner.as_rule() {
            Rule::name_test => Self::build_name_test(inner).map(ast::NodeTest::Name),
            _ => Self::build_kind_test(inner).map(ast::NodeTest::Kind),
        }
    }

    fn build_name_test(pair: Pair<Rule>) -> BuildResult<ast::NameTest> {
        let inner = Self::only_child(pair)?;
        match inner.as_rule() {
            Rule::eqname => Ok(ast::NameTest::QName(qname_from_str(inner.as_str()))),
            _ => {
                let s = inner.as_str();
                if s == "*" {
                    Ok(ast::NameTest::Wildcard(ast::WildcardName::Any))
                } else if let Some(local) = s.strip_prefix("*:") {
                    Ok(ast::NameTest::Wildcard(ast::WildcardName::LocalWildcard(
                        local.to_string(),
                    )))
                } else if let Some(prefix) = s.strip_suffix(":*") {
                    Ok(ast::NameTest::Wildcard(ast::WildcardName::NsWildcard {
                        prefix: prefix.to_string(),
                        ns_uri: None,
                    }))
                } else {
                    Err(span_error(inner.as_span(), "a name test"))
                }
            }
        }
    }

    fn build_kind_test(pair: Pair<Rule>) -> BuildResult<ast::KindTest> {
        let kind = Self::only_child(pair)?;
        let rule = kind.as_rule();
        // the optional name is the `kind_name` child; `*` means any name
        let name = kind
            .into_inner()
            .find(|p| p.as_rule() == Rule::kind_name)
            .filter(|p| p.as_str() != "*")
            .map(|p| qname_from_str(p.as_str()));
        Ok(match rule {
            Rule::any_kind_test => ast::KindTest::AnyKind,
            Rule::document_test => ast::KindTest::Document,
            Rule::assembly_test => ast::KindTest::Assembly(name),
            Rule::field_test => ast::KindTest::Field(name),
            _ => ast::KindTest::Flag(name),
        })
    }
}

fn qname_from_str(s: &str) -> ast::QName {
    match s.split_once(':') {
        Some((prefix, local)) => ast::QName {
            prefix: Some(prefix.to_string()),
            local: local.to_string(),
            ns_uri: None,
        },
        None => ast::QName::local(s),
    }
}

fn span_error(span: pest::Span<'_>, expected: &str) -> Error {
    let (line, column) = span.start_pos().line_col();
    Error::Parse {
        position: span.start(),
        line,
        column,
        expected: expected.to_string(),
    }
}

fn unexpected_end(input: &str) -> Error {
    Error::Parse {
        position: input.len(),
        line: input.lines().count().max(1),
        column: input.lines().last().map_or(1, |l| l.chars().count() + 1),
        expected: "an expression".to_string(),
    }
}

fn parse_error(e: pest::error::Error<Rule>) -> Error {
    let position = match e.location {
        InputLocation::Pos(p) => p,
        InputLocation::Span((start, _)) => start,
    };
    let (line, column) = match e.line_col {
        LineColLocation::Pos(lc) => lc,
        LineColLocation::Span(lc, _) => lc,
    };
    let expected = match &e.variant {
        ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => positives
            .iter()
            .map(|r| format!("{r:?}"))
            .collect::<Vec<_>>()
            .join(", "),
        ErrorVariant::ParsingError { .. } => "end of expression".to_string(),
        ErrorVariant::CustomError { message } => message.clone(),
    };
    Error::Parse {
        position,
        line,
        column,
        expected,
    }
}
