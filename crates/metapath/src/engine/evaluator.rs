use crate::compiler::{CompiledExpr, compile_default};
use crate::engine::axes::{axis_nodes, matches_test};
use crate::engine::error::{Error, ErrorCode};
use crate::engine::numeric;
use crate::engine::runtime::{CallCtx, DynamicContext, Focus, StaticContext};
use crate::item::compare::compare_atomic;
use crate::item::{AtomicItem, ExpandedName, Item, Sequence};
use crate::model::NodeItem;
use crate::parser::ast::{self, Expr};
use core::cmp::Ordering;

/// Evaluate a compiled expression.
pub fn evaluate<N: NodeItem>(
    compiled: &CompiledExpr,
    dyn_ctx: &DynamicContext<N>,
) -> Result<Sequence<N>, Error> {
    let ev = Evaluator {
        static_ctx: &compiled.static_ctx,
        dyn_ctx,
    };
    let root = Scope::root(dyn_ctx.context_item.clone().map(|item| Focus {
        item,
        position: 1,
        size: 1,
    }));
    ev.eval(&compiled.expr, &root)
}

/// Compile `text` with the default static context and evaluate it.
pub fn evaluate_expr<N: NodeItem>(
    text: &str,
    dyn_ctx: &DynamicContext<N>,
) -> Result<Sequence<N>, Error> {
    let compiled = compile_default(text)?;
    evaluate(&compiled, dyn_ctx)
}

impl CompiledExpr {
    pub fn evaluate<N: NodeItem>(&self, dyn_ctx: &DynamicContext<N>) -> Result<Sequence<N>, Error> {
        evaluate(self, dyn_ctx)
    }
}

/// Lexical scope: one variable binding or one focus change per link.
///
/// Child scopes borrow their parent and never modify it, so a binding made
/// inside a `for` or predicate is invisible once that body returns.
struct Scope<'s, N> {
    parent: Option<&'s Scope<'s, N>>,
    binding: Option<(ExpandedName, Sequence<N>)>,
    focus: Option<Focus<N>>,
}

impl<'s, N> Scope<'s, N> {
    fn root(focus: Option<Focus<N>>) -> Self {
        Scope {
            parent: None,
            binding: None,
            focus,
        }
    }

    fn bind(&'s self, name: ExpandedName, value: Sequence<N>) -> Scope<'s, N> {
        Scope {
            parent: Some(self),
            binding: Some((name, value)),
            focus: None,
        }
    }

    fn with_focus(&'s self, focus: Focus<N>) -> Scope<'s, N> {
        Scope {
            parent: Some(self),
            binding: None,
            focus: Some(focus),
        }
    }

    fn lookup(&self, name: &ExpandedName) -> Option<&Sequence<N>> {
        let mut cur = Some(self);
        while let Some(s) = cur {
            if let Some((n, v)) = &s.binding
                && n == name
            {
                return Some(v);
            }
            cur = s.parent;
        }
        None
    }

    fn focus(&self) -> Option<&Focus<N>> {
        let mut cur = Some(self);
        while let Some(s) = cur {
            if let Some(f) = &s.focus {
                return Some(f);
            }
            cur = s.parent;
        }
        None
    }
}

struct Evaluator<'a, N> {
    static_ctx: &'a StaticContext,
    dyn_ctx: &'a DynamicContext<N>,
}

type EResult<T> = Result<T, Error>;

fn no_context_item() -> Error {
    Error::dynamic(ErrorCode::XPDY0002, "context item is absent")
}

fn boolean<N>(b: bool) -> Sequence<N> {
    Sequence::singleton(AtomicItem::Boolean(b))
}

fn expanded(q: &ast::QName) -> ExpandedName {
    ExpandedName::new(q.ns_uri.clone(), &q.local)
}

/// Sort nodes into document order and drop duplicates.
fn document_order<N: NodeItem>(mut nodes: Vec<N>) -> EResult<Vec<N>> {
    if nodes.len() < 2 {
        return Ok(nodes);
    }
    let mut failure: Option<Error> = None;
    nodes.sort_by(|a, b| match a.compare_document_order(b) {
        Ok(o) => o,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }
    nodes.dedup();
    Ok(nodes)
}

impl<N: NodeItem> Evaluator<'_, N> {
    fn eval(&self, e: &Expr, scope: &Scope<'_, N>) -> EResult<Sequence<N>> {
        match e {
            Expr::Literal(lit) => Ok(Sequence::singleton(match lit {
                ast::Literal::Integer(v) => AtomicItem::Integer(*v),
                ast::Literal::Decimal(d) => AtomicItem::Decimal(*d),
                ast::Literal::Double(v) => AtomicItem::Double(*v),
                ast::Literal::String(s) => AtomicItem::String(s.clone()),
            })),
            Expr::VarRef(q) => {
                let name = expanded(q);
                scope
                    .lookup(&name)
                    .or_else(|| self.dyn_ctx.variable(&name))
                    .cloned()
                    .ok_or_else(|| {
                        Error::dynamic(
                            ErrorCode::XPST0008,
                            format!("variable ${} is not bound", q.lexical()),
                        )
                    })
            }
            Expr::ContextItem => scope
                .focus()
                .map(|f| Sequence::singleton(f.item.clone()))
                .ok_or_else(no_context_item),
            Expr::FunctionCall { name, args } => self.call(name, args, scope),
            Expr::Sequence(items) => {
                let mut out = Sequence::empty();
                for item in items {
                    out.extend(self.eval(item, scope)?);
                }
                Ok(out)
            }
            Expr::Filter {
                primary,
                predicates,
            } => {
                let base = self.eval(primary, scope)?.into_vec();
                Ok(self.apply_predicates(base, predicates, scope)?.into())
            }
            Expr::Path(path) => self.eval_path(path, scope),
            Expr::Unary { sign, expr } => {
                let Some(v) = self.eval(expr, scope)?.atomize_optional()? else {
                    return Ok(Sequence::empty());
                };
                let r = match sign {
                    ast::UnarySign::Minus => numeric::negate(&v)?,
                    ast::UnarySign::Plus => numeric::identity(&v)?,
                };
                Ok(Sequence::singleton(r))
            }
            Expr::Binary { left, op, right } => match op {
                ast::BinaryOp::And => {
                    if !self.eval(left, scope)?.effective_boolean_value()? {
                        return Ok(boolean(false));
                    }
                    Ok(boolean(self.eval(right, scope)?.effective_boolean_value()?))
                }
                ast::BinaryOp::Or => {
                    if self.eval(left, scope)?.effective_boolean_value()? {
                        return Ok(boolean(true));
                    }
                    Ok(boolean(self.eval(right, scope)?.effective_boolean_value()?))
                }
                arith => {
                    let l = self.eval(left, scope)?.atomize_optional()?;
                    let r = self.eval(right, scope)?.atomize_optional()?;
                    match (l, r) {
                        (Some(l), Some(r)) => {
                            Ok(Sequence::singleton(numeric::arithmetic(*arith, &l, &r)?))
                        }
                        _ => Ok(Sequence::empty()),
                    }
                }
            },
            Expr::StringConcat(parts) => {
                let mut out = String::new();
                for part in parts {
                    if let Some(v) = self.eval(part, scope)?.atomize_optional()? {
                        out.push_str(&v.to_string());
                    }
                }
                Ok(Sequence::singleton(AtomicItem::String(out)))
            }
            Expr::GeneralComparison { left, op, right } => {
                let l = self.eval(left, scope)?.atomize()?;
                let r = self.eval(right, scope)?.atomize()?;
                let tz = self.dyn_ctx.implicit_timezone();
                for a in &l {
                    for b in &r {
                        if compare_atomic(a, op.op(), b, tz)? {
                            return Ok(boolean(true));
                        }
                    }
                }
                Ok(boolean(false))
            }
            Expr::ValueComparison { left, op, right } => {
                let l = self.eval(left, scope)?.atomize_optional()?;
                let r = self.eval(right, scope)?.atomize_optional()?;
                match (l, r) {
                    (Some(a), Some(b)) => {
                        let tz = self.dyn_ctx.implicit_timezone();
                        Ok(boolean(compare_atomic(&a, op.op(), &b, tz)?))
                    }
                    _ => Ok(Sequence::empty()),
                }
            }
            Expr::SetOp { left, op, right } => {
                let l = self.eval(left, scope)?.into_nodes()?;
                let r = self.eval(right, scope)?.into_nodes()?;
                let nodes = match op {
                    ast::SetOp::Union => l.into_iter().chain(r).collect(),
                    ast::SetOp::Intersect => l.into_iter().filter(|n| r.contains(n)).collect(),
                    ast::SetOp::Except => l.into_iter().filter(|n| !r.contains(n)).collect(),
                };
                Ok(Sequence::from_nodes(document_order(nodes)?))
            }
            Expr::Range { start, end } => {
                let s = self.eval(start, scope)?.atomize_optional()?;
                let e = self.eval(end, scope)?.atomize_optional()?;
                let (Some(s), Some(e)) = (s, e) else {
                    return Ok(Sequence::empty());
                };
                let as_int = |a: &AtomicItem| {
                    a.as_i64().ok_or_else(|| {
                        Error::type_mismatch("meta:integer range bound", a.atomic_type().name())
                    })
                };
                let (lo, hi) = (as_int(&s)?, as_int(&e)?);
                Ok(Sequence::from_atomics((lo..=hi).map(AtomicItem::Integer)))
            }
            Expr::ForExpr {
                var,
                sequence,
                body,
            } => {
                let name = expanded(var);
                let mut out = Sequence::empty();
                for item in self.eval(sequence, scope)? {
                    let inner = scope.bind(name.clone(), Sequence::singleton(item));
                    out.extend(self.eval(body, &inner)?);
                }
                Ok(out)
            }
            Expr::LetExpr { var, value, body } => {
                let v = self.eval(value, scope)?;
                let inner = scope.bind(expanded(var), v);
                self.eval(body, &inner)
            }
            Expr::Quantified {
                kind,
                var,
                sequence,
                satisfies,
            } => {
                let name = expanded(var);
                for item in self.eval(sequence, scope)? {
                    let inner = scope.bind(name.clone(), Sequence::singleton(item));
                    let holds = self.eval(satisfies, &inner)?.effective_boolean_value()?;
                    match kind {
                        ast::Quantifier::Some if holds => return Ok(boolean(true)),
                        ast::Quantifier::Every if !holds => return Ok(boolean(false)),
                        _ => {}
                    }
                }
                Ok(boolean(*kind == ast::Quantifier::Every))
            }
            Expr::IfThenElse {
                cond,
                then_expr,
                else_expr,
            } => {
                if self.eval(cond, scope)?.effective_boolean_value()? {
                    self.eval(then_expr, scope)
                } else {
                    self.eval(else_expr, scope)
                }
            }
        }
    }

    fn call(&self, name: &ast::QName, args: &[Expr], scope: &Scope<'_, N>) -> EResult<Sequence<N>> {
        let fname = expanded(name);
        let arity = args.len();
        let sig = self
            .static_ctx
            .functions
            .resolve(&fname, arity)
            .map_err(|e| e.into_error(arity))?;
        let imp = self
            .dyn_ctx
            .functions
            .resolve(&fname, arity)
            .map_err(|e| e.into_error(arity))?;
        let mut values = Vec::with_capacity(arity);
        for (idx, arg) in args.iter().enumerate() {
            let v = self.eval(arg, scope)?;
            values.push(sig.param(idx).convert(v)?);
        }
        tracing::trace!(function = %fname, arity, "function call");
        let ctx = CallCtx {
            dyn_ctx: self.dyn_ctx,
            static_ctx: self.static_ctx,
            focus: scope.focus(),
        };
        imp(&ctx, &values)
    }

    /// Keep the items for which every predicate holds, in input order.
    ///
    /// A numeric predicate value selects by position; any other value is
    /// reduced to its effective boolean value.
    fn apply_predicates(
        &self,
        items: Vec<Item<N>>,
        predicates: &[Expr],
        scope: &Scope<'_, N>,
    ) -> EResult<Vec<Item<N>>> {
        let mut current = items;
        for pred in predicates {
            let size = current.len();
            let mut next = Vec::with_capacity(size);
            for (idx, item) in current.into_iter().enumerate() {
                let position = idx + 1;
                let inner = scope.with_focus(Focus {
                    item: item.clone(),
                    position,
                    size,
                });
                let value = self.eval(pred, &inner)?;
                let keep = match value.as_slice() {
                    [Item::Atomic(a)] if a.is_numeric() => {
                        a.as_f64().is_some_and(|n| n == position as f64)
                    }
                    _ => value.effective_boolean_value()?,
                };
                if keep {
                    next.push(item);
                }
            }
            current = next;
        }
        Ok(current)
    }

    fn eval_path(&self, path: &ast::PathExpr, scope: &Scope<'_, N>) -> EResult<Sequence<N>> {
        let mut current: Option<Sequence<N>> = match path.start {
            ast::PathStart::Relative => None,
            ast::PathStart::Root => {
                let focus = scope.focus().ok_or_else(no_context_item)?;
                let node = focus.item.as_node().ok_or_else(|| {
                    Error::dynamic(
                        ErrorCode::XPTY0020,
                        "a rooted path requires a node as the context item",
                    )
                })?;
                Some(Sequence::singleton(Item::Node(node.root())))
            }
        };
        for step in &path.steps {
            current = Some(self.eval_step(step, current, scope)?);
        }
        match current {
            Some(seq) => Ok(seq),
            // a path is never empty of steps unless it is rooted
            None => scope
                .focus()
                .map(|f| Sequence::singleton(f.item.clone()))
                .ok_or_else(no_context_item),
        }
    }

    fn eval_step(
        &self,
        step: &ast::Step,
        input: Option<Sequence<N>>,
        scope: &Scope<'_, N>,
    ) -> EResult<Sequence<N>> {
        match step {
            ast::Step::Axis(axis_step) => {
                let contexts: Vec<Item<N>> = match input {
                    Some(seq) => seq.into_vec(),
                    None => vec![scope.focus().ok_or_else(no_context_item)?.item.clone()],
                };
                let mut results: Vec<N> = Vec::new();
                let context_count = contexts.len();
                for ctx_item in contexts {
                    let Item::Node(node) = ctx_item else {
                        return Err(Error::dynamic(
                            ErrorCode::XPTY0020,
                            format!(
                                "axis step {}:: applied to a non-node context item",
                                axis_step.axis.name()
                            ),
                        ));
                    };
                    let candidates: Vec<Item<N>> = axis_nodes(&node, axis_step.axis)
                        .into_iter()
                        .filter(|n| matches_test(n, axis_step.axis, &axis_step.test))
                        .map(Item::Node)
                        .collect();
                    let selected = self.apply_predicates(candidates, &axis_step.predicates, scope)?;
                    results.extend(selected.into_iter().filter_map(|i| match i {
                        Item::Node(n) => Some(n),
                        Item::Atomic(_) => None,
                    }));
                }
                let nodes = document_order(results)?;
                tracing::trace!(
                    axis = axis_step.axis.name(),
                    contexts = context_count,
                    results = nodes.len(),
                    "axis step"
                );
                Ok(Sequence::from_nodes(nodes))
            }
            ast::Step::Filter(expr) => {
                let Some(seq) = input else {
                    return self.eval(expr, scope);
                };
                let size = seq.len();
                let mut out: Vec<Item<N>> = Vec::new();
                for (idx, item) in seq.into_iter().enumerate() {
                    if !matches!(item, Item::Node(_)) {
                        return Err(Error::dynamic(
                            ErrorCode::XPTY0019,
                            "the left-hand side of '/' must contain only nodes",
                        ));
                    }
                    let inner = scope.with_focus(Focus {
                        item,
                        position: idx + 1,
                        size,
                    });
                    out.extend(self.eval(expr, &inner)?);
                }
                let node_count = out.iter().filter(|i| matches!(i, Item::Node(_))).count();
                if node_count == out.len() {
                    let nodes = Sequence::from(out).into_nodes()?;
                    Ok(Sequence::from_nodes(document_order(nodes)?))
                } else if node_count == 0 {
                    Ok(out.into())
                } else {
                    Err(Error::dynamic(
                        ErrorCode::XPTY0018,
                        "path step result mixes nodes and atomic values",
                    ))
                }
            }
        }
    }
}
