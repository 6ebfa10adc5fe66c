use crate::engine::error::Error;
use crate::engine::runtime::StaticContext;
use crate::parser::{MetapathParser, ast};
use std::sync::{Arc, OnceLock};

static DEFAULT_STATIC_CONTEXT: OnceLock<StaticContext> = OnceLock::new();

pub(crate) fn default_static_ctx() -> &'static StaticContext {
    DEFAULT_STATIC_CONTEXT.get_or_init(StaticContext::default)
}

/// A parsed and statically resolved expression.
///
/// All prefixes are bound to namespace URIs and every function call matches
/// a known signature. The value is immutable and can be evaluated any
/// number of times, from any thread.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    pub(crate) expr: ast::Expr,
    pub(crate) static_ctx: Arc<StaticContext>,
    source: String,
}

impl CompiledExpr {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &ast::Expr {
        &self.expr
    }

    pub fn static_context(&self) -> &StaticContext {
        &self.static_ctx
    }
}

/// Parse and resolve `text` against `static_ctx`.
pub fn compile(text: &str, static_ctx: &StaticContext) -> Result<CompiledExpr, Error> {
    let mut expr = MetapathParser::parse_to_ast(text)?;
    let mut c = Compiler {
        static_ctx,
        nodes: 0,
    };
    c.resolve_expr(&mut expr)?;
    tracing::debug!(expression = text, nodes = c.nodes, "compiled metapath");
    Ok(CompiledExpr {
        expr,
        static_ctx: Arc::new(static_ctx.clone()),
        source: text.to_string(),
    })
}

/// Compile with the default static context.
pub fn compile_default(text: &str) -> Result<CompiledExpr, Error> {
    compile(text, default_static_ctx())
}

struct Compiler<'a> {
    static_ctx: &'a StaticContext,
    nodes: usize,
}

type CResult<T> = Result<T, Error>;

impl Compiler<'_> {
    fn ns_for_prefix(&self, prefix: &str) -> CResult<String> {
        self.static_ctx
            .resolve_prefix(prefix)
            .map(str::to_string)
            .ok_or_else(|| Error::Namespace {
                prefix: prefix.to_string(),
            })
    }

    fn resolve_var(&self, q: &mut ast::QName) -> CResult<()> {
        if let Some(p) = &q.prefix {
            q.ns_uri = Some(self.ns_for_prefix(p)?);
        }
        Ok(())
    }

    fn resolve_function_name(&self, q: &mut ast::QName) -> CResult<()> {
        q.ns_uri = Some(match &q.prefix {
            Some(p) => self.ns_for_prefix(p)?,
            None => self.static_ctx.default_function_namespace.clone(),
        });
        Ok(())
    }

    fn resolve_model_name(&self, q: &mut ast::QName) -> CResult<()> {
        q.ns_uri = match &q.prefix {
            Some(p) => Some(self.ns_for_prefix(p)?),
            None => self.static_ctx.default_model_namespace.clone(),
        };
        Ok(())
    }

    fn resolve_all(&mut self, exprs: &mut [ast::Expr]) -> CResult<()> {
        exprs.iter_mut().try_for_each(|e| self.resolve_expr(e))
    }

    fn resolve_expr(&mut self, e: &mut ast::Expr) -> CResult<()> {
        use ast::Expr as E;
        self.nodes += 1;
        match e {
            E::Literal(_) | E::ContextItem => Ok(()),
            E::VarRef(q) => self.resolve_var(q),
            E::FunctionCall { name, args } => {
                self.resolve_function_name(name)?;
                let expanded = crate::item::ExpandedName::new(name.ns_uri.clone(), &name.local);
                self.static_ctx
                    .functions
                    .resolve(&expanded, args.len())
                    .map_err(|err| err.into_error(args.len()))?;
                self.resolve_all(args)
            }
            E::Sequence(items) | E::StringConcat(items) => self.resolve_all(items),
            E::Filter {
                primary,
                predicates,
            } => {
                self.resolve_expr(primary)?;
                self.resolve_all(predicates)
            }
            E::Path(path) => self.resolve_path(path),
            E::Unary { expr, .. } => self.resolve_expr(expr),
            E::Binary { left, right, .. }
            | E::GeneralComparison { left, right, .. }
            | E::ValueComparison { left, right, .. }
            | E::SetOp { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }
            E::Range { start, end } => {
                self.resolve_expr(start)?;
                self.resolve_expr(end)
            }
            E::ForExpr {
                var,
                sequence,
                body,
            }
            | E::Quantified {
                var,
                sequence,
                satisfies: body,
                ..
            } => {
                self.resolve_var(var)?;
                self.resolve_expr(sequence)?;
                self.resolve_expr(body)
            }
            E::LetExpr { var, value, body } => {
                self.resolve_var(var)?;
                self.resolve_expr(value)?;
                self.resolve_expr(body)
            }
            E::IfThenElse {
                cond,
                then_expr,
                else_expr,
            } => {
                self.resolve_expr(cond)?;
                self.resolve_expr(then_expr)?;
                self.resolve_expr(else_expr)
            }
        }
    }

    fn resolve_path(&mut self, path: &mut ast::PathExpr) -> CResult<()> {
        for step in &mut path.steps {
            match step {
                ast::Step::Filter(e) => self.resolve_expr(e)?,
                ast::Step::Axis(s) => {
                    self.nodes += 1;
                    self.resolve_node_test(&mut s.test)?;
                    self.resolve_all(&mut s.predicates)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_node_test(&self, test: &mut ast::NodeTest) -> CResult<()> {
        match test {
            ast::NodeTest::Name(ast::NameTest::QName(q)) => self.resolve_model_name(q),
            ast::NodeTest::Name(ast::NameTest::Wildcard(ast::WildcardName::NsWildcard {
                prefix,
                ns_uri,
            })) => {
                *ns_uri = Some(self.ns_for_prefix(prefix)?);
                Ok(())
            }
            ast::NodeTest::Name(ast::NameTest::Wildcard(_)) => Ok(()),
            ast::NodeTest::Kind(
                ast::KindTest::Assembly(Some(q))
                | ast::KindTest::Field(Some(q))
                | ast::KindTest::Flag(Some(q)),
            ) => self.resolve_model_name(q),
            ast::NodeTest::Kind(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::ErrorCode;
    use crate::engine::runtime::StaticContextBuilder;

    #[test]
    fn unprefixed_function_resolves_to_default_namespace() {
        let c = compile_default("count((1, 2))").unwrap();
        match c.ast() {
            ast::Expr::FunctionCall { name, .. } => {
                assert_eq!(name.ns_uri.as_deref(), Some(crate::consts::FNS));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unbound_prefix_is_static_error() {
        let err = compile_default("x:title").unwrap_err();
        assert_eq!(err.code(), ErrorCode::XPST0081);
        assert!(err.is_static());
    }

    #[test]
    fn declared_prefix_applies_to_name_tests() {
        let ctx = StaticContextBuilder::new()
            .with_namespace("o", "http://example.com/ns/oscal")
            .build();
        let c = compile("o:metadata/o:title", &ctx).unwrap();
        let ast::Expr::Path(path) = c.ast() else {
            panic!("expected a path");
        };
        for step in &path.steps {
            let ast::Step::Axis(s) = step else {
                panic!("expected axis steps");
            };
            let ast::NodeTest::Name(ast::NameTest::QName(q)) = &s.test else {
                panic!("expected a name test");
            };
            assert_eq!(q.ns_uri.as_deref(), Some("http://example.com/ns/oscal"));
        }
    }
}
