//! Metapath: an XPath-style query language over schema-typed document
//! trees of assemblies, fields and flags.
//!
//! ```
//! use metapath::model::simple::{doc, field, flag, root_assembly};
//! use metapath::{DynamicContextBuilder, StaticContext, compile, evaluate};
//!
//! let document = doc()
//!     .child(
//!         root_assembly("catalog")
//!             .flag(flag("id", "cat-1"))
//!             .child(field("title", "First"))
//!             .child(field("title", "Second")),
//!     )
//!     .build();
//!
//! let expr = compile("/catalog/title[2]", &StaticContext::default()).unwrap();
//! let ctx = DynamicContextBuilder::new().with_context_node(document).build();
//! let result = evaluate(&expr, &ctx).unwrap();
//! assert_eq!(result.atomize().unwrap()[0].to_string(), "Second");
//! ```

pub mod compiler;
pub mod consts;
pub mod engine;
pub mod item;
pub mod model;
pub mod parser;

pub use compiler::{CompiledExpr, compile, compile_default};
pub use engine::error::{Error, ErrorCode};
pub use engine::evaluator::{evaluate, evaluate_expr};
pub use engine::functions::{default_function_implementations, default_function_signatures};
pub use engine::runtime::{
    CallCtx, DynamicContext, DynamicContextBuilder, FunctionImplementations, FunctionSignature,
    FunctionSignatures, ItemTypeSpec, ParamTypeSpec, StaticContext, StaticContextBuilder,
};
pub use item::compare::ComparisonOp;
pub use item::{AtomicItem, AtomicType, ExpandedName, Item, Occurrence, Sequence};
pub use model::path::format_path;
pub use model::{NodeItem, NodeKind, QName};
pub use parser::MetapathParser;
