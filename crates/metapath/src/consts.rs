//! Well-known namespace URIs and prefixes.

/// XPath functions namespace (`fn`), the default function namespace.
pub const FNS: &str = "http://www.w3.org/2005/xpath-functions";

/// Metapath namespace (`meta`): atomic type names and constructor functions.
pub const META_NS: &str = "http://csrc.nist.gov/ns/metaschema/metapath";

/// Metapath extension functions namespace (`mp`).
pub const MP_FNS: &str = "http://csrc.nist.gov/ns/metaschema/metapath-functions";

/// Namespace of the error codes raised by the engine.
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";

/// Prefixes bound in every static context. They cannot be rebound.
pub const BUILTIN_PREFIXES: [(&str, &str); 4] = [
    ("fn", FNS),
    ("meta", META_NS),
    ("mp", MP_FNS),
    ("err", ERR_NS),
];
