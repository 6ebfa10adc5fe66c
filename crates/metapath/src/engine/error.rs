use crate::consts::ERR_NS;
use crate::item::{AtomicType, ExpandedName, Occurrence};
use core::fmt;

/// Error codes emitted by the compiler and evaluator.
///
/// Codes follow the W3C `err:` vocabulary where one exists. Use
/// [`Error::code`] for structured handling instead of matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FOAR0001, // division by zero
    FOAR0002, // numeric overflow
    FOER0000, // unidentified error
    FORG0001, // invalid value for cast
    FORG0004, // one-or-more called with an empty sequence
    FORG0005, // exactly-one called with a sequence of the wrong length
    FORG0006, // invalid argument type (effective boolean value)
    FORX0001, // invalid regular expression flags
    FORX0002, // invalid regular expression
    XPDY0002, // context item is absent
    XPST0003, // syntax error
    XPST0008, // undeclared variable
    XPST0017, // unknown function name or arity
    XPST0081, // unbound namespace prefix
    XPTY0004, // type error
    XPTY0018, // path result mixes nodes and atomic values
    XPTY0019, // path step applied to an atomic value
    XPTY0020, // axis step context item is not a node
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FOAR0001 => "err:FOAR0001",
            ErrorCode::FOAR0002 => "err:FOAR0002",
            ErrorCode::FOER0000 => "err:FOER0000",
            ErrorCode::FORG0001 => "err:FORG0001",
            ErrorCode::FORG0004 => "err:FORG0004",
            ErrorCode::FORG0005 => "err:FORG0005",
            ErrorCode::FORG0006 => "err:FORG0006",
            ErrorCode::FORX0001 => "err:FORX0001",
            ErrorCode::FORX0002 => "err:FORX0002",
            ErrorCode::XPDY0002 => "err:XPDY0002",
            ErrorCode::XPST0003 => "err:XPST0003",
            ErrorCode::XPST0008 => "err:XPST0008",
            ErrorCode::XPST0017 => "err:XPST0017",
            ErrorCode::XPST0081 => "err:XPST0081",
            ErrorCode::XPTY0004 => "err:XPTY0004",
            ErrorCode::XPTY0018 => "err:XPTY0018",
            ErrorCode::XPTY0019 => "err:XPTY0019",
            ErrorCode::XPTY0020 => "err:XPTY0020",
            ErrorCode::Unknown => "err:UNKNOWN",
        }
    }

    pub fn from_code(s: &str) -> Self {
        use ErrorCode::*;
        match s {
            "err:FOAR0001" => FOAR0001,
            "err:FOAR0002" => FOAR0002,
            "err:FOER0000" => FOER0000,
            "err:FORG0001" => FORG0001,
            "err:FORG0004" => FORG0004,
            "err:FORG0005" => FORG0005,
            "err:FORG0006" => FORG0006,
            "err:FORX0001" => FORX0001,
            "err:FORX0002" => FORX0002,
            "err:XPDY0002" => XPDY0002,
            "err:XPST0003" => XPST0003,
            "err:XPST0008" => XPST0008,
            "err:XPST0017" => XPST0017,
            "err:XPST0081" => XPST0081,
            "err:XPTY0004" => XPTY0004,
            "err:XPTY0018" => XPTY0018,
            "err:XPTY0019" => XPTY0019,
            "err:XPTY0020" => XPTY0020,
            _ => Unknown,
        }
    }

    /// The code as an expanded name in the `err` namespace.
    pub fn qname(&self) -> ExpandedName {
        let local = self.as_str().trim_start_matches("err:");
        ExpandedName::new(Some(ERR_NS.to_string()), local)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised while compiling or evaluating an expression.
///
/// `Parse`, `Namespace` and `UnknownFunction` are produced by
/// [`compile`](crate::compile) before any evaluation starts. Every other
/// variant aborts the evaluation it occurs in; no partial sequence is
/// returned alongside it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("syntax error at line {line}, column {column}: expected {expected}")]
    Parse {
        /// Byte offset into the expression text.
        position: usize,
        line: usize,
        column: usize,
        expected: String,
    },
    #[error("namespace prefix '{prefix}' is not bound in the static context")]
    Namespace { prefix: String },
    #[error("unknown function {name}#{arity}{}", format_arities(.available))]
    UnknownFunction {
        name: String,
        arity: usize,
        /// Arities registered under the same name (empty if the name is unknown).
        available: Vec<usize>,
    },
    #[error("type error: expected {expected}, found {found}")]
    Type {
        expected: String,
        found: String,
        code: ErrorCode,
    },
    #[error("cannot cast '{lexical}' to {target}")]
    Cast { lexical: String, target: AtomicType },
    #[error("cardinality error: expected {expected}, found {actual} item(s)")]
    Cardinality {
        expected: Occurrence,
        actual: usize,
        code: ErrorCode,
    },
    #[error("{message} ({code})")]
    Dynamic { code: ErrorCode, message: String },
}

fn format_arities(available: &[usize]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = available.iter().map(ToString::to_string).collect();
        format!(" (available arities: {})", list.join(", "))
    }
}

impl Error {
    pub fn dynamic(code: ErrorCode, message: impl Into<String>) -> Self {
        Error::Dynamic {
            code,
            message: message.into(),
        }
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::Type {
            expected: expected.into(),
            found: found.into(),
            code: ErrorCode::XPTY0004,
        }
    }

    /// Type error raised when an effective boolean value is undefined.
    pub fn ebv(found: impl Into<String>) -> Self {
        Error::Type {
            expected: "a sequence with an effective boolean value".to_string(),
            found: found.into(),
            code: ErrorCode::FORG0006,
        }
    }

    pub fn cast(lexical: impl Into<String>, target: AtomicType) -> Self {
        Error::Cast {
            lexical: lexical.into(),
            target,
        }
    }

    pub fn cardinality(expected: Occurrence, actual: usize) -> Self {
        Error::Cardinality {
            expected,
            actual,
            code: ErrorCode::XPTY0004,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Parse { .. } => ErrorCode::XPST0003,
            Error::Namespace { .. } => ErrorCode::XPST0081,
            Error::UnknownFunction { .. } => ErrorCode::XPST0017,
            Error::Type { code, .. } => *code,
            Error::Cast { .. } => ErrorCode::FORG0001,
            Error::Cardinality { code, .. } => *code,
            Error::Dynamic { code, .. } => *code,
        }
    }

    /// True for errors detected while compiling (before evaluation).
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            Error::Parse { .. } | Error::Namespace { .. } | Error::UnknownFunction { .. }
        )
    }
}

impl From<fancy_regex::Error> for Error {
    fn from(e: fancy_regex::Error) -> Self {
        Error::dynamic(ErrorCode::FORX0002, format!("invalid regular expression: {e}"))
    }
}
