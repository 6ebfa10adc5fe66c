pub mod axes;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod numeric;
pub mod runtime;
