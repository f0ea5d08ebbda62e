pub mod ast;
pub mod compiler;
pub mod error;
pub mod eval;
pub mod filter;
pub mod normalize;
pub mod parser;
pub mod rule;

pub use compiler::SearchCompiler;
pub use error::{EvalError, ParseError, QueryError};
pub use eval::Matcher;
pub use filter::{Condition, Filter, ObjectId, Scalar};
pub use parser::parse;
pub use rule::Rule;
