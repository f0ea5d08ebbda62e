//! Compiles terse search strings such as `deck:foo tag:hard due:+1d` into
//! document-store filter trees.
//!
//! ```
//! use searchq::{Rule, SearchCompiler};
//!
//! let compiler = SearchCompiler::new(Rule {
//!     is_string: vec!["front".to_string(), "back".to_string()],
//!     ..Rule::default()
//! });
//! let filter = compiler.compile("kanji level>=3").unwrap();
//! assert_eq!(
//!     filter.to_string(),
//!     r#"{"$and":[{"$or":[{"front":{"$regex":"kanji"}},{"back":{"$regex":"kanji"}}]},{"level":{"$gte":3}}]}"#
//! );
//! ```

pub mod config;
pub mod query;

pub use query::{Filter, Matcher, QueryError, Rule, SearchCompiler};
