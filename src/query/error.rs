use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Parse error at position {pos}: expected {} in {input:?}", .expected.join(" or "))]
pub struct ParseError {
    pub input: String,
    pub pos: usize,
    pub expected: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Format error: {0}")]
    Format(String),
}

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
