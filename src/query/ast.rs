#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Term(Term),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Group(Box<Expr>),
}

/// A single `field op value` term. Without a field it is a bare term that
/// gets matched against the configured default fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub field: Option<String>,
    pub op: Operator,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Contains,
    Regex,
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Contains => ":",
            Operator::Regex => "~",
            Operator::Gte => ">=",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Lt => "<",
            Operator::Eq => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number { value: f64, text: String },
    String(String),
}

impl Value {
    /// Classifies a token: digits with an optional fraction are numbers.
    /// Digit runs too long for an `f64` stay strings.
    pub fn from_token(token: &str) -> Self {
        if is_number(token) {
            if let Some(value) = token.parse::<f64>().ok().filter(|v| v.is_finite()) {
                return Value::Number {
                    value,
                    text: token.to_string(),
                };
            }
        }
        Value::String(token.to_string())
    }

    /// The token as it was typed.
    pub fn text(&self) -> &str {
        match self {
            Value::Number { text, .. } => text,
            Value::String(s) => s,
        }
    }

    pub fn is_sentinel(&self, sentinel: &str) -> bool {
        matches!(self, Value::String(s) if s == sentinel)
    }
}

fn is_number(s: &str) -> bool {
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.map_or(true, digits)
}
