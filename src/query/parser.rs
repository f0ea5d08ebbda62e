use super::ast::{Expr, Operator, Term, Value};
use super::error::ParseError;

/// Characters that end an unquoted token.
const RESERVED: &[char] = &[' ', '"', ':', '>', '=', '<', '~', '(', ')'];

/// Deepest bracket nesting accepted before the parse is rejected.
pub const MAX_NESTING: usize = 128;

/// Ordered so that two-character operators win over their prefixes.
const OPERATORS: &[(&str, Operator)] = &[
    (":", Operator::Contains),
    ("~", Operator::Regex),
    (">=", Operator::Gte),
    (">", Operator::Gt),
    ("<=", Operator::Lte),
    ("<", Operator::Lt),
    ("=", Operator::Eq),
];

/// Ordered-choice parser over the search grammar.
///
/// Every rule returns `None` without consuming input when it does not match,
/// so alternatives are tried left to right and the first match wins. A
/// matched alternative is never revisited, which is what limits how many
/// unparenthesized terms can be chained.
pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
    furthest: usize,
    expected: Vec<&'static str>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            furthest: 0,
            expected: Vec::new(),
            depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if let Some(expr) = self.input_rule() {
            if self.pos == self.input.len() {
                return Ok(expr);
            }
            self.fail("end of input");
        }
        Err(ParseError {
            input: self.input.to_string(),
            pos: self.furthest,
            expected: self.expected.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn input_rule(&mut self) -> Option<Expr> {
        if let Some(expr) = self.or_sentence() {
            return Some(expr);
        }
        if let Some(expr) = self.and_sentence() {
            return Some(expr);
        }
        self.sentence()
    }

    fn or_sentence(&mut self) -> Option<Expr> {
        self.attempt(|p| {
            let left = p.sentence()?;
            p.literal(" OR ")?;
            let right = p.sentence()?;
            Some(Expr::Or(Box::new(left), Box::new(right)))
        })
    }

    fn and_sentence(&mut self) -> Option<Expr> {
        self.attempt(|p| {
            let left = p.sentence()?;
            p.literal(" ")?;
            let right = p.sentence()?;
            Some(Expr::And(Box::new(left), Box::new(right)))
        })
    }

    fn sentence(&mut self) -> Option<Expr> {
        if let Some(expr) = self.bracketed() {
            return Some(expr);
        }
        if let Some(expr) = self.or_expr() {
            return Some(expr);
        }
        if let Some(expr) = self.and_expr() {
            return Some(expr);
        }
        self.expr()
    }

    fn bracketed(&mut self) -> Option<Expr> {
        self.attempt(|p| {
            p.literal("(")?;
            if p.depth >= MAX_NESTING {
                p.fail("nesting depth");
                return None;
            }
            p.depth += 1;
            let inner = p.sentence();
            p.depth -= 1;
            let inner = inner?;
            p.literal(")")?;
            Some(Expr::Group(Box::new(inner)))
        })
    }

    fn or_expr(&mut self) -> Option<Expr> {
        self.attempt(|p| {
            let left = p.expr()?;
            p.literal(" OR ")?;
            let right = p.expr()?;
            Some(Expr::Or(Box::new(left), Box::new(right)))
        })
    }

    fn and_expr(&mut self) -> Option<Expr> {
        self.attempt(|p| {
            let left = p.expr()?;
            p.literal(" ")?;
            let right = p.expr()?;
            Some(Expr::And(Box::new(left), Box::new(right)))
        })
    }

    fn expr(&mut self) -> Option<Expr> {
        if let Some(term) = self.full_expr() {
            return Some(Expr::Term(term));
        }
        let value = self.value()?;
        Some(Expr::Term(Term {
            field: None,
            op: Operator::Eq,
            value,
        }))
    }

    fn full_expr(&mut self) -> Option<Term> {
        self.attempt(|p| {
            let field = p.string()?;
            let op = p.operator()?;
            let value = p.value()?;
            Some(Term {
                field: Some(field),
                op,
                value,
            })
        })
    }

    fn value(&mut self) -> Option<Value> {
        self.string().map(|s| Value::from_token(&s))
    }

    fn string(&mut self) -> Option<String> {
        if let Some(s) = self.raw_token() {
            return Some(s);
        }
        self.quoted()
    }

    fn raw_token(&mut self) -> Option<String> {
        let input = self.input;
        let rest = &input[self.pos..];
        let len = rest.find(RESERVED).unwrap_or(rest.len());
        if len == 0 {
            self.fail("term");
            return None;
        }
        self.pos += len;
        Some(rest[..len].to_string())
    }

    fn quoted(&mut self) -> Option<String> {
        self.attempt(|p| {
            p.literal("\"")?;
            let input = p.input;
            let rest = &input[p.pos..];
            let Some(len) = rest.find('"') else {
                p.pos = p.input.len();
                p.fail("closing '\"'");
                return None;
            };
            p.pos += len + 1;
            Some(rest[..len].to_string())
        })
    }

    fn operator(&mut self) -> Option<Operator> {
        let input = self.input;
        let rest = &input[self.pos..];
        for (symbol, op) in OPERATORS {
            if rest.starts_with(symbol) {
                self.pos += symbol.len();
                return Some(*op);
            }
        }
        self.fail("operator");
        None
    }

    fn literal(&mut self, s: &'static str) -> Option<()> {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            Some(())
        } else {
            self.fail(s);
            None
        }
    }

    /// Runs `rule` and rewinds to the starting position when it fails.
    fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = rule(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    fn fail(&mut self, expected: &'static str) {
        if self.pos > self.furthest {
            self.furthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.furthest && !self.expected.contains(&expected) {
            self.expected.push(expected);
        }
    }
}

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    Parser::new(input).parse()
}
