use chrono::{DateTime, Utc};

use super::ast::{Expr, Operator, Term, Value};
use super::error::QueryError;
use super::filter::{Condition, Filter, ObjectId, Scalar};
use super::normalize::{normalize, Operand};
use super::parser::parse;
use super::rule::Rule;

/// Field name reserved for the document identifier.
pub const ID_FIELD: &str = "id";

/// Compiles search strings into filter trees under a fixed [`Rule`].
///
/// Holds no state besides the rule, so one instance can be shared freely
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct SearchCompiler {
    rule: Rule,
}

impl SearchCompiler {
    pub fn new(rule: Rule) -> Self {
        Self { rule }
    }

    pub fn compile(&self, input: &str) -> Result<Filter, QueryError> {
        self.compile_at(input, Utc::now())
    }

    /// Like [`compile`](Self::compile), with `now` used for `NOW` and
    /// relative dates.
    pub fn compile_at(&self, input: &str, now: DateTime<Utc>) -> Result<Filter, QueryError> {
        let expr = parse(input)?;
        let filter = self.compile_expr(&expr, now)?;
        tracing::debug!(query = input, filter = %filter, "compiled search query");
        Ok(filter)
    }

    pub fn compile_expr(&self, expr: &Expr, now: DateTime<Utc>) -> Result<Filter, QueryError> {
        match expr {
            Expr::Term(term) => self.compile_term(term, now),
            Expr::And(left, right) => Ok(Filter::And(vec![
                self.compile_expr(left, now)?,
                self.compile_expr(right, now)?,
            ])),
            Expr::Or(left, right) => Ok(Filter::Or(vec![
                self.compile_expr(left, now)?,
                self.compile_expr(right, now)?,
            ])),
            Expr::Group(inner) => self.compile_expr(inner, now),
        }
    }

    fn compile_term(&self, term: &Term, now: DateTime<Utc>) -> Result<Filter, QueryError> {
        match &term.field {
            Some(field) => self.compile_full(field, term.op, &term.value, now),
            None => self.compile_bare(&term.value),
        }
    }

    fn compile_full(
        &self,
        field: &str,
        op: Operator,
        value: &Value,
        now: DateTime<Utc>,
    ) -> Result<Filter, QueryError> {
        if field == ID_FIELD {
            return Ok(Filter::Id(value.text().parse::<ObjectId>()?));
        }

        let (op, operand) = normalize(&self.rule, field, op, value, now)?;
        let scalar = match operand {
            Operand::Null => return Ok(Filter::null(field)),
            Operand::Date(date) => Scalar::Date(date),
            Operand::Value(value) => to_scalar(&value),
        };

        let cond = match op {
            Operator::Contains => {
                if !matches!(scalar, Scalar::Date(_)) && self.rule.is_string(field) {
                    Condition::Regex(regex::escape(value.text()))
                } else {
                    Condition::Eq(scalar)
                }
            }
            Operator::Regex => Condition::Regex(value.text().to_string()),
            Operator::Gte => Condition::Gte(scalar),
            Operator::Gt => Condition::Gt(scalar),
            Operator::Lte => Condition::Lte(scalar),
            Operator::Lt => Condition::Lt(scalar),
            Operator::Eq => Condition::Eq(scalar),
        };
        Ok(Filter::field(field, cond))
    }

    fn compile_bare(&self, value: &Value) -> Result<Filter, QueryError> {
        let substring = || Condition::Regex(regex::escape(value.text()));
        let fields = if !self.rule.any_of.is_empty() {
            &self.rule.any_of
        } else if !self.rule.is_string.is_empty() {
            &self.rule.is_string
        } else {
            return Err(QueryError::Config(format!(
                "bare term {:?} needs anyOf or isString fields",
                value.text()
            )));
        };

        let branches = fields
            .iter()
            .map(|field| {
                let cond = if self.rule.is_string(field) {
                    substring()
                } else {
                    Condition::Eq(to_scalar(value))
                };
                Filter::field(field.as_str(), cond)
            })
            .collect();
        Ok(Filter::Or(branches))
    }
}

fn to_scalar(value: &Value) -> Scalar {
    match value {
        Value::Number { value, .. } => Scalar::Number(*value),
        Value::String(s) => Scalar::String(s.clone()),
    }
}
