use regex::Regex;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

use super::error::EvalError;
use super::filter::{Condition, Filter, Scalar};
use super::normalize::parse_absolute;

/// A filter tree prepared for matching in-memory documents.
///
/// Regex patterns are compiled once up front. Fields are looked up by
/// dotted path, and array values match when any element does.
#[derive(Debug)]
pub struct Matcher {
    root: Node,
}

#[derive(Debug)]
enum Node {
    And(Vec<Node>),
    Or(Vec<Node>),
    Field { path: Vec<String>, test: Test },
    Id(String),
}

#[derive(Debug)]
enum Test {
    Eq(Scalar),
    Regex(Regex),
    Range(Scalar, fn(Ordering) -> bool),
    Exists(bool),
}

impl Matcher {
    pub fn new(filter: &Filter) -> Result<Self, EvalError> {
        Ok(Self {
            root: prepare(filter)?,
        })
    }

    pub fn matches(&self, doc: &JsonValue) -> bool {
        eval_node(&self.root, doc)
    }
}

fn prepare(filter: &Filter) -> Result<Node, EvalError> {
    let node = match filter {
        Filter::And(children) => Node::And(children.iter().map(prepare).collect::<Result<_, _>>()?),
        Filter::Or(children) => Node::Or(children.iter().map(prepare).collect::<Result<_, _>>()?),
        Filter::Id(id) => Node::Id(id.to_hex()),
        Filter::Field { field, cond } => {
            let test = match cond {
                Condition::Eq(v) => Test::Eq(v.clone()),
                Condition::Regex(pattern) => {
                    let re = Regex::new(pattern).map_err(|source| EvalError::InvalidRegex {
                        pattern: pattern.clone(),
                        source,
                    })?;
                    Test::Regex(re)
                }
                Condition::Gte(v) => Test::Range(v.clone(), Ordering::is_ge),
                Condition::Gt(v) => Test::Range(v.clone(), Ordering::is_gt),
                Condition::Lte(v) => Test::Range(v.clone(), Ordering::is_le),
                Condition::Lt(v) => Test::Range(v.clone(), Ordering::is_lt),
                Condition::Exists(b) => Test::Exists(*b),
            };
            Node::Field {
                path: field.split('.').map(str::to_string).collect(),
                test,
            }
        }
    };
    Ok(node)
}

fn eval_node(node: &Node, doc: &JsonValue) -> bool {
    match node {
        Node::And(children) => children.iter().all(|c| eval_node(c, doc)),
        Node::Or(children) => children.iter().any(|c| eval_node(c, doc)),
        Node::Id(hex) => lookup(doc, &["_id".to_string()])
            .and_then(id_text)
            .map_or(false, |id| id.eq_ignore_ascii_case(hex)),
        Node::Field { path, test } => {
            let found = lookup(doc, path);
            match test {
                Test::Exists(expected) => found.is_some() == *expected,
                _ => found.map_or(false, |value| {
                    candidates(value).any(|candidate| eval_test(test, candidate))
                }),
            }
        }
    }
}

fn lookup<'a>(doc: &'a JsonValue, path: &[String]) -> Option<&'a JsonValue> {
    path.iter().try_fold(doc, |current, key| current.as_object()?.get(key))
}

/// The value itself plus, for arrays, each element.
fn candidates(value: &JsonValue) -> Box<dyn Iterator<Item = &JsonValue> + '_> {
    match value {
        JsonValue::Array(items) => Box::new(std::iter::once(value).chain(items.iter())),
        _ => Box::new(std::iter::once(value)),
    }
}

fn id_text(value: &JsonValue) -> Option<&str> {
    match value {
        JsonValue::String(s) => Some(s),
        JsonValue::Object(map) => map.get("$oid")?.as_str(),
        _ => None,
    }
}

fn eval_test(test: &Test, value: &JsonValue) -> bool {
    match test {
        Test::Eq(expected) => compare(value, expected) == Some(Ordering::Equal),
        Test::Regex(re) => value_to_string(value).map_or(false, |s| re.is_match(&s)),
        Test::Range(bound, accept) => compare(value, bound).map_or(false, *accept),
        Test::Exists(_) => true,
    }
}

/// Orders a document value against a scalar of the same kind; mixed kinds
/// never compare.
fn compare(value: &JsonValue, scalar: &Scalar) -> Option<Ordering> {
    match (value, scalar) {
        (JsonValue::Number(n), Scalar::Number(expected)) => n.as_f64()?.partial_cmp(expected),
        (JsonValue::String(s), Scalar::String(expected)) => Some(s.as_str().cmp(expected)),
        (JsonValue::String(s), Scalar::Date(expected)) => Some(parse_absolute(s)?.cmp(expected)),
        _ => None,
    }
}

fn value_to_string(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
