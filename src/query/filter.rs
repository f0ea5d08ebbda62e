use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

use super::error::QueryError;

/// Compiled predicate tree in document-store filter form.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Field { field: String, cond: Condition },
    Id(ObjectId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Scalar),
    Regex(String),
    Gte(Scalar),
    Gt(Scalar),
    Lte(Scalar),
    Lt(Scalar),
    Exists(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
}

impl Filter {
    pub fn field(field: impl Into<String>, cond: Condition) -> Self {
        Filter::Field {
            field: field.into(),
            cond,
        }
    }

    /// Matches documents where `field` is an empty string or missing.
    pub fn null(field: &str) -> Self {
        Filter::Or(vec![
            Filter::field(field, Condition::Eq(Scalar::String(String::new()))),
            Filter::field(field, Condition::Exists(false)),
        ])
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        match self {
            Filter::And(children) => {
                map.insert("$and".to_string(), children.iter().map(Filter::to_json).collect());
            }
            Filter::Or(children) => {
                map.insert("$or".to_string(), children.iter().map(Filter::to_json).collect());
            }
            Filter::Field { field, cond } => {
                map.insert(field.clone(), cond.to_json());
            }
            Filter::Id(id) => {
                map.insert("_id".to_string(), id.to_json());
            }
        }
        JsonValue::Object(map)
    }
}

impl Condition {
    fn to_json(&self) -> JsonValue {
        let (key, value) = match self {
            Condition::Eq(v) => return v.to_json(),
            Condition::Regex(pattern) => ("$regex", JsonValue::String(pattern.clone())),
            Condition::Gte(v) => ("$gte", v.to_json()),
            Condition::Gt(v) => ("$gt", v.to_json()),
            Condition::Lte(v) => ("$lte", v.to_json()),
            Condition::Lt(v) => ("$lt", v.to_json()),
            Condition::Exists(b) => ("$exists", JsonValue::Bool(*b)),
        };
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        JsonValue::Object(map)
    }
}

impl Scalar {
    fn to_json(&self) -> JsonValue {
        match self {
            Scalar::Number(n) => number_to_json(*n),
            Scalar::String(s) => JsonValue::String(s.clone()),
            Scalar::Date(d) => {
                let mut map = Map::new();
                map.insert(
                    "$date".to_string(),
                    JsonValue::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
                JsonValue::Object(map)
            }
        }
    }
}

/// Whole numbers render as JSON integers. JSON has no NaN or infinity, so
/// those render as their text rather than as `null`.
fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return JsonValue::from(n as i64);
    }
    match serde_json::Number::from_f64(n) {
        Some(number) => JsonValue::Number(number),
        None => JsonValue::String(n.to_string()),
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// 12-byte document identifier, written as 24 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert("$oid".to_string(), JsonValue::String(self.to_hex()));
        JsonValue::Object(map)
    }
}

impl FromStr for ObjectId {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::Format(format!("{:?} is not a valid document id", s));
        if s.len() != 24 {
            return Err(invalid());
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| invalid())?;
        Ok(ObjectId(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_keys_keep_insertion_order() {
        let filter = Filter::And(vec![
            Filter::field("z", Condition::Eq(Scalar::Number(1.0))),
            Filter::field("a", Condition::Regex("x".to_string())),
        ]);
        assert_eq!(filter.to_string(), r#"{"$and":[{"z":1},{"a":{"$regex":"x"}}]}"#);
    }

    #[test]
    fn test_numbers() {
        let filter = Filter::field("a", Condition::Gt(Scalar::Number(1.5)));
        assert_eq!(filter.to_json(), json!({"a": {"$gt": 1.5}}));
        let filter = Filter::field("a", Condition::Eq(Scalar::Number(3.0)));
        assert_eq!(filter.to_json(), json!({"a": 3}));
    }

    #[test]
    fn test_non_finite_number_is_not_null() {
        let filter = Filter::field("a", Condition::Eq(Scalar::Number(f64::INFINITY)));
        assert_eq!(filter.to_json(), json!({"a": "inf"}));
    }

    #[test]
    fn test_null_shape() {
        assert_eq!(
            Filter::null("level").to_json(),
            json!({"$or": [{"level": ""}, {"level": {"$exists": false}}]})
        );
    }

    #[test]
    fn test_date_shape() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let filter = Filter::field("due", Condition::Lte(Scalar::Date(at)));
        assert_eq!(
            filter.to_json(),
            json!({"due": {"$lte": {"$date": "2024-03-01T12:30:00.000Z"}}})
        );
    }

    #[test]
    fn test_object_id() {
        let id: ObjectId = "507F1F77BCF86CD799439011".parse().unwrap();
        assert_eq!(id.to_hex(), "507f1f77bcf86cd799439011");
        assert_eq!(
            Filter::Id(id).to_json(),
            json!({"_id": {"$oid": "507f1f77bcf86cd799439011"}})
        );
    }

    #[test]
    fn test_invalid_object_id() {
        for s in ["not-an-id", "507f1f77bcf86cd79943901", "507f1f77bcf86cd79943901z"] {
            assert!(matches!(s.parse::<ObjectId>(), Err(QueryError::Format(_))), "{}", s);
        }
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let filter = Filter::null("a");
        assert_eq!(serde_json::to_value(&filter).unwrap(), filter.to_json());
    }
}
