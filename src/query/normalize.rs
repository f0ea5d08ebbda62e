//! Value coercion for a single term.
//!
//! Turns the raw `(operator, value)` pair of a full term into the pair that
//! actually gets compiled. Sentinels and date arithmetic may replace both;
//! nothing is mutated in place.

use chrono::{DateTime, Months, NaiveDate, TimeDelta, Utc};

use super::ast::{Operator, Value};
use super::error::QueryError;
use super::rule::Rule;

pub const NULL: &str = "NULL";
pub const NOW: &str = "NOW";

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Field is empty or missing.
    Null,
    Date(DateTime<Utc>),
    Value(Value),
}

pub fn normalize(
    rule: &Rule,
    field: &str,
    op: Operator,
    value: &Value,
    now: DateTime<Utc>,
) -> Result<(Operator, Operand), QueryError> {
    if value.is_sentinel(NULL) {
        return Ok((op, Operand::Null));
    }

    if !rule.is_date(field) {
        return Ok((op, Operand::Value(value.clone())));
    }

    let text = value.text();
    if let Some(date) = parse_absolute(text) {
        return Ok((op, Operand::Date(date)));
    }
    if let Some((amount, unit)) = relative(value) {
        let date = unit
            .add_to(now, amount)
            .ok_or_else(|| QueryError::Format(format!("date {:?} is out of range", text)))?;
        return Ok((Operator::Lte, Operand::Date(date)));
    }
    if value.is_sentinel(NOW) {
        return Ok((Operator::Lte, Operand::Date(now)));
    }

    Ok((op, Operand::Value(value.clone())))
}

/// `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub(crate) fn parse_absolute(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// An amount with a known unit. Numbers and unknown units are not relative
/// and fall through to the plain value.
fn relative(value: &Value) -> Option<(i64, DurationUnit)> {
    let Value::String(text) = value else {
        return None;
    };
    let (amount, unit) = split_relative(text)?;
    Some((amount, DurationUnit::parse(unit)?))
}

/// Splits `+3d` into `(3, "d")`. All-digit tokens have no unit.
fn split_relative(s: &str) -> Option<(i64, &str)> {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    let unit = &unsigned[digits..];
    if digits == 0 || unit.is_empty() || unit.chars().any(char::is_whitespace) {
        return None;
    }
    let amount = s[..s.len() - unit.len()].parse().ok()?;
    Some((amount, unit))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DurationUnit {
    Years,
    Quarters,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

impl DurationUnit {
    /// Single letters are case-sensitive: `M` is months, `m` is minutes.
    fn parse(s: &str) -> Option<Self> {
        let unit = match s {
            "y" | "year" | "years" => DurationUnit::Years,
            "Q" | "quarter" | "quarters" => DurationUnit::Quarters,
            "M" | "month" | "months" => DurationUnit::Months,
            "w" | "week" | "weeks" => DurationUnit::Weeks,
            "d" | "day" | "days" => DurationUnit::Days,
            "h" | "hour" | "hours" => DurationUnit::Hours,
            "m" | "minute" | "minutes" => DurationUnit::Minutes,
            "s" | "second" | "seconds" => DurationUnit::Seconds,
            "ms" | "millisecond" | "milliseconds" => DurationUnit::Milliseconds,
            _ => return None,
        };
        Some(unit)
    }

    fn add_to(self, now: DateTime<Utc>, amount: i64) -> Option<DateTime<Utc>> {
        let delta = match self {
            DurationUnit::Years => return add_months(now, amount.checked_mul(12)?),
            DurationUnit::Quarters => return add_months(now, amount.checked_mul(3)?),
            DurationUnit::Months => return add_months(now, amount),
            DurationUnit::Weeks => TimeDelta::try_weeks(amount)?,
            DurationUnit::Days => TimeDelta::try_days(amount)?,
            DurationUnit::Hours => TimeDelta::try_hours(amount)?,
            DurationUnit::Minutes => TimeDelta::try_minutes(amount)?,
            DurationUnit::Seconds => TimeDelta::try_seconds(amount)?,
            DurationUnit::Milliseconds => TimeDelta::try_milliseconds(amount)?,
        };
        now.checked_add_signed(delta)
    }
}

/// Calendar months; the day is clamped to the end of a shorter month.
fn add_months(now: DateTime<Utc>, months: i64) -> Option<DateTime<Utc>> {
    let step = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months < 0 {
        now.checked_sub_months(step)
    } else {
        now.checked_add_months(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap()
    }

    fn dates() -> Rule {
        Rule {
            is_date: vec!["due".to_string()],
            ..Rule::default()
        }
    }

    fn run(field: &str, op: Operator, token: &str) -> Result<(Operator, Operand), QueryError> {
        normalize(&dates(), field, op, &Value::from_token(token), now())
    }

    #[test]
    fn test_null_on_any_field() {
        for field in ["due", "level"] {
            assert_eq!(run(field, Operator::Gt, "NULL").unwrap(), (Operator::Gt, Operand::Null));
        }
    }

    #[test]
    fn test_sentinels_are_case_sensitive() {
        assert_eq!(
            run("level", Operator::Contains, "null").unwrap(),
            (Operator::Contains, Operand::Value(Value::String("null".to_string())))
        );
        assert_eq!(
            run("due", Operator::Contains, "now").unwrap().1,
            Operand::Value(Value::String("now".to_string()))
        );
    }

    #[test]
    fn test_now_forces_lte() {
        assert_eq!(
            run("due", Operator::Gt, "NOW").unwrap(),
            (Operator::Lte, Operand::Date(now()))
        );
    }

    #[test]
    fn test_relative_days() {
        let expected = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
        assert_eq!(
            run("due", Operator::Contains, "+1d").unwrap(),
            (Operator::Lte, Operand::Date(expected))
        );
        let expected = Utc.with_ymd_and_hms(2024, 1, 29, 8, 0, 0).unwrap();
        assert_eq!(run("due", Operator::Gte, "-2days").unwrap().1, Operand::Date(expected));
    }

    #[test]
    fn test_relative_months_clamp() {
        let expected = Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap();
        assert_eq!(run("due", Operator::Contains, "1M").unwrap().1, Operand::Date(expected));
        let expected = Utc.with_ymd_and_hms(2023, 1, 31, 8, 0, 0).unwrap();
        assert_eq!(run("due", Operator::Contains, "-1y").unwrap().1, Operand::Date(expected));
    }

    #[test]
    fn test_minutes_and_months_differ() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 31, 8, 5, 0).unwrap();
        assert_eq!(run("due", Operator::Contains, "5m").unwrap().1, Operand::Date(expected));
    }

    #[test]
    fn test_unknown_unit_is_plain_value() {
        assert_eq!(
            run("due", Operator::Gt, "3fortnights").unwrap(),
            (Operator::Gt, Operand::Value(Value::String("3fortnights".to_string())))
        );
        assert_eq!(
            run("due", Operator::Contains, "2024-06").unwrap(),
            (Operator::Contains, Operand::Value(Value::String("2024-06".to_string())))
        );
    }

    #[test]
    fn test_decimal_on_date_field() {
        assert_eq!(
            run("due", Operator::Gte, "1.5").unwrap(),
            (Operator::Gte, Operand::Value(Value::from_token("1.5")))
        );
    }

    #[test]
    fn test_out_of_range_relative_date() {
        assert!(matches!(
            run("due", Operator::Contains, "+999999999y"),
            Err(QueryError::Format(_))
        ));
    }

    #[test]
    fn test_absolute_date_keeps_operator() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(
            run("due", Operator::Gte, "2024-05-01").unwrap(),
            (Operator::Gte, Operand::Date(expected))
        );
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(
            run("due", Operator::Lt, "2024-05-01T10:00:00+02:00").unwrap(),
            (Operator::Lt, Operand::Date(expected))
        );
    }

    #[test]
    fn test_plain_number_on_date_field() {
        assert_eq!(
            run("due", Operator::Gt, "20").unwrap(),
            (Operator::Gt, Operand::Value(Value::from_token("20")))
        );
    }

    #[test]
    fn test_no_coercion_outside_date_fields() {
        assert_eq!(
            run("level", Operator::Contains, "+1d").unwrap(),
            (Operator::Contains, Operand::Value(Value::String("+1d".to_string())))
        );
        assert_eq!(
            run("level", Operator::Contains, "NOW").unwrap().1,
            Operand::Value(Value::String("NOW".to_string()))
        );
    }
}
