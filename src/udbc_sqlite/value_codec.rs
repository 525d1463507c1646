use crate::udbc::value::Value;
use rusqlite::types::{Value as SqlValue, ValueRef};

pub fn from_sqlite_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Str(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

/// SQLite has no date, time or decimal storage class; those go in as text.
pub fn to_sqlite_value(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Str(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        Value::Date(_) | Value::Time(_) | Value::DateTime(_) | Value::Decimal(_) => {
            SqlValue::Text(v.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_codec() {
        assert_eq!(to_sqlite_value(&Value::Bool(true)), SqlValue::Integer(1));
        assert_eq!(
            to_sqlite_value(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())),
            SqlValue::Text("2024-01-02".into())
        );
        assert_eq!(from_sqlite_value(ValueRef::Text(b"Alice")), Value::from("Alice"));
        assert_eq!(from_sqlite_value(ValueRef::Integer(0)), Value::Int(0));
    }
}
