use crate::udbc::value::Value;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use mysql_async::Column;
use mysql_async::Value as MyValue;
use mysql_async::consts::ColumnType;
use rust_decimal::Decimal;
use std::str::FromStr;

/// `binary` collation id; columns with it carry raw bytes, not text.
const BINARY_CHARSET: u16 = 63;

pub fn from_mysql_value(v: &MyValue, column: Option<&Column>) -> Value {
    match v {
        MyValue::NULL => Value::Null,
        MyValue::Int(i) => Value::Int(*i),
        MyValue::UInt(u) => i64::try_from(*u)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Str(u.to_string())),
        MyValue::Float(f) => Value::Float(f64::from(*f)),
        MyValue::Double(d) => Value::Float(*d),
        MyValue::Bytes(b) => from_bytes(b, column),
        MyValue::Date(y, m, d, h, min, s, micro) => {
            let Some(date) = NaiveDate::from_ymd_opt(i32::from(*y), u32::from(*m), u32::from(*d))
            else {
                // zero dates such as 0000-00-00
                return Value::Str(format!("{:04}-{:02}-{:02}", y, m, d));
            };
            if *h == 0 && *min == 0 && *s == 0 && *micro == 0 {
                Value::Date(date)
            } else {
                date.and_hms_micro_opt(u32::from(*h), u32::from(*min), u32::from(*s), *micro)
                    .map(Value::DateTime)
                    .unwrap_or_else(|| Value::Date(date))
            }
        }
        MyValue::Time(is_neg, days, h, min, s, micro) => {
            let total_h = *days * 24 + u32::from(*h);
            match NaiveTime::from_hms_micro_opt(total_h, u32::from(*min), u32::from(*s), *micro) {
                Some(t) if !*is_neg => Value::Time(t),
                _ => Value::Str(format!(
                    "{}{:02}:{:02}:{:02}",
                    if *is_neg { "-" } else { "" },
                    total_h,
                    min,
                    s
                )),
            }
        }
    }
}

fn from_bytes(b: &[u8], column: Option<&Column>) -> Value {
    let Some(column) = column else {
        return text_or_bytes(b);
    };
    match column.column_type() {
        ColumnType::MYSQL_TYPE_NEWDECIMAL | ColumnType::MYSQL_TYPE_DECIMAL => {
            std::str::from_utf8(b)
                .ok()
                .and_then(|s| Decimal::from_str(s).ok())
                .map(Value::Decimal)
                .unwrap_or_else(|| text_or_bytes(b))
        }
        _ if column.character_set() == BINARY_CHARSET => Value::Bytes(b.to_vec()),
        _ => text_or_bytes(b),
    }
}

fn text_or_bytes(b: &[u8]) -> Value {
    match std::str::from_utf8(b) {
        Ok(s) => Value::Str(s.to_string()),
        Err(_) => Value::Bytes(b.to_vec()),
    }
}

pub fn to_mysql_value(v: &Value) -> MyValue {
    match v {
        Value::Null => MyValue::NULL,
        Value::Bool(b) => MyValue::Int(i64::from(*b)),
        Value::Int(i) => MyValue::Int(*i),
        Value::Float(f) => MyValue::Double(*f),
        Value::Str(s) => MyValue::Bytes(s.clone().into_bytes()),
        Value::Bytes(b) => MyValue::Bytes(b.clone()),
        Value::Date(d) => MyValue::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0),
        Value::Time(t) => MyValue::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1000,
        ),
        Value::DateTime(dt) => MyValue::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.and_utc().timestamp_subsec_micros(),
        ),
        Value::Decimal(d) => MyValue::Bytes(d.to_string().into_bytes()),
    }
}
