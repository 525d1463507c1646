use crate::error::DbError;
use crate::udbc::row::Row;
use crate::udbc::value::Value;
use serde::de::{self, Deserializer, IntoDeserializer, MapAccess, Visitor};

/// Deserializes a row as a map of column name to value.
pub struct RowDeserializer<'a> {
    row: &'a Row,
}

impl<'a> RowDeserializer<'a> {
    pub fn new(row: &'a Row) -> Self {
        Self { row }
    }
}

/// Maps a row onto `T` by column name.
pub fn from_row<T: de::DeserializeOwned>(row: &Row) -> Result<T, DbError> {
    T::deserialize(RowDeserializer::new(row))
}

impl<'de> Deserializer<'de> for RowDeserializer<'_> {
    type Error = DbError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(RowMapAccess {
            columns: self.row.columns(),
            values: self.row.values(),
            pos: 0,
        })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string
        unit seq tuple tuple_struct map struct enum identifier ignored_any
        unit_struct newtype_struct bytes byte_buf option
    }
}

struct RowMapAccess<'a> {
    columns: &'a [String],
    values: &'a [Value],
    pos: usize,
}

impl<'de> MapAccess<'de> for RowMapAccess<'_> {
    type Error = DbError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.columns.get(self.pos) {
            Some(name) => seed.deserialize(name.as_str().into_deserializer()).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: de::DeserializeSeed<'de>,
    {
        let value = self
            .values
            .get(self.pos)
            .ok_or_else(|| DbError::Value("value requested past the last column".into()))?;
        self.pos += 1;
        seed.deserialize(ValueDeserializer { value })
    }
}

pub struct ValueDeserializer<'a> {
    pub value: &'a Value,
}

impl<'de> Deserializer<'de> for ValueDeserializer<'_> {
    type Error = DbError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(v) => visitor.visit_bool(*v),
            Value::Int(v) => visitor.visit_i64(*v),
            Value::Float(v) => visitor.visit_f64(*v),
            Value::Str(v) => visitor.visit_str(v),
            Value::Bytes(v) => visitor.visit_bytes(v),
            Value::Date(d) => visitor.visit_string(d.to_string()),
            Value::Time(t) => visitor.visit_string(t.to_string()),
            Value::DateTime(_) => visitor.visit_string(self.value.to_string()),
            Value::Decimal(d) => visitor.visit_string(d.to_string()),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    // MySQL TINYINT(1) and SQLite booleans both come back as integers.
    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Int(i) => visitor.visit_bool(*i != 0),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => visitor.visit_str(s),
                Err(_) => visitor.visit_bytes(b),
            },
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => {
                visitor.visit_string(self.value.to_string())
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char
        unit seq tuple tuple_struct map struct enum identifier
        unit_struct bytes byte_buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Car {
        id: i32,
        model: String,
        available: bool,
        price_per_day: Option<f64>,
        notes: Option<String>,
    }

    fn row(pairs: Vec<(&str, Value)>) -> Row {
        let cols: Arc<[String]> = pairs.iter().map(|(c, _)| c.to_string()).collect();
        Row::new(cols, pairs.into_iter().map(|(_, v)| v).collect())
    }

    #[test]
    fn test_from_row_struct() {
        let r = row(vec![
            ("id", Value::Int(3)),
            ("model", Value::from("Corolla")),
            ("available", Value::Int(1)),
            ("price_per_day", Value::Float(39.5)),
            ("notes", Value::Null),
        ]);
        let car: Car = from_row(&r).unwrap();
        assert_eq!(
            car,
            Car {
                id: 3,
                model: "Corolla".into(),
                available: true,
                price_per_day: Some(39.5),
                notes: None,
            }
        );
    }

    #[test]
    fn test_from_row_type_mismatch() {
        let r = row(vec![
            ("id", Value::from("three")),
            ("model", Value::from("Corolla")),
            ("available", Value::Bool(true)),
            ("price_per_day", Value::Null),
            ("notes", Value::Null),
        ]);
        let err = from_row::<Car>(&r).unwrap_err();
        assert!(matches!(err, DbError::Value(_)));
    }
}
