use crate::error::DbError;
use crate::udbc::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Type a parameter is bound with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Int,
    Bool,
    Null,
    Str,
    Lob,
}

impl ParamType {
    /// Infers the binding type of an untyped value.
    ///
    /// The order is integer, boolean, null, then string for everything else.
    /// Floats, dates and decimals therefore travel as strings.
    pub fn infer(value: &Value) -> ParamType {
        if let Value::Int(_) = value {
            ParamType::Int
        } else if let Value::Bool(_) = value {
            ParamType::Bool
        } else if value.is_null() {
            ParamType::Null
        } else {
            ParamType::Str
        }
    }

    /// Converts `value` into the representation sent for this type.
    pub fn coerce(self, value: Value) -> Result<Value, DbError> {
        match self {
            ParamType::Null => Ok(Value::Null),
            ParamType::Int => coerce_int(value),
            ParamType::Bool => coerce_bool(value),
            ParamType::Str => Ok(match value {
                v @ (Value::Null | Value::Str(_) | Value::Bytes(_)) => v,
                other => Value::Str(other.to_string()),
            }),
            ParamType::Lob => match value {
                Value::Null => Ok(Value::Null),
                Value::Bytes(b) => Ok(Value::Bytes(b)),
                Value::Str(s) => Ok(Value::Bytes(s.into_bytes())),
                other => Err(DbError::usage(format!(
                    "cannot bind {} value as LOB",
                    other.kind()
                ))),
            },
        }
    }
}

fn coerce_int(value: Value) -> Result<Value, DbError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Decimal(d) => i64::try_from(d.trunc())
            .map(Value::Int)
            .map_err(|_| DbError::usage(format!("decimal {} does not fit an integer", d))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| DbError::usage(format!("cannot bind '{}' as integer", s))),
        other => Err(DbError::usage(format!(
            "cannot bind {} value as integer",
            other.kind()
        ))),
    }
}

fn coerce_bool(value: Value) -> Result<Value, DbError> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Int(i) => Ok(Value::Bool(i != 0)),
        Value::Float(f) => Ok(Value::Bool(f != 0.0)),
        Value::Str(s) => Ok(Value::Bool(!(s.is_empty() || s == "0"))),
        other => Err(DbError::usage(format!(
            "cannot bind {} value as boolean",
            other.kind()
        ))),
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Int => "int",
            ParamType::Bool => "bool",
            ParamType::Null => "null",
            ParamType::Str => "str",
            ParamType::Lob => "lob",
        };
        f.write_str(name)
    }
}

/// Where a parameter goes: a `:name` marker or a 1-based `?` position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    Named(String),
    Positional(usize),
}

impl Placeholder {
    /// Accepts `":name"` as well as `"name"`.
    pub fn named(name: &str) -> Result<Self, DbError> {
        let name = name.strip_prefix(':').unwrap_or(name);
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(DbError::usage(format!("invalid parameter name ':{}'", name)));
        }
        Ok(Placeholder::Named(name.to_string()))
    }

    pub fn positional(index: usize) -> Result<Self, DbError> {
        if index == 0 {
            return Err(DbError::usage("positional parameters are 1-based"));
        }
        Ok(Placeholder::Positional(index))
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Named(n) => write!(f, ":{}", n),
            Placeholder::Positional(i) => write!(f, "#{}", i),
        }
    }
}

/// Conversion used by the `bind` family.
pub trait IntoPlaceholder {
    fn into_placeholder(self) -> Result<Placeholder, DbError>;
}

impl IntoPlaceholder for &str {
    fn into_placeholder(self) -> Result<Placeholder, DbError> {
        Placeholder::named(self)
    }
}

impl IntoPlaceholder for &String {
    fn into_placeholder(self) -> Result<Placeholder, DbError> {
        Placeholder::named(self)
    }
}

impl IntoPlaceholder for usize {
    fn into_placeholder(self) -> Result<Placeholder, DbError> {
        Placeholder::positional(self)
    }
}

impl IntoPlaceholder for Placeholder {
    fn into_placeholder(self) -> Result<Placeholder, DbError> {
        Ok(self)
    }
}

/// A value after coercion, with the type it was bound as.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub value: Value,
    pub ty: ParamType,
}

/// Parameters handed to a connection for one execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    #[default]
    Empty,
    Named(Vec<(String, Value)>),
    Positional(Vec<Value>),
}

impl Params {
    /// Builds the execution parameters from a statement's bindings.
    ///
    /// Named and positional markers cannot be mixed, and positions must be
    /// contiguous from 1.
    pub fn from_bindings(bindings: &BTreeMap<Placeholder, BoundParam>) -> Result<Params, DbError> {
        if bindings.is_empty() {
            return Ok(Params::Empty);
        }
        let mut named = Vec::new();
        let mut positional = Vec::new();
        for (placeholder, param) in bindings {
            match placeholder {
                Placeholder::Named(n) => named.push((n.clone(), param.value.clone())),
                Placeholder::Positional(i) => {
                    if *i != positional.len() + 1 {
                        return Err(DbError::usage(format!(
                            "positional parameter {} was not bound",
                            positional.len() + 1
                        )));
                    }
                    positional.push(param.value.clone());
                }
            }
        }
        match (named.is_empty(), positional.is_empty()) {
            (false, false) => Err(DbError::usage(
                "named and positional parameters cannot be mixed",
            )),
            (true, _) => Ok(Params::Positional(positional)),
            (false, true) => Ok(Params::Named(named)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Empty => 0,
            Params::Named(v) => v.len(),
            Params::Positional(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(value: Value) -> BoundParam {
        let ty = ParamType::infer(&value);
        BoundParam { value, ty }
    }

    #[test]
    fn test_infer_order() {
        assert_eq!(ParamType::infer(&Value::Bool(false)), ParamType::Bool);
        assert_eq!(ParamType::infer(&Value::Int(0)), ParamType::Int);
        assert_eq!(ParamType::infer(&Value::Null), ParamType::Null);
        assert_eq!(ParamType::infer(&Value::Float(1.5)), ParamType::Str);
        assert_eq!(ParamType::infer(&Value::Str("0".into())), ParamType::Str);
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(ParamType::Int.coerce(" 42 ".into()).unwrap(), Value::Int(42));
        assert_eq!(ParamType::Int.coerce(true.into()).unwrap(), Value::Int(1));
        assert_eq!(ParamType::Int.coerce(3.9f64.into()).unwrap(), Value::Int(3));
        assert!(matches!(
            ParamType::Int.coerce("abc".into()),
            Err(DbError::Usage(_))
        ));
    }

    #[test]
    fn test_coerce_bool_and_str() {
        assert_eq!(ParamType::Bool.coerce("0".into()).unwrap(), Value::Bool(false));
        assert_eq!(ParamType::Bool.coerce("no".into()).unwrap(), Value::Bool(true));
        assert_eq!(ParamType::Str.coerce(12.into()).unwrap(), Value::Str("12".into()));
        assert_eq!(ParamType::Null.coerce("x".into()).unwrap(), Value::Null);
        assert_eq!(
            ParamType::Lob.coerce("ab".into()).unwrap(),
            Value::Bytes(b"ab".to_vec())
        );
    }

    #[test]
    fn test_placeholder_parsing() {
        assert_eq!(":name".into_placeholder().unwrap(), Placeholder::Named("name".into()));
        assert_eq!("name".into_placeholder().unwrap(), Placeholder::Named("name".into()));
        assert!(":".into_placeholder().is_err());
        assert!("a b".into_placeholder().is_err());
        assert!(0usize.into_placeholder().is_err());
    }

    #[test]
    fn test_params_from_bindings() {
        let mut b = BTreeMap::new();
        b.insert(Placeholder::Positional(2), bound(Value::Int(2)));
        b.insert(Placeholder::Positional(1), bound(Value::Int(1)));
        assert_eq!(
            Params::from_bindings(&b).unwrap(),
            Params::Positional(vec![Value::Int(1), Value::Int(2)])
        );

        b.insert(Placeholder::Named("x".into()), bound(Value::Null));
        assert!(Params::from_bindings(&b).is_err());

        let mut gap = BTreeMap::new();
        gap.insert(Placeholder::Positional(2), bound(Value::Int(2)));
        assert!(Params::from_bindings(&gap).is_err());
    }
}
