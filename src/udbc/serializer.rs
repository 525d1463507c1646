use crate::error::DbError;
use crate::udbc::value::Value;
use serde::Serialize;
use serde::ser::{self, Impossible, Serializer};

/// Bind arguments extracted from a `Serialize` value.
#[derive(Debug, Clone, PartialEq)]
pub enum Args {
    None,
    Single(Value),
    Named(Vec<(String, Value)>),
    Positional(Vec<Value>),
}

/// Structs and maps become named arguments, tuples and sequences positional
/// ones, a bare scalar a single positional argument and `()` nothing.
pub fn to_args<T: Serialize + ?Sized>(args: &T) -> Result<Args, DbError> {
    args.serialize(ArgsSerializer)
}

/// Serializes one scalar into a `Value`.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, DbError> {
    value.serialize(ValueSerializer)
}

fn nested(kind: &str) -> DbError {
    DbError::Value(format!("{} cannot be bound as a single parameter", kind))
}

pub struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = DbError;
    type SerializeSeq = Impossible<Value, DbError>;
    type SerializeTuple = Impossible<Value, DbError>;
    type SerializeTupleStruct = Impossible<Value, DbError>;
    type SerializeTupleVariant = Impossible<Value, DbError>;
    type SerializeMap = Impossible<Value, DbError>;
    type SerializeStruct = Impossible<Value, DbError>;
    type SerializeStructVariant = Impossible<Value, DbError>;

    fn serialize_bool(self, v: bool) -> Result<Value, DbError> {
        Ok(Value::Bool(v))
    }
    fn serialize_i8(self, v: i8) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_i16(self, v: i16) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_i32(self, v: i32) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_i64(self, v: i64) -> Result<Value, DbError> {
        Ok(Value::Int(v))
    }
    fn serialize_u8(self, v: u8) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_u16(self, v: u16) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_u32(self, v: u32) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_u64(self, v: u64) -> Result<Value, DbError> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| DbError::Value(format!("{} does not fit a signed 64-bit integer", v)))
    }
    fn serialize_f32(self, v: f32) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_f64(self, v: f64) -> Result<Value, DbError> {
        Ok(Value::Float(v))
    }
    fn serialize_char(self, v: char) -> Result<Value, DbError> {
        Ok(Value::Str(v.to_string()))
    }
    fn serialize_str(self, v: &str) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_bytes(self, v: &[u8]) -> Result<Value, DbError> {
        Ok(Value::from(v))
    }
    fn serialize_none(self) -> Result<Value, DbError> {
        Ok(Value::Null)
    }
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, DbError> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Value, DbError> {
        Ok(Value::Null)
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, DbError> {
        Ok(Value::Null)
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, DbError> {
        Ok(Value::from(variant))
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, DbError> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Value, DbError> {
        Err(nested("an enum variant with data"))
    }
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, DbError> {
        Err(nested("a sequence"))
    }
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, DbError> {
        Err(nested("a tuple"))
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, DbError> {
        Err(nested("a tuple struct"))
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, DbError> {
        Err(nested("an enum variant with data"))
    }
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, DbError> {
        Err(nested("a map"))
    }
    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, DbError> {
        Err(nested("a struct"))
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, DbError> {
        Err(nested("an enum variant with data"))
    }
}

struct ArgsSerializer;

pub struct PositionalArgs {
    values: Vec<Value>,
}

pub struct NamedArgs {
    values: Vec<(String, Value)>,
    pending_key: Option<String>,
}

impl ArgsSerializer {
    fn single(value: Result<Value, DbError>) -> Result<Args, DbError> {
        value.map(Args::Single)
    }
}

impl ser::Serializer for ArgsSerializer {
    type Ok = Args;
    type Error = DbError;
    type SerializeSeq = PositionalArgs;
    type SerializeTuple = PositionalArgs;
    type SerializeTupleStruct = PositionalArgs;
    type SerializeTupleVariant = Impossible<Args, DbError>;
    type SerializeMap = NamedArgs;
    type SerializeStruct = NamedArgs;
    type SerializeStructVariant = Impossible<Args, DbError>;

    fn serialize_bool(self, v: bool) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_bool(v))
    }
    fn serialize_i8(self, v: i8) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_i8(v))
    }
    fn serialize_i16(self, v: i16) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_i16(v))
    }
    fn serialize_i32(self, v: i32) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_i32(v))
    }
    fn serialize_i64(self, v: i64) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_i64(v))
    }
    fn serialize_u8(self, v: u8) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_u8(v))
    }
    fn serialize_u16(self, v: u16) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_u16(v))
    }
    fn serialize_u32(self, v: u32) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_u32(v))
    }
    fn serialize_u64(self, v: u64) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_u64(v))
    }
    fn serialize_f32(self, v: f32) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_f32(v))
    }
    fn serialize_f64(self, v: f64) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_f64(v))
    }
    fn serialize_char(self, v: char) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_char(v))
    }
    fn serialize_str(self, v: &str) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_str(v))
    }
    fn serialize_bytes(self, v: &[u8]) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_bytes(v))
    }
    fn serialize_none(self) -> Result<Args, DbError> {
        Ok(Args::Single(Value::Null))
    }
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Args, DbError> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<Args, DbError> {
        Ok(Args::None)
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Args, DbError> {
        Ok(Args::None)
    }
    fn serialize_unit_variant(
        self,
        name: &'static str,
        index: u32,
        variant: &'static str,
    ) -> Result<Args, DbError> {
        Self::single(ValueSerializer.serialize_unit_variant(name, index, variant))
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Args, DbError> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Args, DbError> {
        Err(nested("an enum variant with data"))
    }
    fn serialize_seq(self, len: Option<usize>) -> Result<PositionalArgs, DbError> {
        Ok(PositionalArgs {
            values: Vec::with_capacity(len.unwrap_or(0)),
        })
    }
    fn serialize_tuple(self, len: usize) -> Result<PositionalArgs, DbError> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<PositionalArgs, DbError> {
        self.serialize_seq(Some(len))
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, DbError> {
        Err(nested("an enum variant with data"))
    }
    fn serialize_map(self, len: Option<usize>) -> Result<NamedArgs, DbError> {
        Ok(NamedArgs {
            values: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }
    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<NamedArgs, DbError> {
        self.serialize_map(Some(len))
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, DbError> {
        Err(nested("an enum variant with data"))
    }
}

impl PositionalArgs {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DbError> {
        self.values.push(to_value(value)?);
        Ok(())
    }
}

impl ser::SerializeSeq for PositionalArgs {
    type Ok = Args;
    type Error = DbError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DbError> {
        self.push(value)
    }
    fn end(self) -> Result<Args, DbError> {
        Ok(Args::Positional(self.values))
    }
}

impl ser::SerializeTuple for PositionalArgs {
    type Ok = Args;
    type Error = DbError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DbError> {
        self.push(value)
    }
    fn end(self) -> Result<Args, DbError> {
        Ok(Args::Positional(self.values))
    }
}

impl ser::SerializeTupleStruct for PositionalArgs {
    type Ok = Args;
    type Error = DbError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DbError> {
        self.push(value)
    }
    fn end(self) -> Result<Args, DbError> {
        Ok(Args::Positional(self.values))
    }
}

impl ser::SerializeMap for NamedArgs {
    type Ok = Args;
    type Error = DbError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), DbError> {
        match to_value(key)? {
            Value::Str(s) => {
                self.pending_key = Some(s);
                Ok(())
            }
            other => Err(DbError::Value(format!(
                "parameter names must be strings, got {}",
                other.kind()
            ))),
        }
    }
    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), DbError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| DbError::Value("map value without a key".into()))?;
        self.values.push((key, to_value(value)?));
        Ok(())
    }
    fn end(self) -> Result<Args, DbError> {
        Ok(Args::Named(self.values))
    }
}

impl ser::SerializeStruct for NamedArgs {
    type Ok = Args;
    type Error = DbError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), DbError> {
        self.values.push((key.to_string(), to_value(value)?));
        Ok(())
    }
    fn end(self) -> Result<Args, DbError> {
        Ok(Args::Named(self.values))
    }
}
