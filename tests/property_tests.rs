//! Property tests for parameter type inference and coercion.

use proptest::prelude::*;
use rentdb::{ParamType, Value};

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        ".{0,16}".prop_map(Value::Str),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

proptest! {
    #[test]
    fn inference_follows_int_bool_null_string(value in arb_value()) {
        let expected = match &value {
            Value::Int(_) => ParamType::Int,
            Value::Bool(_) => ParamType::Bool,
            Value::Null => ParamType::Null,
            _ => ParamType::Str,
        };
        prop_assert_eq!(ParamType::infer(&value), expected);
    }

    #[test]
    fn inferred_type_coerces_without_error(value in arb_value()) {
        let ty = ParamType::infer(&value);
        prop_assert!(ty.coerce(value).is_ok());
    }

    #[test]
    fn int_coercion_round_trips_decimal_strings(n in any::<i64>()) {
        prop_assert_eq!(ParamType::Int.coerce(Value::Str(n.to_string())).unwrap(), Value::Int(n));
    }

    #[test]
    fn zero_and_false_never_collapse(flag in any::<bool>()) {
        let int = Value::Int(i64::from(flag));
        prop_assert_eq!(ParamType::infer(&int), ParamType::Int);
        prop_assert_eq!(ParamType::infer(&Value::Bool(flag)), ParamType::Bool);
    }
}
