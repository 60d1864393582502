//! Property-based tests for response normalization
//!
//! These tests use proptest to check the normalizer's rules across many
//! random bodies.

use integration_bus::{Envelope, FALLBACK_FAILURE_MESSAGE, NormalizationMode, normalize};
use proptest::prelude::*;
use serde_json::{Value, json};

/// Arbitrary JSON leaf values
fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

/// Arbitrary non-object JSON values
fn non_object() -> impl Strategy<Value = Value> {
    prop_oneof![
        leaf(),
        prop::collection::vec(leaf(), 0..5).prop_map(Value::Array),
    ]
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_i64() == Some(0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Payload values that survive unwrapping (truthy ones)
fn payload() -> impl Strategy<Value = Value> {
    non_object().prop_filter("payload must be truthy", |v| !is_falsy(v))
}

/// Values skipped when unwrapping
fn falsy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::Bool(false)),
        Just(json!(0)),
        Just(json!("")),
    ]
}

/// Codes that are neither 200 nor 0
fn failure_code() -> impl Strategy<Value = i64> {
    any::<i64>().prop_filter("success sentinel", |c| *c != 200 && *c != 0)
}

proptest! {
    #[test]
    fn non_object_bodies_pass_unchanged(body in non_object()) {
        let result = normalize(body.clone(), NormalizationMode::Unwrap);
        prop_assert_eq!(result, Ok(body.clone()));
        prop_assert_eq!(Envelope::decode(body.clone()), Envelope::Bare(body));
    }

    #[test]
    fn success_codes_prefer_content(
        code in prop_oneof![Just(200i64), Just(0i64)],
        content in payload(),
        data in payload(),
    ) {
        let body = json!({ "code": code, "content": content.clone(), "data": data });
        prop_assert_eq!(normalize(body, NormalizationMode::Unwrap), Ok(content));
    }

    #[test]
    fn success_codes_fall_back_to_data(
        code in prop_oneof![Just(200i64), Just(0i64)],
        data in payload(),
    ) {
        let body = json!({ "code": code, "data": data.clone() });
        prop_assert_eq!(normalize(body, NormalizationMode::Unwrap), Ok(data));
    }

    #[test]
    fn falsy_content_falls_back_to_data(
        code in prop_oneof![Just(200i64), Just(0i64)],
        content in falsy(),
        data in payload(),
    ) {
        let body = json!({ "code": code, "content": content, "data": data.clone() });
        prop_assert_eq!(normalize(body, NormalizationMode::Unwrap), Ok(data));
    }

    #[test]
    fn success_codes_fall_back_to_body(
        code in prop_oneof![Just(200i64), Just(0i64)],
        msg in "[a-z]{0,8}",
    ) {
        let body = json!({ "code": code, "msg": msg });
        prop_assert_eq!(normalize(body.clone(), NormalizationMode::Unwrap), Ok(body));
    }

    #[test]
    fn failure_codes_reject_with_message(code in failure_code(), msg in "[a-z]{1,16}") {
        let body = json!({ "code": code, "msg": msg.clone(), "data": [1, 2] });
        let failure = normalize(body.clone(), NormalizationMode::Unwrap).unwrap_err();
        prop_assert_eq!(failure.message, msg);
        prop_assert_eq!(failure.envelope, body);
    }

    #[test]
    fn failure_codes_without_message_use_fallback(code in failure_code()) {
        let failure = normalize(json!({ "code": code }), NormalizationMode::Unwrap).unwrap_err();
        prop_assert_eq!(failure.message, FALLBACK_FAILURE_MESSAGE);
    }

    #[test]
    fn pass_through_is_identity(code in any::<i64>(), data in payload()) {
        let body = json!({ "code": code, "data": data });
        prop_assert_eq!(normalize(body.clone(), NormalizationMode::PassThrough), Ok(body));
    }
}
