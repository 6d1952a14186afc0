#![allow(dead_code)]

use std::{fmt::Debug, future::Future};

use serde_json::{json, Map, Value};
use time::OffsetDateTime;
use userbase::{state::AppState, users::UserParams, ErrorKind, UserError};

/// Awaits `operation` and asserts it failed with `expected`.
pub async fn assert_raises<T, F>(operation: F, expected: ErrorKind) -> UserError
where
    T: Debug,
    F: Future<Output = Result<T, UserError>>,
{
    match operation.await {
        Ok(value) => panic!("expected {expected:?} error, got Ok({value:?})"),
        Err(err) => {
            assert_eq!(err.kind(), expected, "unexpected error: {err}");
            err
        }
    }
}

pub fn assert_recent(at: OffsetDateTime) {
    let drift = (OffsetDateTime::now_utc() - at).abs();
    assert!(drift < time::Duration::seconds(1), "{at} is {drift:?} away from now");
}

pub fn state() -> AppState {
    AppState::fake()
}

static SEQUENCE: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// Valid attributes for a new user, as JSON so keys can be dropped or
/// replaced with `null` / `""`.
pub fn user_attributes() -> Map<String, Value> {
    let n = SEQUENCE.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let Value::Object(map) = json!({
        "email": format!("user{n}@example.com"),
        "password": "password123",
    }) else {
        unreachable!()
    };
    map
}

pub fn params_with(overrides: Value, absent: &[&str]) -> UserParams {
    let mut attrs = user_attributes();
    if let Value::Object(extra) = overrides {
        attrs.extend(extra);
    }
    for key in absent {
        attrs.remove(*key);
    }
    serde_json::from_value(Value::Object(attrs)).expect("valid user params")
}

pub fn params() -> UserParams {
    params_with(json!({}), &[])
}
