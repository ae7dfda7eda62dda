//! Dispatch of fluent actions: argument decoding by name, protocol errors.

use serde_json::json;
use service_proxy::bus::{Message, Outcome, Transport};
use service_proxy::proxy::{CallArgs, CallError};
use service_proxy::FAILURE_CODE;
use std::time::Duration;
use tracing_test::traced_test;

use crate::support::{fixture, SomeEnum, TestDataObject, ADDRESS};

fn failure(outcome: Outcome) -> (i32, String) {
    match outcome {
        Outcome::Failure(err) => (err.code, err.message),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn no_params_invokes_once_without_reply() {
    let fx = fixture();
    fx.client.send("noParams", CallArgs::new()).unwrap();

    assert_eq!(fx.log.calls(), vec!["noParams"]);
    // Fluent actions never reply; a waiting request sees no reply at all.
    let err = fx.client.request("noParams", CallArgs::new()).unwrap_err();
    assert!(matches!(err, CallError::Transport(_)));
    assert_eq!(fx.log.calls().len(), 2);
}

#[test]
fn basic_types_decode_by_name() {
    let fx = fixture();
    // Field order differs from declaration order.
    let body = json!({
        "bool": true, "c": 65, "d": 2.0, "f": 1.0,
        "l": 4, "i": 3, "s": 2, "b": 1, "str": "x"
    });
    fx.bus
        .send(ADDRESS, Message::action("basicTypes", body))
        .unwrap();

    assert_eq!(fx.log.calls(), vec!["basicTypes(x,1,2,3,4,1,2,A,true)"]);
}

#[test]
fn boxed_types_accept_missing_and_null() {
    let fx = fixture();
    fx.client
        .send("basicBoxedTypes", CallArgs::new().arg("str", Some("s".to_string())))
        .unwrap();
    fx.bus
        .send(
            ADDRESS,
            Message::action("basicBoxedTypes", json!({ "str": null, "i": 7, "c": 66 })),
        )
        .unwrap();

    assert_eq!(
        fx.log.calls(),
        vec![
            "basicBoxedTypes(Some(\"s\"),None,None)",
            "basicBoxedTypes(None,Some(7),Some('B'))",
        ]
    );
}

#[test]
fn enums_records_and_collections() {
    let fx = fixture();
    fx.client
        .send("enumType", CallArgs::new().arg("someEnum", SomeEnum::Wibble))
        .unwrap();
    fx.client
        .send(
            "dataObjectType",
            CallArgs::new().arg(
                "options",
                TestDataObject {
                    string: "foo".into(),
                    number: 123,
                    flag: true,
                },
            ),
        )
        .unwrap();
    fx.bus
        .send(
            ADDRESS,
            Message::action(
                "listParams",
                json!({ "listString": ["foo", "bar"], "listChar": [88, 89] }),
            ),
        )
        .unwrap();
    fx.bus
        .send(
            ADDRESS,
            Message::action("mapParams", json!({ "mapLong": { "b": 2, "a": 1 } })),
        )
        .unwrap();

    assert_eq!(
        fx.log.calls(),
        vec![
            "enumType(Wibble)",
            "dataObjectType(foo,123,true)",
            "listParams([\"foo\", \"bar\"],['X', 'Y'])",
            "mapParams([(\"a\", 1), (\"b\", 2)])",
        ]
    );
}

#[test]
#[traced_test]
fn missing_action_header_fails() {
    let fx = fixture();
    let outcome = fx
        .bus
        .request(ADDRESS, Message::new(json!({})), Duration::from_secs(1))
        .unwrap()
        .wait()
        .unwrap();

    assert_eq!(failure(outcome), (FAILURE_CODE, "action not specified".to_string()));
    assert!(fx.log.calls().is_empty());
    assert!(logs_contain("action not specified"));
}

#[test]
fn unknown_action_fails() {
    let fx = fixture();
    let err = fx
        .client
        .call::<String>("noSuchAction", CallArgs::new())
        .unwrap_err();

    assert_eq!(err.code(), FAILURE_CODE);
    assert!(err.message().starts_with("invalid action"));
    assert!(fx.log.calls().is_empty());
}

#[test]
fn bad_arguments_never_reach_the_service() {
    let fx = fixture();

    let err = fx
        .client
        .call::<()>("enumType", CallArgs::new().arg("someEnum", "WIBBLE".to_string()))
        .unwrap_err();
    assert!(err.message().contains("invalid enum literal"));

    let err = fx
        .client
        .call::<()>("fluentMethod", CallArgs::new())
        .unwrap_err();
    assert_eq!(err.message(), "missing field `str`");

    let err = fx
        .client
        .call::<()>("basicTypes", CallArgs::new().arg("str", 1))
        .unwrap_err();
    assert_eq!(err.message(), "field `str`: expected string, found integer");

    assert!(fx.log.calls().is_empty());
}
